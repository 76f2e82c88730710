//! The immutable engine: a staged build finalized into frozen, sorted
//! adjacency arrays.
//!
//! Finalize sorts every adjacency into a compact offset/target (CSR)
//! layout. Identities become stable and sorted: vertices iterate in
//! identity order, edges source-major then target-ascending, each
//! undirected pair exactly once as its canonical `(min, max)` form.
//! Because nothing mutates after finalize, the frozen engine is shared by
//! `Arc`, needs no subscriber machinery, and is safe to read from many
//! threads.

mod builder;

pub use builder::{FrozenGraphBuilder, Mutator};

use crate::error::{GraphError, GraphResult};
use crate::graph::GraphOptions;
use crate::id::{EdgeId, VertexId, endpoint_edge_id};
use crate::property::DenseStore;
use core::fmt;
use std::sync::{Arc, OnceLock};
use trellis_core::collections::HashMap;

/// Edge-property flavor cutoff: up to this many edges a sorted array map
/// beats a hash map on memory without hurting lookups noticeably
const ARRAY_MAP_MAX_EDGES: usize = 1000;

/// Sorted offset/target adjacency arrays
pub(crate) struct Csr {
    /// Length `vertex_count + 1`
    offsets: Box<[u32]>,
    targets: Box<[VertexId]>,
}

impl Csr {
    fn vertex_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn slice(&self, v: u32) -> &[VertexId] {
        let lo = self.offsets[v as usize] as usize;
        let hi = self.offsets[v as usize + 1] as usize;
        &self.targets[lo..hi]
    }

    /// The reversed adjacency; target slices come out sorted because the
    /// sources are visited in ascending order
    fn transpose(&self) -> Csr {
        let n = self.vertex_count();
        let mut counts = vec![0u32; n + 1];
        for t in &self.targets {
            counts[t.index() as usize + 1] += 1;
        }
        for v in 0..n {
            counts[v + 1] += counts[v];
        }
        let offsets: Box<[u32]> = counts.into_boxed_slice();
        let mut cursors: Vec<u32> = offsets[..n].to_vec();
        let mut targets = vec![VertexId::new(0); self.targets.len()];
        for v in 0..n as u32 {
            for t in self.slice(v) {
                let at = &mut cursors[t.index() as usize];
                targets[*at as usize] = VertexId::new(v);
                *at += 1;
            }
        }
        Csr {
            offsets,
            targets: targets.into_boxed_slice(),
        }
    }
}

pub(crate) struct FrozenCore {
    options: GraphOptions,
    succ: Csr,
    /// Transposed adjacency, directed mode only, computed on first use
    pred: OnceLock<Csr>,
    /// Prefix counts of the canonical edge enumeration, length
    /// `vertex_count + 1`; computed on first indexed use unless the build
    /// asked for eager edge indexing
    edge_offsets: OnceLock<Box<[u32]>>,
    edge_count: usize,
}

/// An immutable graph, produced by [`FrozenGraphBuilder::build`].
///
/// Cheap to clone (`Arc` handle) and safe to share across threads; all
/// queries are lock-free reads. Adjacency slices are sorted, `index_of`
/// lookups are a binary search within one source's slice.
pub struct FrozenGraph {
    core: Arc<FrozenCore>,
}

impl Clone for FrozenGraph {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl FrozenGraph {
    pub(crate) fn from_parts(options: GraphOptions, succ: Csr, edge_count: usize) -> Self {
        let core = FrozenCore {
            options,
            succ,
            pred: OnceLock::new(),
            edge_offsets: OnceLock::new(),
            edge_count,
        };
        let graph = Self { core: Arc::new(core) };
        if options.contains(GraphOptions::INDEX_EDGES) {
            graph.edge_offsets();
        }
        graph
    }

    /// The designated empty graph for the given options
    pub fn empty(options: GraphOptions) -> Self {
        Self::from_parts(
            options,
            Csr {
                offsets: Box::new([0]),
                targets: Box::new([]),
            },
            0,
        )
    }

    pub fn options(&self) -> GraphOptions {
        self.core.options
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.core.options.is_directed()
    }

    pub fn vertex_count(&self) -> usize {
        self.core.succ.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.core.edge_count
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        (v.index() as usize) < self.vertex_count()
    }

    pub(crate) fn check_vertex(&self, v: VertexId) -> GraphResult<()> {
        if self.contains_vertex(v) {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(v))
        }
    }

    pub(crate) fn check_edge(&self, e: EdgeId) -> GraphResult<()> {
        let (s, t) = (e.high(), e.low());
        let n = self.vertex_count() as u32;
        let canonical = self.is_directed() || s <= t;
        if canonical && s < n && t < n && self.slice_contains(s, t) {
            Ok(())
        } else {
            Err(GraphError::UnknownEdge(e))
        }
    }

    fn slice_contains(&self, s: u32, t: u32) -> bool {
        self.core
            .succ
            .slice(s)
            .binary_search(&VertexId::new(t))
            .is_ok()
    }

    pub fn contains_edge(&self, s: VertexId, t: VertexId) -> bool {
        (s.index() as usize) < self.vertex_count()
            && (t.index() as usize) < self.vertex_count()
            && self.slice_contains(s.index(), t.index())
    }

    /// The edge connecting `s` to `t`, as its canonical identity
    pub fn edge_between(&self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        self.check_vertex(s)?;
        self.check_vertex(t)?;
        if self.slice_contains(s.index(), t.index()) {
            Ok(endpoint_edge_id(self.is_directed(), s.index(), t.index()))
        } else {
            Err(GraphError::NoSuchEdge(s, t))
        }
    }

    /// Every edge connecting `s` to `t`; frozen graphs are simple, so this
    /// is zero or one edge
    pub fn edges_between(&self, s: VertexId, t: VertexId) -> GraphResult<Vec<EdgeId>> {
        match self.edge_between(s, t) {
            Ok(e) => Ok(vec![e]),
            Err(GraphError::NoSuchEdge(..)) => Ok(Vec::new()),
            Err(other) => Err(other),
        }
    }

    pub fn out_degree(&self, v: VertexId) -> GraphResult<usize> {
        self.check_vertex(v)?;
        Ok(self.core.succ.slice(v.index()).len())
    }

    pub fn in_degree(&self, v: VertexId) -> GraphResult<usize> {
        self.check_vertex(v)?;
        if !self.is_directed() {
            return Ok(self.core.succ.slice(v.index()).len());
        }
        Ok(self.pred().slice(v.index()).len())
    }

    /// Sorted successors of `v`
    pub fn successors(&self, v: VertexId) -> GraphResult<&[VertexId]> {
        self.check_vertex(v)?;
        Ok(self.core.succ.slice(v.index()))
    }

    /// Sorted predecessors of `v`; computed by transposition on first use
    pub fn predecessors(&self, v: VertexId) -> GraphResult<&[VertexId]> {
        self.check_vertex(v)?;
        if !self.is_directed() {
            return Ok(self.core.succ.slice(v.index()));
        }
        Ok(self.pred().slice(v.index()))
    }

    fn pred(&self) -> &Csr {
        self.core.pred.get_or_init(|| {
            log::debug!("transposing frozen adjacency for predecessor queries");
            self.core.succ.transpose()
        })
    }

    pub fn edge_source(&self, e: EdgeId) -> GraphResult<VertexId> {
        self.check_edge(e)?;
        Ok(VertexId::new(e.high()))
    }

    pub fn edge_target(&self, e: EdgeId) -> GraphResult<VertexId> {
        self.check_edge(e)?;
        Ok(VertexId::new(e.low()))
    }

    /// The endpoint of `e` other than `v`; `v` itself for a self-loop
    pub fn edge_opposite(&self, e: EdgeId, v: VertexId) -> GraphResult<VertexId> {
        self.check_edge(e)?;
        let (s, t) = (e.high(), e.low());
        if v.index() == s {
            Ok(VertexId::new(t))
        } else if v.index() == t {
            Ok(VertexId::new(s))
        } else {
            Err(GraphError::NotAnEndpoint(e, v))
        }
    }

    /// Vertices in identity order
    pub fn vertices(&self) -> core::iter::Map<core::ops::Range<u32>, fn(u32) -> VertexId> {
        (0..self.vertex_count() as u32).map(VertexId::new as fn(u32) -> VertexId)
    }

    /// Edges in the frozen enumeration order: source-major, then
    /// target-ascending, undirected pairs once in canonical form
    pub fn edges(&self) -> FrozenEdgeIter<'_> {
        FrozenEdgeIter {
            core: &*self.core,
            v: 0,
            at: 0,
        }
    }

    /// Edges leaving `v`, in target-ascending order
    pub fn outgoing_edges(&self, v: VertexId) -> GraphResult<FrozenIncidenceIter<'_>> {
        self.check_vertex(v)?;
        Ok(FrozenIncidenceIter {
            directed: self.is_directed(),
            base: v.index(),
            incoming: false,
            targets: self.core.succ.slice(v.index()).iter(),
        })
    }

    /// Edges entering `v`; equals [`outgoing_edges`](Self::outgoing_edges)
    /// on undirected graphs
    pub fn incoming_edges(&self, v: VertexId) -> GraphResult<FrozenIncidenceIter<'_>> {
        self.check_vertex(v)?;
        let directed = self.is_directed();
        let targets = if directed {
            self.pred().slice(v.index()).iter()
        } else {
            self.core.succ.slice(v.index()).iter()
        };
        Ok(FrozenIncidenceIter {
            directed,
            base: v.index(),
            incoming: directed,
            targets,
        })
    }

    /// Position of `v` in the frozen vertex order
    pub fn index_of_vertex(&self, v: VertexId) -> GraphResult<usize> {
        self.check_vertex(v)?;
        Ok(v.index() as usize)
    }

    /// Position of `e` in the frozen edge order: one offset lookup plus a
    /// binary search within the source's slice
    pub fn index_of_edge(&self, e: EdgeId) -> GraphResult<usize> {
        self.check_edge(e)?;
        let (s, t) = (e.high(), e.low());
        let offsets = self.edge_offsets();
        let canonical = self.canonical_slice(s);
        match canonical.binary_search(&VertexId::new(t)) {
            Ok(at) => Ok(offsets[s as usize] as usize + at),
            // check_edge verified membership; an undirected non-canonical
            // mention was already rejected there
            Err(_) => Err(GraphError::UnknownEdge(e)),
        }
    }

    /// The edge at `index` in the frozen edge order
    pub fn edge_at(&self, index: usize) -> Option<EdgeId> {
        if index >= self.edge_count() {
            return None;
        }
        let offsets = self.edge_offsets();
        let s = offsets.partition_point(|&off| off as usize <= index) - 1;
        let within = index - offsets[s] as usize;
        let t = self.canonical_slice(s as u32)[within];
        Some(endpoint_edge_id(
            self.is_directed(),
            s as u32,
            t.index(),
        ))
    }

    /// The canonical out-slice of `s`: everything for directed graphs, the
    /// `t >= s` suffix for undirected ones
    fn canonical_slice(&self, s: u32) -> &[VertexId] {
        let slice = self.core.succ.slice(s);
        if self.is_directed() {
            slice
        } else {
            let start = slice.partition_point(|t| t.index() < s);
            &slice[start..]
        }
    }

    fn edge_offsets(&self) -> &[u32] {
        self.core.edge_offsets.get_or_init(|| {
            let n = self.vertex_count();
            let mut offsets = vec![0u32; n + 1];
            for s in 0..n as u32 {
                offsets[s as usize + 1] =
                    offsets[s as usize] + self.canonical_slice(s).len() as u32;
            }
            offsets.into_boxed_slice()
        })
    }

    /// Eagerly-initialized vertex property over this graph
    pub fn vertex_property<T: 'static>(
        &self,
        init: impl Fn(VertexId) -> T,
    ) -> FrozenVertexProperty<T> {
        let n = self.vertex_count();
        let mut store = DenseStore::new();
        store.ensure_len(n);
        for v in 0..n as u32 {
            store.set(v as usize, init(VertexId::new(v)));
        }
        FrozenVertexProperty {
            graph: self.clone(),
            store,
        }
    }

    /// Eagerly-initialized edge property over this graph; the storage
    /// flavor follows the size heuristic (or the eager index when the
    /// graph was built with [`GraphOptions::INDEX_EDGES`])
    pub fn edge_property<T: 'static>(&self, init: impl Fn(EdgeId) -> T) -> FrozenEdgeProperty<T> {
        let store = build_edge_store(self, |e| Some(init(e)));
        FrozenEdgeProperty {
            graph: self.clone(),
            store,
        }
    }
}

impl PartialEq for FrozenGraph {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.core, &other.core) {
            return true;
        }
        self.core.options == other.core.options
            && self.core.edge_count == other.core.edge_count
            && self.core.succ.offsets == other.core.succ.offsets
            && self.core.succ.targets == other.core.succ.targets
    }
}

impl Eq for FrozenGraph {}

impl fmt::Debug for FrozenGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrozenGraph")
            .field("options", &self.options())
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

pub struct FrozenEdgeIter<'a> {
    core: &'a FrozenCore,
    v: u32,
    at: usize,
}

impl Iterator for FrozenEdgeIter<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let n = self.core.succ.vertex_count() as u32;
        let directed = self.core.options.is_directed();
        while self.v < n {
            let slice = self.core.succ.slice(self.v);
            while let Some(t) = slice.get(self.at) {
                self.at += 1;
                if !directed && t.index() < self.v {
                    continue;
                }
                return Some(endpoint_edge_id(directed, self.v, t.index()));
            }
            self.v += 1;
            self.at = 0;
        }
        None
    }
}

pub struct FrozenIncidenceIter<'a> {
    directed: bool,
    base: u32,
    incoming: bool,
    targets: core::slice::Iter<'a, VertexId>,
}

impl Iterator for FrozenIncidenceIter<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let other = self.targets.next()?.index();
        Some(if self.incoming {
            endpoint_edge_id(true, other, self.base)
        } else {
            endpoint_edge_id(self.directed, self.base, other)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.targets.size_hint()
    }
}

impl ExactSizeIterator for FrozenIncidenceIter<'_> {}

/// Storage of one frozen edge property
pub(crate) enum FrozenEdgeStore<T: 'static> {
    /// Dense by frozen edge index; used when the graph indexes its edges
    Positional(DenseStore<T>),
    /// Parallel sorted key / value arrays with binary-search lookup; the
    /// memory-lean flavor for small edge sets
    ArrayMap {
        keys: Box<[u64]>,
        values: DenseStore<T>,
    },
    /// Hash-keyed fallback for large edge sets
    Hashed(HashMap<u64, T>),
}

/// Builds the flavor-appropriate store, pulling one optional value per edge
/// in frozen enumeration order
pub(crate) fn build_edge_store<T: 'static>(
    graph: &FrozenGraph,
    mut value_of: impl FnMut(EdgeId) -> Option<T>,
) -> FrozenEdgeStore<T> {
    let m = graph.edge_count();
    if graph.options().contains(GraphOptions::INDEX_EDGES) {
        let mut values = DenseStore::new();
        values.ensure_len(m);
        for (at, e) in graph.edges().enumerate() {
            if let Some(value) = value_of(e) {
                values.set(at, value);
            }
        }
        FrozenEdgeStore::Positional(values)
    } else if m <= ARRAY_MAP_MAX_EDGES {
        // The canonical enumeration is ascending in the 64-bit encoding,
        // so the key array comes out sorted for free
        let mut keys = Vec::with_capacity(m);
        let mut values = DenseStore::new();
        values.ensure_len(m);
        for (at, e) in graph.edges().enumerate() {
            keys.push(e.to_bits());
            if let Some(value) = value_of(e) {
                values.set(at, value);
            }
        }
        debug_assert!(keys.is_sorted());
        FrozenEdgeStore::ArrayMap {
            keys: keys.into_boxed_slice(),
            values,
        }
    } else {
        let mut map = HashMap::default();
        map.reserve(m);
        for e in graph.edges() {
            if let Some(value) = value_of(e) {
                map.insert(e.to_bits(), value);
            }
        }
        FrozenEdgeStore::Hashed(map)
    }
}

/// A total map from a frozen graph's vertices to `T`, fully initialized at
/// build time (slots without a staged value or initializer stay empty and
/// fail reads).
///
/// The graph never reshapes, so the property is plainly owned: reads take
/// `&self`, writes `&mut self`, and no engine fan-out exists.
pub struct FrozenVertexProperty<T: 'static> {
    graph: FrozenGraph,
    store: DenseStore<T>,
}

impl<T: 'static> FrozenVertexProperty<T> {
    pub(crate) fn from_parts(graph: FrozenGraph, store: DenseStore<T>) -> Self {
        Self { graph, store }
    }

    pub fn graph(&self) -> &FrozenGraph {
        &self.graph
    }

    pub fn get(&self, v: VertexId) -> GraphResult<T>
    where
        T: Clone,
    {
        self.graph.check_vertex(v)?;
        self.store
            .get(v.index() as usize)
            .ok_or(GraphError::UninitializedVertex(v))
    }

    /// Calls `f` on the value of `v` without requiring `T: Clone`
    pub fn with<R>(&self, v: VertexId, f: impl FnOnce(&T) -> R) -> GraphResult<R> {
        self.graph.check_vertex(v)?;
        self.store
            .with_value(v.index() as usize, f)
            .ok_or(GraphError::UninitializedVertex(v))
    }

    pub fn set(&mut self, v: VertexId, value: T) -> GraphResult<()> {
        self.graph.check_vertex(v)?;
        self.store.set(v.index() as usize, value);
        Ok(())
    }
}

/// A total map from a frozen graph's edges to `T`; the edge twin of
/// [`FrozenVertexProperty`]
pub struct FrozenEdgeProperty<T: 'static> {
    graph: FrozenGraph,
    store: FrozenEdgeStore<T>,
}

impl<T: 'static> FrozenEdgeProperty<T> {
    pub(crate) fn from_parts(graph: FrozenGraph, store: FrozenEdgeStore<T>) -> Self {
        Self { graph, store }
    }

    pub fn graph(&self) -> &FrozenGraph {
        &self.graph
    }

    /// Slot of `e` in the array flavors; hash-keyed stores never consult a
    /// slot
    fn slot_of(&self, e: EdgeId) -> GraphResult<usize> {
        match &self.store {
            FrozenEdgeStore::Positional(_) => self.graph.index_of_edge(e),
            FrozenEdgeStore::ArrayMap { keys, .. } => keys
                .binary_search(&e.to_bits())
                .map_err(|_| GraphError::UnknownEdge(e)),
            FrozenEdgeStore::Hashed(_) => Ok(0),
        }
    }

    pub fn get(&self, e: EdgeId) -> GraphResult<T>
    where
        T: Clone,
    {
        self.graph.check_edge(e)?;
        match &self.store {
            FrozenEdgeStore::Hashed(map) => map
                .get(&e.to_bits())
                .cloned()
                .ok_or(GraphError::UninitializedEdge(e)),
            FrozenEdgeStore::Positional(values) | FrozenEdgeStore::ArrayMap { values, .. } => {
                let at = self.slot_of(e)?;
                values.get(at).ok_or(GraphError::UninitializedEdge(e))
            }
        }
    }

    /// Calls `f` on the value of `e` without requiring `T: Clone`
    pub fn with<R>(&self, e: EdgeId, f: impl FnOnce(&T) -> R) -> GraphResult<R> {
        self.graph.check_edge(e)?;
        match &self.store {
            FrozenEdgeStore::Hashed(map) => map
                .get(&e.to_bits())
                .map(f)
                .ok_or(GraphError::UninitializedEdge(e)),
            FrozenEdgeStore::Positional(values) | FrozenEdgeStore::ArrayMap { values, .. } => {
                let at = self.slot_of(e)?;
                values
                    .with_value(at, f)
                    .ok_or(GraphError::UninitializedEdge(e))
            }
        }
    }

    pub fn set(&mut self, e: EdgeId, value: T) -> GraphResult<()> {
        self.graph.check_edge(e)?;
        if let FrozenEdgeStore::Hashed(map) = &mut self.store {
            map.insert(e.to_bits(), value);
            return Ok(());
        }
        let at = self.slot_of(e)?;
        if let FrozenEdgeStore::Positional(values) | FrozenEdgeStore::ArrayMap { values, .. } =
            &mut self.store
        {
            values.set(at, value);
        }
        Ok(())
    }
}
