//! The mutable graph engine: a uniform surface over the two adjacency
//! backends, with property and reference fan-out wired into every
//! structural mutation.

mod network;
mod simple;
pub mod views;

use crate::error::{GraphError, GraphResult};
use crate::id::{EdgeId, VertexId, endpoint_edge_id};
use crate::property::{
    EdgeProperty, EdgePropertyHook, VertexProperty, VertexPropertyHook,
};
use crate::reference::{EdgeRef, RefTracker, VertexRef};
use core::fmt;
use network::NetworkTopology;
use simple::SimpleTopology;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use views::{Edges, IncidentEdges, Neighbors, Vertices};

bitflags::bitflags! {
    /// Shape of a graph engine, fixed at construction
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct GraphOptions: u8 {
        /// Edges are ordered pairs; successors and predecessors differ
        const DIRECTED = 1 << 0;
        /// Parallel edges between the same endpoint pair are permitted.
        /// Selects the network backend.
        const MULTI_EDGES = 1 << 1;
        /// Edges receive dense indexed identities even when parallel edges
        /// are not needed. Selects the network backend.
        const INDEX_EDGES = 1 << 2;
    }
}

impl GraphOptions {
    #[inline]
    pub fn is_directed(&self) -> bool {
        self.contains(Self::DIRECTED)
    }

    /// Whether the engine stores explicit edge identities in a dense table
    #[inline]
    pub fn uses_edge_table(&self) -> bool {
        self.intersects(Self::MULTI_EDGES.union(Self::INDEX_EDGES))
    }
}

pub(crate) enum Backend {
    Simple(SimpleTopology),
    Network(NetworkTopology),
}

/// Engine state behind the [`Graph`] handle: the topology backend plus the
/// weak subscriber registries the mutation fan-out walks
pub(crate) struct Core {
    options: GraphOptions,
    pub(crate) backend: Backend,
    vertex_subscribers: Vec<Weak<dyn VertexPropertyHook>>,
    edge_subscribers: Vec<Weak<dyn EdgePropertyHook>>,
    pub(crate) vertex_refs: RefTracker<u32>,
    pub(crate) edge_refs: RefTracker<u64>,
}

impl Core {
    fn new(options: GraphOptions) -> Self {
        let directed = options.is_directed();
        let backend = if options.uses_edge_table() {
            Backend::Network(NetworkTopology::new(
                directed,
                options.contains(GraphOptions::MULTI_EDGES),
            ))
        } else {
            Backend::Simple(SimpleTopology::new(directed))
        };
        Self {
            options,
            backend,
            vertex_subscribers: Vec::new(),
            edge_subscribers: Vec::new(),
            vertex_refs: RefTracker::new(),
            edge_refs: RefTracker::new(),
        }
    }

    #[inline]
    pub(crate) fn is_directed(&self) -> bool {
        self.options.is_directed()
    }

    pub(crate) fn vertex_count(&self) -> usize {
        match &self.backend {
            Backend::Simple(simple) => simple.vertex_count(),
            Backend::Network(network) => network.vertex_count(),
        }
    }

    pub(crate) fn edge_count(&self) -> usize {
        match &self.backend {
            Backend::Simple(simple) => simple.edge_count(),
            Backend::Network(network) => network.edge_count(),
        }
    }

    pub(crate) fn check_vertex(&self, v: VertexId) -> GraphResult<()> {
        if (v.index() as usize) < self.vertex_count() {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(v))
        }
    }

    pub(crate) fn check_edge(&self, e: EdgeId) -> GraphResult<()> {
        let known = match &self.backend {
            Backend::Simple(simple) => {
                let (s, t) = (e.high(), e.low());
                (simple.directed() || s <= t) && simple.contains_edge(s, t)
            }
            Backend::Network(network) => (e.low() as usize) < network.edge_count(),
        };
        if known { Ok(()) } else { Err(GraphError::UnknownEdge(e)) }
    }

    /// The engine's own rendering of `e`: in the network backend the hint
    /// word is refreshed from the edge table, in the simple backend the
    /// identity already is the canonical encoding
    pub(crate) fn authoritative_edge_id(&self, e: EdgeId) -> EdgeId {
        match &self.backend {
            Backend::Simple(_) => e,
            Backend::Network(network) => network.edge_id(e.low()),
        }
    }

    /// Endpoints of a checked edge, in construction order where the backend
    /// preserves it
    pub(crate) fn edge_endpoints(&self, e: EdgeId) -> (u32, u32) {
        match &self.backend {
            Backend::Simple(_) => (e.high(), e.low()),
            Backend::Network(network) => network.endpoints(e.low()),
        }
    }

    /// Tracker key of an edge: the dense id where identities are indexed,
    /// the full encoding where identity equals topology
    pub(crate) fn edge_ref_key(&self, e: EdgeId) -> u64 {
        match &self.backend {
            Backend::Simple(_) => e.to_bits(),
            Backend::Network(_) => e.low() as u64,
        }
    }

    pub(crate) fn edge_id_from_ref_key(&self, key: u64) -> EdgeId {
        match &self.backend {
            Backend::Simple(_) => EdgeId::from_bits(key),
            Backend::Network(network) => network.edge_id(key as u32),
        }
    }

    pub(crate) fn subscribe_vertex_property<H: VertexPropertyHook + 'static>(
        &mut self,
        hook: &Rc<H>,
    ) {
        let hook: Rc<dyn VertexPropertyHook> = hook.clone();
        let weak: Weak<dyn VertexPropertyHook> = Rc::downgrade(&hook);
        self.vertex_subscribers.push(weak);
    }

    pub(crate) fn subscribe_edge_property<H: EdgePropertyHook + 'static>(&mut self, hook: &Rc<H>) {
        let hook: Rc<dyn EdgePropertyHook> = hook.clone();
        let weak: Weak<dyn EdgePropertyHook> = Rc::downgrade(&hook);
        self.edge_subscribers.push(weak);
    }

    /// Walks the vertex property registry, pruning dropped subscribers
    fn fanout_vertex_swap(&mut self, removed: VertexId, survivor: VertexId) {
        self.vertex_subscribers.retain(|weak| match weak.upgrade() {
            Some(hook) => {
                hook.swap_and_remove(removed, survivor);
                true
            }
            None => false,
        });
    }

    fn fanout_edge_swap(&mut self, removed: EdgeId, survivor: EdgeId) {
        self.edge_subscribers.retain(|weak| match weak.upgrade() {
            Some(hook) => {
                hook.swap_and_remove(removed, survivor);
                true
            }
            None => false,
        });
    }

    fn add_vertex(&mut self) -> VertexId {
        let index = match &mut self.backend {
            Backend::Simple(simple) => simple.add_vertex(),
            Backend::Network(network) => network.add_vertex(),
        };
        VertexId::new(index)
    }

    fn add_edge(&mut self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        self.check_vertex(s)?;
        self.check_vertex(t)?;
        match &mut self.backend {
            Backend::Simple(simple) => simple.add_edge(s.index(), t.index()),
            Backend::Network(network) => network.add_edge(s.index(), t.index()),
        }
    }

    fn remove_edge(&mut self, e: EdgeId) -> GraphResult<()> {
        self.check_edge(e)?;
        self.remove_edge_inner(e);
        Ok(())
    }

    /// Topology erasure plus the ordered fan-out for one checked edge
    fn remove_edge_inner(&mut self, e: EdgeId) {
        let (removed_id, survivor_id, ref_from, ref_to) = match &mut self.backend {
            Backend::Simple(simple) => {
                let erased = simple.remove_edge(e.high(), e.low());
                debug_assert!(erased);
                // Identity equals topology: rehoming is a pure removal
                (e, e, e.to_bits(), e.to_bits())
            }
            Backend::Network(network) => {
                let k = e.low();
                let removed_id = network.edge_id(k);
                let last = (network.edge_count() - 1) as u32;
                let survivor_old = (k != last).then(|| network.edge_id(last));
                let moved = network.remove_edge(k);
                debug_assert_eq!(moved.is_some(), survivor_old.is_some());
                match survivor_old {
                    Some(old) => (removed_id, old, last as u64, k as u64),
                    None => (removed_id, removed_id, k as u64, k as u64),
                }
            }
        };
        self.fanout_edge_swap(removed_id, survivor_id);
        self.edge_refs.relocate(ref_from, ref_to);
    }

    fn remove_vertex(&mut self, v: VertexId) -> GraphResult<()> {
        self.check_vertex(v)?;
        let vi = v.index();
        // Drain outgoing edges; every removal runs its own full fan-out
        loop {
            let next = match &mut self.backend {
                Backend::Simple(simple) => simple
                    .first_successor(vi)
                    .map(|t| endpoint_edge_id(simple.directed(), vi, t)),
                Backend::Network(network) => {
                    network.first_outgoing(vi).map(|k| network.edge_id(k))
                }
            };
            let Some(e) = next else { break };
            self.remove_edge_inner(e);
        }
        // Then incoming; materializes the predecessor structures, which the
        // compaction below relies on in directed mode
        if self.is_directed() {
            loop {
                let next = match &mut self.backend {
                    Backend::Simple(simple) => simple
                        .first_predecessor(vi)
                        .map(|s| endpoint_edge_id(true, s, vi)),
                    Backend::Network(network) => {
                        network.first_incoming(vi).map(|k| network.edge_id(k))
                    }
                };
                let Some(e) = next else { break };
                self.remove_edge_inner(e);
            }
        }
        // Compact the vertex slot: topology first, then properties, then
        // references, exactly in that order
        let last = (self.vertex_count() - 1) as u32;
        let relabels = match &mut self.backend {
            Backend::Simple(simple) => simple.relocate_last(vi),
            Backend::Network(network) => {
                network.relocate_last(vi);
                Vec::new()
            }
        };
        for &(old, new) in &relabels {
            self.fanout_edge_swap(new, old);
        }
        self.fanout_vertex_swap(v, VertexId::new(last));
        for &(old, new) in &relabels {
            self.edge_refs.relocate(old.to_bits(), new.to_bits());
        }
        self.vertex_refs.relocate(last, vi);
        Ok(())
    }

    fn ensure_vertex_capacity(&mut self, n: usize) {
        let additional = n.saturating_sub(self.vertex_count());
        if additional == 0 {
            return;
        }
        match &mut self.backend {
            Backend::Simple(simple) => simple.reserve_vertices(additional),
            Backend::Network(network) => network.reserve_vertices(additional),
        }
        self.vertex_subscribers.retain(|weak| match weak.upgrade() {
            Some(hook) => {
                hook.reserve(additional);
                true
            }
            None => false,
        });
    }

    fn ensure_edge_capacity(&mut self, n: usize) {
        let additional = n.saturating_sub(self.edge_count());
        if additional == 0 {
            return;
        }
        if let Backend::Network(network) = &mut self.backend {
            network.reserve_edges(additional);
        }
        self.edge_subscribers.retain(|weak| match weak.upgrade() {
            Some(hook) => {
                hook.reserve(additional);
                true
            }
            None => false,
        });
    }
}

/// A mutable graph engine.
///
/// The engine is one of four topology variants, selected by
/// [`GraphOptions`] at construction: (directed | undirected) ×
/// (simple | multi-edge). Simple variants store adjacency sets and identify
/// edges by their endpoints; multi-edge and index-edge variants store an
/// explicit edge table with dense edge identities.
///
/// Identities are compacted indices: vertices are always exactly
/// `0..vertex_count` and (in the network backend) edge ids exactly
/// `0..edge_count`. Removal moves the highest identity into the vacated
/// slot and fans the move out to every live [`VertexProperty`] /
/// [`EdgeProperty`] and stable reference, in the fixed order topology →
/// properties → references.
///
/// `Graph` is a cheap handle; clones alias the same engine the way
/// property back-links do. Engines are single-threaded: the handle is
/// neither `Send` nor `Sync`, and mutation must not reenter the engine
/// from a property initializer.
pub struct Graph {
    core: Rc<RefCell<Core>>,
}

impl Clone for Graph {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl Graph {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            core: Rc::new(RefCell::new(Core::new(options))),
        }
    }

    #[inline]
    pub(crate) fn core(&self) -> &Rc<RefCell<Core>> {
        &self.core
    }

    /// Whether two handles alias the same engine
    pub fn same_engine(a: &Graph, b: &Graph) -> bool {
        Rc::ptr_eq(&a.core, &b.core)
    }

    pub fn options(&self) -> GraphOptions {
        self.core.borrow().options
    }

    pub fn is_directed(&self) -> bool {
        self.core.borrow().is_directed()
    }

    pub fn vertex_count(&self) -> usize {
        self.core.borrow().vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.core.borrow().edge_count()
    }

    /// Whether the engine currently contains parallel edges; O(1)
    pub fn has_multi_edges(&self) -> bool {
        match &self.core.borrow().backend {
            Backend::Simple(_) => false,
            Backend::Network(network) => network.has_multi_edges(),
        }
    }

    /// Appends a vertex; the new identity is always `vertex_count - 1`
    pub fn add_vertex(&mut self) -> VertexId {
        self.core.borrow_mut().add_vertex()
    }

    /// Removes `v` and its incident edges.
    ///
    /// The vertex with the highest identity is relabeled into `v`'s slot;
    /// properties and stable references follow the move automatically.
    pub fn remove_vertex(&mut self, v: VertexId) -> GraphResult<()> {
        self.core.borrow_mut().remove_vertex(v)
    }

    /// Connects `s` to `t`.
    ///
    /// Fails with [`GraphError::EdgeAlreadyExists`] when the pair is
    /// already connected and the engine does not allow parallel edges.
    /// Self-loops are always allowed.
    pub fn add_edge(&mut self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        self.core.borrow_mut().add_edge(s, t)
    }

    /// Removes edge `e`.
    ///
    /// In the network backend the highest edge id is renumbered into the
    /// vacated slot; properties and references follow.
    pub fn remove_edge(&mut self, e: EdgeId) -> GraphResult<()> {
        self.core.borrow_mut().remove_edge(e)
    }

    /// Pre-sizes vertex storage for `n` vertices; a hint only
    pub fn ensure_vertex_capacity(&mut self, n: usize) {
        self.core.borrow_mut().ensure_vertex_capacity(n);
    }

    /// Pre-sizes edge storage for `n` edges; a hint only
    pub fn ensure_edge_capacity(&mut self, n: usize) {
        self.core.borrow_mut().ensure_edge_capacity(n);
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.core.borrow().check_vertex(v).is_ok()
    }

    /// Whether an edge connects `s` to `t` (either order when undirected);
    /// `false` when either endpoint is unknown
    pub fn contains_edge(&self, s: VertexId, t: VertexId) -> bool {
        let core = self.core.borrow();
        if core.check_vertex(s).is_err() || core.check_vertex(t).is_err() {
            return false;
        }
        match &core.backend {
            Backend::Simple(simple) => simple.contains_edge(s.index(), t.index()),
            Backend::Network(network) => network.contains_edge(s.index(), t.index()),
        }
    }

    /// An edge connecting `s` to `t` — any one of them when parallel edges
    /// exist. Fails with [`GraphError::NoSuchEdge`] when none does.
    pub fn edge_between(&self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        let core = self.core.borrow();
        core.check_vertex(s)?;
        core.check_vertex(t)?;
        match &core.backend {
            Backend::Simple(simple) => {
                if simple.contains_edge(s.index(), t.index()) {
                    Ok(endpoint_edge_id(simple.directed(), s.index(), t.index()))
                } else {
                    Err(GraphError::NoSuchEdge(s, t))
                }
            }
            Backend::Network(network) => network
                .first_edge_between(s.index(), t.index())
                .map(|k| network.edge_id(k))
                .ok_or(GraphError::NoSuchEdge(s, t)),
        }
    }

    /// Every edge connecting `s` to `t`, in no particular order; empty when
    /// none does
    pub fn edges_between(&self, s: VertexId, t: VertexId) -> GraphResult<Vec<EdgeId>> {
        let core = self.core.borrow();
        core.check_vertex(s)?;
        core.check_vertex(t)?;
        match &core.backend {
            Backend::Simple(simple) => {
                if simple.contains_edge(s.index(), t.index()) {
                    Ok(vec![endpoint_edge_id(
                        simple.directed(),
                        s.index(),
                        t.index(),
                    )])
                } else {
                    Ok(Vec::new())
                }
            }
            Backend::Network(network) => {
                let mut ids = Vec::new();
                network.edges_between(s.index(), t.index(), &mut ids);
                Ok(ids.into_iter().map(|k| network.edge_id(k)).collect())
            }
        }
    }

    pub fn out_degree(&self, v: VertexId) -> GraphResult<usize> {
        let core = self.core.borrow();
        core.check_vertex(v)?;
        Ok(match &core.backend {
            Backend::Simple(simple) => simple.out_degree(v.index()),
            Backend::Network(network) => network.out_degree(v.index()),
        })
    }

    pub fn in_degree(&self, v: VertexId) -> GraphResult<usize> {
        // May materialize the predecessor structures
        let mut core = self.core.borrow_mut();
        core.check_vertex(v)?;
        Ok(match &mut core.backend {
            Backend::Simple(simple) => simple.in_degree(v.index()),
            Backend::Network(network) => network.in_degree(v.index()),
        })
    }

    /// Source endpoint of `e`: construction order in the network backend,
    /// canonical `(min, max)` order for undirected simple edges
    pub fn edge_source(&self, e: EdgeId) -> GraphResult<VertexId> {
        let core = self.core.borrow();
        core.check_edge(e)?;
        Ok(VertexId::new(core.edge_endpoints(e).0))
    }

    /// Target endpoint of `e`; same ordering rules as
    /// [`edge_source`](Self::edge_source)
    pub fn edge_target(&self, e: EdgeId) -> GraphResult<VertexId> {
        let core = self.core.borrow();
        core.check_edge(e)?;
        Ok(VertexId::new(core.edge_endpoints(e).1))
    }

    /// The endpoint of `e` other than `v`; `v` itself for a self-loop
    pub fn edge_opposite(&self, e: EdgeId, v: VertexId) -> GraphResult<VertexId> {
        let core = self.core.borrow();
        core.check_edge(e)?;
        let (s, t) = core.edge_endpoints(e);
        if v.index() == s {
            Ok(VertexId::new(t))
        } else if v.index() == t {
            Ok(VertexId::new(s))
        } else {
            Err(GraphError::NotAnEndpoint(e, v))
        }
    }

    /// Live view of the vertex set
    pub fn vertices(&self) -> Vertices {
        Vertices::new(self.clone())
    }

    /// Live view of the edge set
    pub fn edges(&self) -> Edges {
        Edges::new(self.clone())
    }

    /// Live view of `v`'s successors: one entry per outgoing edge, so
    /// parallel edges repeat their neighbor.
    ///
    /// The view reflects engine state at access time. If `v` itself is
    /// removed the view is dangling and further use is undefined.
    pub fn successors(&self, v: VertexId) -> GraphResult<Neighbors> {
        self.core.borrow().check_vertex(v)?;
        Ok(Neighbors::new(self.clone(), v, false))
    }

    /// Live view of `v`'s predecessors; equals
    /// [`successors`](Self::successors) on undirected engines
    pub fn predecessors(&self, v: VertexId) -> GraphResult<Neighbors> {
        let mut core = self.core.borrow_mut();
        core.check_vertex(v)?;
        materialize_pred(&mut core);
        Ok(Neighbors::new(self.clone(), v, true))
    }

    /// Live view of the edges leaving `v`
    pub fn outgoing_edges(&self, v: VertexId) -> GraphResult<IncidentEdges> {
        self.core.borrow().check_vertex(v)?;
        Ok(IncidentEdges::new(self.clone(), v, false))
    }

    /// Live view of the edges entering `v`; equals
    /// [`outgoing_edges`](Self::outgoing_edges) on undirected engines
    pub fn incoming_edges(&self, v: VertexId) -> GraphResult<IncidentEdges> {
        let mut core = self.core.borrow_mut();
        core.check_vertex(v)?;
        materialize_pred(&mut core);
        Ok(IncidentEdges::new(self.clone(), v, true))
    }

    /// Creates a vertex property whose slots initialize lazily through
    /// `init` on first access
    pub fn vertex_property<T: 'static>(
        &self,
        init: impl Fn(VertexId) -> T + 'static,
    ) -> VertexProperty<T> {
        VertexProperty::register(self.clone(), Some(Box::new(init)))
    }

    /// Creates a vertex property without an initializer; reading a slot
    /// before writing it fails with [`GraphError::UninitializedVertex`]
    pub fn vertex_property_uninit<T: 'static>(&self) -> VertexProperty<T> {
        VertexProperty::register(self.clone(), None)
    }

    /// Creates an edge property whose slots initialize lazily through
    /// `init` on first access
    pub fn edge_property<T: 'static>(
        &self,
        init: impl Fn(EdgeId) -> T + 'static,
    ) -> EdgeProperty<T> {
        EdgeProperty::register(self.clone(), Some(Box::new(init)))
    }

    /// Creates an edge property without an initializer; reading a slot
    /// before writing it fails with [`GraphError::UninitializedEdge`]
    pub fn edge_property_uninit<T: 'static>(&self) -> EdgeProperty<T> {
        EdgeProperty::register(self.clone(), None)
    }

    /// Creates a stable reference to `v` that follows relabeling and
    /// invalidates when `v` is removed
    pub fn vertex_reference(&self, v: VertexId) -> GraphResult<VertexRef> {
        self.core.borrow().check_vertex(v)?;
        Ok(VertexRef::new(self.clone(), v))
    }

    /// Creates a stable reference to `e`; the edge twin of
    /// [`vertex_reference`](Self::vertex_reference)
    pub fn edge_reference(&self, e: EdgeId) -> GraphResult<EdgeRef> {
        self.core.borrow().check_edge(e)?;
        Ok(EdgeRef::new(self.clone(), e))
    }
}

fn materialize_pred(core: &mut Core) {
    match &mut core.backend {
        Backend::Simple(simple) => simple.materialize_pred(),
        Backend::Network(network) => network.materialize_pred(),
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.options())
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
