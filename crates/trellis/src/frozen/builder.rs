use super::{Csr, FrozenEdgeProperty, FrozenGraph, FrozenVertexProperty, build_edge_store};
use crate::error::{GraphError, GraphResult};
use crate::graph::GraphOptions;
use crate::id::{EdgeId, VertexId, endpoint_edge_id};
use crate::property::DenseStore;
use core::hash::Hash;
use indexmap::IndexMap;
use trellis_core::collections::{HashMap, HashSet};
use trellis_core::hash::FixedHasher;

type VertexInit<V> = Box<dyn Fn(VertexId) -> V>;
type EdgeInit<E> = Box<dyn Fn(EdgeId) -> E>;

/// Staging structure for a [`FrozenGraph`].
///
/// Topology is staged in sparse hash sets and sorted once at
/// [`build`](Self::build). The builder optionally carries one vertex and
/// one edge property: configure them up front with
/// [`with_vertex_property`](Self::with_vertex_property) /
/// [`with_edge_property`](Self::with_edge_property), stage values through
/// [`mutate`](Self::mutate), and collect the typed property objects from
/// `build`. Elements without a staged value fall back to the initializer;
/// with neither, reading them fails with an uninitialized-value error.
///
/// Duplicate edges collapse silently when [`GraphOptions::MULTI_EDGES`] is
/// set (the staging sets cannot express parallels) and fail with
/// [`GraphError::EdgeAlreadyExists`] otherwise.
pub struct FrozenGraphBuilder<V = (), E = ()> {
    options: GraphOptions,
    succ: Vec<HashSet<u32>>,
    edge_count: usize,
    vertex_values: Vec<Option<V>>,
    edge_values: HashMap<u64, E>,
    vertex_init: Option<VertexInit<V>>,
    edge_init: Option<EdgeInit<E>>,
}

impl FrozenGraphBuilder {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            succ: Vec::new(),
            edge_count: 0,
            vertex_values: Vec::new(),
            edge_values: HashMap::default(),
            vertex_init: None,
            edge_init: None,
        }
    }
}

impl<V: 'static, E: 'static> FrozenGraphBuilder<V, E> {
    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn vertex_count(&self) -> usize {
        self.succ.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn add_vertex(&mut self) -> VertexId {
        let v = self.succ.len() as u32;
        self.succ.push(HashSet::default());
        self.vertex_values.push(None);
        VertexId::new(v)
    }

    /// Stages an edge; the returned identity is already the canonical one
    /// the frozen graph will use
    pub fn add_edge(&mut self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        let n = self.succ.len();
        if (s.index() as usize) >= n {
            return Err(GraphError::UnknownVertex(s));
        }
        if (t.index() as usize) >= n {
            return Err(GraphError::UnknownVertex(t));
        }
        let directed = self.options.is_directed();
        let (si, ti) = (s.index(), t.index());
        if self.succ[si as usize].contains(&ti) {
            if self.options.contains(GraphOptions::MULTI_EDGES) {
                return Ok(endpoint_edge_id(directed, si, ti));
            }
            return Err(GraphError::EdgeAlreadyExists(s, t));
        }
        self.succ[si as usize].insert(ti);
        if !directed && si != ti {
            self.succ[ti as usize].insert(si);
        }
        self.edge_count += 1;
        Ok(endpoint_edge_id(directed, si, ti))
    }

    /// Finalizes the staged topology and both properties
    pub fn build(self) -> (FrozenGraph, FrozenVertexProperty<V>, FrozenEdgeProperty<E>) {
        let graph = freeze(self.options, self.succ, self.edge_count);

        let mut store = DenseStore::new();
        store.ensure_len(graph.vertex_count());
        for (at, staged) in self.vertex_values.into_iter().enumerate() {
            if let Some(value) = staged {
                store.set(at, value);
            } else if let Some(init) = &self.vertex_init {
                store.set(at, init(VertexId::new(at as u32)));
            }
        }
        let vertex_property = FrozenVertexProperty::from_parts(graph.clone(), store);

        let mut staged = self.edge_values;
        let edge_init = self.edge_init;
        let edge_store = build_edge_store(&graph, |e| {
            staged
                .remove(&e.to_bits())
                .or_else(|| edge_init.as_ref().map(|init| init(e)))
        });
        let edge_property = FrozenEdgeProperty::from_parts(graph.clone(), edge_store);

        (graph, vertex_property, edge_property)
    }
}

impl FrozenGraphBuilder<(), ()> {
    /// Finalizes topology only, for builds that carry no properties
    pub fn build_graph(self) -> FrozenGraph {
        freeze(self.options, self.succ, self.edge_count)
    }
}

impl<E: 'static> FrozenGraphBuilder<(), E> {
    /// Configures the vertex property; values not staged through the
    /// [`Mutator`] are produced by `init` at build time
    pub fn with_vertex_property<V: 'static>(
        self,
        init: impl Fn(VertexId) -> V + 'static,
    ) -> FrozenGraphBuilder<V, E> {
        self.retype_vertices(Some(Box::new(init)))
    }

    /// Configures the vertex property without an initializer; vertices
    /// without a staged value fail reads after the build
    pub fn with_vertex_property_uninit<V: 'static>(self) -> FrozenGraphBuilder<V, E> {
        self.retype_vertices(None)
    }

    fn retype_vertices<V: 'static>(self, init: Option<VertexInit<V>>) -> FrozenGraphBuilder<V, E> {
        FrozenGraphBuilder {
            options: self.options,
            vertex_values: self.vertex_values.iter().map(|_| None).collect(),
            succ: self.succ,
            edge_count: self.edge_count,
            edge_values: self.edge_values,
            vertex_init: init,
            edge_init: self.edge_init,
        }
    }
}

impl<V: 'static> FrozenGraphBuilder<V, ()> {
    /// Configures the edge property; values not staged through the
    /// [`Mutator`] are produced by `init` at build time
    pub fn with_edge_property<E: 'static>(
        self,
        init: impl Fn(EdgeId) -> E + 'static,
    ) -> FrozenGraphBuilder<V, E> {
        self.retype_edges(Some(Box::new(init)))
    }

    /// Configures the edge property without an initializer; edges without a
    /// staged value fail reads after the build
    pub fn with_edge_property_uninit<E: 'static>(self) -> FrozenGraphBuilder<V, E> {
        self.retype_edges(None)
    }

    fn retype_edges<E: 'static>(self, init: Option<EdgeInit<E>>) -> FrozenGraphBuilder<V, E> {
        FrozenGraphBuilder {
            options: self.options,
            succ: self.succ,
            edge_count: self.edge_count,
            vertex_values: self.vertex_values,
            edge_values: HashMap::default(),
            vertex_init: self.vertex_init,
            edge_init: init,
        }
    }
}

impl<V: Eq + Hash + Clone + 'static, E: 'static> FrozenGraphBuilder<V, E> {
    /// Keyed staging handle: vertex values double as lookup keys, and
    /// edge adds by value create their endpoints on first mention
    pub fn mutate(&mut self) -> Mutator<'_, V, E> {
        let mut index = IndexMap::default();
        for (at, staged) in self.vertex_values.iter().enumerate() {
            if let Some(value) = staged {
                index.insert(value.clone(), VertexId::new(at as u32));
            }
        }
        Mutator {
            builder: self,
            index,
        }
    }
}

/// The build-via-named-values affordance of [`FrozenGraphBuilder`]
pub struct Mutator<'a, V, E> {
    builder: &'a mut FrozenGraphBuilder<V, E>,
    index: IndexMap<V, VertexId, FixedHasher>,
}

impl<V: Eq + Hash + Clone + 'static, E: 'static> Mutator<'_, V, E> {
    /// Stages a vertex with no value
    pub fn add_vertex(&mut self) -> VertexId {
        self.builder.add_vertex()
    }

    /// Stages a vertex carrying `value`, or returns the vertex already
    /// staged under that value
    pub fn add_vertex_value(&mut self, value: V) -> VertexId {
        if let Some(&v) = self.index.get(&value) {
            return v;
        }
        let v = self.builder.add_vertex();
        self.builder.vertex_values[v.index() as usize] = Some(value.clone());
        self.index.insert(value, v);
        v
    }

    pub fn add_edge(&mut self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        self.builder.add_edge(s, t)
    }

    /// Stages an edge carrying `value`
    pub fn add_edge_value(&mut self, s: VertexId, t: VertexId, value: E) -> GraphResult<EdgeId> {
        let e = self.builder.add_edge(s, t)?;
        self.builder.edge_values.insert(e.to_bits(), value);
        Ok(e)
    }

    /// Stages an edge between the vertices carrying the given values,
    /// creating either endpoint on first mention
    pub fn add_edge_between(&mut self, source: V, target: V) -> GraphResult<EdgeId> {
        let s = self.add_vertex_value(source);
        let t = self.add_vertex_value(target);
        self.builder.add_edge(s, t)
    }

    /// [`add_edge_between`](Self::add_edge_between) with an edge value
    pub fn add_edge_between_value(
        &mut self,
        source: V,
        target: V,
        value: E,
    ) -> GraphResult<EdgeId> {
        let s = self.add_vertex_value(source);
        let t = self.add_vertex_value(target);
        self.add_edge_value(s, t, value)
    }

    /// Whether a vertex was staged under `value`
    pub fn has_vertex_value(&self, value: &V) -> bool {
        self.index.contains_key(value)
    }

    /// The vertex staged under `value`
    pub fn vertex_for_value(&self, value: &V) -> Option<VertexId> {
        self.index.get(value).copied()
    }
}

fn freeze(options: GraphOptions, succ: Vec<HashSet<u32>>, edge_count: usize) -> FrozenGraph {
    log::debug!(
        "freezing graph: {} vertices, {} edges",
        succ.len(),
        edge_count
    );
    let mut offsets = Vec::with_capacity(succ.len() + 1);
    offsets.push(0u32);
    let mut targets = Vec::new();
    let mut scratch: Vec<u32> = Vec::new();
    for set in &succ {
        scratch.clear();
        scratch.extend(set.iter().copied());
        scratch.sort_unstable();
        targets.extend(scratch.iter().map(|&t| VertexId::new(t)));
        offsets.push(targets.len() as u32);
    }
    FrozenGraph::from_parts(
        options,
        Csr {
            offsets: offsets.into_boxed_slice(),
            targets: targets.into_boxed_slice(),
        },
        edge_count,
    )
}
