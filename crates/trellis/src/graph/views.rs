//! Live views over a mutable engine.
//!
//! A view is a thin handle (engine + base element); every access reads the
//! engine as it is *now*. Size queries are O(1) and membership tests
//! sub-linear. Iterators hold a read borrow of the engine for their whole
//! life, so structural mutation during iteration is a caller error — use
//! the drain patterns on [`Graph`](super::Graph) instead.
//!
//! A view whose base vertex has been removed is dangling: debug builds
//! assert, release builds read whatever the compacted slot now holds.

use super::network::AdjacencyCursor;
use super::{Backend, Core, Graph};
use crate::id::{EdgeId, VertexId, endpoint_edge_id};
use std::cell::Ref;

fn debug_check_base(core: &Core, base: VertexId) {
    debug_assert!(
        (base.index() as usize) < core.vertex_count(),
        "view used after its base vertex was removed"
    );
}

/// Live view of an engine's vertex set; indexed, since vertex identities
/// are exactly `0..len`
pub struct Vertices {
    graph: Graph,
}

impl Vertices {
    pub(crate) fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub fn len(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, v: VertexId) -> bool {
        (v.index() as usize) < self.len()
    }

    /// The vertex at `index` in the view's total order
    pub fn get(&self, index: usize) -> Option<VertexId> {
        (index < self.len()).then(|| VertexId::new(index as u32))
    }

    /// Position of `v` in the view's total order
    pub fn index_of(&self, v: VertexId) -> Option<usize> {
        self.contains(v).then(|| v.index() as usize)
    }

    pub fn iter(&self) -> VertexIter<'_> {
        VertexIter::over(&self.graph)
    }
}

pub struct VertexIter<'a> {
    core: Ref<'a, Core>,
    next: u32,
}

impl<'a> VertexIter<'a> {
    pub(crate) fn over(graph: &'a Graph) -> Self {
        Self {
            core: graph.core().borrow(),
            next: 0,
        }
    }
}

impl Iterator for VertexIter<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        if (self.next as usize) < self.core.vertex_count() {
            let v = VertexId::new(self.next);
            self.next += 1;
            Some(v)
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a Vertices {
    type Item = VertexId;
    type IntoIter = VertexIter<'a>;

    fn into_iter(self) -> VertexIter<'a> {
        self.iter()
    }
}

/// Live view of an engine's edge set.
///
/// Iteration order: dense id order in the network backend; source-major,
/// canonical-once for undirected pairs, in the simple backend. Random
/// access and `index_of` are available on the indexed (network) backend
/// only.
pub struct Edges {
    graph: Graph,
}

impl Edges {
    pub(crate) fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, e: EdgeId) -> bool {
        self.graph.core().borrow().check_edge(e).is_ok()
    }

    /// The edge with dense id `index`; indexed backends only
    pub fn get(&self, index: usize) -> Option<EdgeId> {
        match &self.graph.core().borrow().backend {
            Backend::Simple(_) => None,
            Backend::Network(network) => {
                (index < network.edge_count()).then(|| network.edge_id(index as u32))
            }
        }
    }

    /// Position of `e` in the dense id order; indexed backends only
    pub fn index_of(&self, e: EdgeId) -> Option<usize> {
        let core = self.graph.core().borrow();
        match &core.backend {
            Backend::Simple(_) => None,
            Backend::Network(_) => core.check_edge(e).is_ok().then(|| e.low() as usize),
        }
    }

    pub fn iter(&self) -> EdgeIter<'_> {
        EdgeIter::over(&self.graph)
    }
}

pub struct EdgeIter<'a> {
    core: Ref<'a, Core>,
    // Simple-backend walk state
    v: u32,
    pos: usize,
    // Network-backend walk state
    next_id: u32,
}

impl<'a> EdgeIter<'a> {
    pub(crate) fn over(graph: &'a Graph) -> Self {
        Self {
            core: graph.core().borrow(),
            v: 0,
            pos: 0,
            next_id: 0,
        }
    }
}

impl Iterator for EdgeIter<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        match &self.core.backend {
            Backend::Simple(simple) => {
                let n = simple.vertex_count() as u32;
                let directed = simple.directed();
                while self.v < n {
                    if let Some(t) = simple.successor_set(self.v).cursor_next(&mut self.pos) {
                        // Undirected pairs appear in both sets; emit the
                        // canonical visit only
                        if !directed && t < self.v {
                            continue;
                        }
                        return Some(endpoint_edge_id(directed, self.v, t));
                    }
                    self.v += 1;
                    self.pos = 0;
                }
                None
            }
            Backend::Network(network) => {
                if (self.next_id as usize) < network.edge_count() {
                    let k = self.next_id;
                    self.next_id += 1;
                    Some(network.edge_id(k))
                } else {
                    None
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a Edges {
    type Item = EdgeId;
    type IntoIter = EdgeIter<'a>;

    fn into_iter(self) -> EdgeIter<'a> {
        self.iter()
    }
}

/// Live view of one vertex's neighbors on one side.
///
/// Emits a neighbor once per connecting edge, so parallel edges repeat it
/// and the view's size equals the matching degree.
pub struct Neighbors {
    graph: Graph,
    base: VertexId,
    incoming: bool,
}

impl Neighbors {
    pub(crate) fn new(graph: Graph, base: VertexId, incoming: bool) -> Self {
        Self {
            graph,
            base,
            incoming,
        }
    }

    pub fn len(&self) -> usize {
        let core = self.graph.core().borrow();
        debug_check_base(&core, self.base);
        let b = self.base.index();
        match &core.backend {
            Backend::Simple(simple) => {
                if self.incoming {
                    simple.predecessor_set(b).len()
                } else {
                    simple.successor_set(b).len()
                }
            }
            Backend::Network(network) => {
                if self.incoming {
                    network.predecessor_adjacency(b).len()
                } else {
                    network.successor_adjacency(b).len()
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, v: VertexId) -> bool {
        let core = self.graph.core().borrow();
        debug_check_base(&core, self.base);
        let b = self.base.index();
        match &core.backend {
            Backend::Simple(simple) => {
                if self.incoming {
                    simple.predecessor_set(b).contains(v.index())
                } else {
                    simple.successor_set(b).contains(v.index())
                }
            }
            Backend::Network(network) => {
                if self.incoming {
                    network.predecessor_adjacency(b).contains_neighbor(v.index())
                } else {
                    network.successor_adjacency(b).contains_neighbor(v.index())
                }
            }
        }
    }

    pub fn iter(&self) -> NeighborIter<'_> {
        NeighborIter::over(&self.graph, self.base, self.incoming)
    }
}

pub struct NeighborIter<'a> {
    core: Ref<'a, Core>,
    base: u32,
    incoming: bool,
    pos: usize,
    cursor: AdjacencyCursor,
}

impl<'a> NeighborIter<'a> {
    pub(crate) fn over(graph: &'a Graph, base: VertexId, incoming: bool) -> Self {
        Self {
            core: graph.core().borrow(),
            base: base.index(),
            incoming,
            pos: 0,
            cursor: AdjacencyCursor::default(),
        }
    }
}

impl Iterator for NeighborIter<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        match &self.core.backend {
            Backend::Simple(simple) => {
                let set = if self.incoming {
                    simple.predecessor_set(self.base)
                } else {
                    simple.successor_set(self.base)
                };
                set.cursor_next(&mut self.pos).map(VertexId::new)
            }
            Backend::Network(network) => {
                let adjacency = if self.incoming {
                    network.predecessor_adjacency(self.base)
                } else {
                    network.successor_adjacency(self.base)
                };
                adjacency
                    .cursor_next(&mut self.cursor)
                    .map(|(neighbor, _)| VertexId::new(neighbor))
            }
        }
    }
}

impl<'a> IntoIterator for &'a Neighbors {
    type Item = VertexId;
    type IntoIter = NeighborIter<'a>;

    fn into_iter(self) -> NeighborIter<'a> {
        self.iter()
    }
}

/// Live view of the edges touching one vertex on one side
pub struct IncidentEdges {
    graph: Graph,
    base: VertexId,
    incoming: bool,
}

impl IncidentEdges {
    pub(crate) fn new(graph: Graph, base: VertexId, incoming: bool) -> Self {
        Self {
            graph,
            base,
            incoming,
        }
    }

    pub fn len(&self) -> usize {
        Neighbors::new(self.graph.clone(), self.base, self.incoming).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, e: EdgeId) -> bool {
        let core = self.graph.core().borrow();
        debug_check_base(&core, self.base);
        if core.check_edge(e).is_err() {
            return false;
        }
        let (s, t) = core.edge_endpoints(e);
        let b = self.base.index();
        if !core.is_directed() {
            s == b || t == b
        } else if self.incoming {
            t == b
        } else {
            s == b
        }
    }

    pub fn iter(&self) -> IncidentEdgeIter<'_> {
        IncidentEdgeIter::over(&self.graph, self.base, self.incoming)
    }
}

pub struct IncidentEdgeIter<'a> {
    core: Ref<'a, Core>,
    base: u32,
    incoming: bool,
    pos: usize,
    cursor: AdjacencyCursor,
}

impl<'a> IncidentEdgeIter<'a> {
    pub(crate) fn over(graph: &'a Graph, base: VertexId, incoming: bool) -> Self {
        Self {
            core: graph.core().borrow(),
            base: base.index(),
            incoming,
            pos: 0,
            cursor: AdjacencyCursor::default(),
        }
    }
}

impl Iterator for IncidentEdgeIter<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        match &self.core.backend {
            Backend::Simple(simple) => {
                let directed = simple.directed();
                let set = if self.incoming {
                    simple.predecessor_set(self.base)
                } else {
                    simple.successor_set(self.base)
                };
                let neighbor = set.cursor_next(&mut self.pos)?;
                Some(if self.incoming && directed {
                    endpoint_edge_id(true, neighbor, self.base)
                } else {
                    endpoint_edge_id(directed, self.base, neighbor)
                })
            }
            Backend::Network(network) => {
                let adjacency = if self.incoming {
                    network.predecessor_adjacency(self.base)
                } else {
                    network.successor_adjacency(self.base)
                };
                adjacency
                    .cursor_next(&mut self.cursor)
                    .map(|(_, k)| network.edge_id(k))
            }
        }
    }
}

impl<'a> IntoIterator for &'a IncidentEdges {
    type Item = EdgeId;
    type IntoIter = IncidentEdgeIter<'a>;

    fn into_iter(self) -> IncidentEdgeIter<'a> {
        self.iter()
    }
}
