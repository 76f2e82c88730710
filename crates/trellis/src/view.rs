//! The uniform query contract over both engine lifecycles.
//!
//! [`GraphView`] is the seam handed to collaborators that should work
//! against either engine — traversals, transposed adapters, copy helpers
//! and the like live outside this crate and see graphs only through it.

use crate::error::GraphResult;
use crate::frozen::{FrozenEdgeIter, FrozenGraph, FrozenIncidenceIter};
use crate::graph::Graph;
use crate::graph::views::{EdgeIter, IncidentEdgeIter, NeighborIter, VertexIter};
use crate::id::{EdgeId, VertexId};

/// Read access shared by [`Graph`] and [`FrozenGraph`].
///
/// Iterator methods carry the `_iter` suffix because the engines also
/// expose richer inherent views (with O(1) `len` and membership tests)
/// under the plain names.
pub trait GraphView {
    type VertexIter<'a>: Iterator<Item = VertexId>
    where
        Self: 'a;
    type EdgeIter<'a>: Iterator<Item = EdgeId>
    where
        Self: 'a;
    type NeighborIter<'a>: Iterator<Item = VertexId>
    where
        Self: 'a;
    type IncidenceIter<'a>: Iterator<Item = EdgeId>
    where
        Self: 'a;

    fn vertex_count(&self) -> usize;
    fn edge_count(&self) -> usize;
    fn is_directed(&self) -> bool;
    fn contains_vertex(&self, v: VertexId) -> bool;
    fn contains_edge(&self, s: VertexId, t: VertexId) -> bool;
    fn out_degree(&self, v: VertexId) -> GraphResult<usize>;
    fn in_degree(&self, v: VertexId) -> GraphResult<usize>;
    fn edge_between(&self, s: VertexId, t: VertexId) -> GraphResult<EdgeId>;
    fn edges_between(&self, s: VertexId, t: VertexId) -> GraphResult<Vec<EdgeId>>;
    fn edge_source(&self, e: EdgeId) -> GraphResult<VertexId>;
    fn edge_target(&self, e: EdgeId) -> GraphResult<VertexId>;
    fn edge_opposite(&self, e: EdgeId, v: VertexId) -> GraphResult<VertexId>;
    fn vertex_iter(&self) -> Self::VertexIter<'_>;
    fn edge_iter(&self) -> Self::EdgeIter<'_>;
    fn successor_iter(&self, v: VertexId) -> GraphResult<Self::NeighborIter<'_>>;
    fn predecessor_iter(&self, v: VertexId) -> GraphResult<Self::NeighborIter<'_>>;
    fn outgoing_edge_iter(&self, v: VertexId) -> GraphResult<Self::IncidenceIter<'_>>;
    fn incoming_edge_iter(&self, v: VertexId) -> GraphResult<Self::IncidenceIter<'_>>;
}

impl GraphView for Graph {
    type VertexIter<'a> = VertexIter<'a>;
    type EdgeIter<'a> = EdgeIter<'a>;
    type NeighborIter<'a> = NeighborIter<'a>;
    type IncidenceIter<'a> = IncidentEdgeIter<'a>;

    fn vertex_count(&self) -> usize {
        Graph::vertex_count(self)
    }

    fn edge_count(&self) -> usize {
        Graph::edge_count(self)
    }

    fn is_directed(&self) -> bool {
        Graph::is_directed(self)
    }

    fn contains_vertex(&self, v: VertexId) -> bool {
        Graph::contains_vertex(self, v)
    }

    fn contains_edge(&self, s: VertexId, t: VertexId) -> bool {
        Graph::contains_edge(self, s, t)
    }

    fn out_degree(&self, v: VertexId) -> GraphResult<usize> {
        Graph::out_degree(self, v)
    }

    fn in_degree(&self, v: VertexId) -> GraphResult<usize> {
        Graph::in_degree(self, v)
    }

    fn edge_between(&self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        Graph::edge_between(self, s, t)
    }

    fn edges_between(&self, s: VertexId, t: VertexId) -> GraphResult<Vec<EdgeId>> {
        Graph::edges_between(self, s, t)
    }

    fn edge_source(&self, e: EdgeId) -> GraphResult<VertexId> {
        Graph::edge_source(self, e)
    }

    fn edge_target(&self, e: EdgeId) -> GraphResult<VertexId> {
        Graph::edge_target(self, e)
    }

    fn edge_opposite(&self, e: EdgeId, v: VertexId) -> GraphResult<VertexId> {
        Graph::edge_opposite(self, e, v)
    }

    fn vertex_iter(&self) -> VertexIter<'_> {
        VertexIter::over(self)
    }

    fn edge_iter(&self) -> EdgeIter<'_> {
        EdgeIter::over(self)
    }

    fn successor_iter(&self, v: VertexId) -> GraphResult<NeighborIter<'_>> {
        self.successors(v)?;
        Ok(NeighborIter::over(self, v, false))
    }

    fn predecessor_iter(&self, v: VertexId) -> GraphResult<NeighborIter<'_>> {
        self.predecessors(v)?;
        Ok(NeighborIter::over(self, v, true))
    }

    fn outgoing_edge_iter(&self, v: VertexId) -> GraphResult<IncidentEdgeIter<'_>> {
        self.outgoing_edges(v)?;
        Ok(IncidentEdgeIter::over(self, v, false))
    }

    fn incoming_edge_iter(&self, v: VertexId) -> GraphResult<IncidentEdgeIter<'_>> {
        self.incoming_edges(v)?;
        Ok(IncidentEdgeIter::over(self, v, true))
    }
}

impl GraphView for FrozenGraph {
    type VertexIter<'a> = core::iter::Map<core::ops::Range<u32>, fn(u32) -> VertexId>;
    type EdgeIter<'a> = FrozenEdgeIter<'a>;
    type NeighborIter<'a> = core::iter::Copied<core::slice::Iter<'a, VertexId>>;
    type IncidenceIter<'a> = FrozenIncidenceIter<'a>;

    fn vertex_count(&self) -> usize {
        FrozenGraph::vertex_count(self)
    }

    fn edge_count(&self) -> usize {
        FrozenGraph::edge_count(self)
    }

    fn is_directed(&self) -> bool {
        FrozenGraph::is_directed(self)
    }

    fn contains_vertex(&self, v: VertexId) -> bool {
        FrozenGraph::contains_vertex(self, v)
    }

    fn contains_edge(&self, s: VertexId, t: VertexId) -> bool {
        FrozenGraph::contains_edge(self, s, t)
    }

    fn out_degree(&self, v: VertexId) -> GraphResult<usize> {
        FrozenGraph::out_degree(self, v)
    }

    fn in_degree(&self, v: VertexId) -> GraphResult<usize> {
        FrozenGraph::in_degree(self, v)
    }

    fn edge_between(&self, s: VertexId, t: VertexId) -> GraphResult<EdgeId> {
        FrozenGraph::edge_between(self, s, t)
    }

    fn edges_between(&self, s: VertexId, t: VertexId) -> GraphResult<Vec<EdgeId>> {
        FrozenGraph::edges_between(self, s, t)
    }

    fn edge_source(&self, e: EdgeId) -> GraphResult<VertexId> {
        FrozenGraph::edge_source(self, e)
    }

    fn edge_target(&self, e: EdgeId) -> GraphResult<VertexId> {
        FrozenGraph::edge_target(self, e)
    }

    fn edge_opposite(&self, e: EdgeId, v: VertexId) -> GraphResult<VertexId> {
        FrozenGraph::edge_opposite(self, e, v)
    }

    fn vertex_iter(&self) -> Self::VertexIter<'_> {
        self.vertices()
    }

    fn edge_iter(&self) -> FrozenEdgeIter<'_> {
        self.edges()
    }

    fn successor_iter(&self, v: VertexId) -> GraphResult<Self::NeighborIter<'_>> {
        Ok(self.successors(v)?.iter().copied())
    }

    fn predecessor_iter(&self, v: VertexId) -> GraphResult<Self::NeighborIter<'_>> {
        Ok(self.predecessors(v)?.iter().copied())
    }

    fn outgoing_edge_iter(&self, v: VertexId) -> GraphResult<FrozenIncidenceIter<'_>> {
        self.outgoing_edges(v)
    }

    fn incoming_edge_iter(&self, v: VertexId) -> GraphResult<FrozenIncidenceIter<'_>> {
        self.incoming_edges(v)
    }
}
