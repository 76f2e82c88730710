use crate::id::{EdgeId, VertexId};

/// Errors reported by the graph engines, property maps and stable
/// references.
///
/// Every mutation either completes in full or fails with one of these
/// without visible state change; nothing is retried or repaired in place.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// A vertex identity unknown to the engine was supplied
    #[error("vertex {0} is not part of this graph")]
    UnknownVertex(VertexId),
    /// An edge identity unknown to the engine was supplied
    #[error("edge {0} is not part of this graph")]
    UnknownEdge(EdgeId),
    /// At most one edge may connect an ordered endpoint pair unless the
    /// engine was built with multi-edge support
    #[error("an edge from {0} to {1} already exists")]
    EdgeAlreadyExists(VertexId, VertexId),
    /// No edge connects the queried endpoint pair
    #[error("no edge between {0} and {1}")]
    NoSuchEdge(VertexId, VertexId),
    /// The vertex handed to `edge_opposite` is not an endpoint of the edge
    #[error("vertex {1} is not an endpoint of edge {0}")]
    NotAnEndpoint(EdgeId, VertexId),
    /// Read of a vertex value that was never written, on a property created
    /// without an initializer
    #[error("vertex {0} has no value in this property")]
    UninitializedVertex(VertexId),
    /// Read of an edge value that was never written, on a property created
    /// without an initializer
    #[error("edge {0} has no value in this property")]
    UninitializedEdge(EdgeId),
    /// Access through a stable reference whose element was removed
    #[error("the referenced element was removed from the graph")]
    InvalidatedReference,
}

pub type GraphResult<T> = Result<T, GraphError>;
