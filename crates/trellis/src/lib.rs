//! In-memory graph topology and property store.
//!
//! Four topology variants — (directed | undirected) × (simple | multi-edge)
//! — behind one contract, with typed dense property maps and stable
//! references that stay synchronized with the topology across mutation.
//!
//! The engines use compacted addressing: identities are dense indices, and
//! removal swaps the highest index into the vacated slot. Every removal
//! therefore cascades in a fixed order through the topology itself, the
//! registered [`property`] maps and the outstanding [`reference`] handles.
//!
//! * [`Graph`] — the mutable engine, built over per-vertex adjacency sets
//!   ([`graph`]) and the compact containers of `trellis_core`.
//! * [`frozen::FrozenGraphBuilder`] / [`frozen::FrozenGraph`] — staged
//!   construction finalized into frozen, sorted adjacency arrays, safe for
//!   concurrent readers.
//! * [`GraphView`] — the read contract shared by both lifecycles.
//!
//! Traversal algorithms, transposed or induced views, graph copying and
//! any I/O are deliberately out of scope; they are collaborators built on
//! the [`GraphView`] seam.

pub mod error;
pub mod frozen;
pub mod graph;
pub mod id;
pub mod property;
pub mod reference;
pub mod view;

pub use error::{GraphError, GraphResult};
pub use frozen::{FrozenGraph, FrozenGraphBuilder};
pub use graph::{Graph, GraphOptions};
pub use id::{EdgeId, VertexId};
pub use property::{EdgeProperty, VertexProperty};
pub use reference::{EdgeRef, VertexRef};
pub use view::GraphView;
