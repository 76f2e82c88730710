//! Stable references: weak, rebindable handles whose observed identity
//! tracks the structural relabeling the engines perform.
//!
//! The engine keeps a map from the element's *current* key to a weak
//! pointer at the handle's slot. When swap-and-pop moves an element, the
//! tracker rewrites the slot in place and re-files it under the new key; a
//! handle whose element was removed flips to the invalidated state and
//! every later access fails with [`GraphError::InvalidatedReference`].

use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::id::{EdgeId, VertexId};
use core::hash::Hash;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use trellis_core::collections::HashMap;

/// Shared state of one handle: the current key and the liveness flag
#[derive(Clone, Copy)]
pub(crate) struct RefSlot<K> {
    key: K,
    valid: bool,
}

/// Key-to-handle index for one element kind.
///
/// Instantiated with `u32` keys for vertices and `u64` keys for edges
/// (dense id in the network backend, canonical encoding in the simple
/// backend). Entries are weak; dead ones are drained opportunistically on
/// every operation that touches the tracker.
pub(crate) struct RefTracker<K: Copy + Eq + Hash> {
    map: HashMap<K, Weak<Cell<RefSlot<K>>>>,
}

impl<K: Copy + Eq + Hash> RefTracker<K> {
    pub fn new() -> Self {
        Self {
            map: HashMap::default(),
        }
    }

    /// The handle slot for `key`, sharing an existing live one when present
    pub fn acquire(&mut self, key: K) -> Rc<Cell<RefSlot<K>>> {
        self.prune();
        if let Some(slot) = self.map.get(&key).and_then(Weak::upgrade) {
            return slot;
        }
        let slot = Rc::new(Cell::new(RefSlot { key, valid: true }));
        self.map.insert(key, Rc::downgrade(&slot));
        slot
    }

    /// Rebinds handles after a swap-and-pop move of `old` onto `new`.
    ///
    /// `old == new` means the element itself was dropped: its handle is
    /// invalidated. Otherwise the mover's handle is rewritten to `new` and
    /// re-filed there; a prior occupant of `new` referred to the element
    /// that no longer exists after the swap and is invalidated.
    pub fn relocate(&mut self, old: K, new: K) {
        self.prune();
        let migrating = self.map.remove(&old).and_then(|weak| weak.upgrade());
        if old == new {
            if let Some(slot) = migrating {
                slot.set(RefSlot {
                    key: old,
                    valid: false,
                });
            }
            return;
        }
        match migrating {
            Some(slot) => {
                slot.set(RefSlot {
                    key: new,
                    valid: true,
                });
                if let Some(displaced) = self.map.insert(new, Rc::downgrade(&slot)) {
                    invalidate(&displaced);
                }
            }
            None => {
                if let Some(displaced) = self.map.remove(&new) {
                    invalidate(&displaced);
                }
            }
        }
    }

    /// Drops entries whose handles are gone
    fn prune(&mut self) {
        self.map.retain(|_, weak| weak.strong_count() > 0);
    }
}

fn invalidate<K: Copy>(weak: &Weak<Cell<RefSlot<K>>>) {
    if let Some(slot) = weak.upgrade() {
        let state = slot.get();
        slot.set(RefSlot {
            key: state.key,
            valid: false,
        });
    }
}

/// A stable reference to a vertex.
///
/// The handle stays valid across removals of *other* vertices, following
/// the swap-and-pop relabeling; it is invalidated exactly when its own
/// vertex is removed. Two handles are equal when both are valid, refer to
/// the same engine and observe the same current identity — an invalidated
/// handle equals nothing, itself included.
pub struct VertexRef {
    slot: Rc<Cell<RefSlot<u32>>>,
    graph: Graph,
}

impl VertexRef {
    pub(crate) fn new(graph: Graph, v: VertexId) -> Self {
        let slot = graph.core().borrow_mut().vertex_refs.acquire(v.index());
        Self { slot, graph }
    }

    /// Whether the referenced vertex still exists
    pub fn is_valid(&self) -> bool {
        self.slot.get().valid
    }

    /// The current identity of the referenced vertex
    pub fn current(&self) -> GraphResult<VertexId> {
        let state = self.slot.get();
        if state.valid {
            Ok(VertexId::new(state.key))
        } else {
            Err(GraphError::InvalidatedReference)
        }
    }

    /// The engine the referenced vertex belongs to
    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl PartialEq for VertexRef {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.slot.get(), other.slot.get());
        a.valid && b.valid && a.key == b.key && Graph::same_engine(&self.graph, &other.graph)
    }
}

/// A stable reference to an edge; the edge twin of [`VertexRef`].
///
/// Tracks edge-table renumbering in the network backend and encoding
/// relabels in the simple backend.
pub struct EdgeRef {
    slot: Rc<Cell<RefSlot<u64>>>,
    graph: Graph,
}

impl EdgeRef {
    pub(crate) fn new(graph: Graph, e: EdgeId) -> Self {
        let key = graph.core().borrow().edge_ref_key(e);
        let slot = graph.core().borrow_mut().edge_refs.acquire(key);
        Self { slot, graph }
    }

    /// Whether the referenced edge still exists
    pub fn is_valid(&self) -> bool {
        self.slot.get().valid
    }

    /// The current identity of the referenced edge
    pub fn current(&self) -> GraphResult<EdgeId> {
        let state = self.slot.get();
        if !state.valid {
            return Err(GraphError::InvalidatedReference);
        }
        Ok(self.graph.core().borrow().edge_id_from_ref_key(state.key))
    }

    /// The engine the referenced edge belongs to
    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl PartialEq for EdgeRef {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.slot.get(), other.slot.get());
        a.valid && b.valid && a.key == b.key && Graph::same_engine(&self.graph, &other.graph)
    }
}
