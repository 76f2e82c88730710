//! Property maps: total, typed side data kept synchronized with a mutable
//! graph engine.
//!
//! A property registers weakly with its engine at creation. Every
//! structural mutation that relocates or drops an identity fans out a
//! [`swap_and_remove`] call through the registry, so the stored values
//! follow the compacting moves the engine performs. Dropping the property
//! object is enough to unsubscribe; the engine prunes dead registrations on
//! its next pass.
//!
//! [`swap_and_remove`]: VertexPropertyHook::swap_and_remove

mod dense;

pub(crate) use dense::DenseStore;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Backend, Graph};
use crate::id::{EdgeId, VertexId};
use std::cell::RefCell;
use std::rc::Rc;
use trellis_core::collections::HashMap;

/// Engine-side interface of a vertex property: the rehoming hook invoked
/// during the mutation fan-out, and the capacity hint
pub(crate) trait VertexPropertyHook {
    /// Moves the value of `survivor` (the element that now answers to
    /// `removed`'s identity) into `removed`'s slot and drops the tail slot.
    /// When both arguments are equal the slot is simply dropped.
    fn swap_and_remove(&self, removed: VertexId, survivor: VertexId);
    fn reserve(&self, additional: usize);
}

/// Engine-side interface of an edge property; same contract as
/// [`VertexPropertyHook`] with edge identities
pub(crate) trait EdgePropertyHook {
    fn swap_and_remove(&self, removed: EdgeId, survivor: EdgeId);
    fn reserve(&self, additional: usize);
}

type VertexInit<T> = Box<dyn Fn(VertexId) -> T>;
type EdgeInit<T> = Box<dyn Fn(EdgeId) -> T>;

struct VertexShared<T: 'static> {
    store: RefCell<DenseStore<T>>,
    init: Option<VertexInit<T>>,
}

/// A total map from the engine's current vertices to `T`.
///
/// Values are initialized lazily on first access through the initializer
/// the property was created with; a property created without one fails
/// reads of unwritten slots instead. Vertices added after creation are
/// covered the same way.
///
/// The four fixed-width numerics and `bool` are stored as packed word
/// arrays, other types as option slots; see [`Graph::vertex_property`].
pub struct VertexProperty<T: 'static> {
    shared: Rc<VertexShared<T>>,
    graph: Graph,
}

impl<T: 'static> VertexProperty<T> {
    pub(crate) fn register(graph: Graph, init: Option<VertexInit<T>>) -> Self {
        let shared = Rc::new(VertexShared {
            store: RefCell::new(DenseStore::new()),
            init,
        });
        graph.core().borrow_mut().subscribe_vertex_property(&shared);
        Self { shared, graph }
    }

    /// The engine this property is coupled to
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The value of `v`, initializing the slot on first access.
    ///
    /// Fails with [`GraphError::UnknownVertex`] if `v` is not part of the
    /// engine and [`GraphError::UninitializedVertex`] if the slot is empty
    /// and the property has no initializer.
    pub fn get(&self, v: VertexId) -> GraphResult<T>
    where
        T: Clone,
    {
        let core = self.graph.core().borrow();
        core.check_vertex(v)?;
        let at = v.index() as usize;
        let mut store = self.shared.store.borrow_mut();
        store.ensure_len(core.vertex_count());
        if let Some(value) = store.get(at) {
            return Ok(value);
        }
        let Some(init) = &self.shared.init else {
            return Err(GraphError::UninitializedVertex(v));
        };
        let value = init(v);
        store.set(at, value.clone());
        Ok(value)
    }

    /// Calls `f` on the value of `v`, initializing the slot on first
    /// access; the borrow-based sibling of [`get`](Self::get) for value
    /// types that are not `Clone`
    pub fn with<R>(&self, v: VertexId, f: impl FnOnce(&T) -> R) -> GraphResult<R> {
        let core = self.graph.core().borrow();
        core.check_vertex(v)?;
        let at = v.index() as usize;
        let mut store = self.shared.store.borrow_mut();
        store.ensure_len(core.vertex_count());
        if !store.is_initialized(at) {
            let Some(init) = &self.shared.init else {
                return Err(GraphError::UninitializedVertex(v));
            };
            store.set(at, init(v));
        }
        store
            .with_value(at, f)
            .ok_or(GraphError::UninitializedVertex(v))
    }

    /// Writes the value of `v`
    pub fn set(&self, v: VertexId, value: T) -> GraphResult<()> {
        let core = self.graph.core().borrow();
        core.check_vertex(v)?;
        let mut store = self.shared.store.borrow_mut();
        store.ensure_len(core.vertex_count());
        store.set(v.index() as usize, value);
        Ok(())
    }

    /// Capacity hint; semantics are unaffected
    pub fn ensure_capacity(&self, n: usize) {
        let mut store = self.shared.store.borrow_mut();
        let additional = n.saturating_sub(store.len());
        store.reserve(additional);
    }
}

impl<T: 'static> VertexPropertyHook for VertexShared<T> {
    fn swap_and_remove(&self, removed: VertexId, survivor: VertexId) {
        let mut store = self.store.borrow_mut();
        let (r, s) = (removed.index() as usize, survivor.index() as usize);
        if r != s {
            if let Some(init) = &self.init {
                // A lazy slot is pinned to its value before the identity
                // under which the initializer would see it goes away
                if !store.is_initialized(s) {
                    store.ensure_len(s + 1);
                    store.set(s, init(survivor));
                }
            }
        }
        store.swap_remove(r, s);
    }

    fn reserve(&self, additional: usize) {
        self.store.borrow_mut().reserve(additional);
    }
}

/// Storage of one edge property, picked by the engine backend at creation
pub(crate) enum EdgeStore<T: 'static> {
    /// Network backend: the low identity word is a dense table index
    Indexed(DenseStore<T>),
    /// Simple backend: keyed by the full canonical encoding
    Keyed(HashMap<u64, T>),
}

struct EdgeShared<T: 'static> {
    store: RefCell<EdgeStore<T>>,
    init: Option<EdgeInit<T>>,
}

/// A total map from the engine's current edges to `T`; the edge twin of
/// [`VertexProperty`]
pub struct EdgeProperty<T: 'static> {
    shared: Rc<EdgeShared<T>>,
    graph: Graph,
}

impl<T: 'static> EdgeProperty<T> {
    pub(crate) fn register(graph: Graph, init: Option<EdgeInit<T>>) -> Self {
        let store = match &graph.core().borrow().backend {
            Backend::Simple(_) => EdgeStore::Keyed(HashMap::default()),
            Backend::Network(_) => EdgeStore::Indexed(DenseStore::new()),
        };
        let shared = Rc::new(EdgeShared {
            store: RefCell::new(store),
            init,
        });
        graph.core().borrow_mut().subscribe_edge_property(&shared);
        Self { shared, graph }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The value of `e`, initializing the slot on first access; fails with
    /// [`GraphError::UnknownEdge`] or [`GraphError::UninitializedEdge`]
    pub fn get(&self, e: EdgeId) -> GraphResult<T>
    where
        T: Clone,
    {
        let core = self.graph.core().borrow();
        core.check_edge(e)?;
        let e = core.authoritative_edge_id(e);
        let mut store = self.shared.store.borrow_mut();
        match &mut *store {
            EdgeStore::Indexed(dense) => {
                let at = e.low() as usize;
                dense.ensure_len(core.edge_count());
                if let Some(value) = dense.get(at) {
                    return Ok(value);
                }
                let Some(init) = &self.shared.init else {
                    return Err(GraphError::UninitializedEdge(e));
                };
                let value = init(e);
                dense.set(at, value.clone());
                Ok(value)
            }
            EdgeStore::Keyed(map) => {
                if let Some(value) = map.get(&e.to_bits()) {
                    return Ok(value.clone());
                }
                let Some(init) = &self.shared.init else {
                    return Err(GraphError::UninitializedEdge(e));
                };
                let value = init(e);
                map.insert(e.to_bits(), value.clone());
                Ok(value)
            }
        }
    }

    /// Calls `f` on the value of `e`, initializing the slot on first access
    pub fn with<R>(&self, e: EdgeId, f: impl FnOnce(&T) -> R) -> GraphResult<R> {
        let core = self.graph.core().borrow();
        core.check_edge(e)?;
        let e = core.authoritative_edge_id(e);
        let mut store = self.shared.store.borrow_mut();
        match &mut *store {
            EdgeStore::Indexed(dense) => {
                let at = e.low() as usize;
                dense.ensure_len(core.edge_count());
                if !dense.is_initialized(at) {
                    let Some(init) = &self.shared.init else {
                        return Err(GraphError::UninitializedEdge(e));
                    };
                    dense.set(at, init(e));
                }
                dense
                    .with_value(at, f)
                    .ok_or(GraphError::UninitializedEdge(e))
            }
            EdgeStore::Keyed(map) => {
                if !map.contains_key(&e.to_bits()) {
                    let Some(init) = &self.shared.init else {
                        return Err(GraphError::UninitializedEdge(e));
                    };
                    map.insert(e.to_bits(), init(e));
                }
                map.get(&e.to_bits())
                    .map(f)
                    .ok_or(GraphError::UninitializedEdge(e))
            }
        }
    }

    /// Writes the value of `e`
    pub fn set(&self, e: EdgeId, value: T) -> GraphResult<()> {
        let core = self.graph.core().borrow();
        core.check_edge(e)?;
        let e = core.authoritative_edge_id(e);
        let mut store = self.shared.store.borrow_mut();
        match &mut *store {
            EdgeStore::Indexed(dense) => {
                dense.ensure_len(core.edge_count());
                dense.set(e.low() as usize, value);
            }
            EdgeStore::Keyed(map) => {
                map.insert(e.to_bits(), value);
            }
        }
        Ok(())
    }

    /// Capacity hint; semantics are unaffected
    pub fn ensure_capacity(&self, n: usize) {
        let mut store = self.shared.store.borrow_mut();
        match &mut *store {
            EdgeStore::Indexed(dense) => {
                let additional = n.saturating_sub(dense.len());
                dense.reserve(additional);
            }
            EdgeStore::Keyed(map) => {
                let additional = n.saturating_sub(map.len());
                map.reserve(additional);
            }
        }
    }
}

impl<T: 'static> EdgePropertyHook for EdgeShared<T> {
    fn swap_and_remove(&self, removed: EdgeId, survivor: EdgeId) {
        let mut store = self.store.borrow_mut();
        match &mut *store {
            EdgeStore::Indexed(dense) => {
                let (r, s) = (removed.low() as usize, survivor.low() as usize);
                if r != s {
                    if let Some(init) = &self.init {
                        if !dense.is_initialized(s) {
                            dense.ensure_len(s + 1);
                            dense.set(s, init(survivor));
                        }
                    }
                }
                dense.swap_remove(r, s);
            }
            EdgeStore::Keyed(map) => {
                if removed == survivor {
                    map.remove(&removed.to_bits());
                    return;
                }
                // A vertex relabel changed the encoding: the stored value
                // follows its edge to the new key
                let value = match map.remove(&survivor.to_bits()) {
                    Some(value) => Some(value),
                    None => self.init.as_ref().map(|init| init(survivor)),
                };
                match value {
                    Some(value) => {
                        map.insert(removed.to_bits(), value);
                    }
                    None => {
                        map.remove(&removed.to_bits());
                    }
                }
            }
        }
    }

    fn reserve(&self, additional: usize) {
        match &mut *self.store.borrow_mut() {
            EdgeStore::Indexed(dense) => dense.reserve(additional),
            EdgeStore::Keyed(map) => map.reserve(additional),
        }
    }
}
