use crate::error::{GraphError, GraphResult};
use crate::id::{EdgeId, VertexId};
use smallvec::{SmallVec, smallvec};
use trellis_core::collections::CompactMap;

/// Tag bit marking an adjacency word as an overflow-pool index rather than
/// an inline edge id. Edge ids therefore top out at `2^31 - 1`.
const OVERFLOW_BIT: u32 = 1 << 31;

/// Parallel edges between one ordered endpoint pair
struct ParallelEdges {
    neighbor: u32,
    ids: SmallVec<[u32; 2]>,
}

/// Outcome of erasing one edge id from an adjacency
pub(crate) enum AdjacencyRemoval {
    Missing,
    Removed,
    /// Removed, and the neighbor dropped back from parallel to a single edge
    Unparalleled,
}

/// Cursor over the `(neighbor, edge id)` entries of an [`EdgeAdjacency`];
/// O(1) state, meaningful only while the adjacency is not mutated
#[derive(Default, Clone, Copy)]
pub(crate) struct AdjacencyCursor {
    map_pos: usize,
    /// In-progress overflow list: `(neighbor, pool index, next position)`
    list: Option<(u32, u32, usize)>,
}

/// Incidence of one vertex in the network backend.
///
/// Each neighbor maps to a single inline edge id in the common case, or to
/// a tagged index into the overflow pool once parallel edges appear.
pub(crate) struct EdgeAdjacency {
    map: CompactMap<u32>,
    overflow: Vec<ParallelEdges>,
    /// Total incident edge ids, parallels each counted
    len: usize,
}

impl EdgeAdjacency {
    fn new() -> Self {
        Self {
            map: CompactMap::new(),
            overflow: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn contains_neighbor(&self, neighbor: u32) -> bool {
        self.map.contains_key(neighbor)
    }

    pub fn first_edge_to(&self, neighbor: u32) -> Option<u32> {
        let word = self.map.get(neighbor)?;
        if word & OVERFLOW_BIT == 0 {
            Some(word)
        } else {
            Some(self.overflow[(word & !OVERFLOW_BIT) as usize].ids[0])
        }
    }

    pub fn edges_to(&self, neighbor: u32, out: &mut Vec<u32>) {
        let Some(word) = self.map.get(neighbor) else {
            return;
        };
        if word & OVERFLOW_BIT == 0 {
            out.push(word);
        } else {
            out.extend_from_slice(&self.overflow[(word & !OVERFLOW_BIT) as usize].ids);
        }
    }

    /// Records edge `id` towards `neighbor`; returns `true` when the
    /// neighbor just went parallel (one inline id became a list of two)
    pub fn add(&mut self, neighbor: u32, id: u32) -> bool {
        debug_assert_eq!(id & OVERFLOW_BIT, 0);
        self.len += 1;
        let Some(word) = self.map.get(neighbor) else {
            self.map.insert(neighbor, id);
            return false;
        };
        if word & OVERFLOW_BIT == 0 {
            let pool_index = self.overflow.len() as u32;
            self.overflow.push(ParallelEdges {
                neighbor,
                ids: smallvec![word, id],
            });
            if let Some(slot) = self.map.get_mut(neighbor) {
                *slot = OVERFLOW_BIT | pool_index;
            }
            true
        } else {
            self.overflow[(word & !OVERFLOW_BIT) as usize].ids.push(id);
            false
        }
    }

    /// Erases edge `id` towards `neighbor`
    pub fn remove(&mut self, neighbor: u32, id: u32) -> AdjacencyRemoval {
        let Some(word) = self.map.get(neighbor) else {
            return AdjacencyRemoval::Missing;
        };
        if word & OVERFLOW_BIT == 0 {
            if word != id {
                return AdjacencyRemoval::Missing;
            }
            self.map.remove(neighbor);
            self.len -= 1;
            return AdjacencyRemoval::Removed;
        }
        let pool_index = (word & !OVERFLOW_BIT) as usize;
        let list = &mut self.overflow[pool_index];
        let Some(at) = list.ids.iter().position(|&k| k == id) else {
            return AdjacencyRemoval::Missing;
        };
        list.ids.swap_remove(at);
        self.len -= 1;
        if list.ids.len() > 1 {
            return AdjacencyRemoval::Removed;
        }
        // Back to a single edge: inline it and retire the pool slot
        let survivor = list.ids[0];
        if let Some(slot) = self.map.get_mut(neighbor) {
            *slot = survivor;
        }
        self.overflow.swap_remove(pool_index);
        if let Some(moved) = self.overflow.get(pool_index) {
            let moved_neighbor = moved.neighbor;
            if let Some(slot) = self.map.get_mut(moved_neighbor) {
                *slot = OVERFLOW_BIT | pool_index as u32;
            }
        }
        AdjacencyRemoval::Unparalleled
    }

    /// Renumbers one stored edge id, after edge-table compaction
    pub fn rewrite_edge_id(&mut self, neighbor: u32, old_id: u32, new_id: u32) {
        let Some(word) = self.map.get(neighbor) else {
            return;
        };
        if word & OVERFLOW_BIT == 0 {
            if word == old_id {
                if let Some(slot) = self.map.get_mut(neighbor) {
                    *slot = new_id;
                }
            }
        } else {
            let list = &mut self.overflow[(word & !OVERFLOW_BIT) as usize];
            for id in list.ids.iter_mut() {
                if *id == old_id {
                    *id = new_id;
                }
            }
        }
    }

    /// Moves the entry for `old` under the key `new`, after vertex
    /// relabeling. Idempotent when `old` is already gone.
    pub fn rename_neighbor(&mut self, old: u32, new: u32) {
        if let Some(word) = self.map.remove(old) {
            self.map.insert(new, word);
            if word & OVERFLOW_BIT != 0 {
                self.overflow[(word & !OVERFLOW_BIT) as usize].neighbor = new;
            }
        }
    }

    pub fn cursor_next(&self, cursor: &mut AdjacencyCursor) -> Option<(u32, u32)> {
        if let Some((neighbor, pool_index, at)) = &mut cursor.list {
            let list = &self.overflow[*pool_index as usize];
            if let Some(&id) = list.ids.get(*at) {
                *at += 1;
                return Some((*neighbor, id));
            }
            cursor.list = None;
        }
        let (neighbor, word) = self.map.cursor_next(&mut cursor.map_pos)?;
        if word & OVERFLOW_BIT == 0 {
            Some((neighbor, word))
        } else {
            let pool_index = word & !OVERFLOW_BIT;
            cursor.list = Some((neighbor, pool_index, 1));
            Some((neighbor, self.overflow[pool_index as usize].ids[0]))
        }
    }
}

/// Adjacency engine for networks: explicit edge identities in a dense edge
/// table, with per-source [`EdgeAdjacency`] carrying the id lists.
///
/// Edge ids are exactly `0..edge_count`; removal compacts the table by
/// moving the highest id into the vacated slot, and the owner rehomes
/// properties and references with the `(removed, survivor)` pair the
/// mutation methods report.
pub(crate) struct NetworkTopology {
    directed: bool,
    multi: bool,
    succ: Vec<EdgeAdjacency>,
    /// Directed mode only, materialized on first use
    pred: Option<Vec<EdgeAdjacency>>,
    /// Edge id to `(source, target)`, in construction order
    edges: Vec<(u32, u32)>,
    /// Successor-side adjacency entries currently holding parallel edges.
    /// Non-zero exactly when the network currently contains a multi-edge.
    parallel_groups: usize,
}

impl NetworkTopology {
    pub fn new(directed: bool, multi: bool) -> Self {
        Self {
            directed,
            multi,
            succ: Vec::new(),
            pred: None,
            edges: Vec::new(),
            parallel_groups: 0,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.succ.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn has_multi_edges(&self) -> bool {
        self.parallel_groups > 0
    }

    pub fn add_vertex(&mut self) -> u32 {
        let v = self.succ.len();
        self.succ.push(EdgeAdjacency::new());
        if let Some(pred) = &mut self.pred {
            pred.push(EdgeAdjacency::new());
        }
        v as u32
    }

    pub fn reserve_vertices(&mut self, additional: usize) {
        self.succ.reserve(additional);
        if let Some(pred) = &mut self.pred {
            pred.reserve(additional);
        }
    }

    pub fn reserve_edges(&mut self, additional: usize) {
        self.edges.reserve(additional);
    }

    /// Endpoints of edge `k`, in construction order
    #[inline]
    pub fn endpoints(&self, k: u32) -> (u32, u32) {
        self.edges[k as usize]
    }

    /// Full identity of edge `k`: dense index plus the locality hint word
    pub fn edge_id(&self, k: u32) -> EdgeId {
        let (s, t) = self.endpoints(k);
        let hint = if self.directed { t } else { s.max(t) };
        EdgeId::from_words(hint, k)
    }

    #[inline]
    pub fn contains_edge(&self, s: u32, t: u32) -> bool {
        self.succ
            .get(s as usize)
            .is_some_and(|adj| adj.contains_neighbor(t))
    }

    pub fn first_edge_between(&self, s: u32, t: u32) -> Option<u32> {
        self.succ[s as usize].first_edge_to(t)
    }

    pub fn edges_between(&self, s: u32, t: u32, out: &mut Vec<u32>) {
        self.succ[s as usize].edges_to(t, out);
    }

    /// Allocates the next dense edge id for `(s, t)`. Endpoints were
    /// validated by the caller.
    pub fn add_edge(&mut self, s: u32, t: u32) -> GraphResult<EdgeId> {
        if !self.multi && self.succ[s as usize].contains_neighbor(t) {
            return Err(GraphError::EdgeAlreadyExists(
                VertexId::new(s),
                VertexId::new(t),
            ));
        }
        let k = self.edges.len() as u32;
        debug_assert!(k < OVERFLOW_BIT, "edge id space exhausted");
        self.edges.push((s, t));
        if self.succ[s as usize].add(t, k) {
            self.parallel_groups += 1;
        }
        if s != t {
            if !self.directed {
                if self.succ[t as usize].add(s, k) {
                    self.parallel_groups += 1;
                }
            } else if let Some(pred) = &mut self.pred {
                pred[t as usize].add(s, k);
            }
        } else if self.directed {
            // A directed self-loop is incident on both sides of its vertex
            if let Some(pred) = &mut self.pred {
                pred[s as usize].add(s, k);
            }
        }
        Ok(self.edge_id(k))
    }

    /// Erases edge `k` and compacts the edge table. Returns the previous id
    /// of the edge that now occupies slot `k`, if any moved.
    pub fn remove_edge(&mut self, k: u32) -> Option<u32> {
        let (s, t) = self.endpoints(k);
        if let AdjacencyRemoval::Unparalleled = self.succ[s as usize].remove(t, k) {
            self.parallel_groups -= 1;
        }
        if s != t {
            if !self.directed {
                if let AdjacencyRemoval::Unparalleled = self.succ[t as usize].remove(s, k) {
                    self.parallel_groups -= 1;
                }
            } else if let Some(pred) = &mut self.pred {
                pred[t as usize].remove(s, k);
            }
        } else if self.directed {
            if let Some(pred) = &mut self.pred {
                pred[s as usize].remove(s, k);
            }
        }

        let last = (self.edges.len() - 1) as u32;
        self.edges.swap_remove(k as usize);
        if k == last {
            return None;
        }
        // The edge formerly known as `last` now answers to `k`
        log::trace!("renumbering edge {last} as {k}");
        let (ls, lt) = self.edges[k as usize];
        self.succ[ls as usize].rewrite_edge_id(lt, last, k);
        if ls != lt {
            if !self.directed {
                self.succ[lt as usize].rewrite_edge_id(ls, last, k);
            } else if let Some(pred) = &mut self.pred {
                pred[lt as usize].rewrite_edge_id(ls, last, k);
            }
        } else if self.directed {
            if let Some(pred) = &mut self.pred {
                pred[ls as usize].rewrite_edge_id(ls, last, k);
            }
        }
        Some(last)
    }

    #[inline]
    pub fn out_degree(&self, v: u32) -> usize {
        self.succ[v as usize].len()
    }

    /// In-degree; materializes the predecessor adjacencies in directed mode
    pub fn in_degree(&mut self, v: u32) -> usize {
        if !self.directed {
            return self.out_degree(v);
        }
        self.materialize_pred();
        match &self.pred {
            Some(pred) => pred[v as usize].len(),
            None => 0,
        }
    }

    #[inline]
    pub fn successor_adjacency(&self, v: u32) -> &EdgeAdjacency {
        &self.succ[v as usize]
    }

    /// See [`SimpleTopology::predecessor_set`] for the materialization
    /// contract; same rules apply here.
    ///
    /// [`SimpleTopology::predecessor_set`]: super::simple::SimpleTopology::predecessor_set
    pub fn predecessor_adjacency(&self, v: u32) -> &EdgeAdjacency {
        if !self.directed {
            return self.successor_adjacency(v);
        }
        match &self.pred {
            Some(pred) => &pred[v as usize],
            None => {
                debug_assert!(false, "predecessor adjacency read before materialization");
                self.successor_adjacency(v)
            }
        }
    }

    pub fn first_outgoing(&self, v: u32) -> Option<u32> {
        let mut cursor = AdjacencyCursor::default();
        self.succ[v as usize].cursor_next(&mut cursor).map(|(_, k)| k)
    }

    pub fn first_incoming(&mut self, v: u32) -> Option<u32> {
        if !self.directed {
            return self.first_outgoing(v);
        }
        self.materialize_pred();
        let pred = self.pred.as_ref()?;
        let mut cursor = AdjacencyCursor::default();
        pred[v as usize].cursor_next(&mut cursor).map(|(_, k)| k)
    }

    /// Builds the predecessor adjacencies from the edge table. Idempotent;
    /// from then on `pred` participates in every mutation.
    pub fn materialize_pred(&mut self) {
        if !self.directed || self.pred.is_some() {
            return;
        }
        log::debug!(
            "materializing predecessor adjacencies for {} vertices",
            self.succ.len()
        );
        let mut pred = Vec::new();
        pred.resize_with(self.succ.len(), EdgeAdjacency::new);
        for (k, &(s, t)) in self.edges.iter().enumerate() {
            pred[t as usize].add(s, k as u32);
        }
        self.pred = Some(pred);
    }

    /// Compacts the vertex table after `v`'s incident edges were drained:
    /// the highest index moves into slot `v`, the edge table and every
    /// adjacency naming it are rewritten. Edge ids do not change, so there
    /// is nothing to rehome beyond the vertex slot itself.
    pub fn relocate_last(&mut self, v: u32) {
        debug_assert!(self.succ[v as usize].len() == 0);
        let last = (self.succ.len() - 1) as u32;
        if v == last {
            self.succ.pop();
            if let Some(pred) = &mut self.pred {
                pred.pop();
            }
            return;
        }
        debug_assert!(!self.directed || self.pred.is_some());
        log::trace!("relabeling vertex {last} as {v}");

        let mut out_pairs = Vec::new();
        let mut cursor = AdjacencyCursor::default();
        while let Some(pair) = self.succ[last as usize].cursor_next(&mut cursor) {
            out_pairs.push(pair);
        }
        for &(_, k) in &out_pairs {
            let ends = &mut self.edges[k as usize];
            if ends.0 == last {
                ends.0 = v;
            }
            if ends.1 == last {
                ends.1 = v;
            }
        }
        for &(t, _) in &out_pairs {
            if t == last {
                continue;
            }
            if !self.directed {
                self.succ[t as usize].rename_neighbor(last, v);
            } else if let Some(pred) = &mut self.pred {
                pred[t as usize].rename_neighbor(last, v);
            }
        }
        if self.directed {
            let mut in_pairs = Vec::new();
            if let Some(pred) = &self.pred {
                let mut cursor = AdjacencyCursor::default();
                while let Some(pair) = pred[last as usize].cursor_next(&mut cursor) {
                    in_pairs.push(pair);
                }
            }
            for &(s, k) in &in_pairs {
                if s == last {
                    // The self-loop's endpoints were rewritten above
                    continue;
                }
                let ends = &mut self.edges[k as usize];
                if ends.1 == last {
                    ends.1 = v;
                }
                self.succ[s as usize].rename_neighbor(last, v);
            }
        }

        self.succ.swap_remove(v as usize);
        self.succ[v as usize].rename_neighbor(last, v);
        if let Some(pred) = &mut self.pred {
            pred.swap_remove(v as usize);
            pred[v as usize].rename_neighbor(last, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(adjacency: &EdgeAdjacency) -> Vec<(u32, u32)> {
        let mut cursor = AdjacencyCursor::default();
        let mut out = Vec::new();
        while let Some(pair) = adjacency.cursor_next(&mut cursor) {
            out.push(pair);
        }
        out.sort_unstable();
        out
    }

    #[test]
    fn parallel_edges_spill_into_the_pool_and_inline_back() {
        let mut adjacency = EdgeAdjacency::new();
        assert!(!adjacency.add(4, 10));
        assert!(adjacency.add(4, 11));
        assert!(!adjacency.add(4, 12));
        assert_eq!(adjacency.len(), 3);
        assert_eq!(collect(&adjacency), [(4, 10), (4, 11), (4, 12)]);

        assert!(matches!(
            adjacency.remove(4, 11),
            AdjacencyRemoval::Removed
        ));
        assert!(matches!(
            adjacency.remove(4, 10),
            AdjacencyRemoval::Unparalleled
        ));
        assert_eq!(adjacency.first_edge_to(4), Some(12));
        assert!(matches!(adjacency.remove(4, 12), AdjacencyRemoval::Removed));
        assert!(matches!(adjacency.remove(4, 12), AdjacencyRemoval::Missing));
        assert_eq!(adjacency.len(), 0);
    }

    #[test]
    fn retiring_a_pool_slot_refixes_the_moved_entry() {
        let mut adjacency = EdgeAdjacency::new();
        // Two pooled neighbors so retiring the first relocates the second
        adjacency.add(1, 10);
        adjacency.add(1, 11);
        adjacency.add(2, 20);
        adjacency.add(2, 21);

        assert!(matches!(
            adjacency.remove(1, 10),
            AdjacencyRemoval::Unparalleled
        ));
        // Neighbor 2 must still resolve through its (relocated) pool slot
        assert_eq!(collect(&adjacency), [(1, 11), (2, 20), (2, 21)]);
        let mut ids = Vec::new();
        adjacency.edges_to(2, &mut ids);
        ids.sort_unstable();
        assert_eq!(ids, [20, 21]);
    }

    #[test]
    fn renaming_a_pooled_neighbor_keeps_its_list() {
        let mut adjacency = EdgeAdjacency::new();
        adjacency.add(7, 1);
        adjacency.add(7, 2);
        adjacency.rename_neighbor(7, 3);
        assert!(!adjacency.contains_neighbor(7));
        let mut ids = Vec::new();
        adjacency.edges_to(3, &mut ids);
        ids.sort_unstable();
        assert_eq!(ids, [1, 2]);

        adjacency.rewrite_edge_id(3, 2, 9);
        let mut ids = Vec::new();
        adjacency.edges_to(3, &mut ids);
        ids.sort_unstable();
        assert_eq!(ids, [1, 9]);
    }
}
