use crate::error::{GraphError, GraphResult};
use crate::id::{EdgeId, VertexId, endpoint_edge_id};
use trellis_core::collections::CompactSet;

/// Adjacency engine for simple graphs: one [`CompactSet`] of neighbors per
/// source vertex.
///
/// An edge's identity equals its endpoint pair, so the engine keeps no edge
/// table. Removing an edge relocates nothing; removing a vertex relabels
/// every edge that touched the highest index, and [`relocate_last`] reports
/// those relabels so the owner can rehome properties and references.
///
/// [`relocate_last`]: SimpleTopology::relocate_last
pub(crate) struct SimpleTopology {
    directed: bool,
    succ: Vec<CompactSet>,
    /// Predecessor sets, directed mode only, materialized on first use.
    /// Once materialized they mirror every mutation `succ` sees.
    pred: Option<Vec<CompactSet>>,
    edge_count: usize,
}

impl SimpleTopology {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            succ: Vec::new(),
            pred: None,
            edge_count: 0,
        }
    }

    #[inline]
    pub fn directed(&self) -> bool {
        self.directed
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.succ.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn add_vertex(&mut self) -> u32 {
        let v = self.succ.len();
        self.succ.push(CompactSet::new());
        if let Some(pred) = &mut self.pred {
            pred.push(CompactSet::new());
        }
        v as u32
    }

    pub fn reserve_vertices(&mut self, additional: usize) {
        self.succ.reserve(additional);
        if let Some(pred) = &mut self.pred {
            pred.reserve(additional);
        }
    }

    #[inline]
    pub fn contains_edge(&self, s: u32, t: u32) -> bool {
        // Undirected edges are mirrored into both endpoint sets
        self.succ
            .get(s as usize)
            .is_some_and(|set| set.contains(t))
    }

    /// Inserts the edge, failing if the ordered pair is already connected.
    /// Endpoints were validated by the caller.
    pub fn add_edge(&mut self, s: u32, t: u32) -> GraphResult<EdgeId> {
        if !self.succ[s as usize].insert(t) {
            return Err(GraphError::EdgeAlreadyExists(
                VertexId::new(s),
                VertexId::new(t),
            ));
        }
        if !self.directed {
            if s != t {
                self.succ[t as usize].insert(s);
            }
        } else if let Some(pred) = &mut self.pred {
            pred[t as usize].insert(s);
        }
        self.edge_count += 1;
        Ok(endpoint_edge_id(self.directed, s, t))
    }

    /// Erases the edge from the adjacency sets. Identity equals topology
    /// here, so no other edge moves.
    pub fn remove_edge(&mut self, s: u32, t: u32) -> bool {
        if !self.succ[s as usize].remove(t) {
            return false;
        }
        if !self.directed {
            if s != t {
                self.succ[t as usize].remove(s);
            }
        } else if let Some(pred) = &mut self.pred {
            pred[t as usize].remove(s);
        }
        self.edge_count -= 1;
        true
    }

    #[inline]
    pub fn out_degree(&self, v: u32) -> usize {
        self.succ[v as usize].len()
    }

    /// In-degree; materializes the predecessor sets in directed mode
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
    pub fn successor_set(&self, v: u32) -> &CompactSet {
        &self.succ[v as usize]
    }

    /// Predecessor set of `v`; the owner materializes `pred` (via
    /// [`materialize_pred`](Self::materialize_pred)) before taking views on
    /// a directed engine. Undirected graphs read the successor set.
    pub fn predecessor_set(&self, v: u32) -> &CompactSet {
        if !self.directed {
            return self.successor_set(v);
        }
        match &self.pred {
            Some(pred) => &pred[v as usize],
            None => {
                debug_assert!(false, "predecessor sets read before materialization");
                self.successor_set(v)
            }
        }
    }

    pub fn first_successor(&self, v: u32) -> Option<u32> {
        let mut pos = 0;
        self.succ[v as usize].cursor_next(&mut pos)
    }

    pub fn first_predecessor(&mut self, v: u32) -> Option<u32> {
        if !self.directed {
            return self.first_successor(v);
        }
        self.materialize_pred();
        let mut pos = 0;
        self.pred.as_ref()?[v as usize].cursor_next(&mut pos)
    }

    /// Builds the predecessor sets by transposing `succ`. Idempotent; from
    /// then on `pred` participates in every mutation.
    pub fn materialize_pred(&mut self) {
        if !self.directed || self.pred.is_some() {
            return;
        }
        log::debug!(
            "materializing predecessor sets for {} vertices",
            self.succ.len()
        );
        let mut pred = Vec::new();
        pred.resize_with(self.succ.len(), CompactSet::new);
        for (s, targets) in self.succ.iter().enumerate() {
            for t in targets {
                pred[t as usize].insert(s as u32);
            }
        }
        self.pred = Some(pred);
    }

    /// Compacts the vertex table after `v`'s incident edges were drained:
    /// the highest index moves into slot `v` and every adjacency entry
    /// naming it is rewritten.
    ///
    /// Returns the identity relabel `(old, new)` of each edge that touched
    /// the moved vertex. In directed mode the caller has already
    /// materialized `pred` (draining incoming edges required it).
    pub fn relocate_last(&mut self, v: u32) -> Vec<(EdgeId, EdgeId)> {
        debug_assert!(self.succ[v as usize].is_empty());
        let last = (self.succ.len() - 1) as u32;
        if v == last {
            self.succ.pop();
            if let Some(pred) = &mut self.pred {
                pred.pop();
            }
            return Vec::new();
        }
        debug_assert!(!self.directed || self.pred.is_some());
        log::trace!("relabeling vertex {last} as {v}");

        let directed = self.directed;
        let mut relabels = Vec::new();
        for t in &self.succ[last as usize] {
            let t_new = if t == last { v } else { t };
            relabels.push((
                endpoint_edge_id(directed, last, t),
                endpoint_edge_id(directed, v, t_new),
            ));
        }
        if let Some(pred) = &self.pred {
            for s in &pred[last as usize] {
                if s == last {
                    // The self-loop was already collected from `succ`
                    continue;
                }
                relabels.push((
                    endpoint_edge_id(directed, s, last),
                    endpoint_edge_id(directed, s, v),
                ));
            }
        }

        // Rewrite the adjacency entries of the moved vertex's neighbors
        let out_neighbors: Vec<u32> = self.succ[last as usize].iter().collect();
        for t in out_neighbors {
            if t == last {
                continue;
            }
            if directed {
                if let Some(pred) = &mut self.pred {
                    let set = &mut pred[t as usize];
                    set.remove(last);
                    set.insert(v);
                }
            } else {
                let set = &mut self.succ[t as usize];
                set.remove(last);
                set.insert(v);
            }
        }
        if directed {
            let in_neighbors: Vec<u32> = match &self.pred {
                Some(pred) => pred[last as usize].iter().filter(|&s| s != last).collect(),
                None => Vec::new(),
            };
            for s in in_neighbors {
                let set = &mut self.succ[s as usize];
                set.remove(last);
                set.insert(v);
            }
        }

        // Move the slot; a self-loop still names the old index in its own set
        self.succ.swap_remove(v as usize);
        if self.succ[v as usize].remove(last) {
            self.succ[v as usize].insert(v);
        }
        if let Some(pred) = &mut self.pred {
            pred.swap_remove(v as usize);
            if pred[v as usize].remove(last) {
                pred[v as usize].insert(v);
            }
        }
        relabels
    }
}
