use trellis::{Graph, GraphError, GraphOptions, VertexId};

fn sorted_indices(ids: impl IntoIterator<Item = VertexId>) -> Vec<u32> {
    let mut out: Vec<u32> = ids.into_iter().map(|v| v.index()).collect();
    out.sort_unstable();
    out
}

#[test]
fn directed_cycle_with_self_loop() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let v2 = g.add_vertex();
    g.add_edge(v0, v1).unwrap();
    g.add_edge(v1, v2).unwrap();
    g.add_edge(v2, v0).unwrap();
    g.add_edge(v0, v0).unwrap();

    assert_eq!(g.vertex_count(), 3);
    assert_eq!(g.edge_count(), 4);
    assert_eq!(g.out_degree(v0).unwrap(), 2);
    assert_eq!(g.in_degree(v0).unwrap(), 2);
    assert_eq!(sorted_indices(&g.successors(v0).unwrap()), vec![0, 1]);
    assert_eq!(sorted_indices(&g.predecessors(v0).unwrap()), vec![0, 2]);

    let loops = g.edges_between(v0, v0).unwrap();
    assert_eq!(loops.len(), 1);
    assert_eq!(g.edge_source(loops[0]).unwrap(), v0);
    assert_eq!(g.edge_target(loops[0]).unwrap(), v0);
}

#[test]
fn undirected_cycle_with_self_loop() {
    let mut g = Graph::new(GraphOptions::empty());
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let v2 = g.add_vertex();
    g.add_edge(v0, v1).unwrap();
    g.add_edge(v1, v2).unwrap();
    g.add_edge(v2, v0).unwrap();
    g.add_edge(v0, v0).unwrap();

    // The self-loop counts once
    assert_eq!(g.out_degree(v0).unwrap(), 3);
    assert_eq!(sorted_indices(&g.successors(v0).unwrap()), vec![0, 1, 2]);
    assert!(g.contains_edge(v1, v0));

    // Canonical (min, max) endpoint order
    let e = g.edge_between(v1, v0).unwrap();
    assert_eq!(g.edge_source(e).unwrap(), v0);
    assert_eq!(g.edge_target(e).unwrap(), v1);
}

#[test]
fn multi_edge_network_counts_parallels() {
    let mut g = Graph::new(GraphOptions::DIRECTED | GraphOptions::MULTI_EDGES);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let e0 = g.add_edge(v0, v1).unwrap();
    let _e1 = g.add_edge(v0, v1).unwrap();
    let _e2 = g.add_edge(v1, v0).unwrap();

    assert_eq!(g.edge_count(), 3);
    assert!(g.has_multi_edges());
    assert_eq!(g.edges_between(v0, v1).unwrap().len(), 2);
    assert_eq!(g.out_degree(v0).unwrap(), 2);

    g.remove_edge(e0).unwrap();
    assert_eq!(g.edges_between(v0, v1).unwrap().len(), 1);
    assert!(!g.has_multi_edges());
    assert_eq!(g.edge_count(), 2);
}

#[test]
fn duplicate_edges_need_multi_edge_support() {
    let mut simple = Graph::new(GraphOptions::DIRECTED);
    let v0 = simple.add_vertex();
    let v1 = simple.add_vertex();
    simple.add_edge(v0, v1).unwrap();
    assert_eq!(
        simple.add_edge(v0, v1),
        Err(GraphError::EdgeAlreadyExists(v0, v1))
    );
    // The reverse direction is a different pair in a directed graph
    simple.add_edge(v1, v0).unwrap();

    let mut indexed = Graph::new(GraphOptions::DIRECTED | GraphOptions::INDEX_EDGES);
    let v0 = indexed.add_vertex();
    let v1 = indexed.add_vertex();
    indexed.add_edge(v0, v1).unwrap();
    assert_eq!(
        indexed.add_edge(v0, v1),
        Err(GraphError::EdgeAlreadyExists(v0, v1))
    );
}

#[test]
fn vertex_identities_stay_dense_across_removal() {
    for options in [
        GraphOptions::empty(),
        GraphOptions::DIRECTED,
        GraphOptions::DIRECTED | GraphOptions::MULTI_EDGES,
        GraphOptions::MULTI_EDGES,
    ] {
        let mut g = Graph::new(options);
        let vs: Vec<_> = (0..6).map(|_| g.add_vertex()).collect();
        for window in vs.windows(2) {
            g.add_edge(window[0], window[1]).unwrap();
        }
        g.add_edge(vs[5], vs[0]).unwrap();

        g.remove_vertex(vs[2]).unwrap();
        g.remove_vertex(vs[0]).unwrap();

        assert_eq!(g.vertex_count(), 4);
        let seen = sorted_indices(&g.vertices());
        assert_eq!(seen, vec![0, 1, 2, 3], "options {options:?}");
    }
}

#[test]
fn incidence_is_symmetric() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let vs: Vec<_> = (0..5).map(|_| g.add_vertex()).collect();
    g.add_edge(vs[0], vs[1]).unwrap();
    g.add_edge(vs[0], vs[3]).unwrap();
    g.add_edge(vs[3], vs[1]).unwrap();
    g.add_edge(vs[4], vs[4]).unwrap();
    g.remove_vertex(vs[2]).unwrap();

    for u in g.vertices().iter().collect::<Vec<_>>() {
        for v in g.vertices().iter().collect::<Vec<_>>() {
            let forward = g.successors(u).unwrap().contains(v);
            let backward = g.predecessors(v).unwrap().contains(u);
            assert_eq!(forward, backward, "u={u} v={v}");
        }
    }
}

#[test]
fn degrees_match_view_sizes() {
    let mut g = Graph::new(GraphOptions::MULTI_EDGES);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    g.add_edge(v0, v1).unwrap();
    g.add_edge(v0, v1).unwrap();
    g.add_edge(v0, v0).unwrap();

    assert_eq!(g.out_degree(v0).unwrap(), 3);
    assert_eq!(g.out_degree(v0).unwrap(), g.successors(v0).unwrap().len());
    assert_eq!(
        g.out_degree(v0).unwrap(),
        g.outgoing_edges(v0).unwrap().len()
    );
    assert_eq!(
        g.successors(v0).unwrap().iter().count(),
        g.out_degree(v0).unwrap()
    );
    // Undirected: both sides agree
    assert_eq!(g.in_degree(v0).unwrap(), g.out_degree(v0).unwrap());
    assert_eq!(g.out_degree(v1).unwrap(), 2);
}

#[test]
fn edge_views_cover_every_edge_once() {
    let mut g = Graph::new(GraphOptions::empty());
    let vs: Vec<_> = (0..4).map(|_| g.add_vertex()).collect();
    g.add_edge(vs[0], vs[1]).unwrap();
    g.add_edge(vs[1], vs[2]).unwrap();
    g.add_edge(vs[2], vs[3]).unwrap();
    g.add_edge(vs[0], vs[0]).unwrap();

    let edges = g.edges();
    assert_eq!(edges.len(), 4);
    let listed: Vec<_> = edges.iter().collect();
    assert_eq!(listed.len(), 4);
    for e in &listed {
        assert!(edges.contains(*e));
        // Canonical ordering for undirected simple edges
        assert!(g.edge_source(*e).unwrap() <= g.edge_target(*e).unwrap());
    }
}

#[test]
fn edge_opposite_walks_both_ways() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let v2 = g.add_vertex();
    let e = g.add_edge(v0, v1).unwrap();

    assert_eq!(g.edge_opposite(e, v0).unwrap(), v1);
    assert_eq!(g.edge_opposite(e, v1).unwrap(), v0);
    assert_eq!(g.edge_opposite(e, v2), Err(GraphError::NotAnEndpoint(e, v2)));

    let lasso = g.add_edge(v2, v2).unwrap();
    assert_eq!(g.edge_opposite(lasso, v2).unwrap(), v2);
}

#[test]
fn unknown_identities_are_rejected() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let ghost = VertexId::new(7);

    assert_eq!(g.out_degree(ghost), Err(GraphError::UnknownVertex(ghost)));
    assert_eq!(g.add_edge(v0, ghost), Err(GraphError::UnknownVertex(ghost)));
    assert_eq!(g.remove_vertex(ghost), Err(GraphError::UnknownVertex(ghost)));
    assert_eq!(g.edge_between(v0, v0), Err(GraphError::NoSuchEdge(v0, v0)));
    assert!(!g.contains_vertex(ghost));
    assert!(!g.contains_edge(v0, ghost));
}

#[test]
fn empty_graph_boundaries() {
    let g = Graph::new(GraphOptions::DIRECTED | GraphOptions::MULTI_EDGES);
    assert_eq!(g.vertex_count(), 0);
    assert_eq!(g.edge_count(), 0);
    assert!(g.vertices().is_empty());
    assert!(g.edges().is_empty());
    assert_eq!(g.vertices().iter().count(), 0);
    assert_eq!(g.edges().iter().count(), 0);
    assert!(!g.has_multi_edges());
}

#[test]
fn removing_the_last_vertex_and_edge() {
    let mut g = Graph::new(GraphOptions::empty());
    let v0 = g.add_vertex();
    let e = g.add_edge(v0, v0).unwrap();

    g.remove_edge(e).unwrap();
    assert_eq!(g.edge_count(), 0);
    assert_eq!(g.out_degree(v0).unwrap(), 0);

    g.remove_vertex(v0).unwrap();
    assert_eq!(g.vertex_count(), 0);
}

#[test]
fn removal_rewrites_adjacency_to_the_moved_vertex() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let vs: Vec<_> = (0..4).map(|_| g.add_vertex()).collect();
    // v3 is the one that will be relabeled; give it edges in both directions
    g.add_edge(vs[3], vs[1]).unwrap();
    g.add_edge(vs[1], vs[3]).unwrap();
    g.add_edge(vs[3], vs[3]).unwrap();

    g.remove_vertex(vs[0]).unwrap();

    // vs[3] now answers to index 0
    let moved = VertexId::new(0);
    assert_eq!(g.vertex_count(), 3);
    assert!(g.contains_edge(moved, vs[1]));
    assert!(g.contains_edge(vs[1], moved));
    assert!(g.contains_edge(moved, moved));
    assert_eq!(g.out_degree(moved).unwrap(), 2);
    assert_eq!(g.in_degree(moved).unwrap(), 2);
}

#[test]
fn network_edge_ids_stay_dense_across_removal() {
    let mut g = Graph::new(GraphOptions::DIRECTED | GraphOptions::MULTI_EDGES);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let v2 = g.add_vertex();
    let e0 = g.add_edge(v0, v1).unwrap();
    let _e1 = g.add_edge(v1, v2).unwrap();
    let _e2 = g.add_edge(v2, v0).unwrap();

    g.remove_edge(e0).unwrap();

    let edges = g.edges();
    assert_eq!(edges.len(), 2);
    let ranks: Vec<usize> = edges.iter().map(|e| edges.index_of(e).unwrap()).collect();
    assert_eq!(ranks, vec![0, 1]);
    assert_eq!(edges.get(0), Some(edges.iter().next().unwrap()));
}

#[test]
fn views_are_live() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let vertices = g.vertices();
    let edges = g.edges();
    let out = g.successors(v0).unwrap();
    assert_eq!(vertices.len(), 1);
    assert!(out.is_empty());

    let v1 = g.add_vertex();
    let e = g.add_edge(v0, v1).unwrap();

    // The views were created before the mutations and still see them
    assert_eq!(vertices.len(), 2);
    assert_eq!(edges.len(), 1);
    assert!(edges.contains(e));
    assert_eq!(out.len(), 1);
    assert!(out.contains(v1));

    g.remove_edge(e).unwrap();
    assert!(out.is_empty());
    assert!(!edges.contains(e));
}

#[test]
fn mixed_churn_keeps_invariants() {
    let mut g = Graph::new(GraphOptions::MULTI_EDGES);
    let mut population = 0u32;
    for round in 0..10u32 {
        let fresh: Vec<_> = (0..3).map(|_| g.add_vertex()).collect();
        population += 3;
        for pair in fresh.windows(2) {
            g.add_edge(pair[0], pair[1]).unwrap();
        }
        if round % 2 == 0 {
            g.remove_vertex(fresh[0]).unwrap();
            population -= 1;
        }
        assert_eq!(g.vertex_count() as u32, population);
        // Identity density after every round
        let ids = sorted_indices(&g.vertices());
        assert_eq!(ids, (0..population).collect::<Vec<_>>());
    }
}
