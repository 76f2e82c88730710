use trellis::{FrozenGraph, FrozenGraphBuilder, GraphError, GraphOptions, GraphView};

#[test]
fn finalize_orders_edges_source_major() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let v0 = b.add_vertex();
    let v1 = b.add_vertex();
    let v2 = b.add_vertex();
    b.add_edge(v2, v0).unwrap();
    b.add_edge(v0, v1).unwrap();
    b.add_edge(v1, v2).unwrap();
    b.add_edge(v0, v0).unwrap();
    let g = b.build_graph();

    let listed: Vec<(u32, u32)> = g
        .edges()
        .map(|e| {
            (
                g.edge_source(e).unwrap().index(),
                g.edge_target(e).unwrap().index(),
            )
        })
        .collect();
    assert_eq!(listed, [(0, 0), (0, 1), (1, 2), (2, 0)]);

    let e01 = g.edge_between(v0, v1).unwrap();
    assert_eq!(g.index_of_edge(e01).unwrap(), 1);
    for (at, e) in g.edges().enumerate() {
        assert_eq!(g.index_of_edge(e).unwrap(), at);
        assert_eq!(g.edge_at(at), Some(e));
    }
}

#[test]
fn empty_finalize_equals_the_empty_constant() {
    for options in [
        GraphOptions::empty(),
        GraphOptions::DIRECTED,
        GraphOptions::DIRECTED | GraphOptions::INDEX_EDGES,
    ] {
        let built = FrozenGraphBuilder::new(options).build_graph();
        assert_eq!(built, FrozenGraph::empty(options));
        assert_eq!(built.vertex_count(), 0);
        assert_eq!(built.edge_count(), 0);
        assert_eq!(built.edges().count(), 0);
    }
}

#[test]
fn adjacency_slices_are_sorted_and_symmetric() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let vs: Vec<_> = (0..5).map(|_| b.add_vertex()).collect();
    for &(s, t) in &[(3, 1), (0, 4), (0, 1), (2, 0), (4, 2), (1, 1)] {
        b.add_edge(vs[s], vs[t]).unwrap();
    }
    let g = b.build_graph();

    for v in g.vertices() {
        let slice = g.successors(v).unwrap();
        assert!(slice.is_sorted());
        assert_eq!(slice.len(), g.out_degree(v).unwrap());
    }
    // Predecessor materialization is idempotent and symmetric
    for round in 0..2 {
        for u in g.vertices() {
            for v in g.vertices() {
                let forward = g.successors(u).unwrap().contains(&v);
                let backward = g.predecessors(v).unwrap().contains(&u);
                assert_eq!(forward, backward, "round {round}: u={u} v={v}");
            }
        }
    }
}

#[test]
fn undirected_edges_are_canonical_and_emitted_once() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::empty());
    let v0 = b.add_vertex();
    let v1 = b.add_vertex();
    let v2 = b.add_vertex();
    b.add_edge(v1, v0).unwrap();
    b.add_edge(v2, v1).unwrap();
    b.add_edge(v2, v2).unwrap();
    let g = b.build_graph();

    assert_eq!(g.edge_count(), 3);
    let listed: Vec<(u32, u32)> = g
        .edges()
        .map(|e| {
            (
                g.edge_source(e).unwrap().index(),
                g.edge_target(e).unwrap().index(),
            )
        })
        .collect();
    assert_eq!(listed, [(0, 1), (1, 2), (2, 2)]);
    assert!(g.contains_edge(v0, v1));
    assert!(g.contains_edge(v1, v0));
    // Both mentions resolve to the same canonical identity
    assert_eq!(
        g.edge_between(v1, v0).unwrap(),
        g.edge_between(v0, v1).unwrap()
    );
    // The self-loop counts once per side
    assert_eq!(g.out_degree(v2).unwrap(), 2);
}

#[test]
fn duplicate_staging_follows_the_multi_edge_flag() {
    let mut strict = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let v0 = strict.add_vertex();
    let v1 = strict.add_vertex();
    strict.add_edge(v0, v1).unwrap();
    assert_eq!(
        strict.add_edge(v0, v1),
        Err(GraphError::EdgeAlreadyExists(v0, v1))
    );

    let mut lenient = FrozenGraphBuilder::new(GraphOptions::DIRECTED | GraphOptions::MULTI_EDGES);
    let v0 = lenient.add_vertex();
    let v1 = lenient.add_vertex();
    let first = lenient.add_edge(v0, v1).unwrap();
    // Set-backed staging collapses the duplicate silently
    assert_eq!(lenient.add_edge(v0, v1).unwrap(), first);
    assert_eq!(lenient.edge_count(), 1);
}

#[test]
fn built_properties_merge_staged_values_and_initializer() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED)
        .with_vertex_property(|v| format!("v{}", v.index()))
        .with_edge_property(|_| 0u32);
    let mut m = b.mutate();
    let a = m.add_vertex_value("anchor".to_string());
    let other = m.add_vertex();
    m.add_edge_value(a, other, 7).unwrap();
    let (g, names, weights) = b.build();

    assert_eq!(g.vertex_count(), 2);
    assert_eq!(names.get(a).unwrap(), "anchor");
    assert_eq!(names.get(other).unwrap(), format!("v{}", other.index()));
    let e = g.edge_between(a, other).unwrap();
    assert_eq!(weights.get(e).unwrap(), 7);
}

#[test]
fn keyed_edge_adds_create_endpoints_on_first_mention() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::empty())
        .with_vertex_property_uninit::<&'static str>();
    let mut m = b.mutate();
    m.add_edge_between("left", "right").unwrap();
    m.add_edge_between("right", "far").unwrap();
    assert!(m.has_vertex_value(&"left"));
    assert!(!m.has_vertex_value(&"missing"));
    let left = m.vertex_for_value(&"left").unwrap();
    let far = m.vertex_for_value(&"far").unwrap();
    let (g, names, _) = b.build();

    assert_eq!(g.vertex_count(), 3);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(names.get(left).unwrap(), "left");
    assert!(!g.contains_edge(left, far));
}

#[test]
fn unstaged_values_without_initializer_fail_reads() {
    let mut b =
        FrozenGraphBuilder::new(GraphOptions::DIRECTED).with_vertex_property_uninit::<u32>();
    let staged;
    let bare;
    {
        let mut m = b.mutate();
        staged = m.add_vertex_value(11);
        bare = m.add_vertex();
    }
    let (_, values, _) = b.build();

    assert_eq!(values.get(staged).unwrap(), 11);
    assert_eq!(values.get(bare), Err(GraphError::UninitializedVertex(bare)));
}

#[test]
fn frozen_properties_allow_in_place_writes() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let v0 = b.add_vertex();
    let v1 = b.add_vertex();
    b.add_edge(v0, v1).unwrap();
    let g = b.build_graph();

    let mut ranks = g.vertex_property(|v| v.index() as i64);
    ranks.set(v1, -9).unwrap();
    assert_eq!(ranks.get(v1).unwrap(), -9);
    assert_eq!(ranks.get(v0).unwrap(), 0);

    let mut marks = g.edge_property(|_| false);
    let e = g.edge_between(v0, v1).unwrap();
    marks.set(e, true).unwrap();
    assert!(marks.get(e).unwrap());
}

#[test]
fn large_edge_sets_switch_property_flavor() {
    // Hub-and-spoke with more edges than the array-map cutoff
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let hub = b.add_vertex();
    let spokes: Vec<_> = (0..1200).map(|_| b.add_vertex()).collect();
    for &s in &spokes {
        b.add_edge(hub, s).unwrap();
    }
    let g = b.build_graph();
    let weights = g.edge_property(|e| e.to_bits());

    assert_eq!(g.edge_count(), 1200);
    for e in g.edges().take(50) {
        assert_eq!(weights.get(e).unwrap(), e.to_bits());
    }
    let last = g.edges().last().unwrap();
    assert_eq!(weights.get(last).unwrap(), last.to_bits());
}

#[test]
fn indexed_builds_expose_positional_lookups() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED | GraphOptions::INDEX_EDGES);
    let vs: Vec<_> = (0..4).map(|_| b.add_vertex()).collect();
    b.add_edge(vs[1], vs[3]).unwrap();
    b.add_edge(vs[0], vs[2]).unwrap();
    b.add_edge(vs[1], vs[0]).unwrap();
    let g = b.build_graph();
    let labels = g.edge_property(|e| {
        format!(
            "{}->{}",
            g.edge_source(e).unwrap().index(),
            g.edge_target(e).unwrap().index()
        )
    });

    for (at, e) in g.edges().enumerate() {
        assert_eq!(g.index_of_edge(e).unwrap(), at);
    }
    let e = g.edge_between(vs[1], vs[0]).unwrap();
    assert_eq!(labels.get(e).unwrap(), "1->0");
}

#[test]
fn frozen_rejects_foreign_identities() {
    let mut b = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let v0 = b.add_vertex();
    let g = b.build_graph();

    let ghost = trellis::VertexId::new(9);
    assert_eq!(g.out_degree(ghost), Err(GraphError::UnknownVertex(ghost)));
    assert_eq!(g.edge_between(v0, v0), Err(GraphError::NoSuchEdge(v0, v0)));
    assert!(g.edges_between(v0, v0).unwrap().is_empty());
}

#[test]
fn the_view_contract_spans_both_engines() {
    fn degree_sum<G: GraphView>(g: &G) -> usize {
        g.vertex_iter()
            .map(|v| g.out_degree(v).unwrap())
            .sum::<usize>()
    }

    let mut live = trellis::Graph::new(GraphOptions::DIRECTED);
    let a = live.add_vertex();
    let b = live.add_vertex();
    live.add_edge(a, b).unwrap();
    live.add_edge(b, a).unwrap();

    let mut frozen = FrozenGraphBuilder::new(GraphOptions::DIRECTED);
    let fa = frozen.add_vertex();
    let fb = frozen.add_vertex();
    frozen.add_edge(fa, fb).unwrap();
    frozen.add_edge(fb, fa).unwrap();
    let frozen = frozen.build_graph();

    assert_eq!(degree_sum(&live), 2);
    assert_eq!(degree_sum(&frozen), 2);
    assert_eq!(
        live.edge_iter().count(),
        frozen.edge_iter().count()
    );
}
