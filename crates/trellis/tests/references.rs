use trellis::{Graph, GraphError, GraphOptions};

#[test]
fn references_follow_vertex_relabeling() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let vs: Vec<_> = (0..3).map(|_| g.add_vertex()).collect();
    let tag = g.vertex_property_uninit::<&'static str>();
    tag.set(vs[2], "tracked").unwrap();
    let r = g.vertex_reference(vs[2]).unwrap();

    // Removing vertex 0 relabels vertex 2 into its slot
    g.remove_vertex(vs[0]).unwrap();

    assert!(r.is_valid());
    let current = r.current().unwrap();
    assert_eq!(current.index(), 0);
    assert_eq!(tag.get(current).unwrap(), "tracked");

    // Churn on other vertices never invalidates the handle
    let extra = g.add_vertex();
    g.remove_vertex(extra).unwrap();
    assert!(r.is_valid());
    assert_eq!(tag.get(r.current().unwrap()).unwrap(), "tracked");
}

#[test]
fn references_invalidate_with_their_vertex() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let doomed = g.vertex_reference(v1).unwrap();
    let kept = g.vertex_reference(v0).unwrap();

    g.remove_vertex(v1).unwrap();

    assert!(!doomed.is_valid());
    assert_eq!(doomed.current(), Err(GraphError::InvalidatedReference));
    assert!(kept.is_valid());
    assert_eq!(kept.current().unwrap(), v0);
}

#[test]
fn displaced_handles_invalidate_when_their_slot_is_taken() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let vs: Vec<_> = (0..3).map(|_| g.add_vertex()).collect();
    let doomed = g.vertex_reference(vs[0]).unwrap();
    let mover = g.vertex_reference(vs[2]).unwrap();

    // Vertex 2 moves into slot 0; the handle to the removed vertex 0 must
    // not start tracking the arrival
    g.remove_vertex(vs[0]).unwrap();

    assert!(!doomed.is_valid());
    assert!(mover.is_valid());
    assert_eq!(mover.current().unwrap().index(), 0);
}

#[test]
fn self_removal_of_the_tail_vertex_invalidates_cleanly() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let _v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let r = g.vertex_reference(v1).unwrap();

    // v1 is the tail: removed == survivor in the swap notification
    g.remove_vertex(v1).unwrap();
    assert!(!r.is_valid());
}

#[test]
fn edge_references_follow_network_renumbering() {
    let mut g = Graph::new(GraphOptions::DIRECTED | GraphOptions::MULTI_EDGES);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let e0 = g.add_edge(v0, v1).unwrap();
    let e1 = g.add_edge(v1, v0).unwrap();
    let doomed = g.edge_reference(e0).unwrap();
    let mover = g.edge_reference(e1).unwrap();

    g.remove_edge(e0).unwrap();

    assert!(!doomed.is_valid());
    assert_eq!(doomed.current(), Err(GraphError::InvalidatedReference));
    assert!(mover.is_valid());
    let current = mover.current().unwrap();
    assert_eq!(g.edge_source(current).unwrap(), v1);
    assert_eq!(g.edge_target(current).unwrap(), v0);
}

#[test]
fn edge_references_follow_simple_relabeling() {
    let mut g = Graph::new(GraphOptions::empty());
    let vs: Vec<_> = (0..4).map(|_| g.add_vertex()).collect();
    let e = g.add_edge(vs[3], vs[1]).unwrap();
    let r = g.edge_reference(e).unwrap();

    // Vertex 3 relabels to 0; the edge encoding becomes (0, 1)
    g.remove_vertex(vs[0]).unwrap();

    assert!(r.is_valid());
    let current = r.current().unwrap();
    assert_eq!(g.edge_source(current).unwrap().index(), 0);
    assert_eq!(g.edge_target(current).unwrap().index(), 1);
}

#[test]
fn edge_references_die_with_their_edge() {
    let mut g = Graph::new(GraphOptions::empty());
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let e = g.add_edge(v0, v1).unwrap();
    let r = g.edge_reference(e).unwrap();

    g.remove_edge(e).unwrap();
    assert!(!r.is_valid());

    // Re-adding the same endpoints mints a fresh identity the dead handle
    // must not resurrect onto
    let again = g.add_edge(v0, v1).unwrap();
    assert!(!r.is_valid());
    assert!(g.edge_reference(again).unwrap().is_valid());
}

#[test]
fn edges_incident_to_a_removed_vertex_invalidate() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();
    let out = g.add_edge(v0, v1).unwrap();
    let incoming = g.add_edge(v1, v0).unwrap();
    let r_out = g.edge_reference(out).unwrap();
    let r_in = g.edge_reference(incoming).unwrap();

    g.remove_vertex(v0).unwrap();

    assert!(!r_out.is_valid());
    assert!(!r_in.is_valid());
}

#[test]
fn handle_equality_is_by_current_identity() {
    let mut g = Graph::new(GraphOptions::DIRECTED);
    let v0 = g.add_vertex();
    let v1 = g.add_vertex();

    let a = g.vertex_reference(v0).unwrap();
    let b = g.vertex_reference(v0).unwrap();
    let c = g.vertex_reference(v1).unwrap();
    assert!(a == b);
    assert!(a != c);

    let mut other = Graph::new(GraphOptions::DIRECTED);
    let foreign = other.add_vertex();
    let d = other.vertex_reference(foreign).unwrap();
    // Same integer identity, different engine
    assert!(a != d);

    g.remove_vertex(v0).unwrap();
    // Invalidated handles equal nothing, themselves included
    assert!(a != b || a.is_valid());
    assert!(!a.is_valid());
    assert!(a != a);
}
