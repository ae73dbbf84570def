use super::*;

fn chain(len: usize) -> (PortGraph<&'static str, ()>, Vec<NodeId>) {
    let mut graph = PortGraph::new();
    let ids: Vec<NodeId> = (0..len).map(|_| graph.add_node("n")).collect();
    for pair in ids.windows(2) {
        graph
            .connect(PortId::output(pair[0], "out"), PortId::input(pair[1], "in"), ())
            .expect("connect");
    }
    (graph, ids)
}

#[test]
fn test_ids_start_at_one_and_are_never_reused() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    let a = graph.add_node(0);
    let b = graph.add_node(0);
    assert_eq!((a, b), (1, 2));

    graph.remove_node(b);
    let c = graph.add_node(0);
    assert_eq!(c, 3);
    assert!(!graph.contains(b));
}

#[test]
fn test_insert_with_id_bumps_counter() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    assert!(graph.insert_node_with_id(7, 0));
    assert!(!graph.insert_node_with_id(7, 1));
    assert!(!graph.insert_node_with_id(0, 1));
    assert_eq!(graph.add_node(0), 8);
}

#[test]
fn test_remove_node_cascades_edges() {
    let (mut graph, ids) = chain(3);
    assert_eq!(graph.edge_count(), 2);

    graph.remove_node(ids[1]);
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_remove_absent_node_is_noop() {
    let (mut graph, _) = chain(2);
    assert!(graph.remove_node(999).is_none());
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_connect_rejects_duplicates() {
    let (mut graph, ids) = chain(2);
    let err = graph
        .connect(PortId::output(ids[0], "out"), PortId::input(ids[1], "in"), ())
        .expect_err("duplicate");
    assert!(matches!(err, IrError::DuplicateConnection { .. }));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_connect_checks_direction_before_existence() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    let a = graph.add_node(0);

    let err = graph
        .connect(PortId::input(a, "in"), PortId::input(42, "in"), ())
        .expect_err("wrong direction");
    assert!(matches!(err, IrError::InvalidPort { node, .. } if node == a));

    let err = graph
        .connect(PortId::output(a, "out"), PortId::input(42, "in"), ())
        .expect_err("missing node");
    assert!(matches!(err, IrError::UnknownNode(42)));
}

#[test]
fn test_disconnect_is_idempotent() {
    let (mut graph, ids) = chain(2);
    let source = PortId::output(ids[0], "out");
    let target = PortId::input(ids[1], "in");
    assert!(graph.disconnect(&source, &target).is_some());
    assert!(graph.disconnect(&source, &target).is_none());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_topological_order_of_chain() {
    let (graph, ids) = chain(3);
    assert_eq!(graph.topological_order(), ids);
}

#[test]
fn test_topological_order_respects_edges_against_id_order() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    let a = graph.add_node(0);
    let b = graph.add_node(0);
    let c = graph.add_node(0);
    graph
        .connect(PortId::output(c, "out"), PortId::input(a, "in"), ())
        .expect("connect");
    graph
        .connect(PortId::output(b, "out"), PortId::input(c, "in"), ())
        .expect("connect");
    assert_eq!(graph.topological_order(), vec![b, c, a]);
}

#[test]
fn test_topological_order_isolated_nodes_in_id_order() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    let ids: Vec<NodeId> = (0..4).map(|_| graph.add_node(0)).collect();
    assert_eq!(graph.topological_order(), ids);
}

#[test]
fn test_topological_order_tolerates_cycles() {
    let (mut graph, ids) = chain(3);
    graph
        .connect(PortId::output(ids[2], "out"), PortId::input(ids[0], "in"), ())
        .expect("connect");
    let order = graph.topological_order();
    assert_eq!(order.len(), 3);
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, ids);
}

#[test]
fn test_find_cycles_reports_each_cycle_once() {
    let (mut graph, ids) = chain(3);
    graph
        .connect(PortId::output(ids[2], "out"), PortId::input(ids[0], "in"), ())
        .expect("connect");
    let cycles = graph.find_cycles();
    assert_eq!(cycles.len(), 1);
    let mut members = cycles[0].clone();
    members.sort_unstable();
    assert_eq!(members, ids);
}

#[test]
fn test_find_cycles_includes_self_loop() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    let a = graph.add_node(0);
    graph
        .connect(PortId::output(a, "out"), PortId::input(a, "in"), ())
        .expect("self loop");
    assert_eq!(graph.find_cycles(), vec![vec![a]]);
}

#[test]
fn test_acyclic_graph_has_no_cycles() {
    let (graph, _) = chain(5);
    assert!(graph.find_cycles().is_empty());
}

#[test]
fn test_reachable_from_roots() {
    let (mut graph, ids) = chain(3);
    let island = graph.add_node("island");
    let reached = graph.reachable_from([ids[0]]);
    assert_eq!(reached.len(), 3);
    assert!(!reached.contains(&island));
}

#[test]
fn test_layers_use_longest_path() {
    let (mut graph, ids) = chain(3);
    graph
        .connect(PortId::output(ids[0], "skip"), PortId::input(ids[2], "in"), ())
        .expect("connect");
    let layers = graph.layers();
    assert_eq!(layers[&ids[0]], 0);
    assert_eq!(layers[&ids[1]], 1);
    assert_eq!(layers[&ids[2]], 2);
}

#[test]
fn test_successors_are_deduplicated() {
    let mut graph: PortGraph<u8> = PortGraph::new();
    let a = graph.add_node(0);
    let b = graph.add_node(0);
    graph
        .connect(PortId::output(a, "true"), PortId::input(b, "in"), ())
        .expect("connect");
    graph
        .connect(PortId::output(a, "false"), PortId::input(b, "in"), ())
        .expect("connect");
    assert_eq!(graph.successors(a), vec![b]);
    assert_eq!(graph.outgoing_from(a, "true").count(), 1);
}
