#[cfg(feature = "arbitrary")]
mod fuzz {
    use std::collections::HashSet;

    use arbitrary::{Arbitrary, Unstructured};
    use visual_novel_ir::{
        IrError, IrGraph, IrNodeType, IrToAstConverter, NodeId, PortId, VisualGraph,
    };

    fn fill_deterministic(buf: &mut [u8], seed: u64) {
        let mut state = seed;
        for byte in buf.iter_mut() {
            // xorshift64*
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            state = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
            *byte = (state & 0xFF) as u8;
        }
    }

    const PORTS: [&str; 6] = ["out", "next", "true", "false", "body", "option_0"];

    #[derive(Debug, Arbitrary)]
    enum Mutation {
        Create(IrNodeType),
        Remove(u8),
        Connect { from: u8, port: u8, to: u8 },
        Disconnect { from: u8, port: u8, to: u8 },
        SetText { node: u8, text: String },
    }

    /// Maps a fuzz byte onto a live id most of the time, a dead one otherwise.
    fn pick(graph: &IrGraph, raw: u8) -> NodeId {
        let ids: Vec<NodeId> = graph.nodes().map(|node| node.id()).collect();
        if ids.is_empty() || raw % 8 == 0 {
            return raw as NodeId;
        }
        ids[raw as usize % ids.len()]
    }

    fn ports(graph: &IrGraph, from: u8, port: u8, to: u8) -> (PortId, PortId) {
        (
            PortId::output(pick(graph, from), PORTS[port as usize % PORTS.len()]),
            PortId::input(pick(graph, to), "in"),
        )
    }

    fn apply(graph: &mut IrGraph, mutation: Mutation, last_id: &mut NodeId) {
        match mutation {
            Mutation::Create(node_type) => {
                let id = graph.create_node(node_type);
                assert!(id > *last_id, "ids must strictly increase");
                *last_id = id;
            }
            Mutation::Remove(raw) => {
                let id = pick(graph, raw);
                graph.remove_node(id);
                assert!(graph.node(id).is_none());
            }
            Mutation::Connect { from, port, to } => {
                let (source, target) = ports(graph, from, port, to);
                let existed = graph
                    .connections()
                    .iter()
                    .any(|edge| edge.source == source && edge.target == target);
                match graph.connect(source, target) {
                    Ok(()) => assert!(!existed),
                    Err(IrError::DuplicateConnection { .. }) => assert!(existed),
                    Err(IrError::UnknownNode(_)) => {}
                    Err(other) => panic!("unexpected connect error: {other:?}"),
                }
            }
            Mutation::Disconnect { from, port, to } => {
                let (source, target) = ports(graph, from, port, to);
                graph.disconnect(&source, &target);
                assert!(!graph
                    .connections()
                    .iter()
                    .any(|edge| edge.source == source && edge.target == target));
            }
            Mutation::SetText { node, text } => {
                let id = pick(graph, node);
                if let Some(node) = graph.node_mut(id) {
                    node.set_property("text", text);
                }
            }
        }
    }

    fn check_invariants(graph: &IrGraph) {
        let mut pairs = HashSet::new();
        for edge in graph.connections() {
            assert!(graph.node(edge.source.node_id).is_some(), "dangling source");
            assert!(graph.node(edge.target.node_id).is_some(), "dangling target");
            assert!(edge.source.is_output && !edge.target.is_output);
            assert!(pairs.insert((edge.source.clone(), edge.target.clone())));
        }

        let mut order = graph.topological_order();
        assert_eq!(order.len(), graph.node_count());
        order.sort_unstable();
        order.dedup();
        assert_eq!(order.len(), graph.node_count());
        assert_eq!(graph.execution_order().len(), graph.node_count());

        for cycle in graph.find_cycles() {
            assert!(!cycle.is_empty());
        }
        let _ = graph.validate();
        let _ = IrToAstConverter::default().convert(graph);
    }

    #[test]
    fn fuzz_graph_mutation_sequences() {
        let mut raw_data = [0u8; 1024 * 2];

        for i in 0..96u64 {
            fill_deterministic(&mut raw_data, 0x1A_6A_F00Du64 ^ i);
            let mut u = Unstructured::new(&raw_data);
            let mut graph = IrGraph::new("fuzz");
            let mut last_id = 0;
            while let Ok(mutation) = Mutation::arbitrary(&mut u) {
                apply(&mut graph, mutation, &mut last_id);
                check_invariants(&graph);
                if u.is_empty() {
                    break;
                }
            }
        }
    }

    #[test]
    fn fuzz_visual_round_trip_preserves_shape() {
        let mut raw_data = [0u8; 1024 * 8];

        for i in 0..64u64 {
            fill_deterministic(&mut raw_data, 0xB0B_CAFEu64 ^ (i << 3));
            let mut u = Unstructured::new(&raw_data);
            let mut graph = IrGraph::new("visual");
            let mut last_id = 0;
            for _ in 0..64 {
                match Mutation::arbitrary(&mut u) {
                    Ok(mutation) => apply(&mut graph, mutation, &mut last_id),
                    Err(_) => break,
                }
            }

            let back = VisualGraph::from_ir(&graph).to_ir().expect("visual round trip");
            assert_eq!(back.node_count(), graph.node_count());
            assert_eq!(back.connections(), graph.connections());
            for (before, after) in graph.nodes().zip(back.nodes()) {
                assert_eq!(before, after);
            }
        }
    }
}
