use super::*;
use crate::config::LayoutConfig;
use crate::ir::{IrGraph, IrNodeType, PropertyKind, PropertyValue};

/// SceneStart(1) -> Dialogue(2, text="Hi") -> SceneEnd(3).
fn scenario() -> IrGraph {
    let mut graph = IrGraph::new("scenario");
    let start = graph.create_node(IrNodeType::SceneStart);
    let dialogue = graph.create_node(IrNodeType::Dialogue);
    let end = graph.create_node(IrNodeType::SceneEnd);
    graph
        .node_mut(dialogue)
        .expect("dialogue")
        .set_property("text", "Hi");
    graph
        .connect(PortId::output(start, "out"), PortId::input(dialogue, "in"))
        .expect("connect");
    graph
        .connect(PortId::output(dialogue, "out"), PortId::input(end, "in"))
        .expect("connect");
    graph.add_scene_start("intro", start).expect("scene");
    graph
}

#[test]
fn test_scenario_survives_visual_round_trip() {
    let graph = scenario();
    assert_eq!(graph.topological_order(), vec![1, 2, 3]);
    assert!(graph.validate().is_empty());

    let visual = VisualGraph::from_ir(&graph);
    assert_eq!(visual.node_count(), 3);
    assert_eq!(visual.edge_count(), 2);
    assert_eq!(visual.node(2).expect("dialogue").node_type, "Dialogue");
    assert_eq!(visual.node(2).expect("dialogue").property("text"), Some("Hi"));

    let back = visual.to_ir().expect("to ir");
    assert_eq!(back.node_count(), 3);
    assert_eq!(back.connections(), graph.connections());
    for (before, after) in graph.nodes().zip(back.nodes()) {
        assert_eq!(before, after);
    }
    assert_eq!(back.scene_start("intro"), Some(1));
}

#[test]
fn test_typed_properties_are_retyped_from_schema() {
    let mut graph = IrGraph::new("typed");
    let branch = graph.create_node(IrNodeType::Branch);
    let choice = graph.create_node(IrNodeType::Choice);
    let wait = graph.create_node(IrNodeType::Wait);
    graph.node_mut(branch).expect("branch").set_property("has_else", true);
    graph.node_mut(choice).expect("choice").set_property(
        "options",
        vec!["Say \"hi\"".to_string(), "Leave".to_string()],
    );
    graph.node_mut(wait).expect("wait").set_property("duration", 0.1);

    let visual = VisualGraph::from_ir(&graph);
    assert_eq!(visual.node(branch).expect("branch").property("has_else"), Some("true"));
    assert_eq!(visual.node(wait).expect("wait").property("duration"), Some("0.1"));

    let back = visual.to_ir().expect("to ir");
    assert_eq!(back.node(branch).expect("branch").try_bool("has_else"), Some(true));
    assert_eq!(back.node(wait).expect("wait").try_float("duration"), Some(0.1));
    assert_eq!(
        back.node(choice).expect("choice").get_string_list("options"),
        ["Say \"hi\"", "Leave"]
    );
}

#[test]
fn test_integral_float_is_written_with_fraction() {
    let mut graph = IrGraph::new("float");
    let wait = graph.create_node(IrNodeType::Wait);
    graph.node_mut(wait).expect("wait").set_property("duration", 2.0);
    let visual = VisualGraph::from_ir(&graph);
    assert_eq!(visual.node(wait).expect("wait").property("duration"), Some("2.0"));
}

#[test]
fn test_undeclared_properties_keep_their_kind() {
    let mut graph = IrGraph::new("kinds");
    let wait = graph.create_node(IrNodeType::Wait);
    let dialogue = graph.create_node(IrNodeType::Dialogue);
    {
        let node = graph.node_mut(wait).expect("wait");
        node.set_property("mood", 3_i64);
        node.set_property("duration", PropertyValue::Null);
        node.set_property("tag", "3");
    }
    {
        let node = graph.node_mut(dialogue).expect("dialogue");
        node.set_property("priority", 5_i64);
        node.set_property("urgent", true);
        node.set_property("weight", 0.5);
        node.set_property("text", 7_i64);
    }
    let visual = VisualGraph::from_ir(&graph);
    let hints = &visual.node(wait).expect("wait").property_kinds;
    assert_eq!(hints.get("mood"), Some(&PropertyKind::Int));
    assert!(!hints.contains_key("tag"));

    let back = visual.to_ir().expect("to ir");
    let node = back.node(wait).expect("wait");
    assert_eq!(node.property("mood"), Some(&PropertyValue::Int(3)));
    assert_eq!(node.property("duration"), Some(&PropertyValue::Null));
    assert_eq!(node.property("tag"), Some(&PropertyValue::String("3".into())));
    let node = back.node(dialogue).expect("dialogue");
    assert_eq!(node.property("priority"), Some(&PropertyValue::Int(5)));
    assert_eq!(node.property("urgent"), Some(&PropertyValue::Bool(true)));
    assert_eq!(node.property("weight"), Some(&PropertyValue::Float(0.5)));
    assert_eq!(node.property("text"), Some(&PropertyValue::Int(7)));
}

#[test]
fn test_property_kinds_survive_json_and_reset_on_edit() {
    let mut graph = IrGraph::new("kinds");
    let wait = graph.create_node(IrNodeType::Wait);
    graph.node_mut(wait).expect("wait").set_property("mood", 3_i64);

    let json = VisualGraph::from_ir(&graph).to_json().expect("json");
    assert!(json.contains("\"propertyKinds\""), "{json}");
    let mut visual = VisualGraph::from_json(&json).expect("reload");
    assert_eq!(
        visual.to_ir().expect("to ir").node(wait).expect("wait").property("mood"),
        Some(&PropertyValue::Int(3))
    );

    visual.set_node_property(wait, "mood", "calm").expect("edit");
    let node = visual.node(wait).expect("wait");
    assert!(node.property_kinds.is_empty());
    assert_eq!(
        visual.to_ir().expect("to ir").node(wait).expect("wait").property("mood"),
        Some(&PropertyValue::String("calm".into()))
    );
}

#[test]
fn test_unknown_type_tag_is_rejected() {
    let mut visual = VisualGraph::new("bad");
    visual.add_node("Teleport", 0.0, 0.0);
    assert!(matches!(
        visual.to_ir(),
        Err(IrError::UnknownNodeType(tag)) if tag == "Teleport"
    ));
}

#[test]
fn test_unparsable_declared_property_is_rejected() {
    let mut visual = VisualGraph::new("bad");
    let id = visual.add_node("Wait", 0.0, 0.0);
    visual.set_node_property(id, "duration", "soon").expect("set");
    let err = visual.to_ir().expect_err("not a float");
    assert!(matches!(
        err,
        IrError::InvalidProperty { node, ref property, .. } if node == id && property == "duration"
    ));
}

#[test]
fn test_mutations_mirror_ir_contracts() {
    let mut visual = VisualGraph::new("edit");
    let a = visual.add_node("Dialogue", 0.0, 0.0);
    let b = visual.add_node("Wait", 0.0, 100.0);
    assert!(b > a);

    visual
        .add_edge(PortId::output(a, "out"), PortId::input(b, "in"))
        .expect("edge");
    assert!(matches!(
        visual.add_edge(PortId::output(a, "out"), PortId::input(b, "in")),
        Err(IrError::DuplicateConnection { .. })
    ));
    assert!(matches!(
        visual.add_edge(PortId::input(a, "in"), PortId::input(b, "in")),
        Err(IrError::InvalidPort { .. })
    ));
    assert!(matches!(
        visual.add_edge(PortId::output(a, "out"), PortId::input(42, "in")),
        Err(IrError::UnknownNode(42))
    ));

    assert!(visual.remove_node(b).is_some());
    assert_eq!(visual.edge_count(), 0);
    assert!(visual.remove_node(b).is_none());
    assert!(!visual.remove_edge(&PortId::output(a, "out"), &PortId::input(b, "in")));

    let c = visual.add_node("Wait", 0.0, 0.0);
    assert!(c > b, "ids are never reused");
    assert!(matches!(
        visual.set_node_position(b, 1.0, 1.0),
        Err(IrError::UnknownNode(_))
    ));
    visual.set_node_position(c, 5.0, 6.0).expect("move");
    assert_eq!((visual.node(c).expect("c").x, visual.node(c).expect("c").y), (5.0, 6.0));
}

#[test]
fn test_removing_scene_node_drops_mapping() {
    let mut visual = VisualGraph::from_ir(&scenario());
    visual.remove_node(1);
    assert!(visual.scenes().is_empty());
}

#[test]
fn test_auto_layout_assigns_columns_by_depth() {
    let mut visual = VisualGraph::new("layout");
    let root = visual.add_node("SceneStart", 0.0, 0.0);
    let lower = visual.add_node("Dialogue", 0.0, 50.0);
    let upper = visual.add_node("Dialogue", 0.0, 10.0);
    let tail = visual.add_node("SceneEnd", 0.0, 0.0);
    for (source, target) in [(root, lower), (root, upper), (upper, tail)] {
        visual
            .add_edge(PortId::output(source, "out"), PortId::input(target, "in"))
            .expect("edge");
    }
    let layout = LayoutConfig::default();
    visual.auto_layout_with(&layout);

    let at = |id| {
        let node = visual.node(id).expect("node");
        (node.x, node.y)
    };
    assert_eq!(at(root), (layout.start_x, layout.start_y));
    assert_eq!(at(upper), (layout.start_x + layout.column_spacing, layout.start_y));
    assert_eq!(
        at(lower),
        (
            layout.start_x + layout.column_spacing,
            layout.start_y + layout.row_spacing
        )
    );
    assert_eq!(at(tail).0, layout.start_x + 2.0 * layout.column_spacing);
}

#[test]
fn test_json_round_trip() {
    let mut visual = VisualGraph::from_ir(&scenario());
    visual.node_mut(2).expect("dialogue").collapsed = true;
    visual.add_character(VisualCharacter {
        id: "hero".into(),
        display_name: "Alex".into(),
        color: None,
    });

    let json = visual.to_json().expect("serialize");
    assert!(json.contains("\"type\": \"Dialogue\""));
    assert!(json.contains("\"sourceNode\": 1"));

    let loaded = VisualGraph::from_json(&json).expect("deserialize");
    assert_eq!(loaded.name(), "scenario");
    assert!(loaded.node(2).expect("dialogue").collapsed);
    assert_eq!(loaded.edges().collect::<Vec<_>>(), visual.edges().collect::<Vec<_>>());
    assert_eq!(loaded.characters(), visual.characters());
    assert_eq!(loaded.scenes(), visual.scenes());
}

#[test]
fn test_json_rejects_dangling_edge() {
    let input = r#"{
        "name": "x",
        "nodes": [{"id": 1, "type": "Dialogue"}],
        "edges": [{"sourceNode": 1, "sourcePort": "out", "targetNode": 9, "targetPort": "in"}]
    }"#;
    assert!(matches!(VisualGraph::from_json(input), Err(IrError::Parse { .. })));
}
