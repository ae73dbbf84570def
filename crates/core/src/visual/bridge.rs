//! Conversion between [`VisualGraph`] and [`IrGraph`].
//!
//! Values cross as text: [`PropertyValue::to_display_string`] on the way
//! out, [`PropertyValue::parse_as`] against the node type's schema on the
//! way back. A value whose kind differs from the schema (or is not a string,
//! for properties outside the schema) records its kind in
//! [`VisualGraphNode::property_kinds`] and is parsed with that kind instead.
//! Without a hint, an empty text for a non-string schema property comes back
//! as null.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::{VisualCharacter, VisualGraph, VisualGraphNode, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH};
use crate::error::{IrError, IrResult};
use crate::graph::PortId;
use crate::ir::{IrGraph, IrNode, IrNodeType, PropertyKind, PropertyValue};

impl VisualGraph {
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn from_ir(graph: &IrGraph) -> Self {
        let mut visual = VisualGraph::new(graph.name());
        for node in graph.nodes() {
            visual.insert_node(visual_node(node));
        }
        for edge in graph.connections() {
            // Both endpoints are live in the source graph, so this cannot fail.
            let _ = visual.add_labeled_edge(
                edge.source.clone(),
                edge.target.clone(),
                edge.label().to_string(),
            );
        }
        for (scene, id) in graph.scene_starts() {
            let _ = visual.add_scene(scene.clone(), *id);
        }
        for character in graph.characters() {
            visual.add_character(VisualCharacter {
                id: character.id.clone(),
                display_name: character.display_name.clone(),
                color: character.color.clone(),
            });
        }
        visual
    }

    /// Re-types the graph. Node ids are preserved.
    ///
    /// Unknown type tags fail with [`IrError::UnknownNodeType`]; a schema
    /// property whose text does not parse fails with
    /// [`IrError::InvalidProperty`].
    #[instrument(skip_all, fields(nodes = self.node_count()))]
    pub fn to_ir(&self) -> IrResult<IrGraph> {
        let mut graph = IrGraph::new(self.name());
        for visual in self.nodes() {
            let node = ir_node(visual)?;
            if !graph.insert_node(node) {
                return Err(IrError::parse_message(format!(
                    "duplicate or invalid node id {}",
                    visual.id
                )));
            }
        }
        for edge in self.edges() {
            graph.connect_labeled(
                PortId::output(edge.source_node, edge.source_port),
                PortId::input(edge.target_node, edge.target_port),
                edge.label.to_string(),
            )?;
        }
        for (scene, id) in self.scenes() {
            graph.add_scene_start(scene.clone(), *id)?;
        }
        for character in self.characters() {
            graph.add_character(
                character.id.clone(),
                character.display_name.clone(),
                character.color.clone(),
            );
        }
        debug!(
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "converted visual graph to ir"
        );
        Ok(graph)
    }
}

fn visual_node(node: &IrNode) -> VisualGraphNode {
    let node_type = node.node_type();
    let mut properties = BTreeMap::new();
    let mut property_kinds = BTreeMap::new();
    for (name, value) in node.properties() {
        let implied = node_type.property_kind(name).unwrap_or(PropertyKind::String);
        if value.kind() != implied {
            property_kinds.insert(name.clone(), value.kind());
        }
        properties.insert(name.clone(), value.to_display_string());
    }
    VisualGraphNode {
        id: node.id(),
        node_type: node.node_type().as_str().to_string(),
        title: title(node),
        x: node.x,
        y: node.y,
        width: DEFAULT_NODE_WIDTH,
        height: DEFAULT_NODE_HEIGHT,
        collapsed: false,
        selected: false,
        properties,
        property_kinds,
        source_location: node.source_location,
    }
}

fn title(node: &IrNode) -> String {
    match node.node_type() {
        IrNodeType::SceneStart | IrNodeType::SceneEnd => {
            let scene = node.get_string("scene");
            if scene.is_empty() {
                node.node_type().to_string()
            } else {
                format!("{}: {scene}", node.node_type())
            }
        }
        IrNodeType::Dialogue => match node.get_string("speaker") {
            "" => "Narration".to_string(),
            speaker => speaker.to_string(),
        },
        other => other.to_string(),
    }
}

fn ir_node(visual: &VisualGraphNode) -> IrResult<IrNode> {
    let node_type: IrNodeType = visual.node_type.parse()?;
    let mut node = IrNode::new(visual.id, node_type);
    for (name, text) in &visual.properties {
        let hint = visual.property_kinds.get(name).copied();
        let value = match hint.or_else(|| node_type.property_kind(name)) {
            None => PropertyValue::String(text.clone()),
            Some(PropertyKind::Bool | PropertyKind::Int | PropertyKind::Float)
                if hint.is_none() && text.is_empty() =>
            {
                PropertyValue::Null
            }
            Some(kind) => {
                PropertyValue::parse_as(kind, text).map_err(|reason| IrError::InvalidProperty {
                    node: visual.id,
                    property: name.clone(),
                    reason,
                })?
            }
        };
        node.set_property(name.clone(), value);
    }
    node.set_position(visual.x, visual.y);
    node.source_location = visual.source_location;
    Ok(node)
}
