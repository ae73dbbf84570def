//! JSON document form of [`IrGraph`].
//!
//! Property values keep their variant across save and load: declared
//! properties must match their schema kind, undeclared ones take the
//! variant implied by their JSON type.

use std::collections::BTreeMap;

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{CharacterInfo, IrGraph, IrNode, IrNodeType, PropertyValue};
use crate::error::{json_deserialize_error, IrError, IrResult};
use crate::graph::{EdgeDocument, NodeId};
use crate::script::SourceLocation;
use crate::version::{check_schema_version, GRAPH_SCHEMA_VERSION};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct IrGraphDocument {
    #[serde(default)]
    schema_version: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    nodes: Vec<IrNodeDocument>,
    #[serde(default)]
    connections: Vec<EdgeDocument>,
    #[serde(default)]
    scenes: BTreeMap<String, NodeId>,
    #[serde(default)]
    characters: Vec<CharacterInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct IrNodeDocument {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_location: Option<SourceLocation>,
}

impl IrNodeDocument {
    fn from_node(node: &IrNode) -> Self {
        let properties = node
            .properties()
            .iter()
            .map(|(name, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (name.clone(), json)
            })
            .collect();
        let location = node.source_location;
        Self {
            id: node.id(),
            node_type: node.node_type().as_str().to_string(),
            properties,
            x: node.x,
            y: node.y,
            source_location: (location != SourceLocation::default()).then_some(location),
        }
    }

    fn into_node(self) -> IrResult<IrNode> {
        let node_type: IrNodeType = self.node_type.parse()?;
        let mut node = IrNode::new(self.id, node_type);
        for (name, value) in &self.properties {
            let value = PropertyValue::from_json(value, node_type.property_kind(name))
                .map_err(|reason| {
                    IrError::parse_message(format!(
                        "node {} property '{name}': {reason}",
                        self.id
                    ))
                })?;
            node.set_property(name.clone(), value);
        }
        node.set_position(self.x, self.y);
        node.source_location = self.source_location.unwrap_or_default();
        Ok(node)
    }
}

impl IrGraph {
    pub fn to_json(&self) -> IrResult<String> {
        let document = IrGraphDocument {
            schema_version: Some(GRAPH_SCHEMA_VERSION.to_string()),
            name: self.name.clone(),
            nodes: self.nodes().map(IrNodeDocument::from_node).collect(),
            connections: self.connections().iter().map(EdgeDocument::from).collect(),
            scenes: self.scene_starts.clone(),
            characters: self.characters.clone(),
        };
        serde_json::to_string_pretty(&document)
            .map_err(|err| IrError::parse_message(err.to_string()))
    }

    /// Loads a document written by [`IrGraph::to_json`].
    ///
    /// Unknown node type tags fail with [`IrError::UnknownNodeType`]; every
    /// other malformation is an [`IrError::Parse`].
    #[instrument(skip_all, fields(bytes = input.len()))]
    pub fn from_json(input: &str) -> IrResult<Self> {
        let document: IrGraphDocument =
            serde_json::from_str(input).map_err(|err| json_deserialize_error(input, &err))?;
        check_schema_version(document.schema_version.as_deref())?;

        let mut graph = IrGraph::new(document.name);
        for node_document in document.nodes {
            let id = node_document.id;
            if !graph.insert_node(node_document.into_node()?) {
                return Err(IrError::parse_message(format!(
                    "duplicate or invalid node id {id}"
                )));
            }
        }
        for edge in &document.connections {
            let (source, target) = edge.ports();
            graph
                .connect_labeled(source, target, edge.label.clone())
                .map_err(|err| IrError::parse_message(format!("invalid connection: {err}")))?;
        }
        for (scene, id) in document.scenes {
            graph
                .add_scene_start(scene.clone(), id)
                .map_err(|err| IrError::parse_message(format!("scene '{scene}': {err}")))?;
        }
        for character in document.characters {
            graph.add_character(character.id, character.display_name, character.color);
        }
        debug!(
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "loaded ir graph"
        );
        Ok(graph)
    }

    pub fn json_schema() -> RootSchema {
        schema_for!(IrGraphDocument)
    }
}
