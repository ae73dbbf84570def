use std::collections::BTreeMap;

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{VisualCharacter, VisualGraph, VisualGraphNode};
use crate::error::{json_deserialize_error, IrError, IrResult};
use crate::graph::{EdgeDocument, NodeId};
use crate::version::{check_schema_version, GRAPH_SCHEMA_VERSION};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct VisualGraphDocument {
    #[serde(default)]
    schema_version: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    nodes: Vec<VisualGraphNode>,
    #[serde(default)]
    edges: Vec<EdgeDocument>,
    #[serde(default)]
    scenes: BTreeMap<String, NodeId>,
    #[serde(default)]
    characters: Vec<VisualCharacter>,
}

impl VisualGraph {
    pub fn to_json(&self) -> IrResult<String> {
        let document = VisualGraphDocument {
            schema_version: Some(GRAPH_SCHEMA_VERSION.to_string()),
            name: self.name.clone(),
            nodes: self.nodes().cloned().collect(),
            edges: self.graph.edges().iter().map(EdgeDocument::from).collect(),
            scenes: self.scenes.clone(),
            characters: self.characters.clone(),
        };
        serde_json::to_string_pretty(&document)
            .map_err(|err| IrError::parse_message(err.to_string()))
    }

    #[instrument(skip_all, fields(bytes = input.len()))]
    pub fn from_json(input: &str) -> IrResult<Self> {
        let document: VisualGraphDocument =
            serde_json::from_str(input).map_err(|err| json_deserialize_error(input, &err))?;
        check_schema_version(document.schema_version.as_deref())?;

        let mut visual = VisualGraph::new(document.name);
        for node in document.nodes {
            let id = node.id;
            if !visual.insert_node(node) {
                return Err(IrError::parse_message(format!(
                    "duplicate or invalid node id {id}"
                )));
            }
        }
        for edge in &document.edges {
            let (source, target) = edge.ports();
            visual
                .add_labeled_edge(source, target, edge.label.clone())
                .map_err(|err| IrError::parse_message(format!("invalid edge: {err}")))?;
        }
        for (scene, id) in document.scenes {
            visual
                .add_scene(scene.clone(), id)
                .map_err(|err| IrError::parse_message(format!("scene '{scene}': {err}")))?;
        }
        for character in document.characters {
            visual.add_character(character);
        }
        Ok(visual)
    }

    pub fn json_schema() -> RootSchema {
        schema_for!(VisualGraphDocument)
    }
}
