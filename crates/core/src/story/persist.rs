use std::fs;
use std::path::Path;

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{StoryGraph, StoryNode};
use crate::error::{json_deserialize_error, IrError, IrResult};
use crate::graph::{EdgeDocument, NodeId};
use crate::version::{check_schema_version, GRAPH_SCHEMA_VERSION};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct StoryGraphDocument {
    #[serde(default)]
    schema_version: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_node: Option<NodeId>,
    #[serde(default)]
    nodes: Vec<StoryNode>,
    #[serde(default)]
    connections: Vec<EdgeDocument>,
}

impl StoryGraph {
    pub fn to_json(&self) -> IrResult<String> {
        let document = StoryGraphDocument {
            schema_version: Some(GRAPH_SCHEMA_VERSION.to_string()),
            name: self.name.clone(),
            start_node: self.start_node,
            nodes: self.nodes().cloned().collect(),
            connections: self
                .connections()
                .iter()
                .map(|edge| EdgeDocument {
                    source_node: edge.source.node_id,
                    source_port: edge.source.port_name.clone(),
                    target_node: edge.target.node_id,
                    target_port: edge.target.port_name.clone(),
                    label: String::new(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&document)
            .map_err(|err| IrError::parse_message(err.to_string()))
    }

    /// Loads a document written by [`StoryGraph::to_json`]. Connections are
    /// checked against the declared ports like [`StoryGraph::connect`].
    pub fn from_json(input: &str) -> IrResult<Self> {
        let document: StoryGraphDocument =
            serde_json::from_str(input).map_err(|err| json_deserialize_error(input, &err))?;
        check_schema_version(document.schema_version.as_deref())?;

        let mut graph = StoryGraph::new(document.name);
        for node in document.nodes {
            let id = node.id;
            if !graph.insert_node(node) {
                return Err(IrError::parse_message(format!(
                    "duplicate or invalid node id {id}"
                )));
            }
        }
        for edge in &document.connections {
            let (source, target) = edge.ports();
            graph
                .connect(source, target)
                .map_err(|err| IrError::parse_message(format!("invalid connection: {err}")))?;
        }
        if let Some(start) = document.start_node {
            graph
                .set_start_node(start)
                .map_err(|err| IrError::parse_message(format!("start node: {err}")))?;
        }
        Ok(graph)
    }

    #[instrument(skip(self))]
    pub fn save(&self, path: &Path) -> IrResult<()> {
        let payload = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| IrError::io(parent, err))?;
        }
        fs::write(path, payload).map_err(|err| IrError::io(path, err))?;
        info!(nodes = self.node_count(), "story graph saved");
        Ok(())
    }

    #[instrument]
    pub fn load(path: &Path) -> IrResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| IrError::io(path, err))?;
        Self::from_json(&raw)
    }

    pub fn json_schema() -> RootSchema {
        schema_for!(StoryGraphDocument)
    }
}
