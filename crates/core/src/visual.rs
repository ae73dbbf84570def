//! Editor-facing projection of the IR graph.
//!
//! A [`VisualGraph`] carries the same nodes and port-to-port edges as an
//! [`crate::IrGraph`], but node types are string tags and every property
//! value is a string, with a kind hint where the node type's schema does
//! not decide it. Editors can manipulate it without knowing the IR
//! enums; [`VisualGraph::to_ir`] re-types everything on the way back.
//!
//! # Invariants
//! - Mutations follow the [`PortGraph`] rules: monotonic ids, cascade on
//!   remove, output-to-input edges between live nodes, no duplicates.
//! - Every scene mapping references a live node.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::graph::{Edge, NodeId, PortGraph, PortId};
use crate::ir::PropertyKind;
use crate::script::SourceLocation;

mod bridge;
mod json;
mod layout;

pub const DEFAULT_NODE_WIDTH: f64 = 200.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 80.0;

// =============================================================================
// Entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualGraphNode {
    pub id: NodeId,
    /// IR node type tag, e.g. `"Dialogue"`.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Value kinds the node type's schema does not imply, so such values
    /// re-type exactly on the way back to IR.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub property_kinds: BTreeMap<String, PropertyKind>,
    #[serde(default)]
    pub source_location: SourceLocation,
}

fn default_width() -> f64 {
    DEFAULT_NODE_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_NODE_HEIGHT
}

impl VisualGraphNode {
    fn new(id: NodeId, node_type: String, x: f64, y: f64) -> Self {
        Self {
            id,
            title: node_type.clone(),
            node_type,
            x,
            y,
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
            collapsed: false,
            selected: false,
            properties: BTreeMap::new(),
            property_kinds: BTreeMap::new(),
            source_location: SourceLocation::default(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// Edge view handed to editors. The owned form lives in the graph core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualGraphEdge<'a> {
    pub source_node: NodeId,
    pub source_port: &'a str,
    pub target_node: NodeId,
    pub target_port: &'a str,
    pub label: &'a str,
}

impl<'a> From<&'a Edge<String>> for VisualGraphEdge<'a> {
    fn from(edge: &'a Edge<String>) -> Self {
        Self {
            source_node: edge.source.node_id,
            source_port: &edge.source.port_name,
            target_node: edge.target.node_id,
            target_port: &edge.target.port_name,
            label: &edge.data,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualCharacter {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

// =============================================================================
// Graph
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct VisualGraph {
    name: String,
    graph: PortGraph<VisualGraphNode, String>,
    scenes: BTreeMap<String, NodeId>,
    characters: Vec<VisualCharacter>,
}

impl VisualGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds a node of the given type tag. The tag is only checked by
    /// [`VisualGraph::to_ir`].
    pub fn add_node(&mut self, node_type: impl Into<String>, x: f64, y: f64) -> NodeId {
        let node_type = node_type.into();
        self.graph
            .add_node_with(|id| VisualGraphNode::new(id, node_type, x, y))
    }

    pub(crate) fn insert_node(&mut self, node: VisualGraphNode) -> bool {
        self.graph.insert_node_with_id(node.id, node)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<VisualGraphNode> {
        let removed = self.graph.remove_node(id)?;
        self.scenes.retain(|_, start| *start != id);
        Some(removed)
    }

    pub fn node(&self, id: NodeId) -> Option<&VisualGraphNode> {
        self.graph.node(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut VisualGraphNode> {
        self.graph.node_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &VisualGraphNode> + '_ {
        self.graph.nodes().map(|(_, node)| node)
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn next_id(&self) -> NodeId {
        self.graph.next_id()
    }

    pub fn set_node_position(&mut self, id: NodeId, x: f64, y: f64) -> IrResult<()> {
        let node = self.graph.node_mut(id).ok_or(IrError::UnknownNode(id))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    pub fn set_node_property(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> IrResult<()> {
        let node = self.graph.node_mut(id).ok_or(IrError::UnknownNode(id))?;
        let name = name.into();
        // edited text is typed by the schema again
        node.property_kinds.remove(&name);
        node.properties.insert(name, value.into());
        Ok(())
    }

    // =========================================================================
    // Edges
    // =========================================================================

    pub fn add_edge(&mut self, source: PortId, target: PortId) -> IrResult<()> {
        self.add_labeled_edge(source, target, String::new())
    }

    pub fn add_labeled_edge(
        &mut self,
        source: PortId,
        target: PortId,
        label: impl Into<String>,
    ) -> IrResult<()> {
        self.graph.connect(source, target, label.into())
    }

    /// Removes the edge if present. Returns whether anything was removed.
    pub fn remove_edge(&mut self, source: &PortId, target: &PortId) -> bool {
        self.graph.disconnect(source, target).is_some()
    }

    pub fn edges(&self) -> impl Iterator<Item = VisualGraphEdge<'_>> + '_ {
        self.graph.edges().iter().map(VisualGraphEdge::from)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // =========================================================================
    // Scenes and characters
    // =========================================================================

    pub fn add_scene(&mut self, scene: impl Into<String>, id: NodeId) -> IrResult<()> {
        if !self.graph.contains(id) {
            return Err(IrError::UnknownNode(id));
        }
        self.scenes.insert(scene.into(), id);
        Ok(())
    }

    pub fn scenes(&self) -> &BTreeMap<String, NodeId> {
        &self.scenes
    }

    pub fn add_character(&mut self, character: VisualCharacter) {
        match self.characters.iter_mut().find(|c| c.id == character.id) {
            Some(existing) => *existing = character,
            None => self.characters.push(character),
        }
    }

    pub fn characters(&self) -> &[VisualCharacter] {
        &self.characters
    }
}

#[cfg(test)]
#[path = "tests/visual_tests.rs"]
mod tests;
