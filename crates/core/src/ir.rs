//! Canonical intermediate representation of a script.
//!
//! An [`IrGraph`] is a directed graph of typed nodes connected port to port,
//! plus the scene entry points and the character table.
//!
//! # Invariants
//! - Every scene-start mapping references a live node; removing the node
//!   drops the mapping.
//! - Connections follow the [`PortGraph`] rules: output to input, live
//!   endpoints, no duplicates.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::graph::{Edge, NodeId, PortGraph, PortId};

mod export;
mod json;
mod node;
pub mod ports;

pub use node::{IrNode, IrNodeType, PropertyKind, PropertyValue};

/// Connection between two IR ports. The payload is the edge label.
pub type IrConnection = Edge<String>;

impl Edge<String> {
    pub fn label(&self) -> &str {
        &self.data
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterInfo {
    pub id: String,
    pub display_name: String,
    pub color: Option<String>,
}

/// Statistics about an IR graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub reachable_nodes: usize,
    pub unreachable_nodes: usize,
    pub dialogue_count: usize,
    pub choice_count: usize,
    /// Choices, branches, switches and loops.
    pub branch_count: usize,
    pub scene_count: usize,
    pub connection_count: usize,
}

#[derive(Clone, Debug, Default)]
pub struct IrGraph {
    name: String,
    graph: PortGraph<IrNode, String>,
    scene_starts: BTreeMap<String, NodeId>,
    characters: Vec<CharacterInfo>,
}

impl IrGraph {
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

    // =========================================================================
    // Nodes
    // =========================================================================

    pub fn create_node(&mut self, node_type: IrNodeType) -> NodeId {
        self.graph.add_node_with(|id| IrNode::new(id, node_type))
    }

    /// Inserts a node under a fixed identifier, as when loading a document.
    pub(crate) fn insert_node(&mut self, node: IrNode) -> bool {
        self.graph.insert_node_with_id(node.id(), node)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<IrNode> {
        let removed = self.graph.remove_node(id)?;
        self.scene_starts.retain(|_, start| *start != id);
        Some(removed)
    }

    pub fn node(&self, id: NodeId) -> Option<&IrNode> {
        self.graph.node(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut IrNode> {
        self.graph.node_mut(id)
    }

    /// Nodes in ascending identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &IrNode> + '_ {
        self.graph.nodes().map(|(_, node)| node)
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn next_id(&self) -> NodeId {
        self.graph.next_id()
    }

    // =========================================================================
    // Connections
    // =========================================================================

    pub fn connect(&mut self, source: PortId, target: PortId) -> IrResult<()> {
        self.connect_labeled(source, target, String::new())
    }

    pub fn connect_labeled(
        &mut self,
        source: PortId,
        target: PortId,
        label: impl Into<String>,
    ) -> IrResult<()> {
        self.graph.connect(source, target, label.into())
    }

    pub fn disconnect(&mut self, source: &PortId, target: &PortId) -> bool {
        self.graph.disconnect(source, target).is_some()
    }

    pub fn connections(&self) -> &[IrConnection] {
        self.graph.edges()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &IrConnection> + '_ {
        self.graph.outgoing(id)
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &IrConnection> + '_ {
        self.graph.incoming(id)
    }

    /// First node connected to the given output port.
    pub fn target_of(&self, id: NodeId, port: &str) -> Option<NodeId> {
        self.graph
            .outgoing_from(id, port)
            .next()
            .map(|edge| edge.target.node_id)
    }

    pub(crate) fn port_graph(&self) -> &PortGraph<IrNode, String> {
        &self.graph
    }

    // =========================================================================
    // Scenes and characters
    // =========================================================================

    pub fn add_scene_start(&mut self, scene: impl Into<String>, id: NodeId) -> IrResult<()> {
        if !self.graph.contains(id) {
            return Err(IrError::UnknownNode(id));
        }
        self.scene_starts.insert(scene.into(), id);
        Ok(())
    }

    pub fn scene_start(&self, scene: &str) -> Option<NodeId> {
        self.scene_starts.get(scene).copied()
    }

    pub fn scene_starts(&self) -> &BTreeMap<String, NodeId> {
        &self.scene_starts
    }

    /// Adds a character, replacing an existing entry with the same id in place.
    pub fn add_character(
        &mut self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        color: Option<String>,
    ) {
        let info = CharacterInfo {
            id: id.into(),
            display_name: display_name.into(),
            color,
        };
        match self.characters.iter_mut().find(|c| c.id == info.id) {
            Some(existing) => *existing = info,
            None => self.characters.push(info),
        }
    }

    pub fn characters(&self) -> &[CharacterInfo] {
        &self.characters
    }

    pub fn character(&self, id: &str) -> Option<&CharacterInfo> {
        self.characters.iter().find(|c| c.id == id)
    }

    // =========================================================================
    // Ordering and analysis
    // =========================================================================

    pub fn topological_order(&self) -> Vec<NodeId> {
        self.graph.topological_order()
    }

    /// Nodes in the order a reader meets them: each scene walked from its
    /// start following output ports in port order, then everything the
    /// walks missed in topological order.
    pub fn execution_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.graph.len());
        let mut visited: HashSet<NodeId> = HashSet::new();
        for root in self.entry_nodes() {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                order.push(id);
                let Some(node) = self.graph.node(id) else {
                    continue;
                };
                let successors: Vec<NodeId> = ports::output_ports(node)
                    .iter()
                    .flat_map(|port| self.graph.outgoing_from(id, port))
                    .map(|edge| edge.target.node_id)
                    .collect();
                stack.extend(successors.into_iter().rev());
            }
        }
        for id in self.graph.topological_order() {
            if visited.insert(id) {
                order.push(id);
            }
        }
        order
    }

    /// Scene starts from the map plus every other `SceneStart` node, in
    /// ascending id.
    pub(crate) fn entry_nodes(&self) -> Vec<NodeId> {
        let entries: BTreeSet<NodeId> = self
            .scene_starts
            .values()
            .copied()
            .filter(|id| self.graph.contains(*id))
            .chain(
                self.nodes()
                    .filter(|node| node.node_type() == IrNodeType::SceneStart)
                    .map(IrNode::id),
            )
            .collect();
        entries.into_iter().collect()
    }

    pub fn find_cycles(&self) -> Vec<Vec<NodeId>> {
        self.graph.find_cycles()
    }

    pub fn unreachable_nodes(&self) -> Vec<NodeId> {
        let reached = self.graph.reachable_from(self.entry_nodes());
        self.graph
            .node_ids()
            .filter(|id| !reached.contains(id))
            .collect()
    }

    /// Structural problems, one message per finding. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (scene, id) in &self.scene_starts {
            match self.graph.node(*id) {
                None => issues.push(format!("scene '{scene}' starts at missing node {id}")),
                Some(node) if node.node_type() != IrNodeType::SceneStart => issues.push(format!(
                    "scene '{scene}' starts at node {id} of type {}, expected SceneStart",
                    node.node_type()
                )),
                Some(_) => {}
            }
        }

        for edge in self.graph.edges() {
            let (source, target) = (&edge.source, &edge.target);
            if let Some(node) = self.graph.node(source.node_id) {
                if !ports::has_output_port(node, &source.port_name) {
                    issues.push(format!(
                        "node {} ({}) has no output port '{}'",
                        source.node_id,
                        node.node_type(),
                        source.port_name
                    ));
                }
            }
            if let Some(node) = self.graph.node(target.node_id) {
                if !ports::has_input_port(node, &target.port_name) {
                    issues.push(format!(
                        "node {} ({}) has no input port '{}'",
                        target.node_id,
                        node.node_type(),
                        target.port_name
                    ));
                }
            }
            if source.node_id == target.node_id {
                issues.push(format!("node {} connects to itself", source.node_id));
            }
        }

        for cycle in self.graph.find_cycles() {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            issues.push(format!("cycle detected: {}", members.join(" -> ")));
        }

        for id in self.unreachable_nodes() {
            if let Some(node) = self.graph.node(id) {
                issues.push(format!(
                    "node {id} ({}) is unreachable from any scene start",
                    node.node_type()
                ));
            }
        }
        issues
    }

    pub fn stats(&self) -> GraphStats {
        let count = |wanted: &[IrNodeType]| {
            self.nodes()
                .filter(|node| wanted.contains(&node.node_type()))
                .count()
        };
        let unreachable_nodes = self.unreachable_nodes().len();
        GraphStats {
            total_nodes: self.graph.len(),
            reachable_nodes: self.graph.len() - unreachable_nodes,
            unreachable_nodes,
            dialogue_count: count(&[IrNodeType::Dialogue]),
            choice_count: count(&[IrNodeType::Choice]),
            branch_count: count(&[
                IrNodeType::Choice,
                IrNodeType::Branch,
                IrNodeType::Switch,
                IrNodeType::Loop,
            ]),
            scene_count: self.entry_nodes().len(),
            connection_count: self.graph.edge_count(),
        }
    }
}

#[cfg(test)]
#[path = "tests/ir_tests.rs"]
mod tests;
