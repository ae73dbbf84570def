//! Generic port graph shared by the IR, visual and story models.
//!
//! A [`PortGraph`] owns node payloads keyed by [`NodeId`] and a list of
//! directed edges between named ports. The three graph models of the crate
//! specialize it with their own node and edge payloads, so identifier
//! allocation, cascading removal and duplicate detection behave the same
//! everywhere.
//!
//! # Invariants
//! - Identifiers are allocated from a counter starting at 1 and are never
//!   reused, even after removal.
//! - Every edge references two live nodes.
//! - No two edges share the same (source port, target port) pair.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

mod analysis;

/// Unique identifier for a graph node.
pub type NodeId = u64;

// =============================================================================
// Ports and edges
// =============================================================================

/// Endpoint of a connection: a named port on a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortId {
    pub node_id: NodeId,
    pub port_name: String,
    pub is_output: bool,
}

impl PortId {
    pub fn output(node_id: NodeId, port_name: impl Into<String>) -> Self {
        Self {
            node_id,
            port_name: port_name.into(),
            is_output: true,
        }
    }

    pub fn input(node_id: NodeId, port_name: impl Into<String>) -> Self {
        Self {
            node_id,
            port_name: port_name.into(),
            is_output: false,
        }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_output { "out" } else { "in" };
        write!(f, "{}.{}({})", self.node_id, self.port_name, direction)
    }
}

/// Directed connection from an output port to an input port.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge<E> {
    pub source: PortId,
    pub target: PortId,
    pub data: E,
}

/// Flat edge record used by every JSON document of the crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EdgeDocument {
    pub source_node: NodeId,
    pub source_port: String,
    pub target_node: NodeId,
    pub target_port: String,
    #[serde(default)]
    pub label: String,
}

impl EdgeDocument {
    pub fn ports(&self) -> (PortId, PortId) {
        (
            PortId::output(self.source_node, self.source_port.clone()),
            PortId::input(self.target_node, self.target_port.clone()),
        )
    }
}

impl From<&Edge<String>> for EdgeDocument {
    fn from(edge: &Edge<String>) -> Self {
        Self {
            source_node: edge.source.node_id,
            source_port: edge.source.port_name.clone(),
            target_node: edge.target.node_id,
            target_port: edge.target.port_name.clone(),
            label: edge.data.clone(),
        }
    }
}

// =============================================================================
// Graph
// =============================================================================

/// Node store plus edge list with monotonic identifier allocation.
#[derive(Clone, Debug)]
pub struct PortGraph<N, E = ()> {
    nodes: BTreeMap<NodeId, N>,
    edges: Vec<Edge<E>>,
    next_id: NodeId,
}

impl<N, E> Default for PortGraph<N, E> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            next_id: 1,
        }
    }
}

impl<N, E> PortGraph<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, payload: N) -> NodeId {
        self.add_node_with(|_| payload)
    }

    /// Adds a node whose payload needs to know its own identifier.
    pub fn add_node_with(&mut self, build: impl FnOnce(NodeId) -> N) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, build(id));
        id
    }

    /// Inserts a node under a caller-chosen identifier, as done when loading
    /// a document. Returns `false` when the identifier is zero or taken.
    pub fn insert_node_with_id(&mut self, id: NodeId, payload: N) -> bool {
        if id == 0 || self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(id, payload);
        self.next_id = self.next_id.max(id.saturating_add(1));
        true
    }

    /// Removes a node and every edge touching it. Absent ids are a no-op.
    pub fn remove_node(&mut self, id: NodeId) -> Option<N> {
        let removed = self.nodes.remove(&id)?;
        self.edges
            .retain(|edge| edge.source.node_id != id && edge.target.node_id != id);
        Some(removed)
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut N)> + '_ {
        self.nodes.iter_mut().map(|(id, node)| (*id, node))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identifier the next [`PortGraph::add_node`] call will hand out.
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    pub fn edges(&self) -> &[Edge<E>] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Connects an output port to an input port.
    ///
    /// Checks run in a fixed order: port direction, node existence, then
    /// duplicate detection.
    pub fn connect(&mut self, source: PortId, target: PortId, data: E) -> IrResult<()> {
        if !source.is_output {
            return Err(IrError::InvalidPort {
                node: source.node_id,
                port: source.port_name,
                reason: "connection source must be an output port".to_string(),
            });
        }
        if target.is_output {
            return Err(IrError::InvalidPort {
                node: target.node_id,
                port: target.port_name,
                reason: "connection target must be an input port".to_string(),
            });
        }
        for id in [source.node_id, target.node_id] {
            if !self.nodes.contains_key(&id) {
                return Err(IrError::UnknownNode(id));
            }
        }
        if self.has_edge(&source, &target) {
            return Err(IrError::DuplicateConnection {
                from: source,
                to: target,
            });
        }
        self.edges.push(Edge {
            source,
            target,
            data,
        });
        Ok(())
    }

    /// Removes the edge between two ports. Absent edges are a no-op.
    pub fn disconnect(&mut self, source: &PortId, target: &PortId) -> Option<Edge<E>> {
        let index = self
            .edges
            .iter()
            .position(|edge| &edge.source == source && &edge.target == target)?;
        Some(self.edges.remove(index))
    }

    pub fn has_edge(&self, source: &PortId, target: &PortId) -> bool {
        self.edges
            .iter()
            .any(|edge| &edge.source == source && &edge.target == target)
    }

    pub fn edge_data_mut(&mut self, source: &PortId, target: &PortId) -> Option<&mut E> {
        self.edges
            .iter_mut()
            .find(|edge| &edge.source == source && &edge.target == target)
            .map(|edge| &mut edge.data)
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge<E>> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.source.node_id == id)
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge<E>> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.target.node_id == id)
    }

    /// Edges leaving a single output port, in insertion order.
    pub fn outgoing_from<'a>(
        &'a self,
        id: NodeId,
        port: &'a str,
    ) -> impl Iterator<Item = &'a Edge<E>> + 'a {
        self.outgoing(id)
            .filter(move |edge| edge.source.port_name == port)
    }

    /// Distinct successor ids in ascending order.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.outgoing(id).map(|edge| edge.target.node_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Distinct predecessor ids in ascending order.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.incoming(id).map(|edge| edge.source.node_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Drops every node and edge. The identifier counter keeps running.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
#[path = "tests/graph_tests.rs"]
mod tests;
