//! Story graph used by the node-based story editor.
//!
//! A lighter sibling of the IR graph: nodes declare their own typed ports,
//! and connections are checked against those declarations. Cycle and
//! reachability analysis come from the shared [`PortGraph`] core.
//!
//! # Invariants
//! - Connections join an existing output port to an existing input port of
//!   the same [`PortKind`] on live nodes.
//! - Removing a node or one of its output ports removes every connection
//!   attached to it.
//! - `start_node`, when set, references a live node.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::graph::{Edge, NodeId, PortGraph, PortId};

mod persist;
mod validation;

pub use validation::{IssueCode, IssueSeverity, ValidationIssue, ValidationResult};

// =============================================================================
// Node types and ports
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum StoryNodeType {
    Start,
    End,
    Dialogue,
    Choice,
    Condition,
    Scene,
    Event,
    Variable,
    Jump,
    Comment,
}

impl StoryNodeType {
    pub const ALL: [StoryNodeType; 10] = [
        StoryNodeType::Start,
        StoryNodeType::End,
        StoryNodeType::Dialogue,
        StoryNodeType::Choice,
        StoryNodeType::Condition,
        StoryNodeType::Scene,
        StoryNodeType::Event,
        StoryNodeType::Variable,
        StoryNodeType::Jump,
        StoryNodeType::Comment,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StoryNodeType::Start => "Start",
            StoryNodeType::End => "End",
            StoryNodeType::Dialogue => "Dialogue",
            StoryNodeType::Choice => "Choice",
            StoryNodeType::Condition => "Condition",
            StoryNodeType::Scene => "Scene",
            StoryNodeType::Event => "Event",
            StoryNodeType::Variable => "Variable",
            StoryNodeType::Jump => "Jump",
            StoryNodeType::Comment => "Comment",
        }
    }

    /// Property that must be present and non-empty.
    pub fn required_property(self) -> Option<&'static str> {
        match self {
            StoryNodeType::Dialogue => Some("text"),
            StoryNodeType::Condition => Some("condition"),
            StoryNodeType::Scene => Some("scene"),
            StoryNodeType::Event => Some("event"),
            StoryNodeType::Variable => Some("variable"),
            StoryNodeType::Jump => Some("target"),
            StoryNodeType::Start
            | StoryNodeType::End
            | StoryNodeType::Choice
            | StoryNodeType::Comment => None,
        }
    }

    fn default_ports(self) -> (Vec<StoryPort>, Vec<StoryPort>) {
        let flow_in = || vec![StoryPort::flow("in")];
        let flow_out = || vec![StoryPort::flow("out")];
        match self {
            StoryNodeType::Start => (Vec::new(), flow_out()),
            StoryNodeType::End | StoryNodeType::Jump => (flow_in(), Vec::new()),
            StoryNodeType::Dialogue | StoryNodeType::Scene | StoryNodeType::Event => {
                (flow_in(), flow_out())
            }
            StoryNodeType::Choice => (flow_in(), Vec::new()),
            StoryNodeType::Condition => (
                vec![StoryPort::flow("in"), StoryPort::data("condition")],
                vec![StoryPort::flow("true"), StoryPort::flow("false")],
            ),
            StoryNodeType::Variable => (
                flow_in(),
                vec![StoryPort::flow("out"), StoryPort::data("value")],
            ),
            StoryNodeType::Comment => (Vec::new(), Vec::new()),
        }
    }
}

impl fmt::Display for StoryNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// Execution order.
    Flow,
    /// Value wiring.
    Data,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoryPort {
    pub name: String,
    pub kind: PortKind,
    #[serde(default)]
    pub label: String,
}

impl StoryPort {
    pub fn flow(name: impl Into<String>) -> Self {
        Self::new(name, PortKind::Flow)
    }

    pub fn data(name: impl Into<String>) -> Self {
        Self::new(name, PortKind::Data)
    }

    fn new(name: impl Into<String>, kind: PortKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
        }
    }
}

// =============================================================================
// StoryNode
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: StoryNodeType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub inputs: Vec<StoryPort>,
    #[serde(default)]
    pub outputs: Vec<StoryPort>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(skip)]
    pub selected: bool,
    #[serde(default)]
    pub collapsed: bool,
}

fn default_width() -> f64 {
    180.0
}

fn default_height() -> f64 {
    90.0
}

impl StoryNode {
    fn new(id: NodeId, node_type: StoryNodeType, x: f64, y: f64) -> Self {
        let (inputs, outputs) = node_type.default_ports();
        Self {
            id,
            node_type,
            title: node_type.label().to_string(),
            description: String::new(),
            x,
            y,
            width: default_width(),
            height: default_height(),
            inputs,
            outputs,
            properties: BTreeMap::new(),
            selected: false,
            collapsed: false,
        }
    }

    pub fn input(&self, name: &str) -> Option<&StoryPort> {
        self.inputs.iter().find(|port| port.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&StoryPort> {
        self.outputs.iter().find(|port| port.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }
}

/// Editor flags carried by each connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub selected: bool,
}

pub type StoryConnection = Edge<ConnectionState>;

// =============================================================================
// StoryGraph
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct StoryGraph {
    name: String,
    graph: PortGraph<StoryNode, ConnectionState>,
    start_node: Option<NodeId>,
}

impl StoryGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_node(&mut self, node_type: StoryNodeType, x: f64, y: f64) -> NodeId {
        self.graph
            .add_node_with(|id| StoryNode::new(id, node_type, x, y))
    }

    pub(crate) fn insert_node(&mut self, node: StoryNode) -> bool {
        self.graph.insert_node_with_id(node.id, node)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<StoryNode> {
        let removed = self.graph.remove_node(id)?;
        if self.start_node == Some(id) {
            self.start_node = None;
        }
        Some(removed)
    }

    pub fn node(&self, id: NodeId) -> Option<&StoryNode> {
        self.graph.node(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut StoryNode> {
        self.graph.node_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StoryNode> + '_ {
        self.graph.nodes().map(|(_, node)| node)
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn start_node(&self) -> Option<NodeId> {
        self.start_node
    }

    pub fn set_start_node(&mut self, id: NodeId) -> IrResult<()> {
        if !self.graph.contains(id) {
            return Err(IrError::UnknownNode(id));
        }
        self.start_node = Some(id);
        Ok(())
    }

    // =========================================================================
    // Ports
    // =========================================================================

    /// Appends an output port. Returns `false` if the name is taken.
    pub fn add_output_port(&mut self, id: NodeId, port: StoryPort) -> IrResult<bool> {
        let node = self.graph.node_mut(id).ok_or(IrError::UnknownNode(id))?;
        if node.output(&port.name).is_some() {
            return Ok(false);
        }
        node.outputs.push(port);
        Ok(true)
    }

    /// Removes an output port and every connection leaving it.
    pub fn remove_output_port(&mut self, id: NodeId, name: &str) -> IrResult<bool> {
        let node = self.graph.node_mut(id).ok_or(IrError::UnknownNode(id))?;
        let before = node.outputs.len();
        node.outputs.retain(|port| port.name != name);
        if node.outputs.len() == before {
            return Ok(false);
        }
        let attached: Vec<StoryConnection> = self
            .graph
            .outgoing_from(id, name)
            .cloned()
            .collect();
        for edge in attached {
            self.graph.disconnect(&edge.source, &edge.target);
        }
        Ok(true)
    }

    /// Adds an `option_N` flow port to a choice node and returns its name.
    /// `N` is the lowest index not already taken, so removed options leave
    /// reusable gaps.
    pub fn add_choice_option(&mut self, id: NodeId, text: impl Into<String>) -> IrResult<String> {
        let node = self.graph.node(id).ok_or(IrError::UnknownNode(id))?;
        if node.node_type != StoryNodeType::Choice {
            return Err(IrError::InvalidProperty {
                node: id,
                property: "options".to_string(),
                reason: format!("{} nodes have no options", node.node_type),
            });
        }
        let name = (0..=node.outputs.len())
            .map(|index| format!("option_{index}"))
            .find(|name| node.output(name).is_none())
            .unwrap_or_default();
        let mut port = StoryPort::flow(name.clone());
        port.label = text.into();
        if !self.add_output_port(id, port)? {
            return Err(IrError::InvalidPort {
                node: id,
                port: name,
                reason: "port name already taken".to_string(),
            });
        }
        Ok(name)
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Connects two declared ports of the same kind.
    ///
    /// Fails with [`IrError::InvalidPort`] on a wrong direction, an
    /// undeclared port or a kind mismatch, with [`IrError::UnknownNode`] on
    /// a missing endpoint and with [`IrError::DuplicateConnection`] when the
    /// pair is already connected.
    pub fn connect(&mut self, source: PortId, target: PortId) -> IrResult<()> {
        if source.is_output && !target.is_output {
            if let (Some(from), Some(to)) =
                (self.graph.node(source.node_id), self.graph.node(target.node_id))
            {
                check_ports(from, &source, to, &target)?;
            }
        }
        self.graph.connect(source, target, ConnectionState::default())
    }

    pub fn disconnect(&mut self, source: &PortId, target: &PortId) -> bool {
        self.graph.disconnect(source, target).is_some()
    }

    pub fn connections(&self) -> &[StoryConnection] {
        self.graph.edges()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn select_connection(&mut self, source: &PortId, target: &PortId, selected: bool) -> bool {
        match self.graph.edge_data_mut(source, target) {
            Some(state) => {
                state.selected = selected;
                true
            }
            None => false,
        }
    }
}

fn check_ports(
    from: &StoryNode,
    source: &PortId,
    to: &StoryNode,
    target: &PortId,
) -> IrResult<()> {
    let invalid = |port: &PortId, reason: String| IrError::InvalidPort {
        node: port.node_id,
        port: port.port_name.clone(),
        reason,
    };
    let out = from.output(&source.port_name).ok_or_else(|| {
        invalid(source, format!("{} node has no output port", from.node_type))
    })?;
    let input = to.input(&target.port_name).ok_or_else(|| {
        invalid(target, format!("{} node has no input port", to.node_type))
    })?;
    if out.kind != input.kind {
        return Err(invalid(
            target,
            format!("{:?} output cannot feed a {:?} input", out.kind, input.kind),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/story_tests.rs"]
mod tests;
