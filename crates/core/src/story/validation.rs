//! Structural checks over a [`StoryGraph`].
//!
//! Severity policy: a missing start, cycles, broken connections, missing
//! required properties and inconsistent ids are errors. Content that the
//! start node cannot reach is a warning.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use super::{StoryGraph, StoryNodeType};
use crate::graph::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IssueCode {
    MissingStart,
    MultipleStart,
    Cycle,
    Unreachable,
    InvalidConnection,
    MissingProperty,
    DuplicateId,
}

impl IssueCode {
    pub fn label(self) -> &'static str {
        match self {
            IssueCode::MissingStart => "VAL_START_MISSING",
            IssueCode::MultipleStart => "VAL_START_MULTIPLE",
            IssueCode::Cycle => "VAL_CYCLE",
            IssueCode::Unreachable => "VAL_UNREACHABLE",
            IssueCode::InvalidConnection => "VAL_CONNECTION",
            IssueCode::MissingProperty => "VAL_PROPERTY_MISSING",
            IssueCode::DuplicateId => "VAL_DUPLICATE_ID",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: IssueCode,
    pub node_id: Option<NodeId>,
    pub message: String,
}

impl ValidationIssue {
    fn error(code: IssueCode, node_id: Option<NodeId>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code,
            node_id,
            message: message.into(),
        }
    }

    fn warning(code: IssueCode, node_id: Option<NodeId>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code,
            node_id,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node_id {
            Some(id) => write!(f, "[{}] node {id}: {}", self.code.label(), self.message),
            None => write!(f, "[{}] {}", self.code.label(), self.message),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    /// Member ids of each distinct cycle.
    pub cycles: Vec<Vec<NodeId>>,
    pub unreachable_nodes: usize,
}

impl ValidationResult {
    /// True when no error was found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> + '_ {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> + '_ {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
    }
}

impl StoryGraph {
    #[instrument(skip_all, fields(nodes = self.node_count()))]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        self.validate_ids(&mut result);
        self.validate_start(&mut result);

        result.cycles = self.detect_cycles();
        for cycle in &result.cycles {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            result.issues.push(ValidationIssue::error(
                IssueCode::Cycle,
                cycle.first().copied(),
                format!("cycle through nodes {}", members.join(" -> ")),
            ));
        }

        let unreachable = self.detect_unreachable();
        result.unreachable_nodes = unreachable.len();
        for id in unreachable {
            result.issues.push(ValidationIssue::warning(
                IssueCode::Unreachable,
                Some(id),
                "not reachable from the start node",
            ));
        }

        self.validate_connections(&mut result);
        self.validate_node_properties(&mut result);
        debug!(
            issues = result.issues.len(),
            valid = result.is_valid(),
            "story graph validated"
        );
        result
    }

    /// Declared start, or the lowest-id `Start` node when none is declared.
    pub fn entry_node(&self) -> Option<NodeId> {
        self.start_node.filter(|id| self.graph.contains(*id)).or_else(|| {
            self.nodes()
                .find(|node| node.node_type == StoryNodeType::Start)
                .map(|node| node.id)
        })
    }

    /// Each distinct cycle once, self-loops included.
    pub fn detect_cycles(&self) -> Vec<Vec<NodeId>> {
        self.graph.find_cycles()
    }

    /// Nodes the entry node cannot reach. Comments never count, and without
    /// an entry node nothing is reported.
    pub fn detect_unreachable(&self) -> Vec<NodeId> {
        let Some(entry) = self.entry_node() else {
            return Vec::new();
        };
        let reached = self.graph.reachable_from([entry]);
        self.nodes()
            .filter(|node| node.node_type != StoryNodeType::Comment)
            .map(|node| node.id)
            .filter(|id| !reached.contains(id))
            .collect()
    }

    fn validate_ids(&self, result: &mut ValidationResult) {
        let mut seen = BTreeSet::new();
        for (key, node) in self.graph.nodes() {
            if node.id != key || !seen.insert(node.id) {
                result.issues.push(ValidationIssue::error(
                    IssueCode::DuplicateId,
                    Some(key),
                    format!("node stored under id {key} carries id {}", node.id),
                ));
            }
        }
    }

    fn validate_start(&self, result: &mut ValidationResult) {
        let starts: Vec<NodeId> = self
            .nodes()
            .filter(|node| node.node_type == StoryNodeType::Start)
            .map(|node| node.id)
            .collect();
        if self.entry_node().is_none() {
            result.issues.push(ValidationIssue::error(
                IssueCode::MissingStart,
                None,
                "graph has no start node",
            ));
        }
        if starts.len() > 1 {
            result.issues.push(ValidationIssue::warning(
                IssueCode::MultipleStart,
                starts.get(1).copied(),
                format!("{} Start nodes, only one is the entry", starts.len()),
            ));
        }
    }

    fn validate_connections(&self, result: &mut ValidationResult) {
        for edge in self.connections() {
            let source = self.node(edge.source.node_id);
            let target = self.node(edge.target.node_id);
            let (Some(source), Some(target)) = (source, target) else {
                result.issues.push(ValidationIssue::error(
                    IssueCode::InvalidConnection,
                    Some(edge.source.node_id),
                    format!("connection {} -> {} references a missing node", edge.source, edge.target),
                ));
                continue;
            };
            let out = source.output(&edge.source.port_name);
            let input = target.input(&edge.target.port_name);
            let problem = match (out, input) {
                (None, _) => Some(format!("output port '{}' does not exist", edge.source.port_name)),
                (_, None) => Some(format!(
                    "input port '{}' on node {} does not exist",
                    edge.target.port_name, target.id
                )),
                (Some(out), Some(input)) if out.kind != input.kind => Some(format!(
                    "port kinds differ: {:?} '{}' -> {:?} '{}'",
                    out.kind, out.name, input.kind, input.name
                )),
                _ => None,
            };
            if let Some(message) = problem {
                result.issues.push(ValidationIssue::error(
                    IssueCode::InvalidConnection,
                    Some(source.id),
                    message,
                ));
            }
        }
    }

    fn validate_node_properties(&self, result: &mut ValidationResult) {
        for node in self.nodes() {
            let Some(required) = node.node_type.required_property() else {
                continue;
            };
            if node.property(required).map_or(true, |value| value.trim().is_empty()) {
                result.issues.push(ValidationIssue::error(
                    IssueCode::MissingProperty,
                    Some(node.id),
                    format!("{} node needs a non-empty '{required}'", node.node_type),
                ));
            }
        }
    }
}
