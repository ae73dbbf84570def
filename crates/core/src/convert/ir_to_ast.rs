use std::collections::HashSet;

use tracing::{instrument, warn};

use crate::config::CommentPolicy;
use crate::error::{IrError, IrResult};
use crate::graph::{NodeId, PortId};
use crate::ir::ports::{self, OUT};
use crate::ir::{IrGraph, IrNode, IrNodeType};
use crate::script::{
    is_identifier, parse_expression, CharacterDecl, ChoiceOption, Expression, Program, SceneDecl,
    Statement, StatementKind, SwitchCase,
};

/// Raises an [`IrGraph`] back into a [`Program`].
///
/// # Contracts
/// - Scenes come out in ascending start-node id.
/// - A scene's top-level chain must reach a `SceneEnd`; an unconnected
///   continuation port fails with [`IrError::IncompleteGraph`].
/// - Arm bodies end at their first unconnected continuation port.
/// - A node met twice in one scene ends the chain it was met on.
/// - Names that would not re-parse as identifiers are rejected with
///   [`IrError::InvalidProperty`] or [`IrError::InvalidName`].
#[derive(Clone, Debug, Default)]
pub struct IrToAstConverter {
    comments: CommentPolicy,
}

impl IrToAstConverter {
    pub fn new(comments: CommentPolicy) -> Self {
        Self { comments }
    }

    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn convert(&self, graph: &IrGraph) -> IrResult<Program> {
        let characters: Vec<CharacterDecl> = graph
            .characters()
            .iter()
            .map(|info| {
                if !is_identifier(&info.id) {
                    return Err(IrError::InvalidName {
                        what: "character",
                        name: info.id.clone(),
                    });
                }
                Ok(CharacterDecl {
                    id: info.id.clone(),
                    display_name: info.display_name.clone(),
                    color: info.color.clone(),
                    location: Default::default(),
                })
            })
            .collect::<IrResult<_>>()?;

        let mut scenes = Vec::new();
        for start in graph.entry_nodes() {
            let node = graph.node(start).ok_or(IrError::UnknownNode(start))?;
            let name = Self::scene_name(graph, node);
            if !is_identifier(&name) {
                return Err(invalid_name(node, "scene", &name));
            }
            let mut visited = HashSet::from([start]);
            let body = self.walk(graph, PortId::output(start, OUT), true, &mut visited)?;
            scenes.push(SceneDecl {
                name,
                body,
                location: node.source_location,
            });
        }
        Ok(Program { characters, scenes })
    }

    fn scene_name(graph: &IrGraph, start: &IrNode) -> String {
        graph
            .scene_starts()
            .iter()
            .find(|(_, id)| **id == start.id())
            .map(|(name, _)| name.clone())
            .or_else(|| start.try_string("scene").map(str::to_string))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("scene_{}", start.id()))
    }

    fn walk(
        &self,
        graph: &IrGraph,
        entry: PortId,
        top_level: bool,
        visited: &mut HashSet<NodeId>,
    ) -> IrResult<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut port = entry;
        loop {
            let Some(id) = graph.target_of(port.node_id, &port.port_name) else {
                if top_level {
                    return Err(IrError::IncompleteGraph {
                        node: port.node_id,
                        port: port.port_name,
                        reason: "scene flow ends before reaching a SceneEnd".to_string(),
                    });
                }
                break;
            };
            let node = graph.node(id).ok_or(IrError::UnknownNode(id))?;
            if node.node_type() == IrNodeType::SceneEnd {
                break;
            }
            if !visited.insert(id) {
                warn!(node = id, "node reached twice, stopping traversal");
                break;
            }
            if let Some(statement) = self.convert_node(graph, node, visited)? {
                statements.push(statement);
            }
            match ports::continuation_port(node.node_type()) {
                Some(next) => port = PortId::output(id, next),
                None => break,
            }
        }
        Ok(statements)
    }

    fn arm(
        &self,
        graph: &IrGraph,
        id: NodeId,
        port: &str,
        visited: &mut HashSet<NodeId>,
    ) -> IrResult<Vec<Statement>> {
        self.walk(graph, PortId::output(id, port), false, visited)
    }

    fn convert_node(
        &self,
        graph: &IrGraph,
        node: &IrNode,
        visited: &mut HashSet<NodeId>,
    ) -> IrResult<Option<Statement>> {
        let id = node.id();
        let kind = match node.node_type() {
            IrNodeType::SceneStart | IrNodeType::SceneEnd => return Ok(None),
            IrNodeType::Comment => match self.comments {
                CommentPolicy::Preserve => StatementKind::Comment {
                    text: node.get_string("text").to_string(),
                },
                CommentPolicy::Drop => return Ok(None),
            },
            IrNodeType::Dialogue => StatementKind::Say {
                speaker: optional_identifier(node, "speaker")?,
                text: node.get_string("text").to_string(),
            },
            IrNodeType::ShowBackground => StatementKind::ShowBackground {
                asset: node.get_string("asset").to_string(),
            },
            IrNodeType::ShowCharacter => StatementKind::ShowCharacter {
                character: identifier(node, "character")?,
                position: optional_identifier(node, "position")?,
            },
            IrNodeType::HideCharacter => StatementKind::HideCharacter {
                character: identifier(node, "character")?,
            },
            IrNodeType::Choice => {
                let conditions = node.get_string_list("conditions");
                let mut options = Vec::new();
                for (index, text) in node.get_string_list("options").iter().enumerate() {
                    let condition = match conditions.get(index).map(String::as_str) {
                        None | Some("") => None,
                        Some(source) => Some(expression(node, "conditions", source)?),
                    };
                    let body = self.arm(graph, id, &ports::option_port(index), visited)?;
                    options.push(ChoiceOption {
                        text: text.clone(),
                        condition,
                        body,
                    });
                }
                StatementKind::Choice { options }
            }
            IrNodeType::Branch => {
                let condition = expression(node, "condition", node.get_string("condition"))?;
                let then_branch = self.arm(graph, id, ports::TRUE, visited)?;
                let has_else = node.get_bool("has_else")
                    || graph.target_of(id, ports::FALSE).is_some();
                let else_branch = if has_else {
                    Some(self.arm(graph, id, ports::FALSE, visited)?)
                } else {
                    None
                };
                StatementKind::If {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            IrNodeType::Switch => {
                let subject = expression(node, "subject", node.get_string("subject"))?;
                let mut cases = Vec::new();
                for (index, value) in node.get_string_list("cases").iter().enumerate() {
                    let value = expression(node, "cases", value)?;
                    let body = self.arm(graph, id, &ports::case_port(index), visited)?;
                    cases.push(SwitchCase { value, body });
                }
                let has_default = node.get_bool("has_default")
                    || graph.target_of(id, ports::DEFAULT).is_some();
                let default = if has_default {
                    Some(self.arm(graph, id, ports::DEFAULT, visited)?)
                } else {
                    None
                };
                StatementKind::Switch {
                    subject,
                    cases,
                    default,
                }
            }
            IrNodeType::Loop => StatementKind::While {
                condition: expression(node, "condition", node.get_string("condition"))?,
                body: self.arm(graph, id, ports::BODY, visited)?,
            },
            IrNodeType::Goto => StatementKind::Goto {
                target: identifier(node, "target")?,
            },
            IrNodeType::SetVariable => StatementKind::Set {
                variable: identifier(node, "variable")?,
                value: expression(node, "value", node.get_string("value"))?,
            },
            IrNodeType::Wait => StatementKind::Wait {
                seconds: node.get_float("duration"),
            },
            IrNodeType::PlayMusic => StatementKind::PlayMusic {
                asset: node.get_string("asset").to_string(),
            },
            IrNodeType::PlaySound => StatementKind::PlaySound {
                asset: node.get_string("asset").to_string(),
            },
            IrNodeType::StopMusic => StatementKind::StopMusic,
            IrNodeType::Transition => StatementKind::Transition {
                kind: identifier(node, "kind")?,
                duration: node.get_float("duration"),
            },
        };
        Ok(Some(Statement::at(kind, node.source_location)))
    }
}

fn identifier(node: &IrNode, property: &str) -> IrResult<String> {
    let value = node.get_string(property);
    if is_identifier(value) {
        Ok(value.to_string())
    } else {
        Err(invalid_name(node, property, value))
    }
}

/// Empty means absent.
fn optional_identifier(node: &IrNode, property: &str) -> IrResult<Option<String>> {
    match node.get_string(property) {
        "" => Ok(None),
        _ => identifier(node, property).map(Some),
    }
}

fn invalid_name(node: &IrNode, property: &str, value: &str) -> IrError {
    IrError::InvalidProperty {
        node: node.id(),
        property: property.to_string(),
        reason: format!("{value:?} is not an identifier"),
    }
}

fn expression(node: &IrNode, property: &str, source: &str) -> IrResult<Expression> {
    parse_expression(source).map_err(|err| IrError::InvalidProperty {
        node: node.id(),
        property: property.to_string(),
        reason: err.to_string(),
    })
}
