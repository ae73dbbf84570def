use tracing::{debug, instrument};

use crate::config::LayoutConfig;
use crate::error::{IrError, IrResult};
use crate::graph::{NodeId, PortId};
use crate::ir::ports::{self, IN, OUT};
use crate::ir::{IrGraph, IrNodeType, PropertyValue};
use crate::script::{Program, SourceLocation, Statement, StatementKind};

/// Lowers a [`Program`] into an [`IrGraph`].
///
/// Each scene becomes `SceneStart -> statements -> SceneEnd`, laid out in
/// its own column. Structured statements become a single node whose arm
/// ports lead to their bodies and whose `next` port continues the chain.
#[derive(Clone, Debug)]
pub struct AstToIrConverter {
    layout: LayoutConfig,
    current_x: f64,
    current_y: f64,
}

impl Default for AstToIrConverter {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl AstToIrConverter {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            current_x: layout.start_x,
            current_y: layout.start_y,
            layout,
        }
    }

    /// Converts a whole program. Nothing is returned unless every statement
    /// converts.
    #[instrument(skip_all, fields(scenes = program.scenes.len()))]
    pub fn convert(&mut self, program: &Program) -> IrResult<IrGraph> {
        let mut graph = IrGraph::new(
            program
                .scenes
                .first()
                .map(|scene| scene.name.as_str())
                .unwrap_or("script"),
        );
        for character in &program.characters {
            graph.add_character(
                character.id.clone(),
                character.display_name.clone(),
                character.color.clone(),
            );
        }

        for (index, scene) in program.scenes.iter().enumerate() {
            self.current_x = self.layout.start_x + index as f64 * self.layout.scene_spacing;
            self.current_y = self.layout.start_y;

            let start = self.place(&mut graph, IrNodeType::SceneStart, scene.location);
            set(&mut graph, start, "scene", scene.name.clone());
            graph.add_scene_start(scene.name.clone(), start)?;

            let exit = self.convert_block(
                &mut graph,
                &scene.body,
                PortId::output(start, OUT),
                &mut String::new(),
                self.current_x,
            )?;
            let end = self.place(&mut graph, IrNodeType::SceneEnd, scene.location);
            set(&mut graph, end, "scene", scene.name.clone());
            graph.connect(exit, PortId::input(end, IN))?;
        }

        debug!(
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "converted program to ir"
        );
        Ok(graph)
    }

    fn place(&mut self, graph: &mut IrGraph, node_type: IrNodeType, at: SourceLocation) -> NodeId {
        let id = graph.create_node(node_type);
        if let Some(node) = graph.node_mut(id) {
            node.set_position(self.current_x, self.current_y);
            node.source_location = at;
        }
        self.current_y += self.layout.node_spacing;
        id
    }

    /// Chains `statements` after `pending` and returns the continuation port
    /// of the last one, or `pending` itself for an empty block. The first
    /// connection takes `label`.
    ///
    /// Nested `{ }` blocks carry no node of their own; their statements are
    /// spliced into the surrounding chain.
    fn convert_block(
        &mut self,
        graph: &mut IrGraph,
        statements: &[Statement],
        mut pending: PortId,
        label: &mut String,
        x: f64,
    ) -> IrResult<PortId> {
        for statement in statements {
            if let StatementKind::Block { body } = &statement.kind {
                pending = self.convert_block(graph, body, pending, label, x)?;
                continue;
            }
            self.current_x = x;
            let id = self.convert_statement(graph, statement, x)?;
            graph.connect_labeled(pending, PortId::input(id, IN), std::mem::take(label))?;
            let continuation = graph
                .node(id)
                .and_then(|node| ports::continuation_port(node.node_type()))
                .unwrap_or(OUT);
            pending = PortId::output(id, continuation);
        }
        Ok(pending)
    }

    fn convert_arm(
        &mut self,
        graph: &mut IrGraph,
        owner: NodeId,
        port: String,
        mut label: String,
        body: &[Statement],
        x: f64,
    ) -> IrResult<()> {
        self.convert_block(graph, body, PortId::output(owner, port), &mut label, x)?;
        Ok(())
    }

    fn convert_statement(
        &mut self,
        graph: &mut IrGraph,
        statement: &Statement,
        x: f64,
    ) -> IrResult<NodeId> {
        let at = statement.location;
        let arm_offset = self.layout.arm_offset;
        let arm_x = move |index: usize| x + arm_offset * (index + 1) as f64;

        let id = match &statement.kind {
            StatementKind::Say { speaker, text } => {
                let id = self.place(graph, IrNodeType::Dialogue, at);
                set(graph, id, "speaker", speaker.clone().unwrap_or_default());
                set(graph, id, "text", text.clone());
                id
            }
            StatementKind::ShowBackground { asset } => {
                let id = self.place(graph, IrNodeType::ShowBackground, at);
                set(graph, id, "asset", asset.clone());
                id
            }
            StatementKind::ShowCharacter {
                character,
                position,
            } => {
                let id = self.place(graph, IrNodeType::ShowCharacter, at);
                set(graph, id, "character", character.clone());
                set(graph, id, "position", position.clone().unwrap_or_default());
                id
            }
            StatementKind::HideCharacter { character } => {
                let id = self.place(graph, IrNodeType::HideCharacter, at);
                set(graph, id, "character", character.clone());
                id
            }
            StatementKind::Choice { options } => {
                let id = self.place(graph, IrNodeType::Choice, at);
                let texts: Vec<String> = options.iter().map(|o| o.text.clone()).collect();
                let conditions: Vec<String> = options
                    .iter()
                    .map(|o| o.condition.as_ref().map(ToString::to_string).unwrap_or_default())
                    .collect();
                set(graph, id, "options", texts);
                set(graph, id, "conditions", conditions);
                for (index, option) in options.iter().enumerate() {
                    let arm = arm_x(index);
                    self.convert_arm(
                        graph,
                        id,
                        ports::option_port(index),
                        option.text.clone(),
                        &option.body,
                        arm,
                    )?;
                }
                id
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let id = self.place(graph, IrNodeType::Branch, at);
                set(graph, id, "condition", condition.to_string());
                set(graph, id, "has_else", else_branch.is_some());
                let then_x = arm_x(0);
                self.convert_arm(graph, id, ports::TRUE.into(), ports::TRUE.into(), then_branch, then_x)?;
                if let Some(else_branch) = else_branch {
                    let else_x = arm_x(1);
                    self.convert_arm(graph, id, ports::FALSE.into(), ports::FALSE.into(), else_branch, else_x)?;
                }
                id
            }
            StatementKind::Switch {
                subject,
                cases,
                default,
            } => {
                let id = self.place(graph, IrNodeType::Switch, at);
                set(graph, id, "subject", subject.to_string());
                let values: Vec<String> = cases.iter().map(|case| case.value.to_string()).collect();
                set(graph, id, "cases", values);
                set(graph, id, "has_default", default.is_some());
                for (index, case) in cases.iter().enumerate() {
                    let port = ports::case_port(index);
                    let arm = arm_x(index);
                    self.convert_arm(graph, id, port.clone(), port, &case.body, arm)?;
                }
                if let Some(default) = default {
                    let arm = arm_x(cases.len());
                    self.convert_arm(graph, id, ports::DEFAULT.into(), ports::DEFAULT.into(), default, arm)?;
                }
                id
            }
            StatementKind::While { condition, body } => {
                let id = self.place(graph, IrNodeType::Loop, at);
                set(graph, id, "condition", condition.to_string());
                let arm = arm_x(0);
                self.convert_arm(graph, id, ports::BODY.into(), ports::BODY.into(), body, arm)?;
                id
            }
            StatementKind::Set { variable, value } => {
                let id = self.place(graph, IrNodeType::SetVariable, at);
                set(graph, id, "variable", variable.clone());
                set(graph, id, "value", value.to_string());
                id
            }
            StatementKind::Goto { target } => {
                let id = self.place(graph, IrNodeType::Goto, at);
                set(graph, id, "target", target.clone());
                id
            }
            StatementKind::Wait { seconds } => {
                let id = self.place(graph, IrNodeType::Wait, at);
                set(graph, id, "duration", *seconds);
                id
            }
            StatementKind::PlayMusic { asset } => {
                let id = self.place(graph, IrNodeType::PlayMusic, at);
                set(graph, id, "asset", asset.clone());
                id
            }
            StatementKind::PlaySound { asset } => {
                let id = self.place(graph, IrNodeType::PlaySound, at);
                set(graph, id, "asset", asset.clone());
                id
            }
            StatementKind::StopMusic => self.place(graph, IrNodeType::StopMusic, at),
            StatementKind::Transition { kind, duration } => {
                let id = self.place(graph, IrNodeType::Transition, at);
                set(graph, id, "kind", kind.clone());
                set(graph, id, "duration", *duration);
                id
            }
            StatementKind::Comment { text } => {
                let id = self.place(graph, IrNodeType::Comment, at);
                set(graph, id, "text", text.clone());
                id
            }
            // spliced by convert_block, never lowered on its own
            StatementKind::Block { .. } => {
                return Err(IrError::UnsupportedConstruct {
                    construct: format!(
                        "{} at line {}, column {}",
                        statement.kind.name(),
                        at.line,
                        at.column
                    ),
                });
            }
        };
        Ok(id)
    }
}

fn set(graph: &mut IrGraph, id: NodeId, name: &str, value: impl Into<PropertyValue>) {
    if let Some(node) = graph.node_mut(id) {
        node.set_property(name, value);
    }
}
