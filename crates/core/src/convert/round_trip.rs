use tracing::{debug, instrument};

use super::{AstToIrConverter, IrToAstConverter};
use crate::config::ConverterConfig;
use crate::error::IrResult;
use crate::ir::IrGraph;
use crate::script::printer::simple_statement;
use crate::script::{parse_program, AstToTextGenerator, Program, Statement, StatementKind};
use crate::visual::VisualGraph;

/// Facade chaining parser, converters, generator and visual bridge.
#[derive(Clone, Debug, Default)]
pub struct RoundTripConverter {
    config: ConverterConfig,
}

impl RoundTripConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn text_to_ast(&self, text: &str) -> IrResult<Program> {
        parse_program(text)
    }

    pub fn ast_to_ir(&self, program: &Program) -> IrResult<IrGraph> {
        AstToIrConverter::new(self.config.layout.clone()).convert(program)
    }

    pub fn ir_to_ast(&self, graph: &IrGraph) -> IrResult<Program> {
        IrToAstConverter::new(self.config.conversion.comments).convert(graph)
    }

    pub fn ast_to_text(&self, program: &Program) -> String {
        AstToTextGenerator::new(self.config.generator.indent_width).generate(program)
    }

    pub fn text_to_ir(&self, text: &str) -> IrResult<IrGraph> {
        self.ast_to_ir(&self.text_to_ast(text)?)
    }

    pub fn ir_to_text(&self, graph: &IrGraph) -> IrResult<String> {
        Ok(self.ast_to_text(&self.ir_to_ast(graph)?))
    }

    pub fn ir_to_visual_graph(&self, graph: &IrGraph) -> VisualGraph {
        VisualGraph::from_ir(graph)
    }

    pub fn visual_graph_to_ir(&self, visual: &VisualGraph) -> IrResult<IrGraph> {
        visual.to_ir()
    }

    pub fn text_to_visual_graph(&self, text: &str) -> IrResult<VisualGraph> {
        Ok(self.ir_to_visual_graph(&self.text_to_ir(text)?))
    }

    pub fn visual_graph_to_text(&self, visual: &VisualGraph) -> IrResult<String> {
        self.ir_to_text(&self.visual_graph_to_ir(visual)?)
    }

    /// Text to IR and back to text.
    pub fn round_trip(&self, text: &str) -> IrResult<String> {
        self.ir_to_text(&self.text_to_ir(text)?)
    }

    /// Structural differences between two scripts, one message each.
    ///
    /// Comments and source locations are ignored. A script that fails to
    /// parse is reported as a discrepancy rather than an error.
    #[instrument(skip_all)]
    pub fn validate_conversion(&self, original: &str, round_tripped: &str) -> Vec<String> {
        let expected = match parse_program(original) {
            Ok(program) => program,
            Err(err) => return vec![format!("original script does not parse: {err}")],
        };
        let actual = match parse_program(round_tripped) {
            Ok(program) => program,
            Err(err) => return vec![format!("round-tripped script does not parse: {err}")],
        };
        let issues = diff_programs(&expected, &actual);
        debug!(issues = issues.len(), "validated conversion");
        issues
    }
}

/// Structural comparison of two programs, ignoring comments, locations and
/// nested block boundaries.
pub fn diff_programs(expected: &Program, actual: &Program) -> Vec<String> {
    let mut issues = Vec::new();

    if expected.characters.len() != actual.characters.len() {
        issues.push(format!(
            "character count differs: expected {}, found {}",
            expected.characters.len(),
            actual.characters.len()
        ));
    }
    for (want, got) in expected.characters.iter().zip(&actual.characters) {
        if (&want.id, &want.display_name, &want.color) != (&got.id, &got.display_name, &got.color)
        {
            issues.push(format!(
                "character '{}' differs: expected name {:?} color {:?}, found '{}' name {:?} color {:?}",
                want.id, want.display_name, want.color, got.id, got.display_name, got.color
            ));
        }
    }

    if expected.scenes.len() != actual.scenes.len() {
        issues.push(format!(
            "scene count differs: expected {}, found {}",
            expected.scenes.len(),
            actual.scenes.len()
        ));
    }
    for (want, got) in expected.scenes.iter().zip(&actual.scenes) {
        if want.name != got.name {
            issues.push(format!(
                "scene name differs: expected '{}', found '{}'",
                want.name, got.name
            ));
        }
        diff_blocks(&format!("scene '{}'", want.name), &want.body, &got.body, &mut issues);
    }
    issues
}

fn diff_blocks(path: &str, expected: &[Statement], actual: &[Statement], issues: &mut Vec<String>) {
    let expected = significant(expected);
    let actual = significant(actual);
    if expected.len() != actual.len() {
        issues.push(format!(
            "{path}: statement count differs: expected {}, found {}",
            expected.len(),
            actual.len()
        ));
    }
    for (index, (want, got)) in expected.iter().zip(&actual).enumerate() {
        let here = format!("{path}, statement {}", index + 1);
        let (want_head, want_arms) = outline(&want.kind);
        let (got_head, got_arms) = outline(&got.kind);
        if want_head != got_head {
            issues.push(format!("{here}: expected `{want_head}`, found `{got_head}`"));
            continue;
        }
        for ((label, want_body), (_, got_body)) in want_arms.iter().zip(&got_arms) {
            diff_blocks(&format!("{here} {label}"), want_body, got_body, issues);
        }
    }
}

/// Statements that carry meaning, with nested `{ }` blocks flattened into
/// their parent and comments dropped.
fn significant(statements: &[Statement]) -> Vec<&Statement> {
    let mut out = Vec::with_capacity(statements.len());
    for statement in statements {
        match &statement.kind {
            StatementKind::Comment { .. } => {}
            StatementKind::Block { body } => out.extend(significant(body)),
            _ => out.push(statement),
        }
    }
    out
}

/// One-line head of a statement plus its nested bodies. Two statements
/// match when heads are equal and their bodies match pairwise.
fn outline(kind: &StatementKind) -> (String, Vec<(String, &[Statement])>) {
    let mut arms: Vec<(String, &[Statement])> = Vec::new();
    let head = match kind {
        StatementKind::Choice { options } => {
            let heads: Vec<String> = options
                .iter()
                .map(|option| match &option.condition {
                    Some(condition) => format!("{:?} if {condition}", option.text),
                    None => format!("{:?}", option.text),
                })
                .collect();
            for (index, option) in options.iter().enumerate() {
                arms.push((format!("option {}", index + 1), &option.body));
            }
            format!("choice [{}]", heads.join(", "))
        }
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            arms.push(("then".to_string(), then_branch));
            if let Some(else_branch) = else_branch {
                arms.push(("else".to_string(), else_branch));
            }
            format!("if {condition} (else: {})", else_branch.is_some())
        }
        StatementKind::Switch {
            subject,
            cases,
            default,
        } => {
            let values: Vec<String> = cases.iter().map(|case| case.value.to_string()).collect();
            for (index, case) in cases.iter().enumerate() {
                arms.push((format!("case {}", index + 1), &case.body));
            }
            if let Some(default) = default {
                arms.push(("default".to_string(), default));
            }
            format!(
                "switch {subject} [{}] (default: {})",
                values.join(", "),
                default.is_some()
            )
        }
        StatementKind::While { condition, body } => {
            arms.push(("body".to_string(), body));
            format!("while {condition}")
        }
        other => simple_statement(other).unwrap_or_default(),
    };
    (head, arms)
}
