//! Canonical text generation for the script AST.
//!
//! # Contracts
//! - Output re-parses to a structurally equal program.
//! - Expressions carry the minimum parentheses needed to preserve their
//!   tree under the grammar's precedence and left associativity.
//! - Floats always carry a decimal point.

use std::fmt::{self, Write as _};

use tracing::warn;

use super::ast::{
    BinaryOp, CharacterDecl, Expression, Literal, Program, SceneDecl, Statement, StatementKind,
    UnaryOp,
};

/// Pretty-printer producing canonical script text.
#[derive(Clone, Debug)]
pub struct AstToTextGenerator {
    indent: String,
}

impl Default for AstToTextGenerator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl AstToTextGenerator {
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent: " ".repeat(indent_width),
        }
    }

    pub fn generate(&self, program: &Program) -> String {
        let mut emitter = Emitter {
            out: String::new(),
            level: 0,
            indent: &self.indent,
        };
        for character in &program.characters {
            emitter.character(character);
        }
        for (index, scene) in program.scenes.iter().enumerate() {
            if index > 0 || !program.characters.is_empty() {
                emitter.out.push('\n');
            }
            emitter.scene(scene);
        }
        emitter.out
    }
}

struct Emitter<'a> {
    out: String,
    level: usize,
    indent: &'a str,
}

impl Emitter<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn character(&mut self, character: &CharacterDecl) {
        let mut text = format!(
            "character {}(name: {}",
            character.id,
            quote(&character.display_name)
        );
        if let Some(color) = &character.color {
            let _ = write!(text, ", color: {}", quote(color));
        }
        text.push(')');
        self.line(&text);
    }

    fn scene(&mut self, scene: &SceneDecl) {
        self.line(&format!("scene {} {{", scene.name));
        self.body(&scene.body);
        self.line("}");
    }

    fn body(&mut self, statements: &[Statement]) {
        self.level += 1;
        for statement in statements {
            self.statement(statement);
        }
        self.level -= 1;
    }

    fn statement(&mut self, statement: &Statement) {
        if let StatementKind::Comment { text } = &statement.kind {
            // a comment runs to the end of its line
            let mut lines: Vec<String> = text.lines().map(|line| line.replace('\r', " ")).collect();
            if lines.is_empty() {
                lines.push(String::new());
            }
            for line in lines {
                self.line(&format!("// {line}"));
            }
            return;
        }
        if let Some(text) = simple_statement(&statement.kind) {
            self.line(&text);
            return;
        }
        match &statement.kind {
            StatementKind::Choice { options } => {
                self.line("choice {");
                self.level += 1;
                for option in options {
                    let head = match &option.condition {
                        Some(condition) => format!("{} if {condition} -> {{", quote(&option.text)),
                        None => format!("{} -> {{", quote(&option.text)),
                    };
                    self.line(&head);
                    self.body(&option.body);
                    self.line("}");
                }
                self.level -= 1;
                self.line("}");
            }
            StatementKind::If { .. } => self.if_chain(&statement.kind, "if"),
            StatementKind::Switch {
                subject,
                cases,
                default,
            } => {
                self.line(&format!("switch {subject} {{"));
                self.level += 1;
                for case in cases {
                    self.line(&format!("case {} {{", case.value));
                    self.body(&case.body);
                    self.line("}");
                }
                if let Some(default) = default {
                    self.line("default {");
                    self.body(default);
                    self.line("}");
                }
                self.level -= 1;
                self.line("}");
            }
            StatementKind::While { condition, body } => {
                self.line(&format!("while {condition} {{"));
                self.body(body);
                self.line("}");
            }
            StatementKind::Block { body } => {
                self.line("{");
                self.body(body);
                self.line("}");
            }
            _ => {}
        }
    }

    /// Prints an `if`, folding an else branch holding a single `if` into
    /// `else if`.
    fn if_chain(&mut self, kind: &StatementKind, keyword: &str) {
        let StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } = kind
        else {
            return;
        };
        self.line(&format!("{keyword} {condition} {{"));
        self.body(then_branch);
        match else_branch.as_deref() {
            None => self.line("}"),
            Some([nested]) if matches!(nested.kind, StatementKind::If { .. }) => {
                self.if_chain(&nested.kind, "} else if");
            }
            Some(other) => {
                self.line("} else {");
                self.body(other);
                self.line("}");
            }
        }
    }
}

/// Single-line text of a statement without nested bodies, `None` for the
/// block-carrying ones.
pub(crate) fn simple_statement(kind: &StatementKind) -> Option<String> {
    let text = match kind {
        StatementKind::Say { speaker, text } => match speaker {
            Some(speaker) => format!("say {speaker} {}", quote(text)),
            None => format!("say {}", quote(text)),
        },
        StatementKind::ShowBackground { asset } => format!("show background {}", quote(asset)),
        StatementKind::ShowCharacter {
            character,
            position,
        } => match position {
            Some(position) => format!("show {character} at {position}"),
            None => format!("show {character}"),
        },
        StatementKind::HideCharacter { character } => format!("hide {character}"),
        StatementKind::Set { variable, value } => format!("set {variable} = {value}"),
        StatementKind::Goto { target } => format!("goto {target}"),
        StatementKind::Wait { seconds } => format!("wait {}", format_float(*seconds)),
        StatementKind::PlayMusic { asset } => format!("play music {}", quote(asset)),
        StatementKind::PlaySound { asset } => format!("play sound {}", quote(asset)),
        StatementKind::StopMusic => "stop music".to_string(),
        StatementKind::Transition { kind, duration } => {
            format!("transition {kind} {}", format_float(*duration))
        }
        StatementKind::Comment { text } => format!("// {text}"),
        StatementKind::Choice { .. }
        | StatementKind::If { .. }
        | StatementKind::Switch { .. }
        | StatementKind::While { .. }
        | StatementKind::Block { .. } => return None,
    };
    Some(text)
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Formats a float so it always reads back as a float literal.
///
/// Non-finite values have no literal form and are written as `0.0`.
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        warn!(value, "non-finite float replaced with 0.0");
        return "0.0".to_string();
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => fmt::Display::fmt(literal, f),
            Expression::Variable(name) => f.write_str(name),
            Expression::Unary { op, operand } => {
                f.write_str(match op {
                    UnaryOp::Not => "not ",
                    UnaryOp::Neg => "-",
                })?;
                let wrap = match operand.as_ref() {
                    Expression::Binary { .. } => true,
                    Expression::Literal(Literal::Int(_) | Literal::Float(_)) => {
                        *op == UnaryOp::Neg
                    }
                    _ => false,
                };
                write_operand(f, operand, wrap)
            }
            Expression::Binary { op, lhs, rhs } => {
                write_operand(f, lhs, binds_looser(lhs, *op, false))?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, rhs, binds_looser(rhs, *op, true))
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => f.write_str(&format_float(*value)),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::String(value) => f.write_str(&quote(value)),
        }
    }
}

fn binds_looser(operand: &Expression, parent: BinaryOp, right_side: bool) -> bool {
    match operand {
        Expression::Binary { op, .. } => {
            if right_side {
                op.precedence() <= parent.precedence()
            } else {
                op.precedence() < parent.precedence()
            }
        }
        _ => false,
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expression, wrap: bool) -> fmt::Result {
    if wrap {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}
