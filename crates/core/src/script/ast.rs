//! Abstract syntax tree of the script language.
//!
//! The tree is plain owned data. Source locations ride along on every
//! declaration and statement but do not take part in structural
//! comparison, see [`crate::RoundTripConverter::validate_conversion`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 1-based position of a construct in its source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub characters: Vec<CharacterDecl>,
    pub scenes: Vec<SceneDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CharacterDecl {
    pub id: String,
    pub display_name: String,
    pub color: Option<String>,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneDecl {
    pub name: String,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SourceLocation,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            location: SourceLocation::default(),
        }
    }

    pub fn at(kind: StatementKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    Say {
        speaker: Option<String>,
        text: String,
    },
    ShowBackground {
        asset: String,
    },
    ShowCharacter {
        character: String,
        position: Option<String>,
    },
    HideCharacter {
        character: String,
    },
    Choice {
        options: Vec<ChoiceOption>,
    },
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    Switch {
        subject: Expression,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Set {
        variable: String,
        value: Expression,
    },
    Goto {
        target: String,
    },
    Wait {
        seconds: f64,
    },
    PlayMusic {
        asset: String,
    },
    PlaySound {
        asset: String,
    },
    StopMusic,
    Transition {
        kind: String,
        duration: f64,
    },
    Comment {
        text: String,
    },
    /// Bare nested `{ ... }` block. Parsed, but has no IR counterpart.
    Block {
        body: Vec<Statement>,
    },
}

impl StatementKind {
    /// Keyword-level name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Say { .. } => "say",
            StatementKind::ShowBackground { .. } => "show background",
            StatementKind::ShowCharacter { .. } => "show",
            StatementKind::HideCharacter { .. } => "hide",
            StatementKind::Choice { .. } => "choice",
            StatementKind::If { .. } => "if",
            StatementKind::Switch { .. } => "switch",
            StatementKind::While { .. } => "while",
            StatementKind::Set { .. } => "set",
            StatementKind::Goto { .. } => "goto",
            StatementKind::Wait { .. } => "wait",
            StatementKind::PlayMusic { .. } => "play music",
            StatementKind::PlaySound { .. } => "play sound",
            StatementKind::StopMusic => "stop music",
            StatementKind::Transition { .. } => "transition",
            StatementKind::Comment { .. } => "comment",
            StatementKind::Block { .. } => "nested block",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceOption {
    pub text: String,
    pub condition: Option<Expression>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub value: Expression,
    pub body: Vec<Statement>,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    pub fn int(value: i64) -> Self {
        Expression::Literal(Literal::Int(value))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Binding strength, loosest first. All binary operators are left
    /// associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "or" => BinaryOp::Or,
            "and" => BinaryOp::And,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        };
        Some(op)
    }
}
