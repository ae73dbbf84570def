//! Script language front end: syntax tree, parser and canonical printer.

mod ast;
mod parser;
pub(crate) mod printer;

pub use ast::{
    BinaryOp, CharacterDecl, ChoiceOption, Expression, Literal, Program, SceneDecl,
    SourceLocation, Statement, StatementKind, SwitchCase, UnaryOp,
};
pub use parser::{is_identifier, parse_expression, parse_program};
pub use printer::{format_float, AstToTextGenerator};

#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod tests;
