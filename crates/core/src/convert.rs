//! Conversions between script syntax trees and the IR graph.
//!
//! # Contracts
//! - Lowering is all-or-nothing: an unsupported construct fails the whole
//!   program and no partial graph is returned.
//! - Raising walks each scene from its start node in port order and never
//!   loops on cyclic graphs.
//! - Text produced from a converted program re-parses to a program that
//!   [`diff_programs`] finds equal to the original.

mod ast_to_ir;
mod ir_to_ast;
mod round_trip;

pub use ast_to_ir::AstToIrConverter;
pub use ir_to_ast::IrToAstConverter;
pub use round_trip::{diff_programs, RoundTripConverter};

#[cfg(test)]
#[path = "tests/convert_tests.rs"]
mod tests;
