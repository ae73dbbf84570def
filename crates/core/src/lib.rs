//! Intermediate representation and round-trip conversion for visual novel
//! scripts.
//!
//! Text is parsed into a [`Program`], lowered into an [`IrGraph`],
//! projected into an editor-facing [`VisualGraph`] and converted all the
//! way back. [`RoundTripConverter`] is the single entry point for these
//! conversions and for checking that a round trip preserved the script.

mod config;
mod convert;
mod error;
mod graph;
mod ir;
mod script;
mod story;
mod version;
mod visual;

pub use config::{
    CommentPolicy, ConversionConfig, ConverterConfig, GeneratorConfig, LayoutConfig,
};
pub use convert::{diff_programs, AstToIrConverter, IrToAstConverter, RoundTripConverter};
pub use error::{IrError, IrResult};
pub use graph::{Edge, NodeId, PortGraph, PortId};
pub use ir::{
    ports, CharacterInfo, GraphStats, IrConnection, IrGraph, IrNode, IrNodeType, PropertyKind,
    PropertyValue,
};
pub use script::{
    format_float, is_identifier, parse_expression, parse_program, AstToTextGenerator, BinaryOp, CharacterDecl,
    ChoiceOption, Expression, Literal, Program, SceneDecl, SourceLocation, Statement,
    StatementKind, SwitchCase, UnaryOp,
};
pub use story::{
    ConnectionState, IssueCode, IssueSeverity, PortKind, StoryConnection, StoryGraph, StoryNode,
    StoryNodeType, StoryPort, ValidationIssue, ValidationResult,
};
pub use version::GRAPH_SCHEMA_VERSION;
pub use visual::{
    VisualCharacter, VisualGraph, VisualGraphEdge, VisualGraphNode, DEFAULT_NODE_HEIGHT,
    DEFAULT_NODE_WIDTH,
};
