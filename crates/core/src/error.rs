use std::path::PathBuf;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::graph::{NodeId, PortId};

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Error, Diagnostic)]
pub enum IrError {
    #[error("unsupported construct: {construct}")]
    #[diagnostic(code("ir.unsupported_construct"))]
    UnsupportedConstruct { construct: String },
    #[error("unknown node type '{0}'")]
    #[diagnostic(code("ir.unknown_node_type"))]
    UnknownNodeType(String),
    #[error("invalid port '{port}' on node {node}: {reason}")]
    #[diagnostic(code("ir.invalid_port"))]
    InvalidPort {
        node: NodeId,
        port: String,
        reason: String,
    },
    #[error("unknown node {0}")]
    #[diagnostic(code("ir.unknown_node"))]
    UnknownNode(NodeId),
    #[error("connection {from} -> {to} already exists")]
    #[diagnostic(code("ir.duplicate_connection"))]
    DuplicateConnection { from: PortId, to: PortId },
    #[error("incomplete graph at node {node}, port '{port}': {reason}")]
    #[diagnostic(code("ir.incomplete_graph"))]
    IncompleteGraph {
        node: NodeId,
        port: String,
        reason: String,
    },
    #[error("invalid property '{property}' on node {node}: {reason}")]
    #[diagnostic(code("ir.invalid_property"))]
    InvalidProperty {
        node: NodeId,
        property: String,
        reason: String,
    },
    #[error("'{name}' is not a valid {what} name")]
    #[diagnostic(code("ir.invalid_name"))]
    InvalidName { what: &'static str, name: String },
    #[error("io error on {}: {source}", .path.display())]
    #[diagnostic(code("ir.io"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {message}")]
    #[diagnostic(code("ir.parse"))]
    Parse {
        message: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },
    #[error("configuration error: {0}")]
    #[diagnostic(code("ir.config"))]
    Config(String),
}

impl IrError {
    /// Parse error without a usable source location.
    pub(crate) fn parse_message(message: impl Into<String>) -> Self {
        IrError::Parse {
            message: message.into(),
            src: String::new(),
            span: (0, 0).into(),
        }
    }

    /// Parse error pointing at `offset..offset + length` of `input`.
    ///
    /// Only a window around the offending bytes is kept as source code so
    /// diagnostics on large documents stay small.
    pub(crate) fn parse_at(
        input: &str,
        offset: usize,
        length: usize,
        message: impl Into<String>,
    ) -> Self {
        let offset = offset.min(input.len());
        let (window, local_offset) = source_window(input, offset, length);
        let max_len = window.len().saturating_sub(local_offset);
        let span_len = if max_len == 0 { 0 } else { length.min(max_len) };
        IrError::Parse {
            message: message.into(),
            src: window,
            span: (local_offset, span_len).into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IrError::Io {
            path: path.into(),
            source,
        }
    }
}

pub(crate) fn json_deserialize_error(input: &str, err: &serde_json::Error) -> IrError {
    let (offset, length) = json_error_span(input, err);
    IrError::parse_at(input, offset, length, err.to_string())
}

#[cold]
#[inline(never)]
fn json_error_span(input: &str, error: &serde_json::Error) -> (usize, usize) {
    let line = error.line();
    let column = error.column();
    if line == 0 || column == 0 {
        return (0, 1);
    }
    let mut current_line = 1usize;
    let mut offset = 0usize;
    for chunk in input.split_inclusive('\n') {
        if current_line == line {
            let column_index = column.saturating_sub(1);
            let byte_index = chunk
                .char_indices()
                .nth(column_index)
                .map(|(idx, _)| idx)
                .unwrap_or(chunk.len());
            return (offset + byte_index, 1);
        }
        offset += chunk.len();
        current_line += 1;
    }
    (input.len(), 0)
}

fn source_window(input: &str, offset: usize, length: usize) -> (String, usize) {
    const CONTEXT: usize = 160;
    let mut start = offset.saturating_sub(CONTEXT);
    let mut end = (offset + length + CONTEXT).min(input.len());
    while start > 0 && !input.is_char_boundary(start) {
        start = start.saturating_sub(1);
    }
    while end < input.len() && !input.is_char_boundary(end) {
        end = end.saturating_add(1).min(input.len());
    }
    (input[start..end].to_string(), offset.saturating_sub(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_at_keeps_window_around_offset() {
        let input = format!("{}bad{}", "a".repeat(400), "b".repeat(400));
        let err = IrError::parse_at(&input, 400, 3, "unexpected token");
        match err {
            IrError::Parse { src, span, .. } => {
                assert!(src.len() < input.len());
                assert_eq!(&src[span.offset()..span.offset() + span.len()], "bad");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_error_points_at_line() {
        let input = "{\n  \"name\": ,\n}";
        let err = serde_json::from_str::<serde_json::Value>(input).expect_err("invalid json");
        let (offset, _) = json_error_span(input, &err);
        assert!(offset > 2 && offset <= input.len());
    }
}
