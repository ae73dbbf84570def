//! Port table of the IR node types.
//!
//! Structured nodes (`Branch`, `Choice`, `Switch`, `Loop`) expose one output
//! per arm plus `next`. Arms lead to body chains whose last node leaves its
//! continuation port unconnected; execution resumes through `next`.

use super::{IrNode, IrNodeType};

pub const IN: &str = "in";
pub const OUT: &str = "out";
pub const NEXT: &str = "next";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const BODY: &str = "body";
pub const DEFAULT: &str = "default";

pub fn option_port(index: usize) -> String {
    format!("option_{index}")
}

pub fn case_port(index: usize) -> String {
    format!("case_{index}")
}

pub fn input_ports(node_type: IrNodeType) -> &'static [&'static str] {
    match node_type {
        IrNodeType::SceneStart => &[],
        _ => &[IN],
    }
}

/// Port through which execution leaves the node once it is done.
pub fn continuation_port(node_type: IrNodeType) -> Option<&'static str> {
    match node_type {
        IrNodeType::SceneEnd => None,
        IrNodeType::Choice | IrNodeType::Branch | IrNodeType::Switch | IrNodeType::Loop => {
            Some(NEXT)
        }
        _ => Some(OUT),
    }
}

/// Output ports in execution order. Arm counts come from the node's
/// `options` and `cases` properties.
pub fn output_ports(node: &IrNode) -> Vec<String> {
    let mut ports = Vec::new();
    match node.node_type() {
        IrNodeType::SceneEnd => return ports,
        IrNodeType::Branch => {
            ports.push(TRUE.to_string());
            ports.push(FALSE.to_string());
        }
        IrNodeType::Choice => {
            ports.extend((0..node.get_string_list("options").len()).map(option_port));
        }
        IrNodeType::Switch => {
            ports.extend((0..node.get_string_list("cases").len()).map(case_port));
            ports.push(DEFAULT.to_string());
        }
        IrNodeType::Loop => ports.push(BODY.to_string()),
        _ => {}
    }
    if let Some(port) = continuation_port(node.node_type()) {
        ports.push(port.to_string());
    }
    ports
}

pub fn has_output_port(node: &IrNode, port: &str) -> bool {
    output_ports(node).iter().any(|candidate| candidate == port)
}

pub fn has_input_port(node: &IrNode, port: &str) -> bool {
    input_ports(node.node_type()).contains(&port)
}
