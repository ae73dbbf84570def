use std::collections::BTreeSet;
use std::fmt::Write as _;

use super::*;

impl IrGraph {
    fn dot_label(node: &IrNode) -> String {
        let detail = match node.node_type() {
            IrNodeType::SceneStart | IrNodeType::SceneEnd => node.get_string("scene").to_string(),
            IrNodeType::Dialogue => {
                let speaker = node.get_string("speaker");
                let speaker = if speaker.is_empty() { "narrator" } else { speaker };
                format!("{speaker}: {}", node.get_string("text"))
            }
            IrNodeType::Choice => format!("{} options", node.get_string_list("options").len()),
            IrNodeType::Branch | IrNodeType::Loop => node.get_string("condition").to_string(),
            IrNodeType::Switch => node.get_string("subject").to_string(),
            IrNodeType::Goto => node.get_string("target").to_string(),
            IrNodeType::SetVariable => format!(
                "{} = {}",
                node.get_string("variable"),
                node.get_string("value")
            ),
            IrNodeType::ShowBackground | IrNodeType::PlayMusic | IrNodeType::PlaySound => {
                node.get_string("asset").to_string()
            }
            IrNodeType::ShowCharacter | IrNodeType::HideCharacter => {
                node.get_string("character").to_string()
            }
            IrNodeType::Transition => node.get_string("kind").to_string(),
            IrNodeType::Wait => crate::script::format_float(node.get_float("duration")),
            IrNodeType::StopMusic => String::new(),
            IrNodeType::Comment => node.get_string("text").to_string(),
        };
        let label = if detail.is_empty() {
            format!("[{}] {}", node.id(), node.node_type())
        } else {
            format!("[{}] {}: {}", node.id(), node.node_type(), detail)
        };
        dot_escape(&label)
    }

    /// Exports the graph to DOT format for visualization with Graphviz.
    ///
    /// Scene starts are green and nodes no scene reaches are red.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph IrGraph {\n");
        dot.push_str("    rankdir=TB;\n");
        dot.push_str("    node [shape=box];\n\n");

        let unreachable: BTreeSet<NodeId> = self.unreachable_nodes().into_iter().collect();
        for node in self.nodes() {
            let color = if unreachable.contains(&node.id()) {
                "red"
            } else if node.node_type() == IrNodeType::SceneStart {
                "green"
            } else {
                "black"
            };
            let shape = match node.node_type() {
                IrNodeType::Choice | IrNodeType::Branch | IrNodeType::Switch => "diamond",
                IrNodeType::Loop => "hexagon",
                IrNodeType::SceneStart | IrNodeType::SceneEnd | IrNodeType::Goto => "ellipse",
                IrNodeType::Comment => "note",
                _ => "box",
            };
            let _ = writeln!(
                dot,
                "    n{} [label=\"{}\" shape={} color={}];",
                node.id(),
                Self::dot_label(node),
                shape,
                color
            );
        }

        dot.push('\n');

        for edge in self.connections() {
            let style = match edge.source.port_name.as_str() {
                ports::OUT | ports::NEXT => "solid",
                ports::TRUE | ports::BODY => "bold",
                ports::FALSE | ports::DEFAULT => "dotted",
                _ => "dashed",
            };
            let label = if edge.label().is_empty() {
                String::new()
            } else {
                format!(" label=\"{}\"", dot_escape(edge.label()))
            };
            let _ = writeln!(
                dot,
                "    n{} -> n{} [style={}{}];",
                edge.source.node_id, edge.target.node_id, style, label
            );
        }

        dot.push_str("}\n");
        dot
    }
}

/// Escapes text for a double-quoted DOT string.
fn dot_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}
