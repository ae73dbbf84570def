use std::collections::BTreeMap;

use tracing::debug;

use super::VisualGraph;
use crate::config::LayoutConfig;
use crate::graph::NodeId;

impl VisualGraph {
    pub fn auto_layout(&mut self) {
        self.auto_layout_with(&LayoutConfig::default());
    }

    /// Layered layout: each node's column is its longest-path depth from a
    /// node without incoming edges. Rows inside a column keep the previous
    /// vertical order, ties broken by id.
    pub fn auto_layout_with(&mut self, layout: &LayoutConfig) {
        let mut columns: BTreeMap<usize, Vec<(f64, NodeId)>> = BTreeMap::new();
        for (id, layer) in self.graph.layers() {
            let y = self.graph.node(id).map(|node| node.y).unwrap_or_default();
            columns.entry(layer).or_default().push((y, id));
        }
        for (column, mut members) in columns {
            members.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            for (row, (_, id)) in members.into_iter().enumerate() {
                if let Some(node) = self.graph.node_mut(id) {
                    node.x = layout.start_x + column as f64 * layout.column_spacing;
                    node.y = layout.start_y + row as f64 * layout.row_spacing;
                }
            }
        }
        debug!(nodes = self.node_count(), "auto layout applied");
    }
}
