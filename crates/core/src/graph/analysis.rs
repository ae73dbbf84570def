//! Ordering and structural analysis over any [`PortGraph`].

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use super::{NodeId, PortGraph};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl<N, E> PortGraph<N, E> {
    fn adjacency(&self) -> BTreeMap<NodeId, Vec<NodeId>> {
        self.node_ids()
            .map(|id| (id, self.successors(id)))
            .collect()
    }

    /// Every node exactly once, each after all of its predecessors when the
    /// graph is acyclic.
    ///
    /// Depth-first over predecessor lists, visiting roots in ascending id.
    /// Predecessors already on the walk (back-edges) are skipped, so cycles
    /// come out grouped instead of failing.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let predecessors: BTreeMap<NodeId, Vec<NodeId>> = self
            .node_ids()
            .map(|id| (id, self.predecessors(id)))
            .collect();
        let mut marks: BTreeMap<NodeId, Mark> = BTreeMap::new();
        let mut order = Vec::with_capacity(self.len());

        for root in self.node_ids() {
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::InProgress);
            let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
            while let Some(frame) = stack.last_mut() {
                let current = frame.0;
                let next = predecessors
                    .get(&current)
                    .and_then(|preds| preds.get(frame.1))
                    .copied();
                match next {
                    Some(pred) => {
                        frame.1 += 1;
                        if !marks.contains_key(&pred) {
                            marks.insert(pred, Mark::InProgress);
                            stack.push((pred, 0));
                        }
                    }
                    None => {
                        marks.insert(current, Mark::Done);
                        order.push(current);
                        stack.pop();
                    }
                }
            }
        }
        order
    }

    /// Cycles found by depth-first search, each reported once with its
    /// members in traversal order. Self-loops are one-node cycles.
    pub fn find_cycles(&self) -> Vec<Vec<NodeId>> {
        let adjacency = self.adjacency();
        let mut marks: BTreeMap<NodeId, Mark> = BTreeMap::new();
        let mut seen: BTreeSet<Vec<NodeId>> = BTreeSet::new();
        let mut cycles = Vec::new();

        for root in self.node_ids() {
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::InProgress);
            let mut path: Vec<NodeId> = vec![root];
            let mut cursors: Vec<usize> = vec![0];
            while let (Some(&current), Some(cursor)) = (path.last(), cursors.last_mut()) {
                let next = adjacency
                    .get(&current)
                    .and_then(|succ| succ.get(*cursor))
                    .copied();
                let Some(succ) = next else {
                    marks.insert(current, Mark::Done);
                    path.pop();
                    cursors.pop();
                    continue;
                };
                *cursor += 1;
                match marks.get(&succ) {
                    None => {
                        marks.insert(succ, Mark::InProgress);
                        path.push(succ);
                        cursors.push(0);
                    }
                    Some(Mark::InProgress) => {
                        if let Some(start) = path.iter().position(|&id| id == succ) {
                            let members = path[start..].to_vec();
                            let mut key = members.clone();
                            key.sort_unstable();
                            if seen.insert(key) {
                                cycles.push(members);
                            }
                        }
                    }
                    Some(Mark::Done) => {}
                }
            }
        }
        cycles
    }

    /// Breadth-first reachability from `roots`, roots included.
    pub fn reachable_from(&self, roots: impl IntoIterator<Item = NodeId>) -> BTreeSet<NodeId> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        for root in roots {
            if self.contains(root) && visited.insert(root) {
                queue.push_back(root);
            }
        }
        while let Some(node_id) = queue.pop_front() {
            for edge in self.outgoing(node_id) {
                if visited.insert(edge.target.node_id) {
                    queue.push_back(edge.target.node_id);
                }
            }
        }
        visited.into_iter().collect()
    }

    /// Longest-path layer of every node, ignoring back-edges.
    ///
    /// Nodes without incoming forward edges sit in layer 0.
    pub fn layers(&self) -> BTreeMap<NodeId, usize> {
        let order = self.topological_order();
        let position: BTreeMap<NodeId, usize> = order
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        let mut layers: BTreeMap<NodeId, usize> = BTreeMap::new();
        for (index, id) in order.iter().enumerate() {
            let layer = self
                .predecessors(*id)
                .into_iter()
                .filter(|pred| position.get(pred).is_some_and(|p| *p < index))
                .filter_map(|pred| layers.get(&pred).map(|layer| layer + 1))
                .max()
                .unwrap_or(0);
            layers.insert(*id, layer);
        }
        layers
    }
}
