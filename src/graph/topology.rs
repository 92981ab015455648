use super::model::{Edge, Node, NodeId};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A read-only dependency view over a node and edge list.
///
/// Edges whose endpoints are not in the node list are ignored, and node
/// insertion order is used to break ties so every walk is deterministic.
pub struct Topology<'a> {
    order: Vec<&'a str>,
    adjacency: AHashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Topology<'a> {
    pub fn new(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
        let order: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut adjacency: AHashMap<&str, Vec<&str>> =
            order.iter().map(|id| (*id, Vec::new())).collect();
        for edge in edges {
            if !adjacency.contains_key(edge.target.as_str()) {
                continue;
            }
            if let Some(targets) = adjacency.get_mut(edge.source.as_str()) {
                if !targets.contains(&edge.target.as_str()) {
                    targets.push(edge.target.as_str());
                }
            }
        }
        Self { order, adjacency }
    }

    /// Every node reachable from `start` (including `start`), in discovery order.
    pub fn reachable_from(&self, start: &str) -> Vec<&'a str> {
        let Some((&start, _)) = self.adjacency.get_key_value(start) else {
            return Vec::new();
        };
        let mut seen: AHashSet<&str> = AHashSet::from_iter([start]);
        let mut found = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in &self.adjacency[current] {
                if seen.insert(next) {
                    found.push(next);
                    queue.push_back(next);
                }
            }
        }
        found
    }

    /// Topologically orders the subgraph induced by `subset` (Kahn's algorithm).
    ///
    /// Returns the nodes of a cycle if the subgraph is not acyclic.
    pub fn order(&self, subset: &[&'a str]) -> Result<Vec<&'a str>, Vec<NodeId>> {
        let members: AHashSet<&str> = subset.iter().copied().collect();
        let mut in_degree: AHashMap<&str, usize> = members.iter().map(|id| (*id, 0)).collect();
        for id in &members {
            for next in &self.adjacency[id] {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<&str> = self
            .order
            .iter()
            .copied()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut sorted = Vec::with_capacity(members.len());
        while let Some(current) = queue.pop_front() {
            sorted.push(current);
            for &next in &self.adjacency[current] {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if sorted.len() == members.len() {
            Ok(sorted)
        } else {
            Err(self.find_cycle(subset).unwrap_or_default())
        }
    }

    /// Orders the whole graph.
    pub fn full_order(&self) -> Result<Vec<&'a str>, Vec<NodeId>> {
        let all = self.order.clone();
        self.order(&all)
    }

    /// Finds one directed cycle inside `subset`, listed from its first node.
    ///
    /// Depth-first with white/gray/black colouring, driven by an explicit stack
    /// so that long chains do not grow the call stack.
    pub fn find_cycle(&self, subset: &[&'a str]) -> Option<Vec<NodeId>> {
        let members: AHashSet<&str> = subset.iter().copied().collect();
        let mut color: AHashMap<&str, Color> =
            members.iter().map(|id| (*id, Color::White)).collect();

        for &root in self.order.iter().filter(|id| members.contains(*id)) {
            if color[root] != Color::White {
                continue;
            }
            // Each frame is a gray node and the index of its next child to visit.
            let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
            color.insert(root, Color::Gray);

            while let Some((id, cursor)) = stack.last_mut() {
                let Some(&next) = self.adjacency[*id].get(*cursor) else {
                    color.insert(*id, Color::Black);
                    stack.pop();
                    continue;
                };
                *cursor += 1;
                if !members.contains(next) {
                    continue;
                }
                match color[next] {
                    Color::Gray => {
                        let start = stack.iter().position(|(p, _)| *p == next).unwrap_or(0);
                        return Some(stack[start..].iter().map(|(p, _)| p.to_string()).collect());
                    }
                    Color::White => {
                        color.insert(next, Color::Gray);
                        stack.push((next, 0));
                    }
                    Color::Black => {}
                }
            }
        }
        None
    }

    pub fn is_acyclic(&self) -> bool {
        self.find_cycle(&self.order).is_none()
    }
}
