use crate::graph::{EdgeId, NodeId};

/// What one propagation pass touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Nodes whose compute rule ran, in the order it ran.
    pub recomputed: Vec<NodeId>,
    /// Nodes that received a pushed value.
    pub updated: Vec<NodeId>,
    /// Edges removed because their handle vanished.
    pub removed_edges: Vec<EdgeId>,
}

impl PropagationReport {
    pub fn is_empty(&self) -> bool {
        self.recomputed.is_empty() && self.updated.is_empty() && self.removed_edges.is_empty()
    }

    /// Folds a later pass into this one.
    pub fn absorb(&mut self, other: PropagationReport) {
        self.recomputed.extend(other.recomputed);
        for node_id in other.updated {
            if !self.updated.contains(&node_id) {
                self.updated.push(node_id);
            }
        }
        self.removed_edges.extend(other.removed_edges);
    }
}
