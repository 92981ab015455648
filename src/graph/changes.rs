use super::model::{Edge, EdgeId, Node, NodeId, Position};
use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A structural delta to the node set, as emitted by an editor canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Position {
        id: NodeId,
        #[serde(default)]
        position: Option<Position>,
    },
    Select {
        id: NodeId,
        selected: bool,
    },
    Remove {
        id: NodeId,
    },
    Add {
        item: Node,
    },
}

/// A structural delta to the edge set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
    Add { item: Edge },
}

/// Applies a batch of node changes, keeping the relative order of untouched nodes.
///
/// Returns the ids that were actually removed so the caller can cascade.
pub fn apply_node_changes(changes: &[NodeChange], nodes: &mut Vec<Node>) -> Vec<NodeId> {
    let mut removed: Vec<&str> = Vec::new();
    let mut added = Vec::new();

    for change in changes {
        match change {
            NodeChange::Position { id, position } => {
                if let (Some(node), Some(position)) =
                    (nodes.iter_mut().find(|n| &n.id == id), position)
                {
                    node.position = *position;
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { id } => {
                if nodes.iter().any(|n| &n.id == id) {
                    removed.push(id.as_str());
                }
            }
            NodeChange::Add { item } => {
                let duplicate = nodes.iter().any(|n| n.id == item.id)
                    || added.iter().any(|n: &Node| n.id == item.id);
                if duplicate {
                    tracing::debug!(node_id = %item.id, "ignoring add of an existing node id");
                } else {
                    added.push(item.clone());
                }
            }
        }
    }

    let removed: Vec<NodeId> = removed.into_iter().unique().map(str::to_string).collect();
    nodes.retain(|n| !removed.contains(&n.id));
    nodes.extend(added);
    removed
}

/// Applies a batch of edge changes, keeping the relative order of untouched edges.
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &mut Vec<Edge>) {
    let mut removed: AHashSet<&str> = AHashSet::new();
    let mut added: Vec<Edge> = Vec::new();

    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = edges.iter_mut().find(|e| &e.id == id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { id } => {
                removed.insert(id.as_str());
            }
            EdgeChange::Add { item } => {
                if edges.iter().chain(added.iter()).any(|e| e.id == item.id) {
                    tracing::debug!(edge_id = %item.id, "ignoring add of an existing edge id");
                } else {
                    added.push(item.clone());
                }
            }
        }
    }

    edges.retain(|e| !removed.contains(e.id.as_str()));
    edges.extend(added);
}
