use super::model::{Edge, Node};
use super::store::GraphStore;
use serde::Serialize;
use std::fmt;

/// Which side of a node a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandleSide {
    /// Left side; edges arrive here.
    Target,
    /// Right side; edges leave from here.
    Source,
}

impl fmt::Display for HandleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleSide::Target => f.write_str("target"),
            HandleSide::Source => f.write_str("source"),
        }
    }
}

/// A named connection point on a node. Derived from node state, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Handle {
    pub id: String,
    pub slot: String,
    pub side: HandleSide,
    /// Human label, e.g. the variable name for template handles.
    pub label: Option<String>,
}

impl Handle {
    pub fn target(node_id: &str, slot: impl Into<String>) -> Self {
        Self::new(node_id, slot.into(), HandleSide::Target)
    }

    pub fn source(node_id: &str, slot: impl Into<String>) -> Self {
        Self::new(node_id, slot.into(), HandleSide::Source)
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn new(node_id: &str, slot: String, side: HandleSide) -> Self {
        Self {
            id: handle_id(node_id, &slot),
            slot,
            side,
            label: None,
        }
    }
}

pub fn handle_id(node_id: &str, slot: &str) -> String {
    format!("{}-{}", node_id, slot)
}

/// Extracts the slot name from a handle id of the form `{node_id}-{slot}`.
pub fn slot_of<'h>(node_id: &str, handle: &'h str) -> Option<&'h str> {
    handle
        .strip_prefix(node_id)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|slot| !slot.is_empty())
}

/// Does `edge` still attach to a handle `node` exposes on the expected side?
fn attaches(edge: &Edge, node: &Node, handles: &[Handle]) -> bool {
    let (handle, side) = if edge.source == node.id {
        (&edge.source_handle, HandleSide::Source)
    } else {
        (&edge.target_handle, HandleSide::Target)
    };
    // Anonymous handles are accepted as long as the node has a handle on that side.
    if handle.is_empty() {
        return handles.iter().any(|h| h.side == side);
    }
    handles.iter().any(|h| h.side == side && &h.id == handle)
}

/// Removes every edge touching `node_id` whose handle is not in `handles`.
///
/// Returns the removed edges.
pub fn reconcile(store: &mut GraphStore, node_id: &str, handles: &[Handle]) -> Vec<Edge> {
    let Some(node) = store.node(node_id) else {
        return Vec::new();
    };
    let stale: Vec<String> = store
        .edges()
        .iter()
        .filter(|e| e.source == node.id || e.target == node.id)
        .filter(|e| !attaches(e, node, handles))
        .map(|e| e.id.clone())
        .collect();
    if stale.is_empty() {
        return Vec::new();
    }
    tracing::debug!(node_id, removed = stale.len(), "removing edges on vanished handles");
    store.remove_edges(&stale)
}
