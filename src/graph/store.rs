use super::changes::{self, EdgeChange, NodeChange};
use super::ids::IdAllocator;
use super::model::{Connection, Edge, EdgeId, EdgeStyle, Node, NodeData, NodeId, NodeType};
use crate::error::GraphError;
use crate::pipeline::Pipeline;
use ahash::AHashSet;
use tracing::debug;

/// The single source of truth for the node set and the edge set.
///
/// A store is an ordinary value: create as many as needed, each with its own
/// id counters. Every operation leaves the graph without dangling edges.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    ids: IdAllocator,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an existing node and edge list.
    ///
    /// Duplicate node ids keep their first occurrence, and edges whose endpoints are
    /// missing are dropped. Id counters are raised past every loaded id.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.add_node(node);
        }
        let mut seen: AHashSet<EdgeId> = AHashSet::new();
        for edge in edges {
            if !store.contains(&edge.source) || !store.contains(&edge.target) {
                debug!(edge_id = %edge.id, "dropping edge with a missing endpoint");
                continue;
            }
            if seen.insert(edge.id.clone()) {
                store.edges.push(edge);
            }
        }
        store
    }

    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self::from_parts(pipeline.nodes, pipeline.edges)
    }

    /// Issues the next id for `node_type` that no stored node uses.
    pub fn allocate_id(&mut self, node_type: NodeType) -> NodeId {
        loop {
            let id = self.ids.allocate(node_type);
            if !self.contains(&id) {
                return id;
            }
            debug!(node_id = %id, "skipping id already in use");
        }
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Appends a node and reserves its id. A node whose id is already present
    /// is ignored.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.contains(&node.id) {
            debug!(node_id = %node.id, "add_node ignored: id already present");
            return false;
        }
        self.ids.observe(&node.id);
        self.nodes.push(node);
        true
    }

    /// Applies a batch of node deltas. Removed nodes take their edges with them.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> Vec<NodeId> {
        let removed = changes::apply_node_changes(changes, &mut self.nodes);
        for change in changes {
            if let NodeChange::Add { item } = change {
                self.ids.observe(&item.id);
            }
        }
        if !removed.is_empty() {
            self.edges
                .retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
        }
        removed
    }

    /// Applies a batch of edge deltas. Added edges must reference live nodes.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        changes::apply_edge_changes(changes, &mut self.edges);
        let live: AHashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges.retain(|e| {
            let keep = live.contains(e.source.as_str()) && live.contains(e.target.as_str());
            if !keep {
                debug!(edge_id = %e.id, "dropping added edge with a missing endpoint");
            }
            keep
        });
    }

    /// Adds a decorated edge for `connection` and returns its id.
    ///
    /// Connecting the same handles twice returns the existing edge's id.
    pub fn connect(&mut self, connection: &Connection) -> Result<EdgeId, GraphError> {
        for (endpoint, other) in [
            (&connection.source, &connection.target),
            (&connection.target, &connection.source),
        ] {
            if !self.contains(endpoint) {
                return Err(GraphError::NodeNotFound {
                    missing_node_id: endpoint.clone(),
                    source_node_id: other.clone(),
                });
            }
        }

        if let Some(existing) = self.edges.iter().find(|e| connection.same_endpoints(e)) {
            debug!(edge_id = %existing.id, "connection already exists");
            return Ok(existing.id.clone());
        }

        let id = connection.edge_id();
        self.edges.push(Edge {
            id: id.clone(),
            source: connection.source.clone(),
            source_handle: connection.source_handle.clone(),
            target: connection.target.clone(),
            target_handle: connection.target_handle.clone(),
            style: EdgeStyle::decorated(),
            selected: false,
        });
        Ok(id)
    }

    /// Shallow-merges `patch` into the node's data. Returns `false` for an unknown id.
    pub fn update_node_data(&mut self, node_id: &str, patch: &NodeData) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => {
                for (key, value) in patch {
                    node.data.insert(key.clone(), value.clone());
                }
                true
            }
            None => {
                debug!(node_id, "update_node_data ignored: unknown node");
                false
            }
        }
    }

    /// Deletes `keys` from the node's data. Returns `false` for an unknown id.
    pub fn remove_node_fields(&mut self, node_id: &str, keys: &[&str]) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) else {
            return false;
        };
        for key in keys {
            node.data.remove(*key);
        }
        true
    }

    /// Removes the given nodes and every edge touching them in one step.
    pub fn remove_nodes<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<NodeId> {
        let ids: AHashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        if ids.is_empty() {
            return Vec::new();
        }
        let removed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        self.nodes.retain(|n| !ids.contains(n.id.as_str()));
        self.edges
            .retain(|e| !ids.contains(e.source.as_str()) && !ids.contains(e.target.as_str()));
        removed
    }

    /// Untyped entry point for `remove_nodes`: anything but an array of strings is a no-op.
    pub fn remove_nodes_value(&mut self, ids: &serde_json::Value) -> Vec<NodeId> {
        let Some(items) = ids.as_array() else {
            debug!("remove_nodes ignored: id list is not an array");
            return Vec::new();
        };
        let ids: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
        self.remove_nodes(&ids)
    }

    /// Removes every selected node, cascading to its edges.
    pub fn remove_selected(&mut self) -> Vec<NodeId> {
        let selected: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect();
        if selected.is_empty() {
            debug!("remove_selected: nothing selected");
        }
        self.remove_nodes(&selected)
    }

    pub fn remove_edges<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<Edge> {
        let ids: AHashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| ids.contains(e.id.as_str()));
        self.edges = kept;
        removed
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving `node_id`, in insertion order.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Edges arriving at `node_id`, in insertion order.
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Snapshot of the current graph in the submission format.
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}
