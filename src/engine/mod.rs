//! The propagation engine.
//!
//! [`Engine`] owns the graph and the behavior registry. Every mutation that can
//! change a derived value goes through it: the engine merges the change, then
//! recomputes the affected node and everything reachable from it exactly once,
//! in topological order, pushing each derived value along outgoing edges.

use crate::client::PipelineChecker;
use crate::error::{GraphError, PropagationError, TransportError};
use crate::graph::handles::{self, HandleSide};
use crate::graph::{
    Connection, Edge, EdgeChange, EdgeId, GraphStore, Handle, Node, NodeChange, NodeData, NodeId,
    NodeType, Position, Topology, slot_of,
};
use crate::nodes::llm::{LlmStatus, REQUEST_FIELDS};
use crate::nodes::{BehaviorRegistry, ComputeContext, PUSH_KEYS, Push, random};
use crate::pipeline::{Pipeline, PipelineSummary};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

pub mod clock;
pub mod llm;
pub mod report;

pub use clock::{Clock, DATE_TICK, FixedClock, SystemClock};
pub use llm::{LlmOutcome, LlmTicket};
pub use report::PropagationReport;

/// Outcome of [`Engine::connect`].
///
/// The edge is kept even when propagating through it fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub edge_id: EdgeId,
    pub propagation: Result<PropagationReport, PropagationError>,
}

pub struct Engine {
    store: GraphStore,
    registry: BehaviorRegistry,
    clock: Box<dyn Clock>,
    /// Latest issued LLM ticket generation per live node.
    generations: AHashMap<NodeId, u64>,
    /// Last generation issued to any node, so a re-added id never matches an old ticket.
    issued: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_registry(BehaviorRegistry::default())
    }

    pub fn with_registry(registry: BehaviorRegistry) -> Self {
        Self {
            store: GraphStore::new(),
            registry,
            clock: Box::new(SystemClock),
            generations: AHashMap::new(),
            issued: 0,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Loads a saved graph. Derived values are left as loaded until the next
    /// propagation; call [`Engine::refresh_all`] to recompute them.
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        let mut engine = Self::new();
        engine.store = GraphStore::from_pipeline(pipeline);
        engine
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.store.node(node_id)
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// The node's current handle set. Empty for an unknown id.
    pub fn handles(&self, node_id: &str) -> Vec<Handle> {
        self.store
            .node(node_id)
            .and_then(|node| {
                self.registry
                    .get(node.node_type)
                    .map(|behavior| behavior.handles(node))
            })
            .unwrap_or_default()
    }

    fn context(&self) -> ComputeContext {
        ComputeContext {
            now: self.clock.now(),
        }
    }

    // ---- Nodes ----

    /// Creates a node of `node_type` with its default data and returns its id.
    pub fn create_node(&mut self, node_type: NodeType, position: Position) -> NodeId {
        let id = self.store.allocate_id(node_type);
        let data = self
            .registry
            .get(node_type)
            .map(|behavior| behavior.initial_data(&id))
            .unwrap_or_default();
        self.add_node(Node::new(id.clone(), node_type, position).with_data(data));
        id
    }

    /// Adds a prebuilt node and derives its values. A duplicate id is ignored.
    pub fn add_node(&mut self, node: Node) -> bool {
        let id = node.id.clone();
        if !self.store.add_node(node) {
            return false;
        }
        if let Err(err) = self.propagate(&[id]) {
            warn!(%err, "new node could not be derived");
        }
        true
    }

    /// Merges `patch` into the node's data and propagates downstream.
    ///
    /// An unknown id is a no-op. On a cycle the edit is kept but nothing is pushed.
    pub fn edit(
        &mut self,
        node_id: &str,
        patch: &NodeData,
    ) -> Result<PropagationReport, PropagationError> {
        if !self.merge(node_id, patch) {
            return Ok(PropagationReport::default());
        }
        self.propagate(&[node_id.to_string()])
    }

    pub fn set_field(
        &mut self,
        node_id: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<PropagationReport, PropagationError> {
        self.edit(node_id, &patch_of(key, value))
    }

    // ---- Edges ----

    /// Connects two handles and propagates from the source.
    ///
    /// Both handles must be exposed by their nodes right now; an empty handle
    /// id is accepted when the node has any handle on that side.
    pub fn connect(&mut self, connection: &Connection) -> Result<Connected, GraphError> {
        self.check_handle(
            &connection.source,
            &connection.source_handle,
            HandleSide::Source,
            &connection.target,
        )?;
        self.check_handle(
            &connection.target,
            &connection.target_handle,
            HandleSide::Target,
            &connection.source,
        )?;

        let edge_id = self.store.connect(connection)?;
        let propagation = self.propagate(&[connection.source.clone()]);
        Ok(Connected {
            edge_id,
            propagation,
        })
    }

    fn check_handle(
        &self,
        node_id: &str,
        handle: &str,
        side: HandleSide,
        peer: &str,
    ) -> Result<(), GraphError> {
        if !self.store.contains(node_id) {
            return Err(GraphError::NodeNotFound {
                missing_node_id: node_id.to_string(),
                source_node_id: peer.to_string(),
            });
        }
        let exposed = self
            .handles(node_id)
            .iter()
            .any(|h| h.side == side && (handle.is_empty() || h.id == handle));
        if exposed {
            Ok(())
        } else {
            Err(GraphError::UnknownHandle {
                node_id: node_id.to_string(),
                handle: handle.to_string(),
                side: match side {
                    HandleSide::Source => "source",
                    HandleSide::Target => "target",
                },
            })
        }
    }

    /// Removes edges by id and releases the inputs they fed.
    pub fn remove_edges<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<Edge> {
        let removed = self.store.remove_edges(ids);
        self.release(&removed);
        removed
    }

    // ---- Removal ----

    pub fn remove_nodes<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<NodeId> {
        let before = self.store.edges().to_vec();
        let removed = self.store.remove_nodes(ids);
        self.release_dropped(&before);
        removed
    }

    /// Untyped entry point: anything but an array of ids is a no-op.
    pub fn remove_nodes_value(&mut self, ids: &Value) -> Vec<NodeId> {
        let before = self.store.edges().to_vec();
        let removed = self.store.remove_nodes_value(ids);
        self.release_dropped(&before);
        removed
    }

    pub fn remove_selected(&mut self) -> Vec<NodeId> {
        let before = self.store.edges().to_vec();
        let removed = self.store.remove_selected();
        self.release_dropped(&before);
        removed
    }

    // ---- Change batches ----

    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> Vec<NodeId> {
        let before = self.store.edges().to_vec();
        let removed = self.store.apply_node_changes(changes);
        self.release_dropped(&before);

        let added: Vec<NodeId> = changes
            .iter()
            .filter_map(|change| match change {
                NodeChange::Add { item } => Some(item.id.clone()),
                _ => None,
            })
            .filter(|id| self.store.contains(id))
            .collect();
        if !added.is_empty() {
            if let Err(err) = self.propagate(&added) {
                warn!(%err, "added nodes could not be derived");
            }
        }
        removed
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        let before = self.store.edges().to_vec();
        self.store.apply_edge_changes(changes);
        self.release_dropped(&before);

        let known: AHashSet<&str> = before.iter().map(|e| e.id.as_str()).collect();
        let sources: Vec<NodeId> = self
            .store
            .edges()
            .iter()
            .filter(|e| !known.contains(e.id.as_str()))
            .map(|e| e.source.clone())
            .unique()
            .collect();
        if !sources.is_empty() {
            if let Err(err) = self.propagate(&sources) {
                warn!(%err, "added edges could not be propagated");
            }
        }
    }

    /// Releases every edge in `before` that is no longer in the store and
    /// forgets model call generations of removed nodes.
    fn release_dropped(&mut self, before: &[Edge]) {
        let store = &self.store;
        self.generations.retain(|node_id, _| store.contains(node_id));

        let live: AHashSet<&str> = self.store.edges().iter().map(|e| e.id.as_str()).collect();
        let dropped: Vec<Edge> = before
            .iter()
            .filter(|e| !live.contains(e.id.as_str()))
            .cloned()
            .collect();
        self.release(&dropped);
    }

    /// Withdraws the values removed edges were feeding.
    ///
    /// When another edge still arrives on the same handle its source re-pushes;
    /// otherwise the bound field is cleared and the target re-derives. The generic
    /// pushed keys go only once nothing feeds the target at all.
    fn release(&mut self, removed: &[Edge]) {
        let mut origins: Vec<NodeId> = Vec::new();
        for edge in removed {
            let Some(target) = self.store.node(&edge.target) else {
                continue;
            };
            let remaining: Vec<NodeId> = self
                .store
                .incoming(&edge.target)
                .filter(|e| e.target_handle == edge.target_handle)
                .map(|e| e.source.clone())
                .collect();
            if remaining.is_empty() {
                let bound = self.registry.bound_field(target, &edge.target_handle);
                let unfed = self.store.incoming(&edge.target).next().is_none();
                let mut keys: Vec<&str> = Vec::new();
                if unfed {
                    keys.push("value");
                    keys.extend(PUSH_KEYS);
                }
                keys.extend(bound.as_deref());
                debug!(node_id = %edge.target, bound = ?bound, "releasing pushed input");
                self.store.remove_node_fields(&edge.target, &keys);
                origins.push(edge.target.clone());
            } else {
                origins.extend(remaining);
            }
        }

        let origins: Vec<NodeId> = origins.into_iter().unique().collect();
        if origins.is_empty() {
            return;
        }
        if let Err(err) = self.propagate(&origins) {
            warn!(%err, "released inputs could not be propagated");
        }
    }

    // ---- Value sources ----

    /// Draws a new number for a random node and propagates it.
    pub fn regenerate(&mut self, node_id: &str) -> Result<PropagationReport, PropagationError> {
        match self.store.node(node_id) {
            Some(node) if node.node_type == NodeType::RandomNumber => {}
            Some(_) => {
                debug!(node_id, "regenerate ignored: not a random number node");
                return Ok(PropagationReport::default());
            }
            None => {
                debug!(node_id, "regenerate ignored: unknown node");
                return Ok(PropagationReport::default());
            }
        }
        self.set_field(node_id, "n", random::draw())
    }

    /// Re-derives every date node from the clock.
    pub fn tick(&mut self) -> Result<PropagationReport, PropagationError> {
        let dates: Vec<NodeId> = self
            .store
            .nodes()
            .iter()
            .filter(|n| n.node_type == NodeType::Date)
            .map(|n| n.id.clone())
            .collect();
        self.propagate(&dates)
    }

    /// Ticks every [`DATE_TICK`] until `stop` resolves. Returns the number of ticks.
    pub async fn run_clock<F>(&mut self, stop: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(DATE_TICK);
        let mut stop = std::pin::pin!(stop);
        let mut ticks = 0;
        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = interval.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(%err, "clock tick blocked");
                    }
                    ticks += 1;
                }
            }
        }
        ticks
    }

    /// Recomputes every node in topological order.
    pub fn refresh_all(&mut self) -> Result<PropagationReport, PropagationError> {
        let all: Vec<NodeId> = self.store.nodes().iter().map(|n| n.id.clone()).collect();
        self.propagate(&all)
    }

    // ---- Submission ----

    /// Brings every derived value up to date and snapshots the graph.
    pub fn prepare_submission(&mut self) -> Pipeline {
        if let Err(err) = self.refresh_all() {
            warn!(%err, "submitting a graph with a cycle");
        }
        self.store.to_pipeline()
    }

    pub async fn submit(
        &mut self,
        checker: &dyn PipelineChecker,
    ) -> Result<PipelineSummary, TransportError> {
        let pipeline = self.prepare_submission();
        checker.check(&pipeline).await
    }

    /// Issues a fresh model call generation for `node_id`, invalidating older tickets.
    pub(crate) fn next_generation(&mut self, node_id: &str) -> u64 {
        self.issued += 1;
        self.generations.insert(node_id.to_string(), self.issued);
        self.issued
    }

    // ---- Propagation ----

    /// Merges a patch into a node, superseding an in-flight model call whose
    /// request fields change.
    fn merge(&mut self, node_id: &str, patch: &NodeData) -> bool {
        let Some(node) = self.store.node(node_id) else {
            debug!(node_id, "edit ignored: unknown node");
            return false;
        };
        let supersedes = node.node_type == NodeType::LlmCall
            && LlmStatus::of(node) == LlmStatus::Pending
            && REQUEST_FIELDS
                .iter()
                .any(|key| patch.get(*key).is_some_and(|v| node.field(key) != Some(v)));

        if supersedes {
            debug!(node_id, "request changed while pending; superseding call");
            self.next_generation(node_id);
            let mut patch = patch.clone();
            patch.insert("status".to_string(), LlmStatus::Idle.to_value());
            return self.store.update_node_data(node_id, &patch);
        }
        self.store.update_node_data(node_id, patch)
    }

    /// Recomputes everything reachable from `origins`, each node once, in
    /// topological order.
    pub(crate) fn propagate(
        &mut self,
        origins: &[NodeId],
    ) -> Result<PropagationReport, PropagationError> {
        let order: Vec<NodeId> = {
            let topology = Topology::new(self.store.nodes(), self.store.edges());
            let reachable: Vec<&str> = origins
                .iter()
                .flat_map(|origin| topology.reachable_from(origin))
                .unique()
                .collect();
            match topology.order(&reachable) {
                Ok(order) => order.into_iter().map(str::to_string).collect(),
                Err(cycle) => {
                    let origin = origins.first().cloned().unwrap_or_default();
                    warn!(%origin, cycle = %cycle.join(" -> "), "propagation blocked by a cycle");
                    return Err(PropagationError::Cycle {
                        origin,
                        nodes: cycle,
                    });
                }
            }
        };

        let ctx = self.context();
        let mut report = PropagationReport::default();
        for node_id in &order {
            self.recompute(node_id, &ctx, &mut report);
        }
        Ok(report)
    }

    fn recompute(&mut self, node_id: &str, ctx: &ComputeContext, report: &mut PropagationReport) {
        let Some(node) = self.store.node(node_id) else {
            return;
        };
        let Some(behavior) = self.registry.get(node.node_type) else {
            debug!(node_id, node_type = %node.node_type, "no behavior registered");
            return;
        };

        let derived = behavior.compute(node, ctx);
        if !derived.self_patch.is_empty() {
            self.store.update_node_data(node_id, &derived.self_patch);
        }
        report.recomputed.push(node_id.to_string());

        let Some(node) = self.store.node(node_id) else {
            return;
        };
        let current = behavior.handles(node);
        let vanished = handles::reconcile(&mut self.store, node_id, &current);
        let stale_fields: Vec<String> = vanished
            .iter()
            .filter(|e| e.target == node_id)
            .filter_map(|e| slot_of(node_id, &e.target_handle))
            .filter_map(|slot| behavior.input_field(slot))
            .collect();
        if !stale_fields.is_empty() {
            let keys: Vec<&str> = stale_fields.iter().map(String::as_str).collect();
            self.store.remove_node_fields(node_id, &keys);
        }
        report
            .removed_edges
            .extend(vanished.into_iter().map(|e| e.id));

        if let Some(push) = derived.push {
            self.push(node_id, &push, report);
        }
    }

    /// Merges `push` into every outgoing edge's target, in edge insertion order.
    fn push(&mut self, source_id: &str, push: &Push, report: &mut PropagationReport) {
        let edges: Vec<Edge> = self.store.outgoing(source_id).cloned().collect();
        for edge in edges {
            let Some(target) = self.store.node(&edge.target) else {
                continue;
            };
            let mut patch = push.patch();
            if let Some(field) = self.registry.bound_field(target, &edge.target_handle) {
                patch.insert(field, push.value.clone());
            }
            debug!(source = source_id, target = %edge.target, value = %push.value, "pushing value");
            if self.merge(&edge.target, &patch) && !report.updated.contains(&edge.target) {
                report.updated.push(edge.target.clone());
            }
        }
    }
}

/// Builds a one-field data patch.
pub fn patch_of(key: &str, value: impl Into<Value>) -> NodeData {
    let mut patch = NodeData::new();
    patch.insert(key.to_string(), value.into());
    patch
}

