use super::{Engine, PropagationReport, patch_of};
use crate::client::ModelClient;
use crate::error::{PropagationError, TransportError};
use crate::graph::{NodeId, NodeType};
use crate::nodes::llm::{LlmStatus, request_for};
use crate::pipeline::ModelRequest;
use serde_json::Value;
use tracing::{debug, warn};

/// A claim on the result of one model call.
///
/// Only the ticket with the newest generation for its node may complete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmTicket {
    pub node_id: NodeId,
    pub generation: u64,
    pub request: ModelRequest,
}

/// What completing a model call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmOutcome {
    /// The response was stored and pushed downstream.
    Succeeded(PropagationReport),
    /// The call failed; the message is stored in the node's `error` field.
    Failed(String),
    /// A newer call (or a reconfiguration) superseded this one.
    Stale,
    /// The node no longer exists or is not a model call.
    Ignored,
}

impl Engine {
    /// Marks the node pending and issues a ticket for its current request.
    pub fn begin_llm_call(&mut self, node_id: &str) -> Option<LlmTicket> {
        let Some(node) = self.store.node(node_id) else {
            debug!(node_id, "model call ignored: unknown node");
            return None;
        };
        if node.node_type != NodeType::LlmCall {
            debug!(node_id, node_type = %node.node_type, "model call ignored: not a model node");
            return None;
        }
        let request = request_for(node);

        let generation = self.next_generation(node_id);

        self.store
            .update_node_data(node_id, &patch_of("status", LlmStatus::Pending.to_value()));
        self.store.remove_node_fields(node_id, &["error"]);
        debug!(node_id, generation, model = %request.model, "model call started");

        Some(LlmTicket {
            node_id: node_id.to_string(),
            generation,
            request,
        })
    }

    /// Applies the result of the call `ticket` was issued for.
    ///
    /// Results for deleted nodes and superseded tickets are discarded.
    pub fn complete_llm_call(
        &mut self,
        ticket: LlmTicket,
        result: Result<String, TransportError>,
    ) -> Result<LlmOutcome, PropagationError> {
        let Some(node) = self.store.node(&ticket.node_id) else {
            debug!(node_id = %ticket.node_id, "model result dropped: node removed");
            return Ok(LlmOutcome::Ignored);
        };
        let current = self.generations.get(&ticket.node_id).copied().unwrap_or(0);
        if ticket.generation != current || LlmStatus::of(node) != LlmStatus::Pending {
            debug!(
                node_id = %ticket.node_id,
                generation = ticket.generation,
                current,
                "model result dropped: superseded"
            );
            return Ok(LlmOutcome::Stale);
        }

        match result {
            Ok(response) => {
                let mut patch = patch_of("response", response);
                patch.insert("status".to_string(), LlmStatus::Success.to_value());
                self.store.update_node_data(&ticket.node_id, &patch);
                let report = self.propagate(&[ticket.node_id])?;
                Ok(LlmOutcome::Succeeded(report))
            }
            Err(err) => {
                let message = err.to_string();
                warn!(node_id = %ticket.node_id, error = %message, "model call failed");
                let mut patch = patch_of("error", Value::String(message.clone()));
                patch.insert("status".to_string(), LlmStatus::Failed.to_value());
                self.store.update_node_data(&ticket.node_id, &patch);
                Ok(LlmOutcome::Failed(message))
            }
        }
    }

    /// Runs one model call to completion through `client`.
    pub async fn run_llm_call(
        &mut self,
        node_id: &str,
        client: &dyn ModelClient,
    ) -> Result<LlmOutcome, PropagationError> {
        let Some(ticket) = self.begin_llm_call(node_id) else {
            return Ok(LlmOutcome::Ignored);
        };
        let result = client.complete(&ticket.request).await;
        self.complete_llm_call(ticket, result)
    }
}
