use super::{ComputeContext, Derived, NodeBehavior, Push, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType};
use crate::pipeline::ModelRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Fields whose change supersedes a request that is still in flight.
pub const REQUEST_FIELDS: [&str; 3] = ["model", "system", "prompt"];

/// Lifecycle of a model call: `idle -> pending -> {success, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failed,
}

impl LlmStatus {
    pub fn of(node: &Node) -> Self {
        node.field("status")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn to_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The request an LLM node would send right now.
pub fn request_for(node: &Node) -> ModelRequest {
    let text = |key: &str, default: &str| {
        node.field_text(key)
            .unwrap_or_else(|| default.to_string())
    };
    ModelRequest {
        model: text("model", DEFAULT_MODEL),
        system: text("system", DEFAULT_SYSTEM_PROMPT),
        prompt: text("prompt", ""),
    }
}

/// A call to the external model collaborator. The call itself is driven by the engine.
pub struct LlmCallBehavior;

impl NodeBehavior for LlmCallBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::LlmCall
    }

    fn initial_data(&self, _node_id: &str) -> NodeData {
        data_of([
            ("model", json!(DEFAULT_MODEL)),
            ("system", json!(DEFAULT_SYSTEM_PROMPT)),
            ("prompt", json!("")),
            ("response", json!("")),
            ("status", LlmStatus::Idle.to_value()),
        ])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![
            Handle::target(&node.id, "system"),
            Handle::target(&node.id, "prompt"),
            Handle::source(&node.id, "response"),
        ]
    }

    fn input_field(&self, slot: &str) -> Option<String> {
        matches!(slot, "system" | "prompt").then(|| slot.to_string())
    }

    fn compute(&self, node: &Node, _ctx: &ComputeContext) -> Derived {
        match node.field_text("response").filter(|r| !r.is_empty()) {
            Some(response) => Derived::pushing(Push::new(response, "completion")),
            None => Derived::default(),
        }
    }
}
