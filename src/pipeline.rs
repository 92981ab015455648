//! Payloads exchanged with the external collaborators.

use crate::graph::{Edge, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Maximum number of characters of an error body folded into a transport error.
pub const ERROR_PREVIEW_CHARS: usize = 400;

/// The full graph, as submitted to the acyclicity check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Pipeline {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Verdict of the acyclicity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub is_dag: bool,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nodes: {}\nEdges: {}\nIs DAG: {}",
            self.num_nodes, self.num_edges, self.is_dag
        )
    }
}

/// Request body of a model invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
}

/// Response body of a model invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ModelResponse {
    /// `text` takes precedence over `response`.
    pub fn completion(self) -> Option<String> {
        self.text.or(self.response)
    }
}

/// Extracts the completion from a successful model response body.
///
/// A body that is not a [`ModelResponse`] carrying a completion is taken verbatim.
pub fn completion_from_body(body: &str) -> String {
    serde_json::from_str::<ModelResponse>(body)
        .ok()
        .and_then(ModelResponse::completion)
        .unwrap_or_else(|| body.to_string())
}

/// The first `ERROR_PREVIEW_CHARS` characters of an error body, JSON compacted.
pub fn error_preview(body: &str) -> String {
    let compact = serde_json::from_str::<Value>(body)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| body.to_string());
    compact.chars().take(ERROR_PREVIEW_CHARS).collect()
}
