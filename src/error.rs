use thiserror::Error;

/// Errors raised by structural graph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{missing_node_id}' not found, which is required by a connection from '{source_node_id}'")]
    NodeNotFound {
        missing_node_id: String,
        source_node_id: String,
    },

    #[error("Node '{node_id}' exposes no {side} handle '{handle}'")]
    UnknownHandle {
        node_id: String,
        handle: String,
        side: &'static str,
    },
}

/// Errors that stop a change from being pushed downstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropagationError {
    #[error("Propagation from '{origin}' blocked by a cycle through: {}", .nodes.join(" -> "))]
    Cycle { origin: String, nodes: Vec<String> },
}

/// Errors reported by the external collaborators (acyclicity check, model invocation).
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("{endpoint} error {status}: {preview}")]
    Status {
        endpoint: &'static str,
        status: u16,
        preview: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Errors that can occur while loading client configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
