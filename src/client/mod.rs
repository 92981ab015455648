//! Transport to the external collaborators.
//!
//! The engine never talks to the network itself. It hands a [`Pipeline`] to a
//! [`PipelineChecker`] and a [`ModelRequest`] to a [`ModelClient`]; either can be
//! the HTTP transport or one of the in-process implementations.

use crate::error::TransportError;
use crate::pipeline::{ModelRequest, Pipeline, PipelineSummary};
use async_trait::async_trait;

pub mod config;
pub mod http;
pub mod local;

pub use config::ClientConfig;
pub use http::HttpCollaborator;
pub use local::{EchoModel, LocalChecker};

/// Validates a submitted graph and reports its size and acyclicity.
#[async_trait]
pub trait PipelineChecker: Send + Sync {
    async fn check(&self, pipeline: &Pipeline) -> Result<PipelineSummary, TransportError>;
}

/// Invokes an external model and returns its textual completion.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<String, TransportError>;
}
