use super::config::ClientConfig;
use super::{ModelClient, PipelineChecker};
use crate::error::TransportError;
use crate::pipeline::{ModelRequest, Pipeline, PipelineSummary, completion_from_body, error_preview};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

/// HTTP transport to the pipeline backend.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    config: ClientConfig,
    client: Client,
}

impl HttpCollaborator {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn map_http_error(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Request(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            TransportError::Request(format!("Connection error: {}", error))
        } else {
            TransportError::Request(format!("HTTP error: {}", error))
        }
    }
}

#[async_trait]
impl PipelineChecker for HttpCollaborator {
    #[instrument(skip(self, pipeline), fields(nodes = pipeline.nodes.len(), edges = pipeline.edges.len()))]
    async fn check(&self, pipeline: &Pipeline) -> Result<PipelineSummary, TransportError> {
        let url = self.config.parse_url();
        debug!(%url, "submitting pipeline");

        let response = self
            .client
            .post(&url)
            .json(pipeline)
            .send()
            .await
            .map_err(Self::map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "pipeline check rejected");
            return Err(TransportError::Status {
                endpoint: "Pipeline check",
                status: status.as_u16(),
                preview: error_preview(&body),
            });
        }

        response
            .json::<PipelineSummary>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ModelClient for HttpCollaborator {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &ModelRequest) -> Result<String, TransportError> {
        let url = self.config.llm_url();
        debug!(%url, "invoking model");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(Self::map_http_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "model invocation failed");
            return Err(TransportError::Status {
                endpoint: "LLM",
                status: status.as_u16(),
                preview: error_preview(&body),
            });
        }
        Ok(completion_from_body(&body))
    }
}
