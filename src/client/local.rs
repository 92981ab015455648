use super::{ModelClient, PipelineChecker};
use crate::error::TransportError;
use crate::graph::Topology;
use crate::pipeline::{ModelRequest, Pipeline, PipelineSummary};
use async_trait::async_trait;

/// In-process acyclicity check.
///
/// Counts every submitted node and edge; edges whose endpoints are not in the
/// node list are counted but play no part in cycle detection. An empty graph is
/// a DAG.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalChecker;

impl LocalChecker {
    pub fn summarize(pipeline: &Pipeline) -> PipelineSummary {
        let topology = Topology::new(&pipeline.nodes, &pipeline.edges);
        PipelineSummary {
            num_nodes: pipeline.nodes.len(),
            num_edges: pipeline.edges.len(),
            is_dag: topology.is_acyclic(),
        }
    }
}

#[async_trait]
impl PipelineChecker for LocalChecker {
    async fn check(&self, pipeline: &Pipeline) -> Result<PipelineSummary, TransportError> {
        Ok(Self::summarize(pipeline))
    }
}

/// A stand-in model that echoes its request back.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoModel;

impl EchoModel {
    pub fn reply(request: &ModelRequest) -> String {
        let system: String = request.system.chars().take(120).collect();
        let prompt: String = request.prompt.chars().take(500).collect();
        format!(
            "Echo from mock LLM (model={}).\nSystem: {}\nPrompt: {}",
            request.model, system, prompt
        )
    }
}

#[async_trait]
impl ModelClient for EchoModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String, TransportError> {
        Ok(Self::reply(request))
    }
}
