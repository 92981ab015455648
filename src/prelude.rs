//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the pipeflow crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use pipeflow::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/pipeline.json")?;
//! let mut engine = Engine::from_pipeline(Pipeline::from_json(&json)?);
//! engine.refresh_all()?;
//!
//! let summary = engine.submit(&LocalChecker).await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

// Engine and graph
pub use crate::engine::{Connected, Engine, LlmOutcome, LlmTicket, PropagationReport};
pub use crate::graph::{
    Connection, Edge, GraphStore, Handle, HandleSide, Node, NodeData, NodeId, NodeType, Position,
    handle_id,
};

// Node behaviors
pub use crate::nodes::output::OutputDisplay;
pub use crate::nodes::{BehaviorRegistry, NodeBehavior};

// Collaborators
pub use crate::client::{
    ClientConfig, EchoModel, HttpCollaborator, LocalChecker, ModelClient, PipelineChecker,
};
pub use crate::pipeline::{ModelRequest, ModelResponse, Pipeline, PipelineSummary};

// Error types
pub use crate::error::{ConfigError, GraphError, PropagationError, TransportError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
