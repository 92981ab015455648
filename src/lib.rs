//! # Pipeflow - Graph Model and Live Propagation Engine
//!
//! **Pipeflow** models a node-based computation pipeline: typed nodes with local
//! state, edges between named handles, and an engine that recomputes and pushes
//! every derived value downstream as soon as something upstream changes.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Graph**: Create nodes with [`engine::Engine::create_node`] and wire them with
//!     [`engine::Engine::connect`]. Every node type exposes its handles through its
//!     [`nodes::NodeBehavior`].
//! 2.  **Edit**: Change a node's local fields with [`engine::Engine::edit`]. The engine
//!     recomputes the node and everything downstream of it, once each, in topological order.
//! 3.  **Drive External Sources**: Tick the clock for date nodes, regenerate random numbers,
//!     or run model calls through a [`client::ModelClient`].
//! 4.  **Submit**: Snapshot the graph with [`engine::Engine::prepare_submission`] and hand it to a
//!     [`client::PipelineChecker`] for the acyclicity check.
//!
//! ## Quick Start
//!
//! ```rust
//! use pipeflow::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut engine = Engine::new();
//! let input = engine.create_node(NodeType::Input, Position::new(0.0, 0.0));
//! let upper = engine.create_node(NodeType::UpperCase, Position::new(200.0, 0.0));
//!
//! engine.connect(&Connection::new(
//!     &input,
//!     handle_id(&input, "value"),
//!     &upper,
//!     handle_id(&upper, "text-in"),
//! ))?;
//! engine.set_field(&input, "inputName", "hello")?;
//!
//! let output = engine.node(&upper).and_then(|n| n.field_text("output"));
//! assert_eq!(output.as_deref(), Some("HELLO"));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod engine;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod pipeline;
pub mod prelude;
pub mod template;
