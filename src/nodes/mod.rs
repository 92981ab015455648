//! Per-type compute rules.
//!
//! Every node type implements [`NodeBehavior`]: it declares the node's default
//! data, derives its handle set from the node's current state, and computes the
//! node's derived value. Behaviors are pure; the engine applies what they return.

use crate::graph::{Handle, HandleSide, Node, NodeData, NodeType};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub mod date;
pub mod input;
pub mod llm;
pub mod math;
pub mod output;
pub mod random;
pub mod text;
pub mod upper_case;

/// Ambient inputs a compute rule may read besides the node itself.
#[derive(Debug, Clone, Copy)]
pub struct ComputeContext {
    pub now: DateTime<Utc>,
}

/// Every type-specific key a behavior pushes under.
pub const PUSH_KEYS: [&str; 6] = ["name", "template", "result", "date", "output", "completion"];

/// A value pushed into downstream nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Push {
    pub value: Value,
    /// Type-specific key written alongside the generic `value` key.
    pub typed_key: &'static str,
}

impl Push {
    pub fn new(value: impl Into<Value>, typed_key: &'static str) -> Self {
        Self {
            value: value.into(),
            typed_key,
        }
    }

    /// The data patch merged into each downstream node.
    pub fn patch(&self) -> NodeData {
        let mut patch = NodeData::new();
        patch.insert("value".to_string(), self.value.clone());
        patch.insert(self.typed_key.to_string(), self.value.clone());
        patch
    }
}

/// What a compute rule produced for one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derived {
    /// Derived fields stored on the node itself.
    pub self_patch: NodeData,
    /// Value pushed along outgoing edges; `None` for terminal nodes.
    pub push: Option<Push>,
}

impl Derived {
    pub fn pushing(push: Push) -> Self {
        Self {
            self_patch: NodeData::new(),
            push: Some(push),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.self_patch.insert(key.to_string(), value.into());
        self
    }
}

/// Defines the contract for one node type's compute rule.
pub trait NodeBehavior: Send + Sync {
    fn node_type(&self) -> NodeType;

    /// Default data for a freshly created node.
    fn initial_data(&self, node_id: &str) -> NodeData;

    /// The node's handle set, derived from its current state.
    fn handles(&self, node: &Node) -> Vec<Handle>;

    /// The data key an incoming edge on input `slot` writes its value to.
    fn input_field(&self, _slot: &str) -> Option<String> {
        None
    }

    fn compute(&self, node: &Node, ctx: &ComputeContext) -> Derived;
}

/// Lookup table from node type to its behavior.
pub struct BehaviorRegistry {
    behaviors: AHashMap<NodeType, Box<dyn NodeBehavior>>,
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            behaviors: AHashMap::new(),
        };
        registry.register(Box::new(input::InputBehavior));
        registry.register(Box::new(text::TextBehavior));
        registry.register(Box::new(math::MathBehavior));
        registry.register(Box::new(date::DateBehavior));
        registry.register(Box::new(upper_case::UpperCaseBehavior));
        registry.register(Box::new(random::RandomNumberBehavior));
        registry.register(Box::new(llm::LlmCallBehavior));
        registry.register(Box::new(output::OutputBehavior));
        registry
    }
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the behavior registered for the behavior's node type.
    pub fn with_behavior(mut self, behavior: Box<dyn NodeBehavior>) -> Self {
        self.register(behavior);
        self
    }

    pub fn register(&mut self, behavior: Box<dyn NodeBehavior>) {
        self.behaviors.insert(behavior.node_type(), behavior);
    }

    pub fn get(&self, node_type: NodeType) -> Option<&dyn NodeBehavior> {
        self.behaviors.get(&node_type).map(|b| b.as_ref())
    }

    /// Resolves the data key an edge arriving on `target_handle` overrides.
    ///
    /// A handle that names no known input slot falls back to the node's only
    /// input slot, if it has exactly one.
    pub fn bound_field(&self, node: &Node, target_handle: &str) -> Option<String> {
        let behavior = self.get(node.node_type)?;
        let inputs: Vec<Handle> = behavior
            .handles(node)
            .into_iter()
            .filter(|h| h.side == HandleSide::Target)
            .collect();
        let slot = inputs
            .iter()
            .find(|h| h.id == target_handle)
            .or_else(|| if inputs.len() == 1 { inputs.first() } else { None })?;
        behavior.input_field(&slot.slot)
    }
}

/// Coerces a propagated value to a number; anything non-numeric becomes `0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// A field is present when it exists and is not `null`.
pub(crate) fn present<'a>(node: &'a Node, key: &str) -> Option<&'a Value> {
    node.field(key).filter(|v| !v.is_null())
}

pub(crate) fn data_of<const N: usize>(fields: [(&str, Value); N]) -> NodeData {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
