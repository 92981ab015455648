use super::{ComputeContext, Derived, NodeBehavior, Push, coerce_number, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType};
use rand::Rng;
use serde_json::json;

/// Exclusive upper bound of generated numbers.
pub const RANDOM_UPPER_BOUND: i64 = 100;

/// Draws a fresh integer in `[0, RANDOM_UPPER_BOUND)`.
pub fn draw() -> i64 {
    rand::rng().random_range(0..RANDOM_UPPER_BOUND)
}

/// A number chosen on creation and on explicit regeneration only.
pub struct RandomNumberBehavior;

impl NodeBehavior for RandomNumberBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::RandomNumber
    }

    fn initial_data(&self, _node_id: &str) -> NodeData {
        data_of([("n", json!(draw()))])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![Handle::source(&node.id, "out")]
    }

    fn compute(&self, node: &Node, _ctx: &ComputeContext) -> Derived {
        let n = node.field("n").map(coerce_number).unwrap_or(0.0) as i64;
        Derived::pushing(Push::new(n, "result"))
    }
}
