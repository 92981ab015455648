use super::{ComputeContext, Derived, NodeBehavior, Push, data_of, present};
use crate::graph::{Handle, Node, NodeData, NodeType, value_as_text};
use serde_json::json;

/// Uppercases the upstream string, or its own fallback text when nothing is connected.
pub struct UpperCaseBehavior;

impl NodeBehavior for UpperCaseBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::UpperCase
    }

    fn initial_data(&self, _node_id: &str) -> NodeData {
        data_of([("text", json!(""))])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![
            Handle::target(&node.id, "text-in"),
            Handle::source(&node.id, "text-out"),
        ]
    }

    fn input_field(&self, slot: &str) -> Option<String> {
        (slot == "text-in").then(|| "input".to_string())
    }

    fn compute(&self, node: &Node, _ctx: &ComputeContext) -> Derived {
        let incoming = present(node, "input").or_else(|| node.field("text"));
        let upper = incoming
            .and_then(value_as_text)
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Derived::pushing(Push::new(upper.clone(), "output")).with_field("output", upper)
    }
}
