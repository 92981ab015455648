use super::{ComputeContext, Derived, NodeBehavior, Push, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType};
use serde_json::json;

/// A named pipeline input. Its derived value is the configured name.
pub struct InputBehavior;

impl NodeBehavior for InputBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::Input
    }

    fn initial_data(&self, node_id: &str) -> NodeData {
        data_of([("inputName", json!(node_id)), ("inputType", json!("Text"))])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![Handle::source(&node.id, "value")]
    }

    fn compute(&self, node: &Node, _ctx: &ComputeContext) -> Derived {
        let name = node
            .field_text("inputName")
            .unwrap_or_else(|| node.id.clone());
        Derived::pushing(Push::new(name, "name"))
    }
}
