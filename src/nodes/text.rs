use super::{ComputeContext, Derived, NodeBehavior, Push, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType, value_as_text};
use crate::template::{extract_variables, render};
use ahash::AHashMap;
use serde_json::json;

const VAR_SLOT_PREFIX: &str = "var-";
const VAR_FIELD_PREFIX: &str = "var:";

/// A text template. Each distinct `{{name}}` reference becomes an input handle.
pub struct TextBehavior;

impl TextBehavior {
    fn template(node: &Node) -> String {
        node.field_text("text").unwrap_or_default()
    }
}

impl NodeBehavior for TextBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::Text
    }

    fn initial_data(&self, _node_id: &str) -> NodeData {
        data_of([("text", json!("{{input}}"))])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        let mut handles: Vec<Handle> = extract_variables(&Self::template(node))
            .into_iter()
            .map(|name| {
                Handle::target(&node.id, format!("{}{}", VAR_SLOT_PREFIX, name)).labelled(name)
            })
            .collect();
        handles.push(Handle::source(&node.id, "out"));
        handles
    }

    fn input_field(&self, slot: &str) -> Option<String> {
        slot.strip_prefix(VAR_SLOT_PREFIX)
            .map(|name| format!("{}{}", VAR_FIELD_PREFIX, name))
    }

    fn compute(&self, node: &Node, _ctx: &ComputeContext) -> Derived {
        let text = Self::template(node);
        let variables = extract_variables(&text);

        let bindings: AHashMap<String, String> = variables
            .iter()
            .filter_map(|name| {
                node.field(&format!("{}{}", VAR_FIELD_PREFIX, name))
                    .and_then(value_as_text)
                    .map(|value| (name.clone(), value))
            })
            .collect();
        let rendered = render(&text, &bindings);

        Derived::pushing(Push::new(text, "template"))
            .with_field("variables", variables)
            .with_field("rendered", rendered)
    }
}
