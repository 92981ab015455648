use super::{ComputeContext, Derived, NodeBehavior, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType};
use serde_json::{Value, json};
use std::fmt;

/// Terminal sink: shows whatever arrives on its single input.
pub struct OutputBehavior;

impl NodeBehavior for OutputBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::Output
    }

    fn initial_data(&self, node_id: &str) -> NodeData {
        data_of([("outputName", json!(node_id)), ("outputType", json!("Text"))])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![Handle::target(&node.id, "value")]
    }

    fn input_field(&self, slot: &str) -> Option<String> {
        (slot == "value").then(|| "value".to_string())
    }

    fn compute(&self, _node: &Node, _ctx: &ComputeContext) -> Derived {
        Derived::default()
    }
}

/// The value an output node shows: `value` if set, otherwise `result`.
///
/// `None` means nothing has arrived yet. A present `null` is the math
/// node's undefined sentinel and is returned as such.
pub fn displayed_value(node: &Node) -> Option<&Value> {
    node.field("value").or_else(|| node.field("result"))
}

/// Renders an output node's value, keeping "no value" apart from falsy values.
pub struct OutputDisplay<'a>(pub Option<&'a Value>);

impl<'a> OutputDisplay<'a> {
    pub fn of(node: &'a Node) -> Self {
        Self(displayed_value(node))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for OutputDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("—"),
            Some(Value::Null) => f.write_str("∞"),
            Some(Value::String(s)) => f.write_str(s),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", x as i64),
                _ => write!(f, "{}", n),
            },
            Some(other) => write!(f, "{}", other),
        }
    }
}
