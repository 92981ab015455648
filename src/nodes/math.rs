use super::{ComputeContext, Derived, NodeBehavior, Push, coerce_number, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType};
use serde_json::{Value, json};
use std::fmt;

/// Binary arithmetic operator of a math node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MathOp {
    /// Accepts the short (`sub`) and long (`subtract`) spellings.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "add" => Some(MathOp::Add),
            "sub" | "subtract" => Some(MathOp::Subtract),
            "mul" | "multiply" => Some(MathOp::Multiply),
            "div" | "divide" => Some(MathOp::Divide),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Subtract => "sub",
            MathOp::Multiply => "mul",
            MathOp::Divide => "div",
        }
    }
}

/// Outcome of a math node. Division by zero is `Undefined`, never `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathResult {
    Number(f64),
    Undefined,
}

impl MathResult {
    /// JSON form stored in node data: a number, or `null` for the sentinel.
    pub fn to_value(self) -> Value {
        match self {
            MathResult::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => json!(n as i64),
            MathResult::Number(n) => json!(n),
            MathResult::Undefined => Value::Null,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value.as_f64() {
            Some(n) => MathResult::Number(n),
            None => MathResult::Undefined,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            MathResult::Number(n) => Some(n),
            MathResult::Undefined => None,
        }
    }
}

impl fmt::Display for MathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathResult::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            MathResult::Number(n) => write!(f, "{}", n),
            MathResult::Undefined => f.write_str("∞"),
        }
    }
}

pub fn evaluate(a: f64, b: f64, op: MathOp) -> MathResult {
    let n = match op {
        MathOp::Add => a + b,
        MathOp::Subtract => a - b,
        MathOp::Multiply => a * b,
        MathOp::Divide if b == 0.0 => return MathResult::Undefined,
        MathOp::Divide => a / b,
    };
    if n.is_finite() {
        MathResult::Number(n)
    } else {
        MathResult::Undefined
    }
}

/// Which of the two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
}

impl Operand {
    fn fields(self) -> (&'static str, &'static str) {
        match self {
            Operand::A => ("inputA", "localA"),
            Operand::B => ("inputB", "localB"),
        }
    }
}

/// An operand is overridden while an upstream value is bound to it; the local
/// literal is then ignored and should not be editable. A bound `null` (an
/// upstream division by zero) still overrides.
pub fn is_overridden(node: &Node, operand: Operand) -> bool {
    node.field(operand.fields().0).is_some()
}

/// The operand's effective value. A bound `null` stays undefined so the
/// sentinel is never read as a number.
pub fn operand(node: &Node, operand: Operand) -> MathResult {
    let (input, local) = operand.fields();
    match node.field(input).or_else(|| node.field(local)) {
        Some(Value::Null) if is_overridden(node, operand) => MathResult::Undefined,
        Some(value) => MathResult::Number(coerce_number(value)),
        None => MathResult::Number(0.0),
    }
}

/// Two-operand arithmetic.
pub struct MathBehavior;

impl NodeBehavior for MathBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::Math
    }

    fn initial_data(&self, _node_id: &str) -> NodeData {
        data_of([
            ("localA", json!("0")),
            ("localB", json!("0")),
            ("op", json!(MathOp::Add.as_str())),
        ])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![
            Handle::target(&node.id, "input-a"),
            Handle::target(&node.id, "input-b"),
            Handle::source(&node.id, "result"),
        ]
    }

    fn input_field(&self, slot: &str) -> Option<String> {
        match slot {
            "input-a" => Some("inputA".to_string()),
            "input-b" => Some("inputB".to_string()),
            _ => None,
        }
    }

    fn compute(&self, node: &Node, _ctx: &ComputeContext) -> Derived {
        let op = node.field("op").and_then(Value::as_str).unwrap_or("add");
        let result = match MathOp::parse(op) {
            Some(op) => match (operand(node, Operand::A), operand(node, Operand::B)) {
                (MathResult::Number(a), MathResult::Number(b)) => evaluate(a, b, op),
                _ => MathResult::Undefined,
            },
            None => {
                tracing::debug!(node_id = %node.id, op, "unknown math operator");
                MathResult::Number(0.0)
            }
        };
        let value = result.to_value();
        Derived::pushing(Push::new(value.clone(), "result")).with_field("result", value)
    }
}
