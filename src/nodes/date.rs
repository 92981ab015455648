use super::{ComputeContext, Derived, NodeBehavior, Push, data_of};
use crate::graph::{Handle, Node, NodeData, NodeType};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde_json::{Value, json};

/// How a date node renders the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `2024-03-05T14:07:09.123Z`
    #[default]
    Iso,
    /// `3/5/2024, 2:07:09 PM`, in local time.
    Locale,
}

impl DateFormat {
    pub fn parse(format: &str) -> Self {
        match format {
            "locale" => DateFormat::Locale,
            _ => DateFormat::Iso,
        }
    }
}

pub fn format_timestamp(now: DateTime<Utc>, format: DateFormat) -> String {
    match format {
        DateFormat::Iso => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        DateFormat::Locale => now
            .with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
    }
}

/// A source node: the current time, re-derived on every clock tick.
pub struct DateBehavior;

impl NodeBehavior for DateBehavior {
    fn node_type(&self) -> NodeType {
        NodeType::Date
    }

    fn initial_data(&self, _node_id: &str) -> NodeData {
        data_of([("format", json!("iso"))])
    }

    fn handles(&self, node: &Node) -> Vec<Handle> {
        vec![Handle::source(&node.id, "date")]
    }

    fn compute(&self, node: &Node, ctx: &ComputeContext) -> Derived {
        let format = node
            .field("format")
            .and_then(Value::as_str)
            .map(DateFormat::parse)
            .unwrap_or_default();
        let formatted = format_timestamp(ctx.now, format);
        Derived::pushing(Push::new(formatted.clone(), "date")).with_field("value", formatted)
    }
}
