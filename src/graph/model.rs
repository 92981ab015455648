use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type NodeId = String;
pub type EdgeId = String;

/// Open, per-type mapping of editable and derived fields.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// The closed set of node kinds a pipeline can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Input,
    Text,
    Math,
    Date,
    #[serde(alias = "upper")]
    UpperCase,
    #[serde(alias = "rand")]
    RandomNumber,
    #[serde(alias = "llm")]
    LlmCall,
    Output,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        NodeType::Input,
        NodeType::Text,
        NodeType::Math,
        NodeType::Date,
        NodeType::UpperCase,
        NodeType::RandomNumber,
        NodeType::LlmCall,
        NodeType::Output,
    ];

    /// The wire spelling, also used as the id prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Input => "input",
            NodeType::Text => "text",
            NodeType::Math => "math",
            NodeType::Date => "date",
            NodeType::UpperCase => "upperCase",
            NodeType::RandomNumber => "randomNumber",
            NodeType::LlmCall => "llmCall",
            NodeType::Output => "output",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(NodeType::UpperCase),
            "rand" => Ok(NodeType::RandomNumber),
            "llm" => Ok(NodeType::LlmCall),
            other => NodeType::ALL
                .into_iter()
                .find(|t| t.as_str() == other)
                .ok_or_else(|| format!("unknown node type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A typed unit of computation and state in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub selected: bool,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type,
            position,
            data: NodeData::new(),
            selected: false,
        }
    }

    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Returns a field as a string, rendering non-string scalars the way a text box would.
    pub fn field_text(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(value_as_text)
    }
}

/// Renders a JSON scalar as text; `null`, arrays and objects have no text form.
pub fn value_as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Marker drawn at the end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: String,
    pub width: String,
    pub height: String,
}

/// Presentation decoration carried by edges. Ignored by propagation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
}

impl EdgeStyle {
    /// The style applied to every edge created through `connect`.
    pub fn decorated() -> Self {
        Self {
            kind: "smoothstep".to_string(),
            animated: true,
            marker_end: Some(EdgeMarker {
                kind: "arrow".to_string(),
                width: "20px".to_string(),
                height: "20px".to_string(),
            }),
        }
    }
}

/// A directed link from one node's output handle to another's input handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub source_handle: String,
    pub target: NodeId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub target_handle: String,
    #[serde(flatten)]
    pub style: EdgeStyle,
    #[serde(default)]
    pub selected: bool,
}

/// The endpoints of an edge the user is about to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub source_handle: String,
    pub target: NodeId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub target_handle: String,
}

impl Connection {
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: impl Into<String>,
        target: impl Into<NodeId>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }

    pub fn edge_id(&self) -> EdgeId {
        format!(
            "edge-{}{}-{}{}",
            self.source, self.source_handle, self.target, self.target_handle
        )
    }

    pub fn same_endpoints(&self, edge: &Edge) -> bool {
        edge.source == self.source
            && edge.source_handle == self.source_handle
            && edge.target == self.target
            && edge.target_handle == self.target_handle
    }
}

// React Flow sends `null` for handles on nodes with a single anonymous handle.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
