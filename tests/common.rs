//! Common test utilities for building graphs and engines.
use chrono::{DateTime, TimeZone, Utc};
use pipeflow::engine::FixedClock;
use pipeflow::prelude::*;
use serde_json::Value;

/// 2024-03-05T14:07:09.123Z
#[allow(dead_code)]
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
        .single()
        .expect("valid timestamp")
        + chrono::Duration::milliseconds(123)
}

/// An empty engine whose clock is frozen at [`fixed_time`].
#[allow(dead_code)]
pub fn engine() -> Engine {
    Engine::new().with_clock(FixedClock(fixed_time()))
}

/// Adds a node at the origin and returns its id.
#[allow(dead_code)]
pub fn add(engine: &mut Engine, node_type: NodeType) -> NodeId {
    engine.create_node(node_type, Position::default())
}

/// Connects `source`'s `source_slot` to `target`'s `target_slot`, panicking on failure.
#[allow(dead_code)]
pub fn wire(
    engine: &mut Engine,
    source: &str,
    source_slot: &str,
    target: &str,
    target_slot: &str,
) -> Connected {
    engine
        .connect(&Connection::new(
            source,
            handle_id(source, source_slot),
            target,
            handle_id(target, target_slot),
        ))
        .expect("connection should be accepted")
}

#[allow(dead_code)]
pub fn field(engine: &Engine, node_id: &str, key: &str) -> Option<Value> {
    engine.node(node_id).and_then(|n| n.field(key).cloned())
}

#[allow(dead_code)]
pub fn text(engine: &Engine, node_id: &str, key: &str) -> Option<String> {
    engine.node(node_id).and_then(|n| n.field_text(key))
}

/// `input-1 -> upperCase-1 -> output-1`, as an editor would save it.
#[allow(dead_code)]
pub const UPPERCASE_PIPELINE_JSON: &str = r#"{
  "nodes": [
    { "id": "input-1", "type": "input", "position": { "x": 0, "y": 0 },
      "data": { "inputName": "hello", "inputType": "Text" } },
    { "id": "upperCase-1", "type": "upperCase", "position": { "x": 200, "y": 0 },
      "data": { "text": "" } },
    { "id": "output-1", "type": "output", "position": { "x": 400, "y": 0 },
      "data": { "outputName": "output-1", "outputType": "Text" } }
  ],
  "edges": [
    { "id": "e1", "source": "input-1", "sourceHandle": "input-1-value",
      "target": "upperCase-1", "targetHandle": "upperCase-1-text-in",
      "type": "smoothstep", "animated": true },
    { "id": "e2", "source": "upperCase-1", "sourceHandle": "upperCase-1-text-out",
      "target": "output-1", "targetHandle": null }
  ]
}"#;

#[allow(dead_code)]
pub fn uppercase_pipeline() -> Pipeline {
    Pipeline::from_json(UPPERCASE_PIPELINE_JSON).expect("fixture parses")
}

/// A bare node with the given data, for building graphs by hand.
#[allow(dead_code)]
pub fn node(id: &str, node_type: NodeType) -> Node {
    Node::new(id, node_type, Position::default())
}

/// A bare edge between two node ids, with anonymous handles.
#[allow(dead_code)]
pub fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge {
        id: id.to_string(),
        source: source.to_string(),
        source_handle: String::new(),
        target: target.to_string(),
        target_handle: String::new(),
        style: Default::default(),
        selected: false,
    }
}
