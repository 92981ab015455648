//! Graph store, id allocation and topology tests
//!
mod common;
use common::*;
use pipeflow::graph::{EdgeChange, IdAllocator, NodeChange, Topology};
use pipeflow::prelude::*;
use serde_json::json;

#[cfg(test)]
mod id_tests {
    use super::*;

    #[test]
    fn test_allocate_increments_per_type() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(NodeType::Input), "input-1");
        assert_eq!(ids.allocate(NodeType::Input), "input-2");
        assert_eq!(ids.allocate(NodeType::Math), "math-1");
        assert_eq!(ids.allocate(NodeType::Input), "input-3");
        assert_eq!(ids.peek(NodeType::Math), 1);
        assert_eq!(ids.peek(NodeType::Output), 0);
    }

    #[test]
    fn test_loaded_ids_are_never_reissued() {
        let store = GraphStore::from_parts(
            vec![node("text-7", NodeType::Text), node("custom", NodeType::Text)],
            vec![],
        );
        let mut ids = store.ids().clone();
        assert_eq!(ids.allocate(NodeType::Text), "text-8");
    }

    #[test]
    fn test_added_ids_are_never_reissued() {
        let mut store = GraphStore::new();
        assert!(store.add_node(node("input-1", NodeType::Math)));
        store.apply_node_changes(&[NodeChange::Add {
            item: node("text-4", NodeType::Text),
        }]);
        assert_eq!(store.allocate_id(NodeType::Input), "input-2");
        assert_eq!(store.allocate_id(NodeType::Text), "text-5");
        assert_eq!(store.allocate_id(NodeType::Math), "math-1");
    }

    #[test]
    fn test_create_node_never_reuses_an_existing_id() {
        let mut engine = engine();
        engine.add_node(node("input-1", NodeType::Math));
        let created = add(&mut engine, NodeType::Input);
        assert_eq!(created, "input-2");
        assert_eq!(engine.store().node_count(), 2);
        assert_eq!(engine.node(&created).unwrap().node_type, NodeType::Input);
        assert_eq!(engine.node("input-1").unwrap().node_type, NodeType::Math);
    }

    #[test]
    fn test_node_type_spellings() {
        assert_eq!("upperCase".parse::<NodeType>(), Ok(NodeType::UpperCase));
        assert_eq!("upper".parse::<NodeType>(), Ok(NodeType::UpperCase));
        assert_eq!("rand".parse::<NodeType>(), Ok(NodeType::RandomNumber));
        assert_eq!("llm".parse::<NodeType>(), Ok(NodeType::LlmCall));
        assert!("sum".parse::<NodeType>().is_err());
        assert_eq!(NodeType::RandomNumber.to_string(), "randomNumber");
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;

    fn chain() -> GraphStore {
        GraphStore::from_parts(
            vec![
                node("a", NodeType::Input),
                node("b", NodeType::UpperCase),
                node("c", NodeType::Output),
            ],
            vec![edge("ab", "a", "b"), edge("bc", "b", "c")],
        )
    }

    #[test]
    fn test_remove_nodes_cascades_to_edges() {
        let mut store = chain();
        let removed = store.remove_nodes(&["b"]);
        assert_eq!(removed, vec!["b".to_string()]);
        assert!(store
            .edges()
            .iter()
            .all(|e| e.source != "b" && e.target != "b"));
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn test_remove_nodes_ignores_malformed_input() {
        let mut store = chain();
        assert!(store.remove_nodes_value(&json!("b")).is_empty());
        assert!(store.remove_nodes_value(&json!({"id": "b"})).is_empty());
        assert_eq!(store.node_count(), 3);

        let removed = store.remove_nodes_value(&json!(["a", "missing"]));
        assert_eq!(removed, vec!["a".to_string()]);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_remove_selected() {
        let mut store = chain();
        store.apply_node_changes(&[NodeChange::Select {
            id: "c".to_string(),
            selected: true,
        }]);
        assert_eq!(store.remove_selected(), vec!["c".to_string()]);
        assert_eq!(store.edge_count(), 1);
        assert!(store.remove_selected().is_empty());
    }

    #[test]
    fn test_update_node_data_merges() {
        let mut store = chain();
        let mut first = NodeData::new();
        first.insert("x".to_string(), json!(1));
        let mut second = NodeData::new();
        second.insert("y".to_string(), json!(2));

        assert!(store.update_node_data("a", &first));
        assert!(store.update_node_data("a", &second));
        let data = &store.node("a").unwrap().data;
        assert_eq!(data.get("x"), Some(&json!(1)));
        assert_eq!(data.get("y"), Some(&json!(2)));

        assert!(!store.update_node_data("missing", &first));
    }

    #[test]
    fn test_connect_decorates_and_deduplicates() {
        let mut store = GraphStore::from_parts(
            vec![node("a", NodeType::Input), node("b", NodeType::Output)],
            vec![],
        );
        let connection = Connection::new("a", "a-value", "b", "b-value");
        let id = store.connect(&connection).unwrap();
        assert_eq!(id, "edge-aa-value-bb-value");

        let edge = &store.edges()[0];
        assert_eq!(edge.style.kind, "smoothstep");
        assert!(edge.style.animated);
        assert_eq!(edge.style.marker_end.as_ref().unwrap().width, "20px");

        assert_eq!(store.connect(&connection).unwrap(), id);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_connect_to_missing_node_fails() {
        let mut store = GraphStore::from_parts(vec![node("a", NodeType::Input)], vec![]);
        let err = store
            .connect(&Connection::new("a", "a-value", "ghost", "ghost-value"))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::NodeNotFound {
                missing_node_id: "ghost".to_string(),
                source_node_id: "a".to_string(),
            }
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_add_node_with_existing_id_is_ignored() {
        let mut store = chain();
        assert!(!store.add_node(node("a", NodeType::Math)));
        assert_eq!(store.node("a").unwrap().node_type, NodeType::Input);
    }

    #[test]
    fn test_node_changes_remove_cascades() {
        let mut store = chain();
        let removed = store.apply_node_changes(&[
            NodeChange::Position {
                id: "a".to_string(),
                position: Some(Position::new(5.0, 6.0)),
            },
            NodeChange::Remove { id: "c".to_string() },
            NodeChange::Remove { id: "c".to_string() },
        ]);
        assert_eq!(removed, vec!["c".to_string()]);
        assert_eq!(store.node("a").unwrap().position, Position::new(5.0, 6.0));
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_edge_changes_drop_dangling_adds() {
        let mut store = chain();
        store.apply_edge_changes(&[
            EdgeChange::Remove { id: "ab".to_string() },
            EdgeChange::Add { item: edge("ax", "a", "ghost") },
            EdgeChange::Add { item: edge("ac", "a", "c") },
        ]);
        let ids: Vec<&str> = store.edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["bc", "ac"]);
    }

    #[test]
    fn test_loading_drops_edges_with_missing_endpoints() {
        let store = GraphStore::from_parts(
            vec![node("a", NodeType::Input)],
            vec![edge("ax", "a", "x")],
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_pipeline_json_accepts_null_handles() {
        let pipeline = uppercase_pipeline();
        assert_eq!(pipeline.nodes.len(), 3);
        assert_eq!(pipeline.edges[1].target_handle, "");
        assert_eq!(pipeline.edges[0].style.kind, "smoothstep");

        let json = pipeline.to_json().unwrap();
        assert!(json.contains("\"sourceHandle\":\"input-1-value\""));
        assert!(json.contains("\"type\":\"upperCase\""));
    }
}

#[cfg(test)]
mod topology_tests {
    use super::*;

    #[test]
    fn test_order_respects_dependencies() {
        let nodes = vec![
            node("c", NodeType::Output),
            node("b", NodeType::UpperCase),
            node("a", NodeType::Input),
        ];
        let edges = vec![edge("ab", "a", "b"), edge("bc", "b", "c")];
        let topology = Topology::new(&nodes, &edges);
        assert_eq!(topology.full_order().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(topology.reachable_from("b"), vec!["b", "c"]);
        assert!(topology.reachable_from("ghost").is_empty());
    }

    #[test]
    fn test_cycle_is_reported() {
        let nodes = vec![
            node("a", NodeType::Input),
            node("b", NodeType::Math),
            node("c", NodeType::Math),
        ];
        let edges = vec![
            edge("ab", "a", "b"),
            edge("bc", "b", "c"),
            edge("cb", "c", "b"),
        ];
        let topology = Topology::new(&nodes, &edges);
        assert!(!topology.is_acyclic());
        assert_eq!(topology.full_order().unwrap_err(), vec!["b", "c"]);
        // The acyclic prefix on its own still orders.
        assert_eq!(topology.order(&["a"]).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_long_chain_is_checked_without_recursion() {
        let len = 200_000;
        let nodes: Vec<Node> = (0..len)
            .map(|i| node(&format!("math-{}", i), NodeType::Math))
            .collect();
        let mut edges: Vec<Edge> = (1..len)
            .map(|i| {
                edge(
                    &format!("e{}", i),
                    &format!("math-{}", i - 1),
                    &format!("math-{}", i),
                )
            })
            .collect();
        assert!(Topology::new(&nodes, &edges).is_acyclic());

        edges.push(edge("back", &format!("math-{}", len - 1), "math-0"));
        let all: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let cycle = Topology::new(&nodes, &edges).find_cycle(&all).unwrap();
        assert_eq!(cycle.len(), len);
        assert_eq!(cycle[0], "math-0");
    }

    #[test]
    fn test_empty_graph_is_acyclic() {
        let topology = Topology::new(&[], &[]);
        assert!(topology.is_acyclic());
        assert!(topology.full_order().unwrap().is_empty());
    }
}
