//! Per-type compute rule tests
//!
mod common;
use common::*;
use pipeflow::graph::Handle;
use pipeflow::nodes::date::{DateFormat, format_timestamp};
use pipeflow::nodes::llm::{LlmStatus, request_for};
use pipeflow::nodes::math::{MathOp, MathResult, Operand, evaluate, is_overridden, operand};
use pipeflow::nodes::output::displayed_value;
use pipeflow::nodes::random::RANDOM_UPPER_BOUND;
use pipeflow::nodes::{ComputeContext, coerce_number};
use pipeflow::pipeline::{completion_from_body, error_preview};
use pipeflow::prelude::*;
use serde_json::{Value, json};

fn compute(node: &Node) -> pipeflow::nodes::Derived {
    let registry = BehaviorRegistry::default();
    let behavior = registry.get(node.node_type).expect("behavior registered");
    behavior.compute(node, &ComputeContext { now: fixed_time() })
}

fn with_data(node_type: NodeType, data: Value) -> Node {
    let data = data.as_object().cloned().unwrap_or_default();
    Node::new(format!("{}-1", node_type), node_type, Position::default()).with_data(data)
}

fn handle_ids(node: &Node) -> Vec<String> {
    BehaviorRegistry::default()
        .get(node.node_type)
        .expect("behavior registered")
        .handles(node)
        .into_iter()
        .map(|h: Handle| h.id)
        .collect()
}

#[cfg(test)]
mod math_tests {
    use super::*;

    #[test]
    fn test_divide_by_zero_is_undefined() {
        assert_eq!(evaluate(4.0, 0.0, MathOp::Divide), MathResult::Undefined);
        assert_eq!(evaluate(4.0, 2.0, MathOp::Divide), MathResult::Number(2.0));
        assert_eq!(MathResult::Undefined.to_value(), Value::Null);
        assert_eq!(MathResult::Undefined.to_string(), "∞");
    }

    #[test]
    fn test_operators() {
        assert_eq!(evaluate(7.0, 2.0, MathOp::Add), MathResult::Number(9.0));
        assert_eq!(evaluate(7.0, 2.0, MathOp::Subtract), MathResult::Number(5.0));
        assert_eq!(evaluate(7.0, 2.0, MathOp::Multiply), MathResult::Number(14.0));
        assert_eq!(MathOp::parse("divide"), Some(MathOp::Divide));
        assert_eq!(MathOp::parse("mul"), Some(MathOp::Multiply));
        assert_eq!(MathOp::parse("pow"), None);
    }

    #[test]
    fn test_non_numeric_operands_coerce_to_zero() {
        assert_eq!(coerce_number(&json!("abc")), 0.0);
        assert_eq!(coerce_number(&json!(" 2.5 ")), 2.5);
        assert_eq!(coerce_number(&json!(true)), 1.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!([1])), 0.0);
    }

    #[test]
    fn test_override_disables_local_literal() {
        let node = with_data(
            NodeType::Math,
            json!({"localA": "10", "localB": "3", "op": "sub", "inputA": 1}),
        );
        assert!(is_overridden(&node, Operand::A));
        assert!(!is_overridden(&node, Operand::B));
        assert_eq!(operand(&node, Operand::A), MathResult::Number(1.0));
        assert_eq!(operand(&node, Operand::B), MathResult::Number(3.0));

        let derived = compute(&node);
        assert_eq!(derived.self_patch.get("result"), Some(&json!(-2)));
        let push = derived.push.expect("math pushes");
        assert_eq!(push.patch().get("result"), Some(&json!(-2)));
        assert_eq!(push.patch().get("value"), Some(&json!(-2)));
    }

    #[test]
    fn test_unknown_operator_yields_zero() {
        let node = with_data(NodeType::Math, json!({"localA": "5", "localB": "5", "op": "pow"}));
        assert_eq!(compute(&node).self_patch.get("result"), Some(&json!(0)));
    }

    #[test]
    fn test_bound_sentinel_still_overrides() {
        let node = with_data(
            NodeType::Math,
            json!({"localA": "7", "localB": "1", "op": "add", "inputA": null}),
        );
        assert!(is_overridden(&node, Operand::A));
        assert_eq!(operand(&node, Operand::A), MathResult::Undefined);
        assert_eq!(compute(&node).self_patch.get("result"), Some(&Value::Null));

        // An unbound null literal is just a non-numeric local value.
        let local = with_data(NodeType::Math, json!({"localA": null, "localB": "1"}));
        assert!(!is_overridden(&local, Operand::A));
        assert_eq!(operand(&local, Operand::A), MathResult::Number(0.0));
    }

    #[test]
    fn test_division_by_zero_stores_null_sentinel() {
        let node = with_data(NodeType::Math, json!({"localA": "4", "localB": "0", "op": "div"}));
        assert_eq!(compute(&node).self_patch.get("result"), Some(&Value::Null));
    }
}

#[cfg(test)]
mod behavior_tests {
    use super::*;

    #[test]
    fn test_initial_data_defaults() {
        let registry = BehaviorRegistry::default();
        let input = registry.get(NodeType::Input).unwrap().initial_data("input-3");
        assert_eq!(input.get("inputName"), Some(&json!("input-3")));
        assert_eq!(input.get("inputType"), Some(&json!("Text")));

        let text = registry.get(NodeType::Text).unwrap().initial_data("text-1");
        assert_eq!(text.get("text"), Some(&json!("{{input}}")));

        let llm = registry.get(NodeType::LlmCall).unwrap().initial_data("llmCall-1");
        assert_eq!(llm.get("model"), Some(&json!("gpt-4o")));
        assert_eq!(llm.get("system"), Some(&json!("You are a helpful assistant.")));
        assert_eq!(llm.get("status"), Some(&json!("idle")));

        let random = registry.get(NodeType::RandomNumber).unwrap().initial_data("r");
        let n = random.get("n").and_then(Value::as_i64).unwrap();
        assert!((0..RANDOM_UPPER_BOUND).contains(&n));

        for node_type in NodeType::ALL {
            assert!(registry.get(node_type).is_some(), "{} has no behavior", node_type);
        }
    }

    #[test]
    fn test_text_handles_follow_template() {
        let node = with_data(NodeType::Text, json!({"text": "{{b}} {{a}} {{b}}"}));
        assert_eq!(
            handle_ids(&node),
            vec!["text-1-var-b", "text-1-var-a", "text-1-out"]
        );

        let derived = compute(&node);
        assert_eq!(derived.self_patch.get("variables"), Some(&json!(["b", "a"])));
        assert_eq!(
            derived.push.unwrap().patch().get("template"),
            Some(&json!("{{b}} {{a}} {{b}}"))
        );
    }

    #[test]
    fn test_text_renders_bound_variables() {
        let node = with_data(NodeType::Text, json!({"text": "Hi {{name}}", "var:name": "Ada"}));
        assert_eq!(compute(&node).self_patch.get("rendered"), Some(&json!("Hi Ada")));
    }

    #[test]
    fn test_upper_case_prefers_upstream_input() {
        let local = with_data(NodeType::UpperCase, json!({"text": "local"}));
        assert_eq!(compute(&local).self_patch.get("output"), Some(&json!("LOCAL")));

        let bound = with_data(NodeType::UpperCase, json!({"text": "local", "input": "x"}));
        let derived = compute(&bound);
        assert_eq!(derived.self_patch.get("output"), Some(&json!("X")));
        assert_eq!(derived.push.unwrap().typed_key, "output");
    }

    #[test]
    fn test_input_pushes_its_name() {
        let node = with_data(NodeType::Input, json!({"inputName": "hello"}));
        let push = compute(&node).push.unwrap();
        assert_eq!(push.patch().get("name"), Some(&json!("hello")));
        assert_eq!(push.patch().get("value"), Some(&json!("hello")));
    }

    #[test]
    fn test_random_pushes_its_number() {
        let node = with_data(NodeType::RandomNumber, json!({"n": 42}));
        let push = compute(&node).push.unwrap();
        assert_eq!(push.patch().get("result"), Some(&json!(42)));
    }

    #[test]
    fn test_output_is_terminal() {
        let node = with_data(NodeType::Output, json!({"value": "x"}));
        assert!(compute(&node).push.is_none());
        assert_eq!(handle_ids(&node), vec!["output-1-value"]);
    }

    #[test]
    fn test_llm_pushes_only_after_a_response() {
        let idle = with_data(NodeType::LlmCall, json!({"response": ""}));
        assert!(compute(&idle).push.is_none());

        let done = with_data(NodeType::LlmCall, json!({"response": "hi", "status": "success"}));
        assert_eq!(LlmStatus::of(&done), LlmStatus::Success);
        assert_eq!(
            compute(&done).push.unwrap().patch().get("completion"),
            Some(&json!("hi"))
        );
    }

    #[test]
    fn test_llm_request_falls_back_to_defaults() {
        let node = with_data(NodeType::LlmCall, json!({"prompt": "Say hi"}));
        let request = request_for(&node);
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.system, "You are a helpful assistant.");
        assert_eq!(request.prompt, "Say hi");
    }

    #[test]
    fn test_bound_field_falls_back_to_single_input() {
        let registry = BehaviorRegistry::default();
        let output = with_data(NodeType::Output, json!({}));
        assert_eq!(registry.bound_field(&output, ""), Some("value".to_string()));

        let math = with_data(NodeType::Math, json!({}));
        assert_eq!(registry.bound_field(&math, "math-1-input-b"), Some("inputB".to_string()));
        assert_eq!(registry.bound_field(&math, ""), None);
    }
}

#[cfg(test)]
mod date_tests {
    use super::*;

    #[test]
    fn test_iso_format() {
        assert_eq!(
            format_timestamp(fixed_time(), DateFormat::Iso),
            "2024-03-05T14:07:09.123Z"
        );
    }

    #[test]
    fn test_locale_format_shape() {
        let formatted = format_timestamp(fixed_time(), DateFormat::Locale);
        assert!(formatted.contains("/2024, "), "unexpected: {}", formatted);
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
    }

    #[test]
    fn test_unknown_format_falls_back_to_iso() {
        assert_eq!(DateFormat::parse("weird"), DateFormat::Iso);
        let node = with_data(NodeType::Date, json!({"format": "weird"}));
        assert_eq!(
            compute(&node).self_patch.get("value"),
            Some(&json!("2024-03-05T14:07:09.123Z"))
        );
    }
}

#[cfg(test)]
mod output_tests {
    use super::*;

    #[test]
    fn test_no_value_is_distinct_from_falsy_values() {
        let empty = with_data(NodeType::Output, json!({}));
        assert!(OutputDisplay::of(&empty).is_empty());
        assert_eq!(OutputDisplay::of(&empty).to_string(), "—");

        for (value, shown) in [(json!(0), "0"), (json!(""), ""), (json!(false), "false")] {
            let node = with_data(NodeType::Output, json!({ "value": value }));
            assert_eq!(OutputDisplay::of(&node).to_string(), shown);
        }
    }

    #[test]
    fn test_result_is_shown_without_value() {
        let node = with_data(NodeType::Output, json!({"result": 2.5}));
        assert_eq!(displayed_value(&node), Some(&json!(2.5)));
        assert_eq!(OutputDisplay::of(&node).to_string(), "2.5");

        let undefined = with_data(NodeType::Output, json!({"value": null}));
        assert_eq!(OutputDisplay::of(&undefined).to_string(), "∞");
    }
}

#[cfg(test)]
mod payload_tests {
    use super::*;

    #[test]
    fn test_completion_field_precedence() {
        assert_eq!(completion_from_body(r#"{"text": "a", "response": "b"}"#), "a");
        assert_eq!(completion_from_body(r#"{"response": "b"}"#), "b");
        assert_eq!(completion_from_body("plain words"), "plain words");
    }

    #[test]
    fn test_error_preview_is_capped() {
        let body = "x".repeat(1000);
        assert_eq!(error_preview(&body).chars().count(), 400);
        assert_eq!(error_preview(r#"{ "detail" : "bad" }"#), r#"{"detail":"bad"}"#);
    }
}
