//! Tool loops within a single turn.

use std::sync::Arc;

use chatgraph::{
    LlmResponse, Message, MockLlm, Role, ToolCall, ToolCallMode, MAX_TOOL_HOPS_EXCEEDED,
};
use serde_json::json;

use super::common::{config, memory_runner};

const MOD_REQUEST: &str =
    r#"{"tool": "calculator", "args": {"first_num": 132354, "second_num": 23, "operation": "mod"}}"#;

/// **Scenario**: Native mode: the model requests a modulus, sees the result and answers with it.
#[tokio::test]
async fn modulus_native_round_trip() {
    let llm = Arc::new(MockLlm::from_fn(|messages, tools| {
        assert!(tools.iter().any(|t| t.name == "calculator"));
        match messages.last() {
            Some(Message::ToolResult { content, .. }) => {
                let v: serde_json::Value = serde_json::from_str(content).unwrap();
                Ok(LlmResponse::text(format!("132354 mod 23 = {}", v["result"])))
            }
            _ => Ok(LlmResponse::with_tool_calls(vec![ToolCall::new(
                "call_mod",
                "calculator",
                json!({"first_num": 132354, "second_num": 23, "operation": "mod"}),
            )])),
        }
    }));
    let runner = memory_runner(llm.clone(), config(ToolCallMode::Native, 8));

    let outcome = runner.run_turn("t1", "What is 132354 mod 23?").await.unwrap();
    assert_eq!(outcome.answer, "132354 mod 23 = 12");

    let roles: Vec<Role> = outcome.state.messages().iter().map(Message::role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
    assert_eq!(outcome.state.messages()[2].origin_tool_call_id(), Some("call_mod"));
    assert!(outcome.state.check_tool_linkage().is_ok());
    assert_eq!(llm.call_count(), 2);
}

/// **Scenario**: Manual JSON mode runs the same loop from text replies.
#[tokio::test]
async fn modulus_manual_json_round_trip() {
    let llm = Arc::new(MockLlm::texts([
        MOD_REQUEST,
        r#"{"tool": null, "response": "The remainder is 12."}"#,
    ]));
    let runner = memory_runner(llm.clone(), config(ToolCallMode::ManualJson, 8));

    let outcome = runner.run_turn("t1", "What is 132354 mod 23?").await.unwrap();
    assert_eq!(outcome.answer, "The remainder is 12.");
    assert_eq!(outcome.state.messages()[2].content(), r#"{"result":12}"#);

    let second_call = &llm.seen_messages()[1];
    assert_eq!(
        second_call.last(),
        Some(&Message::user(r#"Tool result: {"result":12}"#))
    );
}

/// **Scenario**: Division by zero comes back to the model as an error result, not a failure.
#[tokio::test]
async fn tool_domain_error_reaches_model() {
    let llm = Arc::new(MockLlm::texts([
        r#"{"tool": "calculator", "args": {"first_num": 1, "second_num": 0, "operation": "div"}}"#,
        r#"{"tool": null, "response": "You cannot divide by zero."}"#,
    ]));
    let runner = memory_runner(llm, config(ToolCallMode::ManualJson, 8));
    let outcome = runner.run_turn("t1", "1/0").await.unwrap();
    assert_eq!(outcome.state.messages()[2].content(), r#"{"error":"Division by zero"}"#);
    assert_eq!(outcome.answer, "You cannot divide by zero.");
}

/// **Scenario**: Malformed output and unknown tools end the turn with the raw text.
#[tokio::test]
async fn fail_safe_endings() {
    for raw in [
        "Sure, the answer is 12.",
        r#"{"tool": "weather", "args": {"city": "Oslo"}}"#,
    ] {
        let runner = memory_runner(Arc::new(MockLlm::texts([raw])), config(ToolCallMode::ManualJson, 8));
        let outcome = runner.run_turn("t1", "hi").await.unwrap();
        assert_eq!(outcome.answer, raw);
        assert_eq!(outcome.state.messages().len(), 2);
    }
}

/// **Scenario**: A model that always requests a tool stops after exactly max_tool_hops dispatches.
#[tokio::test]
async fn hop_guard_stops_after_limit() {
    let llm = Arc::new(MockLlm::from_fn(|_, _| Ok(LlmResponse::text(MOD_REQUEST))));
    let runner = memory_runner(llm.clone(), config(ToolCallMode::ManualJson, 3));

    let outcome = runner.run_turn("t1", "loop forever").await.unwrap();
    assert!(outcome.answer.starts_with(MAX_TOOL_HOPS_EXCEEDED), "{}", outcome.answer);
    assert_eq!(outcome.state.turn.hops, 3);

    let executed = outcome
        .state
        .messages()
        .iter()
        .filter(|m| m.role() == Role::Tool && m.content().contains("\"result\""))
        .count();
    assert_eq!(executed, 3);
    assert_eq!(llm.call_count(), 4);
    assert!(outcome.state.check_tool_linkage().is_ok());
}

/// **Scenario**: With a hop limit of zero no tool runs at all.
#[tokio::test]
async fn hop_guard_zero() {
    let llm = Arc::new(MockLlm::texts([MOD_REQUEST]));
    let runner = memory_runner(llm, config(ToolCallMode::ManualJson, 0));
    let outcome = runner.run_turn("t1", "mod please").await.unwrap();
    assert!(outcome.answer.starts_with(MAX_TOOL_HOPS_EXCEEDED));
    assert_eq!(outcome.state.turn.hops, 0);
}

/// **Scenario**: Follow-up turns see the earlier exchange.
#[tokio::test]
async fn multi_turn_context() {
    let llm = Arc::new(MockLlm::texts([
        r#"{"tool": null, "response": "Hi Ada."}"#,
        r#"{"tool": null, "response": "Your name is Ada."}"#,
    ]));
    let runner = memory_runner(llm.clone(), config(ToolCallMode::ManualJson, 8));
    runner.run_turn("t1", "My name is Ada.").await.unwrap();
    let outcome = runner.run_turn("t1", "What is my name?").await.unwrap();
    assert_eq!(outcome.answer, "Your name is Ada.");

    let seen = &llm.seen_messages()[1];
    // system prompt, two stored messages, new user message
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[1], Message::user("My name is Ada."));
}
