//! Tool node: run every pending tool call and append the results.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::ChatState;
use crate::tools::{error_payload, ToolRegistry};

use super::NODE_INVOKE_TOOL;

/// Tool node.
///
/// Calls from one assistant message run concurrently; results are appended in request order,
/// each linked to its call by `origin_tool_call_id`. Every call gets a result: routing errors
/// and tool failures are written as `{"error": ...}`. One dispatch counts as one hop.
///
/// **Interaction**: Implements `Node<ChatState>`; invokes tools through [`ToolRegistry`].
pub struct ToolNode {
    registry: Arc<ToolRegistry>,
}

impl ToolNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Node<ChatState> for ToolNode {
    fn id(&self) -> &str {
        NODE_INVOKE_TOOL
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let calls = state.pending_tool_calls().to_vec();
        if calls.is_empty() {
            return Ok((state, Next::Continue));
        }

        let results = join_all(calls.iter().map(|call| async move {
            match self.registry.invoke(&call.name, call.arguments.clone()).await {
                Ok(content) => content.text,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool call not dispatched");
                    error_payload(e.to_string())
                }
            }
        }))
        .await;

        let mut state = state;
        for (call, content) in calls.into_iter().zip(results) {
            state.push(Message::tool_result(call.id, call.name, content));
        }
        state.turn.hops += 1;
        debug!(thread_id = %state.thread_id, hops = state.turn.hops, "tool hop complete");
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use serde_json::{json, Value};

    use crate::message::ToolCall;
    use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
    use crate::tools::{CalculatorTool, Tool};

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "slow".into(),
                description: None,
                input_schema: json!({"type": "object", "properties": {"tag": {"type": "string"}}}),
            }
        }
        async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(ToolCallContent {
                text: args["tag"].as_str().unwrap_or_default().to_string(),
            })
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let r = ToolRegistry::new();
        r.register(Arc::new(CalculatorTool::new()));
        r.register(Arc::new(SlowTool));
        Arc::new(r)
    }

    /// **Scenario**: Results are linked by id, kept in request order, and count one hop.
    #[tokio::test]
    async fn results_in_request_order() {
        let mut s = ChatState::new("t1");
        s.push(Message::assistant_with_tool_calls(
            "",
            vec![
                ToolCall::new("a", "calculator", json!({"first_num": 132354, "second_num": 23, "operation": "mod"})),
                ToolCall::new("b", "calculator", json!({"first_num": 1, "second_num": 0, "operation": "div"})),
                ToolCall::new("c", "missing", json!({})),
            ],
        ));
        let (state, next) = ToolNode::new(registry()).run(s).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(state.turn.hops, 1);
        let results: Vec<(&str, &str)> = state.messages()[1..]
            .iter()
            .map(|m| (m.origin_tool_call_id().unwrap(), m.content()))
            .collect();
        assert_eq!(results[0], ("a", r#"{"result":12}"#));
        assert_eq!(results[1], ("b", r#"{"error":"Division by zero"}"#));
        assert_eq!(results[2].0, "c");
        assert!(results[2].1.contains("UnknownTool"));
        assert!(state.check_tool_linkage().is_ok());
    }

    /// **Scenario**: Calls in one step run concurrently.
    #[tokio::test]
    async fn calls_run_concurrently() {
        let mut s = ChatState::new("t1");
        s.push(Message::assistant_with_tool_calls(
            "",
            vec![
                ToolCall::new("1", "slow", json!({"tag": "first"})),
                ToolCall::new("2", "slow", json!({"tag": "second"})),
                ToolCall::new("3", "slow", json!({"tag": "third"})),
            ],
        ));
        let started = Instant::now();
        let (state, _) = ToolNode::new(registry()).run(s).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(550));
        let contents: Vec<&str> = state.messages()[1..].iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }
}
