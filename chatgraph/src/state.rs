//! Conversation state carried through the chat graph.
//!
//! The transcript is append-only: nodes push new messages and never rewrite existing ones.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role, ToolCall};

/// Per-turn scratch data. Not persisted; reset whenever a state is loaded from a checkpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnScratch {
    /// Tool dispatch steps executed in the current turn.
    pub hops: usize,
}

/// State for one conversation thread.
///
/// **Interaction**: Flows through [`ChatNode`](crate::agent::ChatNode),
/// [`RouteNode`](crate::agent::RouteNode) and [`ToolNode`](crate::agent::ToolNode);
/// saved by a [`Checkpointer`](crate::memory::Checkpointer) at the end of each turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub thread_id: String,
    messages: Vec<Message>,
    #[serde(skip)]
    pub turn: TurnScratch,
}

impl ChatState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            turn: TurnScratch::default(),
        }
    }

    /// Appends one message to the transcript.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool calls of the last message when it is an assistant tool request.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.last_message().map(Message::tool_calls).unwrap_or(&[])
    }

    /// Content of the last assistant message without tool calls.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::Assistant && m.tool_calls().is_empty())
            .map(Message::content)
    }

    /// Returns the first tool-result whose origin id does not match any earlier tool request.
    pub fn check_tool_linkage(&self) -> Result<(), String> {
        let mut requested: Vec<&str> = Vec::new();
        for m in &self.messages {
            match m {
                Message::Assistant { tool_calls, .. } => {
                    requested.extend(tool_calls.iter().map(|c| c.id.as_str()));
                }
                Message::ToolResult {
                    origin_tool_call_id,
                    ..
                } => {
                    if !requested.contains(&origin_tool_call_id.as_str()) {
                        return Err(origin_tool_call_id.clone());
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: Pushing keeps order; pending_tool_calls only reflects the last message.
    #[test]
    fn push_preserves_order_and_pending_calls() {
        let mut s = ChatState::new("t1");
        s.push(Message::user("hi"));
        s.push(Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("call_1", "add", json!({"a": 1, "b": 2}))],
        ));
        assert_eq!(s.messages().len(), 2);
        assert_eq!(s.pending_tool_calls().len(), 1);

        s.push(Message::tool_result("call_1", "add", "3"));
        assert!(s.pending_tool_calls().is_empty());
        assert!(s.check_tool_linkage().is_ok());
    }

    /// **Scenario**: final_answer skips tool-request assistant messages.
    #[test]
    fn final_answer_is_last_plain_assistant() {
        let mut s = ChatState::new("t1");
        assert_eq!(s.final_answer(), None);
        s.push(Message::assistant("first"));
        s.push(Message::assistant_with_tool_calls(
            "thinking",
            vec![ToolCall::new("c", "x", json!({}))],
        ));
        assert_eq!(s.final_answer(), Some("first"));
    }

    /// **Scenario**: A tool result with an unknown origin id is reported.
    #[test]
    fn linkage_detects_orphan_result() {
        let mut s = ChatState::new("t1");
        s.push(Message::tool_result("nope", "add", "1"));
        assert_eq!(s.check_tool_linkage(), Err("nope".to_string()));
    }

    /// **Scenario**: Turn scratch is not serialized, so a reloaded state starts with zero hops.
    #[test]
    fn turn_scratch_is_not_persisted() {
        let mut s = ChatState::new("t1");
        s.turn.hops = 3;
        let bytes = serde_json::to_vec(&s).unwrap();
        let back: ChatState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.turn.hops, 0);
        assert_eq!(back.thread_id, "t1");
    }
}
