//! Transcript messages: system, user, assistant (optionally carrying tool calls) and tool results.
//!
//! Serialized with a `role` tag so checkpoints stay readable in the SQLite payload column.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structured request from the model to run a tool.
///
/// `id` links the request to the tool-result message that answers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON object with the tool arguments.
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single transcript entry.
///
/// **Interaction**: Stored in [`ChatState::messages`](crate::state::ChatState); rendered for the
/// model by [`LlmClient`](crate::llm::LlmClient) implementations and by the manual JSON mode
/// in [`ChatNode`](crate::agent::ChatNode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    #[serde(rename = "tool")]
    ToolResult {
        /// Id of the [`ToolCall`] this result answers.
        origin_tool_call_id: String,
        name: String,
        content: String,
    },
}

/// Role of a message, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Final (tool-free) assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        origin_tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            origin_tool_call_id: origin_tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::ToolResult { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::ToolResult { content, .. } => content,
        }
    }

    /// Tool calls carried by an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn origin_tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolResult {
                origin_tool_call_id,
                ..
            } => Some(origin_tool_call_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: Constructors set role and content; tool_calls is empty except on tool requests.
    #[test]
    fn constructors_set_role_and_content() {
        assert_eq!(Message::system("s").role(), Role::System);
        assert_eq!(Message::user("u").content(), "u");
        let a = Message::assistant("done");
        assert_eq!(a.role(), Role::Assistant);
        assert!(a.tool_calls().is_empty());

        let req = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("call_1", "calculator", json!({"operation": "add"}))],
        );
        assert_eq!(req.tool_calls().len(), 1);
        assert_eq!(req.tool_calls()[0].name, "calculator");
    }

    /// **Scenario**: Tool results expose the originating call id; other roles return None.
    #[test]
    fn tool_result_links_to_origin() {
        let r = Message::tool_result("call_7", "add", "7");
        assert_eq!(r.role(), Role::Tool);
        assert_eq!(r.origin_tool_call_id(), Some("call_7"));
        assert_eq!(Message::user("x").origin_tool_call_id(), None);
    }

    /// **Scenario**: Serialized form is tagged by role; tool results use role "tool".
    #[test]
    fn serde_uses_role_tag() {
        let v = serde_json::to_value(Message::tool_result("c1", "add", "7")).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["origin_tool_call_id"], "c1");

        let v = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(v["role"], "assistant");
        assert!(v.get("tool_calls").is_none());

        let back: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "hi"})).unwrap();
        assert_eq!(back, Message::assistant("hi"));
    }
}
