//! Chat node: show the transcript to the model and append its reply.
//!
//! The reply becomes either a final assistant message or an assistant message carrying tool calls.
//! Calls are checked against the registry here, so anything that reaches the tool node names a
//! registered tool with schema-valid arguments. A reply that fails the check is kept as a final
//! answer echoing the raw content.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::{LlmClient, LlmResponse};
use crate::message::{Message, ToolCall};
use crate::state::ChatState;
use crate::tool_source::ToolSpec;
use crate::tools::ToolRegistry;

use super::parse::{parse_model_output, ParsedOutput};
use super::prompt::manual_json_system_prompt;
use super::{ToolCallMode, NODE_CHAT};

/// Chat node.
///
/// **Interaction**: Implements `Node<ChatState>`; reads tool specs from [`ToolRegistry`],
/// calls the [`LlmClient`], writes one assistant message. Followed by
/// [`RouteNode`](super::RouteNode).
pub struct ChatNode {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    mode: ToolCallMode,
    system_prompt: Option<String>,
}

impl ChatNode {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>, mode: ToolCallMode) -> Self {
        Self {
            llm,
            registry,
            mode,
            system_prompt: None,
        }
    }

    /// Extra system instructions sent before the transcript on every call; never stored.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    /// Messages sent to the model for this call.
    ///
    /// Manual mode has no tool role: tool results go back as user text and tool requests as the
    /// JSON the model is expected to write.
    fn render(&self, messages: &[Message], tools: &[ToolSpec]) -> Vec<Message> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        match self.mode {
            ToolCallMode::Native => {
                if let Some(p) = &self.system_prompt {
                    out.push(Message::system(p.clone()));
                }
                out.extend(messages.iter().cloned());
            }
            ToolCallMode::ManualJson => {
                let mut system = manual_json_system_prompt(tools);
                if let Some(p) = &self.system_prompt {
                    system.push('\n');
                    system.push_str(p);
                }
                out.push(Message::system(system));
                for m in messages {
                    out.push(match m {
                        Message::ToolResult { content, .. } => {
                            Message::user(format!("Tool result: {}", content))
                        }
                        Message::Assistant {
                            content,
                            tool_calls,
                        } if content.is_empty() && !tool_calls.is_empty() => {
                            Message::assistant(render_calls(tool_calls))
                        }
                        Message::Assistant { content, .. } => Message::assistant(content.clone()),
                        other => other.clone(),
                    });
                }
            }
        }
        out
    }

    fn manual_reply(&self, state: &ChatState, text: String) -> Message {
        match parse_model_output(&text) {
            ParsedOutput::FinalAnswer(answer) => Message::assistant(answer),
            ParsedOutput::Malformed(raw) => {
                debug!("model output is not a contract object; using it as the answer");
                Message::assistant(raw)
            }
            ParsedOutput::ToolRequest { name, args } => match self.registry.check(&name, &args) {
                Ok(_) => {
                    let id = format!("call_{}", state.messages().len());
                    Message::assistant_with_tool_calls(text, vec![ToolCall::new(id, name, args)])
                }
                Err(e) => {
                    warn!(error = %e, "tool request rejected; using raw output as the answer");
                    Message::assistant(text)
                }
            },
        }
    }

    fn native_reply(&self, state: &ChatState, response: LlmResponse) -> Message {
        if response.tool_calls.is_empty() {
            return Message::assistant(response.content);
        }
        for call in &response.tool_calls {
            if let Err(e) = self.registry.check(&call.name, &call.arguments) {
                warn!(error = %e, "tool request rejected; using raw output as the answer");
                let raw = if response.content.trim().is_empty() {
                    render_calls(&response.tool_calls)
                } else {
                    response.content
                };
                return Message::assistant(raw);
            }
        }
        let base = state.messages().len();
        let calls = response
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                if c.id.is_empty() {
                    c.id = format!("call_{}_{}", base, i);
                }
                c
            })
            .collect();
        Message::assistant_with_tool_calls(response.content, calls)
    }
}

/// Tool calls as contract JSON, one object per line.
fn render_calls(calls: &[ToolCall]) -> String {
    calls
        .iter()
        .map(|c| json!({ "tool": c.name, "args": c.arguments }).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Node<ChatState> for ChatNode {
    fn id(&self) -> &str {
        NODE_CHAT
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let tools = self.registry.specs();
        let request = self.render(state.messages(), &tools);
        let offered: &[ToolSpec] = match self.mode {
            ToolCallMode::Native => &tools[..],
            ToolCallMode::ManualJson => &[],
        };
        let response = self.llm.invoke(&request, offered).await?;

        let reply = match self.mode {
            ToolCallMode::Native => self.native_reply(&state, response),
            ToolCallMode::ManualJson => self.manual_reply(&state, response.content),
        };
        debug!(
            thread_id = %state.thread_id,
            tool_calls = reply.tool_calls().len(),
            "model replied"
        );
        let mut state = state;
        state.push(reply);
        Ok((state, Next::Continue))
    }
}
