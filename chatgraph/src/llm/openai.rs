//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Works against any OpenAI-compatible endpoint, including a local Ollama server's `/v1`
//! (set the base URL through [`ChatOpenAI::with_config`]). When tools are passed to `invoke`
//! they are sent as function tools and native `tool_calls` are returned.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
        ToolChoiceOptions,
    },
    Client,
};

use super::ToolChoiceMode;

fn build_error(e: impl std::fmt::Display) -> AgentError {
    AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
}

/// OpenAI-compatible chat client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config via
/// `ChatOpenAI::with_config`.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    tool_choice: Option<ToolChoiceMode>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self::from_client(Client::new(), model)
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self::from_client(Client::with_config(config), model)
    }

    fn from_client(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            tool_choice: None,
        }
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set tool choice mode. Only sent when tools are present.
    pub fn with_tool_choice(mut self, mode: ToolChoiceMode) -> Self {
        self.tool_choice = Some(mode);
        self
    }

    /// Converts the transcript to request messages, keeping tool calls and tool results linked.
    fn messages_to_request(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        messages
            .iter()
            .map(|m| {
                Ok(match m {
                    Message::System { content } => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage::from(content.as_str()),
                    ),
                    Message::User { content } => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage::from(content.as_str()),
                    ),
                    Message::Assistant {
                        content,
                        tool_calls,
                    } => {
                        let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                        if !content.is_empty() || tool_calls.is_empty() {
                            args.content(content.clone());
                        }
                        if !tool_calls.is_empty() {
                            let calls = tool_calls
                                .iter()
                                .map(|c| {
                                    ChatCompletionMessageToolCalls::Function(
                                        ChatCompletionMessageToolCall {
                                            id: c.id.clone(),
                                            function: FunctionCall {
                                                name: c.name.clone(),
                                                arguments: c.arguments.to_string(),
                                            },
                                        },
                                    )
                                })
                                .collect::<Vec<_>>();
                            args.tool_calls(calls);
                        }
                        ChatCompletionRequestMessage::Assistant(args.build().map_err(build_error)?)
                    }
                    Message::ToolResult {
                        origin_tool_call_id,
                        content,
                        ..
                    } => ChatCompletionRequestMessage::Tool(
                        ChatCompletionRequestToolMessageArgs::default()
                            .content(content.clone())
                            .tool_call_id(origin_tool_call_id.clone())
                            .build()
                            .map_err(build_error)?,
                    ),
                })
            })
            .collect()
    }

    fn tools_to_request(tools: &[ToolSpec]) -> Vec<ChatCompletionTools> {
        tools
            .iter()
            .map(|t| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObject {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: Some(t.input_schema.clone()),
                        ..Default::default()
                    },
                })
            })
            .collect()
    }
}

/// Parses a native tool call's argument string; non-JSON arguments are kept as a string value.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages)?);

        if !tools.is_empty() {
            args.tools(Self::tools_to_request(tools));
            if let Some(mode) = self.tool_choice {
                let opt = match mode {
                    ToolChoiceMode::Auto => ToolChoiceOptions::Auto,
                    ToolChoiceMode::None => ToolChoiceOptions::None,
                    ToolChoiceMode::Required => ToolChoiceOptions::Required,
                };
                args.tool_choice(ChatCompletionToolChoiceOption::Mode(opt));
            }
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args.build().map_err(build_error)?;
        debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "chat completion");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ModelUnavailable(format!("OpenAI API error: {}", e)))?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AgentError::ModelUnavailable("OpenAI returned no choices".to_string())
        })?;

        let msg = choice.message;
        let tool_calls: Vec<ToolCall> = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(f) => Some(ToolCall {
                    id: f.id,
                    name: f.function.name,
                    arguments: parse_arguments(&f.function.arguments),
                }),
                _ => None,
            })
            .collect();

        Ok(LlmResponse {
            content: msg.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: ChatOpenAI::with_config accepts a custom base URL (e.g. Ollama) and builder options.
    #[test]
    fn chat_openai_with_config_creates_client() {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("http://localhost:11434/v1");
        let _ = ChatOpenAI::with_config(config, "mistral:latest")
            .with_temperature(0.2)
            .with_tool_choice(ToolChoiceMode::Auto);
    }

    /// **Scenario**: Every transcript role converts, including tool calls and tool results.
    #[test]
    fn messages_convert_with_tool_linkage() {
        let messages = vec![
            Message::system("sys"),
            Message::user("add 3 and 4"),
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("call_1", "add", json!({"a": 3, "b": 4}))],
            ),
            Message::tool_result("call_1", "add", "7"),
            Message::assistant("7"),
        ];
        let converted = ChatOpenAI::messages_to_request(&messages).unwrap();
        assert_eq!(converted.len(), 5);
        assert!(matches!(converted[3], ChatCompletionRequestMessage::Tool(_)));
    }

    /// **Scenario**: Native argument strings parse to JSON; empty becomes {} and junk stays a string.
    #[test]
    fn parse_arguments_cases() {
        assert_eq!(parse_arguments(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_arguments("  "), json!({}));
        assert_eq!(parse_arguments("not json"), json!("not json"));
    }
}
