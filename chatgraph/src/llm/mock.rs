//! Scripted LLM client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;
use crate::tool_source::ToolSpec;

use super::{LlmClient, LlmResponse};

type ResponderFn = dyn Fn(&[Message], &[ToolSpec]) -> Result<LlmResponse, AgentError> + Send + Sync;

enum Script {
    Queue(Mutex<VecDeque<Result<LlmResponse, String>>>),
    Responder(Box<ResponderFn>),
}

/// Mock LLM: pops scripted responses in order, or computes them from the transcript.
///
/// Every call records the messages it saw, so tests can assert on what the model was shown.
/// An exhausted queue or a scripted `Err` yields `AgentError::ModelUnavailable`.
pub struct MockLlm {
    script: Script,
    delay: Option<Duration>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Responses returned in order, one per call.
    pub fn scripted(responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        Self::new(Script::Queue(Mutex::new(
            responses.into_iter().map(Ok).collect(),
        )))
    }

    /// Plain-text responses returned in order (manual JSON mode scripts).
    pub fn texts<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::scripted(texts.into_iter().map(LlmResponse::text))
    }

    /// Always fails as an unreachable backend would.
    pub fn unavailable(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_, _| Err(AgentError::ModelUnavailable(message.clone())))
    }

    /// Response computed from the messages and tools of each call.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[Message], &[ToolSpec]) -> Result<LlmResponse, AgentError> + Send + Sync + 'static,
    {
        Self::new(Script::Responder(Box::new(f)))
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps before answering (for cancellation and concurrency tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Messages passed to each call, in call order.
    pub fn seen_messages(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        match &self.script {
            Script::Responder(f) => f(messages, tools),
            Script::Queue(queue) => {
                let next = queue
                    .lock()
                    .map_err(|e| AgentError::ModelUnavailable(e.to_string()))?
                    .pop_front();
                match next {
                    Some(Ok(r)) => Ok(r),
                    Some(Err(e)) => Err(AgentError::ModelUnavailable(e)),
                    None => Err(AgentError::ModelUnavailable("mock script exhausted".into())),
                }
            }
        }
    }
}
