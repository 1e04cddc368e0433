//! Mock ToolSource for tests.
//!
//! Returns a fixed tool list and per-tool canned results; no server required.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Mock tool source: fixed tool list, canned results, and a call counter.
///
/// Tools without a canned result answer with `default_result`. A result registered with
/// [`fail_with`](Self::fail_with) makes the call return that error instead.
pub struct MockToolSource {
    tools: Vec<ToolSpec>,
    results: HashMap<String, Result<String, String>>,
    default_result: String,
    list_error: Option<String>,
    calls: AtomicUsize,
}

impl MockToolSource {
    pub fn new(tools: Vec<ToolSpec>, default_result: impl Into<String>) -> Self {
        Self {
            tools,
            results: HashMap::new(),
            default_result: default_result.into(),
            list_error: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// One tool `get_time` with an empty object schema returning a fixed time string.
    pub fn get_time_example() -> Self {
        Self::new(
            vec![ToolSpec {
                name: "get_time".to_string(),
                description: Some("Get current time.".to_string()),
                input_schema: json!({ "type": "object", "properties": {} }),
            }],
            "2025-01-29 12:00:00",
        )
    }

    pub fn with_result(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.results.insert(name.into(), Ok(text.into()));
        self
    }

    pub fn fail_with(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.results.insert(name.into(), Err(message.into()));
        self
    }

    /// Makes `list_tools` fail, as an unreachable server would.
    pub fn failing_discovery(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockToolSource {
    fn default() -> Self {
        Self::get_time_example()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        match &self.list_error {
            Some(msg) => Err(ToolSourceError::Transport(msg.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, _arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(ToolSourceError::NotFound(name.to_string()));
        }
        match self.results.get(name) {
            Some(Ok(text)) => Ok(ToolCallContent { text: text.clone() }),
            Some(Err(msg)) => Err(ToolSourceError::Execution(msg.clone())),
            None => Ok(ToolCallContent {
                text: self.default_result.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Default mock lists get_time and returns the fixed text.
    #[tokio::test]
    async fn default_lists_get_time() {
        let mock = MockToolSource::default();
        let tools = mock.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "get_time");
        let out = mock.call_tool("get_time", json!({})).await.unwrap();
        assert_eq!(out.text, "2025-01-29 12:00:00");
        assert_eq!(mock.call_count(), 1);
    }

    /// **Scenario**: Unknown names, canned failures and failing discovery surface as errors.
    #[tokio::test]
    async fn errors_surface() {
        let mock = MockToolSource::default().fail_with("get_time", "boom");
        assert!(matches!(
            mock.call_tool("nope", json!({})).await,
            Err(ToolSourceError::NotFound(_))
        ));
        assert!(matches!(
            mock.call_tool("get_time", json!({})).await,
            Err(ToolSourceError::Execution(ref m)) if m == "boom"
        ));
        let mock = MockToolSource::default().failing_discovery("refused");
        assert!(mock.list_tools().await.is_err());
    }
}
