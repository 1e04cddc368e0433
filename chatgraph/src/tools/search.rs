use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::Tool;
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// Tool name for web search.
pub const TOOL_SEARCH: &str = "search";

/// DuckDuckGo instant-answer endpoint.
pub const DUCKDUCKGO_BASE_URL: &str = "https://api.duckduckgo.com";

/// Web search through the DuckDuckGo instant-answer API; the response body is passed through.
pub struct SearchTool {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTool {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new(), DUCKDUCKGO_BASE_URL)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        TOOL_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEARCH.to_string(),
            description: Some("Search the web and return the raw results.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query." }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolSourceError::InvalidInput("query must be a string".into()))?;
        debug!(query, "web search");

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let text = response
            .text()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        Ok(ToolCallContent { text })
    }
}
