//! Remote tool servers speaking JSON-RPC (`initialize`, `tools/list`, `tools/call`).
//!
//! Two transports: a subprocess over stdio ([`McpStdioSession`]) and streamable HTTP
//! ([`McpHttpSession`]). [`McpToolSource`] hides the transport behind [`ToolSource`].

pub mod jsonrpc;
mod session_http;
mod session_stdio;

pub use session_http::McpHttpSession;
pub use session_stdio::{McpStdioSession, StdioServerParams};

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Default per-call timeout for remote tools.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on `tools/list` pages, against servers that keep returning a cursor.
const MAX_LIST_PAGES: usize = 32;

enum McpTransport {
    Stdio(McpStdioSession),
    Http(McpHttpSession),
}

/// Tool source backed by one remote tool server.
///
/// `list_tools` is fetched once and cached; [`refresh_tools`](Self::refresh_tools) drops the cache.
///
/// **Interaction**: Registered into the [`ToolRegistry`](crate::tools::ToolRegistry) through
/// [`register_mcp_tools`](crate::tools::register_mcp_tools).
pub struct McpToolSource {
    name: String,
    transport: McpTransport,
    tools: RwLock<Option<Vec<ToolSpec>>>,
}

impl McpToolSource {
    /// Source backed by a subprocess; spawned on first use.
    pub fn stdio(name: impl Into<String>, params: StdioServerParams, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            transport: McpTransport::Stdio(McpStdioSession::new(params, timeout)),
            tools: RwLock::new(None),
        }
    }

    /// Source backed by a streamable-HTTP endpoint.
    pub fn http(
        name: impl Into<String>,
        url: impl Into<String>,
        headers: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
        timeout: Duration,
    ) -> Result<Self, ToolSourceError> {
        Ok(Self {
            name: name.into(),
            transport: McpTransport::Http(McpHttpSession::new(url, headers, timeout)?),
            tools: RwLock::new(None),
        })
    }

    /// Label used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolSourceError> {
        match &self.transport {
            McpTransport::Stdio(s) => s.request(method, params).await,
            McpTransport::Http(s) => s.request(method, params).await,
        }
    }

    /// Clears the cached tool list; the next `list_tools` asks the server again.
    pub async fn refresh_tools(&self) {
        *self.tools.write().await = None;
    }

    /// Kills a stdio child / forgets an HTTP session.
    pub async fn shutdown(&self) {
        match &self.transport {
            McpTransport::Stdio(s) => s.shutdown().await,
            McpTransport::Http(s) => s.shutdown().await,
        }
    }

    async fn fetch_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;
            let page: Vec<ToolSpec> = serde_json::from_value(
                result.get("tools").cloned().unwrap_or_else(|| json!([])),
            )
            .map_err(|e| ToolSourceError::Transport(format!("tools/list result: {}", e)))?;
            tools.extend(page);
            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(String::from);
            if cursor.is_none() {
                break;
            }
        }
        debug!(source = %self.name, count = tools.len(), "listed remote tools");
        Ok(tools)
    }
}

/// Joins the text parts of a `tools/call` result; `isError: true` becomes an execution error.
fn call_result_to_content(result: &Value) -> Result<ToolCallContent, ToolSourceError> {
    let parts: Vec<String> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|c| match c.get("type").and_then(Value::as_str) {
                    Some("text") => c.get("text").and_then(Value::as_str).map(String::from),
                    _ => Some(c.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();
    let text = if parts.is_empty() {
        result
            .get("structuredContent")
            .map(Value::to_string)
            .unwrap_or_default()
    } else {
        parts.join("\n")
    };
    if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolSourceError::Execution(text));
    }
    Ok(ToolCallContent { text })
}

#[async_trait]
impl ToolSource for McpToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        if let Some(tools) = self.tools.read().await.as_ref() {
            return Ok(tools.clone());
        }
        let tools = self.fetch_tools().await?;
        *self.tools.write().await = Some(tools.clone());
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        call_result_to_content(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Text parts are joined; isError turns the text into an execution error.
    #[test]
    fn call_result_mapping() {
        let ok = json!({"content": [{"type": "text", "text": "7"}], "isError": false});
        assert_eq!(call_result_to_content(&ok).unwrap().text, "7");

        let err = json!({"content": [{"type": "text", "text": "Division by zero is not allowed"}], "isError": true});
        assert!(matches!(
            call_result_to_content(&err),
            Err(ToolSourceError::Execution(ref m)) if m == "Division by zero is not allowed"
        ));

        let structured = json!({"content": [], "structuredContent": {"result": 3}});
        assert_eq!(call_result_to_content(&structured).unwrap().text, r#"{"result":3}"#);
    }

    /// **Scenario**: Discovery against an unreachable HTTP endpoint fails without caching.
    #[tokio::test]
    async fn list_tools_failure_is_not_cached() {
        let source = McpToolSource::http(
            "down",
            "http://127.0.0.1:9/mcp",
            Vec::<(String, String)>::new(),
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(source.list_tools().await.is_err());
        assert!(source.tools.read().await.is_none());
        assert_eq!(source.name(), "down");
    }
}
