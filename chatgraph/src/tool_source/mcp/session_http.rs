//! Tool-server session over streamable HTTP: POST one JSON-RPC message per request.
//!
//! Sends `Accept: application/json, text/event-stream`, the `MCP-Protocol-Version` header and,
//! once the server assigns one, `MCP-Session-Id`. Responses may be plain JSON or an SSE stream
//! whose `data:` lines carry JSON-RPC messages. The handshake runs lazily before the first request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::jsonrpc::{
    initialize_params, JsonRpcIncoming, JsonRpcNotification, JsonRpcRequest, PROTOCOL_VERSION,
};
use crate::tool_source::ToolSourceError;

/// Handshake state shared by all requests of the session.
#[derive(Default)]
struct HttpSessionState {
    initialized: bool,
    session_id: Option<String>,
}

/// Streamable-HTTP session.
///
/// **Interaction**: Owned by [`McpToolSource`](super::McpToolSource).
pub struct McpHttpSession {
    client: Client,
    url: String,
    /// Extra headers (e.g. API keys) sent on every request.
    headers: Vec<(String, String)>,
    next_id: AtomicU64,
    state: Mutex<HttpSessionState>,
}

fn transport_error(e: reqwest::Error) -> ToolSourceError {
    if e.is_timeout() {
        ToolSourceError::RemoteTimeout(e.to_string())
    } else {
        ToolSourceError::Transport(e.to_string())
    }
}

/// Picks the response with `id` out of a JSON or SSE body.
fn parse_response_body(body: &str, id: u64) -> Result<JsonRpcIncoming, ToolSourceError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed)
            .map_err(|e| ToolSourceError::Transport(format!("response json: {}", e)));
    }
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let Ok(msg) = serde_json::from_str::<JsonRpcIncoming>(data.trim()) else {
            continue;
        };
        if !msg.is_server_message() && msg.numeric_id() == Some(id) {
            return Ok(msg);
        }
    }
    Err(ToolSourceError::Transport(format!(
        "no response with id {} in event stream",
        id
    )))
}

impl McpHttpSession {
    /// Creates a session for `url`. No network traffic until the first request.
    pub fn new(
        url: impl Into<String>,
        headers: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
        timeout: Duration,
    ) -> Result<Self, ToolSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            next_id: AtomicU64::new(1),
            state: Mutex::new(HttpSessionState::default()),
        })
    }

    fn post(&self, body: Vec<u8>, session_id: Option<&str>) -> RequestBuilder {
        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header("MCP-Protocol-Version", PROTOCOL_VERSION)
            .body(body);
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(sid) = session_id {
            req = req.header("MCP-Session-Id", sid);
        }
        req
    }

    /// POSTs one request and returns the `result` of the matching response.
    async fn send(
        &self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<(Value, Option<String>), ToolSourceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = serde_json::to_vec(&JsonRpcRequest::new(id, method, params))
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let resp = self
            .post(body, session_id)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        let assigned = resp
            .headers()
            .get("MCP-Session-Id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        if status == StatusCode::NOT_FOUND && session_id.is_some() {
            return Err(ToolSourceError::Disconnected("session expired".into()));
        }
        let text = resp.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(ToolSourceError::Transport(format!(
                "{} HTTP {}: {}",
                method,
                status,
                if text.is_empty() { "no body" } else { &text }
            )));
        }
        let msg = parse_response_body(&text, id)?;
        if let Some(err) = msg.error {
            return Err(ToolSourceError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok((msg.result.unwrap_or(Value::Null), assigned))
    }

    /// Runs initialize + notifications/initialized and records the session id.
    async fn initialize(&self, state: &mut HttpSessionState) -> Result<(), ToolSourceError> {
        let (_, assigned) = self.send("initialize", initialize_params(), None).await?;
        state.session_id = assigned;

        let body = serde_json::to_vec(&JsonRpcNotification::new("notifications/initialized", None))
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let resp = self
            .post(body, state.session_id.as_deref())
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        if status != StatusCode::ACCEPTED && !status.is_success() {
            return Err(ToolSourceError::Transport(format!(
                "notifications/initialized HTTP {}",
                status
            )));
        }
        state.initialized = true;
        debug!(url = %self.url, session_id = ?state.session_id, "http tool server initialized");
        Ok(())
    }

    /// Sends a request, performing the handshake first when the session is not initialized.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ToolSourceError> {
        let session_id = {
            let mut state = self.state.lock().await;
            if !state.initialized {
                self.initialize(&mut state).await?;
            }
            state.session_id.clone()
        };
        let outcome = self.send(method, params, session_id.as_deref()).await;
        if let Err(ToolSourceError::Disconnected(_) | ToolSourceError::RemoteTimeout(_)) = &outcome {
            let mut state = self.state.lock().await;
            *state = HttpSessionState::default();
        }
        outcome.map(|(result, _)| result)
    }

    /// Forgets the session; the next request handshakes again.
    pub async fn shutdown(&self) {
        *self.state.lock().await = HttpSessionState::default();
    }
}
