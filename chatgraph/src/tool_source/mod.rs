//! Tool sources: something that can list tools and execute them by name.
//!
//! Implemented by [`MockToolSource`] for tests and by [`McpToolSource`] for remote tool servers
//! (stdio subprocess or streamable HTTP).

mod mock;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use mock::MockToolSource;

#[cfg(feature = "mcp")]
pub use mcp::{McpToolSource, StdioServerParams};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool descriptor: name, optional description and JSON schema of the arguments.
///
/// `input_schema` is the object schema advertised to the model; the registry validates
/// arguments against its `required` list and `properties.<name>.type` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Value,
}

/// Text content returned by a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Error from listing or calling tools on a source.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    /// No tool with this name in the source.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// Arguments rejected before the call.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Could not reach the source (spawn failure, HTTP error, broken pipe).
    #[error("transport error: {0}")]
    Transport(String),
    /// The remote call did not answer within the configured timeout.
    #[error("remote timeout: {0}")]
    RemoteTimeout(String),
    /// The session was torn down (timeout, protocol desync, process exit); the next call reconnects.
    #[error("disconnected: {0}")]
    Disconnected(String),
    /// The server answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The tool ran and reported a failure.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// Lists and executes tools.
///
/// **Interaction**: Remote sources are adapted into the registry by
/// [`register_mcp_tools`](crate::tools::register_mcp_tools).
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError>;
}
