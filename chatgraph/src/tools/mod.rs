//! Tools callable by the agent: the [`Tool`] trait, the [`ToolRegistry`], and built-ins.
//!
//! Built-ins: [`CalculatorTool`], [`StockPriceTool`], [`SearchTool`]. Remote tools are wrapped
//! in [`McpToolAdapter`] by [`register_mcp_tools`].

mod calculator;
mod mcp_adapter;
mod registry;
mod schema;
mod search;
mod stock;

pub use calculator::CalculatorTool;
pub use mcp_adapter::{register_mcp_tools, McpToolAdapter};
pub use registry::{DuplicateToolWarning, ToolError, ToolRegistry};
pub use schema::validate_args;
pub use search::SearchTool;
pub use stock::StockPriceTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// One callable tool.
///
/// `call` may fail; the registry turns failures into `{"error": ...}` results so they never
/// abort a turn.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError>;
}

/// `{"error": message}` as a JSON string.
pub(crate) fn error_payload(message: impl Into<String>) -> String {
    serde_json::json!({ "error": message.into() }).to_string()
}

/// Truncates a string for logging, appending "..." if longer than max_len.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
