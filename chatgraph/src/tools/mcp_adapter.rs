//! Adapts tools discovered on a [`ToolSource`] into registry entries.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{Tool, ToolRegistry};
use crate::tool_source::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// One remote tool; calls are forwarded to the owning source.
pub struct McpToolAdapter {
    spec: ToolSpec,
    source: Arc<dyn ToolSource>,
}

impl McpToolAdapter {
    pub fn new(spec: ToolSpec, source: Arc<dyn ToolSource>) -> Self {
        Self { spec, source }
    }
}

#[async_trait]
impl Tool for McpToolAdapter {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        self.source.call_tool(&self.spec.name, args).await
    }
}

/// Lists the tools of `source` and registers an adapter for each.
///
/// Discovery failure is logged and contributes zero tools; it never fails the caller.
/// Returns the number of tools registered.
pub async fn register_mcp_tools(
    registry: &ToolRegistry,
    source: Arc<dyn ToolSource>,
    label: &str,
) -> usize {
    let specs = match source.list_tools().await {
        Ok(specs) => specs,
        Err(e) => {
            warn!(source = label, error = %e, "tool discovery failed; continuing without its tools");
            return 0;
        }
    };
    let count = specs.len();
    for spec in specs {
        registry.register(Arc::new(McpToolAdapter::new(spec, Arc::clone(&source))));
    }
    info!(source = label, count, "registered remote tools");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_source::MockToolSource;
    use serde_json::json;

    fn remote_add() -> MockToolSource {
        MockToolSource::new(
            vec![ToolSpec {
                name: "add".into(),
                description: Some("Add two integers".into()),
                input_schema: json!({
                    "type": "object",
                    "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
                    "required": ["a", "b"]
                }),
            }],
            "7",
        )
    }

    /// **Scenario**: Discovered tools are registered and calls reach the source.
    #[tokio::test]
    async fn registers_and_forwards() {
        let registry = ToolRegistry::new();
        let source = Arc::new(remote_add());
        let n = register_mcp_tools(&registry, source.clone(), "arith").await;
        assert_eq!(n, 1);
        let out = registry.invoke("add", json!({"a": 3, "b": 4})).await.unwrap();
        assert_eq!(out.text, "7");
        assert_eq!(source.call_count(), 1);
    }

    /// **Scenario**: A failing discovery contributes nothing and does not error.
    #[tokio::test]
    async fn failing_discovery_registers_nothing() {
        let registry = ToolRegistry::new();
        let source = Arc::new(remote_add().failing_discovery("connection refused"));
        assert_eq!(register_mcp_tools(&registry, source, "down").await, 0);
        assert!(registry.is_empty());
    }

    /// **Scenario**: Remote execution errors become {"error": ...} results via the registry.
    #[tokio::test]
    async fn remote_error_is_contained() {
        let registry = ToolRegistry::new();
        let source = Arc::new(remote_add().fail_with("add", "Division by zero is not allowed"));
        register_mcp_tools(&registry, source, "arith").await;
        let out = registry.invoke("add", json!({"a": 1, "b": 0})).await.unwrap();
        assert_eq!(out.text, r#"{"error":"Division by zero is not allowed"}"#);
    }
}
