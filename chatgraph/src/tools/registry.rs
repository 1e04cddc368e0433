//! Tool registry: name → tool, with schema validation and failure containment.
//!
//! Reads take a snapshot (`Arc` of the map) so lookups never block on a concurrent
//! registration; writers replace the whole map.

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::{error_payload, schema, truncate_for_log, Tool};
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// Routing error: the call never reached a tool implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("UnknownTool: no tool named '{0}'")]
    UnknownTool(String),
    #[error("SchemaMismatch: {tool}: {reason}")]
    SchemaMismatch { tool: String, reason: String },
}

/// Returned (and logged) when a registration shadows an existing tool of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateToolWarning {
    pub name: String,
}

impl fmt::Display for DuplicateToolWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DuplicateToolWarning: tool '{}' re-registered; the newest registration wins",
            self.name
        )
    }
}

type ToolMap = HashMap<String, Arc<dyn Tool>>;

/// Name → tool mapping shared by the whole agent.
///
/// **Interaction**: Filled by [`build_agent_context`](crate::agent_builder::build_agent_context);
/// read by [`ChatNode`](crate::agent::ChatNode) (specs, validation) and
/// [`ToolNode`](crate::agent::ToolNode) (invoke).
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Arc<ToolMap>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Arc<ToolMap> {
        let guard = self.tools.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Registers `tool` under its name. Last write wins: an existing tool with the same name is
    /// shadowed, and the returned warning says so.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Option<DuplicateToolWarning> {
        let name = tool.name().to_string();
        let mut guard = self.tools.write().unwrap_or_else(|e| e.into_inner());
        let mut next = ToolMap::clone(&guard);
        let replaced = next.insert(name.clone(), tool).is_some();
        *guard = Arc::new(next);
        drop(guard);

        if replaced {
            let warning = DuplicateToolWarning { name };
            warn!(tool = %warning.name, "{}", warning);
            Some(warning)
        } else {
            debug!(tool = %name, "tool registered");
            None
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.snapshot()
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors of all tools, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.snapshot().values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Resolves `name` and validates `args` against its schema.
    pub fn check(&self, name: &str, args: &Value) -> Result<Arc<dyn Tool>, ToolError> {
        let tool = self.resolve(name)?;
        schema::validate_args(&tool.spec().input_schema, args).map_err(|reason| {
            ToolError::SchemaMismatch {
                tool: name.to_string(),
                reason,
            }
        })?;
        Ok(tool)
    }

    /// Runs a tool.
    ///
    /// `UnknownTool` and `SchemaMismatch` are returned before anything runs. Once the tool runs,
    /// this never fails: an error or a panic from the implementation comes back as an
    /// `{"error": "<message>"}` result.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<ToolCallContent, ToolError> {
        let tool = self.check(name, &args)?;
        let outcome = AssertUnwindSafe(tool.call(args)).catch_unwind().await;
        let content = match outcome {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                warn!(tool = name, error = %e, "tool failed");
                let message = match e {
                    ToolSourceError::Execution(msg) => msg,
                    other => other.to_string(),
                };
                ToolCallContent {
                    text: error_payload(message),
                }
            }
            Err(_) => {
                warn!(tool = name, "tool panicked");
                ToolCallContent {
                    text: error_payload(format!("tool '{}' panicked", name)),
                }
            }
        };
        trace!(tool = name, result = %truncate_for_log(&content.text, 200), "tool result");
        Ok(content)
    }
}
