//! Builds the tool registry, checkpointer and remote tool sources from [`AgentBuildConfig`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::{ChatRunner, ChatRunnerConfig};
use crate::graph::CompilationError;
use crate::llm::LlmClient;
use crate::memory::{CheckpointError, Checkpointer, MemorySaver};
use crate::state::ChatState;
use crate::tools::{CalculatorTool, SearchTool, StockPriceTool, ToolRegistry};

#[cfg(feature = "mcp")]
use crate::tool_source::{McpToolSource, StdioServerParams, ToolSource};
#[cfg(feature = "mcp")]
use crate::tools::register_mcp_tools;

use super::config::AgentBuildConfig;

/// Error from building an agent context or runner.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("checkpointer: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("graph: {0}")]
    Compilation(#[from] CompilationError),
}

/// Everything a runner needs besides the model.
///
/// **Interaction**: Produced by [`build_agent_context`]; `registry` and `checkpointer` go into
/// [`ChatRunner::new`]. Call [`shutdown`](Self::shutdown) before exit to stop tool subprocesses.
pub struct AgentContext {
    pub registry: Arc<ToolRegistry>,
    pub checkpointer: Arc<dyn Checkpointer<ChatState>>,
    #[cfg(feature = "mcp")]
    pub remote_sources: Vec<Arc<McpToolSource>>,
}

impl AgentContext {
    /// Runner over this context's tools and checkpointer.
    pub fn runner(
        &self,
        llm: Arc<dyn LlmClient>,
        config: ChatRunnerConfig,
    ) -> Result<ChatRunner, CompilationError> {
        ChatRunner::new(
            llm,
            Arc::clone(&self.registry),
            Arc::clone(&self.checkpointer),
            config,
        )
    }

    /// Kills stdio tool servers and forgets HTTP sessions.
    pub async fn shutdown(&self) {
        #[cfg(feature = "mcp")]
        for source in &self.remote_sources {
            source.shutdown().await;
        }
    }
}

fn build_checkpointer(
    config: &AgentBuildConfig,
) -> Result<Arc<dyn Checkpointer<ChatState>>, CheckpointError> {
    match config.db_path.as_deref() {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            use crate::memory::{JsonSerializer, Serializer, SqliteSaver};
            let serializer: Arc<dyn Serializer<ChatState>> = Arc::new(JsonSerializer);
            info!(path, "using sqlite checkpoints");
            let saver = SqliteSaver::new(path, serializer)?;
            Ok(Arc::new(saver) as Arc<dyn Checkpointer<ChatState>>)
        }
        #[cfg(not(feature = "sqlite"))]
        Some(path) => {
            warn!(path, "sqlite feature disabled; checkpoints stay in memory");
            Ok(Arc::new(MemorySaver::<ChatState>::new()) as Arc<dyn Checkpointer<ChatState>>)
        }
        None => Ok(Arc::new(MemorySaver::<ChatState>::new()) as Arc<dyn Checkpointer<ChatState>>),
    }
}

fn register_builtin_tools(config: &AgentBuildConfig, registry: &ToolRegistry) {
    if config.enable_calculator {
        registry.register(Arc::new(CalculatorTool::new()));
    }
    if let Some(key) = config.alphavantage_api_key.as_deref() {
        let tool = match config.alphavantage_base_url.as_deref() {
            Some(base) => StockPriceTool::with_client(reqwest::Client::new(), base, key),
            None => StockPriceTool::new(key),
        };
        registry.register(Arc::new(tool));
    }
    if config.enable_search {
        registry.register(Arc::new(SearchTool::new()));
    }
}

#[cfg(feature = "mcp")]
async fn register_remote_tools(
    config: &AgentBuildConfig,
    registry: &ToolRegistry,
) -> Vec<Arc<McpToolSource>> {
    let mut sources = Vec::new();
    for server in &config.stdio_servers {
        let params = StdioServerParams::new(server.command.clone(), server.args.clone());
        sources.push(Arc::new(McpToolSource::stdio(
            server.name.clone(),
            params,
            config.remote_timeout,
        )));
    }
    for server in &config.http_servers {
        match McpToolSource::http(
            server.name.clone(),
            server.url.clone(),
            server.headers.clone(),
            config.remote_timeout,
        ) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => warn!(source = %server.name, error = %e, "skipping http tool server"),
        }
    }
    for source in &sources {
        let as_source: Arc<dyn ToolSource> = Arc::clone(source) as Arc<dyn ToolSource>;
        register_mcp_tools(registry, as_source, source.name()).await;
    }
    sources
}

/// Builds the registry (built-ins first, then each remote source), and the checkpointer.
///
/// A remote source that cannot be reached contributes no tools; it does not fail the build.
/// Remote tools registered later shadow built-ins of the same name.
pub async fn build_agent_context(config: &AgentBuildConfig) -> Result<AgentContext, BuildError> {
    let checkpointer = build_checkpointer(config)?;
    let registry = ToolRegistry::new();
    register_builtin_tools(config, &registry);

    #[cfg(feature = "mcp")]
    let remote_sources = register_remote_tools(config, &registry).await;
    #[cfg(not(feature = "mcp"))]
    if !config.stdio_servers.is_empty() || !config.http_servers.is_empty() {
        warn!("mcp feature disabled; remote tool servers ignored");
    }

    info!(tools = ?registry.names(), "agent context ready");
    Ok(AgentContext {
        registry: Arc::new(registry),
        checkpointer,
        #[cfg(feature = "mcp")]
        remote_sources,
    })
}

/// Builds the context and a runner over it with the given model.
pub async fn build_chat_runner(
    config: &AgentBuildConfig,
    llm: Arc<dyn LlmClient>,
    runner_config: ChatRunnerConfig,
) -> Result<(ChatRunner, AgentContext), BuildError> {
    let ctx = build_agent_context(config).await?;
    let runner = ctx.runner(llm, runner_config)?;
    Ok((runner, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolCallMode;
    use crate::llm::MockLlm;

    /// **Scenario**: Defaults give the calculator and an in-memory checkpointer.
    #[tokio::test]
    async fn default_context() {
        let ctx = build_agent_context(&AgentBuildConfig::default()).await.unwrap();
        assert_eq!(ctx.registry.names(), vec!["calculator"]);
        assert!(ctx.checkpointer.list_thread_ids().await.unwrap().is_empty());
    }

    /// **Scenario**: Optional built-ins are registered when enabled.
    #[tokio::test]
    async fn optional_builtins() {
        let config = AgentBuildConfig {
            alphavantage_api_key: Some("demo".into()),
            enable_search: true,
            ..Default::default()
        };
        let ctx = build_agent_context(&config).await.unwrap();
        assert_eq!(
            ctx.registry.names(),
            vec!["calculator", "get_stock_price", "search"]
        );
    }

    /// **Scenario**: An unreachable remote server is skipped; built-ins stay usable.
    #[cfg(feature = "mcp")]
    #[tokio::test]
    async fn unreachable_remote_is_isolated() {
        use crate::agent_builder::{HttpServerConfig, StdioServerConfig};
        let config = AgentBuildConfig {
            stdio_servers: vec![StdioServerConfig {
                name: "missing".into(),
                command: "/nonexistent/tool-server".into(),
                args: vec![],
            }],
            http_servers: vec![HttpServerConfig {
                name: "down".into(),
                url: "http://127.0.0.1:9/mcp".into(),
                headers: vec![],
            }],
            remote_timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let ctx = build_agent_context(&config).await.unwrap();
        assert_eq!(ctx.registry.names(), vec!["calculator"]);
        assert_eq!(ctx.remote_sources.len(), 2);
        ctx.shutdown().await;
    }

    /// **Scenario**: build_chat_runner wires the model to the built tools.
    #[tokio::test]
    async fn runner_from_config() {
        let llm = Arc::new(MockLlm::texts([
            r#"{"tool": "calculator", "args": {"first_num": 132354, "second_num": 23, "operation": "mod"}}"#,
            r#"{"tool": null, "response": "132354 mod 23 is 12"}"#,
        ]));
        let (runner, _ctx) = build_chat_runner(
            &AgentBuildConfig::default(),
            llm,
            ChatRunnerConfig {
                mode: ToolCallMode::ManualJson,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let outcome = runner.run_turn("t1", "What is 132354 mod 23?").await.unwrap();
        assert!(outcome.answer.contains("12"));
    }
}
