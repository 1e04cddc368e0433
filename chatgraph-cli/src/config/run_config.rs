//! Run config: model endpoint, tool-call mode, hop limit, thread, checkpoints and tool servers.
//! Filled from env / .env by [`RunConfig::from_env`].

use std::time::Duration;

use chatgraph::agent_builder::{HttpServerConfig, StdioServerConfig};
use chatgraph::{AgentBuildConfig, ChatRunnerConfig, ToolCallMode, ToolChoiceMode, DEFAULT_MAX_TOOL_HOPS};

use super::RunOptions;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Thread used when neither `THREAD_ID` nor `--thread-id` is given.
pub const DEFAULT_THREAD_ID: &str = "default";
/// Checkpoint database used when `DB_PATH` is not set.
pub const DEFAULT_DB_PATH: &str = "chatbot.db";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct RunConfig {
    /// OpenAI-compatible API base, e.g. `https://api.openai.com/v1` or `http://localhost:11434/v1`.
    pub api_base: String,
    /// API key. Local servers such as Ollama accept any value, so it may be unset.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    /// Only sent in native mode.
    pub tool_choice: Option<ToolChoiceMode>,
    pub mode: ToolCallMode,
    pub max_tool_hops: usize,
    pub thread_id: String,
    /// SQLite path; `None` keeps checkpoints in memory.
    pub db_path: Option<String>,
    /// Command of a stdio tool server, e.g. `arith-server`.
    pub mcp_stdio_cmd: Option<String>,
    pub mcp_stdio_args: Vec<String>,
    /// URL of a streamable-HTTP tool server.
    pub mcp_http_url: Option<String>,
    pub remote_timeout: Duration,
    pub alphavantage_api_key: Option<String>,
    pub enable_search: bool,
    pub verbose: bool,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> bool {
    env_opt(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn invalid(message: String) -> Error {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidInput, message))
}

impl RunConfig {
    /// Fill config from env vars. Call `dotenv::dotenv().ok()` first to pick up `.env`.
    ///
    /// All variables are optional. `TOOL_CALL_MODE` (native|json) and `MAX_TOOL_HOPS` are
    /// rejected when present but unparsable; `OPENAI_TEMPERATURE` is ignored in that case.
    pub fn from_env() -> Result<Self, Error> {
        let mode = match env_opt("TOOL_CALL_MODE") {
            Some(m) => m.parse::<ToolCallMode>().map_err(invalid)?,
            None => ToolCallMode::default(),
        };
        let max_tool_hops = match env_opt("MAX_TOOL_HOPS") {
            Some(n) => n
                .trim()
                .parse()
                .map_err(|_| invalid(format!("MAX_TOOL_HOPS must be a non-negative integer, got '{}'", n)))?,
            None => DEFAULT_MAX_TOOL_HOPS,
        };
        let remote_timeout = env_opt("MCP_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS);

        Ok(Self {
            api_base: env_opt("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: env_opt("OPENAI_API_KEY"),
            model: env_opt("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: env_opt("OPENAI_TEMPERATURE").and_then(|s| s.parse().ok()),
            tool_choice: env_opt("OPENAI_TOOL_CHOICE").and_then(|s| s.parse().ok()),
            mode,
            max_tool_hops,
            thread_id: env_opt("THREAD_ID").unwrap_or_else(|| DEFAULT_THREAD_ID.to_string()),
            db_path: Some(env_opt("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            mcp_stdio_cmd: env_opt("MCP_STDIO_CMD"),
            mcp_stdio_args: env_opt("MCP_STDIO_ARGS")
                .map(|a| a.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            mcp_http_url: env_opt("MCP_HTTP_URL"),
            remote_timeout: Duration::from_secs(remote_timeout),
            alphavantage_api_key: env_opt("ALPHAVANTAGE_API_KEY"),
            enable_search: env_flag("ENABLE_SEARCH"),
            verbose: false,
        })
    }

    /// Apply the set fields of `options` to this config.
    pub fn apply_options(&mut self, options: &RunOptions) {
        if let Some(t) = &options.thread_id {
            self.thread_id = t.clone();
        }
        if let Some(m) = options.mode {
            self.mode = m;
        }
        if let Some(h) = options.max_tool_hops {
            self.max_tool_hops = h;
        }
        if options.db_path.is_some() {
            self.db_path = options.db_path.clone();
        }
        if options.ephemeral {
            self.db_path = None;
        }
        if let Some(t) = options.temperature {
            self.temperature = Some(t);
        }
        self.verbose = options.verbose;
    }

    /// Registry/checkpointer config for [`chatgraph::build_agent_context`].
    pub fn to_agent_build_config(&self) -> AgentBuildConfig {
        let stdio_servers = self
            .mcp_stdio_cmd
            .iter()
            .map(|cmd| StdioServerConfig {
                name: "stdio".to_string(),
                command: cmd.clone(),
                args: self.mcp_stdio_args.clone(),
            })
            .collect();
        let http_servers = self
            .mcp_http_url
            .iter()
            .map(|url| HttpServerConfig {
                name: "http".to_string(),
                url: url.clone(),
                headers: Vec::new(),
            })
            .collect();
        AgentBuildConfig {
            db_path: self.db_path.clone(),
            stdio_servers,
            http_servers,
            remote_timeout: self.remote_timeout,
            alphavantage_api_key: self.alphavantage_api_key.clone(),
            enable_search: self.enable_search,
            ..Default::default()
        }
    }

    pub fn to_runner_config(&self) -> ChatRunnerConfig {
        ChatRunnerConfig {
            mode: self.mode,
            max_tool_hops: self.max_tool_hops,
            ..Default::default()
        }
    }

    /// One line per setting, printed to stderr with `--verbose`.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("model: {} @ {}", self.model, self.api_base),
            format!("mode: {:?}, max_tool_hops: {}", self.mode, self.max_tool_hops),
            format!("thread: {}", self.thread_id),
            format!(
                "checkpoints: {}",
                self.db_path.as_deref().unwrap_or("in memory")
            ),
        ];
        if let Some(cmd) = &self.mcp_stdio_cmd {
            lines.push(format!("stdio tools: {} {}", cmd, self.mcp_stdio_args.join(" ")));
        }
        if let Some(url) = &self.mcp_http_url {
            lines.push(format!("http tools: {}", url));
        }
        lines.join("\n")
    }
}
