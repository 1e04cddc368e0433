//! Configuration for [`build_agent_context`](super::build_agent_context).
//!
//! Callers fill this from their own sources (env, flags); the library never reads the
//! environment itself.

use std::time::Duration;

/// One subprocess tool server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StdioServerConfig {
    /// Label used in logs.
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

/// One streamable-HTTP tool server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpServerConfig {
    /// Label used in logs.
    pub name: String,
    pub url: String,
    /// Extra headers sent with every request (e.g. an API key).
    pub headers: Vec<(String, String)>,
}

/// What to build for an agent run.
#[derive(Clone, Debug)]
pub struct AgentBuildConfig {
    /// SQLite database path. `None` keeps checkpoints in memory.
    pub db_path: Option<String>,
    pub stdio_servers: Vec<StdioServerConfig>,
    pub http_servers: Vec<HttpServerConfig>,
    /// Per-call timeout for remote tools.
    pub remote_timeout: Duration,
    /// Registers `calculator`.
    pub enable_calculator: bool,
    /// Registers `get_stock_price` when set.
    pub alphavantage_api_key: Option<String>,
    /// Overrides the Alpha Vantage endpoint.
    pub alphavantage_base_url: Option<String>,
    /// Registers `search`.
    pub enable_search: bool,
}

impl Default for AgentBuildConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            stdio_servers: Vec::new(),
            http_servers: Vec::new(),
            remote_timeout: Duration::from_secs(30),
            enable_calculator: true,
            alphavantage_api_key: None,
            alphavantage_base_url: None,
            enable_search: false,
        }
    }
}
