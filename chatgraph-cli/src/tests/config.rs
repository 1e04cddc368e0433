//! Unit tests for [`RunConfig`](crate::config::RunConfig) and [`RunOptions`](crate::config::RunOptions).
//!
//! Tests that touch the environment hold a static lock so they do not race each other.

use std::sync::Mutex;
use std::time::Duration;

use chatgraph::ToolCallMode;

use crate::config::{RunConfig, RunOptions, DEFAULT_DB_PATH, DEFAULT_THREAD_ID};

static ENV_LOCK: std::sync::OnceLock<Mutex<()>> = std::sync::OnceLock::new();

const KEYS: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_API_BASE",
    "OPENAI_MODEL",
    "OPENAI_TEMPERATURE",
    "OPENAI_TOOL_CHOICE",
    "TOOL_CALL_MODE",
    "MAX_TOOL_HOPS",
    "THREAD_ID",
    "DB_PATH",
    "MCP_STDIO_CMD",
    "MCP_STDIO_ARGS",
    "MCP_HTTP_URL",
    "MCP_TIMEOUT_SECS",
    "ALPHAVANTAGE_API_KEY",
    "ENABLE_SEARCH",
];

/// Runs `f` with exactly `vars` set among [`KEYS`], then restores the previous environment.
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> =
        KEYS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
    for k in KEYS {
        std::env::remove_var(k);
    }
    for (k, v) in vars {
        std::env::set_var(k, v);
    }
    let result = f();
    for (k, v) in saved {
        match v {
            Some(v) => std::env::set_var(k, v),
            None => std::env::remove_var(k),
        }
    }
    result
}

/// **Scenario**: With nothing set, from_env succeeds with defaults (no API key required).
#[test]
fn from_env_defaults() {
    let config = with_env(&[], RunConfig::from_env).unwrap();
    assert_eq!(config.api_base, "https://api.openai.com/v1");
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.api_key, None);
    assert_eq!(config.mode, ToolCallMode::Native);
    assert_eq!(config.max_tool_hops, chatgraph::DEFAULT_MAX_TOOL_HOPS);
    assert_eq!(config.thread_id, DEFAULT_THREAD_ID);
    assert_eq!(config.db_path.as_deref(), Some(DEFAULT_DB_PATH));
    assert_eq!(config.remote_timeout, Duration::from_secs(30));
    assert!(!config.enable_search);
    assert!(config.mcp_stdio_cmd.is_none() && config.mcp_http_url.is_none());
}

/// **Scenario**: Every supported variable is read.
#[test]
fn from_env_reads_all_variables() {
    let config = with_env(
        &[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://localhost:11434/v1"),
            ("OPENAI_MODEL", "llama3.1"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("TOOL_CALL_MODE", "json"),
            ("MAX_TOOL_HOPS", "3"),
            ("THREAD_ID", "work"),
            ("DB_PATH", "/tmp/chat.db"),
            ("MCP_STDIO_CMD", "arith-server"),
            ("MCP_STDIO_ARGS", "--quiet  --x 1"),
            ("MCP_HTTP_URL", "http://localhost:8000/mcp"),
            ("MCP_TIMEOUT_SECS", "5"),
            ("ALPHAVANTAGE_API_KEY", "demo"),
            ("ENABLE_SEARCH", "true"),
        ],
        RunConfig::from_env,
    )
    .unwrap();
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.api_base, "http://localhost:11434/v1");
    assert_eq!(config.model, "llama3.1");
    assert_eq!(config.temperature, Some(0.2));
    assert_eq!(config.mode, ToolCallMode::ManualJson);
    assert_eq!(config.max_tool_hops, 3);
    assert_eq!(config.thread_id, "work");
    assert_eq!(config.db_path.as_deref(), Some("/tmp/chat.db"));
    assert_eq!(config.mcp_stdio_cmd.as_deref(), Some("arith-server"));
    assert_eq!(config.mcp_stdio_args, vec!["--quiet", "--x", "1"]);
    assert_eq!(config.remote_timeout, Duration::from_secs(5));
    assert!(config.enable_search);

    let build = config.to_agent_build_config();
    assert_eq!(build.stdio_servers.len(), 1);
    assert_eq!(build.stdio_servers[0].command, "arith-server");
    assert_eq!(build.http_servers[0].url, "http://localhost:8000/mcp");
    assert_eq!(build.alphavantage_api_key.as_deref(), Some("demo"));
    assert!(build.enable_calculator);

    let runner = config.to_runner_config();
    assert_eq!(runner.mode, ToolCallMode::ManualJson);
    assert_eq!(runner.max_tool_hops, 3);
}

/// **Scenario**: Unparsable TOOL_CALL_MODE or MAX_TOOL_HOPS is an error naming the variable.
#[test]
fn from_env_rejects_bad_values() {
    let err = with_env(&[("TOOL_CALL_MODE", "xml")], RunConfig::from_env).unwrap_err();
    assert!(err.to_string().contains("tool call mode"), "{}", err);

    let err = with_env(&[("MAX_TOOL_HOPS", "-1")], RunConfig::from_env).unwrap_err();
    assert!(err.to_string().contains("MAX_TOOL_HOPS"), "{}", err);
}

/// **Scenario**: Set options override env values; unset ones leave them alone.
#[test]
fn apply_options_overrides_set_fields() {
    let mut config = with_env(&[("THREAD_ID", "env-thread"), ("MAX_TOOL_HOPS", "5")], RunConfig::from_env).unwrap();
    config.apply_options(&RunOptions {
        thread_id: Some("cli-thread".into()),
        mode: Some(ToolCallMode::ManualJson),
        verbose: true,
        ..Default::default()
    });
    assert_eq!(config.thread_id, "cli-thread");
    assert_eq!(config.mode, ToolCallMode::ManualJson);
    assert_eq!(config.max_tool_hops, 5);
    assert!(config.verbose);
    assert!(config.summary().contains("thread: cli-thread"));

    config.apply_options(&RunOptions {
        ephemeral: true,
        ..Default::default()
    });
    assert_eq!(config.db_path, None);
    assert!(config.summary().contains("checkpoints: in memory"));
}
