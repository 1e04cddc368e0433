//! Optional overrides for a run, usually built from command-line flags.
//!
//! Applied on top of the env-based config by [`RunConfig::apply_options`](super::RunConfig::apply_options).

use chatgraph::ToolCallMode;

/// Optional overrides: only set fields replace the values read from the environment.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Conversation thread to load and extend.
    pub thread_id: Option<String>,
    /// Native function calling or the manual JSON contract.
    pub mode: Option<ToolCallMode>,
    /// Tool dispatch limit per turn.
    pub max_tool_hops: Option<usize>,
    /// SQLite database path for checkpoints.
    pub db_path: Option<String>,
    /// Keep checkpoints in memory only (overrides `db_path`).
    pub ephemeral: bool,
    /// Sampling temperature (0–2).
    pub temperature: Option<f32>,
    pub verbose: bool,
}
