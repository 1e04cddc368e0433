//! Configuration for the terminal front end.
//!
//! Re-exports [`RunConfig`], [`RunOptions`] and config [`Error`].

mod run_config;
mod run_options;

pub use run_config::{Error, RunConfig, DEFAULT_DB_PATH, DEFAULT_THREAD_ID};
pub use run_options::RunOptions;
