//! Unit tests for chatgraph-cli, organized by module.
//!
//! - `config`: env loading and option overrides (serialized through an env lock)
//! - `run`: turns, the chat loop and thread listing driven by `MockLlm`

mod config;
