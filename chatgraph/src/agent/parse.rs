//! Strict parser for the manual JSON tool-call contract.
//!
//! A model without native function calling answers with exactly one JSON object:
//! `{"tool": "<name>", "args": {...}}` to request a tool, or `{"tool": null, "response": "<text>"}`
//! to answer. Anything else is [`ParsedOutput::Malformed`], which callers treat as a final answer
//! carrying the raw text.

use serde_json::{Map, Value};

/// Typed reading of one model output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    FinalAnswer(String),
    ToolRequest { name: String, args: Value },
    Malformed(String),
}

impl ParsedOutput {
    /// Final text for outputs that end the turn; `None` for tool requests.
    ///
    /// `Malformed` downgrades to its raw text.
    pub fn final_text(&self) -> Option<&str> {
        match self {
            Self::FinalAnswer(text) | Self::Malformed(text) => Some(text),
            Self::ToolRequest { .. } => None,
        }
    }
}

/// Parses `text` against the contract. Surrounding whitespace is ignored; prose, markdown fences
/// or trailing data make the output malformed.
pub fn parse_model_output(text: &str) -> ParsedOutput {
    let malformed = || ParsedOutput::Malformed(text.to_string());

    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(text.trim()) else {
        return malformed();
    };

    match obj.get("tool") {
        Some(Value::Null) => match obj.get("response") {
            Some(Value::String(s)) => ParsedOutput::FinalAnswer(s.clone()),
            Some(Value::Null) | None => malformed(),
            Some(other) => ParsedOutput::FinalAnswer(other.to_string()),
        },
        Some(Value::String(name)) if !name.trim().is_empty() => match obj.get("args") {
            None | Some(Value::Null) => ParsedOutput::ToolRequest {
                name: name.clone(),
                args: Value::Object(Map::new()),
            },
            Some(args @ Value::Object(_)) => ParsedOutput::ToolRequest {
                name: name.clone(),
                args: args.clone(),
            },
            Some(_) => malformed(),
        },
        _ => malformed(),
    }
}
