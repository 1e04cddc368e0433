//! System prompt for the manual JSON tool-call mode.

use serde_json::Value;

use crate::tool_source::ToolSpec;

const CONTRACT: &str = r#"You are a tool-using assistant.

You must respond ONLY in valid JSON, as exactly one object.

To call a tool:
{"tool": "<tool name>", "args": {<arguments>}}

To answer the user directly:
{"tool": null, "response": "<your answer>"}

Rules:
- NO extra text
- NO markdown
- ONLY JSON
- After a "Tool result:" message, either call another tool or answer using the result."#;

/// Argument names in a stable order: required ones first, as listed, then the rest.
fn argument_names(schema: &Value) -> Vec<String> {
    let mut names: Vec<String> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for key in props.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    names
}

/// Contract instructions followed by one line per tool: `- name(arg, ...): description`.
pub fn manual_json_system_prompt(tools: &[ToolSpec]) -> String {
    let mut prompt = String::from(CONTRACT);
    prompt.push_str("\n\nAvailable tools:\n");
    if tools.is_empty() {
        prompt.push_str("(none; always answer directly)\n");
    }
    for tool in tools {
        prompt.push_str(&format!(
            "- {}({})",
            tool.name,
            argument_names(&tool.input_schema).join(", ")
        ));
        if let Some(desc) = tool.description.as_deref().filter(|d| !d.is_empty()) {
            prompt.push_str(": ");
            prompt.push_str(desc);
        }
        prompt.push('\n');
    }
    prompt
}
