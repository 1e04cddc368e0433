//! Model client from [`RunConfig`].

use std::sync::Arc;

use chatgraph::LlmClient;

use crate::config::{Error, RunConfig};

/// OpenAI-compatible client for the configured endpoint and model.
#[cfg(feature = "openai")]
pub fn build_llm(config: &RunConfig) -> Result<Arc<dyn LlmClient>, Error> {
    use async_openai::config::OpenAIConfig;
    use chatgraph::{ChatOpenAI, ToolCallMode};

    // Local servers ignore the key but the client still sends one.
    let key = config.api_key.as_deref().unwrap_or("unused");
    let openai_config = OpenAIConfig::new()
        .with_api_base(config.api_base.clone())
        .with_api_key(key);
    let mut client = ChatOpenAI::with_config(openai_config, config.model.clone());
    if let Some(t) = config.temperature {
        client = client.with_temperature(t);
    }
    if let (ToolCallMode::Native, Some(tc)) = (config.mode, config.tool_choice) {
        client = client.with_tool_choice(tc);
    }
    Ok(Arc::new(client))
}

#[cfg(not(feature = "openai"))]
pub fn build_llm(_config: &RunConfig) -> Result<Arc<dyn LlmClient>, Error> {
    Err("built without the `openai` feature; no model client available".into())
}
