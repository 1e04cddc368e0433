//! Shared helpers for agent turn tests.

use std::sync::Arc;

use chatgraph::{
    CalculatorTool, ChatRunner, ChatRunnerConfig, ChatState, Checkpointer, LlmClient, MemorySaver,
    ToolCallMode, ToolRegistry,
};

pub fn calculator_registry() -> Arc<ToolRegistry> {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(CalculatorTool::new()));
    Arc::new(registry)
}

pub fn config(mode: ToolCallMode, max_tool_hops: usize) -> ChatRunnerConfig {
    ChatRunnerConfig {
        mode,
        max_tool_hops,
        ..Default::default()
    }
}

pub fn memory_runner(llm: Arc<dyn LlmClient>, config: ChatRunnerConfig) -> ChatRunner {
    let saver: Arc<dyn Checkpointer<ChatState>> = Arc::new(MemorySaver::<ChatState>::new());
    ChatRunner::new(llm, calculator_registry(), saver, config).expect("graph compiles")
}
