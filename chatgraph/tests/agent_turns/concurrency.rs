//! Concurrent turns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chatgraph::{LlmResponse, Message, MockLlm, ToolCallMode};

use super::common::{config, memory_runner};

/// Answers with the text of the last user message.
fn echo_llm(delay: Duration) -> Arc<MockLlm> {
    Arc::new(
        MockLlm::from_fn(|messages, _| {
            let last_user = messages
                .iter()
                .rev()
                .find_map(|m| match m {
                    Message::User { content } => Some(content.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            Ok(LlmResponse::text(format!("echo: {}", last_user)))
        })
        .with_delay(delay),
    )
}

/// **Scenario**: Turns on distinct threads run in parallel and never see each other's messages.
#[tokio::test]
async fn distinct_threads_are_isolated() {
    let runner = Arc::new(memory_runner(
        echo_llm(Duration::from_millis(200)),
        config(ToolCallMode::Native, 4),
    ));
    let started = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                let thread = format!("thread-{}", i);
                let text = format!("message {}", i);
                let outcome = runner.run_turn(&thread, &text).await.unwrap();
                (thread, text, outcome)
            })
        })
        .collect();

    for handle in handles {
        let (thread, text, outcome) = handle.await.unwrap();
        assert_eq!(outcome.answer, format!("echo: {}", text));
        let history = runner.history(&thread).await.unwrap();
        assert_eq!(history, vec![Message::user(text.clone()), Message::assistant(format!("echo: {}", text))]);
    }
    assert!(started.elapsed() < Duration::from_millis(1200), "{:?}", started.elapsed());
    assert_eq!(runner.list_threads().await.unwrap().len(), 8);
}

/// **Scenario**: Two turns on the same thread are serialized; both land in order.
#[tokio::test]
async fn same_thread_turns_serialize() {
    let runner = Arc::new(memory_runner(
        echo_llm(Duration::from_millis(100)),
        config(ToolCallMode::Native, 4),
    ));
    let a = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run_turn("shared", "first").await.unwrap() })
    };
    let b = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run_turn("shared", "second").await.unwrap() })
    };
    a.await.unwrap();
    b.await.unwrap();

    let history = runner.history("shared").await.unwrap();
    assert_eq!(history.len(), 4);
    let users: Vec<&str> = history
        .iter()
        .filter(|m| matches!(m, Message::User { .. }))
        .map(Message::content)
        .collect();
    assert_eq!(users.len(), 2);
    assert!(users.contains(&"first") && users.contains(&"second"));
    assert!(matches!(history[1], Message::Assistant { .. }));
    assert!(matches!(history[3], Message::Assistant { .. }));
}
