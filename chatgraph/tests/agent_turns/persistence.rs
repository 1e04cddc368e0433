//! Conversations persisted in SQLite survive a new runner.

use std::sync::Arc;

use chatgraph::memory::Serializer;
use chatgraph::{
    ChatRunner, ChatState, Checkpointer, JsonSerializer, Message, MockLlm, SqliteSaver, ToolCallMode,
};

use super::common::{calculator_registry, config};

fn sqlite_saver(path: &std::path::Path) -> Arc<dyn Checkpointer<ChatState>> {
    let serializer: Arc<dyn Serializer<ChatState>> = Arc::new(JsonSerializer);
    Arc::new(SqliteSaver::new(path, serializer).unwrap())
}

/// **Scenario**: A second runner on the same database resumes the thread and lists it.
#[tokio::test]
async fn resume_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("chat.db");

    {
        let llm = Arc::new(MockLlm::texts([r#"{"tool": null, "response": "Noted."}"#]));
        let runner = ChatRunner::new(
            llm,
            calculator_registry(),
            sqlite_saver(&db),
            config(ToolCallMode::ManualJson, 8),
        )
        .unwrap();
        runner.run_turn("t1", "Remember 42.").await.unwrap();
    }

    let llm = Arc::new(MockLlm::texts([r#"{"tool": null, "response": "You said 42."}"#]));
    let runner = ChatRunner::new(
        llm.clone(),
        calculator_registry(),
        sqlite_saver(&db),
        config(ToolCallMode::ManualJson, 8),
    )
    .unwrap();
    assert_eq!(runner.list_threads().await.unwrap(), vec!["t1"]);

    let outcome = runner.run_turn("t1", "What did I say?").await.unwrap();
    assert_eq!(outcome.answer, "You said 42.");
    assert_eq!(
        runner.history("t1").await.unwrap(),
        vec![
            Message::user("Remember 42."),
            Message::assistant("Noted."),
            Message::user("What did I say?"),
            Message::assistant("You said 42."),
        ]
    );
    assert_eq!(llm.seen_messages()[0][1], Message::user("Remember 42."));
}

/// **Scenario**: A failed turn leaves the saved conversation unchanged.
#[tokio::test]
async fn failed_turn_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("chat.db");
    let saver = sqlite_saver(&db);

    let ok = ChatRunner::new(
        Arc::new(MockLlm::texts([r#"{"tool": null, "response": "hello"}"#])),
        calculator_registry(),
        Arc::clone(&saver),
        config(ToolCallMode::ManualJson, 8),
    )
    .unwrap();
    ok.run_turn("t1", "hi").await.unwrap();

    let failing = ChatRunner::new(
        Arc::new(MockLlm::unavailable("connection refused")),
        calculator_registry(),
        Arc::clone(&saver),
        config(ToolCallMode::ManualJson, 8),
    )
    .unwrap();
    assert!(failing.run_turn("t1", "again").await.is_err());
    assert_eq!(failing.history("t1").await.unwrap().len(), 2);
}
