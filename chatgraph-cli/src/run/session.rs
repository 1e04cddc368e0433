//! One-shot turns, the interactive loop and thread listing over a [`ChatRunner`].

use std::io::Write;

use chatgraph::{ChatRunner, Message, RunError, StreamEvent, TurnOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::config::Error;

/// Prints the tool calls and tool results in `messages` as they appear.
fn print_activity(out: &mut dyn Write, messages: &[Message]) {
    for m in messages {
        match m {
            Message::Assistant { tool_calls, .. } => {
                for call in tool_calls {
                    let args = serde_json::to_string(&call.arguments).unwrap_or_default();
                    let _ = writeln!(out, "  -> {}({})", call.name, args);
                }
            }
            Message::ToolResult { name, content, .. } => {
                let _ = writeln!(out, "  <- {}: {}", name, content);
            }
            _ => {}
        }
    }
}

/// Text shown to the user for a failed command: the friendly message for turn failures.
pub fn describe_error(e: &Error) -> String {
    match e.downcast_ref::<RunError>() {
        Some(run_error) => run_error.user_message(),
        None => e.to_string(),
    }
}

/// Runs one turn, printing tool activity and then the answer.
///
/// Cancelling `cancel` stops the turn; the saved conversation keeps its previous state.
pub async fn chat_once(
    runner: &ChatRunner,
    thread_id: &str,
    text: &str,
    cancel: &CancellationToken,
    out: &mut dyn Write,
) -> Result<TurnOutcome, Error> {
    // history plus the new user message
    let mut printed = runner.history(thread_id).await?.len() + 1;
    let outcome = runner
        .stream_turn_with_cancel(thread_id, text, cancel, |event| {
            if let StreamEvent::Updates { state, .. } = event {
                let messages = state.messages();
                if messages.len() > printed {
                    print_activity(out, &messages[printed..]);
                    printed = messages.len();
                }
            }
        })
        .await?;
    writeln!(out, "Assistant: {}", outcome.answer)?;
    Ok(outcome)
}

/// Like [`chat_once`], cancelled by Ctrl-C.
pub async fn chat_interruptible(
    runner: &ChatRunner,
    thread_id: &str,
    text: &str,
    out: &mut dyn Write,
) -> Result<TurnOutcome, Error> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let result = chat_once(runner, thread_id, text, &cancel, out).await;
    watcher.abort();
    result
}

pub async fn print_threads(runner: &ChatRunner, out: &mut dyn Write) -> Result<(), Error> {
    let threads = runner.list_threads().await?;
    if threads.is_empty() {
        writeln!(out, "(no saved conversations)")?;
    }
    for t in threads {
        writeln!(out, "{}", t)?;
    }
    Ok(())
}

pub async fn print_history(runner: &ChatRunner, thread_id: &str, out: &mut dyn Write) -> Result<(), Error> {
    for m in runner.history(thread_id).await? {
        match &m {
            Message::User { content } => writeln!(out, "[User] {}", content)?,
            Message::Assistant { content, tool_calls } if tool_calls.is_empty() => {
                writeln!(out, "[Assistant] {}", content)?
            }
            Message::System { .. } => {}
            _ => print_activity(out, std::slice::from_ref(&m)),
        }
    }
    Ok(())
}

/// Interactive loop: one turn per input line until EOF, `exit` or `quit`.
///
/// `/threads` lists saved conversations, `/history` prints the current one and `/thread <id>`
/// switches to another. A failed turn is reported and the loop continues.
pub async fn repl<R>(
    runner: &ChatRunner,
    thread_id: &str,
    input: R,
    out: &mut dyn Write,
    interruptible: bool,
) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut thread = thread_id.to_string();
    let mut lines = input.lines();
    writeln!(out, "thread '{}'; type exit to quit", thread)?;
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "/threads" => print_threads(runner, out).await?,
            "/history" => print_history(runner, &thread, out).await?,
            _ => {
                if let Some(id) = line.strip_prefix("/thread ") {
                    thread = id.trim().to_string();
                    writeln!(out, "switched to thread '{}'", thread)?;
                    continue;
                }
                let result = if interruptible {
                    chat_interruptible(runner, &thread, line, out).await
                } else {
                    chat_once(runner, &thread, line, &CancellationToken::new(), out).await
                };
                if let Err(e) = result {
                    writeln!(out, "error: {}", describe_error(&e))?;
                }
            }
        }
    }
    Ok(())
}
