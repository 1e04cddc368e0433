//! Tool-server session over a subprocess's stdin/stdout, one JSON-RPC message per line.
//!
//! The child is spawned lazily on the first request and completes the `initialize` /
//! `notifications/initialized` handshake before anything else is sent. Only one request is in
//! flight at a time. On timeout or protocol desync the child is killed and the session drops back
//! to disconnected; the next request spawns a fresh child and handshakes again.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::jsonrpc::{initialize_params, JsonRpcIncoming, JsonRpcNotification, JsonRpcRequest};
use crate::tool_source::ToolSourceError;

/// How to launch a stdio tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioServerParams {
    pub command: String,
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl StdioServerParams {
    pub fn new(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }
}

/// Live child process plus its pipes.
struct StdioConnection {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    /// Set while a request is being exchanged; still set on entry means the previous caller was
    /// cancelled mid-request and its response may still be in the pipe.
    in_flight: bool,
}

/// Why one exchange failed; decides whether the connection survives.
enum ExchangeError {
    /// Transport or framing broke; the connection must be dropped.
    Desync(String),
    /// Server answered with a JSON-RPC error; the connection is fine.
    Rpc { code: i64, message: String },
}

/// Stdio session with monotonically increasing request ids.
///
/// **Interaction**: Owned by [`McpToolSource`](super::McpToolSource); `request` is called for
/// `tools/list` and `tools/call`.
pub struct McpStdioSession {
    params: StdioServerParams,
    timeout: Duration,
    next_id: AtomicU64,
    conn: Mutex<Option<StdioConnection>>,
}

impl McpStdioSession {
    pub fn new(params: StdioServerParams, timeout: Duration) -> Self {
        Self {
            params,
            timeout,
            next_id: AtomicU64::new(1),
            conn: Mutex::new(None),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// True while a child process is connected and initialized.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Sends one request and waits for its response, connecting first if needed.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ToolSourceError> {
        let mut guard = self.conn.lock().await;

        if guard.as_ref().is_some_and(|c| c.in_flight) {
            warn!(command = %self.params.command, "previous request abandoned; restarting server");
            Self::teardown(&mut guard).await;
        }
        if guard.is_none() {
            let conn = tokio::time::timeout(self.timeout, self.connect())
                .await
                .map_err(|_| {
                    ToolSourceError::RemoteTimeout(format!(
                        "initialize did not complete within {:?}",
                        self.timeout
                    ))
                })??;
            *guard = Some(conn);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(ToolSourceError::Disconnected("no connection".into()));
        };

        let id = self.next_id();
        conn.in_flight = true;
        let outcome = tokio::time::timeout(self.timeout, Self::exchange(conn, id, method, params)).await;
        conn.in_flight = false;

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(ExchangeError::Rpc { code, message })) => Err(ToolSourceError::Rpc { code, message }),
            Ok(Err(ExchangeError::Desync(reason))) => {
                warn!(command = %self.params.command, method, %reason, "protocol desync; killing server");
                Self::teardown(&mut guard).await;
                Err(ToolSourceError::Disconnected(reason))
            }
            Err(_) => {
                warn!(command = %self.params.command, method, id, "request timed out; killing server");
                Self::teardown(&mut guard).await;
                Err(ToolSourceError::RemoteTimeout(format!(
                    "{} did not answer within {:?}",
                    method, self.timeout
                )))
            }
        }
    }

    /// Kills the child, if any. The next request reconnects.
    pub async fn shutdown(&self) {
        let mut guard = self.conn.lock().await;
        Self::teardown(&mut guard).await;
    }

    async fn teardown(slot: &mut Option<StdioConnection>) {
        if let Some(mut conn) = slot.take() {
            let _ = conn.child.kill().await;
        }
    }

    /// Spawns the child and runs the initialize handshake.
    async fn connect(&self) -> Result<StdioConnection, ToolSourceError> {
        debug!(command = %self.params.command, args = ?self.params.args, "spawning tool server");
        let mut child = Command::new(&self.params.command)
            .args(&self.params.args)
            .envs(self.params.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolSourceError::Transport(format!("spawn {}: {}", self.params.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolSourceError::Transport("child stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolSourceError::Transport("child stdout unavailable".into()))?;
        let mut conn = StdioConnection {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            in_flight: false,
        };

        let id = self.next_id();
        match Self::exchange(&mut conn, id, "initialize", initialize_params()).await {
            Ok(_) => {}
            Err(ExchangeError::Rpc { code, message }) => {
                let _ = conn.child.kill().await;
                return Err(ToolSourceError::Rpc { code, message });
            }
            Err(ExchangeError::Desync(reason)) => {
                let _ = conn.child.kill().await;
                return Err(ToolSourceError::Disconnected(reason));
            }
        }
        let note = JsonRpcNotification::new("notifications/initialized", None);
        if let Err(e) = Self::write_line(&mut conn.stdin, &note).await {
            let _ = conn.child.kill().await;
            return Err(ToolSourceError::Disconnected(e));
        }
        debug!(command = %self.params.command, "tool server initialized");
        Ok(conn)
    }

    async fn write_line<T: serde::Serialize>(stdin: &mut ChildStdin, msg: &T) -> Result<(), String> {
        let mut line = serde_json::to_string(msg).map_err(|e| e.to_string())?;
        line.push('\n');
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| format!("write: {}", e))?;
        stdin.flush().await.map_err(|e| format!("flush: {}", e))
    }

    /// Writes the request and reads lines until the matching response arrives.
    ///
    /// Server notifications and server-initiated requests are skipped. Any response with another
    /// id, an unparsable line, or EOF is a desync.
    async fn exchange(
        conn: &mut StdioConnection,
        id: u64,
        method: &str,
        params: Value,
    ) -> Result<Value, ExchangeError> {
        let request = JsonRpcRequest::new(id, method, params);
        Self::write_line(&mut conn.stdin, &request)
            .await
            .map_err(ExchangeError::Desync)?;
        trace!(id, method, "request sent");

        loop {
            let line = conn
                .stdout
                .next_line()
                .await
                .map_err(|e| ExchangeError::Desync(format!("read: {}", e)))?
                .ok_or_else(|| ExchangeError::Desync("server closed stdout".into()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: JsonRpcIncoming = serde_json::from_str(line)
                .map_err(|e| ExchangeError::Desync(format!("unparsable line: {}", e)))?;
            if msg.is_server_message() {
                trace!(method = ?msg.method, "skipping server message");
                continue;
            }
            if msg.numeric_id() != Some(id) {
                return Err(ExchangeError::Desync(format!(
                    "expected response id {}, got {:?}",
                    id, msg.id
                )));
            }
            if let Some(err) = msg.error {
                return Err(ExchangeError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            return Ok(msg.result.unwrap_or(Value::Null));
        }
    }
}
