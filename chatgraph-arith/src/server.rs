//! JSON-RPC request handling and the line-delimited stdio loop.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::ops::ArithOp;

pub const SERVER_NAME: &str = "arith-server";
const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }
}

fn text_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error
    })
}

fn int_arg(args: &Value, key: &str) -> Result<i64, String> {
    match args.get(key) {
        None | Some(Value::Null) => Err(format!("missing argument '{}'", key)),
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| format!("argument '{}' must be an integer, got {}", key, v)),
    }
}

/// Handles one decoded request. Notifications (no `id`) get no response.
pub fn handle(request: Request) -> Option<Response> {
    let Some(id) = request.id else {
        debug!(method = %request.method, "notification");
        return None;
    };
    let response = match request.method.as_str() {
        "initialize" => {
            let version = request
                .params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            Response::success(
                id,
                json!({
                    "protocolVersion": version,
                    "capabilities": {"tools": {"listChanged": false}},
                    "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")}
                }),
            )
        }
        "ping" => Response::success(id, json!({})),
        "tools/list" => {
            let tools: Vec<Value> = ArithOp::ALL.iter().map(|op| op.tool_spec()).collect();
            Response::success(id, json!({ "tools": tools }))
        }
        "tools/call" => call_tool(id, &request.params),
        other => Response::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    };
    Some(response)
}

fn call_tool(id: Value, params: &Value) -> Response {
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let Some(op) = ArithOp::from_name(name) else {
        return Response::error(id, INVALID_PARAMS, format!("Unknown tool: {}", name));
    };
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    let operands = int_arg(&args, "a").and_then(|a| int_arg(&args, "b").map(|b| (a, b)));
    let result = match operands {
        Ok((a, b)) => match op.apply(a, b) {
            Ok(n) => text_result(n.to_string(), false),
            Err(e) => text_result(e.to_string(), true),
        },
        Err(reason) => text_result(format!("Invalid arguments for {}: {}", name, reason), true),
    };
    info!(tool = name, "tool call handled");
    Response::success(id, result)
}

/// Decodes one input line and returns the encoded response line, if any.
pub fn handle_line(line: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparsable input line");
            return encode(&Response::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)));
        }
    };
    // Responses from the client (no method) are ignored.
    if value.get("method").is_none() {
        return match value.get("id") {
            Some(_) if value.get("result").is_some() || value.get("error").is_some() => None,
            id => encode(&Response::error(
                id.cloned().unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid request",
            )),
        };
    }
    match serde_json::from_value::<Request>(value) {
        Ok(request) => handle(request).as_ref().and_then(encode),
        Err(e) => encode(&Response::error(Value::Null, INVALID_REQUEST, e.to_string())),
    }
}

fn encode(response: &Response) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            None
        }
    }
}

/// Serves requests line by line until `reader` reaches EOF.
pub async fn serve<R, W>(reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    info!("{} ready", SERVER_NAME);
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(out) = handle_line(&line) {
            writer.write_all(out.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    info!("input closed; exiting");
    Ok(())
}
