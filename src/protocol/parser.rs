//! Request frame parsing
//!
//! Turns one newline-delimited JSON line into a `Request`.

use serde_json::{Map, Value};
use std::fmt;

use crate::protocol::commands::{Command, FrameKind, OPERATIONS};

/// A parsed request frame
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Echoed back verbatim in the reply
    pub id: Option<Value>,
    pub kind: FrameKind,
    pub command: Command,
}

/// A frame that could not be turned into a command
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    pub id: Option<Value>,
    pub kind: FrameKind,
    pub message: String,
}

impl RequestError {
    fn new(id: Option<Value>, kind: FrameKind, message: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RequestError {}

/// Parses a raw request line.
///
/// Frames with a `tool` field are tool calls whose parameters sit under
/// `arguments`; everything else is a call with an `op` field.
pub fn parse_request(raw: &str) -> Result<Request, RequestError> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
        RequestError::new(None, FrameKind::Call, format!("Malformed request: {}", e))
    })?;

    let Value::Object(mut fields) = value else {
        return Err(RequestError::new(
            None,
            FrameKind::Call,
            "Malformed request: expected a JSON object",
        ));
    };

    let id = fields.remove("id");

    if let Some(tool) = fields.remove("tool") {
        return parse_tool_call(id, tool, fields.remove("arguments"));
    }

    match fields.get("op") {
        Some(Value::String(op)) if OPERATIONS.contains(&op.as_str()) => {}
        Some(Value::String(op)) => {
            let message = format!("Unknown operation: {}", op);
            return Err(RequestError::new(id, FrameKind::Call, message));
        }
        _ => {
            return Err(RequestError::new(
                id,
                FrameKind::Call,
                "Missing operation: expected an \"op\" or \"tool\" field",
            ));
        }
    }

    match serde_json::from_value::<Command>(Value::Object(fields)) {
        Ok(command) => Ok(Request {
            id,
            kind: FrameKind::Call,
            command,
        }),
        Err(e) => Err(RequestError::new(
            id,
            FrameKind::Call,
            format!("Invalid parameters: {}", e),
        )),
    }
}

fn parse_tool_call(
    id: Option<Value>,
    tool: Value,
    arguments: Option<Value>,
) -> Result<Request, RequestError> {
    let Value::String(name) = tool else {
        return Err(RequestError::new(id, FrameKind::Tool, "Tool name must be a string"));
    };

    let Some(op) = Command::op_for_tool(&name) else {
        let message = format!("Unknown tool: {}", name);
        return Err(RequestError::new(id, FrameKind::Tool, message));
    };

    let mut arguments = match arguments {
        Some(Value::Object(arguments)) => arguments,
        None | Some(Value::Null) => Map::new(),
        Some(_) => {
            let message = format!("Arguments for {} must be an object", name);
            return Err(RequestError::new(id, FrameKind::Tool, message));
        }
    };
    arguments.insert("op".to_string(), Value::String(op.to_string()));

    match serde_json::from_value::<Command>(Value::Object(arguments)) {
        Ok(command) => Ok(Request {
            id,
            kind: FrameKind::Tool,
            command,
        }),
        Err(e) => Err(RequestError::new(
            id,
            FrameKind::Tool,
            format!("Invalid arguments for {}: {}", name, e),
        )),
    }
}
