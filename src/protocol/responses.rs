//! Reply handling
//!
//! Defines reply frames and their JSON line encoding.

use log::error;
use serde::Serialize;
use serde_json::Value;

use crate::error::handlers::{BAD_REQUEST, INTERNAL_ERROR};
use crate::storage::{DeleteResult, ListResult, ReadResult, TransferResult, WriteResult};

pub const OK: u16 = 200;

/// Successful output of any of the six operations
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Output {
    Read(ReadResult),
    Write(WriteResult),
    List(ListResult),
    Delete(DeleteResult),
    Move(TransferResult),
    Copy(TransferResult),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Success { status: u16, result: Output },
    Failure { status: u16, detail: String },
    Text { text: String },
}

/// One reply line sent back to the client
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub body: ReplyBody,
}

impl Reply {
    pub fn success(id: Option<Value>, result: Output) -> Self {
        Self {
            id,
            body: ReplyBody::Success { status: OK, result },
        }
    }

    pub fn failure(id: Option<Value>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            id,
            body: ReplyBody::Failure {
                status,
                detail: detail.into(),
            },
        }
    }

    pub fn bad_request(id: Option<Value>, detail: impl Into<String>) -> Self {
        Self::failure(id, BAD_REQUEST, detail)
    }

    pub fn internal_error(id: Option<Value>, detail: impl Into<String>) -> Self {
        Self::failure(id, INTERNAL_ERROR, detail)
    }

    pub fn text(id: Option<Value>, text: impl Into<String>) -> Self {
        Self {
            id,
            body: ReplyBody::Text { text: text.into() },
        }
    }

    /// Encode as a single JSON line terminated by `\n`
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(e) => {
                error!("Failed to encode reply: {}", e);
                "{\"status\":500,\"detail\":\"Failed to encode reply\"}\n".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DirEntry, EntryKind};
    use serde_json::json;

    fn decode(reply: &Reply) -> Value {
        let line = reply.to_line();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_success_shape() {
        let reply = Reply::success(
            Some(json!(1)),
            Output::List(ListResult {
                path: "/sandbox/a".into(),
                contents: vec![
                    DirEntry {
                        name: "b.txt".into(),
                        kind: EntryKind::File,
                        size: Some(2),
                    },
                    DirEntry {
                        name: "sub".into(),
                        kind: EntryKind::Directory,
                        size: None,
                    },
                ],
            }),
        );
        assert_eq!(
            decode(&reply),
            json!({
                "id": 1,
                "status": 200,
                "result": {
                    "path": "/sandbox/a",
                    "contents": [
                        {"name": "b.txt", "type": "file", "size": 2},
                        {"name": "sub", "type": "directory", "size": null}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_failure_without_id() {
        let reply = Reply::failure(None, 404, "Not found: x");
        assert_eq!(decode(&reply), json!({"status": 404, "detail": "Not found: x"}));
    }

    #[test]
    fn test_text_reply_escapes_newlines() {
        let reply = Reply::text(Some(json!("t")), "line one\nline two");
        assert_eq!(decode(&reply), json!({"id": "t", "text": "line one\nline two"}));
    }
}
