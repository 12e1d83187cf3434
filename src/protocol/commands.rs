//! Module `commands`
//!
//! Defines the six file operations as they arrive on the wire, for both the
//! request-response binding (`op`) and the tool binding (`tool`).

use serde::Deserialize;

/// A file operation requested by a client.
///
/// Each variant carries the named string parameters of its endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    Read {
        file_path: String,
    },
    Write {
        file_path: String,
        content: String,
    },
    List {
        // Defaults to the base directory itself
        #[serde(default, alias = "directory_path")]
        dir_path: String,
    },
    Delete {
        file_path: String,
    },
    Move {
        source_path: String,
        destination_path: String,
    },
    Copy {
        source_path: String,
        destination_path: String,
    },
}

/// Which binding a request came in on; decides the shape of the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Call,
    Tool,
}

pub const OPERATIONS: [&str; 6] = ["read", "write", "list", "delete", "move", "copy"];

impl Command {
    /// Operation name as used in the `op` field
    pub fn name(&self) -> &'static str {
        match self {
            Command::Read { .. } => "read",
            Command::Write { .. } => "write",
            Command::List { .. } => "list",
            Command::Delete { .. } => "delete",
            Command::Move { .. } => "move",
            Command::Copy { .. } => "copy",
        }
    }

    /// Maps a tool name onto its operation name
    pub fn op_for_tool(tool: &str) -> Option<&'static str> {
        match tool {
            "read_file" => Some("read"),
            "write_file" => Some("write"),
            "list_directory" => Some("list"),
            "delete_file" => Some("delete"),
            "move_file" => Some("move"),
            "copy_file" => Some("copy"),
            _ => None,
        }
    }
}
