//! Tool result rendering
//!
//! The tool binding answers with a single human-readable string. Failures
//! are reported as text starting with `Error:` rather than as a status.

use crate::error::FsError;
use crate::protocol::responses::Output;
use crate::storage::{EntryKind, ListResult};

pub const ERROR_PREFIX: &str = "Error:";

pub fn render_error(message: &str) -> String {
    format!("{} {}", ERROR_PREFIX, message)
}

/// Render an operation outcome as tool text
pub fn render(result: Result<Output, FsError>) -> String {
    match result {
        Ok(Output::Read(read)) => read.content,
        Ok(Output::Write(write)) => {
            format!("Successfully wrote {} bytes to {}", write.size, write.path)
        }
        Ok(Output::List(listing)) => render_listing(&listing),
        Ok(Output::Delete(delete)) => delete.message,
        Ok(Output::Move(moved)) => {
            format!("Successfully moved {} to {}", moved.source, moved.destination)
        }
        Ok(Output::Copy(copied)) => {
            format!("Successfully copied {} to {}", copied.source, copied.destination)
        }
        Err(e) => render_error(&e.to_string()),
    }
}

fn render_listing(listing: &ListResult) -> String {
    if listing.contents.is_empty() {
        return "Directory is empty".to_string();
    }

    listing
        .contents
        .iter()
        .map(|entry| match (entry.kind, entry.size) {
            (EntryKind::Directory, _) => format!("[DIR] {}", entry.name),
            (EntryKind::File, Some(size)) => format!("[FILE] {} ({} bytes)", entry.name, size),
            (EntryKind::File, None) => format!("[FILE] {}", entry.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
