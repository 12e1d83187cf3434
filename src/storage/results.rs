//! Storage result types
//!
//! Defines result structures returned by storage operations. Field names
//! match the reply objects sent to request-response callers.

use serde::Serialize;

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Result of a file read operation
#[derive(Debug, Clone, Serialize)]
pub struct ReadResult {
    pub content: String,
    pub path: String,
    pub size: u64,
}

/// Result of a file write operation
#[derive(Debug, Clone, Serialize)]
pub struct WriteResult {
    pub status: &'static str,
    pub path: String,
    /// UTF-8 encoded length of the written content
    pub size: u64,
}

/// A single entry of a directory listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Present for files only
    pub size: Option<u64>,
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub path: String,
    pub contents: Vec<DirEntry>,
}

/// Result of a file deletion operation
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub status: &'static str,
    pub message: String,
}

/// Result of a move or copy operation
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub status: &'static str,
    pub source: String,
    pub destination: String,
    pub size: u64,
}

pub const SUCCESS: &str = "success";
