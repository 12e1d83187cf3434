//! Error types
//!
//! Defines the error taxonomy for file operations and for the server process.

use std::fmt;
use std::io;

use crate::storage::EntryKind;

/// File operation errors
///
/// Every operation reports exactly one of these kinds. Paths carried in the
/// variants are the caller-supplied relative paths, never resolved ones.
#[derive(Debug)]
pub enum FsError {
    /// The path escapes the base directory (lexical `..`, absolute input or symlink)
    AccessDenied(String),
    /// The target does not exist
    NotFound(String),
    /// The target exists but is not the expected kind of entry
    InvalidType { path: String, expected: EntryKind },
    /// Any other I/O failure: permissions, disk full, invalid UTF-8
    IoFailure(io::Error),
}

impl FsError {
    pub fn access_denied(path: &str) -> Self {
        FsError::AccessDenied(path.to_string())
    }

    pub fn not_found(path: &str) -> Self {
        FsError::NotFound(path.to_string())
    }

    pub fn not_a_file(path: &str) -> Self {
        FsError::InvalidType {
            path: path.to_string(),
            expected: EntryKind::File,
        }
    }

    pub fn not_a_directory(path: &str) -> Self {
        FsError::InvalidType {
            path: path.to_string(),
            expected: EntryKind::Directory,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::AccessDenied(p) => {
                write!(f, "Access denied: path outside base directory: {}", p)
            }
            FsError::NotFound(p) => write!(f, "Not found: {}", p),
            FsError::InvalidType { path, expected } => match expected {
                EntryKind::File => write!(f, "Not a file: {}", path),
                EntryKind::Directory => write!(f, "Not a directory: {}", path),
            },
            FsError::IoFailure(e) => write!(f, "I/O failure: {}", e),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::IoFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(error: io::Error) -> Self {
        FsError::IoFailure(error)
    }
}

/// Process-level server errors raised during bootstrap and serving
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    Io(io::Error),
    Storage(FsError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Io(error)
    }
}

impl From<FsError> for ServerError {
    fn from(error: FsError) -> Self {
        ServerError::Storage(error)
    }
}
