//! Error handlers
//!
//! Maps file operation errors onto reply status codes and logs them.

use crate::error::types::FsError;
use log::{error, warn};

pub const BAD_REQUEST: u16 = 400;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_ERROR: u16 = 500;

/// Log a failed operation. Caller mistakes are warnings, I/O failures are errors.
pub fn handle_error(operation: &str, err: &FsError) {
    match err {
        FsError::IoFailure(_) => error!("{} failed: {}", operation, err),
        _ => warn!("{} rejected: {}", operation, err),
    }
}

/// Convert error to a request-response status code
pub fn error_to_status(err: &FsError) -> u16 {
    match err {
        FsError::AccessDenied(_) => FORBIDDEN,
        FsError::NotFound(_) => NOT_FOUND,
        FsError::InvalidType { .. } => BAD_REQUEST,
        FsError::IoFailure(_) => INTERNAL_ERROR,
    }
}
