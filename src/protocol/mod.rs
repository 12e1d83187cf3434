//! Request protocol implementation
//!
//! Handles request frame parsing, dispatch to the file operations, and reply
//! generation for both the request-response and the tool binding.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;
pub mod tools;

pub use commands::{Command, FrameKind};
pub use handlers::{execute, handle_line, handle_request};
pub use parser::{Request, RequestError, parse_request};
pub use responses::{Output, Reply};
