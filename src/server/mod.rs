//! Server core functionality
//!
//! This module contains the TCP server, the stdio transport and the
//! session loop they share.

pub mod core;
pub mod session;
pub mod stdio;

pub use self::core::Server;
pub use session::handle_session;
pub use stdio::serve_stdio;
