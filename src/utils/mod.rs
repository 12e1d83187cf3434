//! Utility functions
//!
//! Provides logging setup shared by the binary.

pub mod logging;

pub use logging::setup_logging;
