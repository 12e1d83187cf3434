//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::{Builder, Env, Target};

/// Setup logging for the server.
///
/// Defaults to `info`, overridable through `RUST_LOG`. Logs always go to
/// stderr so stdout stays reserved for stdio replies.
pub fn setup_logging() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();
}
