//! Stdio transport
//!
//! Serves a single session over stdin/stdout, for hosts that spawn the
//! server as a child process and talk to it through pipes.

use log::info;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::session::handle_session;
use crate::storage::BaseDir;

pub async fn serve_stdio(config: &ServerConfig, base: Arc<BaseDir>) -> Result<(), ServerError> {
    info!("Serving {} on stdio", base.root().display());

    handle_session(
        tokio::io::stdin(),
        tokio::io::stdout(),
        base,
        config.max_request_length,
        "stdio",
    )
    .await?;

    Ok(())
}
