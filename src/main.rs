//! Sandboxed file server - Entry Point
//!
//! Serves read, write, list, delete, move and copy inside a single base directory.

use log::{error, info};
use std::sync::Arc;

use sandbox_fs_server::config::{ServerConfig, Transport};
use sandbox_fs_server::error::ServerError;
use sandbox_fs_server::server::{Server, serve_stdio};
use sandbox_fs_server::storage::BaseDir;
use sandbox_fs_server::utils::setup_logging;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default `info` filter
    setup_logging();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;

    let base = Arc::new(BaseDir::open(config.base_dir_path())?);
    info!("Base directory: {}", base.root().display());

    match config.transport {
        Transport::Tcp => Server::bind(config, base).await?.run().await,
        Transport::Stdio => serve_stdio(&config, base).await,
    }
}
