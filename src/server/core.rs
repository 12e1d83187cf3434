use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::Reply;
use crate::server::session::handle_session;
use crate::storage::BaseDir;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    base: Arc<BaseDir>,
    config: Arc<ServerConfig>,
    connection_slots: Arc<Semaphore>,
}

impl Server {
    pub async fn bind(config: ServerConfig, base: Arc<BaseDir>) -> Result<Self, ServerError> {
        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(ServerError::Io(e));
            }
        };

        Ok(Self {
            listener,
            base,
            connection_slots: Arc::new(Semaphore::new(config.max_clients)),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<(), ServerError> {
        info!(
            "Serving {} on {} (max {} clients)",
            self.base.root().display(),
            self.local_addr()?,
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let base = Arc::clone(&self.base);
                    let config = Arc::clone(&self.config);
                    let slots = Arc::clone(&self.connection_slots);

                    // Spawn a task per client so the accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(stream, addr, base, config, slots).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    // Persistent failures like EMFILE would otherwise spin
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }
}

/// Takes a connection slot, then hands the stream to the session loop.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    base: Arc<BaseDir>,
    config: Arc<ServerConfig>,
    slots: Arc<Semaphore>,
) -> std::io::Result<()> {
    let Ok(_permit) = Arc::clone(&slots).try_acquire_owned() else {
        warn!("Rejecting {}: too many connections", client_addr);
        let reply = Reply::failure(None, 503, "Too many connections. Try again later.");
        stream.write_all(reply.to_line().as_bytes()).await?;
        stream.shutdown().await?;
        return Ok(());
    };

    info!(
        "Client connected: {} ({}/{} clients)",
        client_addr,
        config.max_clients - slots.available_permits(),
        config.max_clients
    );

    let (read_half, write_half) = stream.into_split();
    let peer = client_addr.to_string();
    let result = handle_session(
        read_half,
        write_half,
        base,
        config.max_request_length,
        &peer,
    )
    .await;

    info!("Client {} disconnected", client_addr);
    result
}
