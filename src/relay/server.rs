//! TCP relay server: accept loop and per-connection read tasks.
//!
//! Each accepted connection is registered, read in its own task, and every
//! successful read is tagged with the sender identity and handed to the
//! broadcast dispatcher. The relay never parses or decrypts payloads.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::protocol;
use crate::relay::dispatcher::{BroadcastDispatcher, InboundMessage, DEFAULT_QUEUE_CAPACITY};
use crate::relay::registry::{ConnectionRegistry, PeerHandle};

/// Default relay listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Default per-connection read buffer size.
///
/// Also bounds the largest frame one read can carry end-to-end.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Capacity of the broadcast queue; producers block while it is full.
    pub queue_capacity: usize,
    /// Per-connection read buffer size.
    pub read_buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// Errors that can occur while running the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The listener could not be bound; the only fatal startup path.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the listener itself.
    #[error("Listener error: {0}")]
    Listener(#[from] std::io::Error),
}

/// The central relay process.
pub struct RelayServer {
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    config: RelayConfig,
}

impl RelayServer {
    /// Binds the listener.
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;
        Ok(Self {
            listener,
            registry: Arc::new(ConnectionRegistry::new()),
            config,
        })
    }

    /// The address the relay is actually listening on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the connection registry.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Runs the dispatcher and the accept loop until the process stops.
    pub async fn run(self) -> Result<(), RelayError> {
        let (dispatcher, queue) =
            BroadcastDispatcher::new(Arc::clone(&self.registry), self.config.queue_capacity);
        tokio::spawn(dispatcher.run());

        tracing::info!(addr = %self.listener.local_addr()?, "relay listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    tracing::warn!(%error, "accept failed");
                    continue;
                }
            };

            let (read_half, write_half) = stream.into_split();
            let peer = self.registry.register(write_half, peer_addr);
            tracing::info!(peer = peer.id(), addr = %peer_addr, "connection registered");

            let registry = Arc::clone(&self.registry);
            let queue = queue.clone();
            let buffer_size = self.config.read_buffer_size;
            tokio::spawn(read_loop(peer, read_half, queue, registry, buffer_size));
        }
    }
}

/// Per-connection read loop; deregisters the connection when it ends.
///
/// Read error and EOF are both terminal: the identity is never reassigned
/// and there is no reconnection.
async fn read_loop(
    peer: PeerHandle,
    mut reader: OwnedReadHalf,
    queue: mpsc::Sender<InboundMessage>,
    registry: Arc<ConnectionRegistry>,
    buffer_size: usize,
) {
    let mut buf = vec![0u8; buffer_size];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::info!(peer = peer.id(), "connection closed by peer");
                break;
            }
            Ok(n) => {
                // The payload stays opaque; only the sender tag is added
                let frame = protocol::compose_frame(peer.id(), &buf[..n]);
                let message = InboundMessage {
                    sender: peer.id(),
                    frame,
                };
                if queue.send(message).await.is_err() {
                    break;
                }
            }
            Err(error) => {
                tracing::info!(peer = peer.id(), %error, "read failed");
                break;
            }
        }
    }
    registry.deregister(peer.id());
    tracing::info!(peer = peer.id(), "connection deregistered");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RelayConfig {
        RelayConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..RelayConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bind_assigns_ephemeral_port() {
        let server = RelayServer::bind(test_config()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert!(server.registry().is_empty());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let first = RelayServer::bind(test_config()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let second = RelayServer::bind(RelayConfig {
            bind_addr: taken.to_string(),
            ..RelayConfig::default()
        })
        .await;

        assert!(matches!(second, Err(RelayError::Bind { .. })));
    }
}
