//! Single-consumer broadcast dispatcher.
//!
//! Inbound messages flow through one bounded FIFO queue; when it is full,
//! producers block rather than drop, so a slow fan-out throttles all read
//! loops uniformly. The single consumer writes every message to the current
//! registry snapshot, the original sender included.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::relay::registry::ConnectionRegistry;

/// Default capacity of the broadcast queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// One message read from a connection, awaiting fan-out.
///
/// Produced by a read loop, consumed exactly once by the dispatcher.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Identity of the connection the payload was read from.
    pub sender: u64,
    /// The tagged frame to rebroadcast; opaque to the relay.
    pub frame: Vec<u8>,
}

/// Fan-out loop writing each queued frame to every registered connection.
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
    queue: mpsc::Receiver<InboundMessage>,
}

impl BroadcastDispatcher {
    /// Creates a dispatcher and the producer side of its bounded queue.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        capacity: usize,
    ) -> (Self, mpsc::Sender<InboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                registry,
                queue: rx,
            },
            tx,
        )
    }

    /// Drains the queue until every producer is gone.
    pub async fn run(mut self) {
        while let Some(message) = self.queue.recv().await {
            self.broadcast(&message).await;
        }
    }

    async fn broadcast(&self, message: &InboundMessage) {
        let recipients = self.registry.snapshot();
        tracing::debug!(
            sender = message.sender,
            recipients = recipients.len(),
            "broadcasting frame"
        );
        for peer in recipients {
            if let Err(error) = peer.send(&message.frame).await {
                // The recipient's own read loop notices the broken socket
                // and deregisters it; delivery to the rest continues.
                tracing::debug!(peer = peer.id(), %error, "delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::AsyncReadExt;
    use tokio::net::tcp::OwnedWriteHalf;
    use tokio::net::{TcpListener, TcpStream};

    async fn socket_pair() -> (TcpStream, OwnedWriteHalf) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (_read, write) = server.into_split();
        (client, write)
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:12345".parse().unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_including_sender() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (mut c1, w1) = socket_pair().await;
        let (mut c2, w2) = socket_pair().await;
        let sender = registry.register(w1, test_addr());
        registry.register(w2, test_addr());

        let (dispatcher, queue) = BroadcastDispatcher::new(Arc::clone(&registry), 4);
        let task = tokio::spawn(dispatcher.run());

        queue
            .send(InboundMessage {
                sender: sender.id(),
                frame: b"1:hi".to_vec(),
            })
            .await
            .unwrap();

        for client in [&mut c1, &mut c2] {
            let mut buf = [0u8; 4];
            client.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"1:hi");
        }

        drop(queue);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_stop_delivery() {
        let registry = Arc::new(ConnectionRegistry::new());

        // First recipient: remote end already gone
        let (dead_client, dead_writer) = socket_pair().await;
        drop(dead_client);
        registry.register(dead_writer, test_addr());

        let (mut live_client, live_writer) = socket_pair().await;
        registry.register(live_writer, test_addr());

        let (dispatcher, queue) = BroadcastDispatcher::new(Arc::clone(&registry), 4);
        let task = tokio::spawn(dispatcher.run());

        queue
            .send(InboundMessage {
                sender: 1,
                frame: b"1:still-here".to_vec(),
            })
            .await
            .unwrap();

        let mut buf = [0u8; 12];
        live_client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"1:still-here");

        drop(queue);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_messages_delivered_in_queue_order() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (mut client, writer) = socket_pair().await;
        registry.register(writer, test_addr());

        let (dispatcher, queue) = BroadcastDispatcher::new(Arc::clone(&registry), 4);
        let task = tokio::spawn(dispatcher.run());

        for frame in [b"1:a".to_vec(), b"1:b".to_vec(), b"1:c".to_vec()] {
            queue
                .send(InboundMessage { sender: 1, frame })
                .await
                .unwrap();
        }

        let mut buf = [0u8; 9];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"1:a1:b1:c");

        drop(queue);
        task.await.unwrap();
    }
}
