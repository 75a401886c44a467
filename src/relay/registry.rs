//! Live-connection registry with monotonic identity assignment.
//!
//! A single mutex guards both the connection set and the identity counter,
//! so registration is atomic: two concurrent accepts can never observe the
//! same identity or a half-updated view. The lock is only held for
//! membership changes, never across I/O.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

/// Handle to one live, registered connection.
///
/// Clones share the underlying socket, so a dispatcher holding a snapshot
/// can still write while the read loop deregisters the connection; such a
/// write simply fails for that recipient.
#[derive(Clone)]
pub struct PeerHandle {
    id: u64,
    addr: SocketAddr,
    writer: Arc<tokio::sync::Mutex<OwnedWriteHalf>>,
}

impl PeerHandle {
    /// Relay-assigned identity; never reused for the process lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote address of the connection.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Writes raw bytes to the connection.
    pub async fn send(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await
    }
}

struct RegistryInner {
    next_id: u64,
    live: BTreeMap<u64, PeerHandle>,
}

/// The set of live connections plus the identity counter.
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 1,
                live: BTreeMap::new(),
            }),
        }
    }

    /// Registers a connection and assigns the next identity.
    pub fn register(&self, writer: OwnedWriteHalf, addr: SocketAddr) -> PeerHandle {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        let peer = PeerHandle {
            id,
            addr,
            writer: Arc::new(tokio::sync::Mutex::new(writer)),
        };
        inner.live.insert(id, peer.clone());
        peer
    }

    /// Removes a connection from the live set.
    ///
    /// Deregistering an already-removed connection is a no-op, so the
    /// read-loop exit path and an external disconnect can both call this.
    pub fn deregister(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.live.remove(&id).is_some()
    }

    /// Current live connections, ordered by identity.
    pub fn snapshot(&self) -> Vec<PeerHandle> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.live.values().cloned().collect()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("registry lock poisoned").live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    /// Connected socket pair; the client end must stay alive for the test.
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
    async fn test_identities_start_at_one_and_increase() {
        let registry = ConnectionRegistry::new();
        let (_c1, w1) = socket_pair().await;
        let (_c2, w2) = socket_pair().await;

        let first = registry.register(w1, test_addr());
        let second = registry.register(w2, test_addr());

        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_identity_not_reused_after_deregister() {
        let registry = ConnectionRegistry::new();
        let (_c1, w1) = socket_pair().await;
        let (_c2, w2) = socket_pair().await;

        let first = registry.register(w1, test_addr());
        registry.deregister(first.id());
        let second = registry.register(w2, test_addr());

        assert_eq!(second.id(), 2);
    }

    #[tokio::test]
    async fn test_deregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (_client, writer) = socket_pair().await;
        let peer = registry.register(writer, test_addr());

        assert!(registry.deregister(peer.id()));
        assert!(!registry.deregister(peer.id()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_and_live_only() {
        let registry = ConnectionRegistry::new();
        let (_c1, w1) = socket_pair().await;
        let (_c2, w2) = socket_pair().await;
        let (_c3, w3) = socket_pair().await;

        registry.register(w1, test_addr());
        let middle = registry.register(w2, test_addr());
        registry.register(w3, test_addr());
        registry.deregister(middle.id());

        let ids: Vec<u64> = registry.snapshot().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_get_distinct_ids() {
        let registry = Arc::new(ConnectionRegistry::new());

        let mut clients = Vec::new();
        let mut writers = Vec::new();
        for _ in 0..8 {
            let (client, writer) = socket_pair().await;
            clients.push(client);
            writers.push(writer);
        }

        let mut tasks = Vec::new();
        for writer in writers {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.register(writer, test_addr()).id()
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(registry.len(), 8);
    }

    #[tokio::test]
    async fn test_send_reaches_remote_end() {
        let registry = ConnectionRegistry::new();
        let (mut client, writer) = socket_pair().await;
        let peer = registry.register(writer, test_addr());

        peer.send(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }
}
