//! Peer-side connection to a relay.
//!
//! A peer dials the relay with a short timeout, then runs two independent
//! paths over the same socket: a receive loop draining inbound frames and a
//! user-triggered send path writing sealed messages. Connection failures
//! are surfaced immediately; there is no automatic retry.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// How long a dial may take before it is reported as a failure.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive buffer size; bounds the largest frame one read can carry.
pub const READ_BUFFER_SIZE: usize = 2048;

/// Errors that can occur on the peer side of a connection.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The relay could not be reached.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed { addr: String, reason: String },

    /// The dial did not complete within [`CONNECT_TIMEOUT`].
    #[error("Connection to {addr} timed out")]
    ConnectTimeout { addr: String },

    /// I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An established connection to a relay.
pub struct RelayConnection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    peer_addr: String,
    buf: Vec<u8>,
}

impl RelayConnection {
    /// Dials the relay, failing fast on refusal or timeout.
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(error)) => {
                return Err(ClientError::ConnectFailed {
                    addr: addr.to_string(),
                    reason: error.to_string(),
                })
            }
            Err(_) => {
                return Err(ClientError::ConnectTimeout {
                    addr: addr.to_string(),
                })
            }
        };

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader,
            writer,
            peer_addr,
            buf: vec![0u8; READ_BUFFER_SIZE],
        })
    }

    /// Address of the relay end of the connection.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Reads one chunk; an empty result means the relay closed the stream.
    pub async fn read_chunk(&mut self) -> Result<Vec<u8>, ClientError> {
        let n = self.reader.read(&mut self.buf).await?;
        Ok(self.buf[..n].to_vec())
    }

    /// Writes raw bytes to the relay.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shuts down the write side of the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_send_and_read() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let echo = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(&buf[..n]).await.unwrap();
        });

        let mut conn = RelayConnection::connect(&addr.to_string()).await.unwrap();
        conn.send(b"ping").await.unwrap();

        let chunk = conn.read_chunk().await.unwrap();
        assert_eq!(chunk, b"ping");

        echo.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_reports_failure() {
        // Port 1 is essentially never listening
        let result = RelayConnection::connect("127.0.0.1:1").await;
        assert!(matches!(result, Err(ClientError::ConnectFailed { .. })));
    }

    #[tokio::test]
    async fn test_read_chunk_signals_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = RelayConnection::connect(&addr.to_string()).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);

        let chunk = conn.read_chunk().await.unwrap();
        assert!(chunk.is_empty());
    }
}
