//! One-shot client: send one request datagram, wait for one reply.
//!
//! There is no retry and no timeout; the receive blocks until the server
//! answers. Callers that need a bound wrap the call in
//! `tokio::time::timeout`.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::debug;

use crate::protocol::MAX_DATAGRAM;

/// Errors from the one-shot client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to open local socket: {0}")]
    Bind(std::io::Error),

    #[error("failed to send request to {server}: {source}")]
    Send {
        server: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to receive reply from {server}: {source}")]
    Receive {
        server: SocketAddr,
        source: std::io::Error,
    },
}

/// Client for a single udpq server.
#[derive(Debug, Clone, Copy)]
pub struct QueueClient {
    server: SocketAddr,
}

impl QueueClient {
    pub fn new(server: SocketAddr) -> Self {
        Self { server }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Send `message` as one datagram and return the reply text.
    pub async fn request(&self, message: &str) -> Result<String, ClientError> {
        let local: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(ClientError::Bind)?;

        debug!(server = %self.server, bytes = message.len(), "sending request");
        socket
            .send_to(message.as_bytes(), self.server)
            .await
            .map_err(|source| ClientError::Send {
                server: self.server,
                source,
            })?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, from) = socket
            .recv_from(&mut buf)
            .await
            .map_err(|source| ClientError::Receive {
                server: self.server,
                source,
            })?;
        debug!(%from, bytes = len, "received reply");

        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_request_round_trip_against_echo() {
        let echo = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = echo.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (n, peer) = echo.recv_from(&mut buf).await.unwrap();
            echo.send_to(&buf[..n], peer).await.unwrap();
        });

        let client = QueueClient::new(addr);
        let reply = tokio::time::timeout(Duration::from_secs(5), client.request("PUT 42"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply, "PUT 42");
    }
}
