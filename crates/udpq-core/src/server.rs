//! UDP receive/dispatch loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::protocol::MAX_DATAGRAM;
use crate::state::ServerRuntimeState;

/// A bound datagram socket plus the dispatcher that answers on it.
///
/// One request is in flight at a time: the loop receives, dispatches,
/// replies, applies the configured delay, then receives again.
#[derive(Debug)]
pub struct QueueServer {
    socket: UdpSocket,
    dispatcher: Dispatcher,
}

impl QueueServer {
    /// Bind the socket. Errors here are fatal to startup.
    pub async fn bind(addr: SocketAddr, state: Arc<ServerRuntimeState>) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            dispatcher: Dispatcher::new(state),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve requests until the running flag is cleared by `EXIT`.
    ///
    /// The flag is checked between requests, so the `EXIT` reply is always
    /// sent before this returns. Dropping the future abandons the request in
    /// progress.
    pub async fn serve(&self) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        while self.dispatcher.state().is_running() {
            self.serve_one(&mut buf).await;
        }
        info!("receive loop finished");
    }

    async fn serve_one(&self, buf: &mut [u8]) {
        let (len, peer) = match self.socket.recv_from(buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "Failed to receive data");
                return;
            }
        };

        let reply = self.dispatcher.dispatch(peer, &buf[..len]);
        debug!(%peer, reply = %reply.to_string().escape_debug(), "sending reply");
        if let Err(e) = self.socket.send_to(&reply.to_wire(), peer).await {
            warn!(%peer, error = %e, "Failed to send reply");
        }

        let delay = self.dispatcher.state().delay();
        if !delay.is_zero() {
            debug!(delay_secs = delay.as_secs(), "simulating processing delay");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn exchange(client: &UdpSocket, server: SocketAddr, request: &str) -> String {
        client.send_to(request.as_bytes(), server).await.unwrap();
        let mut buf = [0u8; MAX_DATAGRAM];
        let (n, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .expect("reply timed out")
            .unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    #[tokio::test]
    async fn test_serve_until_exit() {
        let state = Arc::new(ServerRuntimeState::default());
        let server = QueueServer::bind("127.0.0.1:0".parse().unwrap(), Arc::clone(&state))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let task = tokio::spawn(async move { server.serve().await });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        assert_eq!(exchange(&client, addr, "PUT 1").await, "OK\n");
        assert_eq!(exchange(&client, addr, "GET").await, "1");
        assert_eq!(exchange(&client, addr, "EXIT").await, "Server is shutting down\n");

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("server did not stop after EXIT")
            .unwrap();
        assert!(!state.is_running());
    }
}
