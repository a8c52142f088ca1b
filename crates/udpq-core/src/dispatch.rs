//! Request dispatcher: maps one request to queue operations and one reply.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::protocol::{Command, ErrorCode, Reply, decode_request};
use crate::state::ServerRuntimeState;
use crate::validate::is_numeric;

/// Stateless apart from its effect on the shared queue and running flag.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: Arc<ServerRuntimeState>,
}

impl Dispatcher {
    pub fn new(state: Arc<ServerRuntimeState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerRuntimeState> {
        &self.state
    }

    /// Handle one received datagram and return the reply to send.
    ///
    /// The request and its classification are logged here, before the caller
    /// sends anything.
    pub fn dispatch(&self, peer: SocketAddr, datagram: &[u8]) -> Reply {
        let line = decode_request(datagram);
        let command = Command::parse(&line);
        info!(%peer, bytes = datagram.len(), command = command.name(), "Received request from client");

        match command {
            Command::Put(value) => self.handle_put(value),
            Command::Get => self.handle_get(),
            Command::Exit => self.handle_exit(),
            Command::Invalid => {
                warn!(%peer, request = %line.escape_debug(), "Invalid request received");
                Reply::Error(ErrorCode::InvalidCommand)
            }
        }
    }

    fn handle_put(&self, value: &str) -> Reply {
        if !is_numeric(value) {
            info!(value = %value.escape_debug(), "Rejected PUT: invalid number");
            return Reply::Error(ErrorCode::InvalidNumber);
        }
        self.state.queue().enqueue(value);
        info!(
            value = %value.escape_debug(),
            queued = self.state.queue().len(),
            "Handled PUT request"
        );
        Reply::Ok
    }

    fn handle_get(&self) -> Reply {
        match self.state.queue().dequeue() {
            Some(payload) => {
                info!(
                    value = %payload.escape_debug(),
                    queued = self.state.queue().len(),
                    "Handled GET request"
                );
                Reply::Value(payload)
            }
            None => {
                debug!("GET on empty queue");
                Reply::Error(ErrorCode::QueueEmpty)
            }
        }
    }

    fn handle_exit(&self) -> Reply {
        info!("Received EXIT command, shutting down server...");
        self.state.stop();
        Reply::ShuttingDown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(ServerRuntimeState::default()))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn send(d: &Dispatcher, request: &str) -> String {
        String::from_utf8(d.dispatch(peer(), request.as_bytes()).to_wire()).unwrap()
    }

    #[test]
    fn test_put_then_get_in_order() {
        let d = dispatcher();
        assert_eq!(send(&d, "PUT 10"), "OK\n");
        assert_eq!(send(&d, "PUT 20"), "OK\n");
        assert_eq!(send(&d, "GET"), "10");
        assert_eq!(send(&d, "GET"), "20");
        assert_eq!(send(&d, "GET"), "ERROR 1\n");
    }

    #[test]
    fn test_invalid_number_leaves_queue_unchanged() {
        let d = dispatcher();
        assert_eq!(send(&d, "PUT abc"), "ERROR 3\n");
        assert_eq!(send(&d, "PUT"), "ERROR 3\n");
        assert_eq!(send(&d, "PUT 42x"), "ERROR 3\n");
        assert!(d.state().queue().is_empty());
        assert_eq!(send(&d, "GET"), "ERROR 1\n");
    }

    #[test]
    fn test_put_skips_leading_whitespace_but_stores_verbatim() {
        let d = dispatcher();
        assert_eq!(send(&d, "PUT  42"), "OK\n");
        assert_eq!(send(&d, "PUT \t7"), "OK\n");
        assert_eq!(send(&d, "PUT  -3\n"), "OK\n");
        assert_eq!(send(&d, "PUT   "), "ERROR 3\n");
        assert_eq!(send(&d, "GET"), " 42");
        assert_eq!(send(&d, "GET"), "\t7");
        assert_eq!(send(&d, "GET"), " -3\n");
    }

    #[test]
    fn test_unknown_command() {
        let d = dispatcher();
        assert_eq!(send(&d, "FOO"), "ERROR 2\n");
        assert_eq!(send(&d, "put 1"), "ERROR 2\n");
        assert_eq!(send(&d, ""), "ERROR 2\n");
        assert!(d.state().is_running());
    }

    #[test]
    fn test_get_returns_payload_with_newline_verbatim() {
        let d = dispatcher();
        assert_eq!(send(&d, "PUT 3.5\n"), "OK\n");
        assert_eq!(send(&d, "GET\n"), "3.5\n");
    }

    #[test]
    fn test_exit_clears_running_flag() {
        let d = dispatcher();
        assert!(d.state().is_running());
        assert_eq!(send(&d, "EXIT"), "Server is shutting down\n");
        assert!(!d.state().is_running());
    }

    #[test]
    fn test_empty_queue_error_is_stable() {
        let d = dispatcher();
        for i in 0..5 {
            send(&d, &format!("PUT {i}"));
        }
        for _ in 0..5 {
            assert_ne!(send(&d, "GET"), "ERROR 1\n");
        }
        for _ in 0..3 {
            assert_eq!(send(&d, "GET"), "ERROR 1\n");
        }
    }

    #[test]
    fn test_embedded_nul_ends_request() {
        let d = dispatcher();
        let reply = d.dispatch(peer(), b"PUT 7\0trailing");
        assert_eq!(reply, Reply::Ok);
        assert_eq!(d.state().queue().dequeue().as_deref(), Some("7"));
    }
}
