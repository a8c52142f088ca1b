//! In-process server fixture.
//!
//! [`TestServer`] binds a [`Daemon`] on an ephemeral local port, runs it on
//! a background task, and offers request helpers with a timeout so a lost
//! datagram fails the test instead of hanging it.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use udpq_config::ServerConfig;
use udpq_core::{Daemon, DaemonError, LifecycleState, QueueClient, ShutdownHandle, StopReport};

use crate::config::TestConfigBuilder;

/// How long helpers wait for a reply or for the server to stop.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A running server owned by one test.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    states: watch::Receiver<LifecycleState>,
    task: JoinHandle<Result<StopReport, DaemonError>>,
}

impl TestServer {
    /// Bind and start a server with the given configuration. OS signal
    /// handling is disabled so the test process keeps its own.
    pub async fn start(config: ServerConfig) -> Self {
        let daemon = Daemon::bind(config)
            .await
            .expect("failed to bind test server")
            .handle_signals(false);
        let addr = daemon.local_addr().expect("test server has no local address");
        let shutdown = daemon.shutdown_handle();
        let states = daemon.subscribe_state();
        let task = tokio::spawn(daemon.run());

        Self {
            addr,
            shutdown,
            states,
            task,
        }
    }

    /// Start a server with the default test configuration.
    pub async fn start_default() -> Self {
        Self::start(TestConfigBuilder::new().build()).await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn client(&self) -> QueueClient {
        QueueClient::new(self.addr)
    }

    /// Send one request and return the reply, failing after [`TEST_TIMEOUT`].
    pub async fn request(&self, message: &str) -> String {
        tokio::time::timeout(TEST_TIMEOUT, self.client().request(message))
            .await
            .expect("timed out waiting for reply")
            .expect("request failed")
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.states.borrow()
    }

    /// Request an immediate stop.
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Wait for the server task to finish and return its report.
    pub async fn join(self) -> StopReport {
        tokio::time::timeout(TEST_TIMEOUT, self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
            .expect("server returned an error")
    }
}
