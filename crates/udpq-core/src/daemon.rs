//! Core daemon process — startup, shutdown, and main event loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use udpq_config::{ConfigError, ServerConfig};

use crate::lifecycle::{
    self, Lifecycle, LifecycleState, ShutdownHandle, ShutdownSignal, StopReason,
};
use crate::server::QueueServer;
use crate::state::ServerRuntimeState;

/// How a run ended and what was left in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub reason: StopReason,
    /// Values still queued at shutdown. They are logged and dropped.
    pub discarded: Vec<String>,
}

/// The udpq server daemon: a bound socket, the shared state, and the
/// lifecycle that stops it.
pub struct Daemon {
    config: ServerConfig,
    state: Arc<ServerRuntimeState>,
    lifecycle: Lifecycle,
    shutdown_rx: broadcast::Receiver<ShutdownSignal>,
    server: QueueServer,
    handle_signals: bool,
}

impl Daemon {
    /// Bind the server socket described by `config`.
    ///
    /// This is the `Starting` phase; any failure is fatal and logged.
    pub async fn bind(config: ServerConfig) -> Result<Self, DaemonError> {
        let lifecycle = Lifecycle::new();
        let shutdown_rx = lifecycle.subscribe_shutdown();

        let addr = config.bind_socket_addr()?;
        let state = Arc::new(ServerRuntimeState::new(Duration::from_secs(
            config.server.delay_secs,
        )));

        let server = QueueServer::bind(addr, Arc::clone(&state))
            .await
            .map_err(|source| {
                error!(%addr, error = %source, "Failed to bind server socket");
                DaemonError::Bind { addr, source }
            })?;

        Ok(Self {
            config,
            state,
            lifecycle,
            shutdown_rx,
            server,
            handle_signals: true,
        })
    }

    /// Whether OS termination signals stop the daemon (default: yes).
    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Run until `EXIT`, a termination signal, or a shutdown request.
    pub async fn run(self) -> Result<StopReport, DaemonError> {
        let Daemon {
            config,
            state,
            lifecycle,
            mut shutdown_rx,
            server,
            handle_signals,
        } = self;

        let addr = server.local_addr()?;
        lifecycle.transition(LifecycleState::Running);
        info!(
            %addr,
            delay_secs = config.server.delay_secs,
            version = %crate::build_info::version_string(),
            "Server started, waiting for connections..."
        );

        let signal = async {
            if handle_signals {
                lifecycle::stop_signal().await
            } else {
                std::future::pending().await
            }
        };

        let reason = tokio::select! {
            () = server.serve() => StopReason::ExitCommand,
            _ = shutdown_rx.recv() => StopReason::Requested,
            name = signal => StopReason::Signal(name),
        };

        lifecycle.transition(LifecycleState::Stopping);
        match reason {
            StopReason::ExitCommand => info!("EXIT processed, stopping"),
            other => warn!(reason = %other, "Received termination request, abandoning in-flight work"),
        }

        // Closes the socket.
        drop(server);

        let discarded = state.queue().drain();
        if !discarded.is_empty() {
            warn!(count = discarded.len(), "discarding values still in the queue");
        }

        let stats = state.queue().stats();
        info!(
            %reason,
            enqueued = stats.enqueued_total(),
            dequeued = stats.dequeued_total(),
            "Server is shutting down..."
        );
        lifecycle.transition(LifecycleState::Stopped);

        Ok(StopReport { reason, discarded })
    }

    /// Address the socket is bound to (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, DaemonError> {
        Ok(self.server.local_addr()?)
    }

    /// Handle that triggers an immediate stop.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.lifecycle.shutdown_handle()
    }

    /// Request an immediate shutdown of the daemon.
    pub fn shutdown(&self) {
        self.lifecycle.shutdown_handle().shutdown();
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Watch lifecycle transitions, including those made during [`run`](Self::run).
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe_state()
    }

    /// Shared queue and running flag.
    pub fn runtime_state(&self) -> &Arc<ServerRuntimeState> {
        &self.state
    }

    /// Get a reference to the daemon's configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Errors from the daemon runtime.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
