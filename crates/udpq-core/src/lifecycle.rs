//! Server lifecycle: states, stop triggers, and the shutdown handle.
//!
//! `Starting → Running → Stopping → Stopped`. A cooperative stop comes from
//! the `EXIT` command; an immediate stop comes from an OS signal or a
//! [`ShutdownHandle`]. Both are plain messages to the main loop, which then
//! runs the same teardown.

use std::fmt;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

/// Observable lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Why the server stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A client sent `EXIT`; its reply went out first.
    ExitCommand,
    /// An OS termination signal, by name.
    Signal(&'static str),
    /// [`ShutdownHandle::shutdown`] was called.
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ExitCommand => f.write_str("EXIT command"),
            StopReason::Signal(name) => write!(f, "signal {name}"),
            StopReason::Requested => f.write_str("shutdown request"),
        }
    }
}

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// Cloneable handle that requests an immediate stop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<ShutdownSignal>,
}

impl ShutdownHandle {
    /// Ask the server to stop now, abandoning any request in progress.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ShutdownSignal);
    }
}

/// Owns the state channel and the shutdown channel.
#[derive(Debug)]
pub struct Lifecycle {
    state_tx: watch::Sender<LifecycleState>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Starting);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            state_tx,
            shutdown_tx,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub fn transition(&self, next: LifecycleState) {
        let prev = self.state_tx.send_replace(next);
        if prev != next {
            info!(from = ?prev, to = ?next, "lifecycle transition");
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Receiver for immediate-stop requests. Subscribe before the run starts
    /// so no request is missed.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for an OS termination signal and return its name.
///
/// On unix this listens for `SIGINT`, `SIGTERM`, `SIGQUIT` and `SIGUSR1`;
/// elsewhere for Ctrl-C. If the handlers cannot be installed the future
/// never completes, leaving `EXIT` and the shutdown handle as the only stop
/// triggers.
pub async fn stop_signal() -> &'static str {
    match wait_for_signal().await {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "failed to install signal handlers");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
        _ = sigusr1.recv() => "SIGUSR1",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
