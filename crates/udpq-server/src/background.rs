//! Detaching the server into the background.
//!
//! Must run before the tokio runtime is built: forking a process that
//! already owns runtime threads leaves the child without them.

use std::ffi::OsStr;

use thiserror::Error;

/// Abstraction over daemonisation strategies.
pub trait Daemonizer {
    /// Detach the current process from its terminal.
    fn daemonize(&self) -> Result<(), DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    #[error("failed to run in the background: {0}")]
    System(#[from] daemonize_me::DaemonError),
}

/// Daemoniser that delegates to `daemonize-me`.
///
/// The working directory becomes `/`, so every path in the configuration
/// must already be absolute.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self) -> Result<(), DaemonizeError> {
        daemonize_me::Daemon::new()
            .work_dir("/")
            .name(OsStr::new(env!("CARGO_PKG_NAME")))
            .start()?;
        Ok(())
    }
}

/// Detach through `daemonizer` when `background` is set.
pub fn detach_if_requested(
    background: bool,
    daemonizer: &dyn Daemonizer,
) -> Result<(), DaemonizeError> {
    if background {
        daemonizer.daemonize()?;
    }
    Ok(())
}
