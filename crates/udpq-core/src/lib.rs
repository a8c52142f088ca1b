#![deny(unsafe_code)]

//! udpq core: a datagram job queue server.
//!
//! Clients `PUT` numeric values into a shared FIFO queue and `GET` them back
//! later, one UDP datagram per request and per reply. `EXIT` stops the
//! server. The [`Daemon`] binds the socket and drives the receive loop;
//! [`dispatch::Dispatcher`] turns each request into queue operations and a
//! [`protocol::Reply`].

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// One-shot request/reply client.
pub mod client;
/// Daemon startup, run loop, and teardown.
pub mod daemon;
/// Request dispatcher.
pub mod dispatch;
/// Lifecycle states and stop triggers.
pub mod lifecycle;
/// Append-only log file sink.
pub mod logging;
/// Wire protocol.
pub mod protocol;
/// FIFO job queue.
pub mod queue;
/// UDP receive loop.
pub mod server;
/// Shared runtime state.
pub mod state;
/// Numeric payload validation.
pub mod validate;

pub use client::QueueClient;
pub use daemon::{Daemon, DaemonError, StopReport};
pub use lifecycle::{LifecycleState, ShutdownHandle, StopReason};
pub use logging::LogSink;
pub use queue::JobQueue;
pub use state::ServerRuntimeState;
