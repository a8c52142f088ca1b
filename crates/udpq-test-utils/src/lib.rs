#![deny(unsafe_code)]

//! Shared test utilities for the udpq workspace.
//!
//! Provides a config builder, an in-process server bound to an ephemeral
//! port, and tracing helpers so that individual crate tests stay concise.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! udpq-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod server;
pub mod tracing_setup;

pub use config::TestConfigBuilder;
pub use server::TestServer;
