//! Configuration for the one-shot client.

use std::net::{IpAddr, SocketAddr};

use crate::env::{ENV_ADDR, ENV_DEBUG, ENV_PORT};
use crate::{ConfigError, DEFAULT_PORT, Environment, apply, parse_port};

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Address of the queue server.
    pub server_addr: IpAddr,
    /// Port of the queue server.
    pub port: u16,
    /// The request line sent as a single datagram.
    pub message: String,
    /// Echo the outgoing request to stderr.
    pub debug: bool,
}

/// Client options given on the command line.
#[derive(Debug, Default, Clone)]
pub struct ClientOverrides {
    pub server_addr: Option<String>,
    pub port: Option<u16>,
    pub message: Option<String>,
    pub debug: bool,
}

impl ClientConfig {
    /// Combine command-line flags with the environment.
    ///
    /// The server address and the message are required. `UDPQ_DEBUG` enables
    /// the debug echo whatever its value.
    pub fn resolve(flags: &ClientOverrides, env: &Environment) -> Result<Self, ConfigError> {
        let mut server_addr: Option<String> = None;
        apply(
            &mut server_addr,
            flags.server_addr.clone().map(Some),
            env,
            ENV_ADDR,
            "--addr",
            |raw| Ok(Some(raw.to_string())),
        )?;

        let mut port = DEFAULT_PORT;
        apply(&mut port, flags.port, env, ENV_PORT, "--port", |raw| {
            parse_port(ENV_PORT, raw)
        })?;
        if port == 0 {
            return Err(ConfigError::Validation(
                "port must be in 1-65535".to_string(),
            ));
        }

        let server_addr = server_addr.ok_or_else(|| {
            ConfigError::Validation(format!("server address is required (-a or {ENV_ADDR})"))
        })?;
        let server_addr = server_addr.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "server address must be an IP address, got {server_addr:?}"
            ))
        })?;

        let message = flags
            .message
            .clone()
            .ok_or_else(|| ConfigError::Validation("message is required (-m)".to_string()))?;

        Ok(Self {
            server_addr,
            port,
            message,
            debug: flags.debug || env.is_set(ENV_DEBUG),
        })
    }

    /// The server's socket address.
    pub fn target(&self) -> SocketAddr {
        SocketAddr::new(self.server_addr, self.port)
    }
}
