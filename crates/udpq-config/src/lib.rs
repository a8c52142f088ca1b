#![deny(unsafe_code)]

//! Configuration loading, environment overrides, and validation for udpq.
//!
//! A configuration is assembled in layers: built-in defaults, an optional
//! TOML file, command-line flags, and finally `UDPQ_*` environment variables.
//! Setting the same option both as a flag and in the environment is an error
//! rather than a silent override. [`ServerConfig`] covers the queue server,
//! [`ClientConfig`] the one-shot client.

/// Client-side configuration.
pub mod client;
/// Environment snapshot and variable names.
pub mod env;

use std::fs::OpenOptions;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use client::{ClientConfig, ClientOverrides};
pub use env::Environment;

use env::{ENV_ADDR, ENV_LOGFILE, ENV_PORT, ENV_WAIT};

/// Port used by both server and client when nothing else is configured.
pub const DEFAULT_PORT: u16 = 12345;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("option {flag} conflicts with environment variable {var}")]
    Conflict { flag: &'static str, var: &'static str },

    #[error("log file {} cannot be opened for appending: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Top-level server configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket and request-processing settings.
    #[serde(default)]
    pub server: ListenConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Socket and request-processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenConfig {
    /// IP address the UDP socket binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// UDP port (1–65535).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Simulated processing delay applied after every reply, in seconds.
    #[serde(default)]
    pub delay_secs: u64,

    /// Detach from the terminal and run in the background.
    #[serde(default)]
    pub background: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            delay_secs: 0,
            background: false,
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append-only log file.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/udpq.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Server options given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct ServerOverrides {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub log_file: Option<PathBuf>,
    pub delay_secs: Option<u64>,
    pub background: bool,
}

impl ServerConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// This is synchronous on purpose: the server resolves its configuration
    /// before it may fork into the background, and before any async runtime
    /// exists.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line flags and environment variables on top of this
    /// configuration, then validate the result.
    pub fn resolve(
        mut self,
        flags: &ServerOverrides,
        env: &Environment,
    ) -> Result<Self, ConfigError> {
        apply(
            &mut self.server.bind_addr,
            flags.bind_addr.clone(),
            env,
            ENV_ADDR,
            "--addr",
            |raw| Ok(raw.to_string()),
        )?;
        apply(
            &mut self.server.port,
            flags.port,
            env,
            ENV_PORT,
            "--port",
            |raw| parse_port(ENV_PORT, raw),
        )?;
        apply(
            &mut self.logging.file,
            flags.log_file.clone(),
            env,
            ENV_LOGFILE,
            "--log-file",
            |raw| Ok(PathBuf::from(raw)),
        )?;
        apply(
            &mut self.server.delay_secs,
            flags.delay_secs,
            env,
            ENV_WAIT,
            "--wait",
            |raw| parse_delay(ENV_WAIT, raw),
        )?;
        if flags.background {
            self.server.background = true;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_addr.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind_addr must be an IP address, got {:?}",
                self.server.bind_addr
            )));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be in 1-65535".to_string(),
            ));
        }
        if self.logging.file.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "logging.file must not be empty".to_string(),
            ));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of trace, debug, info, warn, error; got {:?}",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Check that the log file can be opened for appending (creating it if
    /// needed) and rewrite its path as an absolute path.
    ///
    /// The absolute path stays valid after the process changes its working
    /// directory when detaching into the background.
    pub fn prepare_log_file(&mut self) -> Result<(), ConfigError> {
        let path = std::path::absolute(&self.logging.file).map_err(|source| {
            ConfigError::LogFile {
                path: self.logging.file.clone(),
                source,
            }
        })?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ConfigError::LogFile {
                path: path.clone(),
                source,
            })?;
        self.logging.file = path;
        Ok(())
    }

    /// The socket address the server binds to.
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind_addr.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "server.bind_addr must be an IP address, got {:?}",
                self.server.bind_addr
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

/// Layer one option: environment beats flag beats the current value, and
/// both at once is a conflict.
pub(crate) fn apply<T>(
    slot: &mut T,
    flag: Option<T>,
    env: &Environment,
    var: &'static str,
    flag_name: &'static str,
    parse: impl FnOnce(&str) -> Result<T, ConfigError>,
) -> Result<(), ConfigError> {
    match (env.get(var), flag) {
        (Some(_), Some(_)) => Err(ConfigError::Conflict {
            flag: flag_name,
            var,
        }),
        (Some(raw), None) => {
            *slot = parse(raw)?;
            tracing::debug!(var, "option taken from environment");
            Ok(())
        }
        (None, Some(value)) => {
            *slot = value;
            tracing::debug!(flag = flag_name, "option taken from command line");
            Ok(())
        }
        (None, None) => Ok(()),
    }
}

pub(crate) fn parse_port(var: &str, raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::Validation(format!(
            "{var} must be a port in 1-65535, got {raw:?}"
        ))),
    }
}

fn parse_delay(var: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::Validation(format!(
            "{var} must be a non-negative whole number of seconds, got {raw:?}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 12345);
        assert_eq!(config.server.delay_secs, 0);
        assert!(!config.server.background);
        assert_eq!(config.logging.file, PathBuf::from("/tmp/udpq.log"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [server]
            bind_addr = "127.0.0.1"
            port = 4000
            delay_secs = 2
            background = true

            [logging]
            file = "/var/log/udpq.log"
            level = "debug"
        "#;
        let config = ServerConfig::parse(toml).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.delay_secs, 2);
        assert!(config.server.background);
        assert_eq!(config.logging.file, PathBuf::from("/var/log/udpq.log"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let result = ServerConfig::parse("[server]\nport = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_parse_rejects_out_of_range_port() {
        let result = ServerConfig::parse("[server]\nport = 70000\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_rejects_bad_addr() {
        let result = ServerConfig::parse("[server]\nbind_addr = \"999.1.1.1\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_negative_delay() {
        let result = ServerConfig::parse("[server]\ndelay_secs = -1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_level() {
        let result = ServerConfig::parse("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_ipv6_bind_addr_is_accepted() {
        let config = ServerConfig::parse("[server]\nbind_addr = \"::1\"\n").unwrap();
        let addr = config.bind_socket_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    // ── Layered resolution ──────────────────────────────────────────

    #[test_log::test]
    fn test_flags_override_file_values() {
        let flags = ServerOverrides {
            bind_addr: Some("127.0.0.1".to_string()),
            port: Some(5000),
            delay_secs: Some(3),
            background: true,
            ..Default::default()
        };
        let config = ServerConfig::default()
            .resolve(&flags, &Environment::empty())
            .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.delay_secs, 3);
        assert!(config.server.background);
    }

    #[test_log::test]
    fn test_environment_overrides_defaults() {
        let env = Environment::from_pairs([
            ("UDPQ_ADDR", "127.0.0.1"),
            ("UDPQ_PORT", "4242"),
            ("UDPQ_WAIT", "1"),
            ("UDPQ_LOGFILE", "/tmp/other.log"),
        ]);
        let config = ServerConfig::default()
            .resolve(&ServerOverrides::default(), &env)
            .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.server.port, 4242);
        assert_eq!(config.server.delay_secs, 1);
        assert_eq!(config.logging.file, PathBuf::from("/tmp/other.log"));
    }

    #[test_log::test]
    fn test_flag_and_environment_conflict() {
        let env = Environment::from_pairs([("UDPQ_PORT", "4242")]);
        let flags = ServerOverrides {
            port: Some(5000),
            ..Default::default()
        };
        let err = ServerConfig::default().resolve(&flags, &env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Conflict {
                flag: "--port",
                var: "UDPQ_PORT"
            }
        ));
    }

    #[test_log::test]
    fn test_environment_port_out_of_range() {
        for raw in ["0", "65536", "abc", ""] {
            let env = Environment::from_pairs([("UDPQ_PORT", raw)]);
            let result = ServerConfig::default().resolve(&ServerOverrides::default(), &env);
            assert!(
                matches!(result, Err(ConfigError::Validation(_))),
                "port {raw:?} should be rejected"
            );
        }
    }

    #[test_log::test]
    fn test_environment_negative_wait_rejected() {
        let env = Environment::from_pairs([("UDPQ_WAIT", "-1")]);
        let result = ServerConfig::default().resolve(&ServerOverrides::default(), &env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test_log::test]
    fn test_environment_bad_addr_rejected() {
        let env = Environment::from_pairs([("UDPQ_ADDR", "localhost")]);
        let result = ServerConfig::default().resolve(&ServerOverrides::default(), &env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test_log::test]
    fn test_flag_zero_port_rejected() {
        let flags = ServerOverrides {
            port: Some(0),
            ..Default::default()
        };
        let result = ServerConfig::default().resolve(&flags, &Environment::empty());
        assert!(result.is_err());
    }

    // ── Log file checks ─────────────────────────────────────────────

    #[test]
    fn test_prepare_log_file_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("server.log");
        let mut config = ServerConfig::default();
        config.logging.file = path.clone();

        config.prepare_log_file().unwrap();
        assert!(path.exists());
        assert!(config.logging.file.is_absolute());
    }

    #[test]
    fn test_prepare_log_file_rejects_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.logging.file = tmp.path().join("missing").join("server.log");

        let err = config.prepare_log_file().unwrap_err();
        assert!(matches!(err, ConfigError::LogFile { .. }));
    }

    // ── File-based loading ──────────────────────────────────────────

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("udpq.toml");
        std::fs::write(&path, b"[server]\nport = 4242\nbind_addr = \"127.0.0.1\"\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 4242);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ServerConfig::load(Path::new("/nonexistent/udpq.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, b"not valid toml [[[").unwrap();

        let result = ServerConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_serialized_config_parses_back() {
        let mut config = ServerConfig::default();
        config.server.port = 6000;
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ServerConfig::parse(&text).unwrap(), config);
    }

    // ── Error display ───────────────────────────────────────────────

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");

        let err = ConfigError::Conflict {
            flag: "--addr",
            var: "UDPQ_ADDR",
        };
        assert_eq!(
            err.to_string(),
            "option --addr conflicts with environment variable UDPQ_ADDR"
        );
    }
}
