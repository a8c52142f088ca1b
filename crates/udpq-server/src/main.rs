#![deny(unsafe_code)]

//! udpq-server — datagram job queue server.

mod background;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use udpq_config::{Environment, ServerConfig, ServerOverrides};
use udpq_core::{Daemon, logging};

use background::{SystemDaemonizer, detach_if_requested};

/// udpq — a UDP job queue: PUT numbers, GET them back in order, EXIT to stop.
///
/// UDPQ_ADDR, UDPQ_PORT, UDPQ_LOGFILE and UDPQ_WAIT override the matching
/// options; giving both is an error. The unprefixed ADDR, PORT, LOGFILE and
/// WAIT variables are not read.
#[derive(Parser, Debug)]
#[command(name = "udpq-server", version = udpq_core::build_info::VERSION_LINE)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IP address to bind.
    #[arg(short, long)]
    addr: Option<String>,

    /// UDP port to bind (1-65535).
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Log file, opened for appending.
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Seconds to pause after each reply.
    #[arg(short, long)]
    wait: Option<u64>,

    /// Run in the background.
    #[arg(short, long)]
    daemon: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the resolved configuration and exit without opening the log file.
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn overrides(&self) -> ServerOverrides {
        ServerOverrides {
            bind_addr: self.addr.clone(),
            port: self.port,
            log_file: self.log_file.clone(),
            delay_secs: self.wait,
            background: self.daemon,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli, &Environment::from_process())?;

    if cli.check {
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
        return Ok(());
    }

    detach_if_requested(config.server.background, &SystemDaemonizer)?;

    let sink = logging::init(&config.logging, cli.verbose, !config.server.background)?;
    info!(log_file = %sink.path().display(), "Logging initialised");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(serve(config));

    sink.close();
    result
}

async fn serve(config: ServerConfig) -> Result<()> {
    let daemon = Daemon::bind(config).await?;
    let report = daemon.run().await?;
    info!(reason = %report.reason, discarded = report.discarded.len(), "Server stopped");
    Ok(())
}

fn resolve_config(cli: &Cli, env: &Environment) -> Result<ServerConfig> {
    let base = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = base.resolve(&cli.overrides(), env)?;
    if !cli.check {
        config.prepare_log_file()?;
    }
    Ok(config)
}
