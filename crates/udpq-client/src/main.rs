#![deny(unsafe_code)]

//! udpq — send one request to a udpq server and print the reply.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use udpq_config::{ClientConfig, ClientOverrides, Environment};
use udpq_core::QueueClient;

/// Send one request (`PUT <n>`, `GET`, `EXIT`) to a udpq server.
///
/// UDPQ_ADDR and UDPQ_PORT override the matching options; giving both is an
/// error. Setting UDPQ_DEBUG enables the debug echo. The unprefixed ADDR,
/// PORT and DEBUG variables are not read.
#[derive(Parser, Debug)]
#[command(name = "udpq", version = udpq_core::build_info::VERSION_LINE)]
struct Cli {
    /// Server IP address.
    #[arg(short, long)]
    addr: Option<String>,

    /// Server UDP port.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Request to send, e.g. "PUT 42".
    #[arg(short, long)]
    message: Option<String>,

    /// Echo the outgoing request to stderr.
    #[arg(short = 'v', long = "debug")]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> ClientOverrides {
        ClientOverrides {
            server_addr: self.addr.clone(),
            port: self.port,
            message: self.message.clone(),
            debug: self.debug,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::resolve(&cli.overrides(), &Environment::from_process())?;

    let filter = if config.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if config.debug {
        eprintln!("Debug: Sending message '{}' to {}", config.message, config.target());
    }

    let reply = QueueClient::new(config.target())
        .request(&config.message)
        .await?;
    println!("{}", format_reply(&reply));
    Ok(())
}

fn format_reply(reply: &str) -> String {
    format!("Received from server: {reply}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use udpq_test_utils::TestServer;

    #[test]
    fn test_cli_maps_to_overrides() {
        let cli =
            Cli::try_parse_from(["udpq", "-a", "127.0.0.1", "-p", "4000", "-m", "GET", "-v"])
                .unwrap();
        let o = cli.overrides();
        assert_eq!(o.server_addr.as_deref(), Some("127.0.0.1"));
        assert_eq!(o.port, Some(4000));
        assert_eq!(o.message.as_deref(), Some("GET"));
        assert!(o.debug);
    }

    #[test]
    fn test_help_names_environment_variables() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("UDPQ_DEBUG"));
        assert!(help.contains("unprefixed ADDR"));
    }

    #[test]
    fn test_format_reply() {
        assert_eq!(format_reply("OK\n"), "Received from server: OK\n");
    }

    #[tokio::test]
    async fn test_resolved_config_reaches_server() {
        udpq_test_utils::tracing_setup::init_test_tracing();
        let server = TestServer::start_default().await;
        let overrides = ClientOverrides {
            server_addr: Some("127.0.0.1".to_string()),
            port: Some(server.addr().port()),
            message: Some("PUT 7".to_string()),
            debug: false,
        };
        let config = ClientConfig::resolve(&overrides, &Environment::empty()).unwrap();
        let reply = QueueClient::new(config.target())
            .request(&config.message)
            .await
            .unwrap();
        assert_eq!(reply, "OK\n");
        assert_eq!(server.request("GET").await, "7");

        server.shutdown();
        server.join().await;
    }
}
