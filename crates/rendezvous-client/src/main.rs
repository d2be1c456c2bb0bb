// crates/rendezvous-client/src/main.rs

use std::net::SocketAddrV4;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rendezvous_client::network::ServerLink;
use rendezvous_client::shell::run_shell;
use rendezvous_client::{ClientConfig, Session};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rendezvous-client")]
#[command(about = "Peer-to-peer chat client using a rendezvous server")]
struct Cli {
    /// Client ID
    #[arg(long)]
    id: String,

    /// Port this client listens on when it is the one waiting for a peer
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Server address as IPv4:port
    #[arg(long, value_parser = parse_server)]
    server: SocketAddrV4,

    /// Optional TOML config file (timeouts, advertised host)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging (to stderr)
    #[arg(short, long)]
    debug: bool,
}

fn parse_server(s: &str) -> Result<SocketAddrV4, String> {
    let addr: SocketAddrV4 = s
        .parse()
        .map_err(|_| format!("invalid server address {:?}, expected IPv4:port", s))?;
    if addr.port() == 0 {
        return Err("invalid server port 0".to_string());
    }
    Ok(addr)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    let server = ServerLink::new(
        cli.server.ip().to_string(),
        cli.server.port(),
        config.server_timeout(),
    );
    println!("{} running on {}:{}", cli.id, config.advertise_host, cli.port);

    let mut session = Session::new(cli.id, cli.port, server, config);
    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    tokio::select! {
        res = run_shell(&mut session, &mut input, &mut output) => res,
        _ = tokio::signal::ctrl_c() => {
            println!("Terminating the chat client.\nExiting program");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_must_be_ipv4_with_port() {
        assert!(parse_server("127.0.0.1:9000").is_ok());
        assert!(parse_server("127.0.0.1").is_err());
        assert!(parse_server("localhost:9000").is_err());
        assert!(parse_server("256.0.0.1:9000").is_err());
        assert!(parse_server("127.0.0.1:0").is_err());
        assert!(parse_server("127.0.0.1:70000").is_err());
    }
}
