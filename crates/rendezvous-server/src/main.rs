//! Rendezvous server binary.

use anyhow::Result;
use clap::Parser;
use rendezvous_server::config::Config;
use rendezvous_server::{console, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rendezvous-server")]
#[command(about = "Registers chat clients and bridges them in pairs")]
struct Cli {
    /// Port to listen on (overrides RENDEZVOUS_PORT)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Interface to bind (overrides RENDEZVOUS_BIND_ADDR)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?.with_overrides(cli.bind, cli.port);

    info!(
        bind = %config.bind_addr,
        port = config.port,
        max_clients = config.max_clients,
        idle_timeout_secs = config.idle_timeout.as_secs(),
        "starting rendezvous-server"
    );

    tokio::select! {
        res = server::run(config) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, closing all connections");
            console::say_farewell(tokio::io::stdout()).await
        }
    }
}
