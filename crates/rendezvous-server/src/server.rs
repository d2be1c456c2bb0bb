//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections.
//! - Assigns each connection a `ConnectionId`.
//! - Spawns:
//!   - a per-connection task for the request/response cycle,
//!   - a single central service task that owns the registry and matcher,
//!   - the operator console on stdin.
//!
//! The per-connection logic, service loop and console live in
//! `connection`, `service_task` and `console` respectively.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::connection;
use crate::console;
use crate::service_task::ServiceHandle;
use crate::types::{ConnectionId, ConnectionTable};

/// Global-ish counter for assigning unique `ConnectionId`s.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Run the server with the given configuration: bind, start the
/// service task and console, then serve connections forever.
pub async fn run(config: Config) -> Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    let service = ServiceHandle::spawn();

    {
        let service = service.clone();
        tokio::spawn(async move {
            let input = BufReader::new(tokio::io::stdin());
            if let Err(err) = console::run_console(input, tokio::io::stdout(), service).await {
                warn!(error = %err, "console stopped");
            }
        });
    }

    serve(listener, config, service).await
}

/// Accept loop over an already bound listener.
///
/// Never returns under normal operation; accept errors are logged and
/// the loop carries on.
pub async fn serve(listener: TcpListener, config: Config, service: ServiceHandle) -> Result<()> {
    let connections: ConnectionTable = Arc::new(tokio::sync::RwLock::new(Default::default()));

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                handle_accept(stream, peer_addr, &config, &service, &connections).await
            }
            Err(err) => warn!(error = %err, "failed to accept connection"),
        }
    }
}

async fn handle_accept(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: &Config,
    service: &ServiceHandle,
    connections: &ConnectionTable,
) {
    let open = {
        let guard = connections.read().await;
        guard.len()
    };

    if open >= config.max_clients {
        warn!(
            %peer_addr,
            max_clients = config.max_clients,
            "rejecting connection: max_clients reached"
        );
        // Just drop the stream; client will see the connection closed.
        return;
    }

    let connection_id = next_connection_id();
    debug!(connection = connection_id.0, %peer_addr, "accepted connection");

    {
        let mut guard = connections.write().await;
        guard.insert(connection_id, peer_addr);
    }

    let service = service.clone();
    let connections = connections.clone();
    let idle_timeout = config.idle_timeout;

    tokio::spawn(async move {
        if let Err(err) =
            connection::run_connection(connection_id, stream, service, idle_timeout).await
        {
            warn!(connection = connection_id.0, %peer_addr, error = %err, "connection error");
        }

        let mut guard = connections.write().await;
        guard.remove(&connection_id);
    });
}
