// Shared fixtures: a live rendezvous server and client configs aimed at it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use rendezvous_client::network::ServerLink;
use rendezvous_client::{ClientConfig, Session};
use rendezvous_core::ClientRecord;
use rendezvous_server::config::Config;
use rendezvous_server::server::serve;
use rendezvous_server::service_task::ServiceHandle;
use tokio::net::TcpListener;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn start_server() -> (SocketAddr, ServiceHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = ServiceHandle::spawn();

    let config = Config {
        bind_addr: "127.0.0.1".to_string(),
        port: addr.port(),
        idle_timeout: Duration::from_secs(5),
        ..Config::default()
    };

    let serve_handle = service.clone();
    tokio::spawn(async move {
        let _ = serve(listener, config, serve_handle).await;
    });

    (addr, service)
}

/// A port nothing is listening on right now.
pub fn free_port() -> u16 {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap().port()
}

pub fn loopback_config() -> ClientConfig {
    ClientConfig {
        advertise_host: "127.0.0.1".to_string(),
        listen_host: "127.0.0.1".to_string(),
        server_timeout_secs: 5,
        peer_wait_timeout_secs: 5,
        chat_timeout_secs: 5,
    }
}

pub fn session(id: &str, server: SocketAddr) -> Session {
    let link = ServerLink::new("127.0.0.1", server.port(), Duration::from_secs(5));
    Session::new(id, free_port(), link, loopback_config())
}

/// Poll the server until `id` holds the pending bridge slot.
pub async fn wait_until_pending(service: &ServiceHandle, id: &str) -> ClientRecord {
    tokio::time::timeout(TEST_TIMEOUT, async {
        loop {
            let snapshot = service.snapshot().await.unwrap();
            if let Some(record) = snapshot.pending.filter(|r| r.id == id) {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never became pending")
}
