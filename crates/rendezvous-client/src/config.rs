// crates/rendezvous-client/src/config.rs

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the chat client.
///
/// Every field has a default, so a config file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Host put in REGISTER and CHAT messages, i.e. where peers dial us.
    pub advertise_host: String,

    /// Interface the listener role binds.
    pub listen_host: String,

    /// Bound on each server round trip and on dialing a peer.
    pub server_timeout_secs: u64,

    /// How long the listener role waits for its peer to dial in.
    pub peer_wait_timeout_secs: u64,

    /// Bound on each chat read/write once the session is open.
    pub chat_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            advertise_host: "127.0.0.1".to_string(),
            listen_host: "0.0.0.0".to_string(),
            server_timeout_secs: 10,
            peer_wait_timeout_secs: 60,
            chat_timeout_secs: 300,
        }
    }
}

impl ClientConfig {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server_timeout_secs)
    }

    pub fn peer_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_wait_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str("peer_wait_timeout_secs = 5\n").unwrap();

        assert_eq!(config.peer_wait_timeout(), Duration::from_secs(5));
        assert_eq!(config.server_timeout(), Duration::from_secs(10));
        assert_eq!(config.advertise_host, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ClientConfig>("advertise_hots = \"10.0.0.1\"\n").is_err());
    }
}
