//! Configuration for the rendezvous TCP server.
//!
//! Defaults can be overridden via environment variables, and the bind
//! address / port again via command-line flags:
//!
//! - `RENDEZVOUS_BIND_ADDR`         (default: "0.0.0.0")
//! - `RENDEZVOUS_PORT`              (default: "9000")
//! - `RENDEZVOUS_MAX_CLIENTS`       (default: "1024")
//! - `RENDEZVOUS_IDLE_TIMEOUT_SECS` (default: "30")

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously open connections.
    pub max_clients: usize,

    /// How long a connection may sit without delivering a complete
    /// request before it is closed.
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 9000,
            max_clients: 1024,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let bind_addr = env::var("RENDEZVOUS_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = read_env_or_default("RENDEZVOUS_PORT", defaults.port)?;
        let max_clients = read_env_or_default("RENDEZVOUS_MAX_CLIENTS", defaults.max_clients)?;
        let idle_secs =
            read_env_or_default("RENDEZVOUS_IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs())?;

        Ok(Config {
            bind_addr,
            port,
            max_clients,
            idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, bind_addr: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, val)),
        Err(_) => Ok(default),
    }
}
