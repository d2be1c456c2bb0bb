//! Reachable address of a registered client.

use std::fmt;

/// A client's identifier and the address other peers should dial.
///
/// `host` is whatever the client advertised (an IPv4 literal or a
/// hostname); it is not resolved or validated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientRecord {
    /// Unique key in the registry.
    pub id: String,

    /// Advertised host.
    pub host: String,

    /// Advertised TCP port (1..=65535).
    pub port: u16,
}

impl ClientRecord {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        ClientRecord {
            id: id.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for dialing or printing.
    pub fn addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Formats as `<id> <host>:<port>`, the console listing format.
impl fmt::Display for ClientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.id, self.host, self.port)
    }
}
