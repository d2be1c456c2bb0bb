//! Client-side failures.
//!
//! Each variant names the address it happened against, so a single line
//! is enough to tell the user what went wrong and where. None of these
//! are fatal: the shell prints the error and returns to the prompt.

use std::io;

use rendezvous_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("error occurred on {addr}: timed out while {op}")]
    Timeout { addr: String, op: &'static str },

    #[error("error occurred on {addr}: connection closed by peer")]
    PeerClosed { addr: String },

    #[error("error occurred on {addr}: could not resolve address: {source}")]
    AddressResolution { addr: String, source: io::Error },

    #[error("error occurred on {addr}: could not connect: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("error occurred on {addr}: {source}")]
    Io { addr: String, source: io::Error },

    #[error("error occurred on {addr}: malformed message: {source}")]
    Malformed { addr: String, source: ProtocolError },

    #[error("error occurred on {addr}: unexpected {kind} message")]
    UnexpectedReply { addr: String, kind: &'static str },

    #[error("error occurred on {addr}: registration refused (status {status:?})")]
    RegistrationRefused { addr: String, status: String },

    /// The server closed a BRIDGE round trip without replying, which is
    /// how it refuses ids it has no registration for.
    #[error("error occurred on {addr}: server rejected the bridge request (not registered there?)")]
    BridgeRejected { addr: String },

    #[error("not registered with the server; use /register first")]
    NotRegistered,

    #[error("no bridge result yet; use /bridge first")]
    NoBridge,
}

impl SessionError {
    pub(crate) fn io(addr: &str, source: io::Error) -> Self {
        SessionError::Io {
            addr: addr.to_string(),
            source,
        }
    }

    pub(crate) fn timeout(addr: &str, op: &'static str) -> Self {
        SessionError::Timeout {
            addr: addr.to_string(),
            op,
        }
    }
}
