//! Error types for the rendezvous service.
//!
//! Malformed bytes never reach this layer (they are rejected by the
//! protocol crate); these are requests that parsed fine but cannot be
//! honoured.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendezvousError {
    /// BRIDGE from an id that never registered.
    #[error("client `{0}` is not registered")]
    NotRegistered(String),

    /// REGISTER with an empty clientID.
    #[error("client id must not be empty")]
    EmptyClientId,

    /// REGISTER with an empty IP: such an address could never be handed
    /// to a peer in a BRIDGEACK.
    #[error("client `{0}` registered without an address")]
    EmptyHost(String),

    /// A message kind the server does not accept from clients.
    #[error("unexpected {0} message")]
    UnexpectedMessage(&'static str),
}
