//! rendezvous-client
//!
//! Client side of the rendezvous chat:
//! - [`session`] : register → bridge → listen/connect → chat state machine
//! - [`chat`]    : strict turn-taking chat loop between two peers
//! - [`network`] : dialing, framed message I/O and server round trips
//! - [`shell`]   : the interactive `/command` loop
//! - [`config`]  : timeouts and addresses, optionally from a TOML file

pub mod config;
pub mod error;
pub mod network;
pub mod chat;
pub mod session;
pub mod commands;
pub mod shell;

pub use config::ClientConfig;
pub use error::SessionError;
pub use session::{Session, SessionState};
pub use chat::ChatOutcome;
