//! Shared types for the rendezvous TCP server.
//!
//! This module defines:
//! - `ConnectionId`: a lightweight handle for accepted connections
//! - `ServiceRequest`: messages flowing from connection tasks (and the
//!   console) to the service task, each with its own reply channel
//! - channel aliases and the table of open connections

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use rendezvous_core::{ClientRecord, Message, RendezvousError};
use tokio::sync::{mpsc, oneshot, RwLock};

/// Identifier for an accepted connection.
///
/// This is intentionally opaque; we just guarantee uniqueness
/// over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Lifecycle of one request/response connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket accepted, nothing read yet.
    Accepted,
    /// Some bytes read, waiting for the terminating empty line.
    AwaitingMessage,
    /// Complete request handed to the service task.
    Dispatched,
    /// Done; the socket is being dropped.
    Closed,
}

/// Point-in-time copy of the service state, for the operator console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    /// Registered clients, sorted by id.
    pub clients: Vec<ClientRecord>,

    /// Client waiting for a bridge partner, if any.
    pub pending: Option<ClientRecord>,
}

/// Message flowing into the central service task.
#[derive(Debug)]
pub enum ServiceRequest {
    /// A parsed client request; the reply is the single response to send back.
    Dispatch {
        connection_id: ConnectionId,
        msg: Message,
        reply: oneshot::Sender<Result<Message, RendezvousError>>,
    },

    /// Console `/info`.
    Snapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
}

/// Channel from connections / console → service task.
pub type ServiceTx = mpsc::UnboundedSender<ServiceRequest>;
pub type ServiceRx = mpsc::UnboundedReceiver<ServiceRequest>;

/// Open connections and their peer addresses.
///
/// Only used for the `max_clients` limit and logging; protocol state
/// lives in the service task.
pub type ConnectionTable = Arc<RwLock<HashMap<ConnectionId, SocketAddr>>>;
