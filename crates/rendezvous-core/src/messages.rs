//! Message types exchanged by clients, the server and peers.
//!
//! These are **transport-agnostic** logical messages. The text
//! encoder/decoder lives in the `rendezvous-protocol` crate; this
//! module is purely logical.

use crate::record::ClientRecord;

/// Status value the server puts in every REGACK.
pub const REGISTERED_STATUS: &str = "registered";

/// A single protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Client → server: record my reachable address.
    Register(ClientRecord),

    /// Server → client: registration accepted.
    RegAck(RegAck),

    /// Client → server: pair me with another client.
    Bridge(BridgeRequest),

    /// Server → client: outcome of a bridge request.
    BridgeAck(BridgeReply),

    /// Peer → peer: opens a chat session, carrying the dialer's own record.
    Chat(ClientRecord),
}

impl Message {
    /// Wire name of this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Register(_) => "REGISTER",
            Message::RegAck(_) => "REGACK",
            Message::Bridge(_) => "BRIDGE",
            Message::BridgeAck(_) => "BRIDGEACK",
            Message::Chat(_) => "CHAT",
        }
    }

    /// Convenience constructor for a BRIDGE request.
    pub fn bridge(client_id: impl Into<String>) -> Self {
        Message::Bridge(BridgeRequest {
            client_id: client_id.into(),
        })
    }
}

/// Acknowledgement of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegAck {
    /// The record as the server stored it.
    pub record: ClientRecord,

    /// Always [`REGISTERED_STATUS`] when produced by the server; kept as
    /// a string so any status read off the wire survives re-encoding.
    pub status: String,
}

impl RegAck {
    pub fn registered(record: ClientRecord) -> Self {
        RegAck {
            record,
            status: REGISTERED_STATUS.to_string(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.status == REGISTERED_STATUS
    }
}

/// Bridge request; only the id travels, the address comes from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub client_id: String,
}

/// Answer to a bridge request.
///
/// On the wire `NoPeerYet` is a BRIDGEACK whose fields are all empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeReply {
    /// Nobody is waiting yet: wait for a peer to dial in.
    NoPeerYet,

    /// Dial this peer.
    Peer(ClientRecord),
}

impl BridgeReply {
    pub fn peer(&self) -> Option<&ClientRecord> {
        match self {
            BridgeReply::NoPeerYet => None,
            BridgeReply::Peer(record) => Some(record),
        }
    }
}
