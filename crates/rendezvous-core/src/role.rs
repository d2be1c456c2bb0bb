//! Chat role (Listener / Initiator) for a bridged client.

use crate::messages::BridgeReply;

/// Which side of the peer connection a bridged client takes.
///
/// The first bridge requester is told to wait and becomes the
/// `Listener`; the second is handed the first one's address and
/// becomes the `Initiator`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChatRole {
    /// Accepts one incoming connection and reads first.
    Listener,
    /// Dials the peer and writes first.
    Initiator,
}

impl ChatRole {
    /// The role implied by a bridge reply.
    pub fn for_reply(reply: &BridgeReply) -> Self {
        match reply {
            BridgeReply::NoPeerYet => ChatRole::Listener,
            BridgeReply::Peer(_) => ChatRole::Initiator,
        }
    }

    /// Whether this side sends the first chat line.
    pub fn writes_first(self) -> bool {
        matches!(self, ChatRole::Initiator)
    }
}
