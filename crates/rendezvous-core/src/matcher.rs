//! Single-slot bridge matcher.
//!
//! Pairs bridge requests strictly in arrival order:
//! - The first requester is parked in the pending slot and told to wait
//!   (it becomes the listener).
//! - The next requester is handed the parked record (it becomes the
//!   initiator) and the slot is cleared.
//!
//! The slot holds at most one record at any time. Clearing it on match
//! means a third requester starts a fresh pairing instead of being sent
//! to a peer that is already chatting.

use crate::messages::BridgeReply;
use crate::record::ClientRecord;

#[derive(Debug, Default)]
pub struct BridgeMatcher {
    pending: Option<ClientRecord>,
}

impl BridgeMatcher {
    pub fn new() -> Self {
        BridgeMatcher::default()
    }

    /// Resolve one bridge request against the pending slot.
    pub fn request_bridge(&mut self, requester: ClientRecord) -> BridgeReply {
        match self.pending.take() {
            None => {
                self.pending = Some(requester);
                BridgeReply::NoPeerYet
            }
            // Same client asking again while still parked: refresh its
            // address, keep it waiting. Never pair a client with itself.
            Some(parked) if parked.id == requester.id => {
                self.pending = Some(requester);
                BridgeReply::NoPeerYet
            }
            Some(parked) => BridgeReply::Peer(parked),
        }
    }

    /// Re-registration of the parked client: hand out its new address.
    pub fn refresh(&mut self, record: &ClientRecord) {
        if let Some(parked) = self.pending.as_mut().filter(|p| p.id == record.id) {
            *parked = record.clone();
        }
    }

    /// The requester currently waiting for a peer, if any.
    pub fn pending(&self) -> Option<&ClientRecord> {
        self.pending.as_ref()
    }
}
