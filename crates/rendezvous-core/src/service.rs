//! Rendezvous service: registry + matcher behind one dispatch entry point.
//!
//! The server owns exactly one `Service` and feeds it one message at a
//! time, so every registry or matcher mutation happens in a single,
//! total order. A request that is rejected leaves both untouched.

use crate::error::RendezvousError;
use crate::matcher::BridgeMatcher;
use crate::messages::{BridgeRequest, Message, RegAck};
use crate::record::ClientRecord;
use crate::registry::ClientRegistry;

#[derive(Debug, Default)]
pub struct Service {
    registry: ClientRegistry,
    matcher: BridgeMatcher,
}

impl Service {
    pub fn new() -> Self {
        Service::default()
    }

    /// Process a single client request and return the one response to send.
    pub fn handle(&mut self, msg: Message) -> Result<Message, RendezvousError> {
        match msg {
            Message::Register(record) => self.process_register(record),
            Message::Bridge(request) => self.process_bridge(request),
            other => Err(RendezvousError::UnexpectedMessage(other.kind())),
        }
    }

    fn process_register(&mut self, record: ClientRecord) -> Result<Message, RendezvousError> {
        if record.id.is_empty() {
            return Err(RendezvousError::EmptyClientId);
        }
        if record.host.is_empty() {
            return Err(RendezvousError::EmptyHost(record.id));
        }

        self.matcher.refresh(&record);

        self.registry.register(record.clone());
        Ok(Message::RegAck(RegAck::registered(record)))
    }

    fn process_bridge(&mut self, request: BridgeRequest) -> Result<Message, RendezvousError> {
        // The requester's address comes from its registration, not the request.
        let requester = self
            .registry
            .lookup(&request.client_id)
            .cloned()
            .ok_or(RendezvousError::NotRegistered(request.client_id))?;

        Ok(Message::BridgeAck(self.matcher.request_bridge(requester)))
    }

    /// For the operator console: all registered clients, sorted by id.
    pub fn clients(&self) -> Vec<ClientRecord> {
        self.registry.records()
    }

    /// For the operator console: the requester waiting for a peer.
    pub fn pending(&self) -> Option<&ClientRecord> {
        self.matcher.pending()
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }
}
