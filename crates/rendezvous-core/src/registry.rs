//! In-memory client registry.
//!
//! Maps client id to the last address that client registered. There is
//! no unregister and no expiry: an entry lives until it is overwritten
//! or the process exits.

use std::collections::HashMap;

use crate::record::ClientRecord;

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, ClientRecord>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        ClientRegistry::default()
    }

    /// Insert or overwrite the record keyed by `record.id`.
    ///
    /// Returns the previous record for that id, if any.
    pub fn register(&mut self, record: ClientRecord) -> Option<ClientRecord> {
        self.clients.insert(record.id.clone(), record)
    }

    pub fn lookup(&self, id: &str) -> Option<&ClientRecord> {
        self.clients.get(id)
    }

    /// All records, sorted by id.
    pub fn records(&self) -> Vec<ClientRecord> {
        let mut records: Vec<ClientRecord> = self.clients.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
