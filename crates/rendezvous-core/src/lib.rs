//! rendezvous-core
//!
//! Pure rendezvous logic:
//! - client records and chat roles
//! - messages (register / bridge / chat)
//! - the client registry
//! - the single-slot bridge matcher
//! - the service that dispatches messages to both

pub mod record;
pub mod role;
pub mod messages;
pub mod registry;
pub mod matcher;
pub mod service;
pub mod error;

pub use record::ClientRecord;
pub use role::ChatRole;

pub use messages::{
    BridgeReply,
    BridgeRequest,
    Message,
    RegAck,
    REGISTERED_STATUS,
};

pub use registry::ClientRegistry;
pub use matcher::BridgeMatcher;
pub use service::Service;
pub use error::RendezvousError;
