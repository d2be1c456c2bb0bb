//! rendezvous-protocol
//!
//! Wire-level encoding/decoding for the rendezvous service.
//!
//! This crate is responsible for turning logical messages
//! (`rendezvous_core::Message`) into CRLF text and back again.
//!
//! - [`wire_types`] : message kinds, field names, framing constants
//! - [`text_codec`] : parser and encoder

pub mod wire_types;
pub mod text_codec;

pub use text_codec::{
    ProtocolError,
    encode,
    encode_message,
    message_end,
    parse,
};

pub use wire_types::{MAX_MESSAGE_LEN, QUIT_SENTINEL};
