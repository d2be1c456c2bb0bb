//! Low-level wire types and constants.
//!
//! This module defines:
//! - The message kinds and the exact field list each one carries.
//! - Line / message terminators.
//! - Size limits.
//!
//! The actual parse/encode logic lives in `text_codec`.

/// Terminates every line, including the kind line.
pub const LINE_END: &str = "\r\n";

/// Terminates a whole message (last field line + empty line).
pub const MESSAGE_END: &str = "\r\n\r\n";

/// Separates a field name from its value.
pub const FIELD_SEPARATOR: &str = ": ";

/// Largest message a peer may send before it is considered malformed.
///
/// Matches the single-read buffer size clients have always used, so a
/// request never needs more than one buffer.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Chat line that means "I am ending the session".
pub const QUIT_SENTINEL: &str = "QUIT";

pub const FIELD_CLIENT_ID: &str = "clientID";
pub const FIELD_IP: &str = "IP";
pub const FIELD_PORT: &str = "Port";
pub const FIELD_STATUS: &str = "Status";

/// Message kinds, named by their first line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireKind {
    Register,
    RegAck,
    Bridge,
    BridgeAck,
    Chat,
}

impl WireKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "REGISTER" => Some(WireKind::Register),
            "REGACK" => Some(WireKind::RegAck),
            "BRIDGE" => Some(WireKind::Bridge),
            "BRIDGEACK" => Some(WireKind::BridgeAck),
            "CHAT" => Some(WireKind::Chat),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WireKind::Register => "REGISTER",
            WireKind::RegAck => "REGACK",
            WireKind::Bridge => "BRIDGE",
            WireKind::BridgeAck => "BRIDGEACK",
            WireKind::Chat => "CHAT",
        }
    }

    /// Fields this kind carries, in wire order. All are required.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            WireKind::Register | WireKind::BridgeAck | WireKind::Chat => {
                &[FIELD_CLIENT_ID, FIELD_IP, FIELD_PORT]
            }
            WireKind::RegAck => &[FIELD_CLIENT_ID, FIELD_IP, FIELD_PORT, FIELD_STATUS],
            WireKind::Bridge => &[FIELD_CLIENT_ID],
        }
    }
}
