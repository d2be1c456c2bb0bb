//! Text encoding/decoding for rendezvous messages.
//!
//! This module converts between:
//! - raw message bytes (`&[u8]`)
//! - high-level `rendezvous_core::Message`
//!
//! Grammar (one message per buffer, every line CRLF-terminated):
//!
//! ```text
//! REGISTER\r\nclientID: <id>\r\nIP: <host>\r\nPort: <port>\r\n\r\n
//! REGACK\r\nclientID: <id>\r\nIP: <host>\r\nPort: <port>\r\nStatus: <status>\r\n\r\n
//! BRIDGE\r\nclientID: <id>\r\n\r\n
//! BRIDGEACK\r\nclientID: <id>\r\nIP: <host>\r\nPort: <port>\r\n\r\n
//! BRIDGEACK\r\nclientID: \r\nIP: \r\nPort: \r\n\r\n        (no peer yet)
//! CHAT\r\nclientID: <id>\r\nIP: <host>\r\nPort: <port>\r\n\r\n
//! ```
//!
//! Every declared field must be present, in order, exactly once, and
//! nothing may follow the terminating empty line. Ports are plain
//! decimal digits in 1..=65535 with no leading zero. Values are
//! otherwise taken verbatim, so an empty `clientID` parses fine.
//!
//! NOTE: `parse` expects exactly one message. A stream reader is
//! expected to find the message boundary itself (see [`message_end`])
//! and hand the framed bytes over.

use std::fmt;

use rendezvous_core::{BridgeReply, BridgeRequest, ClientRecord, Message, RegAck};

use crate::wire_types::{
    WireKind, FIELD_CLIENT_ID, FIELD_IP, FIELD_PORT, FIELD_SEPARATOR, FIELD_STATUS, LINE_END,
    MAX_MESSAGE_LEN, MESSAGE_END,
};

/// Errors that can arise when parsing or encoding a message.
///
/// Every parse variant is a flavour of "malformed message": the
/// connection that sent it is closed without a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// More than [`MAX_MESSAGE_LEN`] bytes.
    Oversized(usize),
    /// Bytes are not UTF-8.
    InvalidUtf8,
    /// No terminating empty line.
    Incomplete,
    /// First line is not a known kind.
    UnknownKind(String),
    /// A declared field is absent.
    MissingField(&'static str),
    /// A line where a different field (or none) was expected.
    UnexpectedLine { expected: &'static str, found: String },
    /// Lines left over after the last declared field.
    TrailingData(String),
    /// Port is not decimal digits in 1..=65535.
    InvalidPort(String),
    /// A value that cannot be carried (line breaks), or an inconsistent
    /// combination of values.
    InvalidField(&'static str),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Oversized(len) => {
                write!(f, "Message too large: {} bytes (max {})", len, MAX_MESSAGE_LEN)
            }
            ProtocolError::InvalidUtf8 => write!(f, "Message is not valid UTF-8"),
            ProtocolError::Incomplete => write!(f, "Message not terminated by an empty line"),
            ProtocolError::UnknownKind(kind) => write!(f, "Unknown message kind: {:?}", kind),
            ProtocolError::MissingField(field) => write!(f, "Missing field: {}", field),
            ProtocolError::UnexpectedLine { expected, found } => {
                write!(f, "Expected field {}, found {:?}", expected, found)
            }
            ProtocolError::TrailingData(line) => write!(f, "Unexpected extra line: {:?}", line),
            ProtocolError::InvalidPort(port) => write!(f, "Invalid port: {:?}", port),
            ProtocolError::InvalidField(field) => write!(f, "Invalid field: {}", field),
        }
    }
}

impl std::error::Error for ProtocolError {}

// ============================================================================
// Framing
// ============================================================================

/// Length of the first complete message in `buf`, terminator included.
///
/// Returns `None` until the `\r\n\r\n` terminator has arrived.
pub fn message_end(buf: &[u8]) -> Option<usize> {
    let end = MESSAGE_END.as_bytes();
    buf.windows(end.len())
        .position(|w| w == end)
        .map(|pos| pos + end.len())
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse exactly one message.
pub fn parse(buf: &[u8]) -> Result<Message, ProtocolError> {
    if buf.len() > MAX_MESSAGE_LEN {
        return Err(ProtocolError::Oversized(buf.len()));
    }

    let text = std::str::from_utf8(buf).map_err(|_| ProtocolError::InvalidUtf8)?;
    let body = text.strip_suffix(MESSAGE_END).ok_or(ProtocolError::Incomplete)?;

    let mut lines = body.split(LINE_END);
    let kind_line = lines.next().unwrap_or_default();
    let kind = WireKind::from_name(kind_line)
        .ok_or_else(|| ProtocolError::UnknownKind(kind_line.to_string()))?;

    let values = read_fields(kind.fields(), &mut lines)?;
    if let Some(extra) = lines.next() {
        return Err(ProtocolError::TrailingData(extra.to_string()));
    }

    match kind {
        WireKind::Register => Ok(Message::Register(parse_record(&values)?)),
        WireKind::Chat => Ok(Message::Chat(parse_record(&values)?)),
        WireKind::RegAck => Ok(Message::RegAck(RegAck {
            record: parse_record(&values)?,
            status: values[3].to_string(),
        })),
        WireKind::Bridge => Ok(Message::Bridge(BridgeRequest {
            client_id: values[0].to_string(),
        })),
        WireKind::BridgeAck => parse_bridge_ack(&values),
    }
}

/// Pull one `Name: value` line per declared field, in order.
fn read_fields<'a>(
    fields: &[&'static str],
    lines: &mut impl Iterator<Item = &'a str>,
) -> Result<Vec<&'a str>, ProtocolError> {
    let mut values = Vec::with_capacity(fields.len());

    for &field in fields {
        let line = lines.next().ok_or(ProtocolError::MissingField(field))?;
        let value = line
            .strip_prefix(field)
            .and_then(|rest| rest.strip_prefix(FIELD_SEPARATOR))
            .ok_or_else(|| ProtocolError::UnexpectedLine {
                expected: field,
                found: line.to_string(),
            })?;

        // `split` only breaks on CRLF; a bare CR or LF inside a value is
        // not something any encoder produces.
        if value.contains(['\r', '\n']) {
            return Err(ProtocolError::InvalidField(field));
        }

        values.push(value);
    }

    Ok(values)
}

fn parse_record(values: &[&str]) -> Result<ClientRecord, ProtocolError> {
    Ok(ClientRecord {
        id: values[0].to_string(),
        host: values[1].to_string(),
        port: parse_port(values[2])?,
    })
}

fn parse_bridge_ack(values: &[&str]) -> Result<Message, ProtocolError> {
    let (id, host, port) = (values[0], values[1], values[2]);

    if id.is_empty() && host.is_empty() && port.is_empty() {
        return Ok(Message::BridgeAck(BridgeReply::NoPeerYet));
    }

    // Partially filled acks are neither "wait" nor a usable peer.
    if id.is_empty() || host.is_empty() {
        return Err(ProtocolError::InvalidField("BRIDGEACK"));
    }

    Ok(Message::BridgeAck(BridgeReply::Peer(parse_record(values)?)))
}

fn parse_port(s: &str) -> Result<u16, ProtocolError> {
    let canonical = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && !(s.len() > 1 && s.starts_with('0'));

    match s.parse::<u16>() {
        Ok(port) if canonical && port != 0 => Ok(port),
        _ => Err(ProtocolError::InvalidPort(s.to_string())),
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a message, appending its bytes to `out`.
///
/// Fails only for values that could not be parsed back: line breaks in
/// a field, or port 0.
pub fn encode_message(msg: &Message, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let text = encode(msg)?;
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

/// Encode a message into its canonical text form.
pub fn encode(msg: &Message) -> Result<String, ProtocolError> {
    let mut out = String::with_capacity(128);

    match msg {
        Message::Register(record) => {
            start(&mut out, WireKind::Register);
            push_record(&mut out, record)?;
        }
        Message::RegAck(ack) => {
            start(&mut out, WireKind::RegAck);
            push_record(&mut out, &ack.record)?;
            push_field(&mut out, FIELD_STATUS, &ack.status)?;
        }
        Message::Bridge(req) => {
            start(&mut out, WireKind::Bridge);
            push_field(&mut out, FIELD_CLIENT_ID, &req.client_id)?;
        }
        Message::BridgeAck(BridgeReply::NoPeerYet) => {
            start(&mut out, WireKind::BridgeAck);
            push_field(&mut out, FIELD_CLIENT_ID, "")?;
            push_field(&mut out, FIELD_IP, "")?;
            push_field(&mut out, FIELD_PORT, "")?;
        }
        Message::BridgeAck(BridgeReply::Peer(record)) => {
            if record.id.is_empty() || record.host.is_empty() {
                return Err(ProtocolError::InvalidField("BRIDGEACK"));
            }
            start(&mut out, WireKind::BridgeAck);
            push_record(&mut out, record)?;
        }
        Message::Chat(record) => {
            start(&mut out, WireKind::Chat);
            push_record(&mut out, record)?;
        }
    }

    out.push_str(LINE_END);
    Ok(out)
}

fn start(out: &mut String, kind: WireKind) {
    out.push_str(kind.name());
    out.push_str(LINE_END);
}

fn push_record(out: &mut String, record: &ClientRecord) -> Result<(), ProtocolError> {
    if record.port == 0 {
        return Err(ProtocolError::InvalidPort("0".to_string()));
    }
    push_field(out, FIELD_CLIENT_ID, &record.id)?;
    push_field(out, FIELD_IP, &record.host)?;
    push_field(out, FIELD_PORT, &record.port.to_string())
}

fn push_field(out: &mut String, field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.contains(['\r', '\n']) {
        return Err(ProtocolError::InvalidField(field));
    }
    out.push_str(field);
    out.push_str(FIELD_SEPARATOR);
    out.push_str(value);
    out.push_str(LINE_END);
    Ok(())
}
