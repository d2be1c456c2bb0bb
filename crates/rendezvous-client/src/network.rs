// crates/rendezvous-client/src/network.rs

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use rendezvous_core::Message;
use rendezvous_protocol::{encode, message_end, parse, ProtocolError, MAX_MESSAGE_LEN};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

use crate::error::SessionError;

/// Run `fut`, failing with [`SessionError::Timeout`] once `limit` passes.
pub async fn bounded<T, F>(
    limit: Duration,
    addr: &str,
    op: &'static str,
    fut: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    timeout(limit, fut)
        .await
        .map_err(|_| SessionError::timeout(addr, op))?
}

/// Resolve `host:port` (IPv4 literal or hostname) and connect to it.
pub async fn dial(host: &str, port: u16, limit: Duration) -> Result<TcpStream, SessionError> {
    let addr = format!("{}:{}", host, port);

    bounded(limit, &addr, "connecting", async {
        let target: SocketAddr = lookup_host(addr.as_str())
            .await
            .map_err(|source| SessionError::AddressResolution {
                addr: addr.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| SessionError::AddressResolution {
                addr: addr.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
            })?;

        let stream = TcpStream::connect(target)
            .await
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream
            .set_nodelay(true)
            .map_err(|source| SessionError::io(&addr, source))?;

        debug!(%target, "connected");
        Ok(stream)
    })
    .await
}

/// Encode and send one protocol message.
pub async fn write_message<W>(writer: &mut W, msg: &Message, addr: &str) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let text = encode(msg).map_err(|source| SessionError::Malformed {
        addr: addr.to_string(),
        source,
    })?;

    writer
        .write_all(text.as_bytes())
        .await
        .map_err(|e| SessionError::io(addr, e))?;
    writer.flush().await.map_err(|e| SessionError::io(addr, e))?;

    debug!(addr, kind = msg.kind(), "sent message");
    Ok(())
}

/// Read exactly one protocol message.
///
/// Reads line by line so that nothing past the terminating empty line is
/// consumed; whatever follows (chat lines, after a CHAT handshake) stays
/// in the reader's buffer.
pub async fn read_message<R>(reader: &mut R, addr: &str) -> Result<Message, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);

    loop {
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| SessionError::io(addr, e))?;
        if n == 0 {
            return Err(SessionError::PeerClosed {
                addr: addr.to_string(),
            });
        }

        if let Some(end) = message_end(&buf) {
            let msg = parse(&buf[..end]).map_err(|source| SessionError::Malformed {
                addr: addr.to_string(),
                source,
            })?;
            debug!(addr, kind = msg.kind(), "received message");
            return Ok(msg);
        }

        if buf.len() > MAX_MESSAGE_LEN {
            return Err(SessionError::Malformed {
                addr: addr.to_string(),
                source: ProtocolError::Oversized(buf.len()),
            });
        }
    }
}

/// The rendezvous server, reached with one short-lived connection per request.
#[derive(Debug, Clone)]
pub struct ServerLink {
    host: String,
    port: u16,
    limit: Duration,
}

impl ServerLink {
    pub fn new(host: impl Into<String>, port: u16, limit: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            limit,
        }
    }

    pub fn addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect, send `request`, read the single reply.
    ///
    /// A server that closes without replying (it does so for requests it
    /// rejects) surfaces as [`SessionError::PeerClosed`].
    pub async fn round_trip(&self, request: &Message) -> Result<Message, SessionError> {
        let addr = self.addr_string();
        let stream = dial(&self.host, self.port, self.limit).await?;
        let mut stream = BufReader::new(stream);

        bounded(self.limit, &addr, "waiting for the server", async {
            write_message(&mut stream, request, &addr).await?;
            read_message(&mut stream, &addr).await
        })
        .await
    }
}
