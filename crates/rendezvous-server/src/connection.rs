// crates/rendezvous-server/src/connection.rs
// One request, one response, then close.

use std::time::Duration;

use anyhow::Result;
use bytes::BytesMut;
use rendezvous_core::Message;
use rendezvous_protocol::{encode, message_end, parse, ProtocolError, MAX_MESSAGE_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::service_task::ServiceHandle;
use crate::types::{ConnectionId, ConnectionState};

/// What came off the socket before the request could be dispatched.
#[derive(Debug)]
enum ReadOutcome {
    Request(Message),
    Malformed(ProtocolError),
    /// Peer closed before sending a complete message.
    Closed,
}

/// Run the request/response cycle for a single connection.
pub async fn run_connection(
    connection_id: ConnectionId,
    mut stream: TcpStream,
    service: ServiceHandle,
    idle_timeout: Duration,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    let mut state = ConnectionState::Accepted;
    debug!(connection = connection_id.0, %peer, ?state);

    let outcome = match timeout(idle_timeout, read_request(&mut stream, &mut state)).await {
        Ok(outcome) => outcome?,
        Err(_) => {
            warn!(connection = connection_id.0, %peer, ?state, "idle timeout, closing");
            return Ok(());
        }
    };

    let msg = match outcome {
        ReadOutcome::Request(msg) => msg,
        ReadOutcome::Malformed(err) => {
            warn!(connection = connection_id.0, %peer, error = %err, "malformed message, closing");
            return Ok(());
        }
        ReadOutcome::Closed => {
            info!(connection = connection_id.0, %peer, "peer closed before sending a request");
            return Ok(());
        }
    };

    state = ConnectionState::Dispatched;
    debug!(connection = connection_id.0, %peer, ?state, request = msg.kind());

    // Rejections are logged by the service task; the client just sees the
    // connection close without a reply.
    if let Ok(response) = service.dispatch(connection_id, msg).await? {
        let data = encode(&response)?;
        stream.write_all(data.as_bytes()).await?;
        stream.flush().await?;
        stream.shutdown().await?;
        info!(
            connection = connection_id.0,
            %peer,
            response = response.kind(),
            "sent response"
        );
    }

    state = ConnectionState::Closed;
    debug!(connection = connection_id.0, %peer, ?state);
    Ok(())
}

/// Accumulate bytes until one complete message is buffered, then parse it.
async fn read_request<R>(stream: &mut R, state: &mut ConnectionState) -> Result<ReadOutcome>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(MAX_MESSAGE_LEN);

    loop {
        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            // EOF - client disconnected
            return Ok(ReadOutcome::Closed);
        }
        *state = ConnectionState::AwaitingMessage;

        if let Some(end) = message_end(&buffer) {
            // Anything after the first message is ignored: the protocol is
            // strictly one request per connection.
            return Ok(match parse(&buffer[..end]) {
                Ok(msg) => ReadOutcome::Request(msg),
                Err(err) => ReadOutcome::Malformed(err),
            });
        }

        if buffer.len() > MAX_MESSAGE_LEN {
            return Ok(ReadOutcome::Malformed(ProtocolError::Oversized(buffer.len())));
        }
    }
}
