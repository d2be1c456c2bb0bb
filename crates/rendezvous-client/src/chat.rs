//! Turn-taking chat loop between two bridged peers.
//!
//! The two sides strictly alternate: the writer sends one line and
//! becomes the reader; the reader prints one line and becomes the
//! writer. The initiator writes first, the listener reads first. With
//! only one side ever writing, neither can end up blocked in a read
//! while the other is also blocked in a read.
//!
//! Chat lines are UTF-8 terminated by `\n`, one write per line. The line
//! `QUIT` ends the session. A local `/quit`, a peer's `QUIT`, a closed
//! connection and an I/O error all come out of the loop the same way: as
//! a [`ChatOutcome`].

use std::time::Duration;

use rendezvous_core::ChatRole;
use rendezvous_protocol::{ProtocolError, MAX_MESSAGE_LEN, QUIT_SENTINEL};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::debug;

use crate::error::SessionError;

/// Local command that ends the chat.
pub const LOCAL_QUIT: &str = "/quit";

/// How a chat session ended.
#[derive(Debug)]
pub enum ChatOutcome {
    /// We sent `QUIT` (local `/quit`, or local input closed).
    LocalQuit,
    /// The peer sent `QUIT`.
    PeerQuit,
    /// The peer's connection closed without a `QUIT`.
    PeerClosed,
    /// I/O failure or timeout on the peer connection.
    Failed(SessionError),
}

/// Result of one turn.
enum Step {
    Continue,
    Done(ChatOutcome),
}

/// Everything one side of a chat needs.
pub struct ChatLoop<'a, P, I, O> {
    peer: &'a mut P,
    peer_addr: &'a str,
    input: &'a mut I,
    output: &'a mut O,
    limit: Duration,
}

impl<'a, P, I, O> ChatLoop<'a, P, I, O>
where
    P: AsyncBufRead + AsyncWrite + Unpin,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    /// `limit` bounds every read from and write to the peer.
    pub fn new(
        peer: &'a mut P,
        peer_addr: &'a str,
        input: &'a mut I,
        output: &'a mut O,
        limit: Duration,
    ) -> Self {
        Self {
            peer,
            peer_addr,
            input,
            output,
            limit,
        }
    }

    /// Alternate turns until either side ends the session.
    pub async fn run(mut self, role: ChatRole) -> ChatOutcome {
        let mut writing = role.writes_first();

        loop {
            let step = if writing {
                self.write_turn().await
            } else {
                self.read_turn().await
            };

            match step {
                Step::Continue => writing = !writing,
                Step::Done(outcome) => {
                    debug!(peer = self.peer_addr, ?outcome, "chat finished");
                    return outcome;
                }
            }
        }
    }

    /// Take one non-empty line from local input and send it.
    async fn write_turn(&mut self) -> Step {
        let line = loop {
            let mut raw = String::new();
            let n = match self.input.read_line(&mut raw).await {
                Ok(n) => n,
                Err(e) => return Step::Done(ChatOutcome::Failed(SessionError::io("stdin", e))),
            };

            // Local input closed: leave the same way `/quit` does.
            if n == 0 {
                break QUIT_SENTINEL.to_string();
            }

            let line = raw.trim_end_matches(['\r', '\n']);
            if line.trim() == LOCAL_QUIT {
                break QUIT_SENTINEL.to_string();
            }
            if !line.is_empty() {
                break line.to_string();
            }
        };

        if let Err(err) = self.send_line(&line).await {
            return Step::Done(ChatOutcome::Failed(err));
        }

        if line == QUIT_SENTINEL {
            Step::Done(ChatOutcome::LocalQuit)
        } else {
            Step::Continue
        }
    }

    /// Wait for one line from the peer and print it.
    ///
    /// A line longer than `MAX_MESSAGE_LEN` ends the chat as malformed.
    async fn read_turn(&mut self) -> Step {
        let mut raw = String::new();
        let mut capped = (&mut *self.peer).take(MAX_MESSAGE_LEN as u64 + 1);
        let read = timeout(self.limit, capped.read_line(&mut raw)).await;

        let n = match read {
            Err(_) => {
                return Step::Done(ChatOutcome::Failed(SessionError::timeout(
                    self.peer_addr,
                    "waiting for the peer's message",
                )))
            }
            Ok(Err(e)) => return Step::Done(ChatOutcome::Failed(SessionError::io(self.peer_addr, e))),
            Ok(Ok(n)) => n,
        };

        if raw.len() > MAX_MESSAGE_LEN && !raw.ends_with('\n') {
            return Step::Done(ChatOutcome::Failed(SessionError::Malformed {
                addr: self.peer_addr.to_string(),
                source: ProtocolError::Oversized(raw.len()),
            }));
        }

        let (text, outcome) = if n == 0 {
            ("peer disconnected", Some(ChatOutcome::PeerClosed))
        } else {
            let line = raw.trim_end_matches(['\r', '\n']);
            if line == QUIT_SENTINEL {
                ("peer ended chat", Some(ChatOutcome::PeerQuit))
            } else {
                (line, None)
            }
        };

        if let Err(e) = self.print(text).await {
            return Step::Done(ChatOutcome::Failed(SessionError::io("stdout", e)));
        }

        match outcome {
            Some(outcome) => Step::Done(outcome),
            None => Step::Continue,
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<(), SessionError> {
        let data = format!("{}\n", line);
        let limit = self.limit;
        let write = async {
            self.peer.write_all(data.as_bytes()).await?;
            self.peer.flush().await
        };

        match timeout(limit, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::io(self.peer_addr, e)),
            Err(_) => Err(SessionError::timeout(self.peer_addr, "sending a message")),
        }
    }

    async fn print(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(format!("{}\n", text).as_bytes()).await?;
        self.output.flush().await
    }
}
