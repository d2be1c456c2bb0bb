//! Operator console.
//!
//! Reads line commands from the server's stdin. Diagnostic only; not
//! part of the network protocol.
//!
//! - `/info` : list registered clients as `<id> <ip>:<port>`, plus the
//!   client waiting for a bridge partner.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::service_task::ServiceHandle;
use crate::types::RegistrySnapshot;

/// Printed to the operator when the server is interrupted.
pub const FAREWELL: &str = "Terminating the chat server.\nExiting program\n";

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Info,
    Unrecognized(String),
}

impl ConsoleCommand {
    /// Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        match trimmed {
            "" => None,
            "/info" => Some(ConsoleCommand::Info),
            other => Some(ConsoleCommand::Unrecognized(other.to_string())),
        }
    }
}

/// Serve console commands until `input` reaches EOF.
pub async fn run_console<R, W>(input: R, mut output: W, service: ServiceHandle) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let text = match ConsoleCommand::parse(&line) {
            None => continue,
            Some(ConsoleCommand::Info) => render_info(&service.snapshot().await?),
            Some(ConsoleCommand::Unrecognized(cmd)) => format!("unrecognized command: {}\n", cmd),
        };

        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }

    Ok(())
}

/// Render a snapshot the way `/info` prints it.
pub fn render_info(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();

    if snapshot.clients.is_empty() {
        out.push_str("no registered clients\n");
    }
    for record in &snapshot.clients {
        out.push_str(&format!("{}\n", record));
    }
    if let Some(pending) = &snapshot.pending {
        out.push_str(&format!("waiting for bridge: {}\n", pending.id));
    }

    out
}

pub async fn say_farewell<W>(mut output: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(FAREWELL.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
