// crates/rendezvous-client/src/shell.rs

use anyhow::Result;
use rendezvous_core::{BridgeReply, ChatRole};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::warn;

use crate::chat::ChatOutcome;
use crate::commands::ShellCommand;
use crate::session::{say, Session, SessionState};

pub const INVALID_INPUT: &str = "invalid input provided";

/// Run the interactive command loop until `/quit`, end of input, or a
/// finished chat.
///
/// Every failed command prints one line and returns to the prompt.
pub async fn run_shell<I, O>(session: &mut Session, input: &mut I, output: &mut O) -> Result<()>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line).await? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match ShellCommand::parse(&line) {
            None => say(output, INVALID_INPUT).await?,
            Some(ShellCommand::Quit) => break,
            Some(ShellCommand::Id) => say(output, session.id()).await?,
            Some(ShellCommand::Register) => match session.register().await {
                Ok(()) => say(output, &format!("registered as {}", session.id())).await?,
                Err(err) => report(output, &err).await?,
            },
            Some(ShellCommand::Bridge) => match session.request_bridge().await {
                Ok(role) => {
                    announce_role(session, role, output).await?;
                    chat(session, input, output).await?;
                }
                Err(err) => report(output, &err).await?,
            },
            Some(ShellCommand::Chat) => chat(session, input, output).await?,
        }

        if session.state() == SessionState::Terminated {
            break;
        }
    }

    say(output, "Terminating the chat client.\nExiting program").await?;
    Ok(())
}

async fn announce_role<O>(session: &Session, role: ChatRole, output: &mut O) -> Result<()>
where
    O: AsyncWrite + Unpin,
{
    let text = match (role, session.bridge_result()) {
        (ChatRole::Initiator, Some(BridgeReply::Peer(peer))) => {
            format!("bridged with {} at {}", peer.id, peer.addr_string())
        }
        _ => format!("no peer yet, waiting for a chat on port {}", session.port()),
    };
    say(output, &text).await?;
    Ok(())
}

async fn chat<I, O>(session: &mut Session, input: &mut I, output: &mut O) -> Result<()>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    match session.chat(input, output).await {
        // The chat loop already told the user how it ended.
        Ok(ChatOutcome::LocalQuit | ChatOutcome::PeerQuit | ChatOutcome::PeerClosed) => {}
        Ok(ChatOutcome::Failed(err)) => {
            say(output, &format!("error occurred while chatting: {}", err)).await?
        }
        Err(err) => report(output, &err).await?,
    }
    Ok(())
}

async fn report<O, E>(output: &mut O, err: &E) -> Result<()>
where
    O: AsyncWrite + Unpin,
    E: std::fmt::Display,
{
    warn!(error = %err, "command failed");
    say(output, &err.to_string()).await?;
    Ok(())
}
