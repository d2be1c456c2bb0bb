//! Shell command parsing.

/// Commands accepted at the client prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    /// `/id`: print our client id.
    Id,
    /// `/register`: send REGISTER to the server.
    Register,
    /// `/bridge`: ask for a peer, then go straight into the chat.
    Bridge,
    /// `/chat`: (re)try the chat for the stored bridge result.
    Chat,
    /// `/quit`: leave.
    Quit,
}

impl ShellCommand {
    /// Returns `None` for anything that is not a known command.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "/id" => Some(ShellCommand::Id),
            "/register" => Some(ShellCommand::Register),
            "/bridge" => Some(ShellCommand::Bridge),
            "/chat" => Some(ShellCommand::Chat),
            "/quit" => Some(ShellCommand::Quit),
            _ => None,
        }
    }
}
