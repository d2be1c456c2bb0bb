// crates/rendezvous-client/src/session.rs

use rendezvous_core::{BridgeReply, ChatRole, ClientRecord, Message};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::chat::{ChatLoop, ChatOutcome};
use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::network::{bounded, dial, read_message, write_message, ServerLink};

/// Where a client is in the register → bridge → chat sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Registered,
    BridgeRequested,
    /// Told to wait; our port is bound and will accept the peer.
    Listening,
    /// Handed a peer address to dial.
    Connecting,
    Chatting,
    Terminated,
}

/// Client-side session: one identity, one server, at most one chat.
#[derive(Debug)]
pub struct Session {
    id: String,
    port: u16,
    config: ClientConfig,
    server: ServerLink,
    state: SessionState,
    bridge: Option<BridgeReply>,
    listener: Option<TcpListener>,
}

impl Session {
    pub fn new(id: impl Into<String>, port: u16, server: ServerLink, config: ClientConfig) -> Self {
        Self {
            id: id.into(),
            port,
            config,
            server,
            state: SessionState::Idle,
            bridge: None,
            listener: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last bridge result, kept so `/chat` can retry it.
    pub fn bridge_result(&self) -> Option<&BridgeReply> {
        self.bridge.as_ref()
    }

    /// The address we advertise to the server and to peers.
    pub fn own_record(&self) -> ClientRecord {
        ClientRecord::new(self.id.clone(), self.config.advertise_host.clone(), self.port)
    }

    /// REGISTER our address. Re-registering later is allowed and only
    /// refreshes the server's copy.
    pub async fn register(&mut self) -> Result<(), SessionError> {
        let reply = self
            .server
            .round_trip(&Message::Register(self.own_record()))
            .await?;

        match reply {
            Message::RegAck(ack) if ack.is_registered() => {
                if self.state == SessionState::Idle {
                    self.state = SessionState::Registered;
                }
                info!(id = %self.id, server = %self.server.addr_string(), "registered");
                Ok(())
            }
            Message::RegAck(ack) => Err(SessionError::RegistrationRefused {
                addr: self.server.addr_string(),
                status: ack.status,
            }),
            other => Err(SessionError::UnexpectedReply {
                addr: self.server.addr_string(),
                kind: other.kind(),
            }),
        }
    }

    /// Ask the server for a peer and settle into the resulting role.
    ///
    /// Our port is bound *before* the request goes out: once the server
    /// parks us, the next requester may dial immediately. If we end up
    /// the initiator the listener is simply dropped.
    pub async fn request_bridge(&mut self) -> Result<ChatRole, SessionError> {
        if self.state == SessionState::Idle {
            return Err(SessionError::NotRegistered);
        }

        let previous = self.state;
        if self.listener.is_none() {
            self.listener = Some(self.bind_listener().await?);
        }

        self.state = SessionState::BridgeRequested;
        let reply = match self.server.round_trip(&Message::bridge(self.id.clone())).await {
            Ok(Message::BridgeAck(reply)) => reply,
            Ok(other) => {
                self.state = previous;
                return Err(SessionError::UnexpectedReply {
                    addr: self.server.addr_string(),
                    kind: other.kind(),
                });
            }
            Err(SessionError::PeerClosed { addr }) => {
                self.state = previous;
                return Err(SessionError::BridgeRejected { addr });
            }
            Err(err) => {
                self.state = previous;
                return Err(err);
            }
        };

        let role = ChatRole::for_reply(&reply);
        match &reply {
            BridgeReply::NoPeerYet => {
                self.state = SessionState::Listening;
                info!(port = self.port, "no peer yet, listening");
            }
            BridgeReply::Peer(peer) => {
                self.listener = None;
                self.state = SessionState::Connecting;
                info!(peer = %peer.id, addr = %peer.addr_string(), "bridged, will dial");
            }
        }

        self.bridge = Some(reply);
        Ok(role)
    }

    /// Open the peer connection for the stored bridge result and chat
    /// until either side ends it. Afterwards the session is terminated.
    ///
    /// Failing to establish the connection leaves the bridge result in
    /// place so the caller can try again.
    pub async fn chat<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<ChatOutcome, SessionError>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        match self.bridge.clone() {
            None => Err(SessionError::NoBridge),
            Some(BridgeReply::NoPeerYet) => self.accept_and_chat(input, output).await,
            Some(BridgeReply::Peer(peer)) => self.dial_and_chat(&peer, input, output).await,
        }
    }

    async fn accept_and_chat<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<ChatOutcome, SessionError>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => self.bind_listener().await?,
        };
        self.state = SessionState::Listening;

        let local = format!("{}:{}", self.config.listen_host, self.port);
        let accepted = bounded(self.config.peer_wait_timeout(), &local, "waiting for a peer", async {
            listener.accept().await.map_err(|e| SessionError::io(&local, e))
        })
        .await;

        let (stream, peer_addr) = match accepted {
            Ok(pair) => pair,
            Err(err) => {
                // Keep the port bound so a late peer still gets through on /chat.
                self.listener = Some(listener);
                return Err(err);
            }
        };
        drop(listener);

        let peer_addr = peer_addr.to_string();
        let mut peer = BufReader::new(stream);
        let opening = bounded(
            self.config.server_timeout(),
            &peer_addr,
            "waiting for the CHAT handshake",
            read_message(&mut peer, &peer_addr),
        )
        .await?;

        let caller = match opening {
            Message::Chat(record) => record,
            other => {
                warn!(peer = %peer_addr, kind = other.kind(), "expected CHAT handshake");
                return Err(SessionError::UnexpectedReply {
                    addr: peer_addr,
                    kind: other.kind(),
                });
            }
        };

        say(output, &format!("incoming chat from {}", caller.id)).await?;
        Ok(self.run_chat(ChatRole::Listener, &mut peer, &peer_addr, input, output).await)
    }

    async fn dial_and_chat<I, O>(
        &mut self,
        peer: &ClientRecord,
        input: &mut I,
        output: &mut O,
    ) -> Result<ChatOutcome, SessionError>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        self.state = SessionState::Connecting;

        let peer_addr = peer.addr_string();
        let stream = dial(&peer.host, peer.port, self.config.server_timeout()).await?;
        let mut stream = BufReader::new(stream);

        bounded(
            self.config.server_timeout(),
            &peer_addr,
            "sending the CHAT handshake",
            write_message(&mut stream, &Message::Chat(self.own_record()), &peer_addr),
        )
        .await?;

        say(output, &format!("connected to {}", peer.id)).await?;
        Ok(self.run_chat(ChatRole::Initiator, &mut stream, &peer_addr, input, output).await)
    }

    async fn run_chat<P, I, O>(
        &mut self,
        role: ChatRole,
        peer: &mut P,
        peer_addr: &str,
        input: &mut I,
        output: &mut O,
    ) -> ChatOutcome
    where
        P: AsyncBufRead + AsyncWrite + Unpin,
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        self.state = SessionState::Chatting;
        debug!(?role, peer = peer_addr, "chatting");

        let outcome = ChatLoop::new(peer, peer_addr, input, output, self.config.chat_timeout())
            .run(role)
            .await;

        self.state = SessionState::Terminated;
        outcome
    }

    async fn bind_listener(&self) -> Result<TcpListener, SessionError> {
        let local = format!("{}:{}", self.config.listen_host, self.port);
        TcpListener::bind(&local)
            .await
            .map_err(|e| SessionError::io(&local, e))
    }
}

/// Print one user-facing line.
pub(crate) async fn say<O>(output: &mut O, line: &str) -> Result<(), SessionError>
where
    O: AsyncWrite + Unpin,
{
    let data = format!("{}\n", line);
    output
        .write_all(data.as_bytes())
        .await
        .map_err(|e| SessionError::io("stdout", e))?;
    output.flush().await.map_err(|e| SessionError::io("stdout", e))
}
