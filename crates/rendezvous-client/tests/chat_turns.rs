// crates/rendezvous-client/tests/chat_turns.rs
//
// Chat loop over a real loopback connection: listener bound, initiator dials.

use std::time::Duration;

use rendezvous_client::chat::ChatLoop;
use rendezvous_client::{ChatOutcome, SessionError};
use rendezvous_core::ChatRole;
use rendezvous_protocol::{ProtocolError, MAX_MESSAGE_LEN};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(5);

async fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (dialed, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (dialed.unwrap(), accepted.unwrap().0)
}

/// Run one side of a chat with scripted input; returns outcome and printed text.
async fn side(stream: TcpStream, role: ChatRole, script: &'static str) -> (ChatOutcome, String) {
    let mut peer = BufReader::new(stream);
    let mut input = script.as_bytes();
    let mut output = Vec::new();

    let outcome = ChatLoop::new(&mut peer, "loopback", &mut input, &mut output, LIMIT)
        .run(role)
        .await;

    (outcome, String::from_utf8(output).unwrap())
}

#[tokio::test]
async fn alternating_exchange_then_quit_ends_both_loops() {
    let (dialer, acceptor) = loopback_pair().await;

    let initiator = tokio::spawn(side(dialer, ChatRole::Initiator, "i1\ni2\n"));
    let listener = tokio::spawn(side(acceptor, ChatRole::Listener, "l1\n/quit\n"));

    let (init_outcome, init_out) = timeout(LIMIT, initiator).await.unwrap().unwrap();
    let (listen_outcome, listen_out) = timeout(LIMIT, listener).await.unwrap().unwrap();

    assert!(matches!(init_outcome, ChatOutcome::PeerQuit));
    assert!(matches!(listen_outcome, ChatOutcome::LocalQuit));
    assert_eq!(init_out, "l1\npeer ended chat\n");
    assert_eq!(listen_out, "i1\ni2\n");
}

#[tokio::test]
async fn initiator_can_quit_first() {
    let (dialer, acceptor) = loopback_pair().await;

    let initiator = tokio::spawn(side(dialer, ChatRole::Initiator, "hello\n/quit\n"));
    let listener = tokio::spawn(side(acceptor, ChatRole::Listener, "hi back\n"));

    let (init_outcome, init_out) = timeout(LIMIT, initiator).await.unwrap().unwrap();
    let (listen_outcome, listen_out) = timeout(LIMIT, listener).await.unwrap().unwrap();

    assert!(matches!(init_outcome, ChatOutcome::LocalQuit));
    assert!(matches!(listen_outcome, ChatOutcome::PeerQuit));
    assert_eq!(init_out, "hi back\n");
    assert_eq!(listen_out, "hello\npeer ended chat\n");
}

#[tokio::test]
async fn blank_lines_do_not_use_up_a_turn() {
    let (dialer, acceptor) = loopback_pair().await;

    let initiator = tokio::spawn(side(dialer, ChatRole::Initiator, "\n\nfirst\n"));
    let listener = tokio::spawn(side(acceptor, ChatRole::Listener, "/quit\n"));

    let (_, init_out) = timeout(LIMIT, initiator).await.unwrap().unwrap();
    let (_, listen_out) = timeout(LIMIT, listener).await.unwrap().unwrap();

    assert_eq!(listen_out, "first\n");
    assert_eq!(init_out, "peer ended chat\n");
}

#[tokio::test]
async fn closed_local_input_sends_quit() {
    let (dialer, acceptor) = loopback_pair().await;

    let initiator = tokio::spawn(side(dialer, ChatRole::Initiator, ""));
    let listener = tokio::spawn(side(acceptor, ChatRole::Listener, ""));

    let (init_outcome, _) = timeout(LIMIT, initiator).await.unwrap().unwrap();
    let (listen_outcome, listen_out) = timeout(LIMIT, listener).await.unwrap().unwrap();

    assert!(matches!(init_outcome, ChatOutcome::LocalQuit));
    assert!(matches!(listen_outcome, ChatOutcome::PeerQuit));
    assert_eq!(listen_out, "peer ended chat\n");
}

#[tokio::test]
async fn peer_disconnect_ends_like_quit() {
    let (dialer, acceptor) = loopback_pair().await;
    drop(dialer);

    let (outcome, out) = timeout(LIMIT, side(acceptor, ChatRole::Listener, "unused\n"))
        .await
        .unwrap();

    assert!(matches!(outcome, ChatOutcome::PeerClosed));
    assert_eq!(out, "peer disconnected\n");
}

#[tokio::test]
async fn lines_go_out_newline_terminated_and_quit_is_a_sentinel() {
    let (dialer, mut acceptor) = loopback_pair().await;

    let initiator = tokio::spawn(side(dialer, ChatRole::Initiator, "hi\n/quit\n"));

    // Play the listener by hand at the byte level.
    let mut buf = [0u8; 64];
    let n = acceptor.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hi\n");
    acceptor.write_all(b"yo\n").await.unwrap();

    let mut rest = Vec::new();
    timeout(LIMIT, acceptor.read_to_end(&mut rest)).await.unwrap().unwrap();
    assert_eq!(rest, b"QUIT\n");

    let (outcome, out) = timeout(LIMIT, initiator).await.unwrap().unwrap();
    assert!(matches!(outcome, ChatOutcome::LocalQuit));
    assert_eq!(out, "yo\n");
}

#[tokio::test]
async fn endless_line_from_peer_is_cut_off() {
    let (mut dialer, acceptor) = loopback_pair().await;

    // Never sends a newline; stays connected.
    let flood = tokio::spawn(async move {
        let chunk = vec![b'x'; 1024];
        while dialer.write_all(&chunk).await.is_ok() {}
    });

    let (outcome, out) = timeout(LIMIT, side(acceptor, ChatRole::Listener, "unused\n"))
        .await
        .unwrap();

    match outcome {
        ChatOutcome::Failed(SessionError::Malformed {
            source: ProtocolError::Oversized(len),
            ..
        }) => assert!(len > MAX_MESSAGE_LEN),
        other => panic!("expected an oversized line, got {:?}", other),
    }
    assert!(out.is_empty());
    flood.abort();
}

#[tokio::test]
async fn longest_allowed_line_still_arrives() {
    let (mut dialer, acceptor) = loopback_pair().await;
    let line = "y".repeat(MAX_MESSAGE_LEN);

    dialer.write_all(format!("{}\nQUIT\n", line).as_bytes()).await.unwrap();

    let (outcome, out) = timeout(LIMIT, side(acceptor, ChatRole::Listener, "ok\n"))
        .await
        .unwrap();

    assert!(matches!(outcome, ChatOutcome::PeerQuit));
    assert_eq!(out, format!("{}\npeer ended chat\n", line));
    drop(dialer);
}

#[tokio::test]
async fn silent_peer_times_out() {
    let (_dialer, acceptor) = loopback_pair().await;
    let mut peer = BufReader::new(acceptor);
    let mut input: &[u8] = b"";
    let mut output = Vec::new();

    let outcome = ChatLoop::new(
        &mut peer,
        "loopback",
        &mut input,
        &mut output,
        Duration::from_millis(100),
    )
    .run(ChatRole::Listener)
    .await;

    assert!(matches!(outcome, ChatOutcome::Failed(_)));
    assert!(output.is_empty());
}
