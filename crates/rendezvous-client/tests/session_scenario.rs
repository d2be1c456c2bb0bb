// crates/rendezvous-client/tests/session_scenario.rs
//
// Two sessions against a live server: register, bridge, chat.

mod common;

use rendezvous_client::network::ServerLink;
use rendezvous_client::{ChatOutcome, Session, SessionError, SessionState};
use rendezvous_core::{BridgeReply, ChatRole};
use tokio::time::timeout;

use common::{free_port, loopback_config, session, start_server, wait_until_pending, TEST_TIMEOUT};

#[tokio::test]
async fn bridge_before_register_is_refused_locally() {
    let (addr, service) = start_server().await;
    let mut alice = session("alice", addr);

    let err = alice.request_bridge().await.unwrap_err();
    assert!(matches!(err, SessionError::NotRegistered));
    assert_eq!(alice.state(), SessionState::Idle);

    let snapshot = service.snapshot().await.unwrap();
    assert!(snapshot.clients.is_empty());
    assert!(snapshot.pending.is_none());
}

#[tokio::test]
async fn chat_without_bridge_result_is_refused() {
    let (addr, _service) = start_server().await;
    let mut alice = session("alice", addr);
    alice.register().await.unwrap();

    let mut input: &[u8] = b"";
    let mut output = Vec::new();
    let err = alice.chat(&mut input, &mut output).await.unwrap_err();

    assert!(matches!(err, SessionError::NoBridge));
    assert_eq!(alice.state(), SessionState::Registered);
}

#[tokio::test]
async fn register_advertises_our_address() {
    let (addr, service) = start_server().await;
    let mut alice = session("alice", addr);

    alice.register().await.unwrap();
    assert_eq!(alice.state(), SessionState::Registered);

    // Registering again is fine and keeps the state.
    alice.register().await.unwrap();
    assert_eq!(alice.state(), SessionState::Registered);

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.clients, vec![alice.own_record()]);
}

#[tokio::test]
async fn unreachable_server_is_a_connect_error() {
    let link = ServerLink::new("127.0.0.1", free_port(), std::time::Duration::from_secs(5));
    let mut alice = Session::new("alice", free_port(), link, loopback_config());

    let err = alice.register().await.unwrap_err();
    assert!(matches!(err, SessionError::Connect { .. }), "got {err:?}");
    assert_eq!(alice.state(), SessionState::Idle);
}

#[tokio::test]
async fn listener_and_initiator_chat_then_terminate() {
    let (addr, service) = start_server().await;

    let mut alice = session("alice", addr);
    alice.register().await.unwrap();
    let role = alice.request_bridge().await.unwrap();
    assert_eq!(role, ChatRole::Listener);
    assert_eq!(alice.state(), SessionState::Listening);
    assert!(matches!(alice.bridge_result(), Some(BridgeReply::NoPeerYet)));
    assert_eq!(wait_until_pending(&service, "alice").await, alice.own_record());

    let alice_task = tokio::spawn(async move {
        let mut input: &[u8] = b"/quit\n";
        let mut output = Vec::new();
        let outcome = alice.chat(&mut input, &mut output).await.unwrap();
        (alice.state(), outcome, String::from_utf8(output).unwrap())
    });

    let mut bob = session("bob", addr);
    bob.register().await.unwrap();
    let role = bob.request_bridge().await.unwrap();
    assert_eq!(role, ChatRole::Initiator);
    assert_eq!(bob.state(), SessionState::Connecting);
    match bob.bridge_result() {
        Some(BridgeReply::Peer(peer)) => assert_eq!(peer.id, "alice"),
        other => panic!("expected alice as peer, got {:?}", other),
    }

    // Matching cleared the slot.
    assert!(service.snapshot().await.unwrap().pending.is_none());

    let mut input: &[u8] = b"hi\n";
    let mut output = Vec::new();
    let outcome = timeout(TEST_TIMEOUT, bob.chat(&mut input, &mut output))
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(outcome, ChatOutcome::PeerQuit));
    assert_eq!(bob.state(), SessionState::Terminated);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "connected to alice\npeer ended chat\n"
    );

    let (alice_state, alice_outcome, alice_output) =
        timeout(TEST_TIMEOUT, alice_task).await.unwrap().unwrap();
    assert!(matches!(alice_outcome, ChatOutcome::LocalQuit));
    assert_eq!(alice_state, SessionState::Terminated);
    assert_eq!(alice_output, "incoming chat from bob\nhi\n");
}

#[tokio::test]
async fn waiting_listener_gives_up_after_peer_wait_timeout() {
    let (addr, _service) = start_server().await;

    let mut config = loopback_config();
    config.peer_wait_timeout_secs = 1;
    let link = ServerLink::new("127.0.0.1", addr.port(), std::time::Duration::from_secs(5));
    let mut alice = Session::new("alice", free_port(), link, config);

    alice.register().await.unwrap();
    alice.request_bridge().await.unwrap();

    let mut input: &[u8] = b"";
    let mut output = Vec::new();
    let err = alice.chat(&mut input, &mut output).await.unwrap_err();

    assert!(matches!(err, SessionError::Timeout { .. }));
    assert!(output.is_empty());
    // Still listening: a later /chat may pick up a late peer.
    assert_eq!(alice.state(), SessionState::Listening);
    assert!(matches!(alice.bridge_result(), Some(BridgeReply::NoPeerYet)));
}

#[tokio::test]
async fn server_forgetting_us_reports_a_rejected_bridge() {
    use rendezvous_client::network::{read_message, write_message};
    use rendezvous_core::{Message, RegAck};
    use tokio::io::BufReader;
    use tokio::net::TcpListener;

    // Acknowledges the REGISTER, then drops the BRIDGE unanswered the way
    // a server without our registration does.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(stream);
        let record = match read_message(&mut stream, "client").await.unwrap() {
            Message::Register(record) => record,
            other => panic!("expected REGISTER, got {:?}", other),
        };
        write_message(&mut stream, &Message::RegAck(RegAck::registered(record)), "client")
            .await
            .unwrap();
        drop(stream);

        let (stream, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(stream);
        let request = read_message(&mut stream, "client").await.unwrap();
        assert_eq!(request.kind(), "BRIDGE");
    });

    let mut alice = session("alice", addr);
    alice.register().await.unwrap();

    let err = alice.request_bridge().await.unwrap_err();
    assert!(matches!(err, SessionError::BridgeRejected { .. }), "got {err:?}");
    assert!(err.to_string().contains("rejected the bridge request"));
    assert_eq!(alice.state(), SessionState::Registered);

    timeout(TEST_TIMEOUT, server).await.unwrap().unwrap();
}
