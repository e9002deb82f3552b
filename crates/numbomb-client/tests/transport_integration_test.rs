//! Integration tests for the client transport.
//!
//! Most tests run over an in-memory pipe with a scripted server peer; the
//! connect tests use a real loopback socket.

use std::time::Duration;

use numbomb_client::{
    CLOSE_FLUSH_TIMEOUT, ConnectedClient, ConnectionEvent, DisconnectReason, MAX_LINE_BYTES,
    TransportConfig, TransportError, transport,
};
use numbomb_harness::{ScriptedListener, ScriptedPeer};
use numbomb_proto::{OutboundCommand, ProtocolEvent};
use tokio::{io::AsyncReadExt, time::timeout};

/// Attach a client to an in-memory peer and consume its `JOIN`.
async fn attached(player: &str) -> (ConnectedClient, ScriptedPeer) {
    let (stream, mut peer) = ScriptedPeer::pair();
    let client = transport::attach(stream, player).await.unwrap();
    assert_eq!(peer.expect_line().await.unwrap(), format!("JOIN:{player}"));
    (client, peer)
}

/// Receive the next event, failing the test if none arrives in time.
async fn next_event(client: &mut ConnectedClient) -> Option<ConnectionEvent> {
    timeout(Duration::from_secs(5), client.recv()).await.expect("receive loop stalled")
}

#[tokio::test]
async fn join_is_the_first_line_on_the_wire() {
    let (stream, mut peer) = ScriptedPeer::pair();
    let client = transport::attach(stream, "Bob").await.unwrap();

    client.send(OutboundCommand::StartGame).unwrap();

    assert_eq!(peer.expect_line().await.unwrap(), "JOIN:Bob");
    assert_eq!(peer.expect_line().await.unwrap(), "START:");
    assert_eq!(client.player(), "Bob");
}

#[tokio::test]
async fn lines_are_decoded_in_read_order() {
    let (mut client, mut peer) = attached("Bob").await;

    peer.send_lines(&["欢迎加入数字炸弹游戏！", "你的回合！请输入一个数字: ", "新范围: 10-50"])
        .await
        .unwrap();

    let events: Vec<_> = [
        next_event(&mut client).await,
        next_event(&mut client).await,
        next_event(&mut client).await,
    ]
    .into_iter()
    .map(|e| match e {
        Some(ConnectionEvent::Line { event, .. }) => event,
        other => panic!("expected a line, got {other:?}"),
    })
    .collect();

    assert!(matches!(events[0], ProtocolEvent::Unrecognized { .. }));
    assert_eq!(events[1], ProtocolEvent::TurnGranted);
    assert_eq!(events[2], ProtocolEvent::RangeUpdated { min: 10, max: 50 });
}

#[tokio::test]
async fn raw_text_is_preserved() {
    let (mut client, mut peer) = attached("Bob").await;
    peer.send_line("玩家 Alice 加入游戏，当前玩家数: 2").await.unwrap();

    let Some(ConnectionEvent::Line { raw, .. }) = next_event(&mut client).await else {
        panic!("expected a line");
    };
    assert_eq!(raw, "玩家 Alice 加入游戏，当前玩家数: 2");
}

#[tokio::test]
async fn peer_close_ends_sequence_with_one_disconnect() {
    let (mut client, mut peer) = attached("Bob").await;

    peer.send_line("炸弹爆炸").await.unwrap();
    peer.close().await.unwrap();

    assert!(matches!(
        next_event(&mut client).await,
        Some(ConnectionEvent::Line { event: ProtocolEvent::Exploded, .. })
    ));
    assert_eq!(
        next_event(&mut client).await,
        Some(ConnectionEvent::Disconnected { reason: DisconnectReason::PeerClosed })
    );
    assert_eq!(next_event(&mut client).await, None);
}

#[tokio::test]
async fn commands_arrive_in_send_order() {
    let (client, mut peer) = attached("Bob").await;

    client.send(OutboundCommand::StartGame).unwrap();
    for value in [1, 2, 3] {
        client.send(OutboundCommand::guess("Bob", value)).unwrap();
    }
    client.send(OutboundCommand::Status).unwrap();

    let mut lines = Vec::new();
    for _ in 0..5 {
        lines.push(peer.expect_line().await.unwrap());
    }
    assert_eq!(lines, ["START:", "GUESS:Bob:1", "GUESS:Bob:2", "GUESS:Bob:3", "STATUS:"]);
}

#[tokio::test]
async fn close_flushes_queued_commands_then_closes() {
    let (client, mut peer) = attached("Bob").await;

    client.send(OutboundCommand::guess("Bob", 7)).unwrap();
    client.close().await;

    assert_eq!(peer.drain_until_eof().await.unwrap(), ["GUESS:Bob:7"]);
}

#[tokio::test]
async fn close_interrupts_a_pending_read() {
    let (client, _peer) = attached("Bob").await;

    // The peer stays silent: the receive loop is blocked on a read.
    timeout(Duration::from_secs(5), client.close()).await.expect("close hung");
}

#[tokio::test]
async fn close_abandons_commands_a_stalled_peer_never_reads() {
    // Room for JOIN and little else; the peer end stays open but unread.
    let (stream, mut peer_end) = tokio::io::duplex(16);
    let client = transport::attach(stream, "Bob").await.unwrap();

    for value in 0..20 {
        client.send(OutboundCommand::guess("Bob", value)).unwrap();
    }

    timeout(CLOSE_FLUSH_TIMEOUT + Duration::from_secs(3), client.close())
        .await
        .expect("close hung on a stalled peer");

    // Both halves are released: the peer drains what fit and then sees EOF.
    let mut received = Vec::new();
    timeout(Duration::from_secs(5), peer_end.read_to_end(&mut received))
        .await
        .expect("client end still open")
        .unwrap();
    assert!(received.starts_with(b"JOIN:Bob\n"));
}

#[tokio::test]
async fn overlong_line_ends_connection_with_read_failure() {
    let (mut client, mut peer) = attached("Bob").await;

    peer.send_line(&"x".repeat(MAX_LINE_BYTES * 2)).await.unwrap();

    assert!(matches!(
        next_event(&mut client).await,
        Some(ConnectionEvent::Disconnected { reason: DisconnectReason::ReadFailed(_) })
    ));
    assert_eq!(next_event(&mut client).await, None);
    timeout(Duration::from_secs(5), client.close()).await.expect("close hung");
}

#[tokio::test]
async fn line_at_the_length_limit_is_delivered() {
    let (mut client, mut peer) = attached("Bob").await;
    let long = "x".repeat(MAX_LINE_BYTES);

    peer.send_line(&long).await.unwrap();

    let Some(ConnectionEvent::Line { raw, .. }) = next_event(&mut client).await else {
        panic!("expected a line");
    };
    assert_eq!(raw, long);
}

#[tokio::test]
async fn write_failure_is_reported_as_disconnect() {
    let (mut client, peer) = attached("Bob").await;
    peer.abort();

    // First write may be buffered or fail; keep writing until the writer gives up.
    let mut reason = None;
    for value in 0..64 {
        if client.send(OutboundCommand::guess("Bob", value)).is_err() {
            break;
        }
        if let Ok(Some(ConnectionEvent::Disconnected { reason: r })) =
            timeout(Duration::from_millis(50), client.recv()).await
        {
            reason = Some(r);
            break;
        }
    }
    let reason = match reason {
        Some(r) => r,
        None => loop {
            match next_event(&mut client).await {
                Some(ConnectionEvent::Disconnected { reason }) => break reason,
                Some(_) => {},
                None => panic!("sequence ended without a disconnect"),
            }
        },
    };

    assert_ne!(reason, DisconnectReason::LocalClose);
    assert_eq!(next_event(&mut client).await, None);
}

#[tokio::test]
async fn close_after_peer_closed_completes() {
    let (mut client, mut peer) = attached("Bob").await;
    peer.close().await.unwrap();

    while next_event(&mut client).await.is_some() {}
    timeout(Duration::from_secs(5), client.close()).await.expect("close hung");
}

#[tokio::test]
async fn connect_over_loopback_sends_join() {
    let listener = ScriptedListener::bind().await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let (client, peer) = tokio::join!(transport::connect(&addr, "Alice"), listener.accept());
    let client = client.unwrap();
    let mut peer = peer.unwrap();

    assert_eq!(peer.expect_line().await.unwrap(), "JOIN:Alice");
    client.close().await;
    assert_eq!(peer.recv_line().await.unwrap(), None);
}

#[tokio::test]
async fn connect_refused_fails_once() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = ScriptedListener::bind().await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let result = transport::connect_with_config(&addr, "Bob", &TransportConfig::development()).await;

    assert!(matches!(
        result,
        Err(TransportError::Connect { .. } | TransportError::Timeout { .. })
    ));
}

#[tokio::test]
async fn connect_to_unresolvable_host_fails() {
    let result = transport::connect_with_config(
        "definitely-not-a-host.invalid:8889",
        "Bob",
        &TransportConfig::development(),
    )
    .await;

    assert!(result.is_err());
}
