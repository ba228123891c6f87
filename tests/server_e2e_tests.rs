// ============================
// tests/server_e2e_tests.rs
// ============================
//! End-to-end tests over a real listener and WebSocket clients.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use signaling_lib::{config::Settings, ws_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bind the hub on an ephemeral port and serve it in the background
async fn spawn_server() -> SocketAddr {
    let state = Arc::new(AppState::new(Settings::default()));
    let app = ws_router::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn ws_connect(addr: SocketAddr) -> WsClient {
    let (stream, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("failed to connect");
    stream
}

async fn send_json(client: &mut WsClient, frame: Value) {
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next text frame as JSON, skipping protocol-level ping/pong
async fn next_json(client: &mut WsClient) -> Value {
    let deadline = Duration::from_secs(5);
    loop {
        let frame = timeout(deadline, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("socket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_join_relay_and_leave_over_live_sockets() {
    let addr = spawn_server().await;

    // Alice creates the room
    let mut alice = ws_connect(addr).await;
    send_json(
        &mut alice,
        json!({"type": "join-room", "payload": {
            "roomCode": "e2e", "peerId": "pA", "name": "Alice", "isHost": true
        }}),
    )
    .await;

    let joined = next_json(&mut alice).await;
    assert_eq!(joined["type"], "room-joined");
    assert_eq!(joined["payload"]["isHost"], true);

    // Bob joins it
    let mut bob = ws_connect(addr).await;
    send_json(
        &mut bob,
        json!({"type": "join-room", "payload": {
            "roomCode": "E2E", "peerId": "pB", "name": "Bob"
        }}),
    )
    .await;

    let joined = next_json(&mut bob).await;
    assert_eq!(joined["type"], "room-joined");
    assert_eq!(joined["payload"]["roomCode"], "e2e");
    assert_eq!(
        joined["payload"]["participants"].as_array().unwrap().len(),
        2
    );

    let notified = next_json(&mut alice).await;
    assert_eq!(notified["type"], "participant-joined");
    assert_eq!(notified["payload"]["participant"]["peerId"], "pB");
    let update = next_json(&mut alice).await;
    assert_eq!(update["type"], "participants-update");

    // Bob's offer reaches Alice with `from` stamped by the server
    send_json(
        &mut bob,
        json!({"type": "webrtc-offer", "payload": {
            "to": "pA", "offer": {"type": "offer", "sdp": "v=0"}
        }}),
    )
    .await;

    let offer = next_json(&mut alice).await;
    assert_eq!(offer["type"], "webrtc-offer");
    assert_eq!(offer["payload"]["from"], "pB");
    assert_eq!(offer["payload"]["offer"]["sdp"], "v=0");

    // Bob's chat reaches Alice only
    send_json(
        &mut bob,
        json!({"type": "chat-message", "payload": {"message": " hi "}}),
    )
    .await;
    let chat = next_json(&mut alice).await;
    assert_eq!(chat["type"], "chat-message");
    assert_eq!(chat["payload"]["fromName"], "Bob");
    assert_eq!(chat["payload"]["message"], "hi");

    // Closing Bob's socket runs the departure path
    bob.close(None).await.unwrap();
    let left = next_json(&mut alice).await;
    assert_eq!(left["type"], "participant-left");
    assert_eq!(left["payload"]["peerId"], "pB");
    let update = next_json(&mut alice).await;
    assert_eq!(update["type"], "participants-update");
    assert_eq!(
        update["payload"]["participants"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_join_error_over_live_socket() {
    let addr = spawn_server().await;

    let mut client = ws_connect(addr).await;
    send_json(
        &mut client,
        json!({"type": "join-room", "payload": {
            "roomCode": "nowhere", "peerId": "pX", "name": "Nobody"
        }}),
    )
    .await;

    let err = next_json(&mut client).await;
    assert_eq!(err["type"], "room-error");
    assert_eq!(err["payload"]["code"], "ROOM_NOT_FOUND");
}
