//! Integration tests for the Wolfden server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use wolfden::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address and room handle.
async fn start_server() -> (String, RoomHandle) {
    let server = WolfdenServerBuilder::new()
        .bind("127.0.0.1:0")
        .game_config(GameConfig::seeded(1))
        .build(SilentCue, LogStatus)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let room = server.room();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, room)
}

async fn open(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, device: &str, action: &str, target: &str) {
    let frame = json!({ "deviceId": device, "action": action, "targetId": target });
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send");
}

/// Reads the next text frame as JSON, failing after two seconds.
async fn next_json(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("frame within timeout")
        .expect("stream open")
        .expect("frame ok");
    serde_json::from_str(msg.to_text().expect("text frame")).expect("json")
}

/// Reads frames until one reports `count` registered participants.
async fn await_count(ws: &mut ClientWs, count: u64) -> Value {
    loop {
        let view = next_json(ws).await;
        if view["currentCount"] == count {
            return view;
        }
    }
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connect_returns_update() {
    let (addr, _room) = start_server().await;
    let mut ws = open(&addr).await;

    send(&mut ws, "P1", "connect", "").await;
    let view = next_json(&mut ws).await;

    assert_eq!(view["type"], "update");
    assert_eq!(view["role"], "joined");
    assert_eq!(view["phase"], "lobby");
    assert_eq!(view["currentCount"], 1);
    assert_eq!(view["index"], 0);
}

#[tokio::test]
async fn test_action_before_connect_ignored() {
    let (addr, room) = start_server().await;
    let mut ws = open(&addr).await;

    send(&mut ws, "P1", "wolfKill", "P2").await;
    assert_silent(&mut ws).await;
    assert_eq!(room.info().await.unwrap().player_count, 0);
}

#[tokio::test]
async fn test_invalid_frame_ignored() {
    let (addr, _room) = start_server().await;
    let mut ws = open(&addr).await;

    ws.send(Message::Text("not json".into())).await.expect("send");
    ws.send(Message::Text(r#"{"action":"connect"}"#.into()))
        .await
        .expect("send");

    // The connection survives and a valid connect still works.
    send(&mut ws, "P1", "connect", "").await;
    let view = next_json(&mut ws).await;
    assert_eq!(view["type"], "update");
}

#[tokio::test]
async fn test_second_device_refreshes_first() {
    let (addr, _room) = start_server().await;
    let mut ws1 = open(&addr).await;
    let mut ws2 = open(&addr).await;

    send(&mut ws1, "P1", "connect", "").await;
    await_count(&mut ws1, 1).await;

    send(&mut ws2, "P2", "connect", "").await;
    let view = await_count(&mut ws1, 2).await;
    assert_eq!(view["type"], "update");
    let own = await_count(&mut ws2, 2).await;
    assert_eq!(own["role"], "joined");
}

#[tokio::test]
async fn test_mismatched_device_id_ignored() {
    let (addr, room) = start_server().await;
    let mut ws = open(&addr).await;

    send(&mut ws, "P1", "connect", "").await;
    next_json(&mut ws).await;

    // Same socket claiming another identity does not register it.
    send(&mut ws, "P2", "connect", "").await;
    assert_silent(&mut ws).await;
    assert_eq!(room.info().await.unwrap().player_count, 1);
}

#[tokio::test]
async fn test_closed_socket_keeps_participant() {
    let (addr, room) = start_server().await;
    let mut ws1 = open(&addr).await;
    let mut ws2 = open(&addr).await;

    send(&mut ws1, "P1", "connect", "").await;
    send(&mut ws2, "P2", "connect", "").await;
    await_count(&mut ws2, 2).await;

    ws1.close(None).await.expect("close");
    drop(ws1);

    // Wait for the handler to unbind the channel.
    let mut connections = 2;
    for _ in 0..50 {
        connections = room.info().await.unwrap().connections;
        if connections == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(connections, 1);
    assert_eq!(room.info().await.unwrap().player_count, 2);

    // Coming back is a reconnect, not a third participant.
    let mut again = open(&addr).await;
    send(&mut again, "P1", "connect", "").await;
    let view = next_json(&mut again).await;
    assert_eq!(view["currentCount"], 2);
}

#[tokio::test]
async fn test_console_input_reaches_phones() {
    let (addr, room) = start_server().await;
    let mut ws = open(&addr).await;

    send(&mut ws, "P1", "connect", "").await;
    let before = next_json(&mut ws).await;
    let target = before["targetCount"].as_u64().expect("targetCount");

    room.input(InputSample::Axis(4095)).await.unwrap();
    let after = next_json(&mut ws).await;
    assert_eq!(after["targetCount"], target + 1);
}
