//! End-to-end WebSocket tests against a real listener on `127.0.0.1:0`.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use encore_api::state::AppState;
use encore_core::models::request::SubmitRequest;
use encore_core::status::RequestStatus;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, AppState) {
    let (app, state) = common::build_test_app_with(common::test_config());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, session_id: i64) -> Client {
    let (client, _response) = connect_async(format!("ws://{addr}/ws/sessions/{session_id}"))
        .await
        .expect("WebSocket handshake should succeed");
    client
}

fn song(title: &str) -> SubmitRequest {
    SubmitRequest {
        song_title: title.to_string(),
        ..Default::default()
    }
}

/// Next text frame as JSON, skipping control frames.
async fn next_json(client: &mut Client) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn wait_for_connections(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.ws_manager.connection_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} registered WebSocket connections");
}

// ---------------------------------------------------------------------------
// Test: submissions and updates reach subscribers as typed cues
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscriber_receives_new_and_update_cues() {
    let (addr, state) = spawn_server().await;
    let session = state.engine.create_session("Live").unwrap();
    let mut client = connect(addr, session.id).await;

    let request = state.engine.submit_request(session.id, song("A")).await.unwrap();
    let frame = next_json(&mut client).await;
    assert_eq!(frame["type"], "request:new");
    assert_eq!(frame["request_id"], request.id);

    state
        .engine
        .set_status(request.id, RequestStatus::Accepted)
        .await
        .unwrap();
    let frame = next_json(&mut client).await;
    assert_eq!(frame["type"], "request:update");
    assert_eq!(frame["request_id"], request.id);
}

// ---------------------------------------------------------------------------
// Test: every subscriber of a session gets the cue; other sessions do not
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cues_fan_out_per_session() {
    let (addr, state) = spawn_server().await;
    let live = state.engine.create_session("Live").unwrap();
    let other = state.engine.create_session("Other").unwrap();

    let mut audience = connect(addr, live.id).await;
    let mut dj = connect(addr, live.id).await;
    let mut elsewhere = connect(addr, other.id).await;

    state.engine.submit_request(live.id, song("A")).await.unwrap();

    assert_eq!(next_json(&mut audience).await["type"], "request:new");
    assert_eq!(next_json(&mut dj).await["type"], "request:new");

    let quiet = tokio::time::timeout(Duration::from_millis(200), elsewhere.next()).await;
    assert!(quiet.is_err(), "other session must not be notified");
}

// ---------------------------------------------------------------------------
// Test: unknown and ended sessions are refused before the upgrade
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_session_is_refused() {
    let (addr, _state) = spawn_server().await;

    let err = connect_async(format!("ws://{addr}/ws/sessions/4040"))
        .await
        .expect_err("handshake should fail");
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn ended_session_is_refused() {
    let (addr, state) = spawn_server().await;
    let session = state.engine.create_session("Over").unwrap();
    state.engine.end_session(session.id).await.unwrap();

    let err = connect_async(format!("ws://{addr}/ws/sessions/{}", session.id))
        .await
        .expect_err("handshake should fail");
    assert!(matches!(
        err,
        tokio_tungstenite::tungstenite::Error::Http(ref response) if response.status() == 422
    ));
}

// ---------------------------------------------------------------------------
// Test: ending a session closes live sockets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ending_session_closes_socket() {
    let (addr, state) = spawn_server().await;
    let session = state.engine.create_session("Closing").unwrap();
    let mut client = connect(addr, session.id).await;
    wait_for_connections(&state, 1).await;

    state.engine.end_session(session.id).await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await
    .expect("socket should close after the session ends");
    assert!(closed);

    wait_for_connections(&state, 0).await;
}

// ---------------------------------------------------------------------------
// Test: client keepalive text frames are accepted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn client_ping_text_keeps_connection_open() {
    let (addr, state) = spawn_server().await;
    let session = state.engine.create_session("Live").unwrap();
    let mut client = connect(addr, session.id).await;
    wait_for_connections(&state, 1).await;

    client.send(Message::Text("ping".into())).await.unwrap();
    state.engine.submit_request(session.id, song("A")).await.unwrap();

    assert_eq!(next_json(&mut client).await["type"], "request:new");
    assert_eq!(state.ws_manager.connection_count().await, 1);

    client.close(None).await.unwrap();
    wait_for_connections(&state, 0).await;
}

// ---------------------------------------------------------------------------
// Test: reconnect then refetch converges on the latest state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconnect_and_refetch_converges() {
    let (addr, state) = spawn_server().await;
    let app = common::build_app_for(&state);
    let session = state.engine.create_session("Flaky wifi").unwrap();

    let a = state.engine.submit_request(session.id, song("A")).await.unwrap();
    let first = connect(addr, session.id).await;
    drop(first);

    // Changes made while the client was away.
    let b = state.engine.submit_request(session.id, song("B")).await.unwrap();
    state.engine.reposition(b.id, 1).await.unwrap();
    state
        .engine
        .set_status(a.id, RequestStatus::Rejected)
        .await
        .unwrap();

    let mut client = connect(addr, session.id).await;
    let list = common::body_json(
        common::get(&app, &format!("/sessions/{}/requests", session.id)).await,
    )
    .await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["song_title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["B", "A"]);
    assert_eq!(list[0]["position"], 1);
    assert_eq!(list[1]["status"], "rejected");

    // And the new connection hears about later changes.
    state
        .engine
        .set_status(b.id, RequestStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(next_json(&mut client).await["type"], "request:update");
}
