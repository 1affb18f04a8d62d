//! Integration tests for the participant `WebSocket` connection.
//!
//! Each test binds a real observer on `127.0.0.1:0` and talks to it with a
//! `tokio-tungstenite` client.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use covey_core::{SessionState, spawn_session};
use covey_observer::server::ServerConfig;
use covey_observer::state::AppState;
use covey_observer::{ObserverHandle, spawn_observer};
use covey_types::{AreaConfig, AreaId, ParticipantId};
use covey_world::AreaLayout;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start() -> (Arc<AppState>, ObserverHandle) {
    let layout = AreaLayout::new(&[AreaConfig {
        id: AreaId::new("lobby"),
        x: 0.0,
        y: 0.0,
        width: 10.0,
        height: 10.0,
    }])
    .unwrap();
    let (session, _writer) = spawn_session(SessionState::new(Arc::new(layout)), 16);
    let state = Arc::new(AppState::new(session, None, "Test Town"));
    let config = ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
    };
    let observer = spawn_observer(&config, Arc::clone(&state)).await.unwrap();
    (state, observer)
}

fn participant_url(observer: &ObserverHandle, id: ParticipantId) -> String {
    format!("ws://{}/ws/participants/{id}", observer.local_addr)
}

/// Next text frame, decoded as JSON.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(WAIT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

/// Skip frames until one satisfies `pred`.
async fn next_matching(client: &mut Client, pred: impl Fn(&Value) -> bool) -> Value {
    loop {
        let json = next_json(client).await;
        if pred(&json) {
            return json;
        }
    }
}

fn area_of(snapshot: &Value, id: ParticipantId) -> Option<Value> {
    snapshot["participants"]
        .as_array()?
        .iter()
        .find(|p| p["id"] == serde_json::json!(id))
        .map(|p| p["conversationAreaId"].clone())
}

async fn send_text(client: &mut Client, text: &str) {
    client.send(Message::text(text.to_owned())).await.unwrap();
}

async fn wait_until(check: impl Fn() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

fn http_status(result: Result<(Client, impl Sized), WsError>) -> Option<u16> {
    match result {
        Err(WsError::Http(response)) => Some(response.status().as_u16()),
        _ => None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn participant_socket_moves_and_leaves_on_close() {
    let (state, observer) = start().await;
    let ada = state.session.add_participant("ada", None).await.unwrap().id;
    let (mut client, _) = connect_async(participant_url(&observer, ada)).await.unwrap();

    let first = next_json(&mut client).await;
    assert!(first["generation"].is_u64());
    assert_eq!(area_of(&first, ada), Some(Value::Null));

    send_text(&mut client, r#"{"x":3,"y":3,"facing":"front","moving":false}"#).await;
    let moved = next_matching(&mut client, |s| area_of(s, ada) == Some("lobby".into())).await;
    assert!(moved["generation"].as_u64() > first["generation"].as_u64());
    assert_eq!(
        state
            .snapshot()
            .participant(ada)
            .and_then(|p| p.conversation_area_id.clone()),
        Some(AreaId::new("lobby"))
    );

    send_text(&mut client, "not a location").await;
    let error = next_matching(&mut client, |v| v.get("error").is_some()).await;
    assert!(error["error"].as_str().unwrap().contains("invalid location frame"));

    send_text(&mut client, r#"{"x":20,"y":20,"facing":"left","moving":true}"#).await;
    next_matching(&mut client, |s| area_of(s, ada) == Some(Value::Null)).await;

    client.close(None).await.unwrap();
    wait_until(|| state.snapshot().participant(ada).is_none()).await;
    wait_until(|| !state.is_connected(ada)).await;
    assert!(
        state
            .snapshot()
            .area(&AreaId::new("lobby"))
            .unwrap()
            .members
            .is_empty()
    );
}

#[tokio::test]
async fn out_of_range_frame_is_answered_without_disconnecting() {
    let (state, observer) = start().await;
    let ada = state.session.add_participant("ada", None).await.unwrap().id;
    let (mut client, _) = connect_async(participant_url(&observer, ada)).await.unwrap();
    next_json(&mut client).await;

    send_text(&mut client, r#"{"x":1e999,"y":0,"facing":"front","moving":false}"#).await;
    let error = next_matching(&mut client, |v| v.get("error").is_some()).await;
    assert!(error["error"].is_string());

    send_text(&mut client, r#"{"x":1,"y":1,"facing":"back","moving":false}"#).await;
    next_matching(&mut client, |s| area_of(s, ada) == Some("lobby".into())).await;
}

#[tokio::test]
async fn second_connection_for_same_participant_is_refused() {
    let (state, observer) = start().await;
    let ada = state.session.add_participant("ada", None).await.unwrap().id;
    let url = participant_url(&observer, ada);
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    next_json(&mut client).await;

    assert_eq!(http_status(connect_async(url.as_str()).await), Some(409));

    // The refused attempt leaves the open connection and the participant alone.
    assert!(state.snapshot().participant(ada).is_some());
    send_text(&mut client, r#"{"x":2,"y":2,"facing":"right","moving":false}"#).await;
    next_matching(&mut client, |s| area_of(s, ada) == Some("lobby".into())).await;

    client.close(None).await.unwrap();
    wait_until(|| state.snapshot().participant(ada).is_none()).await;
}

#[tokio::test]
async fn unknown_participant_is_rejected_before_upgrade() {
    let (_state, observer) = start().await;
    let url = participant_url(&observer, ParticipantId::new());

    assert_eq!(http_status(connect_async(url).await), Some(404));
}

#[tokio::test]
async fn snapshot_stream_follows_joins() {
    let (state, observer) = start().await;
    let url = format!("ws://{}/ws/snapshots", observer.local_addr);
    let (mut client, _) = connect_async(url).await.unwrap();

    let first = next_json(&mut client).await;
    assert_eq!(first["participants"].as_array().unwrap().len(), 0);

    let ada = state.session.add_participant("ada", None).await.unwrap().id;
    let joined = next_matching(&mut client, |s| area_of(s, ada).is_some()).await;
    assert_eq!(joined["participants"][0]["displayName"], "ada");
}
