//! `WebSocket` handlers for real-time session streaming.
//!
//! `GET /ws/snapshots` is a read-only feed: the client receives the current
//! snapshot on connect and a new one every time the session publishes.
//!
//! `GET /ws/participants/{id}` is a participant's own connection. It
//! streams snapshots the same way and accepts [`Location`] JSON frames as
//! movement updates. Closing the socket removes the participant. A
//! participant has at most one such connection; a second upgrade while the
//! first is open is refused with `409 Conflict`.
//!
//! Both feeds read from a `watch` channel, so a slow client skips straight
//! to the newest snapshot instead of queueing stale ones.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use covey_core::SessionError;
use covey_types::{Location, ParticipantId, SessionSnapshot};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ObserverError;
use crate::handlers::parse_participant_id;
use crate::state::{AppState, ConnectionClaim};

/// Upgrade to a read-only snapshot stream.
///
/// # Route
///
/// `GET /ws/snapshots`
pub async fn ws_snapshots(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_observer(socket, state))
}

/// Upgrade to a participant connection.
///
/// Rejects unknown participants with 404 and participants that are
/// already connected with 409, both before upgrading.
///
/// # Route
///
/// `GET /ws/participants/{id}`
pub async fn ws_participant(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Response, ObserverError> {
    let id = parse_participant_id(&id_str)?;
    if state.snapshot().participant(id).is_none() {
        return Err(ObserverError::NotFound(format!("participant {id}")));
    }
    let claim = state
        .claim_connection(id)
        .ok_or_else(|| ObserverError::Conflict(format!("participant {id} is already connected")))?;
    Ok(ws.on_upgrade(move |socket| handle_participant(socket, state, id, claim)))
}

/// What the connection loop should do after handling one event.
enum Flow {
    Continue,
    Stop,
}

async fn handle_observer(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("snapshot client connected");
    let mut rx = state.session.subscribe();
    if matches!(push_latest(&mut socket, &mut rx).await, Flow::Stop) {
        return;
    }

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("session closed, ending snapshot stream");
                    return;
                }
                if matches!(push_latest(&mut socket, &mut rx).await, Flow::Stop) {
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("snapshot client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// The claim is held until the participant has been removed.
async fn handle_participant(
    mut socket: WebSocket,
    state: Arc<AppState>,
    id: ParticipantId,
    claim: ConnectionClaim,
) {
    info!(participant = %id, "participant connected");
    let mut rx = state.session.subscribe();

    if matches!(push_latest(&mut socket, &mut rx).await, Flow::Continue) {
        loop {
            let flow = tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        Flow::Stop
                    } else {
                        push_latest(&mut socket, &mut rx).await
                    }
                }
                msg = socket.recv() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        apply_frame(&mut socket, &state, id, text.as_str()).await
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            Flow::Stop
                        } else {
                            Flow::Continue
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => Flow::Stop,
                    Some(Ok(_)) => Flow::Continue,
                },
            };
            if matches!(flow, Flow::Stop) {
                break;
            }
        }
    }

    match state.session.remove_participant(id).await {
        Ok(true) => info!(participant = %id, "participant disconnected"),
        Ok(false) => debug!(participant = %id, "participant already gone on disconnect"),
        Err(err) => debug!(participant = %id, error = %err, "could not remove participant"),
    }
    drop(claim);
}

/// Parse a movement frame and commit it. Bad frames are answered with an
/// error frame; a participant that no longer exists ends the connection.
async fn apply_frame(
    socket: &mut WebSocket,
    state: &AppState,
    id: ParticipantId,
    text: &str,
) -> Flow {
    let location: Location = match serde_json::from_str(text) {
        Ok(location) => location,
        Err(e) => return send_error(socket, &format!("invalid location frame: {e}")).await,
    };

    match state.session.move_participant(id, location).await {
        Ok(_) => Flow::Continue,
        Err(err @ SessionError::InvalidLocation { .. }) => send_error(socket, &err.to_string()).await,
        Err(err) => {
            warn!(participant = %id, error = %err, "movement rejected, closing connection");
            let _ = send_error(socket, &err.to_string()).await;
            Flow::Stop
        }
    }
}

async fn push_latest(
    socket: &mut WebSocket,
    rx: &mut watch::Receiver<Arc<SessionSnapshot>>,
) -> Flow {
    let snapshot = Arc::clone(&rx.borrow_and_update());
    let json = match serde_json::to_string(snapshot.as_ref()) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize snapshot: {e}");
            return Flow::Continue;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("WebSocket client disconnected (send failed)");
        return Flow::Stop;
    }
    Flow::Continue
}

async fn send_error(socket: &mut WebSocket, message: &str) -> Flow {
    let body = serde_json::json!({ "error": message }).to_string();
    if socket.send(Message::Text(body.into())).await.is_err() {
        Flow::Stop
    } else {
        Flow::Continue
    }
}
