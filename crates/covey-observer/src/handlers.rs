//! REST API endpoint handlers for the observer server.
//!
//! Reads are served from the session's latest published snapshot. Writes
//! go through the [`SessionHandle`](covey_core::SessionHandle) and return
//! once the writer has committed them.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/snapshot` | Full session snapshot |
//! | `GET` | `/api/areas` | Conversation areas and their members |
//! | `POST` | `/api/participants` | Join |
//! | `GET` | `/api/participants/{id}` | Single participant |
//! | `DELETE` | `/api/participants/{id}` | Leave (idempotent) |
//! | `POST` | `/api/participants/{id}/refresh` | Run one enrichment round |
//! | `POST` | `/api/moves` | Apply a movement update |

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use covey_enrichment::AccessToken;
use covey_types::{MoveRequest, NewParticipantRequest, ParticipantId, SessionSnapshot};
use tracing::info;
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

/// Longest accepted display name, in characters.
const MAX_DISPLAY_NAME: usize = 64;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing session status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let town = &state.town_name;
    let generation = snapshot.generation;
    let participant_count = snapshot.participants.len();
    let in_conversation = snapshot
        .participants
        .iter()
        .filter(|p| p.conversation_area_id.is_some())
        .count();
    let enrichment = if state.enricher.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    let mut area_rows = String::new();
    for area in &snapshot.areas {
        let _ = write!(
            area_rows,
            "<tr><td>{}</td><td>{}</td></tr>",
            area.id,
            area.members.len()
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{town} -- Covey</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 640px; }}
        td, th {{ padding: 0.2rem 1rem 0.2rem 0; text-align: left; }}
        code {{ font-size: 0.9rem; }}
    </style>
</head>
<body>
    <h1>{town}</h1>
    <table>
        <tr><th>Generation</th><td>{generation}</td></tr>
        <tr><th>Participants</th><td>{participant_count}</td></tr>
        <tr><th>In conversation</th><td>{in_conversation}</td></tr>
        <tr><th>Enrichment</th><td>{enrichment}</td></tr>
    </table>

    <h2>Conversation areas</h2>
    <table>
        <tr><th>Area</th><th>Members</th></tr>
        {area_rows}
    </table>

    <h2>API</h2>
    <ul>
        <li><code>GET <a href="/api/snapshot">/api/snapshot</a></code></li>
        <li><code>GET <a href="/api/areas">/api/areas</a></code></li>
        <li><code>POST /api/participants</code></li>
        <li><code>GET | DELETE /api/participants/{{id}}</code></li>
        <li><code>POST /api/participants/{{id}}/refresh</code></li>
        <li><code>POST /api/moves</code></li>
        <li><code>WS /ws/snapshots</code></li>
        <li><code>WS /ws/participants/{{id}}</code></li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Snapshot reads
// ---------------------------------------------------------------------------

/// Return the latest committed snapshot.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(SessionSnapshot::clone(&state.snapshot()))
}

/// List conversation areas with their current members.
pub async fn list_areas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    Json(serde_json::json!({
        "generation": snapshot.generation,
        "count": snapshot.areas.len(),
        "areas": snapshot.areas,
    }))
}

/// Return a single participant.
pub async fn get_participant(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = parse_participant_id(&id_str)?;
    let snapshot = state.snapshot();
    let participant = snapshot
        .participant(id)
        .ok_or_else(|| ObserverError::NotFound(format!("participant {id}")))?;
    Ok(Json(participant.clone()))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Admit a participant. Starts an initial enrichment round in the
/// background when a token was supplied.
pub async fn join(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewParticipantRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(ObserverError::InvalidRequest(
            "displayName must not be empty".to_owned(),
        ));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME {
        return Err(ObserverError::InvalidRequest(format!(
            "displayName must be at most {MAX_DISPLAY_NAME} characters"
        )));
    }

    let token = request.enrichment_token.and_then(AccessToken::new);
    let has_token = token.is_some();
    let view = state.session.add_participant(display_name, token).await?;

    if has_token {
        if let Some(enricher) = &state.enricher {
            enricher.spawn_refresh(view.id);
        }
    }
    Ok((StatusCode::CREATED, Json(view)))
}

/// Remove a participant. Succeeds whether or not it was present.
pub async fn leave(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, ObserverError> {
    let id = parse_participant_id(&id_str)?;
    if state.session.remove_participant(id).await? {
        info!(participant = %id, "participant removed via API");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a movement update and report the resulting membership.
pub async fn apply_move(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let area = state.session.apply_move(request).await?;
    Ok(Json(serde_json::json!({
        "participantId": request.participant_id,
        "conversationAreaId": area,
    })))
}

/// Run one enrichment round for a participant.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, ObserverError> {
    let id = parse_participant_id(&id_str)?;
    let enricher = state
        .enricher
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable("enrichment is disabled".to_owned()))?;
    enricher.refresh(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a participant id from a path segment.
pub(crate) fn parse_participant_id(s: &str) -> Result<ParticipantId, ObserverError> {
    s.parse::<Uuid>()
        .map(ParticipantId::from)
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
