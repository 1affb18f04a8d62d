//! Axum router construction for the observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/snapshots` -- `WebSocket` snapshot stream
/// - `GET /ws/participants/{id}` -- participant `WebSocket` (movement in, snapshots out)
/// - `GET /api/snapshot` -- latest snapshot
/// - `GET /api/areas` -- conversation areas with members
/// - `POST /api/participants` -- join
/// - `GET|DELETE /api/participants/{id}` -- read or remove a participant
/// - `POST /api/participants/{id}/refresh` -- one enrichment round
/// - `POST /api/moves` -- movement update
///
/// CORS allows any origin so a browser client can be served separately.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/snapshots", get(ws::ws_snapshots))
        .route("/ws/participants/{id}", get(ws::ws_participant))
        // REST API
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/areas", get(handlers::list_areas))
        .route("/api/participants", post(handlers::join))
        .route(
            "/api/participants/{id}",
            get(handlers::get_participant).delete(handlers::leave),
        )
        .route("/api/participants/{id}/refresh", post(handlers::refresh))
        .route("/api/moves", post(handlers::apply_move))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
