//! HTTP and `WebSocket` API over a running Covey session.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **REST endpoints** to join, leave, move, and trigger enrichment, and
//!   to read the latest session snapshot
//! - **`WebSocket` endpoints**: a read-only snapshot feed (`/ws/snapshots`)
//!   and per-participant connections (`/ws/participants/{id}`) that accept
//!   movement frames and remove the participant when closed
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Every read is served from the session's latest published
//! [`SessionSnapshot`](covey_types::SessionSnapshot), so the API never
//! blocks on the session writer for reads. `WebSocket` clients follow the
//! session's `watch` channel and always jump to the newest snapshot.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::{AppState, ConnectionClaim};
