//! Shared type definitions for the Covey proximity and enrichment engine.
//!
//! This crate is the single source of truth for every type that crosses a
//! crate or wire boundary. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the town frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Participant and conversation area identifiers
//! - [`enums`] -- Enumeration types (avatar facing)
//! - [`structs`] -- Location, bounding boxes, enrichment, and the snapshot read model
//! - [`requests`] -- Join and movement request payloads

pub mod enums;
pub mod ids;
pub mod requests;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Facing;
pub use ids::{AreaId, ParticipantId};
pub use requests::{MoveRequest, NewParticipantRequest};
pub use structs::{
    AreaConfig, AreaView, BoundingBox, Enrichment, Location, ParticipantView, SessionSnapshot,
};
