//! Token-gated music-service enrichment for Covey participants.
//!
//! For each participant holding an [`AccessToken`], a refresh round fetches
//! three independent pieces of data from the music service (currently
//! playing track, primary playlist, profile handle) and turns the results
//! into an [`EnrichmentPatch`] that is merged field by field into the
//! participant's public [`Enrichment`](covey_types::Enrichment).
//!
//! # Architecture
//!
//! ```text
//! AccessToken --> fetch_round (3 concurrent fetches, each with a deadline)
//!             --> RoundOutcome --> EnrichmentPatch --> merged by the session writer
//! ```
//!
//! This crate never touches session state. Merging happens in the session's
//! single writer so enrichment can never race a movement update.
//!
//! # Modules
//!
//! - [`catalog`] -- The [`MusicCatalog`] contract and its data types.
//! - [`spotify`] -- Spotify Web API implementation over `reqwest`.
//! - [`round`] -- Concurrent, deadline-bounded fetching of one round.
//! - [`patch`] -- Keep/clear/set merge semantics per field group.
//! - [`token`] -- The redacted [`AccessToken`] capability.
//! - [`error`] -- [`EnrichmentError`] taxonomy.

pub mod catalog;
pub mod error;
pub mod patch;
pub mod round;
pub mod spotify;
pub mod token;

// Re-export primary types at crate root.
pub use catalog::{FetchResult, MusicCatalog, Playlist, Profile, Track};
pub use error::EnrichmentError;
pub use patch::{EnrichmentPatch, FieldUpdate};
pub use round::{RoundOutcome, fetch_round};
pub use spotify::{SpotifyClient, SpotifyConfig};
pub use token::AccessToken;
