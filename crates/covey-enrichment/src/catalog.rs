//! The narrow contract the enrichment pipeline needs from a music service.
//!
//! Every fetch distinguishes three outcomes:
//!
//! - `Ok(Some(item))` -- data is available
//! - `Ok(None)` -- the call succeeded but there is nothing to show
//!   (nothing playing, no playlists)
//! - `Err(_)` -- the call failed; see [`EnrichmentError`]
//!
//! The pipeline clears a field on `Ok(None)` and keeps its previous value on
//! `Err(_)`.

use std::future::Future;

use crate::error::EnrichmentError;
use crate::token::AccessToken;

/// Outcome of a single catalog fetch.
pub type FetchResult<T> = Result<Option<T>, EnrichmentError>;

/// The track a participant is currently listening to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Track title.
    pub title: String,
    /// Public link to the track, when the service provides one.
    pub url: Option<String>,
}

/// A participant's primary (most recent) playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// Playlist name.
    pub name: String,
    /// Public link to the playlist, when the service provides one.
    pub url: Option<String>,
}

/// A participant's public profile on the music service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// The participant's handle.
    pub handle: String,
    /// Public link to the profile, when the service provides one.
    pub url: Option<String>,
}

/// A music service reachable with a per-participant access token.
///
/// The three fetches are independent reads and may run concurrently.
pub trait MusicCatalog: Send + Sync {
    /// Fetch the currently playing track.
    fn current_track(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = FetchResult<Track>> + Send;

    /// Fetch the participant's primary playlist.
    fn primary_playlist(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = FetchResult<Playlist>> + Send;

    /// Fetch the participant's profile.
    fn profile(&self, token: &AccessToken) -> impl Future<Output = FetchResult<Profile>> + Send;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
