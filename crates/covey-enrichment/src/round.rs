//! One refresh round: the three catalog fetches for a single participant.
//!
//! The fetches run concurrently, each under its own deadline. A timeout is
//! reported as [`EnrichmentError::Unavailable`]. The round never short
//! circuits: every fetch gets its own result so a failure in one cannot
//! discard another's success.

use std::future::Future;
use std::time::Duration;

use crate::catalog::{FetchResult, MusicCatalog, Playlist, Profile, Track};
use crate::error::EnrichmentError;
use crate::patch::EnrichmentPatch;
use crate::token::AccessToken;

/// The three fetch results of a single round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Currently playing track.
    pub track: FetchResult<Track>,
    /// Primary playlist.
    pub playlist: FetchResult<Playlist>,
    /// Profile.
    pub profile: FetchResult<Profile>,
}

impl RoundOutcome {
    /// The failed fetches, labelled by which data they were for.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &EnrichmentError)> {
        [
            ("track", self.track.as_ref().err()),
            ("playlist", self.playlist.as_ref().err()),
            ("profile", self.profile.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(label, err)| err.map(|e| (label, e)))
    }

    /// The error to report for the round, if any fetch failed.
    pub fn error(&self) -> Option<EnrichmentError> {
        EnrichmentError::most_severe(self.failures().map(|(_, e)| e)).cloned()
    }

    /// Whether the upstream rejected the token in any of the fetches.
    pub fn is_unauthorized(&self) -> bool {
        self.failures()
            .any(|(_, e)| matches!(e, EnrichmentError::Unauthorized(_)))
    }

    /// Convert into merge instructions.
    pub fn into_patch(self) -> EnrichmentPatch {
        EnrichmentPatch {
            track: self.track.into(),
            playlist: self.playlist.into(),
            profile: self.profile.into(),
        }
    }
}

/// Run the three fetches concurrently, each bounded by `limit`.
pub async fn fetch_round<C: MusicCatalog>(
    catalog: &C,
    token: &AccessToken,
    limit: Duration,
) -> RoundOutcome {
    let (track, playlist, profile) = tokio::join!(
        bounded(limit, "track", catalog.current_track(token)),
        bounded(limit, "playlist", catalog.primary_playlist(token)),
        bounded(limit, "profile", catalog.profile(token)),
    );
    RoundOutcome {
        track,
        playlist,
        profile,
    }
}

async fn bounded<T>(
    limit: Duration,
    label: &'static str,
    fetch: impl Future<Output = FetchResult<T>>,
) -> FetchResult<T> {
    tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
        Err(EnrichmentError::Unavailable(format!(
            "{label} fetch timed out after {}ms",
            limit.as_millis()
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A catalog whose playlist endpoint never answers.
    struct StuckPlaylist;

    impl MusicCatalog for StuckPlaylist {
        async fn current_track(&self, _token: &AccessToken) -> FetchResult<Track> {
            Ok(Some(Track {
                title: String::from("X"),
                url: None,
            }))
        }

        async fn primary_playlist(&self, _token: &AccessToken) -> FetchResult<Playlist> {
            std::future::pending().await
        }

        async fn profile(&self, _token: &AccessToken) -> FetchResult<Profile> {
            Err(EnrichmentError::Malformed(String::from("no id")))
        }

        fn name(&self) -> &str {
            "stuck"
        }
    }

    #[allow(clippy::unwrap_used)]
    fn token() -> AccessToken {
        AccessToken::new("t").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_unavailable_and_does_not_discard_others() {
        let outcome = fetch_round(&StuckPlaylist, &token(), Duration::from_millis(50)).await;

        assert!(matches!(outcome.track, Ok(Some(_))));
        assert!(matches!(outcome.playlist, Err(EnrichmentError::Unavailable(_))));
        assert!(matches!(outcome.profile, Err(EnrichmentError::Malformed(_))));
        assert_eq!(outcome.failures().count(), 2);
        assert_eq!(outcome.error().as_ref().map(EnrichmentError::kind), Some("malformed"));
        assert!(!outcome.is_unauthorized());

        let patch = outcome.into_patch();
        assert!(matches!(patch.track, crate::patch::FieldUpdate::Set(_)));
        assert_eq!(patch.playlist, crate::patch::FieldUpdate::Keep);
        assert_eq!(patch.profile, crate::patch::FieldUpdate::Keep);
    }

    #[test]
    fn clean_round_has_no_error() {
        let outcome = RoundOutcome {
            track: Ok(None),
            playlist: Ok(None),
            profile: Ok(None),
        };
        assert!(outcome.error().is_none());
        assert_eq!(outcome.failures().count(), 0);
    }
}
