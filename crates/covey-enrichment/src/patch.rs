//! Field-by-field merge of fetch results into an [`Enrichment`] bundle.

use covey_types::Enrichment;

use crate::catalog::{FetchResult, Playlist, Profile, Track};

/// What to do with one group of enrichment fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// The fetch failed: keep whatever was known before.
    Keep,
    /// The fetch succeeded with nothing to show: clear the fields.
    Clear,
    /// The fetch succeeded: replace the fields.
    Set(T),
}

impl<T> From<FetchResult<T>> for FieldUpdate<T> {
    fn from(result: FetchResult<T>) -> Self {
        match result {
            Ok(Some(value)) => Self::Set(value),
            Ok(None) => Self::Clear,
            Err(_) => Self::Keep,
        }
    }
}

/// The merge instructions produced by one refresh round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentPatch {
    /// Track title and link.
    pub track: FieldUpdate<Track>,
    /// Playlist name and link.
    pub playlist: FieldUpdate<Playlist>,
    /// Profile handle and link.
    pub profile: FieldUpdate<Profile>,
}

impl EnrichmentPatch {
    /// A patch that changes nothing.
    pub const fn keep_all() -> Self {
        Self {
            track: FieldUpdate::Keep,
            playlist: FieldUpdate::Keep,
            profile: FieldUpdate::Keep,
        }
    }

    /// Whether applying the patch would leave any bundle unchanged.
    pub const fn is_noop(&self) -> bool {
        matches!(self.track, FieldUpdate::Keep)
            && matches!(self.playlist, FieldUpdate::Keep)
            && matches!(self.profile, FieldUpdate::Keep)
    }

    /// Merge into the participant's current enrichment.
    ///
    /// Fields covered by a `Keep` are carried over untouched, so a failed
    /// fetch never erases values merged by an earlier round.
    pub fn apply(self, current: Option<Enrichment>) -> Enrichment {
        let mut merged = current.unwrap_or_default();

        match self.track {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                merged.track_title = None;
                merged.track_url = None;
            }
            FieldUpdate::Set(track) => {
                merged.track_title = Some(track.title);
                merged.track_url = track.url;
            }
        }

        match self.playlist {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                merged.playlist_name = None;
                merged.playlist_url = None;
            }
            FieldUpdate::Set(playlist) => {
                merged.playlist_name = Some(playlist.name);
                merged.playlist_url = playlist.url;
            }
        }

        match self.profile {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                merged.profile_handle = None;
                merged.profile_url = None;
            }
            FieldUpdate::Set(profile) => {
                merged.profile_handle = Some(profile.handle);
                merged.profile_url = profile.url;
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnrichmentError;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_owned(),
            url: Some(format!("https://tracks/{title}")),
        }
    }

    fn existing() -> Enrichment {
        Enrichment {
            track_title: Some(String::from("old song")),
            track_url: Some(String::from("https://tracks/old")),
            playlist_name: Some(String::from("old mix")),
            playlist_url: None,
            profile_handle: Some(String::from("ada")),
            profile_url: None,
        }
    }

    #[test]
    fn fetch_results_map_to_updates() {
        let ok: FetchResult<Track> = Ok(Some(track("a")));
        let empty: FetchResult<Track> = Ok(None);
        let failed: FetchResult<Track> = Err(EnrichmentError::Unavailable(String::from("x")));
        assert_eq!(FieldUpdate::from(ok), FieldUpdate::Set(track("a")));
        assert_eq!(FieldUpdate::from(empty), FieldUpdate::Clear);
        assert_eq!(FieldUpdate::from(failed), FieldUpdate::Keep);
    }

    #[test]
    fn keep_preserves_previous_values() {
        let patch = EnrichmentPatch {
            track: FieldUpdate::Set(track("new song")),
            playlist: FieldUpdate::Keep,
            profile: FieldUpdate::Keep,
        };
        let merged = patch.apply(Some(existing()));
        assert_eq!(merged.track_title.as_deref(), Some("new song"));
        assert_eq!(merged.playlist_name.as_deref(), Some("old mix"));
        assert_eq!(merged.profile_handle.as_deref(), Some("ada"));
    }

    #[test]
    fn clear_reflects_ground_truth() {
        let patch = EnrichmentPatch {
            track: FieldUpdate::Clear,
            ..EnrichmentPatch::keep_all()
        };
        let merged = patch.apply(Some(existing()));
        assert!(merged.track_title.is_none());
        assert!(merged.track_url.is_none());
        assert_eq!(merged.playlist_name.as_deref(), Some("old mix"));
    }

    #[test]
    fn set_replaces_link_even_when_absent() {
        let patch = EnrichmentPatch {
            profile: FieldUpdate::Set(Profile {
                handle: String::from("grace"),
                url: None,
            }),
            ..EnrichmentPatch::keep_all()
        };
        let mut start = existing();
        start.profile_url = Some(String::from("https://profiles/ada"));
        let merged = patch.apply(Some(start));
        assert_eq!(merged.profile_handle.as_deref(), Some("grace"));
        assert!(merged.profile_url.is_none());
    }

    #[test]
    fn applying_to_nothing_starts_empty() {
        assert!(EnrichmentPatch::keep_all().is_noop());
        let merged = EnrichmentPatch::keep_all().apply(None);
        assert!(merged.is_empty());
    }
}
