//! Spotify Web API implementation of [`MusicCatalog`].
//!
//! Talks to three endpoints with the participant's bearer token:
//!
//! | Fetch | Endpoint |
//! |-------|----------|
//! | current track | `GET {api_url}/me/player/currently-playing` |
//! | primary playlist | `GET {api_url}/me/playlists?limit=1` |
//! | profile | `GET {api_url}/me` |
//!
//! Status codes map onto [`EnrichmentError`]: 401/403 are `Unauthorized`,
//! 408/429/5xx and transport failures are `Unavailable`, anything else
//! unexpected is `Malformed`. A `204 No Content` is "no data".

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::catalog::{FetchResult, MusicCatalog, Playlist, Profile, Track};
use crate::error::EnrichmentError;
use crate::token::AccessToken;

/// Default Spotify Web API base URL.
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Connection settings for [`SpotifyClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyConfig {
    /// Base API URL without a trailing slash (e.g. `https://api.spotify.com/v1`).
    pub api_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// A [`MusicCatalog`] backed by the Spotify Web API.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: reqwest::Client,
    api_url: String,
}

impl SpotifyClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the HTTP client cannot
    /// be constructed (e.g. the TLS backend fails to initialize).
    pub fn new(config: &SpotifyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// The base URL requests are sent to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Issue an authenticated GET and return the decoded JSON body.
    ///
    /// Returns `Ok(None)` for `204 No Content`.
    async fn get_json(&self, path: &str, token: &AccessToken) -> Result<Option<Value>, EnrichmentError> {
        let url = format!("{}{path}", self.api_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| EnrichmentError::Unavailable(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "catalog response");
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(classify_status(status, path, &error_body));
        }

        let json = response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                EnrichmentError::Unavailable(format!("reading {path} timed out: {e}"))
            } else {
                EnrichmentError::Malformed(format!("{path} body is not JSON: {e}"))
            }
        })?;
        Ok(Some(json))
    }
}

impl MusicCatalog for SpotifyClient {
    async fn current_track(&self, token: &AccessToken) -> FetchResult<Track> {
        match self.get_json("/me/player/currently-playing", token).await? {
            Some(json) => extract_track(&json),
            None => Ok(None),
        }
    }

    async fn primary_playlist(&self, token: &AccessToken) -> FetchResult<Playlist> {
        match self.get_json("/me/playlists?limit=1", token).await? {
            Some(json) => extract_playlist(&json),
            None => Ok(None),
        }
    }

    async fn profile(&self, token: &AccessToken) -> FetchResult<Profile> {
        match self.get_json("/me", token).await? {
            Some(json) => extract_profile(&json),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "spotify"
    }
}

/// Map a non-success HTTP status onto the enrichment error taxonomy.
pub fn classify_status(status: StatusCode, path: &str, body: &str) -> EnrichmentError {
    let message = format!("{path} returned {status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EnrichmentError::Unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            EnrichmentError::Unavailable(message)
        }
        s if s.is_server_error() => EnrichmentError::Unavailable(message),
        _ => EnrichmentError::Malformed(message),
    }
}

/// Public link from a Spotify object's `external_urls.spotify` field.
fn external_url(object: &Value) -> Option<String> {
    object
        .get("external_urls")
        .and_then(|u| u.get("spotify"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

/// Extract the current track from a `currently-playing` response.
///
/// Paused playback and a `null` item (ads, private sessions) are "no data".
fn extract_track(json: &Value) -> FetchResult<Track> {
    if json.get("is_playing").and_then(Value::as_bool) == Some(false) {
        return Ok(None);
    }
    let item = match json.get("item") {
        None | Some(Value::Null) => return Ok(None),
        Some(item) => item,
    };
    let title = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            EnrichmentError::Malformed("currently-playing item missing name".to_owned())
        })?;
    Ok(Some(Track {
        title: title.to_owned(),
        url: external_url(item),
    }))
}

/// Extract the first playlist from a paged `playlists` response.
fn extract_playlist(json: &Value) -> FetchResult<Playlist> {
    let items = json
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| EnrichmentError::Malformed("playlists response missing items".to_owned()))?;
    let Some(first) = items.first() else {
        return Ok(None);
    };
    let name = first
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| EnrichmentError::Malformed("playlist missing name".to_owned()))?;
    Ok(Some(Playlist {
        name: name.to_owned(),
        url: external_url(first),
    }))
}

/// Extract the profile handle from a `me` response.
fn extract_profile(json: &Value) -> FetchResult<Profile> {
    let handle = json
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| EnrichmentError::Malformed("profile response missing id".to_owned()))?;
    Ok(Some(Profile {
        handle: handle.to_owned(),
        url: external_url(json),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_track_playing() {
        let json = serde_json::json!({
            "is_playing": true,
            "item": {
                "name": "This World Is On Fire",
                "external_urls": {"spotify": "https://open.spotify.com/track/1"}
            }
        });
        let track = extract_track(&json);
        assert_eq!(
            track,
            Ok(Some(Track {
                title: String::from("This World Is On Fire"),
                url: Some(String::from("https://open.spotify.com/track/1")),
            }))
        );
    }

    #[test]
    fn extract_track_paused_or_empty_is_no_data() {
        let paused = serde_json::json!({"is_playing": false, "item": {"name": "x"}});
        assert_eq!(extract_track(&paused), Ok(None));
        let null_item = serde_json::json!({"is_playing": true, "item": null});
        assert_eq!(extract_track(&null_item), Ok(None));
    }

    #[test]
    fn extract_track_without_name_is_malformed() {
        let json = serde_json::json!({"is_playing": true, "item": {"id": "abc"}});
        assert!(matches!(extract_track(&json), Err(EnrichmentError::Malformed(_))));
    }

    #[test]
    fn extract_playlist_first_item() {
        let json = serde_json::json!({
            "items": [
                {"name": "test - Pavan", "external_urls": {"spotify": "https://open.spotify.com/playlist/9"}},
                {"name": "older"}
            ]
        });
        let playlist = extract_playlist(&json).ok().flatten();
        assert_eq!(playlist.map(|p| p.name), Some(String::from("test - Pavan")));
    }

    #[test]
    fn extract_playlist_empty_is_no_data() {
        let json = serde_json::json!({"items": []});
        assert_eq!(extract_playlist(&json), Ok(None));
        let missing = serde_json::json!({"error": "nope"});
        assert!(matches!(extract_playlist(&missing), Err(EnrichmentError::Malformed(_))));
    }

    #[test]
    fn extract_profile_uses_id_as_handle() {
        let json = serde_json::json!({"id": "spotted-flamingo", "display_name": "Flamingo"});
        let profile = extract_profile(&json).ok().flatten();
        assert_eq!(
            profile,
            Some(Profile {
                handle: String::from("spotted-flamingo"),
                url: None,
            })
        );
        let missing = serde_json::json!({"display_name": "Flamingo"});
        assert!(extract_profile(&missing).is_err());
    }

    #[test]
    fn status_classification() {
        let kind = |s| classify_status(s, "/me", "").kind();
        assert_eq!(kind(StatusCode::UNAUTHORIZED), "unauthorized");
        assert_eq!(kind(StatusCode::FORBIDDEN), "unauthorized");
        assert_eq!(kind(StatusCode::TOO_MANY_REQUESTS), "unavailable");
        assert_eq!(kind(StatusCode::BAD_GATEWAY), "unavailable");
        assert_eq!(kind(StatusCode::REQUEST_TIMEOUT), "unavailable");
        assert_eq!(kind(StatusCode::NOT_FOUND), "malformed");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = SpotifyConfig {
            api_url: String::from("http://localhost:9999/v1/"),
            ..SpotifyConfig::default()
        };
        let client = SpotifyClient::new(&config);
        assert_eq!(
            client.ok().map(|c| c.api_url().to_owned()),
            Some(String::from("http://localhost:9999/v1"))
        );
    }
}
