//! Error types for the observer API.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! converts into an Axum HTTP response with a JSON `{error, status}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use covey_core::{RefreshError, SessionError};
use covey_enrichment::EnrichmentError;

/// Errors that can occur in the observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or parameters were rejected.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The music service rejected the participant's token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The music service answered with something unusable.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// The request clashes with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A dependency is down or disabled.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for ObserverError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::NotFound(format!("participant {id}")),
            SessionError::InvalidLocation { .. } => Self::InvalidRequest(err.to_string()),
            SessionError::Evicted(_) => Self::Internal(err.to_string()),
            SessionError::Closed => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<RefreshError> for ObserverError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Session(err) => err.into(),
            RefreshError::Enrichment(EnrichmentError::Unauthorized(msg)) => Self::Unauthorized(msg),
            RefreshError::Enrichment(EnrichmentError::Malformed(msg)) => Self::BadGateway(msg),
            RefreshError::Enrichment(EnrichmentError::Unavailable(msg)) => Self::Unavailable(msg),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRequest(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use covey_types::ParticipantId;

    use super::*;

    #[test]
    fn session_errors_map_to_statuses() {
        let cases = [
            (SessionError::NotFound(ParticipantId::new()), StatusCode::NOT_FOUND),
            (
                SessionError::InvalidLocation { x: 0.0, y: 0.0 },
                StatusCode::BAD_REQUEST,
            ),
            (
                SessionError::Evicted(ParticipantId::new()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SessionError::Closed, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ObserverError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn enrichment_errors_map_to_statuses() {
        let cases = [
            (
                EnrichmentError::Unauthorized("expired".to_owned()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                EnrichmentError::Malformed("no items".to_owned()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                EnrichmentError::Unavailable("timeout".to_owned()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            let response = ObserverError::from(RefreshError::Enrichment(err)).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn conflict_is_409() {
        let response = ObserverError::Conflict("already connected".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
