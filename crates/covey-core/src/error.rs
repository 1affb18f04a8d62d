//! Error types for the `covey-core` crate.

use covey_enrichment::EnrichmentError;
use covey_types::ParticipantId;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// No participant with this id is in the session.
    #[error("participant not found: {0}")]
    NotFound(ParticipantId),

    /// A movement update carried a NaN or infinite coordinate.
    #[error("invalid location ({x}, {y}): coordinates must be finite")]
    InvalidLocation {
        /// Submitted x coordinate.
        x: f64,
        /// Submitted y coordinate.
        y: f64,
    },

    /// The participant's membership record was inconsistent and it was
    /// removed from the session.
    #[error("participant {0} was evicted after an inconsistent membership record")]
    Evicted(ParticipantId),

    /// The session writer has shut down.
    #[error("session is closed")]
    Closed,
}

/// Errors returned by a refresh round.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefreshError {
    /// The session rejected the request (unknown participant, closed session).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// At least one fetch failed. Successful fetches were still merged.
    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),
}

impl RefreshError {
    /// The enrichment failure, if this is one.
    pub const fn enrichment(&self) -> Option<&EnrichmentError> {
        match self {
            Self::Enrichment(err) => Some(err),
            Self::Session(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let id = ParticipantId::new();
        assert_eq!(
            SessionError::NotFound(id).to_string(),
            format!("participant not found: {id}")
        );
        assert_eq!(SessionError::Closed.to_string(), "session is closed");
    }

    #[test]
    fn refresh_error_is_transparent() {
        let err = RefreshError::from(EnrichmentError::Unauthorized("expired".to_owned()));
        assert_eq!(
            err.to_string(),
            EnrichmentError::Unauthorized("expired".to_owned()).to_string()
        );
        assert!(err.enrichment().is_some());
        assert!(RefreshError::from(SessionError::Closed).enrichment().is_none());
    }
}
