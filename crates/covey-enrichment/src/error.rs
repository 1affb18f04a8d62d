//! Error types for the enrichment pipeline.
//!
//! Uses `thiserror` for typed errors that surface from every music-catalog
//! call: rejected tokens, transient upstream failures, and responses whose
//! shape does not match what the client expects.

/// Errors that can occur while fetching enrichment data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichmentError {
    /// The access token was rejected. The caller should stop scheduling
    /// refreshes for this participant.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A transient upstream failure (network error, timeout, rate limit,
    /// server error). The caller may retry later.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The upstream response did not have the expected shape. Retried like
    /// [`Self::Unavailable`] but kept distinct for logging.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl EnrichmentError {
    /// Whether a later refresh may succeed.
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unauthorized(_))
    }

    /// Short machine-readable name, used as a structured log field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Unavailable(_) => "unavailable",
            Self::Malformed(_) => "malformed",
        }
    }

    const fn severity(&self) -> u8 {
        match self {
            Self::Unavailable(_) => 1,
            Self::Malformed(_) => 2,
            Self::Unauthorized(_) => 3,
        }
    }

    /// Pick the error that should be reported for a round with several
    /// failures: `Unauthorized` over `Malformed` over `Unavailable`.
    pub fn most_severe<'a>(errors: impl IntoIterator<Item = &'a Self>) -> Option<&'a Self> {
        errors.into_iter().fold(None, |worst, e| match worst {
            Some(w) if w.severity() >= e.severity() => Some(w),
            _ => Some(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_is_terminal() {
        assert!(!EnrichmentError::Unauthorized(String::new()).is_retryable());
        assert!(EnrichmentError::Unavailable(String::new()).is_retryable());
        assert!(EnrichmentError::Malformed(String::new()).is_retryable());
    }

    #[test]
    fn most_severe_prefers_unauthorized() {
        let errors = [
            EnrichmentError::Unavailable(String::from("timeout")),
            EnrichmentError::Unauthorized(String::from("401")),
            EnrichmentError::Malformed(String::from("bad json")),
        ];
        let worst = EnrichmentError::most_severe(&errors);
        assert_eq!(worst.map(EnrichmentError::kind), Some("unauthorized"));
    }

    #[test]
    fn most_severe_keeps_first_on_tie() {
        let errors = [
            EnrichmentError::Unavailable(String::from("first")),
            EnrichmentError::Unavailable(String::from("second")),
        ];
        let worst = EnrichmentError::most_severe(&errors);
        assert_eq!(worst, Some(&EnrichmentError::Unavailable(String::from("first"))));
        let none: [EnrichmentError; 0] = [];
        assert!(EnrichmentError::most_severe(&none).is_none());
    }
}
