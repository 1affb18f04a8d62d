//! The per-participant music-service credential.

/// An opaque access token authorizing music-catalog calls for one
/// participant.
///
/// Holding an `AccessToken` is the capability to enrich; the session keeps
/// it next to the participant record and drops it for good once the
/// upstream rejects it. `Debug` output is redacted so tokens never reach
/// the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string. Blank strings carry no capability.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_are_rejected() {
        assert!(AccessToken::new("").is_none());
        assert!(AccessToken::new("   ").is_none());
        assert_eq!(AccessToken::new("abc").map(|t| t.expose().to_owned()), Some(String::from("abc")));
    }

    #[test]
    fn debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        let printed = format!("{token:?}");
        assert!(!printed.contains("super-secret"));
    }
}
