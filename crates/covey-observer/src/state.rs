//! Shared application state for the observer API.
//!
//! [`AppState`] is a thin bundle of handles. All reads go to the session's
//! latest published snapshot, so no request ever waits on the writer
//! except the ones that mutate.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use covey_core::{Enricher, SessionHandle};
use covey_enrichment::SpotifyClient;
use covey_types::{ParticipantId, SessionSnapshot};

type ConnectionSet = Arc<Mutex<BTreeSet<ParticipantId>>>;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the running session.
    pub session: SessionHandle,
    /// Enrichment runner, absent when enrichment is disabled.
    pub enricher: Option<Arc<Enricher<SpotifyClient>>>,
    /// Town name shown on the status page.
    pub town_name: String,
    connections: ConnectionSet,
}

impl AppState {
    /// Create application state over a running session.
    pub fn new(
        session: SessionHandle,
        enricher: Option<Arc<Enricher<SpotifyClient>>>,
        town_name: impl Into<String>,
    ) -> Self {
        Self {
            session,
            enricher,
            town_name: town_name.into(),
            connections: Arc::default(),
        }
    }

    /// The latest committed snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.session.snapshot()
    }

    /// Reserve the participant connection slot for `id`.
    ///
    /// Returns `None` while another connection holds it. The slot is
    /// released when the returned claim is dropped.
    pub fn claim_connection(&self, id: ParticipantId) -> Option<ConnectionClaim> {
        let inserted = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then(|| ConnectionClaim {
            connections: Arc::clone(&self.connections),
            id,
        })
    }

    /// Whether `id` currently has a participant connection.
    pub fn is_connected(&self, id: ParticipantId) -> bool {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// A participant's exclusive connection slot.
#[derive(Debug)]
pub struct ConnectionClaim {
    connections: ConnectionSet,
    id: ParticipantId,
}

impl Drop for ConnectionClaim {
    fn drop(&mut self) {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use covey_core::{SessionState, spawn_session};
    use covey_world::AreaLayout;

    use super::*;

    #[tokio::test]
    async fn connection_slot_is_exclusive_until_released() {
        let (session, _writer) =
            spawn_session(SessionState::new(Arc::new(AreaLayout::default())), 4);
        let state = AppState::new(session, None, "Test Town");
        let id = ParticipantId::new();

        let claim = state.claim_connection(id);
        assert!(claim.is_some());
        assert!(state.claim_connection(id).is_none());
        assert!(state.is_connected(id));
        assert!(state.claim_connection(ParticipantId::new()).is_some());

        drop(claim);
        assert!(!state.is_connected(id));
        assert!(state.claim_connection(id).is_some());
    }
}
