//! Token-gated enrichment refresh for a single participant.
//!
//! [`Enricher::refresh`] runs at most one round of catalog fetches and
//! merges whatever succeeded through the session writer. It never touches
//! location or membership, and a participant that has no capability costs
//! one channel round trip and no network calls.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use covey_enrichment::{EnrichmentError, MusicCatalog, fetch_round};
use covey_types::ParticipantId;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::RefreshError;
use crate::handle::SessionHandle;
use crate::session::MergeOutcome;

/// Runs refresh rounds against a music catalog.
#[derive(Debug)]
pub struct Enricher<C> {
    session: SessionHandle,
    catalog: C,
    fetch_timeout: Duration,
    in_flight: Mutex<BTreeSet<ParticipantId>>,
}

/// Marks a participant as having a round outstanding until dropped.
struct InFlight<'a> {
    set: &'a Mutex<BTreeSet<ParticipantId>>,
    id: ParticipantId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl<C: MusicCatalog> Enricher<C> {
    /// Create an enricher whose fetches are each bounded by `fetch_timeout`.
    pub fn new(session: SessionHandle, catalog: C, fetch_timeout: Duration) -> Self {
        Self {
            session,
            catalog,
            fetch_timeout,
            in_flight: Mutex::new(BTreeSet::new()),
        }
    }

    /// The session this enricher merges into.
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The catalog being queried.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Refresh one participant's enrichment.
    ///
    /// Successful fetches are merged even when others in the same round
    /// fail. When the upstream rejects the token the capability is revoked
    /// in the same merge. If another round for this participant is still
    /// outstanding, returns `Ok` without fetching.
    ///
    /// # Errors
    ///
    /// [`RefreshError::Session`] if the participant is unknown or the
    /// session is closed, and [`RefreshError::Enrichment`] carrying the
    /// most severe fetch failure of the round.
    pub async fn refresh(&self, id: ParticipantId) -> Result<(), RefreshError> {
        let Some(token) = self.session.capability(id).await? else {
            trace!(participant = %id, "no enrichment capability, skipping refresh");
            return Ok(());
        };
        let Some(_claim) = self.claim(id) else {
            debug!(participant = %id, "refresh already in flight");
            return Ok(());
        };

        let round = fetch_round(&self.catalog, &token, self.fetch_timeout).await;
        for (fetch, err) in round.failures() {
            match err {
                EnrichmentError::Unavailable(_) => {
                    info!(participant = %id, fetch, kind = err.kind(), error = %err, "enrichment fetch failed");
                }
                EnrichmentError::Malformed(_) | EnrichmentError::Unauthorized(_) => {
                    warn!(participant = %id, fetch, kind = err.kind(), error = %err, "enrichment fetch failed");
                }
            }
        }

        let error = round.error();
        let revoke = round.is_unauthorized();
        let outcome = self
            .session
            .merge_enrichment(id, round.into_patch(), revoke)
            .await?;
        debug!(
            participant = %id,
            catalog = self.catalog.name(),
            outcome = ?outcome,
            "refresh round merged"
        );
        if outcome == MergeOutcome::Discarded {
            return Ok(());
        }

        error.map_or(Ok(()), |err| Err(RefreshError::Enrichment(err)))
    }

    fn claim(&self, id: ParticipantId) -> Option<InFlight<'_>> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then_some(InFlight {
            set: &self.in_flight,
            id,
        })
    }
}

impl<C: MusicCatalog + 'static> Enricher<C> {
    /// Run one refresh in the background, logging its failure.
    pub fn spawn_refresh(self: &Arc<Self>, id: ParticipantId) -> JoinHandle<()> {
        let enricher = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = enricher.refresh(id).await {
                debug!(participant = %id, error = %err, "background refresh failed");
            }
        })
    }
}
