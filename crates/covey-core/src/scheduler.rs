//! Periodic enrichment sweeps.
//!
//! The scheduler wakes on a fixed interval, asks the session which
//! participants still hold a capability, and refreshes them with bounded
//! concurrency. Participants whose token was rejected drop out of the
//! enrolled set on their own, so no separate stop list is kept. The loop
//! ends once the session is closed.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use covey_enrichment::MusicCatalog;

use crate::error::{RefreshError, SessionError};
use crate::refresh::Enricher;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Totals for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Participants refreshed.
    pub attempted: usize,
    /// Rounds that reported a fetch failure.
    pub failed: usize,
}

/// Drives [`Enricher::refresh`] for every enrolled participant.
#[derive(Debug)]
pub struct RefreshScheduler<C> {
    enricher: Arc<Enricher<C>>,
    interval: Duration,
    max_concurrent: usize,
}

impl<C: MusicCatalog + 'static> RefreshScheduler<C> {
    /// Create a scheduler. `max_concurrent` is clamped to at least one.
    pub fn new(enricher: Arc<Enricher<C>>, interval: Duration, max_concurrent: usize) -> Self {
        Self {
            enricher,
            interval: interval.max(MIN_INTERVAL),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Refresh every enrolled participant once.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has shut down.
    pub async fn sweep(&self) -> Result<SweepReport, SessionError> {
        let enrolled = self.enricher.session().enrolled().await?;
        let attempted = enrolled.len();

        let results: Vec<Result<(), RefreshError>> = futures::stream::iter(enrolled)
            .map(|id| {
                let enricher = Arc::clone(&self.enricher);
                async move { enricher.refresh(id).await }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut failed: usize = 0;
        for result in results {
            match result {
                Ok(()) => {}
                Err(RefreshError::Session(SessionError::Closed)) => return Err(SessionError::Closed),
                Err(_) => failed = failed.saturating_add(1),
            }
        }
        Ok(SweepReport { attempted, failed })
    }

    /// Sweep on every tick until the session closes.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            max_concurrent = self.max_concurrent,
            "refresh scheduler started"
        );

        loop {
            ticker.tick().await;
            if self.enricher.session().is_closed() {
                break;
            }
            match self.sweep().await {
                Ok(report) if report.attempted > 0 => {
                    debug!(attempted = report.attempted, failed = report.failed, "refresh sweep complete");
                }
                Ok(_) => {}
                Err(SessionError::Closed) => break,
                Err(err) => warn!(error = %err, "refresh sweep failed"),
            }
        }
        info!("session closed, refresh scheduler stopping");
    }

    /// Run the scheduler on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
