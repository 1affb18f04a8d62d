//! The session writer task and the cloneable handle used to talk to it.
//!
//! Every mutation is sent as a [`Command`] over a bounded `mpsc` channel to a
//! single writer task, which applies it to the [`SessionState`] it owns and
//! answers through a `oneshot`. After each mutation that changes visible
//! state the writer publishes a new [`SessionSnapshot`] on a `watch`
//! channel, so readers never wait for in-flight writes and always see one
//! committed point in time.
//!
//! ```text
//!  callers ──Command──► mpsc ──► writer task ──► SessionState
//!     ▲                              │
//!     └──────── oneshot reply ◄──────┤
//!                                    ▼
//!  readers ◄──── watch<Arc<SessionSnapshot>>
//! ```
//!
//! Membership lookup is pure geometry over the immutable [`AreaLayout`], so
//! [`SessionHandle::move_participant`] computes it on the caller's task and
//! only the commit goes through the writer.

use std::sync::Arc;

use covey_enrichment::{AccessToken, EnrichmentPatch};
use covey_types::{AreaId, Location, MoveRequest, ParticipantId, ParticipantView, SessionSnapshot};
use covey_world::AreaLayout;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::{MergeOutcome, SessionState};

type Reply<T> = oneshot::Sender<T>;

/// A mutation or query executed by the writer task.
enum Command {
    Join {
        display_name: String,
        token: Option<AccessToken>,
        reply: Reply<ParticipantView>,
    },
    Leave {
        id: ParticipantId,
        reply: Reply<bool>,
    },
    Move {
        id: ParticipantId,
        location: Location,
        area: Option<AreaId>,
        reply: Reply<Result<Option<AreaId>, SessionError>>,
    },
    Capability {
        id: ParticipantId,
        reply: Reply<Result<Option<AccessToken>, SessionError>>,
    },
    Enrolled {
        reply: Reply<Vec<ParticipantId>>,
    },
    Merge {
        id: ParticipantId,
        patch: Box<EnrichmentPatch>,
        revoke: bool,
        reply: Reply<MergeOutcome>,
    },
    Close,
}

/// Cloneable access to a running session.
///
/// Dropping every handle, or calling [`SessionHandle::close`], stops the
/// writer task. After that every mutating call returns
/// [`SessionError::Closed`] while [`SessionHandle::snapshot`] keeps
/// returning the last published state.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<SessionSnapshot>>,
    layout: Arc<AreaLayout>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("areas", &self.layout.len())
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

/// Start the writer task for `state`.
///
/// `capacity` bounds the command queue; callers wait for space when the
/// writer falls behind.
pub fn spawn_session(state: SessionState, capacity: usize) -> (SessionHandle, JoinHandle<()>) {
    let (commands, receiver) = mpsc::channel(capacity.max(1));
    let (publisher, snapshots) = watch::channel(Arc::new(state.snapshot()));
    let layout = Arc::clone(state.layout());

    let task = tokio::spawn(run_writer(state, receiver, publisher));
    let handle = SessionHandle {
        commands,
        snapshots,
        layout,
    };
    (handle, task)
}

async fn run_writer(
    mut state: SessionState,
    mut commands: mpsc::Receiver<Command>,
    publisher: watch::Sender<Arc<SessionSnapshot>>,
) {
    info!(areas = state.layout().len(), "session writer started");
    while let Some(command) = commands.recv().await {
        if matches!(command, Command::Close) {
            break;
        }
        if execute(&mut state, command) {
            let snapshot = state.publish();
            debug!(generation = snapshot.generation, "snapshot published");
            publisher.send_replace(Arc::new(snapshot));
        }
    }
    info!(participants = state.len(), "session writer stopped");
}

/// Apply one command and answer it. Returns whether visible state changed.
fn execute(state: &mut SessionState, command: Command) -> bool {
    match command {
        Command::Join {
            display_name,
            token,
            reply,
        } => {
            let view = state.add_participant(display_name, token);
            let _ = reply.send(view);
            true
        }
        Command::Leave { id, reply } => {
            let removed = state.remove_participant(id);
            let _ = reply.send(removed);
            removed
        }
        Command::Move {
            id,
            location,
            area,
            reply,
        } => {
            let result = state.commit_move(id, location, area);
            let changed = match &result {
                Ok(outcome) => outcome.changed,
                Err(SessionError::Evicted(_)) => true,
                Err(_) => false,
            };
            let _ = reply.send(result.map(|outcome| outcome.area));
            changed
        }
        Command::Capability { id, reply } => {
            let _ = reply.send(state.capability(id));
            false
        }
        Command::Enrolled { reply } => {
            let _ = reply.send(state.enrolled());
            false
        }
        Command::Merge {
            id,
            patch,
            revoke,
            reply,
        } => {
            let outcome = state.merge_enrichment(id, *patch, revoke);
            let _ = reply.send(outcome);
            outcome == MergeOutcome::Applied
        }
        Command::Close => false,
    }
}

impl SessionHandle {
    /// Admit a participant. `token` is the optional enrichment capability.
    pub async fn add_participant(
        &self,
        display_name: impl Into<String>,
        token: Option<AccessToken>,
    ) -> Result<ParticipantView, SessionError> {
        let display_name = display_name.into();
        self.request(|reply| Command::Join {
            display_name,
            token,
            reply,
        })
        .await
    }

    /// Remove a participant. Removing an absent participant is not an
    /// error; the result tells whether anything was removed.
    pub async fn remove_participant(&self, id: ParticipantId) -> Result<bool, SessionError> {
        self.request(|reply| Command::Leave { id, reply }).await
    }

    /// Move a participant and return the area it is now in.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidLocation`] for non-finite coordinates,
    /// [`SessionError::NotFound`] for unknown participants, and
    /// [`SessionError::Evicted`] if its membership record was corrupted.
    pub async fn move_participant(
        &self,
        id: ParticipantId,
        location: Location,
    ) -> Result<Option<AreaId>, SessionError> {
        if !location.is_finite() {
            return Err(SessionError::InvalidLocation {
                x: location.x,
                y: location.y,
            });
        }
        let area = self.layout.locate(&location).cloned();
        self.request(|reply| Command::Move {
            id,
            location,
            area,
            reply,
        })
        .await?
    }

    /// Apply a movement request from the rendering layer.
    pub async fn apply_move(&self, request: MoveRequest) -> Result<Option<AreaId>, SessionError> {
        self.move_participant(request.participant_id, request.location())
            .await
    }

    /// The latest committed snapshot. Never waits on the writer.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.snapshots.clone()
    }

    /// The participant's enrichment capability, if it still holds one.
    pub async fn capability(&self, id: ParticipantId) -> Result<Option<AccessToken>, SessionError> {
        self.request(|reply| Command::Capability { id, reply })
            .await?
    }

    /// Participants currently holding an enrichment capability.
    pub async fn enrolled(&self) -> Result<Vec<ParticipantId>, SessionError> {
        self.request(|reply| Command::Enrolled { reply }).await
    }

    /// Merge a refresh round through the writer.
    pub async fn merge_enrichment(
        &self,
        id: ParticipantId,
        patch: EnrichmentPatch,
        revoke: bool,
    ) -> Result<MergeOutcome, SessionError> {
        self.request(|reply| Command::Merge {
            id,
            patch: Box::new(patch),
            revoke,
            reply,
        })
        .await
    }

    /// The immutable area layout.
    pub const fn layout(&self) -> &Arc<AreaLayout> {
        &self.layout
    }

    /// Ask the writer to stop after the commands already queued.
    pub async fn close(&self) {
        if self.commands.send(Command::Close).await.is_err() {
            debug!("session already closed");
        }
    }

    /// Whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_closed| SessionError::Closed)?;
        response.await.map_err(|_dropped| SessionError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use covey_types::{AreaConfig, Facing};

    use super::*;

    fn lobby_session() -> (SessionHandle, JoinHandle<()>) {
        let layout = AreaLayout::new(&[AreaConfig {
            id: AreaId::new("lobby"),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }])
        .unwrap_or_default();
        spawn_session(SessionState::new(Arc::new(layout)), 8)
    }

    #[tokio::test]
    async fn initial_snapshot_lists_areas() {
        let (session, _task) = lobby_session();
        let snap = session.snapshot();
        assert_eq!(snap.generation, 0);
        assert!(snap.participants.is_empty());
        assert_eq!(snap.areas.len(), 1);
    }

    #[tokio::test]
    async fn join_publishes_new_generation() {
        let (session, _task) = lobby_session();
        let view = session.add_participant("ada", None).await;
        assert!(view.is_ok());
        let snap = session.snapshot();
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.participants.len(), 1);
    }

    #[tokio::test]
    async fn unchanged_move_keeps_generation() {
        let (session, _task) = lobby_session();
        let Ok(view) = session.add_participant("ada", None).await else {
            return;
        };
        let here = Location::new(1.0, 1.0, Facing::Back, true);
        let _ = session.move_participant(view.id, here).await;
        let before = session.snapshot().generation;
        let _ = session.move_participant(view.id, here).await;
        assert_eq!(session.snapshot().generation, before);
    }

    #[tokio::test]
    async fn non_finite_move_is_rejected_before_the_writer() {
        let (session, _task) = lobby_session();
        let result = session
            .move_participant(ParticipantId::new(), Location::new(f64::NAN, 0.0, Facing::Front, false))
            .await;
        assert!(matches!(result, Err(SessionError::InvalidLocation { .. })));
    }

    #[tokio::test]
    async fn close_stops_writer_and_keeps_last_snapshot() {
        let (session, task) = lobby_session();
        let _ = session.add_participant("ada", None).await;
        session.close().await;
        assert!(task.await.is_ok());

        assert!(session.is_closed());
        assert_eq!(
            session.add_participant("late", None).await,
            Err(SessionError::Closed)
        );
        assert_eq!(session.snapshot().participants.len(), 1);
    }
}
