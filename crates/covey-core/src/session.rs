//! Authoritative session state.
//!
//! [`SessionState`] owns every participant record, the enrichment
//! capabilities held alongside them, and the area registry. It is plain
//! synchronous data: serialization of mutations is provided by the writer
//! task in [`crate::handle`], which is the only owner of a live instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use covey_enrichment::{AccessToken, EnrichmentPatch};
use covey_types::{AreaId, AreaView, Location, ParticipantId, ParticipantView, SessionSnapshot};
use covey_world::{AreaLayout, AreaRegistry, same_location};
use tracing::{debug, error, info, warn};

use crate::error::SessionError;
use crate::participant::Participant;

/// Result of committing a movement update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The area the participant is now in.
    pub area: Option<AreaId>,
    /// Whether location or membership differ from before the move.
    pub changed: bool,
}

/// Result of merging an enrichment round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The participant's enrichment changed.
    Applied,
    /// The participant is present but nothing visible changed.
    Unchanged,
    /// The participant left before the round finished; nothing was written.
    Discarded,
}

/// The mutable state of one session.
#[derive(Debug, Clone)]
pub struct SessionState {
    participants: BTreeMap<ParticipantId, Participant>,
    capabilities: BTreeMap<ParticipantId, AccessToken>,
    registry: AreaRegistry,
    next_seq: u64,
    generation: u64,
}

impl SessionState {
    /// An empty session over a fixed area layout.
    pub fn new(layout: Arc<AreaLayout>) -> Self {
        Self {
            participants: BTreeMap::new(),
            capabilities: BTreeMap::new(),
            registry: AreaRegistry::new(layout),
            next_seq: 0,
            generation: 0,
        }
    }

    /// The immutable area layout.
    pub const fn layout(&self) -> &Arc<AreaLayout> {
        self.registry.layout()
    }

    /// Number of participants in the session.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the session has no participants.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Admit a new participant at the origin.
    pub fn add_participant(
        &mut self,
        display_name: String,
        token: Option<AccessToken>,
    ) -> ParticipantView {
        let id = ParticipantId::new();
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);

        let participant = Participant::new(id, display_name, seq);
        let view = participant.view();
        info!(
            participant = %id,
            display_name = %participant.display_name,
            enrichment = token.is_some(),
            "participant joined"
        );
        self.participants.insert(id, participant);
        if let Some(token) = token {
            self.capabilities.insert(id, token);
        }
        view
    }

    /// Remove a participant and its capability. Returns whether it existed.
    pub fn remove_participant(&mut self, id: ParticipantId) -> bool {
        let Some(participant) = self.participants.remove(&id) else {
            return false;
        };
        self.capabilities.remove(&id);
        if let Err(err) = self
            .registry
            .remove(id, participant.conversation_area_id.as_ref())
        {
            warn!(participant = %id, error = %err, "membership out of sync on leave, purging");
            self.registry.purge(id);
        }
        info!(participant = %id, "participant left");
        true
    }

    /// Update a participant's location and recompute its area membership.
    ///
    /// # Errors
    ///
    /// See [`SessionState::commit_move`].
    pub fn move_participant(
        &mut self,
        id: ParticipantId,
        location: Location,
    ) -> Result<MoveOutcome, SessionError> {
        let area = self.registry.layout().locate(&location).cloned();
        self.commit_move(id, location, area)
    }

    /// Commit a movement whose target area was already computed from the
    /// shared layout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidLocation`] for non-finite coordinates,
    /// [`SessionError::NotFound`] for an unknown participant, and
    /// [`SessionError::Evicted`] if the participant's membership record
    /// disagreed with the registry. An evicted participant is removed; every
    /// other participant is left untouched.
    pub fn commit_move(
        &mut self,
        id: ParticipantId,
        location: Location,
        area: Option<AreaId>,
    ) -> Result<MoveOutcome, SessionError> {
        if !location.is_finite() {
            return Err(SessionError::InvalidLocation {
                x: location.x,
                y: location.y,
            });
        }
        let (previous, previous_location) = match self.participants.get(&id) {
            Some(p) => (p.conversation_area_id.clone(), p.location),
            None => return Err(SessionError::NotFound(id)),
        };

        if let Err(err) = self
            .registry
            .transfer(id, previous.as_ref(), area.as_ref())
        {
            error!(participant = %id, error = %err, "inconsistent membership, evicting participant");
            self.evict(id);
            return Err(SessionError::Evicted(id));
        }

        let changed = previous != area || !same_location(&previous_location, &location);
        if let Some(participant) = self.participants.get_mut(&id) {
            participant.location = location;
            participant.conversation_area_id.clone_from(&area);
        }
        if previous != area {
            debug!(participant = %id, from = ?previous, to = ?area, "membership changed");
        }
        Ok(MoveOutcome { area, changed })
    }

    /// The participant's enrichment capability, if it still has one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown participant.
    pub fn capability(&self, id: ParticipantId) -> Result<Option<AccessToken>, SessionError> {
        if !self.participants.contains_key(&id) {
            return Err(SessionError::NotFound(id));
        }
        Ok(self.capabilities.get(&id).cloned())
    }

    /// Participants that currently hold an enrichment capability, in join
    /// order.
    pub fn enrolled(&self) -> Vec<ParticipantId> {
        let mut enrolled: Vec<&Participant> = self
            .participants
            .values()
            .filter(|p| self.capabilities.contains_key(&p.id))
            .collect();
        enrolled.sort_by_key(|p| p.joined_seq);
        enrolled.into_iter().map(|p| p.id).collect()
    }

    /// Merge one refresh round into a participant's enrichment.
    ///
    /// With `revoke` set, the capability is dropped in the same step so no
    /// further rounds are scheduled. A participant that has already left
    /// is never recreated.
    pub fn merge_enrichment(
        &mut self,
        id: ParticipantId,
        patch: EnrichmentPatch,
        revoke: bool,
    ) -> MergeOutcome {
        let Some(participant) = self.participants.get_mut(&id) else {
            debug!(participant = %id, "participant left during refresh, merge discarded");
            return MergeOutcome::Discarded;
        };

        let outcome = if patch.is_noop() {
            MergeOutcome::Unchanged
        } else {
            // An all-empty bundle is stored as absent.
            let merged = Some(patch.apply(participant.enrichment.clone()))
                .filter(|enrichment| !enrichment.is_empty());
            if participant.enrichment == merged {
                MergeOutcome::Unchanged
            } else {
                participant.enrichment = merged;
                MergeOutcome::Applied
            }
        };

        if revoke && self.capabilities.remove(&id).is_some() {
            warn!(participant = %id, "music service rejected token, enrichment disabled");
        }
        outcome
    }

    /// The current state as a snapshot, without advancing the generation.
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut participants: Vec<&Participant> = self.participants.values().collect();
        participants.sort_by_key(|p| p.joined_seq);

        let areas = self
            .registry
            .iter()
            .map(|(area, members)| {
                let mut members: Vec<ParticipantId> = members.iter().copied().collect();
                members.sort_by_key(|id| self.participants.get(id).map_or(u64::MAX, |p| p.joined_seq));
                AreaView {
                    id: area.id().clone(),
                    bounding_box: *area.bounding_box(),
                    members,
                }
            })
            .collect();

        SessionSnapshot {
            generation: self.generation,
            taken_at: Utc::now(),
            participants: participants.into_iter().map(Participant::view).collect(),
            areas,
        }
    }

    /// Advance the generation and take a snapshot of the result.
    pub fn publish(&mut self) -> SessionSnapshot {
        self.generation = self.generation.saturating_add(1);
        self.snapshot()
    }

    fn evict(&mut self, id: ParticipantId) {
        self.participants.remove(&id);
        self.capabilities.remove(&id);
        self.registry.purge(id);
    }
}
