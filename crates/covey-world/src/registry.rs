//! Conversation area membership tracking.
//!
//! [`AreaRegistry`] pairs the immutable [`AreaLayout`] with the derived
//! member set of every area. Member sets are never authoritative: each one
//! is kept equal to the live containment result for the participants'
//! current locations by re-running [`AreaRegistry::update_membership`] on
//! every movement update, which is also the only way an exit is noticed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use covey_types::{AreaId, Location, ParticipantId};

use crate::area::{AreaLayout, ConversationArea};
use crate::error::WorldError;

/// Membership state for every conversation area in a session.
#[derive(Debug, Clone)]
pub struct AreaRegistry {
    layout: Arc<AreaLayout>,
    members: BTreeMap<AreaId, BTreeSet<ParticipantId>>,
}

impl AreaRegistry {
    /// Create a registry with an empty member set for every area.
    pub fn new(layout: Arc<AreaLayout>) -> Self {
        let members = layout
            .iter()
            .map(|area| (area.id().clone(), BTreeSet::new()))
            .collect();
        Self { layout, members }
    }

    /// The shared, immutable layout.
    pub const fn layout(&self) -> &Arc<AreaLayout> {
        &self.layout
    }

    /// Recompute which area holds `participant` at `location`.
    ///
    /// Evaluates the areas in registration order and picks the first one
    /// whose box contains the location. The participant is moved out of
    /// `previous` and into the result (or into no area at all).
    ///
    /// # Errors
    ///
    /// Returns an error only when `previous` disagrees with the member sets,
    /// which means the caller's record of the participant is corrupted.
    pub fn update_membership(
        &mut self,
        participant: ParticipantId,
        previous: Option<&AreaId>,
        location: &Location,
    ) -> Result<Option<AreaId>, WorldError> {
        let next = self.layout.locate(location).cloned();
        self.transfer(participant, previous, next.as_ref())?;
        Ok(next)
    }

    /// Move `participant` from `previous` to `next`.
    ///
    /// Used directly when the target area was already computed from the
    /// shared layout on another task.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AreaNotFound`] if either area is unknown and
    /// [`WorldError::NotAMember`] if the participant is missing from
    /// `previous`.
    pub fn transfer(
        &mut self,
        participant: ParticipantId,
        previous: Option<&AreaId>,
        next: Option<&AreaId>,
    ) -> Result<(), WorldError> {
        if previous == next {
            if let Some(area) = previous {
                if !self.member_set(area)?.contains(&participant) {
                    return Err(WorldError::NotAMember {
                        participant,
                        area: area.clone(),
                    });
                }
            }
            return Ok(());
        }
        if let Some(area) = next {
            if !self.layout.contains_area(area) {
                return Err(WorldError::AreaNotFound(area.clone()));
            }
        }
        self.remove(participant, previous)?;
        if let Some(area) = next {
            self.member_set_mut(area)?.insert(participant);
            tracing::debug!(participant = %participant, area = %area, "entered conversation area");
        }
        Ok(())
    }

    /// Remove `participant` from `area`'s member set, if it is in an area.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AreaNotFound`] if the area is unknown and
    /// [`WorldError::NotAMember`] if the participant was not a member.
    pub fn remove(
        &mut self,
        participant: ParticipantId,
        area: Option<&AreaId>,
    ) -> Result<(), WorldError> {
        let Some(area) = area else {
            return Ok(());
        };
        if !self.member_set_mut(area)?.remove(&participant) {
            return Err(WorldError::NotAMember {
                participant,
                area: area.clone(),
            });
        }
        tracing::debug!(participant = %participant, area = %area, "left conversation area");
        Ok(())
    }

    /// Drop `participant` from every member set.
    ///
    /// Used when the participant's own record can no longer be trusted.
    pub fn purge(&mut self, participant: ParticipantId) {
        for members in self.members.values_mut() {
            members.remove(&participant);
        }
    }

    /// The current members of an area.
    pub fn members(&self, area: &AreaId) -> Option<&BTreeSet<ParticipantId>> {
        self.members.get(area)
    }

    /// Iterate areas in registration order with their member sets.
    pub fn iter(&self) -> impl Iterator<Item = (&ConversationArea, &BTreeSet<ParticipantId>)> {
        self.layout
            .iter()
            .filter_map(|area| self.members.get(area.id()).map(|members| (area, members)))
    }

    fn member_set(&self, area: &AreaId) -> Result<&BTreeSet<ParticipantId>, WorldError> {
        self.members
            .get(area)
            .ok_or_else(|| WorldError::AreaNotFound(area.clone()))
    }

    fn member_set_mut(&mut self, area: &AreaId) -> Result<&mut BTreeSet<ParticipantId>, WorldError> {
        self.members
            .get_mut(area)
            .ok_or_else(|| WorldError::AreaNotFound(area.clone()))
    }
}

#[cfg(test)]
mod tests {
    use covey_types::{AreaConfig, Facing};

    use super::*;

    fn registry(configs: &[(&str, f64, f64, f64, f64)]) -> AreaRegistry {
        let configs: Vec<AreaConfig> = configs
            .iter()
            .map(|&(id, x, y, width, height)| AreaConfig {
                id: AreaId::from(id),
                x,
                y,
                width,
                height,
            })
            .collect();
        AreaRegistry::new(Arc::new(AreaLayout::new(&configs).unwrap_or_default()))
    }

    const fn at(x: f64, y: f64) -> Location {
        Location::new(x, y, Facing::Front, true)
    }

    fn is_member(registry: &AreaRegistry, area: &str, participant: ParticipantId) -> bool {
        registry
            .members(&AreaId::from(area))
            .is_some_and(|m| m.contains(&participant))
    }

    #[test]
    fn lobby_enter_and_exit() {
        let mut reg = registry(&[("lobby", 0.0, 0.0, 10.0, 10.0)]);
        let p = ParticipantId::new();

        let area = reg.update_membership(p, None, &at(3.0, 3.0));
        assert_eq!(area, Ok(Some(AreaId::from("lobby"))));
        assert!(is_member(&reg, "lobby", p));

        let lobby = AreaId::from("lobby");
        let area = reg.update_membership(p, Some(&lobby), &at(10.0, 10.0));
        assert_eq!(area, Ok(None));
        assert!(!is_member(&reg, "lobby", p));
    }

    #[test]
    fn moving_between_disjoint_areas_keeps_sets_disjoint() {
        let mut reg = registry(&[
            ("a1", 0.0, 0.0, 10.0, 10.0),
            ("a2", 100.0, 0.0, 10.0, 10.0),
        ]);
        let p = ParticipantId::new();
        let q = ParticipantId::new();

        let first = reg.update_membership(p, None, &at(1.0, 1.0)).ok().flatten();
        let _ = reg.update_membership(q, None, &at(-1.0, -1.0));
        assert_eq!(first, Some(AreaId::from("a1")));

        let second = reg
            .update_membership(p, first.as_ref(), &at(101.0, 1.0))
            .ok()
            .flatten();
        assert_eq!(second, Some(AreaId::from("a2")));
        assert!(!is_member(&reg, "a1", p));
        assert!(is_member(&reg, "a2", p));
        assert!(is_member(&reg, "a1", q));

        let a1 = reg.members(&AreaId::from("a1")).cloned().unwrap_or_default();
        let a2 = reg.members(&AreaId::from("a2")).cloned().unwrap_or_default();
        assert!(a1.is_disjoint(&a2));
    }

    #[test]
    fn overlapping_areas_pick_first_registered() {
        let mut reg = registry(&[("a", 0.0, 0.0, 10.0, 10.0), ("b", 0.0, 0.0, 4.0, 4.0)]);
        let p = ParticipantId::new();
        let area = reg.update_membership(p, None, &at(0.0, 0.0));
        assert_eq!(area, Ok(Some(AreaId::from("a"))));
        assert!(!is_member(&reg, "b", p));
    }

    #[test]
    fn staying_inside_is_a_no_op() {
        let mut reg = registry(&[("lobby", 0.0, 0.0, 10.0, 10.0)]);
        let p = ParticipantId::new();
        let lobby = reg.update_membership(p, None, &at(1.0, 1.0)).ok().flatten();
        let again = reg.update_membership(p, lobby.as_ref(), &at(2.0, 2.0));
        assert_eq!(again, Ok(lobby));
        assert_eq!(reg.members(&AreaId::from("lobby")).map(BTreeSet::len), Some(1));
    }

    #[test]
    fn stale_previous_area_is_reported() {
        let mut reg = registry(&[("lobby", 0.0, 0.0, 10.0, 10.0)]);
        let p = ParticipantId::new();
        let lobby = AreaId::from("lobby");
        let result = reg.update_membership(p, Some(&lobby), &at(50.0, 50.0));
        assert_eq!(
            result,
            Err(WorldError::NotAMember {
                participant: p,
                area: lobby.clone(),
            })
        );
        let unknown = AreaId::from("garden");
        let result = reg.remove(p, Some(&unknown));
        assert_eq!(result, Err(WorldError::AreaNotFound(unknown)));
    }

    #[test]
    fn purge_clears_every_set() {
        let mut reg = registry(&[("lobby", 0.0, 0.0, 10.0, 10.0)]);
        let p = ParticipantId::new();
        let _ = reg.update_membership(p, None, &at(1.0, 1.0));
        reg.purge(p);
        assert!(!is_member(&reg, "lobby", p));
    }

    #[test]
    fn iteration_follows_registration_order() {
        let reg = registry(&[
            ("zeta", 0.0, 0.0, 1.0, 1.0),
            ("alpha", 10.0, 0.0, 1.0, 1.0),
        ]);
        let ids: Vec<&str> = reg.iter().map(|(area, _)| area.id().as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }
}
