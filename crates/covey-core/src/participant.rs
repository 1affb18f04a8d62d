//! The session's private participant record.

use covey_types::{AreaId, Enrichment, Location, ParticipantId, ParticipantView};

/// A participant as stored by the session writer.
///
/// Identity and display name are fixed at join. The enrichment capability
/// is deliberately not part of this record; the session keeps it in a
/// separate map so it can never leak into a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Unique id, assigned at join.
    pub id: ParticipantId,
    /// Display name, immutable after join.
    pub display_name: String,
    /// Last committed location.
    pub location: Location,
    /// Area containing `location`, if any.
    pub conversation_area_id: Option<AreaId>,
    /// Merged enrichment, `None` until the first merge.
    pub enrichment: Option<Enrichment>,
    /// Join sequence number, used for snapshot ordering.
    pub joined_seq: u64,
}

impl Participant {
    /// A freshly joined participant at the origin, facing front, in no area.
    pub fn new(id: ParticipantId, display_name: String, joined_seq: u64) -> Self {
        Self {
            id,
            display_name,
            location: Location::default(),
            conversation_area_id: None,
            enrichment: None,
            joined_seq,
        }
    }

    /// The public, serializable view.
    pub fn view(&self) -> ParticipantView {
        ParticipantView {
            id: self.id,
            display_name: self.display_name.clone(),
            location: self.location,
            conversation_area_id: self.conversation_area_id.clone(),
            enrichment: self.enrichment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use covey_types::Facing;

    use super::*;

    #[test]
    fn new_participant_starts_at_origin() {
        let p = Participant::new(ParticipantId::new(), "ada".to_owned(), 0);
        assert_eq!(p.location.facing, Facing::Front);
        assert!(!p.location.moving);
        assert!(p.conversation_area_id.is_none());
        assert!(p.enrichment.is_none());
    }

    #[test]
    fn view_copies_public_fields() {
        let mut p = Participant::new(ParticipantId::new(), "ada".to_owned(), 3);
        p.conversation_area_id = Some(AreaId::new("lobby"));
        let view = p.view();
        assert_eq!(view.id, p.id);
        assert_eq!(view.display_name, "ada");
        assert_eq!(view.conversation_area_id, Some(AreaId::new("lobby")));
    }
}
