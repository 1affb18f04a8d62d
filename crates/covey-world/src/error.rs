//! Error types for the `covey-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use covey_types::{AreaId, ParticipantId};

/// Errors that can occur while building or querying the area registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// An area was registered with a malformed bounding box.
    #[error("invalid geometry for area {area}: {reason}")]
    InvalidGeometry {
        /// The offending area.
        area: AreaId,
        /// What is wrong with the box.
        reason: String,
    },

    /// Two areas were registered under the same id.
    #[error("duplicate area id: {0}")]
    DuplicateArea(AreaId),

    /// An area id was referenced that is not part of the layout.
    #[error("area not found: {0}")]
    AreaNotFound(AreaId),

    /// A participant was expected in an area's member set but was absent.
    #[error("participant {participant} is not a member of area {area}")]
    NotAMember {
        /// The participant.
        participant: ParticipantId,
        /// The area whose member set disagrees.
        area: AreaId,
    },
}
