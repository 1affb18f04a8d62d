//! Core entity and read-model structs.
//!
//! Everything in this module is part of the wire contract consumed by the
//! broadcast layer, so field names are serialized in `camelCase` and every
//! optional field is omitted when absent rather than sent as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Facing;
use crate::ids::{AreaId, ParticipantId};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A participant's position and pose in the shared 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Horizontal world coordinate.
    pub x: f64,
    /// Vertical world coordinate.
    pub y: f64,
    /// Which way the avatar is facing.
    pub facing: Facing,
    /// Whether the avatar is mid-movement (drives walk animation).
    pub moving: bool,
}

impl Location {
    /// Construct a location from its parts.
    pub const fn new(x: f64, y: f64, facing: Facing, moving: bool) -> Self {
        Self {
            x,
            y,
            facing,
            moving,
        }
    }

    /// Whether both coordinates are finite numbers.
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Conversation areas
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle described by its center and full extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BoundingBox {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Full width of the box.
    pub width: f64,
    /// Full height of the box.
    pub height: f64,
}

/// A conversation area as supplied in the session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AreaConfig {
    /// Author-chosen area identifier.
    pub id: AreaId,
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Full width of the area.
    pub width: f64,
    /// Full height of the area.
    pub height: f64,
}

impl AreaConfig {
    /// The bounding box described by this configuration entry.
    pub const fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Read-only view of a conversation area and its current members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AreaView {
    /// Area identifier.
    pub id: AreaId,
    /// The area's bounds.
    pub bounding_box: BoundingBox,
    /// Participants currently inside the area, in join order.
    pub members: Vec<ParticipantId>,
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Best-effort data fetched from the music service for a participant.
///
/// Each field is fetched and merged independently. A missing field means
/// either "nothing to show" or "never fetched successfully"; it never
/// invalidates the other fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Enrichment {
    /// Title of the currently playing track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub track_title: Option<String>,
    /// Link to the currently playing track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub track_url: Option<String>,
    /// Name of the participant's primary playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub playlist_name: Option<String>,
    /// Link to the primary playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub playlist_url: Option<String>,
    /// The participant's handle on the music service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub profile_handle: Option<String>,
    /// Link to the participant's profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub profile_url: Option<String>,
}

impl Enrichment {
    /// Whether no field is populated.
    pub const fn is_empty(&self) -> bool {
        self.track_title.is_none()
            && self.track_url.is_none()
            && self.playlist_name.is_none()
            && self.playlist_url.is_none()
            && self.profile_handle.is_none()
            && self.profile_url.is_none()
    }
}

// ---------------------------------------------------------------------------
// Read model
// ---------------------------------------------------------------------------

/// Read-only view of a participant as published to the broadcast layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ParticipantView {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Name chosen at join time.
    pub display_name: String,
    /// Current location.
    pub location: Location,
    /// Area currently containing the participant, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub conversation_area_id: Option<AreaId>,
    /// Music-service enrichment, if any has been merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub enrichment: Option<Enrichment>,
}

/// A consistent, point-in-time view of the whole session.
///
/// Produced by the session writer after every committed mutation. A reader
/// holding a snapshot never observes a participant whose location and
/// membership disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SessionSnapshot {
    /// Monotonic counter, incremented on every published change.
    pub generation: u64,
    /// Wall-clock time at which the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Participants in join order.
    pub participants: Vec<ParticipantView>,
    /// Conversation areas in registration order.
    pub areas: Vec<AreaView>,
}

impl SessionSnapshot {
    /// An empty snapshot at generation zero.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            taken_at: Utc::now(),
            participants: Vec::new(),
            areas: Vec::new(),
        }
    }

    /// Look up a participant by id.
    pub fn participant(&self, id: ParticipantId) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Look up an area by id.
    pub fn area(&self, id: &AreaId) -> Option<&AreaView> {
        self.areas.iter().find(|a| &a.id == id)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
