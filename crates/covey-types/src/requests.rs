//! Request payloads consumed from the join and movement layers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Facing;
use crate::ids::ParticipantId;
use crate::structs::Location;

/// Request to admit a new participant into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NewParticipantRequest {
    /// Name shown next to the avatar. Not required to be unique.
    pub display_name: String,
    /// Optional music-service access token. Its absence disables enrichment
    /// for the participant's whole lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub enrichment_token: Option<String>,
}

/// A movement intent for a single participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MoveRequest {
    /// The participant that moved.
    pub participant_id: ParticipantId,
    /// New horizontal coordinate.
    pub x: f64,
    /// New vertical coordinate.
    pub y: f64,
    /// New facing direction.
    pub facing: Facing,
    /// Whether the participant is still moving.
    pub moving: bool,
}

impl MoveRequest {
    /// The location described by this request.
    pub const fn location(&self) -> Location {
        Location::new(self.x, self.y, self.facing, self.moving)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_request_token_is_optional() {
        let parsed: Result<NewParticipantRequest, _> =
            serde_json::from_str(r#"{"displayName":"ada"}"#);
        let request = parsed.ok();
        assert_eq!(
            request,
            Some(NewParticipantRequest {
                display_name: String::from("ada"),
                enrichment_token: None,
            })
        );
    }

    #[test]
    fn move_request_parses_wire_shape() {
        let id = ParticipantId::new();
        let body = serde_json::json!({
            "participantId": id,
            "x": 3.5,
            "y": -2.0,
            "facing": "right",
            "moving": true,
        });
        let parsed: Result<MoveRequest, _> = serde_json::from_value(body);
        let request = parsed.ok();
        assert!(request.is_some());
        if let Some(r) = request {
            assert_eq!(r.participant_id, id);
            let loc = r.location();
            assert!((loc.x - 3.5).abs() < f64::EPSILON);
            assert!((loc.y + 2.0).abs() < f64::EPSILON);
            assert_eq!(loc.facing, Facing::Right);
            assert!(loc.moving);
        }
    }
}
