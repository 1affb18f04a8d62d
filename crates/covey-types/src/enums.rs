//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The direction a participant's avatar is facing.
///
/// Serialized in lowercase (`"front"`, `"back"`, `"left"`, `"right"`) to
/// match the movement payloads sent by the rendering layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Facing {
    /// Facing the viewer. The default for a freshly joined participant.
    #[default]
    Front,
    /// Facing away from the viewer.
    Back,
    /// Facing left.
    Left,
    /// Facing right.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_wire_format_is_lowercase() {
        let json = serde_json::to_string(&Facing::Left).ok();
        assert_eq!(json.as_deref(), Some("\"left\""));
        let parsed: Result<Facing, _> = serde_json::from_str("\"back\"");
        assert_eq!(parsed.ok(), Some(Facing::Back));
    }

    #[test]
    fn default_facing_is_front() {
        assert_eq!(Facing::default(), Facing::Front);
    }
}
