//! Pure geometry: rectangular containment and float-safe comparisons.
//!
//! Containment is strict. A point lying exactly on an edge is outside the
//! box, so an avatar standing on a grid line that coincides with an area
//! border does not flicker in and out of the area.

use covey_types::{BoundingBox, Location};

/// Relative tolerance used by [`approx_eq`].
pub const EPSILON: f64 = 1e-9;

/// Precomputed edges of a [`BoundingBox`].
///
/// The half extents are computed once and each coordinate is compared
/// against the resulting edges directly. Coordinates are never shifted into
/// the box's frame, so a point many orders of magnitude smaller or larger
/// than the box center does not lose precision before the comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    /// Left edge (exclusive).
    pub min_x: f64,
    /// Right edge (exclusive).
    pub max_x: f64,
    /// Bottom edge (exclusive).
    pub min_y: f64,
    /// Top edge (exclusive).
    pub max_y: f64,
}

impl Extents {
    /// Compute the edges of a center-plus-extents box.
    pub fn of(bbox: &BoundingBox) -> Self {
        let half_width = bbox.width / 2.0;
        let half_height = bbox.height / 2.0;
        Self {
            min_x: bbox.x - half_width,
            max_x: bbox.x + half_width,
            min_y: bbox.y - half_height,
            max_y: bbox.y + half_height,
        }
    }

    /// Whether `(x, y)` lies strictly inside the edges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.min_x && x < self.max_x && y > self.min_y && y < self.max_y
    }
}

/// Whether `(x, y)` lies strictly inside `bbox`.
pub fn contains(bbox: &BoundingBox, x: f64, y: f64) -> bool {
    Extents::of(bbox).contains(x, y)
}

/// Float-safe equality with a tolerance relative to the operands' magnitude.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= EPSILON * scale
}

/// Whether a width or height is usable for an area: finite and positive.
pub fn is_positive_extent(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Whether two locations describe the same position and pose.
pub fn same_location(a: &Location, b: &Location) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && a.facing == b.facing && a.moving == b.moving
}
