//! Conversation area definitions and the immutable area layout.
//!
//! A [`ConversationArea`] is the validated, immutable form of an
//! [`AreaConfig`] entry. The [`AreaLayout`] holds all areas in registration
//! order and answers the pure geometric question "which area contains this
//! point?". It is shared behind an `Arc` so membership can be computed on
//! any task without touching the session's mutable state.

use std::collections::BTreeMap;

use covey_types::{AreaConfig, AreaId, BoundingBox, Location};

use crate::error::WorldError;
use crate::geometry::{Extents, is_positive_extent};

/// A validated conversation area.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationArea {
    id: AreaId,
    bounding_box: BoundingBox,
    extents: Extents,
}

impl ConversationArea {
    /// Validate an area configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGeometry`] if the width or height is not
    /// a positive finite number, or the center is not finite.
    pub fn new(config: &AreaConfig) -> Result<Self, WorldError> {
        let bounding_box = config.bounding_box();
        if !is_positive_extent(bounding_box.width) || !is_positive_extent(bounding_box.height) {
            return Err(WorldError::InvalidGeometry {
                area: config.id.clone(),
                reason: format!(
                    "width and height must be positive, got {}x{}",
                    bounding_box.width, bounding_box.height
                ),
            });
        }
        if !bounding_box.x.is_finite() || !bounding_box.y.is_finite() {
            return Err(WorldError::InvalidGeometry {
                area: config.id.clone(),
                reason: format!(
                    "center must be finite, got ({}, {})",
                    bounding_box.x, bounding_box.y
                ),
            });
        }
        Ok(Self {
            id: config.id.clone(),
            bounding_box,
            extents: Extents::of(&bounding_box),
        })
    }

    /// The area's identifier.
    pub const fn id(&self) -> &AreaId {
        &self.id
    }

    /// The area's bounds as configured.
    pub const fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Whether the location lies strictly inside this area.
    pub fn contains(&self, location: &Location) -> bool {
        self.extents.contains(location.x, location.y)
    }
}

/// All conversation areas of a session, in registration order.
#[derive(Debug, Clone, Default)]
pub struct AreaLayout {
    areas: Vec<ConversationArea>,
    index: BTreeMap<AreaId, usize>,
}

impl AreaLayout {
    /// Validate and register a list of area configurations.
    ///
    /// Registration order is the order of `configs` and is the tie-break for
    /// overlapping boxes.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGeometry`] for a malformed box and
    /// [`WorldError::DuplicateArea`] if an id appears twice.
    pub fn new(configs: &[AreaConfig]) -> Result<Self, WorldError> {
        let mut layout = Self::default();
        for config in configs {
            layout.register(config)?;
        }
        Ok(layout)
    }

    fn register(&mut self, config: &AreaConfig) -> Result<(), WorldError> {
        if self.index.contains_key(&config.id) {
            return Err(WorldError::DuplicateArea(config.id.clone()));
        }
        let area = ConversationArea::new(config)?;
        self.index.insert(config.id.clone(), self.areas.len());
        self.areas.push(area);
        tracing::debug!(area = %config.id, "conversation area registered");
        Ok(())
    }

    /// Return the first area, in registration order, containing `location`.
    pub fn locate(&self, location: &Location) -> Option<&AreaId> {
        self.areas
            .iter()
            .find(|area| area.contains(location))
            .map(ConversationArea::id)
    }

    /// Look up an area by id.
    pub fn get(&self, id: &AreaId) -> Option<&ConversationArea> {
        self.index.get(id).and_then(|&i| self.areas.get(i))
    }

    /// Whether an area with this id is registered.
    pub fn contains_area(&self, id: &AreaId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterate areas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationArea> {
        self.areas.iter()
    }

    /// Number of registered areas.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether no areas are registered.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
