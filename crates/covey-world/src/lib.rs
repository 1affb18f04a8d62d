//! Geometry and conversation-area membership for the Covey engine.
//!
//! This crate models the shared 2D space: rectangular conversation areas,
//! strict point-in-box containment, and the membership partition that
//! assigns each participant to at most one area.
//!
//! # Modules
//!
//! - [`geometry`] -- Strict containment and float-safe comparison helpers.
//! - [`area`] -- Validated [`ConversationArea`]s and the immutable
//!   [`AreaLayout`] in registration order.
//! - [`registry`] -- [`AreaRegistry`], the derived member set of every area.
//! - [`error`] -- Error types for area registration and membership.

pub mod area;
pub mod error;
pub mod geometry;
pub mod registry;

// Re-export primary types at crate root.
pub use area::{AreaLayout, ConversationArea};
pub use error::WorldError;
pub use geometry::{Extents, approx_eq, contains, is_positive_extent, same_location};
pub use registry::AreaRegistry;
