//! Rendering boundary support for ChronoMap
//!
//! Produces drawables and transforms for whatever front end draws the map.
//! This module is READ-ONLY with respect to snapshots: it never modifies them.

pub mod colors;
pub mod scene;
pub mod viewport;

pub use colors::{interaction_style, node_color, Color, InteractionStyle};
pub use scene::{CivilizationGlyph, MapScene};
pub use viewport::{ViewportController, ViewportLimits, ViewportTransform};
