//! Map scene assembly
//!
//! Turns a snapshot into plane-space drawables. Everything here lives in
//! the zoomed layer: screen points go through the viewport transform
//! before they are compared against glyphs.

use crate::core::calendar::Year;
use crate::core::types::Vec2;
use crate::render::colors::{civilization_color, Color};
use crate::render::viewport::ViewportTransform;
use crate::snapshot::model::Snapshot;
use crate::spatial::projection::GeoProjector;
use crate::spatial::route::{InteractionRouter, RoutedInteraction};

/// Opacity at the center of an influence gradient; the rim is transparent
pub const GLYPH_CENTER_OPACITY: f32 = 0.4;
/// Dashed territory border
pub const GLYPH_BORDER_DASH: &str = "4,4";
pub const GLYPH_BORDER_OPACITY: f32 = 0.6;

/// One civilization's influence circle and label
#[derive(Debug, Clone, PartialEq)]
pub struct CivilizationGlyph {
    pub name: String,
    pub center: Vec2,
    pub radius: f64,
    pub color: Color,
}

impl CivilizationGlyph {
    pub fn contains(&self, plane: Vec2) -> bool {
        self.center.distance(&plane) <= self.radius
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    pub year: Year,
    /// In draw order
    pub glyphs: Vec<CivilizationGlyph>,
    pub routes: Vec<RoutedInteraction>,
}

impl MapScene {
    pub fn build(snapshot: &Snapshot, projector: &GeoProjector, router: &InteractionRouter) -> Self {
        let width = projector.config().width;
        let glyphs = snapshot
            .civilizations
            .iter()
            .map(|civ| CivilizationGlyph {
                name: civ.name.clone(),
                center: projector.project(civ.lat, civ.lng),
                radius: projector.influence_radius_pixels(civ.radius_km, width),
                color: civilization_color(&civ.color),
            })
            .collect();

        let routes = snapshot
            .interactions
            .iter()
            .map(|interaction| router.route(interaction, projector))
            .collect();

        Self {
            year: snapshot.year,
            glyphs,
            routes,
        }
    }

    /// Civilization under a screen point; the last drawn glyph wins
    pub fn hit_test(&self, screen: Vec2, transform: &ViewportTransform) -> Option<&CivilizationGlyph> {
        let plane = transform.invert(screen);
        self.glyphs.iter().rev().find(|glyph| glyph.contains(plane))
    }

    pub fn glyph(&self, name: &str) -> Option<&CivilizationGlyph> {
        self.glyphs.iter().find(|glyph| glyph.name == name)
    }
}
