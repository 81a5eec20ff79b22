//! Curved arcs between interacting powers
//!
//! Each interaction becomes an SVG-style elliptical arc (circular, small
//! arc, clockwise sweep) whose radius grows with the chord length, so
//! long-range interactions read flatter than short ones.

use std::f64::consts::TAU;

use geo::HaversineDistance;
use geo_types::Point;

use crate::core::types::Vec2;
use crate::render::colors::{interaction_style, InteractionStyle};
use crate::snapshot::model::{Interaction, InteractionKind};
use crate::spatial::projection::GeoProjector;

/// Circular arc from `from` to `to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    pub from: Vec2,
    pub to: Vec2,
    pub radius: f64,
}

impl ArcPath {
    pub fn chord_length(&self) -> f64 {
        self.from.distance(&self.to)
    }

    /// Radius actually drawn; a radius shorter than half the chord is
    /// scaled up to it, as SVG renderers do
    pub fn effective_radius(&self) -> f64 {
        self.radius.max(self.chord_length() / 2.0)
    }

    /// Circle center, `None` when both endpoints coincide
    pub fn center(&self) -> Option<Vec2> {
        let half = (self.from - self.to) * 0.5;
        let h2 = half.x * half.x + half.y * half.y;
        if h2 <= f64::EPSILON {
            return None;
        }
        let r = self.effective_radius();
        let coef = ((r * r - h2) / h2).max(0.0).sqrt();
        let mid = (self.from + self.to) * 0.5;
        Some(Vec2::new(mid.x + coef * half.y, mid.y - coef * half.x))
    }

    /// Maximum distance between the arc and its chord
    pub fn sagitta(&self) -> f64 {
        let h = self.chord_length() / 2.0;
        let r = self.effective_radius();
        r - (r * r - h * h).max(0.0).sqrt()
    }

    /// SVG path data, e.g. `M10,20A30,30 0 0,1 40,50`
    pub fn svg_path(&self) -> String {
        let r = self.effective_radius();
        format!(
            "M{},{}A{},{} 0 0,1 {},{}",
            self.from.x, self.from.y, r, r, self.to.x, self.to.y
        )
    }

    /// `segments + 1` points along the arc, endpoints included
    pub fn sample(&self, segments: usize) -> Vec<Vec2> {
        let segments = segments.max(1);
        let Some(center) = self.center() else {
            return vec![self.from; segments + 1];
        };
        let r = self.effective_radius();
        let start = (self.from.y - center.y).atan2(self.from.x - center.x);
        let end = (self.to.y - center.y).atan2(self.to.x - center.x);
        let sweep = (end - start).rem_euclid(TAU);

        (0..=segments)
            .map(|i| {
                if i == 0 {
                    return self.from;
                }
                if i == segments {
                    return self.to;
                }
                let theta = start + sweep * (i as f64 / segments as f64);
                Vec2::new(center.x + r * theta.cos(), center.y + r * theta.sin())
            })
            .collect()
    }
}

/// An interaction ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedInteraction {
    pub kind: InteractionKind,
    pub title: String,
    pub path: ArcPath,
    pub style: InteractionStyle,
    /// Great-circle distance between the geographic endpoints
    pub distance_km: f64,
}

/// Builds arcs and styles; holds only its curvature factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRouter {
    curvature: f64,
}

impl Default for InteractionRouter {
    fn default() -> Self {
        Self::new(1.5)
    }
}

impl InteractionRouter {
    pub fn new(curvature: f64) -> Self {
        Self { curvature }
    }

    pub fn curvature(&self) -> f64 {
        self.curvature
    }

    /// Arc between two projected points
    pub fn arc(&self, from: Vec2, to: Vec2) -> ArcPath {
        ArcPath {
            from,
            to,
            radius: from.distance(&to) * self.curvature,
        }
    }

    pub fn route_points(&self, from: Vec2, to: Vec2, kind: InteractionKind) -> (ArcPath, InteractionStyle) {
        (self.arc(from, to), interaction_style(kind))
    }

    /// Project and route a recorded interaction
    pub fn route(&self, interaction: &Interaction, projector: &GeoProjector) -> RoutedInteraction {
        let from = projector.project(interaction.from_lat, interaction.from_lng);
        let to = projector.project(interaction.to_lat, interaction.to_lng);
        let (path, style) = self.route_points(from, to, interaction.kind);
        RoutedInteraction {
            kind: interaction.kind,
            title: interaction.title.clone(),
            path,
            style,
            distance_km: great_circle_km(
                interaction.from_lat,
                interaction.from_lng,
                interaction.to_lat,
                interaction.to_lng,
            ),
        }
    }
}

/// Haversine distance between two (lat, lng) pairs in kilometers
pub fn great_circle_km(from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> f64 {
    let a = Point::new(from_lng, from_lat);
    let b = Point::new(to_lng, to_lat);
    a.haversine_distance(&b) / 1000.0
}
