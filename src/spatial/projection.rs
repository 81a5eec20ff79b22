//! Geographic projection onto the map plane
//!
//! A projector is a plain value: the same configuration and input always
//! produce the same output, so callers may project freely every frame.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// Latitude where a square Mercator world map ends
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    #[default]
    Mercator,
    Equirectangular,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectorConfig {
    pub kind: ProjectionKind,
    /// Viewport width (pixels)
    pub width: f64,
    /// Viewport height (pixels)
    pub height: f64,
    /// Scale is `width / scale_divisor` pixels per radian
    pub scale_divisor: f64,
    /// Equator sits at `height / vertical_divisor`
    pub vertical_divisor: f64,
    pub reference_circumference_km: f64,
    pub radius_width_factor: f64,
    /// Floor for influence circles (pixels)
    pub min_radius_px: f64,
}

impl ProjectorConfig {
    pub fn for_viewport(width: f64, height: f64) -> Self {
        Self {
            kind: ProjectionKind::Mercator,
            width,
            height,
            scale_divisor: 6.5,
            vertical_divisor: 1.6,
            reference_circumference_km: 15000.0,
            radius_width_factor: 1.5,
            min_radius_px: 10.0,
        }
    }
}

/// Maps (lat, lng) in degrees to plane coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoProjector {
    config: ProjectorConfig,
}

impl GeoProjector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }

    pub fn for_viewport(width: f64, height: f64) -> Self {
        Self::new(ProjectorConfig::for_viewport(width, height))
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Pixels per radian of longitude
    pub fn scale(&self) -> f64 {
        self.config.width / self.config.scale_divisor
    }

    /// Plane position of (0°, 0°)
    pub fn origin(&self) -> Vec2 {
        Vec2::new(
            self.config.width / 2.0,
            self.config.height / self.config.vertical_divisor,
        )
    }

    /// Project a latitude/longitude pair (degrees)
    pub fn project(&self, lat: f64, lng: f64) -> Vec2 {
        let lambda = lng.to_radians();
        let y = match self.config.kind {
            ProjectionKind::Mercator => {
                let phi = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
                (FRAC_PI_4 + phi / 2.0).tan().ln()
            }
            ProjectionKind::Equirectangular => lat.clamp(-90.0, 90.0).to_radians(),
        };
        let origin = self.origin();
        let scale = self.scale();
        // Plane y grows downward
        Vec2::new(origin.x + scale * lambda, origin.y - scale * y)
    }

    /// Project a geo point (x = longitude, y = latitude)
    pub fn project_point(&self, point: Point<f64>) -> Vec2 {
        self.project(point.y(), point.x())
    }

    pub fn project_coord(&self, coord: Coord<f64>) -> Vec2 {
        self.project(coord.y, coord.x)
    }

    /// Inverse projection, returns (lat, lng) in degrees
    pub fn invert(&self, pos: Vec2) -> (f64, f64) {
        let origin = self.origin();
        let scale = self.scale();
        let lambda = (pos.x - origin.x) / scale;
        let y = (origin.y - pos.y) / scale;
        let phi = match self.config.kind {
            ProjectionKind::Mercator => 2.0 * y.exp().atan() - FRAC_PI_2,
            ProjectionKind::Equirectangular => y,
        };
        (phi.to_degrees(), lambda.to_degrees())
    }

    /// Radius of an influence circle, in pixels, for a radius in km
    ///
    /// Linear in `radius_km` relative to the reference circumference,
    /// never below the configured floor.
    pub fn influence_radius_pixels(&self, radius_km: f64, viewport_width: f64) -> f64 {
        let km = if radius_km.is_finite() { radius_km.max(0.0) } else { 0.0 };
        let width = if viewport_width.is_finite() { viewport_width.max(0.0) } else { 0.0 };
        let r = km / self.config.reference_circumference_km * width * self.config.radius_width_factor;
        r.max(self.config.min_radius_px)
    }
}
