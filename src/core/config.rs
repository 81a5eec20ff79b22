//! Runtime configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose.
//! Values can be overridden from a TOML file; missing keys keep the defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::calendar::YearRange;
use crate::core::error::{ChronoError, Result};
use crate::render::viewport::ViewportLimits;
use crate::simulation::forces::ForceConfig;
use crate::spatial::projection::{ProjectionKind, ProjectorConfig};

/// Configuration for the temporal, projection and layout systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronoConfig {
    // === TIMELINE ===
    /// Earliest year that can be requested (inclusive, negative = BC)
    pub year_min: i32,

    /// Latest year that can be requested (inclusive)
    pub year_max: i32,

    /// Quiescence window before a year request starts resolving (ms)
    ///
    /// Scrubbing the slider issues many requests; only the last one
    /// inside this window reaches the cache or the generator.
    pub debounce_ms: u64,

    /// Years added per auto-advance tick
    pub autoplay_step: i64,

    /// Interval between auto-advance ticks (ms)
    pub autoplay_interval_ms: u64,

    /// Years moved by a single manual step (arrow keys, prev/next)
    pub manual_step: i64,

    // === CACHE ===
    /// Prefix of every cache key; the year is appended verbatim
    pub cache_prefix: String,

    // === PROJECTION ===
    /// Which map projection to use
    pub projection: ProjectionKind,

    /// Projection scale is `width / projection_scale_divisor`
    pub projection_scale_divisor: f64,

    /// Vertical center is `height / projection_vertical_divisor`
    ///
    /// Values above 2 push the equator below the middle of the canvas,
    /// which leaves more room for the northern hemisphere.
    pub projection_vertical_divisor: f64,

    /// Reference circumference (km) used to turn an influence radius into pixels
    pub reference_circumference_km: f64,

    /// Multiplier applied to `radius_km / circumference * width`
    pub radius_width_factor: f64,

    /// Smallest influence circle drawn (pixels), keeps small powers clickable
    pub min_radius_px: f64,

    /// Arc radius as a multiple of the chord length between two powers
    pub arc_curvature: f64,

    // === RELATIONSHIP LAYOUT ===
    /// Rest length of every link spring (canvas units)
    pub link_distance: f64,

    /// Many-body strength; negative values repel
    pub charge_strength: f64,

    /// Distance below which repulsion stops growing
    pub charge_distance_min: f64,

    /// Fraction of velocity removed each tick (0 = frictionless, 1 = frozen)
    pub velocity_decay: f64,

    /// Cooling stops once alpha falls below this value
    pub alpha_min: f64,

    /// Hard cap on relaxation ticks per run
    pub max_iterations: usize,

    /// Largest per-tick node displacement that still counts as settled
    pub convergence_tolerance: f64,

    /// Delay between published layout frames (ms)
    pub layout_frame_ms: u64,

    // === VIEWPORT ===
    /// Lowest zoom scale
    pub zoom_min: f64,

    /// Highest zoom scale
    pub zoom_max: f64,

    /// Factor applied by a single zoom-in gesture
    pub zoom_in_factor: f64,

    /// Factor applied by a single zoom-out gesture
    pub zoom_out_factor: f64,
}

impl Default for ChronoConfig {
    fn default() -> Self {
        Self {
            // Timeline
            year_min: -3000,
            year_max: 2024,
            debounce_ms: 800,
            autoplay_step: 50,
            autoplay_interval_ms: 3000,
            manual_step: 10,

            // Cache
            cache_prefix: "chronomap_data_".into(),

            // Projection
            projection: ProjectionKind::Mercator,
            projection_scale_divisor: 6.5,
            projection_vertical_divisor: 1.6,
            reference_circumference_km: 15000.0,
            radius_width_factor: 1.5,
            min_radius_px: 10.0,
            arc_curvature: 1.5,

            // Relationship layout
            link_distance: 80.0,
            charge_strength: -200.0,
            charge_distance_min: 1.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            max_iterations: 300,
            convergence_tolerance: 0.01,
            layout_frame_ms: 16,

            // Viewport
            zoom_min: 1.0,
            zoom_max: 8.0,
            zoom_in_factor: 1.5,
            zoom_out_factor: 0.75,
        }
    }
}

impl ChronoConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ChronoConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.year_min > self.year_max {
            return Err(ChronoError::Config(format!(
                "year_min ({}) must not exceed year_max ({})",
                self.year_min, self.year_max
            )));
        }

        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            return Err(ChronoError::Config(format!(
                "zoom range [{}, {}] is invalid",
                self.zoom_min, self.zoom_max
            )));
        }

        if self.projection_scale_divisor <= 0.0 || self.projection_vertical_divisor <= 0.0 {
            return Err(ChronoError::Config("projection divisors must be positive".into()));
        }

        if self.reference_circumference_km <= 0.0 {
            return Err(ChronoError::Config(
                "reference_circumference_km must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(ChronoError::Config(format!(
                "velocity_decay ({}) must be within [0, 1]",
                self.velocity_decay
            )));
        }

        if self.alpha_min <= 0.0 || self.alpha_min >= 1.0 {
            return Err(ChronoError::Config(format!(
                "alpha_min ({}) must be within (0, 1)",
                self.alpha_min
            )));
        }

        Ok(())
    }

    pub fn year_range(&self) -> YearRange {
        YearRange::new(self.year_min, self.year_max)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }

    pub fn layout_frame_interval(&self) -> Duration {
        Duration::from_millis(self.layout_frame_ms)
    }

    pub fn projector_config(&self, width: f64, height: f64) -> ProjectorConfig {
        ProjectorConfig {
            kind: self.projection,
            width,
            height,
            scale_divisor: self.projection_scale_divisor,
            vertical_divisor: self.projection_vertical_divisor,
            reference_circumference_km: self.reference_circumference_km,
            radius_width_factor: self.radius_width_factor,
            min_radius_px: self.min_radius_px,
        }
    }

    pub fn force_config(&self) -> ForceConfig {
        ForceConfig {
            link_distance: self.link_distance,
            charge_strength: self.charge_strength,
            charge_distance_min: self.charge_distance_min,
            velocity_decay: self.velocity_decay,
            alpha_min: self.alpha_min,
            max_iterations: self.max_iterations,
            convergence_tolerance: self.convergence_tolerance,
            ..ForceConfig::default()
        }
    }

    pub fn viewport_limits(&self) -> ViewportLimits {
        ViewportLimits {
            min_scale: self.zoom_min,
            max_scale: self.zoom_max,
            zoom_in_factor: self.zoom_in_factor,
            zoom_out_factor: self.zoom_out_factor,
        }
    }
}
