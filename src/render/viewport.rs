//! Viewport pan/zoom over the map plane
//!
//! A transform maps plane point `p` to screen point `p * scale + translate`.
//! The plane extent equals the viewport extent, so after every operation the
//! visible region stays inside `[0, width] x [0, height]` of the plane.

use tokio::sync::watch;

use crate::core::types::Vec2;

/// Zoom bounds and button factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportLimits {
    pub min_scale: f64,
    pub max_scale: f64,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
}

impl Default for ViewportLimits {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 8.0,
            zoom_in_factor: 1.5,
            zoom_out_factor: 0.75,
        }
    }
}

/// Affine scale + translate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform = ViewportTransform {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    /// Plane to screen
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.scale + self.translate_x, p.y * self.scale + self.translate_y)
    }

    /// Screen to plane
    pub fn invert(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            (p.x - self.translate_x) / self.scale,
            (p.y - self.translate_y) / self.scale,
        )
    }

    /// SVG `transform` attribute value
    pub fn to_svg(&self) -> String {
        format!(
            "translate({},{}) scale({})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}

/// Owns the current transform and publishes each change
#[derive(Debug)]
pub struct ViewportController {
    limits: ViewportLimits,
    width: f64,
    height: f64,
    transform: ViewportTransform,
    tx: watch::Sender<ViewportTransform>,
}

impl ViewportController {
    pub fn new(width: f64, height: f64, limits: ViewportLimits) -> Self {
        let (tx, _) = watch::channel(ViewportTransform::IDENTITY);
        let mut controller = Self {
            limits,
            width,
            height,
            transform: ViewportTransform::IDENTITY,
            tx,
        };
        controller.commit(ViewportTransform::IDENTITY);
        controller
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewportTransform> {
        self.tx.subscribe()
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn limits(&self) -> &ViewportLimits {
        &self.limits
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        self.transform.apply(p)
    }

    pub fn invert(&self, p: Vec2) -> Vec2 {
        self.transform.invert(p)
    }

    /// Multiply the scale by `factor` about the viewport center
    pub fn zoom_by(&mut self, factor: f64) -> ViewportTransform {
        let center = Vec2::new(self.width / 2.0, self.height / 2.0);
        self.zoom_at(factor, center)
    }

    /// Multiply the scale by `factor`, keeping the screen point `anchor` fixed
    pub fn zoom_at(&mut self, factor: f64, anchor: Vec2) -> ViewportTransform {
        if !factor.is_finite() || factor <= 0.0 {
            return self.transform;
        }
        let k = (self.transform.scale * factor).clamp(self.limits.min_scale, self.limits.max_scale);
        let plane = self.transform.invert(anchor);
        self.commit(ViewportTransform::new(k, anchor.x - plane.x * k, anchor.y - plane.y * k))
    }

    pub fn zoom_in(&mut self) -> ViewportTransform {
        self.zoom_by(self.limits.zoom_in_factor)
    }

    pub fn zoom_out(&mut self) -> ViewportTransform {
        self.zoom_by(self.limits.zoom_out_factor)
    }

    /// Drag by a screen-space delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> ViewportTransform {
        let t = self.transform;
        self.commit(ViewportTransform::new(t.scale, t.translate_x + dx, t.translate_y + dy))
    }

    /// Jump to a target transform, constrained to the limits
    pub fn pan_to(&mut self, target: ViewportTransform) -> ViewportTransform {
        self.commit(target)
    }

    pub fn resize(&mut self, width: f64, height: f64) -> ViewportTransform {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.commit(self.transform)
    }

    pub fn reset(&mut self) -> ViewportTransform {
        self.commit(ViewportTransform::IDENTITY)
    }

    fn constrain(&self, t: ViewportTransform) -> ViewportTransform {
        let scale = if t.scale.is_finite() {
            t.scale.clamp(self.limits.min_scale, self.limits.max_scale)
        } else {
            self.transform.scale
        };
        let clamp_axis = |value: f64, extent: f64| {
            let low = extent * (1.0 - scale);
            if value.is_finite() {
                value.clamp(low, 0.0)
            } else {
                0.0
            }
        };
        ViewportTransform::new(
            scale,
            clamp_axis(t.translate_x, self.width),
            clamp_axis(t.translate_y, self.height),
        )
    }

    fn commit(&mut self, target: ViewportTransform) -> ViewportTransform {
        let constrained = self.constrain(target);
        self.transform = constrained;
        self.tx.send_replace(constrained);
        constrained
    }
}
