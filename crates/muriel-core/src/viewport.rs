//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom level that corresponds to "100%".
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Smallest zoom the wheel and buttons can reach.
pub const MIN_ZOOM: f64 = 0.25;
/// Largest zoom the wheel and buttons can reach.
pub const MAX_ZOOM: f64 = 2.0;
/// Multiplicative zoom change per wheel notch.
pub const ZOOM_STEP: f64 = 1.08;

/// Direction of a single wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Derive the zoom direction from a wheel delta (positive delta scrolls
    /// down, which zooms out).
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            ZoomDirection::Out
        } else {
            ZoomDirection::In
        }
    }
}

/// Zoom/pan state of the drawing view.
///
/// `pan` is a screen-space translation; world coordinates map to screen
/// coordinates as `world * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom level.
    pub zoom: f64,
    /// Current translation offset in screen pixels.
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    /// Create a viewport at 100% with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// World-to-screen transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.pan.x) / self.zoom,
            (screen_point.y - self.pan.y) / self.zoom,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            world_point.x * self.zoom + self.pan.x,
            world_point.y * self.zoom + self.pan.y,
        )
    }
}

/// Limits applied by the [`ViewportController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomLimits {
    /// Positive, finite and ordered limits with a step above 1.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min > 0.0
            && self.min <= self.max
            && self.step.is_finite()
            && self.step > 1.0
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
            step: ZOOM_STEP,
        }
    }
}

/// Owns the viewport and is the only thing that mutates it.
///
/// Each operation computes the complete next [`Viewport`] and stores it in
/// one assignment, so zoom and pan from the same gesture never land apart.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    viewport: Viewport,
    limits: ZoomLimits,
}

impl ViewportController {
    /// Create a controller with the given zoom limits. Unusable limits
    /// are replaced by the defaults.
    pub fn new(limits: ZoomLimits) -> Self {
        let limits = if limits.is_valid() {
            limits
        } else {
            log::warn!("Ignoring invalid zoom limits {:?}", limits);
            ZoomLimits::default()
        };
        Self {
            viewport: Viewport::default(),
            limits,
        }
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Zoom limits in effect.
    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    /// Replace the viewport wholesale (used when opening a saved diagram).
    /// The zoom is clamped to the configured limits.
    pub fn set(&mut self, viewport: Viewport) {
        self.viewport = Viewport {
            zoom: self.clamp_zoom(viewport.zoom),
            pan: viewport.pan,
        };
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.limits.min, self.limits.max)
        } else {
            DEFAULT_ZOOM
        }
    }

    /// One wheel step anchored at `screen_point`: the world point under the
    /// cursor stays under the cursor.
    pub fn zoom_at(&mut self, screen_point: Point, direction: ZoomDirection) {
        let old = self.viewport;
        let requested = match direction {
            ZoomDirection::In => old.zoom * self.limits.step,
            ZoomDirection::Out => old.zoom / self.limits.step,
        };
        self.zoom_to(screen_point, requested);
        log::trace!("zoom {:?} -> {}", direction, self.viewport.zoom);
    }

    /// Set an absolute zoom level, keeping `screen_point` fixed.
    pub fn zoom_to(&mut self, screen_point: Point, zoom: f64) {
        let old = self.viewport;
        let new_zoom = self.clamp_zoom(zoom);

        let world_anchor = old.screen_to_world(screen_point);
        let pan = Vec2::new(
            screen_point.x - world_anchor.x * new_zoom,
            screen_point.y - world_anchor.y * new_zoom,
        );

        self.viewport = Viewport {
            zoom: new_zoom,
            pan,
        };
    }

    /// Pan the view by a delta in screen coordinates. Unbounded.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport = Viewport {
            zoom: self.viewport.zoom,
            pan: self.viewport.pan + delta,
        };
    }

    /// Reset to 100% with no pan.
    pub fn reset(&mut self) {
        self.viewport = Viewport::default();
    }

    /// Convert a screen point using the current viewport.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.viewport.screen_to_world(screen_point)
    }

    /// Fit the view to show the given bounding box, centred.
    pub fn fit_to_bounds(&mut self, bounds: Rect, view: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (view.width - padding * 2.0).max(1.0),
            (view.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        let zoom = self.clamp_zoom(scale_x.min(scale_y));

        let bounds_center = bounds.center();
        let view_center = Point::new(view.width / 2.0, view.height / 2.0);

        self.viewport = Viewport {
            zoom,
            pan: Vec2::new(
                view_center.x - bounds_center.x * zoom,
                view_center.y - bounds_center.y * zoom,
            ),
        };
    }
}
