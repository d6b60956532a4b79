//! Normalized overlay geometry and container unit conversions.
//!
//! Overlay position and size are stored as percentages of the container they
//! sit in, never as pixels. Pixel values are derived on demand from the live
//! container dimensions, which is what keeps overlays in place when the
//! container is resized.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Smallest width/height (percent of the container) an overlay can be resized to.
pub const MIN_SIZE_PERCENT: f64 = 5.0;
/// Upper bound for a position component (percent of the container).
pub const MAX_POSITION_PERCENT: f64 = 100.0;

/// Position, size and rotation of one overlay element.
///
/// Updates never mutate in place; each `apply_*` call returns a new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayGeometry {
    /// Top-left corner as percent of container width (x) and height (y).
    pub position: Point,
    /// Width and height as percent of container width and height.
    pub size: Size,
    /// Accumulated rotation in radians. Not normalized.
    pub rotation: f64,
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            size: Size::new(50.0, 50.0),
            rotation: 0.0,
        }
    }
}

impl OverlayGeometry {
    /// Create a geometry with no rotation.
    pub fn new(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
        }
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Move by a percentage delta. Each axis is clamped to [0, 100] on its own.
    pub fn apply_drag(self, delta: Vec2) -> Self {
        Self {
            position: Point::new(
                (self.position.x + delta.x).clamp(0.0, MAX_POSITION_PERCENT),
                (self.position.y + delta.y).clamp(0.0, MAX_POSITION_PERCENT),
            ),
            ..self
        }
    }

    /// Replace the size. Each axis is floored at [`MIN_SIZE_PERCENT`]; there is no upper bound.
    pub fn apply_resize(self, width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width.max(MIN_SIZE_PERCENT), height.max(MIN_SIZE_PERCENT)),
            ..self
        }
    }

    /// Add a rotation delta (radians).
    pub fn apply_rotate(self, delta: f64) -> Self {
        Self {
            rotation: self.rotation + delta,
            ..self
        }
    }

    /// Rotation reduced to [0, 2π) for display.
    pub fn display_rotation(&self) -> f64 {
        self.rotation.rem_euclid(TAU)
    }

    /// Display rotation in degrees.
    pub fn display_degrees(&self) -> f64 {
        self.display_rotation().to_degrees()
    }

    /// Unrotated element rectangle in container pixels.
    pub fn pixel_rect(&self, container: Size) -> Rect {
        let origin = Point::new(
            self.position.x / 100.0 * container.width,
            self.position.y / 100.0 * container.height,
        );
        Rect::from_origin_size(origin, self.pixel_size(container))
    }

    /// Element layout size in container pixels.
    pub fn pixel_size(&self, container: Size) -> Size {
        Size::new(
            self.size.width / 100.0 * container.width,
            self.size.height / 100.0 * container.height,
        )
    }

    /// Axis-aligned box around the rotated element, in container pixels.
    pub fn rotated_bounds(&self, container: Size) -> Rect {
        rotated_bounds(self.pixel_rect(container), self.rotation)
    }
}

/// Axis-aligned bounds of `rect` rotated by `rotation` around its center.
pub fn rotated_bounds(rect: Rect, rotation: f64) -> Rect {
    let center = rect.center();
    let (sin, cos) = rotation.sin_cos();
    let half_w = rect.width() / 2.0;
    let half_h = rect.height() / 2.0;
    let ext_x = (half_w * cos).abs() + (half_h * sin).abs();
    let ext_y = (half_w * sin).abs() + (half_h * cos).abs();
    Rect::new(
        center.x - ext_x,
        center.y - ext_y,
        center.x + ext_x,
        center.y + ext_y,
    )
}

/// The fixed-size box overlays are positioned in.
///
/// Holds the last measured pixel size and the fallback used for any axis that
/// has not been laid out yet (measured as zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    measured: Size,
    fallback: Size,
}

impl Container {
    /// Create a container that has not been measured yet.
    pub fn new(fallback: Size) -> Self {
        Self {
            measured: Size::ZERO,
            fallback,
        }
    }

    /// Record the live pixel size reported by the host.
    pub fn set_measured(&mut self, width: f64, height: f64) {
        self.measured = Size::new(width, height);
    }

    /// Last measured size (may be zero).
    pub fn measured(&self) -> Size {
        self.measured
    }

    /// Fallback size.
    pub fn fallback(&self) -> Size {
        self.fallback
    }

    /// Size to normalize against: measured per axis, or the fallback where the
    /// measurement is zero or not finite.
    pub fn effective_size(&self) -> Size {
        let pick = |measured: f64, fallback: f64| {
            if measured.is_finite() && measured > 0.0 {
                measured
            } else {
                fallback
            }
        };
        let size = Size::new(
            pick(self.measured.width, self.fallback.width),
            pick(self.measured.height, self.fallback.height),
        );
        if size != self.measured {
            log::trace!("container not laid out, using fallback {size:?}");
        }
        size
    }

    /// Convert a pixel delta to a percentage delta.
    pub fn to_percent(&self, pixels: Vec2) -> Vec2 {
        let size = self.effective_size();
        Vec2::new(pixels.x / size.width * 100.0, pixels.y / size.height * 100.0)
    }

    /// Convert a percentage delta to pixels.
    pub fn to_pixels(&self, percent: Vec2) -> Vec2 {
        let size = self.effective_size();
        Vec2::new(percent.x / 100.0 * size.width, percent.y / 100.0 * size.height)
    }
}
