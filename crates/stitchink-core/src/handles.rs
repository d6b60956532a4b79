//! Manipulation handle layout and hit testing.
//!
//! Every overlay frame carries two handles: a square resize handle inside the
//! bottom-right corner and a rotate handle just outside the top-right corner.
//! Both are laid out in the element's unrotated frame and turn with it.

use crate::geometry::OverlayGeometry;
use crate::input::HandleTarget;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Default resize handle edge length in pixels.
pub const RESIZE_HANDLE_SIZE: f64 = 16.0;
/// Default rotate handle edge length in pixels.
pub const ROTATE_HANDLE_SIZE: f64 = 24.0;
/// Default distance the rotate handle sits outside the top-right corner.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

/// Handle dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleLayout {
    pub resize_size: f64,
    pub rotate_size: f64,
    pub rotate_offset: f64,
}

impl Default for HandleLayout {
    fn default() -> Self {
        Self {
            resize_size: RESIZE_HANDLE_SIZE,
            rotate_size: ROTATE_HANDLE_SIZE,
            rotate_offset: ROTATE_HANDLE_OFFSET,
        }
    }
}

/// A handle in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub target: HandleTarget,
    /// Handle box in the element's unrotated frame.
    pub local_rect: Rect,
    /// Handle center after applying the element rotation.
    pub center: Point,
    /// Rotation shared with the element.
    pub rotation: f64,
}

impl Handle {
    /// Corners of the rotated handle box, clockwise from top-left.
    pub fn corners(&self, pivot: Point) -> [Point; 4] {
        let r = self.local_rect;
        [
            rotate_about(Point::new(r.x0, r.y0), pivot, self.rotation),
            rotate_about(Point::new(r.x1, r.y0), pivot, self.rotation),
            rotate_about(Point::new(r.x1, r.y1), pivot, self.rotation),
            rotate_about(Point::new(r.x0, r.y1), pivot, self.rotation),
        ]
    }
}

impl HandleLayout {
    /// Resize handle box for an element rect (unrotated frame).
    pub fn resize_rect(&self, element: Rect) -> Rect {
        Rect::new(
            element.x1 - self.resize_size,
            element.y1 - self.resize_size,
            element.x1,
            element.y1,
        )
    }

    /// Rotate handle box for an element rect (unrotated frame).
    pub fn rotate_rect(&self, element: Rect) -> Rect {
        let x0 = element.x1 + self.rotate_offset - self.rotate_size;
        let y0 = element.y0 - self.rotate_offset;
        Rect::new(x0, y0, x0 + self.rotate_size, y0 + self.rotate_size)
    }

    /// Both handles for an overlay, rotate handle first.
    pub fn handles(&self, geometry: &OverlayGeometry, container: Size) -> [Handle; 2] {
        let element = geometry.pixel_rect(container);
        let pivot = element.center();
        let make = |target, local_rect: Rect| Handle {
            target,
            local_rect,
            center: rotate_about(local_rect.center(), pivot, geometry.rotation),
            rotation: geometry.rotation,
        };
        [
            make(HandleTarget::RotateHandle, self.rotate_rect(element)),
            make(HandleTarget::ResizeHandle, self.resize_rect(element)),
        ]
    }

    /// Find what a pointer at `point` (container pixels) would grab.
    ///
    /// Handles win over the body; the rotate handle wins over the resize
    /// handle. Returns `None` when the point misses the element entirely.
    pub fn hit_test(
        &self,
        geometry: &OverlayGeometry,
        container: Size,
        point: Point,
    ) -> Option<HandleTarget> {
        let element = geometry.pixel_rect(container);
        let local = rotate_about(point, element.center(), -geometry.rotation);

        if contains(self.rotate_rect(element), local) {
            Some(HandleTarget::RotateHandle)
        } else if contains(self.resize_rect(element), local) {
            Some(HandleTarget::ResizeHandle)
        } else if contains(element, local) {
            Some(HandleTarget::Body)
        } else {
            None
        }
    }
}

/// Rotate `point` around `pivot` by `angle` radians.
pub fn rotate_about(point: Point, pivot: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return point;
    }
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;
    Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
}

// Inclusive on every edge, unlike `Rect::contains`.
fn contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}
