//! Canvas space ⇄ document space conversion.
//!
//! Canvas space is viewport pixels with the origin at the top-left corner.
//! Document space is centered on the canvas midpoint and independent of
//! pan and zoom, so zooming scales symmetrically around the center.
//!
//! ```text
//! canvas = center + document * zoom + pan
//! document = trunc((canvas - pan - center) / zoom)
//! ```

use serde::{Deserialize, Serialize};

/// A point in canvas space (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A displacement (pan offset, drag translation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Horizontal component.
    pub dx: f64,
    /// Vertical component.
    pub dy: f64,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create a vector.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.dx * factor, self.dy * factor)
    }
}

impl std::ops::Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

/// Width and height, in whichever space the caller is working in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Midpoint of a canvas of this size.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// True if either dimension is zero (or not a positive number).
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Converts a canvas-space value to a document coordinate.
///
/// Truncates toward zero; `as` saturates at the `i64` bounds.
#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}

/// A snapshot of the effective view: pan offset (canvas pixels), zoom and
/// the canvas center.
///
/// `zoom` must be positive; [`crate::Viewport`] clamps it before handing
/// out a transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Pan offset in canvas pixels.
    pub pan: Vector,
    /// Zoom scale.
    pub zoom: f64,
    /// Canvas midpoint.
    pub center: Point,
}

impl ViewTransform {
    /// Create a transform.
    #[must_use]
    pub const fn new(pan: Vector, zoom: f64, center: Point) -> Self {
        Self { pan, zoom, center }
    }

    /// Identity transform for a canvas of the given size.
    #[must_use]
    pub fn identity(canvas: Size) -> Self {
        Self::new(Vector::ZERO, 1.0, canvas.center())
    }

    /// Map a canvas point to integer document coordinates.
    #[must_use]
    pub fn to_document_space(&self, point: Point) -> (i64, i64) {
        (
            truncate((point.x - self.pan.dx - self.center.x) / self.zoom),
            truncate((point.y - self.pan.dy - self.center.y) / self.zoom),
        )
    }

    /// Map document coordinates to a canvas point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_canvas_space(&self, x: i64, y: i64) -> Point {
        Point::new(
            self.center.x + x as f64 * self.zoom + self.pan.dx,
            self.center.y + y as f64 * self.zoom + self.pan.dy,
        )
    }

    /// Map a relative canvas displacement to a document displacement.
    ///
    /// Only the zoom applies; pan and center cancel out for deltas.
    #[must_use]
    pub fn delta_to_document(&self, delta: Vector) -> (i64, i64) {
        (truncate(delta.dx / self.zoom), truncate(delta.dy / self.zoom))
    }

    /// On-screen size of something `size` document units large.
    #[must_use]
    pub fn to_canvas_size(&self, size: u32) -> f64 {
        f64::from(size) * self.zoom
    }
}
