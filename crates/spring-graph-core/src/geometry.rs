//! Immutable 2D geometry value types used by the quadtree and the layout
//! passes.

use serde::{Deserialize, Serialize};

/// A 2D point. Plain value semantics, no identity beyond equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Origin point.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Vector length when the point is used as a displacement.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// True if both coordinates are finite (not NaN, not infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle with non-negative extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    /// Create a rectangle. Negative extents are clamped to zero.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Corner-to-corner extent. The largest separation two points inside the
    /// rectangle can have, which is what bounds the error of treating its
    /// contents as a single mass.
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Inclusive containment test. Points on a shared child boundary are
    /// contained by more than one quadrant; callers resolve by scan order.
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x && p.x <= self.max_x() && p.y >= self.y && p.y <= self.max_y()
    }

    /// Fast bounding-box overlap test.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.max_x() >= other.x
            && other.max_x() >= self.x
            && self.max_y() >= other.y
            && other.max_y() >= self.y
    }

    /// Split into four equal quadrants, in NW, NE, SE, SW order.
    pub fn quadrants(&self) -> [Rectangle; 4] {
        let w = self.width / 2.0;
        let h = self.height / 2.0;
        [
            Rectangle::new(self.x, self.y, w, h),         // NW
            Rectangle::new(self.x + w, self.y, w, h),     // NE
            Rectangle::new(self.x + w, self.y + h, w, h), // SE
            Rectangle::new(self.x, self.y + h, w, h),     // SW
        ]
    }
}
