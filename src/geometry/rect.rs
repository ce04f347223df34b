//! Axis-aligned pixel rectangles for detected regions.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in image pixel coordinates.
///
/// `(x, y)` is the top-left corner. Containment is half-open on the right and
/// bottom edges: a pixel `p` is inside iff `x <= p.x < x + width` and
/// `y <= p.y < y + height`, so two rectangles that share an edge never both
/// contain a point on that edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Roi {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check whether a pixel lies inside the rectangle.
    #[inline]
    pub fn contains(&self, pt: &Point2<f64>) -> bool {
        pt.x >= self.x
            && pt.x < self.x + self.width
            && pt.y >= self.y
            && pt.y < self.y + self.height
    }

    /// Shrink the rectangle toward its own center.
    ///
    /// Each side moves inward by `factor / 2` of that side's length, so the
    /// result has `(1 - factor)` of the original width and height and the same
    /// center. `factor = 0` returns the rectangle unchanged.
    pub fn shrunk(&self, factor: f64) -> Roi {
        Roi {
            x: self.x + factor * self.width / 2.0,
            y: self.y + factor * self.height / 2.0,
            width: self.width * (1.0 - factor),
            height: self.height * (1.0 - factor),
        }
    }
}
