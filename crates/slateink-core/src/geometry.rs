//! Data/points duality for box stencils.
//!
//! Every axis-aligned box stencil carries two interchangeable geometry
//! representations: structured data (position + extents) and an ordered
//! vertex list. The vertex list is the canonical form for transform
//! operations; corners 0 (top-left) and 2 (bottom-right) are the canonical
//! diagonal when converting back to data.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Index of the top-left corner.
pub const TOP_LEFT: usize = 0;
/// Index of the top-right corner.
pub const TOP_RIGHT: usize = 1;
/// Index of the bottom-right corner.
pub const BOTTOM_RIGHT: usize = 2;
/// Index of the bottom-left corner.
pub const BOTTOM_LEFT: usize = 3;

/// The four corners of a box stencil, always in TL, TR, BR, BL order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerPoints(pub [Point; 4]);

impl CornerPoints {
    /// Build the corner list from position + extents.
    pub fn from_box(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self([
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    /// Build the corner list from a rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_box(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Degenerate corner list collapsed onto a single point.
    ///
    /// Used by stencils whose extents are not yet known (auto-sized images).
    pub fn collapsed(x: f64, y: f64) -> Self {
        Self::from_box(x, y, 0.0, 0.0)
    }

    pub fn top_left(&self) -> Point {
        self.0[TOP_LEFT]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[BOTTOM_RIGHT]
    }

    /// Recover the rectangle from the canonical diagonal (corners 0 and 2).
    pub fn to_rect(&self) -> Rect {
        let s = self.top_left();
        let e = self.bottom_right();
        Rect::new(s.x, s.y, e.x, e.y)
    }

    /// Width as measured along the canonical diagonal.
    pub fn width(&self) -> f64 {
        self.bottom_right().x - self.top_left().x
    }

    /// Height as measured along the canonical diagonal.
    pub fn height(&self) -> f64 {
        self.bottom_right().y - self.top_left().y
    }

    /// Apply an affine map to every corner.
    pub fn transformed(&self, affine: Affine) -> Self {
        Self(self.0.map(|p| affine * p))
    }

    /// Shift every corner by a delta.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self(self.0.map(|p| p + delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_order() {
        let p = CornerPoints::from_box(10.0, 20.0, 100.0, 50.0);
        assert_eq!(p.0[TOP_LEFT], Point::new(10.0, 20.0));
        assert_eq!(p.0[TOP_RIGHT], Point::new(110.0, 20.0));
        assert_eq!(p.0[BOTTOM_RIGHT], Point::new(110.0, 70.0));
        assert_eq!(p.0[BOTTOM_LEFT], Point::new(10.0, 70.0));
    }

    #[test]
    fn test_rect_roundtrip() {
        let rect = Rect::new(-5.0, 3.0, 45.0, 23.0);
        let p = CornerPoints::from_rect(rect);
        assert_eq!(p.to_rect(), rect);
    }

    #[test]
    fn test_transformed_scale() {
        let p = CornerPoints::from_box(1.0, 1.0, 2.0, 2.0).transformed(Affine::scale(2.0));
        assert_eq!(p.top_left(), Point::new(2.0, 2.0));
        assert_eq!(p.bottom_right(), Point::new(6.0, 6.0));
    }

    #[test]
    fn test_translated() {
        let p = CornerPoints::from_box(0.0, 0.0, 10.0, 10.0).translated(Vec2::new(5.0, -5.0));
        assert_eq!(p.top_left(), Point::new(5.0, -5.0));
        assert!((p.width() - 10.0).abs() < f64::EPSILON);
        assert!((p.height() - 10.0).abs() < f64::EPSILON);
    }
}
