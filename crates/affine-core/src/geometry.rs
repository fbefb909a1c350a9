//! Plain geometry value types in view coordinates.
//!
//! Origin is the top-left corner of the view and y grows downward, so a
//! positive angle measured with `atan2` turns clockwise on screen.

use serde::{Deserialize, Serialize};

/// A point in view coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`.
    #[inline]
    pub fn offset_to(self, other: Point) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    /// Translate by (dx, dy).
    #[inline]
    pub fn translate(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of side `side` centered on `center`.
    pub fn centered_square(center: Point, side: f64) -> Self {
        let half = side / 2.0;
        Self::new(center.x - half, center.y - half, side, side)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Point at fractional position (fx, fy) inside the rectangle,
    /// (0, 0) being the top-left and (1, 1) the bottom-right corner.
    pub fn point_at(&self, fx: f64, fy: f64) -> Point {
        Point::new(self.x + self.width * fx, self.y + self.height * fy)
    }

    /// Containment test, edges included.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Same rectangle with width and height raised to at least `min`.
    /// Non-finite extents are treated as zero.
    pub fn with_min_size(&self, min: f64) -> Rect {
        let fix = |v: f64| if v.is_finite() { v.max(min) } else { min };
        Rect::new(self.x, self.y, fix(self.width), fix(self.height))
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center_and_points() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.center(), Point::new(60.0, 45.0));
        assert_eq!(r.point_at(1.0, 1.0), Point::new(110.0, 70.0));
        assert_eq!(r.point_at(0.5, 0.0), Point::new(60.0, 20.0));
    }

    #[test]
    fn test_contains_includes_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(10.01, 5.0)));
        assert!(!r.contains(Point::new(-0.01, 5.0)));
    }

    #[test]
    fn test_centered_square() {
        let r = Rect::centered_square(Point::new(5.0, 5.0), 4.0);
        assert_eq!(r, Rect::new(3.0, 3.0, 4.0, 4.0));
        assert_eq!(r.center(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_with_min_size() {
        let r = Rect::new(1.0, 2.0, 0.0, f64::NAN).with_min_size(1.0);
        assert_eq!(r.size(), Size::new(1.0, 1.0));
        let r = Rect::new(1.0, 2.0, 30.0, 40.0).with_min_size(1.0);
        assert_eq!(r.size(), Size::new(30.0, 40.0));
    }
}
