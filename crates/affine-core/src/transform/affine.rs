//! 2D affine matrix.
//!
//! A point `(x, y)` maps to
//!
//! ```text
//! X = a * x + b * y + tx
//! Y = c * x + d * y + ty
//! ```
//!
//! Coordinates are y-down, so [`Affine2::rotation_degrees`] with a positive
//! angle turns clockwise on screen.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::params::TransformParameters;

/// Determinants smaller than this are treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// `X = x + shx * y`, `Y = shy * x + y`.
    pub fn shear(shx: f64, shy: f64) -> Self {
        Self {
            b: shx,
            c: shy,
            ..Self::IDENTITY
        }
    }

    pub fn rotation_degrees(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
            ..Self::IDENTITY
        }
    }

    /// The linear part of the parameters: shear, then rotation, then scale.
    pub fn linear_from_parameters(params: &TransformParameters) -> Self {
        Self::shear(params.shear_x(), params.shear_y())
            .then(Self::rotation_degrees(params.rotation()))
            .then(Self::scale(params.scale_x(), params.scale_y()))
    }

    /// Full transform taking `src_center` to `dst_center`, with the linear
    /// part applied around it.
    pub fn from_parameters(
        params: &TransformParameters,
        src_center: Point,
        dst_center: Point,
    ) -> Self {
        Self::translation(-src_center.x, -src_center.y)
            .then(Self::linear_from_parameters(params))
            .then(Self::translation(dst_center.x, dst_center.y))
    }

    /// Apply `self` first, then `next`.
    pub fn then(self, next: Affine2) -> Affine2 {
        Affine2 {
            a: next.a * self.a + next.b * self.c,
            b: next.a * self.b + next.b * self.d,
            c: next.c * self.a + next.d * self.c,
            d: next.c * self.b + next.d * self.d,
            tx: next.a * self.tx + next.b * self.ty + next.tx,
            ty: next.c * self.tx + next.d * self.ty + next.ty,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Affine2> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Affine2 {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }

    #[inline]
    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
            "expected ({}, {}), got ({}, {})",
            x,
            y,
            p.x,
            p.y
        );
    }

    #[test]
    fn test_rotation_is_clockwise_on_screen() {
        let r = Affine2::rotation_degrees(90.0);
        assert_point_eq(r.transform_point(Point::new(1.0, 0.0)), 0.0, 1.0);
        assert_point_eq(r.transform_point(Point::new(0.0, 1.0)), -1.0, 0.0);
    }

    #[test]
    fn test_zero_rotation_is_exact_identity() {
        assert_eq!(Affine2::rotation_degrees(0.0), Affine2::IDENTITY);
    }

    #[test]
    fn test_then_applies_in_order() {
        // Translate then scale differs from scale then translate.
        let t = Affine2::translation(1.0, 0.0);
        let s = Affine2::scale(2.0, 2.0);
        assert_point_eq(t.then(s).transform_point(Point::new(1.0, 1.0)), 4.0, 2.0);
        assert_point_eq(s.then(t).transform_point(Point::new(1.0, 1.0)), 3.0, 2.0);
    }

    #[test]
    fn test_shear() {
        let sh = Affine2::shear(0.5, 0.0);
        assert_point_eq(sh.transform_point(Point::new(0.0, 2.0)), 1.0, 2.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut params = TransformParameters::default();
        params.set_scale_x(1.5);
        params.set_shear_y(0.2);
        params.set_rotation(33.0);
        let m = Affine2::from_parameters(&params, Point::new(40.0, 30.0), Point::new(55.0, 12.0));
        let inv = m.inverse().unwrap();
        let p = Point::new(7.0, -3.0);
        let back = inv.transform_point(m.transform_point(p));
        assert_point_eq(back, 7.0, -3.0);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Affine2::shear(1.0, 1.0).inverse().is_none());
        assert!(Affine2::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_source_center_maps_to_destination_center() {
        let mut params = TransformParameters::default();
        params.set_rotation(-25.0);
        params.set_scale_x(0.5);
        let m = Affine2::from_parameters(&params, Point::new(8.0, 4.5), Point::new(20.0, 11.0));
        assert_point_eq(m.transform_point(Point::new(8.0, 4.5)), 20.0, 11.0);
    }

    #[test]
    fn test_center_is_fixed_point() {
        let mut params = TransformParameters::default();
        params.set_rotation(71.0);
        params.set_scale_y(3.0);
        params.set_shear_x(-0.4);
        let center = Point::new(12.5, 80.0);
        let m = Affine2::from_parameters(&params, center, center);
        assert_point_eq(m.transform_point(center), 12.5, 80.0);
    }
}
