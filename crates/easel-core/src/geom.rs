//! Affine geometry: 2D points and 2×3 transform matrices.
//!
//! Every coordinate plane in the scene (object space, group space, device
//! space) is related to its neighbors by a `Matrix`. Multiplication follows
//! the standard transform-stack convention: `a.multiply(&b)` produces the
//! matrix that applies `b` first, then `a`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Comparison tolerance for geometry tests and degenerate-case guards.
pub const EPSILON: f64 = 1e-9;

// ─── Point ───────────────────────────────────────────────────────────────

/// An immutable (x, y) pair in some coordinate plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotate about the plane origin by `rad` radians (counter-clockwise in
    /// a y-down plane reads as clockwise on screen).
    pub fn rotate(self, rad: f64) -> Self {
        let (sin, cos) = rad.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Rotate about an arbitrary pivot.
    pub fn rotate_about(self, rad: f64, pivot: Point) -> Self {
        (self - pivot).rotate(rad) + pivot
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Point, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn min(self, other: Point) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
        }
    }

    pub fn max(self, other: Point) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).hypot()
    }

    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn midpoint(self, other: Point) -> Self {
        self.lerp(other, 0.5)
    }

    /// Component-wise product, used for origin-fraction offsets.
    pub fn scale_by(self, other: Point) -> Self {
        Self {
            x: self.x * other.x,
            y: self.y * other.y,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> kurbo::Point {
        kurbo::Point::new(p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ─── Matrix ──────────────────────────────────────────────────────────────

/// A 2D affine transform stored as six scalars:
///
/// ```text
/// | a  c  e |
/// | b  d  f |
/// | 0  0  1 |
/// ```
///
/// A point maps as `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

/// Raised by [`Matrix::invert`] when the determinant is zero. Scale clamping
/// in the node model keeps this out of normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingularMatrix;

impl fmt::Display for SingularMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matrix is singular and cannot be inverted")
    }
}

impl std::error::Error for SingularMatrix {}

/// The scalar components recovered by [`Matrix::decompose`] and consumed by
/// [`Matrix::compose`]. Angles are degrees. `skew_y` always decomposes to
/// zero: it is applied before `skew_x` during composition, so its effect is
/// folded into the other four components on the way back out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposed {
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for Decomposed {
    fn default() -> Self {
        Self {
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Rotation by `deg` degrees about the plane origin.
    pub fn rotation(deg: f64) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Horizontal shear: x grows with y by `tan(deg)`.
    pub fn skew_x(deg: f64) -> Self {
        Self::new(1.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    /// Vertical shear: y grows with x by `tan(deg)`.
    pub fn skew_y(deg: f64) -> Self {
        Self::new(1.0, deg.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix product `self · other`. Applying the result is equivalent to
    /// applying `other` first and `self` second.
    #[must_use]
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Result<Matrix, SingularMatrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(SingularMatrix);
        }
        Ok(Matrix {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Transform ignoring translation, for direction/size vectors.
    pub fn transform_vector(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y,
            y: self.b * p.x + self.d * p.y,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::IDENTITY
    }

    /// Recover angle/scale/skew/translation. See [`Decomposed`] for the
    /// `skew_y = 0` convention.
    pub fn decompose(&self) -> Decomposed {
        let denom = self.a * self.a + self.b * self.b;
        let scale_x = denom.sqrt();
        Decomposed {
            angle: self.b.atan2(self.a).to_degrees(),
            scale_x,
            scale_y: if scale_x != 0.0 {
                self.determinant() / scale_x
            } else {
                0.0
            },
            skew_x: (self.a * self.c + self.b * self.d).atan2(denom).to_degrees(),
            skew_y: 0.0,
            translate_x: self.e,
            translate_y: self.f,
        }
    }

    /// Build a matrix from scalar components: translation, then rotation,
    /// then the dimensional part. Within the dimensional part `skew_y` is
    /// applied first, then `skew_x`, then scale — the mirror of
    /// [`Matrix::decompose`].
    pub fn compose(parts: &Decomposed) -> Matrix {
        let mut m = Matrix::translation(parts.translate_x, parts.translate_y);
        if parts.angle != 0.0 {
            m = m.multiply(&Matrix::rotation(parts.angle));
        }
        let dims = Self::dimensional(parts.scale_x, parts.scale_y, parts.skew_x, parts.skew_y);
        if !dims.is_identity() {
            m = m.multiply(&dims);
        }
        m
    }

    /// The scale/skew-only part of a composed matrix, with no rotation or
    /// translation. Used stand-alone to measure sheared bounding boxes.
    pub fn dimensional(scale_x: f64, scale_y: f64, skew_x: f64, skew_y: f64) -> Matrix {
        let mut m = Matrix::scaling(scale_x, scale_y);
        if skew_x != 0.0 {
            m = m.multiply(&Matrix::skew_x(skew_x));
        }
        if skew_y != 0.0 {
            m = m.multiply(&Matrix::skew_y(skew_y));
        }
        m
    }

    pub fn approx_eq(&self, other: &Matrix, tol: f64) -> bool {
        (self.a - other.a).abs() <= tol
            && (self.b - other.b).abs() <= tol
            && (self.c - other.c).abs() <= tol
            && (self.d - other.d).abs() <= tol
            && (self.e - other.e).abs() <= tol
            && (self.f - other.f).abs() <= tol
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl From<Matrix> for kurbo::Affine {
    fn from(m: Matrix) -> kurbo::Affine {
        kurbo::Affine::new([m.a, m.b, m.c, m.d, m.e, m.f])
    }
}

/// Re-express a transform given against plane `from` as the equivalent
/// transform against plane `to`: `to⁻¹ · from`. Used whenever a node moves
/// between parent planes without visually moving on screen.
pub fn plane_change(from: &Matrix, to: &Matrix) -> Result<Matrix, SingularMatrix> {
    Ok(to.invert()?.multiply(from))
}

/// Replace a non-finite scalar with a caller-supplied default before it can
/// enter a matrix cache.
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, msg: &str) {
        assert!((a - b).abs() < 1e-9, "{msg}: {a} vs {b}");
    }

    #[test]
    fn point_arithmetic() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(p + Point::new(1.0, 1.0), Point::new(4.0, 5.0));
        assert_eq!(p - Point::new(3.0, 4.0), Point::ZERO);
        assert_eq!(p * 2.0, Point::new(6.0, 8.0));
        assert_close(p.hypot(), 5.0, "hypot");
        assert_eq!(
            Point::new(0.0, 0.0).lerp(Point::new(10.0, 20.0), 0.5),
            Point::new(5.0, 10.0)
        );
    }

    #[test]
    fn point_rotation_quarter_turn() {
        let p = Point::new(1.0, 0.0).rotate(std::f64::consts::FRAC_PI_2);
        assert_close(p.x, 0.0, "x after 90°");
        assert_close(p.y, 1.0, "y after 90°");

        let q = Point::new(2.0, 1.0).rotate_about(std::f64::consts::PI, Point::new(1.0, 1.0));
        assert_close(q.x, 0.0, "x after 180° about pivot");
        assert_close(q.y, 1.0, "y after 180° about pivot");
    }

    #[test]
    fn multiply_applies_right_operand_first() {
        let translate = Matrix::translation(10.0, 0.0);
        let rotate = Matrix::rotation(90.0);
        // rotate ∘ translate: the point is translated, then rotated.
        let m = rotate.multiply(&translate);
        let p = m.transform_point(Point::ZERO);
        assert_close(p.x, 0.0, "x");
        assert_close(p.y, 10.0, "y");
    }

    #[test]
    fn inverse_times_original_is_identity() {
        let cases = [
            Matrix::translation(5.0, -3.0),
            Matrix::rotation(37.0),
            Matrix::scaling(2.0, 0.5),
            Matrix::compose(&Decomposed {
                angle: 12.0,
                scale_x: 1.5,
                scale_y: 0.75,
                skew_x: 20.0,
                skew_y: 0.0,
                translate_x: 40.0,
                translate_y: -7.0,
            }),
        ];
        for m in cases {
            let inv = m.invert().expect("invertible");
            assert!(
                inv.multiply(&m).approx_eq(&Matrix::IDENTITY, 1e-9),
                "A⁻¹·A should be identity for {m:?}"
            );
        }
    }

    #[test]
    fn singular_matrix_rejected() {
        let m = Matrix::scaling(0.0, 1.0);
        assert_eq!(m.invert(), Err(SingularMatrix));
    }

    #[test]
    fn decompose_compose_roundtrip() {
        let parts = Decomposed {
            angle: 33.0,
            scale_x: 2.0,
            scale_y: 0.5,
            skew_x: 15.0,
            skew_y: 0.0,
            translate_x: 100.0,
            translate_y: 50.0,
        };
        let back = Matrix::compose(&parts).decompose();
        assert_close(back.angle, parts.angle, "angle");
        assert_close(back.scale_x, parts.scale_x, "scale_x");
        assert_close(back.scale_y, parts.scale_y, "scale_y");
        assert_close(back.skew_x, parts.skew_x, "skew_x");
        assert_close(back.translate_x, parts.translate_x, "translate_x");
        assert_close(back.translate_y, parts.translate_y, "translate_y");
    }

    #[test]
    fn skew_y_folds_into_other_components() {
        // With a non-zero skew_y the recovered parts differ from the input,
        // but re-composing them must reproduce the same matrix.
        let parts = Decomposed {
            angle: 10.0,
            scale_x: 1.2,
            scale_y: 0.9,
            skew_x: 5.0,
            skew_y: 25.0,
            translate_x: 0.0,
            translate_y: 0.0,
        };
        let m = Matrix::compose(&parts);
        let folded = m.decompose();
        assert_eq!(folded.skew_y, 0.0);
        assert!(
            Matrix::compose(&folded).approx_eq(&m, 1e-9),
            "re-composed fold should equal the original matrix"
        );
    }

    #[test]
    fn plane_change_preserves_world_position() {
        let from = Matrix::compose(&Decomposed {
            angle: 45.0,
            translate_x: 10.0,
            translate_y: 20.0,
            ..Decomposed::default()
        });
        let to = Matrix::compose(&Decomposed {
            angle: -30.0,
            scale_x: 2.0,
            scale_y: 2.0,
            translate_x: -5.0,
            translate_y: 0.0,
            ..Decomposed::default()
        });
        let rel = plane_change(&from, &to).unwrap();
        // A point expressed against `from` lands where `to · rel` puts it.
        let p = Point::new(3.0, 7.0);
        let world_direct = from.transform_point(p);
        let world_via_plane = to.multiply(&rel).transform_point(p);
        assert_close(world_direct.x, world_via_plane.x, "x");
        assert_close(world_direct.y, world_via_plane.y, "y");
    }

    #[test]
    fn finite_or_falls_back() {
        assert_eq!(finite_or(1.5, 0.0), 1.5);
        assert_eq!(finite_or(f64::NAN, 2.0), 2.0);
        assert_eq!(finite_or(f64::INFINITY, -1.0), -1.0);
    }
}
