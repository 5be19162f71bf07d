//! Helpers for homogeneous 2D points and lines.
//!
//! Points are `(x, y, 1)` up to scale; a line `(a, b, c)` holds the points with
//! `a·x + b·y + c = 0`. The line through two points and the intersection of two
//! lines are both the cross product of their vectors.
use nalgebra::Vector3;

/// Components below this magnitude are treated as zero.
pub const NULL_EPS: f64 = 1e-10;

/// Homogeneous point from pixel coordinates.
#[inline]
pub fn point(x: f64, y: f64) -> Vector3<f64> {
    Vector3::new(x, y, 1.0)
}

/// Scale to unit Euclidean length. A zero vector is returned unchanged.
#[inline]
pub fn normalized(v: &Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 0.0 {
        v / n
    } else {
        *v
    }
}

/// Scale a line so that `a² + b² = 1`, turning `|L·P|` into a pixel distance.
#[inline]
pub fn line_normalized(l: &Vector3<f64>) -> Vector3<f64> {
    let n = (l[0] * l[0] + l[1] * l[1]).sqrt();
    if n > 0.0 {
        l / n
    } else {
        *l
    }
}

/// Cross product followed by unit normalization.
#[inline]
pub fn cross_normalized(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    normalized(&a.cross(b))
}

/// True when all components vanish, e.g. the cross product of identical lines.
#[inline]
pub fn is_null(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.abs() < NULL_EPS)
}

/// Dehomogenize, returning `None` for points at infinity.
#[inline]
pub fn to_pixel(v: &Vector3<f64>) -> Option<[f64; 2]> {
    if v[2] == 0.0 {
        return None;
    }
    let x = v[0] / v[2];
    let y = v[1] / v[2];
    (x.is_finite() && y.is_finite()).then_some([x, y])
}

/// Line through two pixel positions, normalized with [`line_normalized`].
#[inline]
pub fn line_through(p1: [f64; 2], p2: [f64; 2]) -> Vector3<f64> {
    let l = cross_normalized(&point(p1[0], p1[1]), &point(p2[0], p2[1]));
    line_normalized(&l)
}
