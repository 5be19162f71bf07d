//! Angle utilities for orientation checks.

/// Computes the unsigned angle between two 2D vectors in radians.
/// Returns a value in [0, π]. Zero if the vectors are parallel
/// and pointing in the same direction; π if they are opposite.
#[inline]
pub fn angle_between(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1];
    let cross = a[0] * b[1] - a[1] * b[0];
    cross.abs().atan2(dot)
}

/// Whether `b` is closer to a quarter turn of `a` than to `a` or its opposite,
/// i.e. the angle between them is within 45° of 90°.
#[inline]
pub fn is_quarter_turn(a: &[f64; 2], b: &[f64; 2]) -> bool {
    (angle_between(a, b) - std::f64::consts::FRAC_PI_2).abs() < std::f64::consts::FRAC_PI_4
}
