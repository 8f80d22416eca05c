//! Angle utilities for line orientation tests.

/// Orientation difference between two 2D vectors, treating antipodal
/// directions as equivalent. Returns a value in [0, π/2] radians.
///
/// The result is symmetric in its arguments and unchanged when either vector
/// is negated, which makes it suitable for undirected line segments.
#[inline]
pub fn angle_between_dirless(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1];
    let na = a[0].hypot(a[1]).max(1e-12);
    let nb = b[0].hypot(b[1]).max(1e-12);
    (dot / (na * nb)).abs().clamp(0.0, 1.0).acos()
}
