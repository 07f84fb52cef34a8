//! Small numeric helpers for slope / direction-cosine conversions.
use nalgebra::Vector2;

/// Convert a transverse slope `tan(angle)` into the corresponding direction sine `sin(angle)`.
#[must_use]
pub fn sin_arctan(slope: f64) -> f64 {
    slope / slope.mul_add(slope, 1.0).sqrt()
}

/// Convert a direction sine `sin(angle)` into the corresponding transverse slope `tan(angle)`.
///
/// Only defined for |sine| < 1. Values outside return a non-finite number which the
/// caller has to handle.
#[must_use]
pub fn tan_arcsin(sine: f64) -> f64 {
    sine / sine.mul_add(-sine, 1.0).sqrt()
}

/// Convert a 2D transverse slope vector into the transverse part of the unit direction vector.
///
/// The z component of the resulting direction is `sqrt(1 - |result|^2)`.
#[must_use]
pub fn sin_arctan2(slope: Vector2<f64>) -> Vector2<f64> {
    slope / (1.0 + slope.norm_squared()).sqrt()
}

/// Convert the transverse part of a unit direction vector into a 2D slope vector.
#[must_use]
pub fn tan_arcsin2(sine: Vector2<f64>) -> Vector2<f64> {
    sine / (1.0 - sine.norm_squared()).sqrt()
}
