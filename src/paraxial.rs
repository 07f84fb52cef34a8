#![warn(missing_docs)]
//! Module for handling paraxial (first order) rays
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::error::{OptResult, OptraceError};

/// A linearized ray state used for first-order (matrix) optics.
///
/// The state consists of the 2D transverse position `y` and the 2D transverse slope `u`
/// (`tan` of the ray angle in the current medium). The two transverse axes are decoupled;
/// a surface acts on each of them independently. The refractive index of the current medium
/// is not part of the state but threaded alongside by
/// [`Surface::propagate_paraxial`](crate::surface::Surface::propagate_paraxial).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParaxialRay {
    y: Point2<Length>,
    u: Vector2<f64>,
}
impl ParaxialRay {
    /// Create a new [`ParaxialRay`] from a transverse position and slope.
    ///
    /// # Errors
    ///
    /// This function will return an error if any position or slope component is not finite.
    pub fn new(y: Point2<Length>, u: Vector2<f64>) -> OptResult<Self> {
        if !y.x.is_finite() || !y.y.is_finite() || !u.x.is_finite() || !u.y.is_finite() {
            return Err(OptraceError::Configuration(
                "paraxial ray position and slope must be finite".into(),
            ));
        }
        Ok(Self { y, u })
    }
    /// Create a ray on the optical axis with zero slope.
    #[must_use]
    pub fn on_axis() -> Self {
        Self {
            y: Point2::origin(),
            u: Vector2::zeros(),
        }
    }
    /// Returns the transverse position of this [`ParaxialRay`].
    #[must_use]
    pub const fn y(&self) -> Point2<Length> {
        self.y
    }
    /// Returns the transverse slope of this [`ParaxialRay`].
    #[must_use]
    pub const fn u(&self) -> Vector2<f64> {
        self.u
    }
}
