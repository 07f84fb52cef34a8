#![warn(missing_docs)]
//! Module for handling optical rays
use nalgebra::{vector, Point3, Vector2, Vector3};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::{
    error::{OptResult, OptraceError},
    utils::tan_arcsin2,
};

///Struct that contains all information about an exact (real) optical ray
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ray {
    /// Stores the current position of the ray
    pos: Point3<Length>,
    /// Stores the current propagation direction of the ray (stored as direction cosine)
    dir: Vector3<f64>,
    /// Wavelength of the ray
    wvl: Length,
    /// optical path length of the ray
    path_length: Length,
    /// refractive index of the medium this ray is propagating in. Negative after a mirror.
    refractive_index: f64,
}
impl Ray {
    /// Creates a new [`Ray`].
    ///
    /// The direction vector is normalized. The direction is thus stored as (`direction cosine`)[`https://en.wikipedia.org/wiki/Direction_cosine`]
    ///
    /// # Errors
    /// This function returns an error if
    ///  - the given wavelength is <= 0.0, `NaN` or +inf
    ///  - the direction vector has a zero length or non-finite components
    pub fn new(position: Point3<Length>, direction: Vector3<f64>, wave_length: Length) -> OptResult<Self> {
        if wave_length.is_zero() || wave_length.is_sign_negative() || !wave_length.is_finite() {
            return Err(OptraceError::Other("wavelength must be >0".into()));
        }
        if direction.norm().is_zero() || !direction.norm().is_finite() {
            return Err(OptraceError::Other("length of direction must be >0".into()));
        }
        Ok(Self {
            pos: position,
            dir: direction.normalize(),
            wvl: wave_length,
            path_length: Length::zero(),
            refractive_index: 1.0,
        })
    }
    /// Create a new collimated ray, collinear with the z axis (optical axis).
    ///
    /// # Errors
    /// This function returns an error if the given wavelength is <= 0.0, `NaN` or +inf
    pub fn new_collimated(position: Point3<Length>, wave_length: Length) -> OptResult<Self> {
        Self::new(position, Vector3::z(), wave_length)
    }
    /// Returns the position of this [`Ray`].
    #[must_use]
    pub fn position(&self) -> Point3<Length> {
        self.pos
    }
    /// Returns the direction of this [`Ray`] as a normalized direction cosine vector.
    #[must_use]
    pub const fn direction(&self) -> Vector3<f64> {
        self.dir
    }
    /// Sets the direction of this [`Ray`]. The given vector is normalized.
    ///
    /// # Errors
    ///
    /// This function will return an error if an invalid direction vector is provided.
    pub fn set_direction(&mut self, dir: Vector3<f64>) -> OptResult<()> {
        if dir.norm().is_zero() || !dir.norm().is_finite() {
            return Err(OptraceError::Other("length of direction must be >0".into()));
        }
        self.dir = dir.normalize();
        Ok(())
    }
    /// Returns the wavelength of this [`Ray`].
    #[must_use]
    pub fn wavelength(&self) -> Length {
        self.wvl
    }
    /// Returns the accumulated optical path length of this [`Ray`].
    #[must_use]
    pub fn path_length(&self) -> Length {
        self.path_length
    }
    /// Returns the refractive index of the medium this [`Ray`] currently propagates in.
    #[must_use]
    pub const fn refractive_index(&self) -> f64 {
        self.refractive_index
    }
    /// Sets the refractive index of this [`Ray`].
    ///
    /// A negative index denotes a ray travelling backwards after reflection on a mirror.
    ///
    /// # Errors
    ///
    /// This function will return an error if the magnitude of the given refractive index is <1.0
    /// or not finite.
    pub fn set_refractive_index(&mut self, refractive_index: f64) -> OptResult<()> {
        if refractive_index.abs() < 1.0 || !refractive_index.is_finite() {
            return Err(OptraceError::Other(
                "magnitude of refractive index must be >=1.0 and finite".into(),
            ));
        }
        self.refractive_index = refractive_index;
        Ok(())
    }
    /// Returns the transverse slope `(dx/dz, dy/dz)` of this [`Ray`] with respect to the
    /// optical axis.
    ///
    /// This is the quantity compared against the paraxial slope `u` in the small-angle limit.
    #[must_use]
    pub fn transverse_slope(&self) -> Vector2<f64> {
        tan_arcsin2(Vector2::new(self.dir.x, self.dir.y) / self.dir.norm())
    }
    /// Propagate a ray freely along its direction by the given geometric length.
    ///
    /// This function also respects the refractive index stored in the ray while calculating the
    /// optical path length.
    ///
    /// # Errors
    /// This function returns an error if the propagation length is not finite.
    pub fn propagate(&mut self, length: Length) -> OptResult<()> {
        if !length.is_finite() {
            return Err(OptraceError::Other(
                "propagation length must be finite".into(),
            ));
        }
        self.pos += vector![
            length * self.dir.x,
            length * self.dir.y,
            length * self.dir.z
        ];
        self.path_length += length * self.refractive_index;
        Ok(())
    }
    /// Construct a ray from all parts. The direction is normalized, nothing else is validated.
    pub(crate) fn from_parts(
        pos: Point3<Length>,
        dir: Vector3<f64>,
        wvl: Length,
        path_length: Length,
        refractive_index: f64,
    ) -> Self {
        Self {
            pos,
            dir: dir.normalize(),
            wvl,
            path_length,
            refractive_index,
        }
    }
}
