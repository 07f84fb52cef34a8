#![warn(missing_docs)]
//! Module for handling the optical material following a surface.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::error::{OptResult, OptraceError};

/// The optical material filling the space behind a surface.
///
/// A material is an immutable value object. Propagation code branches explicitly on the
/// [`Material::Mirror`] tag instead of carrying a literal negative refractive index. This keeps
/// the sign convention for reflected rays (`n1 = -n0`) in one place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// ordinary dielectric described by its design-wavelength index and Abbe number
    Model {
        /// refractive index at the design wavelength
        nd: f64,
        /// Abbe number. May be `+inf` for a dispersion-free model.
        vd: f64,
    },
    /// ideal mirror
    Mirror,
}

/// Shared mirror marker. Surfaces may all refer to this one value.
pub const MIRROR: Material = Material::Mirror;

impl Material {
    /// Create a new dielectric model material.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///  - the given refractive index `nd` is <1.0, `NaN` or infinite
    ///  - the given Abbe number `vd` is <=0.0 or `NaN` (`+inf` is allowed and denotes a
    ///    dispersion-free material)
    pub fn model(nd: f64, vd: f64) -> OptResult<Self> {
        if nd < 1.0 || !nd.is_finite() {
            return Err(OptraceError::Material(
                "refractive index must be >=1.0 and finite".into(),
            ));
        }
        if vd <= 0.0 || vd.is_nan() {
            return Err(OptraceError::Material("Abbe number must be >0.0".into()));
        }
        Ok(Self::Model { nd, vd })
    }
    /// Returns `true` if this material is the mirror marker.
    #[must_use]
    pub const fn is_mirror(&self) -> bool {
        matches!(self, Self::Mirror)
    }
    /// Get the refractive index of this [`Material`] for the given wavelength.
    ///
    /// The wavelength parameter is the seam for dispersion models; the plain model material
    /// returns its design-wavelength constant `nd`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the material is a mirror, which does not carry a
    /// refractive index (reflection is signalled by the tag instead).
    pub fn refractive_index(&self, _wavelength: Length) -> OptResult<f64> {
        match self {
            Self::Model { nd, .. } => Ok(*nd),
            Self::Mirror => Err(OptraceError::Material(
                "a mirror does not have a refractive index".into(),
            )),
        }
    }
    /// Returns the Abbe number of a model material.
    #[must_use]
    pub const fn abbe_number(&self) -> Option<f64> {
        match self {
            Self::Model { vd, .. } => Some(*vd),
            Self::Mirror => None,
        }
    }
}

impl Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model { nd, vd } => write!(f, "model material (nd={nd}, vd={vd})"),
            Self::Mirror => write!(f, "mirror"),
        }
    }
}
