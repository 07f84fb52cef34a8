#![warn(missing_docs)]
//! Module for handling optical surfaces
//!
//! A [`Surface`] is the central entity of this crate: a rotationally symmetric conic (optionally
//! aspheric) interface with a pose relative to its predecessor and the [`Material`] filling the
//! space behind it. It offers first-order transport ([`Surface::propagate_paraxial`]), exact ray
//! tracing ([`Surface::propagate`]) and pupil aiming ([`Surface::aim`]).
//!
//! Surfaces are built through the validating [`SurfaceBuilder`] and are immutable during
//! tracing. The only exceptions are the documented configuration-time mutators
//! ([`Surface::align`], [`Surface::set_distance`], [`Surface::set_direction`]) which must not be
//! called concurrently with tracing operations on the same surface.
mod aim;
mod paraxial;
mod raytrace;

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use uom::si::f64::{Angle, Length};

use crate::{
    error::{OptResult, OptraceError},
    material::Material,
    meter,
    transform::SurfaceTransform,
};

pub(crate) use raytrace::{reflect_dir, refract_dir};

/// Clear-aperture specification of a [`Surface`].
///
/// The two variants are mutually exclusive: a surface either has a physical clear-aperture
/// radius or (for object/pupil surfaces at infinity) an angular half-field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Aperture {
    /// physical clear-aperture radius
    Radius(Length),
    /// angular half-field of a surface at infinity
    Angular(Angle),
}

/// A conic optical surface with pose and material.
///
/// The surface equation in its own (normal) frame is
/// `curvature · (x² + y² + (1 + conic)·z²) − 2z = 0`, optionally augmented by even aspheric
/// sag terms. `curvature = 0` describes a flat interface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    curvature: f64,
    conic: f64,
    aspherics: Vec<f64>,
    distance: Length,
    direction: Vector3<f64>,
    angles: Option<Vector3<Angle>>,
    aperture: Option<Aperture>,
    material: Option<Material>,
    transform: SurfaceTransform,
}

/// Builder for [`Surface`].
///
/// This is the data record handed over by catalog collaborators; all parameters are validated in
/// [`SurfaceBuilder::build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceBuilder {
    curvature: f64,
    conic: f64,
    aspherics: Vec<f64>,
    distance: Length,
    direction: Vector3<f64>,
    angles: Option<Vector3<Angle>>,
    radius: Option<Length>,
    angular_radius: Option<Angle>,
    material: Option<Material>,
}

impl Default for SurfaceBuilder {
    fn default() -> Self {
        Self {
            curvature: 0.0,
            conic: 0.0,
            aspherics: Vec::new(),
            distance: meter!(0.0),
            direction: Vector3::z(),
            angles: None,
            radius: None,
            angular_radius: None,
            material: None,
        }
    }
}

impl SurfaceBuilder {
    /// Create a new builder describing a flat, untilted surface at zero distance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Set the vertex curvature (reciprocal radius of curvature, in 1/meter). 0.0 = flat.
    #[must_use]
    pub const fn curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }
    /// Set the conic constant (0 = sphere, -1 = parabola).
    #[must_use]
    pub const fn conic(mut self, conic: f64) -> Self {
        self.conic = conic;
        self
    }
    /// Set the even aspheric sag coefficients for r⁴, r⁶, … (SI units).
    #[must_use]
    pub fn aspherics(mut self, aspherics: &[f64]) -> Self {
        self.aspherics = aspherics.to_vec();
        self
    }
    /// Set the distance from the previous surface's vertex along the incoming axis.
    #[must_use]
    pub const fn distance(mut self, distance: Length) -> Self {
        self.distance = distance;
        self
    }
    /// Set the incoming-axis direction in the previous surface's frame (normalized on build).
    #[must_use]
    pub const fn direction(mut self, direction: Vector3<f64>) -> Self {
        self.direction = direction;
        self
    }
    /// Set the additional tilt angles of the surface's normal frame.
    #[must_use]
    pub const fn angles(mut self, angles: Vector3<Angle>) -> Self {
        self.angles = Some(angles);
        self
    }
    /// Set a physical clear-aperture radius.
    #[must_use]
    pub const fn radius(mut self, radius: Length) -> Self {
        self.radius = Some(radius);
        self
    }
    /// Set an angular half-field (for object/pupil surfaces at infinity).
    #[must_use]
    pub const fn angular_radius(mut self, angular_radius: Angle) -> Self {
        self.angular_radius = Some(angular_radius);
        self
    }
    /// Set the material filling the space behind the surface.
    #[must_use]
    pub const fn material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }
    /// Build the immutable [`Surface`].
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///  - curvature, conic constant or an aspheric coefficient is not finite
    ///  - both a physical radius and an angular radius are given
    ///  - the radius is <= 0.0 or not finite
    ///  - the angular radius is outside (0, pi) rad
    ///  - the pose (distance, direction, angles) is invalid (see
    ///    [`SurfaceTransform::new`])
    pub fn build(self) -> OptResult<Surface> {
        if !self.curvature.is_finite() || !self.conic.is_finite() {
            return Err(OptraceError::Configuration(
                "curvature and conic constant must be finite".into(),
            ));
        }
        if self.aspherics.iter().any(|a| !a.is_finite()) {
            return Err(OptraceError::Configuration(
                "aspheric coefficients must be finite".into(),
            ));
        }
        let aperture = match (self.radius, self.angular_radius) {
            (Some(_), Some(_)) => {
                return Err(OptraceError::Configuration(
                    "a surface cannot have both a physical and an angular radius".into(),
                ));
            }
            (Some(r), None) => {
                if r.value <= 0.0 || !r.is_finite() {
                    return Err(OptraceError::Configuration(
                        "surface radius must be >0.0 and finite".into(),
                    ));
                }
                Some(Aperture::Radius(r))
            }
            (None, Some(a)) => {
                if a.value <= 0.0 || a.value >= std::f64::consts::PI {
                    return Err(OptraceError::Configuration(
                        "angular radius must be within (0, pi) rad".into(),
                    ));
                }
                Some(Aperture::Angular(a))
            }
            (None, None) => None,
        };
        let transform = SurfaceTransform::new(self.distance, &self.direction, self.angles.as_ref())?;
        Ok(Surface {
            curvature: self.curvature,
            conic: self.conic,
            aspherics: self.aspherics,
            distance: self.distance,
            direction: self.direction.normalize(),
            angles: self.angles,
            aperture,
            material: self.material,
            transform,
        })
    }
}

impl Default for Surface {
    /// A flat, untilted surface at zero distance without aperture and material.
    fn default() -> Self {
        Self {
            curvature: 0.0,
            conic: 0.0,
            aspherics: Vec::new(),
            distance: meter!(0.0),
            direction: Vector3::z(),
            angles: None,
            aperture: None,
            material: None,
            transform: SurfaceTransform::identity(),
        }
    }
}

impl Surface {
    /// Create a new [`SurfaceBuilder`].
    #[must_use]
    pub fn builder() -> SurfaceBuilder {
        SurfaceBuilder::new()
    }
    /// Returns the vertex curvature in 1/meter.
    #[must_use]
    pub const fn curvature(&self) -> f64 {
        self.curvature
    }
    /// Returns the conic constant.
    #[must_use]
    pub const fn conic(&self) -> f64 {
        self.conic
    }
    /// Returns the even aspheric sag coefficients.
    #[must_use]
    pub fn aspherics(&self) -> &[f64] {
        &self.aspherics
    }
    /// Returns the distance from the previous surface's vertex.
    #[must_use]
    pub const fn distance(&self) -> Length {
        self.distance
    }
    /// Returns the (normalized) incoming-axis direction.
    #[must_use]
    pub const fn direction(&self) -> Vector3<f64> {
        self.direction
    }
    /// Returns the tilt angles of the normal frame, if any.
    #[must_use]
    pub const fn angles(&self) -> Option<Vector3<Angle>> {
        self.angles
    }
    /// Returns the aperture specification, if any.
    #[must_use]
    pub const fn aperture(&self) -> Option<Aperture> {
        self.aperture
    }
    /// Returns the physical clear-aperture radius, if one is set.
    #[must_use]
    pub const fn radius(&self) -> Option<Length> {
        match self.aperture {
            Some(Aperture::Radius(r)) => Some(r),
            _ => None,
        }
    }
    /// Returns the angular half-field, if one is set.
    #[must_use]
    pub const fn angular_radius(&self) -> Option<Angle> {
        match self.aperture {
            Some(Aperture::Angular(a)) => Some(a),
            _ => None,
        }
    }
    /// Returns `true` if the surface has a physical (not angular) aperture.
    #[must_use]
    pub const fn finite(&self) -> bool {
        matches!(self.aperture, Some(Aperture::Radius(_)))
    }
    /// Returns the material behind the surface, if any.
    #[must_use]
    pub const fn material(&self) -> Option<Material> {
        self.material
    }
    /// Returns the vertex offset `distance * direction` in the previous frame.
    #[must_use]
    pub fn offset(&self) -> Vector3<Length> {
        self.direction.map(|c| self.distance * c)
    }
    /// Returns the frame transform of this surface.
    #[must_use]
    pub const fn transform(&self) -> &SurfaceTransform {
        &self.transform
    }
    /// Transform a point from the previous surface's frame into this surface's axis frame.
    #[must_use]
    pub fn to_axis(&self, p: &Point3<Length>) -> Point3<Length> {
        self.transform.to_axis(p)
    }
    /// Transform a point from this surface's axis frame back into the previous frame.
    #[must_use]
    pub fn from_axis(&self, p: &Point3<Length>) -> Point3<Length> {
        self.transform.from_axis(p)
    }
    /// Rotate a direction from the previous frame into this surface's normal frame.
    #[must_use]
    pub fn to_normal(&self, u: &Vector3<f64>) -> Vector3<f64> {
        self.transform.to_normal(u)
    }
    /// Rotate a direction from this surface's normal frame into the previous frame.
    #[must_use]
    pub fn from_normal(&self, u: &Vector3<f64>) -> Vector3<f64> {
        self.transform.from_normal(u)
    }
    /// Set a new distance from the previous surface's vertex.
    ///
    /// This is a configuration-time operation; it must not be called concurrently with tracing.
    ///
    /// # Errors
    ///
    /// This function will return an error if the distance is not finite.
    pub fn set_distance(&mut self, distance: Length) -> OptResult<()> {
        let transform = SurfaceTransform::new(distance, &self.direction, self.angles.as_ref())?;
        self.distance = distance;
        self.transform = transform;
        Ok(())
    }
    /// Set a new incoming-axis direction.
    ///
    /// This is a configuration-time operation; it must not be called concurrently with tracing.
    ///
    /// # Errors
    ///
    /// This function will return an error if the direction has zero length or non-finite
    /// components.
    pub fn set_direction(&mut self, direction: &Vector3<f64>) -> OptResult<()> {
        let transform = SurfaceTransform::new(self.distance, direction, self.angles.as_ref())?;
        self.direction = direction.normalize();
        self.transform = transform;
        Ok(())
    }
    /// Point the incoming axis of this surface along the given direction.
    ///
    /// The tilt angles are cleared, so the surface sits normal to its new axis and
    /// `from_normal(excidence(mu)) == direction` holds for every index ratio `mu`. This is a
    /// one-time configuration step when assembling a system, not part of ray tracing.
    ///
    /// # Errors
    ///
    /// This function will return an error if the direction has zero length or non-finite
    /// components.
    pub fn align(&mut self, direction: &Vector3<f64>, mu: f64) -> OptResult<()> {
        let transform = SurfaceTransform::new(self.distance, direction, None)?;
        self.direction = direction.normalize();
        self.angles = None;
        self.transform = transform;
        log::debug!(
            "aligned surface axis to {:?} (index ratio {mu})",
            self.direction
        );
        Ok(())
    }
    /// Exit direction, in the normal frame, of a chief ray entering along the surface's axis.
    ///
    /// `mu` is the index ratio `n0/n1` of the transition; a negative `mu` denotes reflection.
    /// For an untilted surface this is the normal-frame axis `+z` for any `mu`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the chief ray is totally reflected at the tilted
    /// surface.
    pub fn excidence(&self, mu: f64) -> OptResult<Vector3<f64>> {
        let incidence = self.angles.map_or_else(Vector3::z, |a| {
            nalgebra::Rotation3::from_euler_angles(a.x.value, a.y.value, a.z.value) * Vector3::z()
        });
        let vertex_normal = -Vector3::z();
        if mu < 0.0 {
            Ok(reflect_dir(&incidence, &vertex_normal))
        } else {
            refract_dir(&incidence, &vertex_normal, mu)
        }
    }
    /// Surface sag z(r²), in meters, at a given squared transverse distance (in m²) from the
    /// vertex. `None` if the point is outside the conic domain.
    pub(crate) fn sag(&self, r_sq: f64) -> Option<f64> {
        let c = self.curvature;
        let s_sq = (1.0 + self.conic) * c * c * r_sq;
        let s_sq = 1.0 - s_sq;
        if s_sq < 0.0 {
            return None;
        }
        let mut z = c * r_sq / (1.0 + s_sq.sqrt());
        let mut r_pow = r_sq * r_sq;
        for a in &self.aspherics {
            z = a.mul_add(r_pow, z);
            r_pow *= r_sq;
        }
        Some(z)
    }
    /// Derivative of the sag with respect to r², in 1/meter.
    pub(crate) fn sag_slope(&self, r_sq: f64) -> Option<f64> {
        let c = self.curvature;
        let s_sq = 1.0 - (1.0 + self.conic) * c * c * r_sq;
        if s_sq <= 0.0 {
            return None;
        }
        let mut dz = c / (2.0 * s_sq.sqrt());
        let mut r_pow = r_sq;
        let mut order = 2.0;
        for a in &self.aspherics {
            dz = (order * a).mul_add(r_pow, dz);
            r_pow *= r_sq;
            order += 1.0;
        }
        Some(dz)
    }
    /// Surface sag at the given transverse point.
    ///
    /// # Errors
    ///
    /// This function will return an error if the point is outside the conic domain of the
    /// surface.
    pub fn surface_sag(&self, point: &Point2<Length>) -> OptResult<Length> {
        let r_sq = point.x.value.mul_add(point.x.value, point.y.value * point.y.value);
        self.sag(r_sq).map(|z| meter!(z)).ok_or_else(|| {
            OptraceError::Configuration("point outside the conic domain of the surface".into())
        })
    }
}
