#![warn(missing_docs)]
//! Module for handling the coordinate frames attached to an optical surface
//!
//! Each surface carries two local frames: the *axis frame* aligned with the incoming chief-ray
//! axis (rotated so that +z maps onto the surface `direction` and translated by the surface
//! offset with respect to the previous surface) and the *normal frame* in which the surface
//! equation `z = sag(r²)` is evaluated. The normal frame is the axis frame rotated further by
//! the tilt given by the surface `angles`.
//!
//! [`SurfaceTransform::to_axis`]/[`SurfaceTransform::from_axis`] convert points between the
//! previous surface's frame and the axis frame (alignment rotation plus offset translation);
//! [`SurfaceTransform::to_normal`]/[`SurfaceTransform::from_normal`] convert directions between
//! the previous frame and the normal frame (alignment and tilt rotation, no translation). The
//! pairs are exact mutual inverses.
use approx::relative_eq;
use nalgebra::{Point3, Rotation3, Vector3};
use uom::si::f64::{Angle, Length};

use crate::{
    error::{OptResult, OptraceError},
    meter,
    ray::Ray,
};

/// Frame transforms of a surface, built from its pose `(distance, direction, angles)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTransform {
    /// offset of the surface vertex in the previous frame (meters)
    offset: Vector3<f64>,
    /// rotation mapping the default optical axis +z onto the surface direction
    align: Rotation3<f64>,
    /// additional tilt rotation taking the normal frame into the axis frame
    tilt: Rotation3<f64>,
}

impl SurfaceTransform {
    /// Create a new [`SurfaceTransform`] from a surface pose.
    ///
    /// The offset is `distance * direction`. The alignment rotation maps +z onto `direction`
    /// (identity for the default axis, a half turn for an antiparallel direction). The tilt
    /// rotation is built from `angles = (a, b, c)` such that
    /// [`SurfaceTransform::from_normal`] applies `Rx(-a)·Ry(-b)·Rz(-c)` on top of the
    /// alignment.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///  - the distance is not finite
    ///  - the direction vector has a zero length or non-finite components
    ///  - any tilt angle is not finite
    pub fn new(
        distance: Length,
        direction: &Vector3<f64>,
        angles: Option<&Vector3<Angle>>,
    ) -> OptResult<Self> {
        if !distance.is_finite() {
            return Err(OptraceError::Configuration(
                "surface distance must be finite".into(),
            ));
        }
        let norm = direction.norm();
        if relative_eq!(norm, 0.0) || !norm.is_finite() {
            return Err(OptraceError::Configuration(
                "surface direction must have a non-zero, finite length".into(),
            ));
        }
        let dir = direction / norm;
        let align = Rotation3::rotation_between(&Vector3::z(), &dir).unwrap_or_else(|| {
            // direction is antiparallel to +z, half turn about x
            Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
        });
        let tilt = if let Some(angles) = angles {
            if !angles.x.is_finite() || !angles.y.is_finite() || !angles.z.is_finite() {
                return Err(OptraceError::Configuration(
                    "surface tilt angles must be finite".into(),
                ));
            }
            Rotation3::from_euler_angles(angles.x.value, angles.y.value, angles.z.value).inverse()
        } else {
            Rotation3::identity()
        };
        Ok(Self {
            offset: dir * distance.value,
            align,
            tilt,
        })
    }
    /// Create the identity transform (zero offset, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            offset: Vector3::zeros(),
            align: Rotation3::identity(),
            tilt: Rotation3::identity(),
        }
    }
    /// Returns the surface vertex offset `distance * direction` in the previous frame.
    #[must_use]
    pub fn offset(&self) -> Vector3<Length> {
        self.offset.map(|c| meter!(c))
    }
    /// Returns the rotation mapping the default optical axis +z onto the surface direction.
    #[must_use]
    pub const fn axis_rotation(&self) -> &Rotation3<f64> {
        &self.align
    }
    /// Returns the tilt rotation taking the normal frame into the axis frame.
    #[must_use]
    pub const fn tilt_rotation(&self) -> &Rotation3<f64> {
        &self.tilt
    }
    /// Transform a point from the previous frame into the surface's axis frame.
    #[must_use]
    pub fn to_axis(&self, p: &Point3<Length>) -> Point3<Length> {
        let p = self
            .align
            .inverse_transform_vector(&(p.map(|c| c.value).coords - self.offset));
        meter!(p.x, p.y, p.z)
    }
    /// Transform a point from the surface's axis frame back into the previous frame.
    #[must_use]
    pub fn from_axis(&self, p: &Point3<Length>) -> Point3<Length> {
        let p = self.align * p.map(|c| c.value).coords + self.offset;
        meter!(p.x, p.y, p.z)
    }
    /// Rotate a direction from the previous frame into the surface's normal frame.
    #[must_use]
    pub fn to_normal(&self, u: &Vector3<f64>) -> Vector3<f64> {
        self.tilt
            .inverse_transform_vector(&self.align.inverse_transform_vector(u))
    }
    /// Rotate a direction from the surface's normal frame into the previous frame.
    #[must_use]
    pub fn from_normal(&self, u: &Vector3<f64>) -> Vector3<f64> {
        self.align * (self.tilt * u)
    }
    /// Rotate a position/direction pair from the previous frame into the normal frame
    /// (rotation only, no translation).
    #[must_use]
    pub fn to_normal_with_dir(
        &self,
        x: &Vector3<f64>,
        u: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        (self.to_normal(x), self.to_normal(u))
    }
    /// Rotate a position/direction pair from the normal frame back into the previous frame.
    #[must_use]
    pub fn from_normal_with_dir(
        &self,
        x: &Vector3<f64>,
        u: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        (self.from_normal(x), self.from_normal(u))
    }
    /// Transform a position/direction pair from the previous frame into the axis frame.
    ///
    /// The position is translated and rotated, the direction only rotated.
    #[must_use]
    pub fn to_axis_with_dir(
        &self,
        p: &Point3<Length>,
        u: &Vector3<f64>,
    ) -> (Point3<Length>, Vector3<f64>) {
        (self.to_axis(p), self.align.inverse_transform_vector(u))
    }
    /// Transform a position/direction pair from the axis frame into the previous frame.
    #[must_use]
    pub fn from_axis_with_dir(
        &self,
        p: &Point3<Length>,
        u: &Vector3<f64>,
    ) -> (Point3<Length>, Vector3<f64>) {
        (self.from_axis(p), self.align * u)
    }
    /// Transform a [`Ray`] from the previous frame into the surface's axis frame.
    #[must_use]
    pub fn to_axis_ray(&self, ray: &Ray) -> Ray {
        let (pos, dir) = self.to_axis_with_dir(&ray.position(), &ray.direction());
        Ray::from_parts(
            pos,
            dir,
            ray.wavelength(),
            ray.path_length(),
            ray.refractive_index(),
        )
    }
    /// Transform a [`Ray`] from the surface's axis frame back into the previous frame.
    #[must_use]
    pub fn from_axis_ray(&self, ray: &Ray) -> Ray {
        let (pos, dir) = self.from_axis_with_dir(&ray.position(), &ray.direction());
        Ray::from_parts(
            pos,
            dir,
            ray.wavelength(),
            ray.path_length(),
            ray.refractive_index(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::radian;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn tilted_transform() -> SurfaceTransform {
        SurfaceTransform::new(
            meter!(2.0),
            &Vector3::new(1.0, 3.0, 4.0),
            Some(&radian!(0.3, 0.2, 0.1).coords),
        )
        .unwrap()
    }
    #[test]
    fn new() {
        assert!(SurfaceTransform::new(meter!(f64::NAN), &Vector3::z(), None).is_err());
        assert!(SurfaceTransform::new(meter!(f64::INFINITY), &Vector3::z(), None).is_err());
        assert!(SurfaceTransform::new(meter!(1.0), &Vector3::zeros(), None).is_err());
        assert!(
            SurfaceTransform::new(meter!(1.0), &Vector3::new(0.0, f64::NAN, 1.0), None).is_err()
        );
        assert!(SurfaceTransform::new(
            meter!(1.0),
            &Vector3::z(),
            Some(&radian!(f64::NAN, 0.0, 0.0).coords)
        )
        .is_err());
        assert!(SurfaceTransform::new(meter!(0.0), &Vector3::z(), None).is_ok());
    }
    #[test]
    fn offset() {
        let t = tilted_transform();
        let d = Vector3::new(1.0, 3.0, 4.0).normalize() * 2.0;
        let offset = t.offset();
        assert_relative_eq!(offset.x.value, d.x);
        assert_relative_eq!(offset.y.value, d.y);
        assert_relative_eq!(offset.z.value, d.z);
    }
    #[test]
    fn from_to_axis() {
        let t = tilted_transform();
        let mut rng = rand::rng();
        for _ in 0..10 {
            let p = meter!(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0)
            );
            let p2 = t.from_axis(&t.to_axis(&p));
            assert_relative_eq!(p.x.value, p2.x.value, epsilon = 1e-12);
            assert_relative_eq!(p.y.value, p2.y.value, epsilon = 1e-12);
            assert_relative_eq!(p.z.value, p2.z.value, epsilon = 1e-12);
        }
    }
    #[test]
    fn from_to_normal() {
        let t = tilted_transform();
        let mut rng = rand::rng();
        for _ in 0..10 {
            let x = Vector3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            let u = Vector3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            assert_relative_eq!(t.from_normal(&t.to_normal(&u)), u, epsilon = 1e-12);
            assert_relative_eq!(t.to_normal(&t.from_normal(&u)), u, epsilon = 1e-12);
            let (x1, u1) = t.to_normal_with_dir(&x, &u);
            let (x2, u2) = t.from_normal_with_dir(&x1, &u1);
            assert_relative_eq!(x2, x, epsilon = 1e-12);
            assert_relative_eq!(u2, u, epsilon = 1e-12);
        }
    }
    #[test]
    fn rotation_convention() {
        // no tilt: the normal frame axis maps onto the surface direction
        let dir = Vector3::new(1.0, 3.0, 4.0).normalize();
        let t = SurfaceTransform::new(meter!(2.0), &dir, None).unwrap();
        assert_relative_eq!(
            t.from_normal(&Vector3::new(0.0, 0.0, 3.0)),
            dir * 3.0,
            epsilon = 1e-12
        );
        // tilt about the first axis
        let t = SurfaceTransform::new(
            meter!(0.0),
            &Vector3::z(),
            Some(&radian!(0.1, 0.0, 0.0).coords),
        )
        .unwrap();
        assert_relative_eq!(
            t.from_normal(&Vector3::new(0.0, 0.0, 3.0)),
            Vector3::new(0.0, 3.0 * 0.1_f64.sin(), 3.0 * 0.1_f64.cos()),
            epsilon = 1e-12
        );
    }
    #[test]
    fn axis_rotation_ignores_tilt() {
        // the axis frame only follows the direction, the tilt acts on the normal frame
        let t = SurfaceTransform::new(
            meter!(0.0),
            &Vector3::z(),
            Some(&radian!(0.1, 0.0, 0.0).coords),
        )
        .unwrap();
        let p = t.from_axis(&meter!(0.0, 0.0, 3.0));
        assert_relative_eq!(p.x.value, 0.0);
        assert_relative_eq!(p.y.value, 0.0);
        assert_relative_eq!(p.z.value, 3.0);
    }
    #[test]
    fn default_direction_is_identity() {
        let t = SurfaceTransform::new(meter!(0.0), &Vector3::z(), None).unwrap();
        assert_relative_eq!(t.from_normal(&Vector3::z()), Vector3::z());
        let p = t.from_axis(&meter!(0.0, 0.0, 1.0));
        assert_relative_eq!(p.z.value, 1.0);
        assert_relative_eq!(p.x.value, 0.0);
        assert_relative_eq!(p.y.value, 0.0);
    }
    #[test]
    fn antiparallel_direction() {
        let t = SurfaceTransform::new(meter!(0.0), &Vector3::new(0.0, 0.0, -1.0), None).unwrap();
        assert_relative_eq!(
            t.from_normal(&Vector3::z()),
            Vector3::new(0.0, 0.0, -1.0),
            epsilon = 1e-12
        );
    }
}
