#![warn(missing_docs)]
//! Pupil aiming: find the real ray from an object point that meets a requested normalized
//! pupil coordinate on a reference (stop) surface.
use log::warn;
use nalgebra::{Point3, Vector2, Vector3};
use uom::si::f64::{Angle, Length};

use super::{Aperture, Surface};
use crate::{
    error::{OptResult, OptraceError},
    meter,
    utils::sin_arctan2,
};

/// maximum number of correction steps of the aiming loop
const MAX_AIM_ITERATIONS: usize = 20;
/// bound on the normalized residual at the stop below which aiming has converged
const AIM_TOLERANCE: f64 = 1e-9;

impl Surface {
    /// Find the real ray leaving this (object) surface at the normalized object coordinate
    /// `y_object` that meets the normalized pupil coordinate `y_pupil` on a stop surface
    /// located `stop_distance` away with the half-angle `stop_half_angle`.
    ///
    /// Both coordinates are normalized to `[-1, 1]²`: `y_object` by this surface's aperture,
    /// `y_pupil` by the stop half-aperture `h = stop_distance * tan(stop_half_angle)`. A finite
    /// object surface (physical radius) launches from the fixed point
    /// `(-y_object * radius, sag)` and the ray *direction* is the free parameter; an angular
    /// object surface (at infinity) launches with the fixed direction given by the field angle
    /// `-y_object * angular_radius` and the launch *position* is the free parameter.
    ///
    /// Starting from the straight-line guess, the trial ray is propagated to the stop plane and
    /// the free parameter corrected until the normalized residual falls below the tolerance.
    /// The returned direction vector has unit length.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///  - the surface has no aperture, the stop distance is <= 0 or not finite, the stop
    ///    half-angle is outside (0, pi/2) or a coordinate is not finite
    ///  - the launch point lies outside the conic domain of the surface
    ///  - the residual does not fall below the tolerance within the iteration budget
    pub fn aim(
        &self,
        y_object: &Vector2<f64>,
        y_pupil: &Vector2<f64>,
        stop_distance: Length,
        stop_half_angle: Angle,
    ) -> OptResult<(Point3<Length>, Vector3<f64>)> {
        let z = stop_distance.value;
        if z <= 0.0 || !z.is_finite() {
            return Err(OptraceError::Configuration(
                "stop distance must be >0 and finite".into(),
            ));
        }
        let a = stop_half_angle.value;
        if a <= 0.0 || a >= std::f64::consts::FRAC_PI_2 || !a.is_finite() {
            return Err(OptraceError::Configuration(
                "stop half-angle must be within (0, pi/2)".into(),
            ));
        }
        if y_object.iter().chain(y_pupil.iter()).any(|c| !c.is_finite()) {
            return Err(OptraceError::Configuration(
                "normalized coordinates must be finite".into(),
            ));
        }
        let h = z * a.tan();
        let target = y_pupil * h;
        let outside = || {
            OptraceError::Configuration(
                "launch point outside the conic domain of the object surface".into(),
            )
        };
        match self.aperture() {
            Some(Aperture::Radius(radius)) => {
                // position-based aiming: the launch point is fixed, correct the direction
                let launch_t = -y_object * radius.value;
                let launch_z = self.sag(launch_t.norm_squared()).ok_or_else(outside)?;
                let mut aim_point = target;
                for _ in 0..MAX_AIM_ITERATIONS {
                    let u = Vector3::new(
                        aim_point.x - launch_t.x,
                        aim_point.y - launch_t.y,
                        z - launch_z,
                    )
                    .normalize();
                    let landing = launch_t + Vector2::new(u.x, u.y) / u.z * (z - launch_z);
                    let residual = (landing - target) / h;
                    if residual.norm() < AIM_TOLERANCE {
                        return Ok((meter!(launch_t.x, launch_t.y, launch_z), u));
                    }
                    aim_point -= residual * h;
                }
                no_convergence()
            }
            Some(Aperture::Angular(angular_radius)) => {
                // angle-based aiming: the launch direction is fixed, correct the position
                let slope = (-y_object * angular_radius.value).map(f64::tan);
                let ut = sin_arctan2(slope);
                let u = Vector3::new(ut.x, ut.y, (1.0 - ut.norm_squared()).sqrt());
                let mut launch_t = target - slope * z;
                for _ in 0..MAX_AIM_ITERATIONS {
                    let launch_z = self.sag(launch_t.norm_squared()).ok_or_else(outside)?;
                    let landing = launch_t + slope * (z - launch_z);
                    let residual = (landing - target) / h;
                    if residual.norm() < AIM_TOLERANCE {
                        return Ok((meter!(launch_t.x, launch_t.y, launch_z), u));
                    }
                    launch_t -= residual * h;
                }
                no_convergence()
            }
            None => Err(OptraceError::Configuration(
                "cannot aim from a surface without an aperture".into(),
            )),
        }
    }
}

/// the shared terminal failure of the aiming loops
fn no_convergence<T>() -> OptResult<T> {
    warn!("pupil aiming did not converge within {MAX_AIM_ITERATIONS} iterations");
    Err(OptraceError::Aiming(format!(
        "no convergence within {MAX_AIM_ITERATIONS} iterations"
    )))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{degree, nanometer, radian, ray::Ray};
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    /// stop surface of the aiming scenarios: flat, 1.5 m half-aperture, 2 m behind the object
    fn stop() -> Surface {
        Surface::builder()
            .distance(meter!(2.0))
            .radius(meter!(1.5))
            .build()
            .unwrap()
    }
    /// aim on `s` and verify the aimed ray on the stop surface; returns the normalized
    /// coordinates reached on the stop
    fn aim_and_check(s: &Surface, yo: Vector2<f64>, yp: Vector2<f64>) -> Vector2<f64> {
        let sn = stop();
        let z = sn.distance();
        let h = sn.radius().unwrap();
        let half_angle = radian!(h.value.atan2(z.value));
        let (p, u) = s.aim(&yo, &yp, z, half_angle).unwrap();
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
        // hand over to the stop surface: positions relative to its vertex
        let ray = Ray::new(
            meter!(p.x.value, p.y.value, p.z.value - z.value),
            u,
            nanometer!(587.6),
        )
        .unwrap();
        let on_stop = sn.propagate(&ray).unwrap();
        assert_relative_eq!(on_stop.direction().norm(), 1.0, epsilon = 1e-12);
        Vector2::new(
            on_stop.position().x.value / h.value,
            on_stop.position().y.value / h.value,
        )
    }
    #[test]
    fn aim_marginal_ray() {
        let s = Surface::builder().radius(meter!(3.0)).build().unwrap();
        let yo = Vector2::new(0.0, 0.0);
        let yp = Vector2::new(0.0, 1.0);
        let reached = aim_and_check(&s, yo, yp);
        assert_relative_eq!(reached, yp, epsilon = 1e-9);
        let (p, _) = s
            .aim(&yo, &yp, meter!(2.0), radian!(1.5_f64.atan2(2.0)))
            .unwrap();
        assert_relative_eq!(-p.x.value / 3.0, yo.x);
        assert_relative_eq!(-p.y.value / 3.0, yo.y);
    }
    #[test]
    fn aim_chief_ray() {
        let s = Surface::builder().radius(meter!(3.0)).build().unwrap();
        let yo = Vector2::new(0.0, 0.8);
        let yp = Vector2::new(0.0, 0.0);
        let reached = aim_and_check(&s, yo, yp);
        assert_relative_eq!(reached.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(reached.y, 0.0, epsilon = 1e-9);
        // launch position is the negated normalized object coordinate
        let (p, _) = s
            .aim(&yo, &yp, meter!(2.0), radian!(1.5_f64.atan2(2.0)))
            .unwrap();
        assert_relative_eq!(-p.y.value / 3.0, 0.8, epsilon = 1e-12);
        assert_relative_eq!(p.z.value, 0.0);
    }
    #[test]
    fn curved_object_launches_on_sag() {
        let s = Surface::builder()
            .curvature(0.5)
            .radius(meter!(1.0))
            .build()
            .unwrap();
        let (p, u) = s
            .aim(
                &Vector2::new(0.0, 0.5),
                &Vector2::new(0.0, 0.0),
                meter!(2.0),
                radian!(1.5_f64.atan2(2.0)),
            )
            .unwrap();
        // the launch point sits on the surface, z sign follows the curvature sign
        assert!(p.z.value > 0.0);
        assert_relative_eq!(
            p.z.value,
            s.surface_sag(&crate::meter!(0.0, -0.5)).unwrap().value
        );
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
    }
    #[test]
    fn aim_angular_object() {
        let s = Surface::builder().angular_radius(degree!(60.0)).build().unwrap();
        let yo = Vector2::new(0.0, 0.5);
        let yp = Vector2::new(0.0, 0.0);
        let (p, u) = s
            .aim(&yo, &yp, meter!(2.0), radian!(1.5_f64.atan2(2.0)))
            .unwrap();
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
        // field angle -30 degrees
        assert_relative_eq!(u.y, -0.5, epsilon = 1e-12);
        // back-projected so the ray crosses the stop axis
        assert_relative_eq!(p.y.value, 2.0 * 30.0_f64.to_radians().tan(), epsilon = 1e-9);
        let reached = aim_and_check(&s, yo, yp);
        assert_relative_eq!(reached.y, 0.0, epsilon = 1e-9);
    }
    #[test]
    fn aim_curved_angular_object_iterates() {
        let s = Surface::builder()
            .curvature(0.2)
            .angular_radius(degree!(60.0))
            .build()
            .unwrap();
        let yo = Vector2::new(0.0, 0.3);
        let yp = Vector2::new(0.0, 0.4);
        let reached = aim_and_check(&s, yo, yp);
        assert_relative_eq!(reached.y, 0.4, epsilon = 1e-8);
        assert_relative_eq!(reached.x, 0.0, epsilon = 1e-12);
    }
    #[test]
    fn invalid_parameters() {
        let s = Surface::builder().radius(meter!(3.0)).build().unwrap();
        let yo = Vector2::new(0.0, 0.0);
        let yp = Vector2::new(0.0, 1.0);
        assert_matches!(
            s.aim(&yo, &yp, meter!(0.0), radian!(0.5)),
            Err(OptraceError::Configuration(_))
        );
        assert_matches!(
            s.aim(&yo, &yp, meter!(-2.0), radian!(0.5)),
            Err(OptraceError::Configuration(_))
        );
        assert_matches!(
            s.aim(&yo, &yp, meter!(2.0), radian!(0.0)),
            Err(OptraceError::Configuration(_))
        );
        assert_matches!(
            s.aim(&yo, &yp, meter!(2.0), radian!(std::f64::consts::FRAC_PI_2)),
            Err(OptraceError::Configuration(_))
        );
        assert_matches!(
            s.aim(&yo, &yp, meter!(2.0), degree!(120.0)),
            Err(OptraceError::Configuration(_))
        );
        assert_matches!(
            s.aim(&Vector2::new(f64::NAN, 0.0), &yp, meter!(2.0), radian!(0.5)),
            Err(OptraceError::Configuration(_))
        );
        // no aperture, nothing to normalize against
        let bare = Surface::default();
        assert_matches!(
            bare.aim(&yo, &yp, meter!(2.0), radian!(0.5)),
            Err(OptraceError::Configuration(_))
        );
    }
}
