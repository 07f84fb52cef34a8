#![warn(missing_docs)]
//! Exact (real) ray tracing through a surface: conic intersection and vector Snell's law.
use nalgebra::{Point3, Vector3};
use roots::{find_roots_quadratic, Roots};
use uom::si::f64::Length;

use super::Surface;
use crate::{
    error::{OptResult, OptraceError},
    material::Material,
    meter,
    ray::Ray,
};

/// iteration cap for polishing the intercept of aspheric surfaces
const MAX_NEWTON_ITERATIONS: usize = 10;
/// residual bound (in meters) for the aspheric intercept polish
const NEWTON_TOLERANCE: f64 = 1e-12;

/// Reflect a direction on a surface normal.
pub(crate) fn reflect_dir(dir: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    dir - 2.0 * dir.dot(normal) * normal
}

/// Refract a direction on a surface normal using Snell's law in vector form with the index
/// ratio `mu = n0/n1`.
///
/// # Errors
///
/// This function will return an error if no real refraction root exists (total internal
/// reflection).
pub(crate) fn refract_dir(
    dir: &Vector3<f64>,
    normal: &Vector3<f64>,
    mu: f64,
) -> OptResult<Vector3<f64>> {
    // Snell's law in vector form:
    // s2 = mu * [ n x ( -n x s1) ] - n * sqrt(1 - mu^2 * (n x s1) dot (n x s1))
    let s1 = dir.normalize();
    let n = normal.normalize();
    let n_cross_s1 = n.cross(&s1);
    let dis = (mu * mu).mul_add(-n_cross_s1.dot(&n_cross_s1), 1.0);
    if dis.is_sign_negative() {
        return Err(OptraceError::TotalInternalReflection(format!(
            "no real refraction root for index ratio {mu}"
        )));
    }
    Ok(mu * (n.cross(&(-1.0 * n_cross_s1))) - n * dis.sqrt())
}

impl Surface {
    /// Path length along `dir` from `pos` to the surface, in the normal frame (meters).
    ///
    /// The conic equation
    /// `curvature * (x^2 + y^2 + (1 + conic) * z^2) - 2z = 0`
    /// inserted with the ray `p + t*d` gives a quadratic `a t^2 + b t + c = 0` with
    /// `a = curvature * (d_x^2 + d_y^2 + (1 + conic) * d_z^2)`
    /// `b = 2 * curvature * (p_x d_x + p_y d_y + (1 + conic) * p_z d_z) - 2 d_z`
    /// `c = curvature * (p_x^2 + p_y^2 + (1 + conic) * p_z^2) - 2 p_z`.
    /// The physically forward root (smallest non-negative `t`) is selected, never the
    /// back-surface root. A flat surface degenerates to the linear solution.
    fn intercept(&self, pos: &Vector3<f64>, dir: &Vector3<f64>) -> OptResult<f64> {
        let c = self.curvature();
        let k1 = 1.0 + self.conic();
        let a = c * (k1 * dir.z).mul_add(dir.z, dir.x.mul_add(dir.x, dir.y * dir.y));
        let b = 2.0
            * c
            * (k1 * pos.z).mul_add(dir.z, pos.x.mul_add(dir.x, pos.y * dir.y))
            - 2.0 * dir.z;
        let cc = c * (k1 * pos.z).mul_add(pos.z, pos.x.mul_add(pos.x, pos.y * pos.y)) - 2.0 * pos.z;
        let roots = find_roots_quadratic(a, b, cc);
        let t = match roots {
            // no intersection
            Roots::No(_) => {
                return Err(OptraceError::NoIntersection(
                    "ray has no forward intersection with the surface".into(),
                ))
            }
            // flat surface or "just touching" intersection
            Roots::One(t) => {
                if t[0] >= 0.0 {
                    t[0]
                } else {
                    return Err(OptraceError::NoIntersection(
                        "surface lies behind the ray".into(),
                    ));
                }
            }
            // "regular" intersection, take the vertex-side crossing
            Roots::Two(t) => {
                let (near, far) = (f64::min(t[0], t[1]), f64::max(t[0], t[1]));
                if near >= 0.0 {
                    near
                } else if far >= 0.0 {
                    far
                } else {
                    return Err(OptraceError::NoIntersection(
                        "surface lies behind the ray".into(),
                    ));
                }
            }
            _ => unreachable!(),
        };
        if self.aspherics().is_empty() {
            Ok(t)
        } else {
            self.polish_intercept(pos, dir, t)
        }
    }
    /// Newton polish of the conic intercept when aspheric terms are present.
    fn polish_intercept(&self, pos: &Vector3<f64>, dir: &Vector3<f64>, t0: f64) -> OptResult<f64> {
        let outside = || {
            OptraceError::NoIntersection("ray leaves the domain of the aspheric surface".into())
        };
        let mut t = t0;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let p = pos + t * dir;
            let r_sq = p.x.mul_add(p.x, p.y * p.y);
            let sag = self.sag(r_sq).ok_or_else(outside)?;
            let residual = p.z - sag;
            if residual.abs() < NEWTON_TOLERANCE {
                if t < 0.0 {
                    return Err(OptraceError::NoIntersection(
                        "surface lies behind the ray".into(),
                    ));
                }
                return Ok(t);
            }
            let slope = self.sag_slope(r_sq).ok_or_else(outside)?;
            let derivative = dir.z - slope * 2.0 * p.x.mul_add(dir.x, p.y * dir.y);
            if derivative == 0.0 {
                return Err(OptraceError::NoIntersection(
                    "ray grazes the aspheric surface".into(),
                ));
            }
            t -= residual / derivative;
        }
        Err(OptraceError::NoIntersection(
            "aspheric intercept did not converge".into(),
        ))
    }
    /// Unit surface normal at a point of the surface (normal frame).
    ///
    /// The normal is oriented against the propagation direction: it has a negative z component
    /// at the vertex.
    fn surface_normal(&self, p: &Vector3<f64>) -> OptResult<Vector3<f64>> {
        let r_sq = p.x.mul_add(p.x, p.y * p.y);
        let slope = self.sag_slope(r_sq).ok_or_else(|| {
            OptraceError::NoIntersection("point outside the domain of the surface".into())
        })?;
        Ok(Vector3::new(2.0 * p.x * slope, 2.0 * p.y * slope, -1.0).normalize())
    }
    /// Intersection point and surface normal of a [`Ray`] with this surface.
    ///
    /// Input and output are in the surface's axis frame; the internal tilt of the normal frame
    /// is handled here.
    ///
    /// # Errors
    ///
    /// This function will return an error if the ray has no forward intersection with the
    /// surface.
    pub fn intersect(&self, ray: &Ray) -> OptResult<(Point3<Length>, Vector3<f64>)> {
        let tilt = self.transform().tilt_rotation();
        let pos = tilt.inverse_transform_vector(&ray.position().map(|c| c.value).coords);
        let dir = tilt.inverse_transform_vector(&ray.direction());
        let t = self.intercept(&pos, &dir)?;
        let p = pos + t * dir;
        let normal = self.surface_normal(&p)?;
        let p = tilt * p;
        Ok((meter!(p.x, p.y, p.z), tilt * normal))
    }
    /// Propagate a [`Ray`] to this surface and refract (or reflect) it there.
    ///
    /// The incoming ray is given in the surface's axis frame with positions relative to the
    /// surface vertex (a ray starting at the previous vertex has `z = -distance`). The returned
    /// ray sits on the surface, carries the refractive index of the medium behind it
    /// (`-n0` for a mirror) and has the optical path `n0 * segment length` added. Its direction
    /// is normalized.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///  - the ray has no forward intersection with the surface
    ///  - the ray is totally internally reflected at a refractive surface
    pub fn propagate(&self, ray: &Ray) -> OptResult<Ray> {
        let tilt = self.transform().tilt_rotation();
        let pos = tilt.inverse_transform_vector(&ray.position().map(|c| c.value).coords);
        let dir = tilt.inverse_transform_vector(&ray.direction());
        let t = self.intercept(&pos, &dir)?;
        let p = pos + t * dir;
        let normal = self.surface_normal(&p)?;
        let n0 = ray.refractive_index();
        let (n1, dir_out) = match self.material() {
            Some(Material::Mirror) => (-n0, reflect_dir(&dir, &normal)),
            Some(material) => {
                // thread the propagation sign of folded systems through the index
                let nd = material.refractive_index(ray.wavelength())? * n0.signum();
                (nd, refract_dir(&dir, &normal, n0 / nd)?)
            }
            None => (n0, dir),
        };
        let p = tilt * p;
        let dir_out = tilt * dir_out;
        Ok(Ray::from_parts(
            meter!(p.x, p.y, p.z),
            dir_out,
            ray.wavelength(),
            ray.path_length() + meter!(n0 * t),
            n1,
        ))
    }
}
