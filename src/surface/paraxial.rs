#![warn(missing_docs)]
//! First-order (paraxial) transport through a surface.
use nalgebra::{Matrix2, Vector2};
use uom::si::f64::Length;

use super::Surface;
use crate::{
    error::{OptResult, OptraceError},
    material::Material,
    meter,
    paraxial::ParaxialRay,
};

impl Surface {
    /// Returns the first-order ray-transfer (ABCD) matrix of this surface and the refractive
    /// index behind it.
    ///
    /// The matrix acts on the state `[y, u]` per transverse axis (x and y are decoupled):
    /// the gap `distance` is traversed in the incoming medium first, then the paraxial
    /// refraction `u' = mu·u − ỹ·curvature·(1 − mu)` with `mu = n0/n1` is applied. For a mirror
    /// `n1 = -n0` and the position row carries the fold sign. Matrix entries are in SI units
    /// (the B entry is in meters).
    ///
    /// # Errors
    ///
    /// This function will return an error if `n0` is zero or not finite.
    pub fn paraxial_matrix(&self, n0: f64, wavelength: Length) -> OptResult<(Matrix2<f64>, f64)> {
        if n0 == 0.0 || !n0.is_finite() {
            return Err(OptraceError::Material(
                "refractive index of the incoming medium must be non-zero and finite".into(),
            ));
        }
        let (n1, mu, fold) = match self.material() {
            None => (n0, 1.0, 1.0),
            Some(Material::Mirror) => (-n0, -1.0, -1.0),
            Some(material) => {
                // thread the propagation sign of folded systems through the index
                let nd = material.refractive_index(wavelength)? * n0.signum();
                (nd, n0 / nd, 1.0)
            }
        };
        let d = self.distance().value;
        let c = self.curvature();
        let matrix = Matrix2::new(
            fold,
            fold * d,
            -c * (1.0 - mu),
            mu - c * d * (1.0 - mu),
        );
        Ok((matrix, n1))
    }
    /// Propagate a [`ParaxialRay`] through this surface.
    ///
    /// `n0` is the refractive index of the incoming medium. Returns the propagated ray and the
    /// index behind the surface. The surface pose is ignored at first order; the state is
    /// referenced to the optical axis. A flat surface at zero distance without material is the
    /// exact identity map.
    ///
    /// # Errors
    ///
    /// This function will return an error if `n0` is zero or not finite.
    pub fn propagate_paraxial(
        &self,
        ray: &ParaxialRay,
        n0: f64,
        wavelength: Length,
    ) -> OptResult<(ParaxialRay, f64)> {
        let (m, n1) = self.paraxial_matrix(n0, wavelength)?;
        let y = ray.y();
        let u = ray.u();
        let y_out = meter!(
            m[(0, 0)] * y.x.value + m[(0, 1)] * u.x,
            m[(0, 0)] * y.y.value + m[(0, 1)] * u.y
        );
        let u_out = Vector2::new(
            m[(1, 0)] * y.x.value + m[(1, 1)] * u.x,
            m[(1, 0)] * y.y.value + m[(1, 1)] * u.y,
        );
        Ok((ParaxialRay::new(y_out, u_out)?, n1))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{nanometer, MIRROR};
    use approx::assert_relative_eq;

    fn glass() -> Material {
        Material::model(1.5, f64::INFINITY).unwrap()
    }
    #[test]
    fn flat_interface_scales_slope() {
        let s = Surface::builder().material(glass()).build().unwrap();
        let ray = ParaxialRay::new(meter!(1.0, 2.0), Vector2::new(0.2, 0.1)).unwrap();
        let (out, n1) = s.propagate_paraxial(&ray, 1.0, nanometer!(587.6)).unwrap();
        assert_eq!(n1, 1.5);
        assert_eq!(out.y(), ray.y());
        assert_relative_eq!(out.u().x * 1.5, 0.2, epsilon = 1e-14);
        assert_relative_eq!(out.u().y * 1.5, 0.1, epsilon = 1e-14);
    }
    #[test]
    fn flat_mirror_negates_state() {
        let s = Surface::builder().material(MIRROR).build().unwrap();
        let ray = ParaxialRay::new(meter!(1.0, 2.0), Vector2::new(0.2, 0.1)).unwrap();
        let (out, n1) = s.propagate_paraxial(&ray, 1.0, nanometer!(587.6)).unwrap();
        assert_eq!(n1, -1.0);
        assert_eq!(out.y(), meter!(-1.0, -2.0));
        assert_eq!(out.u(), Vector2::new(-0.2, -0.1));
    }
    #[test]
    fn degenerate_surface_is_identity() {
        let s = Surface::default();
        let ray = ParaxialRay::new(meter!(1.0, 2.0), Vector2::new(0.2, 0.1)).unwrap();
        let (out, n1) = s.propagate_paraxial(&ray, 1.0, nanometer!(587.6)).unwrap();
        assert_eq!(n1, 1.0);
        assert_eq!(out, ray);
    }
    #[test]
    fn curved_surface_with_gap() {
        let s = Surface::builder()
            .curvature(0.1)
            .distance(meter!(0.2))
            .material(glass())
            .build()
            .unwrap();
        let ray = ParaxialRay::new(meter!(1.0, 2.0), Vector2::new(0.2, 0.1)).unwrap();
        let (out, n1) = s.propagate_paraxial(&ray, 1.0, nanometer!(587.6)).unwrap();
        assert_eq!(n1, 1.5);
        // transfer first: y + d*u
        assert_relative_eq!(out.y().x.value, 1.04, epsilon = 1e-12);
        assert_relative_eq!(out.y().y.value, 2.02, epsilon = 1e-12);
        // then refraction: u' = mu*u - y*c*(1 - mu)
        assert_relative_eq!(out.u().x, 0.2 * 2.0 / 3.0 - 1.04 * 0.1 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(out.u().y, 0.1 * 2.0 / 3.0 - 2.02 * 0.1 / 3.0, epsilon = 1e-12);
    }
    #[test]
    fn curved_mirror() {
        let s = Surface::builder().curvature(0.1).material(MIRROR).build().unwrap();
        let ray = ParaxialRay::new(meter!(1.0, 0.0), Vector2::zeros()).unwrap();
        let (out, n1) = s.propagate_paraxial(&ray, 1.0, nanometer!(587.6)).unwrap();
        assert_eq!(n1, -1.0);
        assert_relative_eq!(out.y().x.value, -1.0);
        // reflected slope -2*c*y in the folded convention
        assert_relative_eq!(out.u().x, -0.2, epsilon = 1e-12);
    }
    #[test]
    fn matrix_matches_propagation() {
        let s = Surface::builder()
            .curvature(0.25)
            .distance(meter!(0.5))
            .material(glass())
            .build()
            .unwrap();
        let (m, n1) = s.paraxial_matrix(1.0, nanometer!(587.6)).unwrap();
        assert_eq!(n1, 1.5);
        let ray = ParaxialRay::new(meter!(0.3, -0.1), Vector2::new(-0.05, 0.02)).unwrap();
        let (out, _) = s.propagate_paraxial(&ray, 1.0, nanometer!(587.6)).unwrap();
        let yu_x = m * Vector2::new(0.3, -0.05);
        assert_relative_eq!(out.y().x.value, yu_x.x, epsilon = 1e-12);
        assert_relative_eq!(out.u().x, yu_x.y, epsilon = 1e-12);
    }
    #[test]
    fn invalid_incoming_index() {
        let s = Surface::default();
        let ray = ParaxialRay::on_axis();
        assert!(s.propagate_paraxial(&ray, 0.0, nanometer!(587.6)).is_err());
        assert!(s
            .propagate_paraxial(&ray, f64::NAN, nanometer!(587.6))
            .is_err());
    }
}
