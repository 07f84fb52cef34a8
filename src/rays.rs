#![warn(missing_docs)]
//! Module for handling bundles of optical rays
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::{error::OptResult, ray::Ray, surface::Surface, transform::SurfaceTransform};

/// A bundle of [`Ray`]s traced together through a surface sequence.
///
/// The rays of a bundle are independent of each other (no inter-ray dependency); bulk
/// operations apply per ray and fail fast on the first erroring ray, leaving the bundle
/// unchanged in that case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rays {
    rays: Vec<Ray>,
}

impl Rays {
    /// Create a new, empty bundle.
    #[must_use]
    pub const fn new() -> Self {
        Self { rays: Vec::new() }
    }
    /// Returns the number of rays in this bundle.
    #[must_use]
    pub fn nr_of_rays(&self) -> usize {
        self.rays.len()
    }
    /// Returns `true` if the bundle contains no rays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }
    /// Add a single [`Ray`] to the bundle.
    pub fn add_ray(&mut self, ray: Ray) {
        self.rays.push(ray);
    }
    /// Returns an iterator over the rays of the bundle.
    pub fn iter(&self) -> std::slice::Iter<'_, Ray> {
        self.rays.iter()
    }
    /// Propagate all rays of the bundle to the given [`Surface`] and refract them there.
    ///
    /// # Errors
    ///
    /// This function will return an error if any ray misses the surface or is totally
    /// internally reflected. The bundle is unchanged in that case.
    pub fn propagate(&mut self, surface: &Surface) -> OptResult<()> {
        let traced = self
            .rays
            .iter()
            .map(|ray| surface.propagate(ray))
            .collect::<OptResult<Vec<Ray>>>()?;
        self.rays = traced;
        Ok(())
    }
    /// Propagate all rays of the bundle freely along their directions by the given geometric
    /// length.
    ///
    /// # Errors
    ///
    /// This function will return an error if the length is not finite. The bundle is unchanged
    /// in that case.
    pub fn propagate_free(&mut self, length: Length) -> OptResult<()> {
        let mut traced = self.rays.clone();
        for ray in &mut traced {
            ray.propagate(length)?;
        }
        self.rays = traced;
        Ok(())
    }
    /// Transform all rays of the bundle into the frame of the given [`SurfaceTransform`].
    #[must_use]
    pub fn to_axis(&self, transform: &SurfaceTransform) -> Self {
        Self {
            rays: self.rays.iter().map(|r| transform.to_axis_ray(r)).collect(),
        }
    }
    /// Transform all rays of the bundle out of the frame of the given [`SurfaceTransform`].
    #[must_use]
    pub fn from_axis(&self, transform: &SurfaceTransform) -> Self {
        Self {
            rays: self
                .rays
                .iter()
                .map(|r| transform.from_axis_ray(r))
                .collect(),
        }
    }
}

impl From<Vec<Ray>> for Rays {
    fn from(rays: Vec<Ray>) -> Self {
        Self { rays }
    }
}

impl<'a> IntoIterator for &'a Rays {
    type Item = &'a Ray;
    type IntoIter = std::slice::Iter<'a, Ray>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
