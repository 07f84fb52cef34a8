//! This is the documentation for the **optrace** crate, a sequential-surface ray tracing core
//! for optical imaging systems.
//!
//! The central entity is the [`Surface`]: a conic (optionally aspheric) optical interface with
//! a pose relative to its predecessor and the [`Material`] filling the space behind it. A
//! surface offers
//!  - first-order transport of a [`ParaxialRay`] ([`Surface::propagate_paraxial`]),
//!  - exact tracing of a [`Ray`] with conic intersection and vector Snell's law
//!    ([`Surface::propagate`]),
//!  - pupil aiming, the inverse problem of launching a real ray from an object point that meets
//!    a requested normalized pupil coordinate on a stop surface ([`Surface::aim`]),
//!  - the frame transforms these operations rely on ([`SurfaceTransform`]).
//!
//! Surface chains, catalogs, optimization and plotting are the business of the consumers of
//! this crate; all operations here are pure functions over in-memory values.
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod material;
pub mod paraxial;
pub mod ray;
pub mod rays;
pub mod surface;
pub mod transform;
pub mod utils;

pub use error::{OptResult, OptraceError};
pub use material::{Material, MIRROR};
pub use paraxial::ParaxialRay;
pub use ray::Ray;
pub use rays::Rays;
pub use surface::{Aperture, Surface, SurfaceBuilder};
pub use transform::SurfaceTransform;
