//! Module for additional computational capabilities
pub mod math_utils;
pub mod uom_macros;
pub use math_utils::{sin_arctan, sin_arctan2, tan_arcsin, tan_arcsin2};
