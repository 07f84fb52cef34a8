#![warn(missing_docs)]
//! Optrace specific error structures
use std::{error::Error, fmt::Display};

/// Optrace application specific Result type
pub type OptResult<T> = std::result::Result<T, OptraceError>;

/// Errors that can be returned by various optrace functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptraceError {
    /// invalid or conflicting surface / aiming parameters
    Configuration(String),
    /// errors while handling material data (e.g. missing refractive index)
    Material(String),
    /// no real refraction root exists at a surface intersection
    TotalInternalReflection(String),
    /// a ray misses a surface or has no forward intersection root
    NoIntersection(String),
    /// pupil aiming did not converge within the iteration budget
    Aiming(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for OptraceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(m) => {
                write!(f, "Configuration:{m}")
            }
            Self::Material(m) => {
                write!(f, "Material:{m}")
            }
            Self::TotalInternalReflection(m) => {
                write!(f, "TotalInternalReflection:{m}")
            }
            Self::NoIntersection(m) => {
                write!(f, "NoIntersection:{m}")
            }
            Self::Aiming(m) => {
                write!(f, "Aiming:{m}")
            }
            Self::Other(m) => write!(f, "Optrace Error:Other:{m}"),
        }
    }
}
impl Error for OptraceError {}

impl std::convert::From<String> for OptraceError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
