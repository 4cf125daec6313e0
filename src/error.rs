//! Error types for input validation and configuration.

use thiserror::Error;

/// Boundary validation errors.
///
/// The calculation functions themselves never fail; these are raised by the
/// helpers callers use to validate raw numbers before handing them to the
/// model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecoError {
    #[error("gas mix cannot be normalized: all fractions are zero")]
    DegenerateGasMix,
    #[error("{gas} fraction must be finite and non-negative, got {value}")]
    InvalidGasFraction { gas: &'static str, value: f64 },
    #[error("depth must be finite and non-negative, got {0} m")]
    InvalidDepth(f64),
    #[error("duration must be finite and non-negative, got {0}")]
    InvalidDuration(f64),
    #[error("malformed dive log: {0}")]
    MalformedLog(String),
    #[error("invalid log timestamp: {0}")]
    InvalidTimestamp(String),
}

impl From<serde_json::Error> for DecoError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedLog(err.to_string())
    }
}

/// Errors raised while loading [`crate::config::DecoSettings`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("unknown decompression model: {0:?}")]
    UnknownDecoModel(String),
    #[error("unknown compartment set: {0:?}")]
    UnknownCompartmentSet(String),
}

/// Errors raised by the ZHL-16C reference cross-check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("no segments provided")]
    NoSegments,
    #[error("gas fractions must be between 0.0 and 1.0")]
    InvalidGasFractions,
    #[error("gas fractions (O2 + He) exceed 1.0")]
    GasFractionsExceedOne,
    #[error("gradient factors must satisfy 0 < low <= high <= 1")]
    InvalidGradientFactors,
}

pub type Result<T, E = DecoError> = std::result::Result<T, E>;
