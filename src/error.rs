//! error.rs
//! Errores del núcleo. El plumbing (red, config, bind) usa `anyhow`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FloodError {
    #[error("location not found: {0}")]
    NotFound(String),
    #[error("invalid coordinates lat={lat}, lon={lon}: {reason}")]
    InvalidInput { lat: f64, lon: f64, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Fallos del clasificador. Nunca llegan al llamante de `RiskEstimator`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("feature shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("non-finite feature at index {index}")]
    NonFinite { index: usize },
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}
