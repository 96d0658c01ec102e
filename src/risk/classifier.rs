//! classifier.rs
//!
//! Contrato del clasificador (`predict_probability` sobre 9 features en
//! orden fijo) y un modelo determinista incluido.
//!
//! `SyntheticRuleModel` devuelve la probabilidad óptima para la regla de
//! etiquetado sintética: score lineal + ruido N(0, 0.1), positivo si
//! score > 0.35  =>  P = Φ((score - 0.35) / 0.1), aproximada con una
//! logística de pendiente 1.702.

use crate::error::ClassifierError;
use crate::models::estimate::FEATURE_COUNT;

/// Modelo inyectado en `RiskEstimator`; sólo lectura y compartible entre hilos.
pub trait FloodClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Dimensión esperada del vector de features.
    fn n_features(&self) -> usize;

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ClassifierError>;
}

/// Valida forma y finitud del vector de entrada.
pub fn check_features(features: &[f64], expected: usize) -> Result<(), ClassifierError> {
    if features.len() != expected {
        return Err(ClassifierError::ShapeMismatch { expected, got: features.len() });
    }
    if let Some(index) = features.iter().position(|x| !x.is_finite()) {
        return Err(ClassifierError::NonFinite { index });
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct SyntheticRuleModel {
    pub threshold: f64,
    pub noise_sd: f64,
}

impl Default for SyntheticRuleModel {
    fn default() -> Self {
        Self { threshold: 0.35, noise_sd: 0.1 }
    }
}

impl SyntheticRuleModel {
    /// Score lineal de la regla de etiquetado.
    pub fn score(f: &[f64; FEATURE_COUNT]) -> f64 {
        let [r1, r3, r7, wl, trend, monsoon, elev, river, geo] = *f;
        0.15 * (r1 / 30.0)
            + 0.20 * (r3 / 80.0)
            + 0.15 * (r7 / 150.0)
            + 0.20 * ((wl - 3.0) / 5.0).max(0.0)
            + 0.10 * (trend / 2.0).max(0.0)
            + 0.05 * monsoon
            + 0.10 * (1.0 - elev / 40.0)
            + 0.03 * (1.0 - (river / 50.0).min(1.0))
            + 0.02 * geo
    }
}

impl FloodClassifier for SyntheticRuleModel {
    fn name(&self) -> &str {
        "synthetic-rule"
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        check_features(features, FEATURE_COUNT)?;
        let f: &[f64; FEATURE_COUNT] = features
            .try_into()
            .map_err(|_| ClassifierError::ShapeMismatch { expected: FEATURE_COUNT, got: features.len() })?;
        if self.noise_sd <= 0.0 {
            return Err(ClassifierError::Unavailable("noise_sd must be positive".into()));
        }
        let z = (Self::score(f) - self.threshold) / self.noise_sd;
        Ok(1.0 / (1.0 + (-1.702 * z).exp()))
    }
}
