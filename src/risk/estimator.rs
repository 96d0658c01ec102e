//! estimator.rs
//!
//! Probabilidad de inundación para un perfil (nativo o interpolado) y una
//! ventana de lluvia.
//!
//! 1. Serie de niveles de agua y vector de features.
//! 2. Probabilidad bruta: clasificador si está cargado y acepta la forma,
//!    si no heurística por tablas de cortes (conservadora: un día seco da
//!    pocos puntos porcentuales).
//! 3. Mezcla con riesgo geográfico y frecuencia histórica.
//! 4. Suavizado temporal hacia `base_risk_factor`.
//! 5. Pequeños boosts si lluvia y/o nivel son extremos.
//! 6. Acotado a la banda de salida y clasificación por nivel.
//!
//! Si el clasificador falla se usa la heurística y la estimación queda
//! marcada como degradada; nunca se propaga el error.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, warn};

use crate::error::ClassifierError;
use crate::models::estimate::{clamp_finite, ContributingFactors, FeatureVector, PredictionMethod, RiskEstimate, RiskTier, FEATURE_COUNT};
use crate::models::profile::LocationProfile;
use crate::models::types::RiskCfg;
use crate::risk::classifier::FloodClassifier;
use crate::risk::features::{build_features, water_levels};
use crate::weather::WeatherWindow;

#[derive(Clone)]
pub struct RiskEstimator {
    cfg: Arc<RiskCfg>,
    classifier: Option<Arc<dyn FloodClassifier>>,
}

impl std::fmt::Debug for RiskEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskEstimator")
            .field("classifier", &self.classifier_name())
            .finish()
    }
}

/// Probabilidad bruta y cómo se obtuvo.
struct RawPrediction {
    probability: f64,
    confidence: f64,
    method: PredictionMethod,
    degraded_reason: Option<String>,
}

impl RiskEstimator {
    pub fn new(cfg: Arc<RiskCfg>, classifier: Option<Arc<dyn FloodClassifier>>) -> Self {
        Self { cfg, classifier }
    }

    pub fn cfg(&self) -> &RiskCfg {
        &self.cfg
    }

    pub fn classifier_name(&self) -> Option<&str> {
        self.classifier.as_deref().map(|c| c.name())
    }

    pub fn water_levels(&self, profile: &LocationProfile, window: &WeatherWindow) -> Vec<f64> {
        water_levels(profile, window, &self.cfg.water)
    }

    pub fn estimate(&self, profile: &LocationProfile, window: &WeatherWindow) -> RiskEstimate {
        let (fv, _) = build_features(profile, window, &self.cfg);
        let month = window.last_date().map(|d| d.month());

        let raw = match self.classify(&fv) {
            Some(Ok(p)) => RawPrediction {
                probability: p,
                confidence: self.feature_confidence(&fv),
                method: PredictionMethod::Classifier,
                degraded_reason: None,
            },
            Some(Err(e)) => {
                warn!("classifier failed for {}: {e}; using fallback", profile.name);
                RawPrediction {
                    probability: self.fallback_probability(profile, &fv, month),
                    confidence: self.cfg.fallback.confidence,
                    method: PredictionMethod::Fallback,
                    degraded_reason: Some(e.to_string()),
                }
            }
            None => RawPrediction {
                probability: self.fallback_probability(profile, &fv, month),
                confidence: self.cfg.fallback.confidence,
                method: PredictionMethod::Fallback,
                degraded_reason: None,
            },
        };
        self.finish(profile, fv, raw)
    }

    /// Sólo heurística, marcada como degradada. La usa la mezcla de
    /// transición cuando una estación no puede calcularse normalmente.
    pub fn fallback_estimate(&self, profile: &LocationProfile, window: &WeatherWindow, reason: &str) -> RiskEstimate {
        let (fv, _) = build_features(profile, window, &self.cfg);
        let month = window.last_date().map(|d| d.month());
        let raw = RawPrediction {
            probability: self.fallback_probability(profile, &fv, month),
            confidence: self.cfg.transition.failed_confidence,
            method: PredictionMethod::Fallback,
            degraded_reason: Some(reason.to_string()),
        };
        self.finish(profile, fv, raw)
    }

    fn classify(&self, fv: &FeatureVector) -> Option<Result<f64, ClassifierError>> {
        let c = self.classifier.as_deref()?;
        if c.n_features() != FEATURE_COUNT {
            return Some(Err(ClassifierError::ShapeMismatch { expected: c.n_features(), got: FEATURE_COUNT }));
        }
        let out = c.predict_probability(&fv.to_array()).and_then(|p| {
            if p.is_finite() {
                Ok(p.clamp(0.0, 1.0))
            } else {
                Err(ClassifierError::Unavailable(format!("non-finite probability from {}", c.name())))
            }
        });
        Some(out)
    }

    /// Confianza del clasificador según si las features caen en rangos vistos.
    fn feature_confidence(&self, fv: &FeatureVector) -> f64 {
        let checks = [
            (fv.rainfall_1day, 0.0, 30.0),
            (fv.rainfall_3day, 0.0, 80.0),
            (fv.elevation, 0.0, 50.0),
            (fv.river_distance, 0.0, 100.0),
        ];
        let sum: f64 = checks
            .iter()
            .map(|&(v, lo, hi)| if (lo..=hi).contains(&v) { 0.9 } else { 0.6 })
            .sum();
        sum / checks.len() as f64
    }

    /// Heurística sin modelo. Monótona en lluvia del día, lluvia de 3 días
    /// y nivel de agua.
    pub fn fallback_probability(&self, profile: &LocationProfile, fv: &FeatureVector, month: Option<u32>) -> f64 {
        let fb = &self.cfg.fallback;
        let rain = fb.rain_1day.eval(fv.rainfall_1day);
        let cumulative = fb.rain_3day.eval(fv.rainfall_3day);
        let ratio = fv.water_level_lag1 / profile.flood_threshold_m.max(0.1);
        let water = fb.water_ratio.eval(ratio);

        let seasonal = match month {
            Some(m) if self.cfg.is_monsoon(m) => fb.season_monsoon,
            Some(m) if self.cfg.shoulder_months.contains(&m) => fb.season_shoulder,
            _ => fb.season_dry,
        };
        let geo = fv.geographic_risk.min(fb.geo_cap);

        let mut r = (rain * fb.w_rain + cumulative * fb.w_cumulative + water * fb.w_water + geo * fb.w_geo + fb.base) * seasonal;
        if profile.flood_history_frequency > fb.frequent_flood_min {
            r *= fb.frequent_flood_mult;
        }
        clamp_finite(r, fb.min, fb.max)
    }

    fn finish(&self, profile: &LocationProfile, fv: FeatureVector, raw: RawPrediction) -> RiskEstimate {
        let cfg = &*self.cfg;

        let history = (profile.flood_history_frequency / cfg.history_norm).clamp(0.0, 1.0);
        let blended = raw.probability * cfg.w_raw + fv.geographic_risk * cfg.w_geo + history * cfg.w_history;

        let anchor = profile.base_risk_factor.min(cfg.base_risk_cap);
        let smoothed = blended * cfg.temporal_smoothing + anchor * (1.0 - cfg.temporal_smoothing);

        let extreme_rain = fv.rainfall_3day > profile.annual_rainfall_mm * cfg.extreme_rain_annual_frac;
        let extreme_water = fv.water_level_lag1 > profile.flood_threshold_m * cfg.extreme_water_ratio;
        let boost = match (extreme_rain, extreme_water) {
            (true, true) => cfg.boost_both,
            (true, false) | (false, true) => cfg.boost_single,
            (false, false) => 0.0,
        };

        let risk_probability = clamp_finite(smoothed + boost, cfg.risk_min, cfg.risk_max);
        let status = RiskTier::classify(risk_probability, &cfg.tiers);
        debug!(
            "estimate {}: method={:?} raw={:.3} final={:.3} {}",
            profile.name,
            raw.method,
            raw.probability,
            risk_probability,
            status.label()
        );

        RiskEstimate {
            risk_probability,
            confidence: clamp_finite(raw.confidence, 0.0, 1.0),
            status,
            contributing_factors: ContributingFactors {
                method: raw.method,
                degraded: raw.degraded_reason.is_some(),
                degraded_reason: raw.degraded_reason,
                raw_probability: clamp_finite(raw.probability, 0.0, 1.0),
                features: Some(fv),
                geographic_risk: fv.geographic_risk,
                flood_threshold_m: profile.flood_threshold_m,
                extreme_rain,
                extreme_water,
                smoothing_applied: 1.0 - cfg.temporal_smoothing,
                contributors: Vec::new(),
            }
            .sanitized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::store::GeographicProfileStore;
    use crate::models::types::WaterCfg;
    use crate::risk::classifier::SyntheticRuleModel;
    use chrono::NaiveDate;

    struct Fixed(f64);

    impl FloodClassifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }
        fn predict_probability(&self, f: &[f64]) -> Result<f64, ClassifierError> {
            crate::risk::classifier::check_features(f, FEATURE_COUNT)?;
            Ok(self.0)
        }
    }

    struct WrongShape;

    impl FloodClassifier for WrongShape {
        fn name(&self) -> &str {
            "wrong-shape"
        }
        fn n_features(&self) -> usize {
            12
        }
        fn predict_probability(&self, _: &[f64]) -> Result<f64, ClassifierError> {
            Ok(0.99)
        }
    }

    fn cfg() -> Arc<RiskCfg> {
        Arc::new(RiskCfg { water: WaterCfg { jitter_sd: 0.0, ..WaterCfg::default() }, ..RiskCfg::default() })
    }

    fn profile(name: &str) -> LocationProfile {
        GeographicProfileStore::bangladesh().get(name).unwrap().clone()
    }

    fn window(rain: &[f64]) -> WeatherWindow {
        WeatherWindow::from_rainfall(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), rain)
    }

    #[test]
    fn dry_dhaka_is_minimal_or_low() {
        let est = RiskEstimator::new(cfg(), None);
        let r = est.estimate(&profile("Dhaka"), &window(&[0.0; 7]));
        assert!(matches!(r.status, RiskTier::Minimal | RiskTier::Low), "{:?}", r.status);
        assert!(r.risk_probability < 0.2, "p={}", r.risk_probability);
        assert_eq!(r.contributing_factors.method, PredictionMethod::Fallback);
        assert!(!r.contributing_factors.degraded);
    }

    #[test]
    fn classifier_path_used_when_shape_matches() {
        let est = RiskEstimator::new(cfg(), Some(Arc::new(Fixed(0.5))));
        let r = est.estimate(&profile("Sylhet"), &window(&[5.0; 7]));
        assert_eq!(r.contributing_factors.method, PredictionMethod::Classifier);
        assert_eq!(r.contributing_factors.raw_probability, 0.5);
        assert!((r.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_degrades_to_fallback() {
        let est = RiskEstimator::new(cfg(), Some(Arc::new(WrongShape)));
        let r = est.estimate(&profile("Sylhet"), &window(&[5.0; 7]));
        assert_eq!(r.contributing_factors.method, PredictionMethod::Fallback);
        assert!(r.contributing_factors.degraded);
        assert!(r.contributing_factors.degraded_reason.as_deref().unwrap().contains("shape"));

        let plain = RiskEstimator::new(cfg(), None).estimate(&profile("Sylhet"), &window(&[5.0; 7]));
        assert_eq!(r.risk_probability, plain.risk_probability);
    }

    #[test]
    fn non_finite_classifier_output_degrades() {
        let est = RiskEstimator::new(cfg(), Some(Arc::new(Fixed(f64::NAN))));
        let r = est.estimate(&profile("Dhaka"), &window(&[0.0; 7]));
        assert!(r.contributing_factors.degraded);
        assert!(r.risk_probability.is_finite());
    }

    #[test]
    fn output_stays_in_band_under_extremes() {
        let c = cfg();
        let est = RiskEstimator::new(c.clone(), Some(Arc::new(Fixed(1.0))));
        for name in ["Dhaka", "Sylhet", "Rangpur", "Bahadurabad", "Chittagong"] {
            for rain in [[0.0; 7], [100.0; 7]] {
                let r = est.estimate(&profile(name), &window(&rain));
                assert!(r.risk_probability >= c.risk_min && r.risk_probability <= c.risk_max);
            }
        }
    }

    #[test]
    fn extreme_conditions_add_boost() {
        let est = RiskEstimator::new(cfg(), None);
        let p = profile("Sylhet");
        let r = est.estimate(&p, &window(&[0.0, 0.0, 0.0, 0.0, 60.0, 60.0, 60.0]));
        assert!(r.contributing_factors.extreme_rain);
        assert!(r.contributing_factors.extreme_water);
    }

    #[test]
    fn synthetic_model_runs_through_pipeline() {
        let est = RiskEstimator::new(cfg(), Some(Arc::new(SyntheticRuleModel::default())));
        let dry = est.estimate(&profile("Rangpur"), &window(&[0.0; 7]));
        let wet = est.estimate(&profile("Sylhet"), &window(&[40.0, 45.0, 50.0, 60.0, 55.0, 70.0, 80.0]));
        assert!(wet.risk_probability > dry.risk_probability);
        assert_eq!(est.classifier_name(), Some("synthetic-rule"));
    }

    #[test]
    fn corrupt_threshold_never_leaks_into_factors() {
        let mut p = profile("Bahadurabad");
        p.flood_threshold_m = f64::NAN;
        let est = RiskEstimator::new(cfg(), None);
        let r = est.fallback_estimate(&p, &window(&[5.0; 7]), "bad threshold");
        let cf = &r.contributing_factors;
        assert!(cf.flood_threshold_m.is_finite());
        assert!(cf.geographic_risk.is_finite());
        assert!(cf.features.unwrap().to_array().iter().all(|x| x.is_finite()));
        assert!(r.risk_probability.is_finite());
    }
}
