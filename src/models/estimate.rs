//! estimate.rs
//! Salida del cálculo: probabilidad acotada, confianza, nivel y factores.

use serde::Serialize;

use crate::models::types::TierCfg;

/// Orden fijo de features que espera el clasificador.
pub const FEATURE_NAMES: [&str; 9] = [
    "rainfall_1day",
    "rainfall_3day",
    "rainfall_7day",
    "water_level_lag1",
    "water_level_trend",
    "is_monsoon",
    "elevation",
    "river_distance",
    "geographic_risk",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FeatureVector {
    pub rainfall_1day: f64,
    pub rainfall_3day: f64,
    pub rainfall_7day: f64,
    pub water_level_lag1: f64,
    pub water_level_trend: f64,
    pub is_monsoon: f64,
    pub elevation: f64,
    pub river_distance: f64,
    pub geographic_risk: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.rainfall_1day,
            self.rainfall_3day,
            self.rainfall_7day,
            self.water_level_lag1,
            self.water_level_trend,
            self.is_monsoon,
            self.elevation,
            self.river_distance,
            self.geographic_risk,
        ]
    }

    /// Cero en lugar de cualquier valor no finito.
    pub fn sanitized(self) -> Self {
        let f = finite_or_zero;
        Self {
            rainfall_1day: f(self.rainfall_1day),
            rainfall_3day: f(self.rainfall_3day),
            rainfall_7day: f(self.rainfall_7day),
            water_level_lag1: f(self.water_level_lag1),
            water_level_trend: f(self.water_level_trend),
            is_monsoon: f(self.is_monsoon),
            elevation: f(self.elevation),
            river_distance: f(self.river_distance),
            geographic_risk: f(self.geographic_risk),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskTier {
    #[serde(rename = "MINIMAL RISK")]
    Minimal,
    #[serde(rename = "LOW RISK")]
    Low,
    #[serde(rename = "MODERATE RISK")]
    Moderate,
    #[serde(rename = "HIGH RISK")]
    High,
    #[serde(rename = "CRITICAL RISK")]
    Critical,
    #[serde(rename = "EXTREME RISK")]
    Extreme,
}

impl RiskTier {
    pub fn classify(p: f64, t: &TierCfg) -> Self {
        if p >= t.extreme {
            RiskTier::Extreme
        } else if p >= t.critical {
            RiskTier::Critical
        } else if p >= t.high {
            RiskTier::High
        } else if p >= t.moderate {
            RiskTier::Moderate
        } else if p >= t.low {
            RiskTier::Low
        } else {
            RiskTier::Minimal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Minimal => "MINIMAL RISK",
            RiskTier::Low => "LOW RISK",
            RiskTier::Moderate => "MODERATE RISK",
            RiskTier::High => "HIGH RISK",
            RiskTier::Critical => "CRITICAL RISK",
            RiskTier::Extreme => "EXTREME RISK",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            RiskTier::Minimal => "risk-minimal",
            RiskTier::Low => "risk-low",
            RiskTier::Moderate => "risk-medium",
            RiskTier::High => "risk-high",
            RiskTier::Critical => "risk-critical",
            RiskTier::Extreme => "risk-extreme",
        }
    }

    pub fn alert_level(self) -> &'static str {
        match self {
            RiskTier::Extreme | RiskTier::Critical => "Critical",
            RiskTier::High => "Warning",
            RiskTier::Moderate => "Advisory",
            RiskTier::Low | RiskTier::Minimal => "Normal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    Classifier,
    Fallback,
    TransitionBlend,
}

/// Aporte de una estación a una mezcla en zona de transición.
#[derive(Clone, Debug, Serialize)]
pub struct Contribution {
    pub location: String,
    pub influence: f64,
    pub risk_probability: f64,
    pub confidence: f64,
    pub degraded: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContributingFactors {
    pub method: PredictionMethod,
    /// El clasificador estaba cargado pero falló: se usó la heurística
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
    /// Probabilidad antes de mezclas, suavizados y acotado
    pub raw_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
    pub geographic_risk: f64,
    pub flood_threshold_m: f64,
    pub extreme_rain: bool,
    pub extreme_water: bool,
    pub smoothing_applied: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Contribution>,
}

impl ContributingFactors {
    /// Ningún NaN/inf sale hacia el llamante, aunque el perfil venga corrupto.
    pub fn sanitized(mut self) -> Self {
        self.raw_probability = clamp_finite(self.raw_probability, 0.0, 1.0);
        self.geographic_risk = finite_or_zero(self.geographic_risk);
        self.flood_threshold_m = finite_or_zero(self.flood_threshold_m);
        self.smoothing_applied = clamp_finite(self.smoothing_applied, 0.0, 1.0);
        self.features = self.features.map(FeatureVector::sanitized);
        for c in &mut self.contributors {
            c.influence = clamp_finite(c.influence, 0.0, 1.0);
            c.risk_probability = clamp_finite(c.risk_probability, 0.0, 1.0);
            c.confidence = clamp_finite(c.confidence, 0.0, 1.0);
        }
        self
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RiskEstimate {
    pub risk_probability: f64,
    pub confidence: f64,
    pub status: RiskTier,
    pub contributing_factors: ContributingFactors,
}

impl RiskEstimate {
    pub fn flood_predicted(&self, t: &TierCfg) -> bool {
        self.risk_probability > t.high
    }
}

/// Acota a [lo, hi] sin dejar pasar NaN ni infinitos.
#[inline]
pub fn clamp_finite(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        lo
    } else {
        x.max(lo).min(hi)
    }
}

#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        let t = TierCfg::default();
        assert_eq!(RiskTier::classify(0.0, &t), RiskTier::Minimal);
        assert_eq!(RiskTier::classify(0.2, &t), RiskTier::Low);
        assert_eq!(RiskTier::classify(0.4, &t), RiskTier::Moderate);
        assert_eq!(RiskTier::classify(0.6, &t), RiskTier::High);
        assert_eq!(RiskTier::classify(0.75, &t), RiskTier::Critical);
        assert_eq!(RiskTier::classify(0.9, &t), RiskTier::Extreme);
    }

    #[test]
    fn tier_serializes_as_label() {
        let s = serde_json::to_string(&RiskTier::Minimal).unwrap();
        assert_eq!(s, "\"MINIMAL RISK\"");
    }

    #[test]
    fn clamp_finite_handles_non_finite() {
        assert_eq!(clamp_finite(f64::NAN, 0.02, 0.95), 0.02);
        assert_eq!(clamp_finite(f64::INFINITY, 0.02, 0.95), 0.95);
        assert_eq!(clamp_finite(f64::NEG_INFINITY, 0.02, 0.95), 0.02);
        assert_eq!(clamp_finite(0.5, 0.02, 0.95), 0.5);
    }

    #[test]
    fn sanitized_factors_have_no_non_finite_values() {
        let fv = FeatureVector { water_level_lag1: f64::NAN, elevation: f64::INFINITY, ..FeatureVector::default() };
        let cf = ContributingFactors {
            method: PredictionMethod::TransitionBlend,
            degraded: true,
            degraded_reason: None,
            raw_probability: f64::NAN,
            features: Some(fv),
            geographic_risk: f64::NAN,
            flood_threshold_m: f64::NAN,
            extreme_rain: false,
            extreme_water: false,
            smoothing_applied: f64::NEG_INFINITY,
            contributors: vec![Contribution {
                location: "x".into(),
                influence: f64::NAN,
                risk_probability: 0.3,
                confidence: 0.6,
                degraded: true,
            }],
        }
        .sanitized();
        let f = cf.features.unwrap();
        assert!(f.to_array().iter().all(|x| x.is_finite()));
        assert_eq!(cf.flood_threshold_m, 0.0);
        assert_eq!(cf.raw_probability, 0.0);
        assert_eq!(cf.contributors[0].influence, 0.0);
        assert_eq!(cf.contributors[0].risk_probability, 0.3);
    }
}
