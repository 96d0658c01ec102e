//! blend.rs
//!
//! Zonas de transición: cuando un punto cae dentro del radio de influencia
//! de varias estaciones se mezclan sus estimaciones individuales.
//!
//! Radio por estación = base * mult_río * mult_urbano. Influencia
//! `max(min, (1 - d/r)^exp)` para `d <= r`, normalizada; se descartan aportes menores
//! que `min_influence` y se renormaliza.
//!
//! Con 0 o 1 estaciones en zona se estima sobre el perfil interpolado; si
//! éste es sintético el resultado no se aleja más de `max_primary_deviation`
//! de la estimación de la estación principal.

use tracing::{debug, warn};

use crate::error::FloodError;
use crate::geo::check_bounds;
use crate::geo::degree_distance;
use crate::geo::interp::SpatialInterpolator;
use crate::models::estimate::{clamp_finite, Contribution, ContributingFactors, PredictionMethod, RiskEstimate, RiskTier};
use crate::models::profile::{LocationProfile, ProfileView};
use crate::models::types::RiskCfg;
use crate::risk::estimator::RiskEstimator;
use crate::risk::hazard::geographic_risk;
use crate::weather::WeatherWindow;

#[derive(Clone, Debug)]
pub struct TransitionBlender {
    interp: SpatialInterpolator,
    estimator: RiskEstimator,
}

/// Perfil inutilizable para estimar (valores no finitos o umbral nulo).
fn check_profile(p: &LocationProfile) -> Result<(), String> {
    let numeric = [
        p.latitude,
        p.longitude,
        p.elevation_m,
        p.river_distance_km,
        p.urbanization_factor,
        p.annual_rainfall_mm,
        p.flood_history_frequency,
        p.base_risk_factor,
        p.flood_threshold_m,
    ];
    if numeric.iter().any(|x| !x.is_finite()) {
        return Err(format!("{}: non-finite profile attribute", p.name));
    }
    if p.flood_threshold_m <= 0.0 {
        return Err(format!("{}: flood threshold must be positive", p.name));
    }
    Ok(())
}

impl TransitionBlender {
    pub fn new(interp: SpatialInterpolator, estimator: RiskEstimator) -> Self {
        Self { interp, estimator }
    }

    fn cfg(&self) -> &RiskCfg {
        self.estimator.cfg()
    }

    pub fn interpolator(&self) -> &SpatialInterpolator {
        &self.interp
    }

    pub fn estimator(&self) -> &RiskEstimator {
        &self.estimator
    }

    /// Estimación para una estación registrada.
    pub fn estimate_named(&self, name: &str, window: &WeatherWindow) -> Result<RiskEstimate, FloodError> {
        let p = self.interp.store().get(name)?;
        Ok(self.estimator.estimate(p, window))
    }

    /// Radio de influencia (grados) ajustado por río y urbanización.
    pub fn influence_radius(&self, p: &LocationProfile) -> f64 {
        let t = &self.cfg().transition;
        let river = if p.river_distance_km < t.river_near_km {
            t.river_near_mult
        } else if p.river_distance_km < t.river_mid_km {
            t.river_mid_mult
        } else {
            t.river_far_mult
        };
        let urban = if p.urbanization_factor > t.urban_high {
            t.urban_high_mult
        } else if p.urbanization_factor < t.urban_low {
            t.urban_low_mult
        } else {
            1.0
        };
        t.base_radius_deg * river * urban
    }

    /// Estaciones cuyo radio contiene el punto, con influencia normalizada.
    pub fn influences(&self, lat: f64, lon: f64) -> Vec<(&LocationProfile, f64)> {
        let t = &self.cfg().transition;
        let mut zones: Vec<(&LocationProfile, f64)> = self
            .interp
            .store()
            .all()
            .iter()
            .filter_map(|p| {
                let d = degree_distance(lat, lon, p.latitude, p.longitude);
                let r = self.influence_radius(p);
                (d <= r).then(|| (p, (1.0 - d / r).powf(t.influence_exp).max(t.min_influence)))
            })
            .collect();

        normalize(&mut zones);
        if zones.len() > 1 {
            zones.retain(|(_, w)| *w >= t.min_influence);
            normalize(&mut zones);
        }
        zones
    }

    pub fn blend(&self, lat: f64, lon: f64, window: &WeatherWindow) -> Result<RiskEstimate, FloodError> {
        check_bounds(lat, lon, &self.cfg().bounds)?;

        let zones = self.influences(lat, lon);
        if zones.len() <= 1 {
            return self.single(lat, lon, window);
        }

        let t = &self.cfg().transition;
        let mut contributors = Vec::with_capacity(zones.len());
        let mut estimates = Vec::with_capacity(zones.len());
        for (p, w) in &zones {
            let est = match check_profile(p) {
                Ok(()) => self.estimator.estimate(p, window),
                Err(reason) => {
                    warn!("transition contributor {} failed: {reason}", p.name);
                    self.estimator.fallback_estimate(p, window, &reason)
                }
            };
            contributors.push(Contribution {
                location: p.name.clone(),
                influence: *w,
                risk_probability: est.risk_probability,
                confidence: est.confidence,
                degraded: est.contributing_factors.degraded,
            });
            estimates.push(est);
        }

        let den: f64 = contributors.iter().map(|c| c.influence * c.confidence).sum();
        let blended = if den > 0.0 && den.is_finite() {
            contributors.iter().map(|c| c.risk_probability * c.influence * c.confidence).sum::<f64>() / den
        } else {
            contributors.iter().map(|c| c.risk_probability).sum::<f64>() / contributors.len() as f64
        };

        let lo = contributors.iter().map(|c| c.risk_probability).fold(f64::INFINITY, f64::min);
        let hi = contributors.iter().map(|c| c.risk_probability).fold(f64::NEG_INFINITY, f64::max);

        // ancla: riesgo base del perfil interpolado, dentro del rango de los aportes
        let view = self.interp.interpolate(lat, lon);
        let anchor = clamp_finite(view.profile().base_risk_factor, lo, hi);
        let smoothing = (t.smoothing_per_source * contributors.len() as f64).min(t.smoothing_cap);
        let smoothed = blended * (1.0 - smoothing) + anchor * smoothing;

        let risk_probability = clamp_finite(smoothed, self.cfg().risk_min, self.cfg().risk_max);
        let confidence = clamp_finite(
            contributors.iter().map(|c| c.confidence * c.influence).sum::<f64>().min(t.confidence_cap),
            0.0,
            1.0,
        );

        let reasons: Vec<String> = estimates
            .iter()
            .filter_map(|e| e.contributing_factors.degraded_reason.clone())
            .collect();
        debug!("transition blend ({lat:.4}, {lon:.4}): {} sources -> {risk_probability:.3}", contributors.len());

        Ok(RiskEstimate {
            risk_probability,
            confidence,
            status: RiskTier::classify(risk_probability, &self.cfg().tiers),
            contributing_factors: ContributingFactors {
                method: PredictionMethod::TransitionBlend,
                degraded: !reasons.is_empty(),
                degraded_reason: (!reasons.is_empty()).then(|| reasons.join("; ")),
                raw_probability: clamp_finite(blended, 0.0, 1.0),
                features: None,
                geographic_risk: geographic_risk(view.profile()),
                flood_threshold_m: view.profile().flood_threshold_m,
                extreme_rain: estimates.iter().any(|e| e.contributing_factors.extreme_rain),
                extreme_water: estimates.iter().any(|e| e.contributing_factors.extreme_water),
                smoothing_applied: smoothing,
                contributors,
            }
            .sanitized(),
        })
    }

    /// Sin solapamiento: estimación sobre el perfil (exacto o interpolado).
    fn single(&self, lat: f64, lon: f64, window: &WeatherWindow) -> Result<RiskEstimate, FloodError> {
        let view = self.interp.interpolate(lat, lon);
        let mut est = self.estimator.estimate(view.profile(), window);

        if let ProfileView::Interpolated(ip) = &view {
            let primary = self.interp.store().get(&ip.primary_influence)?;
            let anchor = self.estimator.estimate(primary, window).risk_probability;
            let dev = self.cfg().max_primary_deviation.max(0.0);
            let limited = clamp_finite(est.risk_probability, anchor - dev, anchor + dev);
            est.risk_probability = clamp_finite(limited, self.cfg().risk_min, self.cfg().risk_max);
            est.status = RiskTier::classify(est.risk_probability, &self.cfg().tiers);

            // menos confianza cuanto más sintético es el perfil
            let t = &self.cfg().transition;
            let c = (t.interp_confidence_base - ip.smoothing_applied * t.interp_confidence_slope).max(t.interp_confidence_floor);
            est.confidence = clamp_finite(c, 0.0, 1.0);
            est.contributing_factors.smoothing_applied = clamp_finite(ip.smoothing_applied, 0.0, 1.0);
        }
        Ok(est)
    }
}

fn normalize(zones: &mut [(&LocationProfile, f64)]) {
    let total: f64 = zones.iter().map(|(_, w)| *w).sum();
    if total > 0.0 {
        for (_, w) in zones.iter_mut() {
            *w /= total;
        }
    }
}
