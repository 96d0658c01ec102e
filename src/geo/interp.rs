//! interp.rs
//!
//! Perfil para coordenadas arbitrarias por ponderación inversa a la
//! distancia con decaimiento exponencial sobre las estaciones conocidas.
//!
//! - Si el punto está a menos de `snap_deg` de una estación, se devuelve
//!   esa estación tal cual (sin ruido de interpolación).
//! - Pesos `exp(-d*k) / (d^p + eps)`, normalizados a 1.
//! - Atributos numéricos: suma ponderada. Drenaje: puntuación ponderada y
//!   re-bucketing a categoría.
//! - Suavizado hacia la media de todas las estaciones, proporcional a la
//!   distancia máxima, para no extrapolar lejos de todo.

use std::sync::Arc;

use crate::geo::degree_distance;
use crate::geo::store::GeographicProfileStore;
use crate::models::profile::{DrainageQuality, InterpolatedProfile, LocationProfile, LocationWeight, ProfileView};
use crate::models::types::InterpCfg;

#[derive(Clone, Debug)]
pub struct SpatialInterpolator {
    store: Arc<GeographicProfileStore>,
    cfg: InterpCfg,
}

impl SpatialInterpolator {
    pub fn new(store: Arc<GeographicProfileStore>, cfg: InterpCfg) -> Self {
        Self { store, cfg }
    }

    pub fn store(&self) -> &GeographicProfileStore {
        &self.store
    }

    /// Distancia en grados a cada estación, en el orden de la tabla.
    pub fn distances(&self, lat: f64, lon: f64) -> Vec<(&LocationProfile, f64)> {
        self.store
            .all()
            .iter()
            .map(|p| (p, degree_distance(lat, lon, p.latitude, p.longitude)))
            .collect()
    }

    /// Pesos normalizados de todas las estaciones (suman 1).
    pub fn weights(&self, lat: f64, lon: f64) -> Vec<LocationWeight> {
        let dists = self.distances(lat, lon);
        let raw: Vec<f64> = dists.iter().map(|(_, d)| self.raw_weight(*d)).collect();
        let mut total: f64 = raw.iter().sum();
        let raw = if total > 0.0 && total.is_finite() {
            raw
        } else {
            // exp() se anula muy lejos de todo: inverso puro a la distancia
            let inv: Vec<f64> = dists.iter().map(|(_, d)| 1.0 / (d.powf(self.cfg.power_p) + self.cfg.epsilon)).collect();
            total = inv.iter().sum();
            inv
        };
        dists
            .iter()
            .zip(raw)
            .map(|((p, _), w)| LocationWeight { name: p.name.clone(), weight: w / total })
            .collect()
    }

    #[inline]
    fn raw_weight(&self, d: f64) -> f64 {
        (-d * self.cfg.decay_k).exp() / (d.powf(self.cfg.power_p) + self.cfg.epsilon)
    }

    pub fn interpolate(&self, lat: f64, lon: f64) -> ProfileView {
        let dists = self.distances(lat, lon);

        let nearest = dists
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, d)| (*p, *d));
        if let Some((p, d)) = nearest {
            if d < self.cfg.snap_deg || d < self.cfg.singular_deg {
                return ProfileView::Exact(p.clone());
            }
        }

        let weights = self.weights(lat, lon);
        let profiles = self.store.all();

        let blend = |f: fn(&LocationProfile) -> f64| -> f64 {
            profiles.iter().zip(&weights).map(|(p, w)| f(p) * w.weight).sum()
        };

        let elevation = blend(|p| p.elevation_m);
        let river = blend(|p| p.river_distance_km);
        let base_risk = blend(|p| p.base_risk_factor);
        let urban = blend(|p| p.urbanization_factor);
        let rainfall = blend(|p| p.annual_rainfall_mm);
        let frequency = blend(|p| p.flood_history_frequency);
        let threshold = blend(|p| p.flood_threshold_m);
        let confluence = blend(|p| p.river_confluence_km);
        let density = blend(|p| p.population_density);
        let drainage_score = blend(|p| p.drainage_quality.score());

        let max_d = dists.iter().map(|(_, d)| *d).fold(0.0_f64, f64::max);
        let smoothing = (max_d / self.cfg.smoothing_norm).min(self.cfg.smoothing_cap);

        let n = profiles.len().max(1) as f64;
        let avg = |f: fn(&LocationProfile) -> f64| -> f64 { profiles.iter().map(f).sum::<f64>() / n };
        let smooth = |v: f64, mean: f64| v * (1.0 - smoothing) + mean * smoothing;

        let mut ranked = weights.clone();
        ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        let primary = ranked
            .first()
            .and_then(|w| profiles.iter().find(|p| p.name == w.name))
            .unwrap_or(&profiles[0]);
        ranked.truncate(self.cfg.top_n);

        let profile = LocationProfile {
            name: format!("Interpolated ({lat:.3}, {lon:.3})"),
            latitude: lat,
            longitude: lon,
            elevation_m: smooth(elevation, avg(|p| p.elevation_m)),
            river_distance_km: river,
            drainage_quality: DrainageQuality::from_score(drainage_score),
            urbanization_factor: smooth(urban, avg(|p| p.urbanization_factor)),
            annual_rainfall_mm: rainfall,
            flood_history_frequency: frequency,
            base_risk_factor: smooth(base_risk, avg(|p| p.base_risk_factor)),
            flood_threshold_m: threshold,
            river_confluence_km: confluence,
            soil_type: primary.soil_type,
            topography: primary.topography,
            population_density: density,
            river_systems: primary.river_systems.clone(),
        };

        ProfileView::Interpolated(InterpolatedProfile {
            profile,
            interpolated: true,
            primary_influence: primary.name.clone(),
            smoothing_applied: smoothing,
            weight_distribution: ranked,
        })
    }
}
