//! features.rs
//!
//! Nivel de agua estimado por día a partir de la lluvia y vector de 9
//! features para el clasificador.
//!
//! nivel(i) = base(perfil) + lluvia(i)*gain*drenaje*urbano
//!          + sum_{j=i-2..i} lluvia(j)*decay^(i-j) * recent_gain*drenaje
//!          + jitter
//!
//! El jitter sale de un ChaCha8 sembrado con el perfil y la ventana, así
//! que la misma entrada produce siempre la misma serie.

use chrono::Datelike;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::estimate::FeatureVector;
use crate::models::profile::LocationProfile;
use crate::models::types::{RiskCfg, WaterCfg};
use crate::risk::hazard::geographic_risk;
use crate::weather::WeatherWindow;

/// Nivel base (sin lluvia) de un perfil.
pub fn base_water_level(p: &LocationProfile, cfg: &WaterCfg) -> f64 {
    let elevation_factor = (1.0 - p.elevation_m / 50.0).max(0.3);
    let river_proximity = (1.0 - p.river_distance_km / 20.0).max(0.5);
    cfg.base_level + elevation_factor * cfg.elevation_gain + river_proximity * cfg.river_gain
}

fn jitter_seed(p: &LocationProfile, w: &WeatherWindow) -> u64 {
    let day = w.last_date().map(|d| d.num_days_from_ce() as u64).unwrap_or(0);
    p.latitude.to_bits() ^ p.longitude.to_bits().rotate_left(21) ^ day.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Normal(0, sd) por Box-Muller.
fn gaussian(rng: &mut ChaCha8Rng, sd: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    sd * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

pub fn water_levels(p: &LocationProfile, w: &WeatherWindow, cfg: &WaterCfg) -> Vec<f64> {
    let base = base_water_level(p, cfg);
    let drainage = p.drainage_quality.runoff_multiplier();
    let urban = 1.0 + p.urbanization_factor * cfg.urban_runoff;
    let rain: Vec<f64> = w.rainfall().collect();

    let mut rng = ChaCha8Rng::seed_from_u64(jitter_seed(p, w));
    let mut out = Vec::with_capacity(rain.len());
    for (i, &r) in rain.iter().enumerate() {
        let recent: f64 = (i.saturating_sub(cfg.lag_days)..=i)
            .map(|j| rain[j] * cfg.decay.powi((i - j) as i32))
            .sum();
        let noise = if cfg.jitter_sd > 0.0 { gaussian(&mut rng, cfg.jitter_sd) } else { 0.0 };
        let level = base + r * cfg.rain_gain * drainage * urban + recent * cfg.recent_gain * drainage + noise;
        out.push(level.max(cfg.min_level));
    }
    out
}

/// Pendiente del nivel en los últimos 3 días.
pub fn water_trend(levels: &[f64]) -> f64 {
    if levels.len() >= 3 {
        let recent = &levels[levels.len() - 3..];
        (recent[2] - recent[0]) / 2.0
    } else {
        0.0
    }
}

/// Features agregadas para un perfil y una ventana. Devuelve también la
/// serie de niveles usada.
pub fn build_features(p: &LocationProfile, w: &WeatherWindow, cfg: &RiskCfg) -> (FeatureVector, Vec<f64>) {
    let levels = water_levels(p, w, &cfg.water);
    let latest_level = levels.last().copied().unwrap_or_else(|| base_water_level(p, &cfg.water));
    let monsoon = w.last_date().map(|d| cfg.is_monsoon(d.month())).unwrap_or(false);

    let fv = FeatureVector {
        rainfall_1day: w.latest(),
        rainfall_3day: w.trailing_sum(3),
        rainfall_7day: w.trailing_sum(7),
        water_level_lag1: latest_level,
        water_level_trend: water_trend(&levels),
        is_monsoon: if monsoon { 1.0 } else { 0.0 },
        elevation: p.elevation_m,
        river_distance: p.river_distance_km,
        geographic_risk: geographic_risk(p),
    };
    (fv, levels)
}
