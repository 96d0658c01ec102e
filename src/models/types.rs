//! types.rs
//! Configuración del servicio y del cálculo de riesgo.
//!
//! `RiskCfg` es el único juego canónico de constantes (banda de salida,
//! pesos de mezcla, tablas de cortes, radios de transición).

use serde::{Deserialize, Serialize};

use crate::error::FloodError;

#[derive(Clone, Debug)]
pub struct AppCfg {
    /// Dirección/puerto del servidor HTTP (Axum)
    pub bind: String,

    /// Clave OpenWeatherMap (opcional). Si falta, sólo clima sintético.
    pub openweather_key: Option<String>,
    pub openweather_url: String,

    /// Timeout de cada request externa (segundos)
    pub weather_timeout_s: u64,

    /// Días de la ventana de lluvia
    pub window_days: usize,

    /// Clasificador a cargar: "synthetic" o "none"
    pub model: String,

    /// JSON opcional que sobreescribe `RiskCfg`
    pub risk_cfg_path: Option<String>,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:10000".into(),
            openweather_key: None,
            openweather_url: "https://api.openweathermap.org/data/2.5".into(),
            weather_timeout_s: 10,
            window_days: 7,
            model: "synthetic".into(),
            risk_cfg_path: None,
        }
    }
}

/// Tabla de cortes descendentes: el primer `x > umbral` devuelve su valor.
/// Por debajo del último corte se usa una rampa `max(floor, x / divisor)`
/// limitada al valor del último corte, así la tabla es monótona.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakpointTable {
    pub steps: Vec<(f64, f64)>,
    pub ramp_divisor: f64,
    pub floor: f64,
}

impl BreakpointTable {
    pub fn eval(&self, x: f64) -> f64 {
        for &(thr, v) in &self.steps {
            if x > thr {
                return v;
            }
        }
        let ceiling = self.steps.last().map(|s| s.1).unwrap_or(f64::INFINITY);
        (x / self.ramp_divisor).max(self.floor).min(ceiling)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackCfg {
    pub rain_1day: BreakpointTable,
    pub rain_3day: BreakpointTable,
    pub water_ratio: BreakpointTable,
    pub w_rain: f64,
    pub w_cumulative: f64,
    pub w_water: f64,
    pub w_geo: f64,
    pub geo_cap: f64,
    /// Riesgo base constante para días secos
    pub base: f64,
    pub season_monsoon: f64,
    pub season_shoulder: f64,
    pub season_dry: f64,
    pub frequent_flood_min: f64,
    pub frequent_flood_mult: f64,
    pub min: f64,
    pub max: f64,
    pub confidence: f64,
}

impl Default for FallbackCfg {
    fn default() -> Self {
        Self {
            rain_1day: BreakpointTable {
                steps: vec![(30.0, 0.45), (20.0, 0.35), (12.0, 0.25), (6.0, 0.15)],
                ramp_divisor: 25.0,
                floor: 0.03,
            },
            rain_3day: BreakpointTable {
                steps: vec![(100.0, 0.5), (70.0, 0.4), (45.0, 0.3), (25.0, 0.18)],
                ramp_divisor: 80.0,
                floor: 0.03,
            },
            water_ratio: BreakpointTable {
                steps: vec![(0.95, 0.5), (0.85, 0.4), (0.75, 0.3), (0.65, 0.18)],
                ramp_divisor: 4.0,
                floor: 0.03,
            },
            w_rain: 0.20,
            w_cumulative: 0.18,
            w_water: 0.15,
            w_geo: 0.04,
            geo_cap: 0.15,
            base: 0.03,
            season_monsoon: 1.05,
            season_shoulder: 1.02,
            season_dry: 0.98,
            frequent_flood_min: 9.0,
            frequent_flood_mult: 1.01,
            min: 0.02,
            max: 0.35,
            confidence: 0.75,
        }
    }
}

/// Parámetros del nivel de agua estimado a partir de la lluvia.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterCfg {
    pub base_level: f64,
    pub elevation_gain: f64,
    pub river_gain: f64,
    pub rain_gain: f64,
    pub recent_gain: f64,
    pub decay: f64,
    /// Días previos que siguen aportando (además del actual)
    pub lag_days: usize,
    pub urban_runoff: f64,
    /// Desviación típica del ruido; 0 desactiva el jitter
    pub jitter_sd: f64,
    pub min_level: f64,
}

impl Default for WaterCfg {
    fn default() -> Self {
        Self {
            base_level: 2.8,
            elevation_gain: 2.2,
            river_gain: 0.8,
            rain_gain: 0.08,
            recent_gain: 0.04,
            decay: 0.7,
            lag_days: 2,
            urban_runoff: 0.3,
            jitter_sd: 0.12,
            min_level: 1.8,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpCfg {
    /// Grados, no km: por debajo se devuelve la estación tal cual.
    /// 0.008° son ~0.89 km en latitud y algo menos en longitud (~0.82 km a 23°N).
    pub snap_deg: f64,
    /// Grados; singularidad del peso
    pub singular_deg: f64,
    pub decay_k: f64,
    pub power_p: f64,
    pub epsilon: f64,
    pub smoothing_cap: f64,
    pub smoothing_norm: f64,
    pub top_n: usize,
}

impl Default for InterpCfg {
    fn default() -> Self {
        Self {
            snap_deg: 0.008,
            singular_deg: 0.001,
            decay_k: 8.0,
            power_p: 1.5,
            epsilon: 0.01,
            smoothing_cap: 0.4,
            smoothing_norm: 3.0,
            top_n: 3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionCfg {
    pub base_radius_deg: f64,
    pub river_near_km: f64,
    pub river_mid_km: f64,
    pub river_near_mult: f64,
    pub river_mid_mult: f64,
    pub river_far_mult: f64,
    pub urban_high: f64,
    pub urban_low: f64,
    pub urban_high_mult: f64,
    pub urban_low_mult: f64,
    pub influence_exp: f64,
    pub min_influence: f64,
    /// Suavizado hacia el riesgo base por cada estación que contribuye
    pub smoothing_per_source: f64,
    pub smoothing_cap: f64,
    /// Confianza asignada a una estación cuyo cálculo ha fallado
    pub failed_confidence: f64,
    pub confidence_cap: f64,
    /// Confianza en coordenadas interpoladas: `max(floor, base - suavizado * slope)`
    pub interp_confidence_base: f64,
    pub interp_confidence_slope: f64,
    pub interp_confidence_floor: f64,
}

impl Default for TransitionCfg {
    fn default() -> Self {
        Self {
            base_radius_deg: 0.12,
            river_near_km: 2.0,
            river_mid_km: 10.0,
            river_near_mult: 1.3,
            river_mid_mult: 1.1,
            river_far_mult: 0.9,
            urban_high: 0.8,
            urban_low: 0.4,
            urban_high_mult: 0.85,
            urban_low_mult: 1.15,
            influence_exp: 1.8,
            min_influence: 0.05,
            smoothing_per_source: 0.15,
            smoothing_cap: 0.75,
            failed_confidence: 0.6,
            confidence_cap: 0.95,
            interp_confidence_base: 0.9,
            interp_confidence_slope: 0.3,
            interp_confidence_floor: 0.6,
        }
    }
}

/// Caja geográfica soportada (Bangladesh)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsCfg {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for BoundsCfg {
    fn default() -> Self {
        Self { min_lat: 20.5, max_lat: 26.7, min_lon: 88.0, max_lon: 92.8 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCfg {
    pub extreme: f64,
    pub critical: f64,
    pub high: f64,
    pub moderate: f64,
    pub low: f64,
}

impl Default for TierCfg {
    fn default() -> Self {
        Self { extreme: 0.85, critical: 0.75, high: 0.6, moderate: 0.4, low: 0.2 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCfg {
    /// Banda de salida: toda probabilidad devuelta cae en [risk_min, risk_max]
    pub risk_min: f64,
    pub risk_max: f64,

    pub w_raw: f64,
    pub w_geo: f64,
    pub w_history: f64,
    /// Frecuencia histórica que satura el término histórico
    pub history_norm: f64,

    pub temporal_smoothing: f64,
    pub base_risk_cap: f64,

    /// Lluvia de 3 días por encima de esta fracción de la anual = extrema
    pub extreme_rain_annual_frac: f64,
    /// Nivel por encima de esta fracción del umbral = extremo
    pub extreme_water_ratio: f64,
    pub boost_both: f64,
    pub boost_single: f64,

    /// Meses del monzón, inclusive
    pub monsoon_months: (u32, u32),
    pub shoulder_months: Vec<u32>,

    /// Desviación máxima respecto a la estación principal en coordenadas interpoladas
    pub max_primary_deviation: f64,
    pub alert_threshold: f64,

    pub fallback: FallbackCfg,
    pub water: WaterCfg,
    pub interp: InterpCfg,
    pub transition: TransitionCfg,
    pub bounds: BoundsCfg,
    pub tiers: TierCfg,
}

impl Default for RiskCfg {
    fn default() -> Self {
        Self {
            risk_min: 0.02,
            risk_max: 0.95,
            w_raw: 0.70,
            w_geo: 0.20,
            w_history: 0.10,
            history_norm: 15.0,
            temporal_smoothing: 0.70,
            base_risk_cap: 0.08,
            extreme_rain_annual_frac: 0.05,
            extreme_water_ratio: 0.90,
            boost_both: 0.03,
            boost_single: 0.01,
            monsoon_months: (6, 9),
            shoulder_months: vec![5, 10],
            max_primary_deviation: 0.15,
            alert_threshold: 0.4,
            fallback: FallbackCfg::default(),
            water: WaterCfg::default(),
            interp: InterpCfg::default(),
            transition: TransitionCfg::default(),
            bounds: BoundsCfg::default(),
            tiers: TierCfg::default(),
        }
    }
}

impl RiskCfg {
    pub fn is_monsoon(&self, month: u32) -> bool {
        let (a, b) = self.monsoon_months;
        (a..=b).contains(&month)
    }

    /// Rechaza combinaciones que harían fallar el acotado en tiempo de ejecución.
    pub fn validate(&self) -> Result<(), FloodError> {
        if !(self.risk_min.is_finite() && self.risk_max.is_finite() && self.risk_min < self.risk_max) {
            return Err(FloodError::Config(format!("empty risk band [{}, {}]", self.risk_min, self.risk_max)));
        }
        if !(self.max_primary_deviation.is_finite() && self.max_primary_deviation >= 0.0) {
            return Err(FloodError::Config(format!("max_primary_deviation must be >= 0, got {}", self.max_primary_deviation)));
        }
        if !(0.0..=1.0).contains(&self.temporal_smoothing) {
            return Err(FloodError::Config(format!("temporal_smoothing outside [0, 1]: {}", self.temporal_smoothing)));
        }
        let fb = &self.fallback;
        if !(fb.min.is_finite() && fb.max.is_finite() && fb.min <= fb.max) {
            return Err(FloodError::Config(format!("empty fallback band [{}, {}]", fb.min, fb.max)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_table_is_monotone_across_ramp_edge() {
        let t = FallbackCfg::default().rain_3day;
        let mut prev = 0.0;
        let mut x = 0.0;
        while x < 150.0 {
            let v = t.eval(x);
            assert!(v >= prev, "eval({x}) = {v} < {prev}");
            prev = v;
            x += 0.25;
        }
    }

    #[test]
    fn breakpoint_table_steps() {
        let t = FallbackCfg::default().rain_1day;
        assert_eq!(t.eval(0.0), 0.03);
        assert!((t.eval(2.5) - 0.1).abs() < 1e-12);
        assert_eq!(t.eval(5.9), 0.15);
        assert_eq!(t.eval(12.5), 0.25);
        assert_eq!(t.eval(31.0), 0.45);
    }

    #[test]
    fn partial_json_overrides_keep_defaults() {
        let cfg: RiskCfg = serde_json::from_str(r#"{ "risk_max": 0.45, "interp": { "decay_k": 6.0 } }"#).unwrap();
        assert_eq!(cfg.risk_max, 0.45);
        assert_eq!(cfg.risk_min, 0.02);
        assert_eq!(cfg.interp.decay_k, 6.0);
        assert_eq!(cfg.interp.snap_deg, 0.008);
    }

    #[test]
    fn monsoon_range_inclusive() {
        let cfg = RiskCfg::default();
        assert!(cfg.is_monsoon(6));
        assert!(cfg.is_monsoon(9));
        assert!(!cfg.is_monsoon(10));
    }

    #[test]
    fn default_cfg_validates() {
        assert!(RiskCfg::default().validate().is_ok());
    }

    #[test]
    fn negative_primary_deviation_rejected() {
        let cfg: RiskCfg = serde_json::from_str(r#"{ "max_primary_deviation": -0.1 }"#).unwrap();
        assert!(matches!(cfg.validate(), Err(FloodError::Config(m)) if m.contains("max_primary_deviation")));
    }

    #[test]
    fn inverted_band_rejected() {
        let cfg: RiskCfg = serde_json::from_str(r#"{ "risk_min": 0.5, "risk_max": 0.4 }"#).unwrap();
        assert!(cfg.validate().is_err());
    }
}
