//! weather
//!
//! Ventana de lluvia diaria (más reciente al final) y su origen:
//! OpenWeatherMap si hay clave, o generador sintético determinista.

pub mod openweather;
pub mod synthetic;

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::degree_distance;
use crate::geo::store::GeographicProfileStore;
use crate::models::profile::LocationProfile;
use crate::models::types::AppCfg;
use openweather::{current_url, fetch_current, window_from_current};
use synthetic::{synthetic_window, with_spatial_variation};

/// Estaciones a menos de esta distancia (grados) aportan a la lluvia de una coordenada
pub const NEARBY_DEG: f64 = 2.0;
/// Variación espacial relativa de la lluvia interpolada
pub const SPATIAL_VARIATION: f64 = 0.075;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub date: NaiveDate,
    pub rainfall_mm: f64,
}

/// Secuencia ordenada por fecha; lluvia saneada (finita, >= 0).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WeatherWindow(Vec<WeatherSample>);

impl WeatherWindow {
    pub fn new(mut samples: Vec<WeatherSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        for s in &mut samples {
            if !s.rainfall_mm.is_finite() || s.rainfall_mm < 0.0 {
                s.rainfall_mm = 0.0;
            }
        }
        Self(samples)
    }

    /// Ventana de `days` días terminando en `last` con las lluvias dadas.
    pub fn from_rainfall(last: NaiveDate, rainfall: &[f64]) -> Self {
        let n = rainfall.len() as i64;
        let samples = rainfall
            .iter()
            .enumerate()
            .map(|(i, &r)| WeatherSample { date: last - chrono::Duration::days(n - 1 - i as i64), rainfall_mm: r })
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.0
    }

    pub fn rainfall(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|s| s.rainfall_mm)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.last().map(|s| s.date)
    }

    pub fn latest(&self) -> f64 {
        self.0.last().map(|s| s.rainfall_mm).unwrap_or(0.0)
    }

    /// Suma de los últimos `n` días.
    pub fn trailing_sum(&self, n: usize) -> f64 {
        self.0.iter().rev().take(n).map(|s| s.rainfall_mm).sum()
    }

    pub fn total(&self) -> f64 {
        self.rainfall().sum()
    }
}

/// Origen de la lluvia: OpenWeatherMap con fallback sintético, o sólo sintético.
#[derive(Clone, Debug)]
pub struct WeatherSource {
    owm: Option<(Client, String)>,
    base_url: String,
    days: usize,
}

impl WeatherSource {
    pub fn synthetic(days: usize) -> Self {
        Self { owm: None, base_url: String::new(), days }
    }

    pub fn from_cfg(cfg: &AppCfg) -> anyhow::Result<Self> {
        let owm = match cfg.openweather_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let client = Client::builder()
                    .brotli(true)
                    .gzip(true)
                    .deflate(true)
                    .timeout(Duration::from_secs(cfg.weather_timeout_s))
                    .build()?;
                Some((client, key.to_string()))
            }
            None => None,
        };
        Ok(Self { owm, base_url: cfg.openweather_url.clone(), days: cfg.window_days })
    }

    pub fn provider(&self) -> &'static str {
        if self.owm.is_some() {
            "openweathermap"
        } else {
            "synthetic"
        }
    }

    pub fn days(&self) -> usize {
        self.days
    }

    /// Ventana para una estación. Cualquier fallo de red cae al generador sintético.
    pub async fn window_for(&self, p: &LocationProfile, today: NaiveDate) -> WeatherWindow {
        if let Some((client, key)) = &self.owm {
            let url = current_url(&self.base_url, p.latitude, p.longitude, key);
            match fetch_current(client, &url).await {
                Ok(cw) => return window_from_current(cw.rain_1h(), p.latitude, p.longitude, today, self.days),
                Err(e) => warn!("weather {}: {e:#}; using synthetic data", p.name),
            }
        }
        synthetic_window(p.latitude, p.longitude, p.annual_rainfall_mm, today, self.days)
    }

    /// Ventana para una coordenada: media ponderada `1/(d+0.1)^2` de las
    /// estaciones cercanas, o la más cercana si no hay ninguna.
    pub async fn window_at(&self, lat: f64, lon: f64, store: &GeographicProfileStore, today: NaiveDate) -> WeatherWindow {
        let dists: Vec<(&LocationProfile, f64)> = store
            .all()
            .iter()
            .map(|p| (p, degree_distance(lat, lon, p.latitude, p.longitude)))
            .collect();

        let near: Vec<(&LocationProfile, f64)> = dists
            .iter()
            .filter(|(_, d)| *d < NEARBY_DEG)
            .map(|(p, d)| (*p, 1.0 / (d + 0.1).powi(2)))
            .collect();

        if near.is_empty() {
            return match dists.iter().min_by(|a, b| a.1.total_cmp(&b.1)) {
                Some((p, _)) => self.window_for(p, today).await,
                None => WeatherWindow::default(),
            };
        }

        let total: f64 = near.iter().map(|(_, w)| w).sum();
        let mut rain = vec![0.0; self.days];
        for (p, w) in &near {
            let win = self.window_for(p, today).await;
            for (acc, r) in rain.iter_mut().zip(win.rainfall()) {
                *acc += r * w / total;
            }
        }
        with_spatial_variation(&WeatherWindow::from_rainfall(today, &rain), lat, lon, SPATIAL_VARIATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rainfall_orders_and_sanitizes() {
        let last = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let w = WeatherWindow::from_rainfall(last, &[1.0, f64::NAN, -3.0, 4.0]);
        assert_eq!(w.len(), 4);
        assert_eq!(w.last_date(), Some(last));
        assert_eq!(w.samples()[0].date, NaiveDate::from_ymd_opt(2025, 7, 7).unwrap());
        assert_eq!(w.total(), 5.0);
        assert_eq!(w.trailing_sum(3), 4.0);
        assert_eq!(w.latest(), 4.0);
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 3).unwrap()
    }

    #[tokio::test]
    async fn synthetic_source_is_deterministic() {
        let store = GeographicProfileStore::bangladesh();
        let src = WeatherSource::synthetic(7);
        assert_eq!(src.provider(), "synthetic");
        let a = src.window_at(24.2, 90.5, &store, today()).await;
        let b = src.window_at(24.2, 90.5, &store, today()).await;
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
        assert_eq!(a.last_date(), Some(today()));
    }

    #[tokio::test]
    async fn far_point_uses_nearest_station() {
        let store = GeographicProfileStore::bangladesh();
        let src = WeatherSource::synthetic(7);
        // más de 2 grados de todas las estaciones
        let w = src.window_at(26.6, 93.9, &store, today()).await;
        let sylhet = src.window_for(store.get("Sylhet").unwrap(), today()).await;
        assert_eq!(w, sylhet);
    }

    #[test]
    fn empty_key_means_synthetic() {
        let cfg = AppCfg { openweather_key: Some(String::new()), ..AppCfg::default() };
        let src = WeatherSource::from_cfg(&cfg).unwrap();
        assert_eq!(src.provider(), "synthetic");
        assert_eq!(src.days(), 7);
    }
}
