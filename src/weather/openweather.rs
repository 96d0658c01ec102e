//! openweather.rs
//! Cliente OpenWeatherMap (tiempo actual). Sólo expone lluvia de la
//! última hora; la ventana se reconstruye a partir de ese valor.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::weather::synthetic::seed_for;
use crate::weather::{WeatherSample, WeatherWindow};

#[derive(Debug, Default, Deserialize)]
pub struct Rain {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub rain: Option<Rain>,
}

impl CurrentWeather {
    pub fn rain_1h(&self) -> f64 {
        self.rain.as_ref().and_then(|r| r.one_hour).unwrap_or(0.0)
    }
}

pub fn current_url(base: &str, lat: f64, lon: f64, key: &str) -> String {
    format!("{}/weather?lat={lat}&lon={lon}&appid={key}&units=metric", base.trim_end_matches('/'))
}

pub async fn fetch_current(client: &Client, url: &str) -> Result<CurrentWeather> {
    let resp = client.get(url).send().await?;
    match resp.status() {
        StatusCode::OK => {
            let body = resp.bytes().await?;
            serde_json::from_slice(&body).context("respuesta OpenWeatherMap")
        }
        // el url lleva la clave: no se loguea
        s => anyhow::bail!("HTTP {} en OpenWeatherMap", s),
    }
}

/// Ventana alrededor de la lluvia actual: base `max(1h*24, 1)` con
/// variación diaria `(0.5 + U) * (1 + 0.3 sin(0.5 i))`.
pub fn window_from_current(rain_1h: f64, lat: f64, lon: f64, today: NaiveDate, days: usize) -> WeatherWindow {
    let base = (rain_1h.max(0.0) * 24.0).max(1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed_for(lat, lon, today, 0x03A7));
    let samples = (0..days)
        .map(|i| {
            let date = today - Duration::days((days - 1 - i) as i64);
            let r = base * (0.5 + rng.gen::<f64>()) * (1.0 + 0.3 * (i as f64 * 0.5).sin());
            WeatherSample { date, rainfall_mm: r.max(0.0) }
        })
        .collect();
    WeatherWindow::new(samples)
}
