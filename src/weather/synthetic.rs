//! synthetic.rs
//!
//! Lluvia diaria sintética cuando no hay proveedor externo. Determinista:
//! la semilla sale de la coordenada y la fecha final, así dos peticiones
//! iguales el mismo día ven la misma ventana.
//!
//! Por día: 30% de probabilidad de lluvia; cantidad exponencial con media
//! `anual/365 * estacional(mes)`; 5% de días extremos (x3..x8); tope 100 mm.

use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::weather::{WeatherSample, WeatherWindow};

pub const RAIN_CHANCE: f64 = 0.30;
pub const EXTREME_CHANCE: f64 = 0.05;
pub const DAILY_CAP_MM: f64 = 100.0;

/// Multiplicador estacional de la lluvia media diaria (monzón jun-sep).
pub fn seasonal_multiplier(month: u32) -> f64 {
    match month {
        1 => 0.1,
        2 => 0.2,
        3 => 0.3,
        4 => 0.6,
        5 => 1.2,
        6 => 2.5,
        7 => 3.0,
        8 => 2.8,
        9 => 2.0,
        10 => 1.0,
        11 => 0.4,
        _ => 0.2,
    }
}

pub(crate) fn seed_for(lat: f64, lon: f64, day: NaiveDate, salt: u64) -> u64 {
    let d = day.num_days_from_ce() as u64;
    (lat.to_bits().rotate_left(7) ^ lon.to_bits().rotate_left(29) ^ d.wrapping_mul(0xA24B_AED4_963E_E407)) ^ salt
}

/// Ventana de `days` días terminando en `today`.
pub fn synthetic_window(lat: f64, lon: f64, annual_rainfall_mm: f64, today: NaiveDate, days: usize) -> WeatherWindow {
    let mut rng = ChaCha8Rng::seed_from_u64(seed_for(lat, lon, today, 0));
    let daily_mean = annual_rainfall_mm.max(0.0) / 365.0;

    let samples = (0..days)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back as i64);
            let mean = daily_mean * seasonal_multiplier(date.month());
            let mut rain = 0.0;
            if rng.gen_bool(RAIN_CHANCE) {
                let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                rain = -mean * u.ln();
                if rng.gen_bool(EXTREME_CHANCE) {
                    rain *= rng.gen_range(3.0..8.0);
                }
            }
            WeatherSample { date, rainfall_mm: rain.min(DAILY_CAP_MM) }
        })
        .collect();
    WeatherWindow::new(samples)
}

/// Variación espacial determinista de ±`amplitude` sobre cada día.
pub fn with_spatial_variation(w: &WeatherWindow, lat: f64, lon: f64, amplitude: f64) -> WeatherWindow {
    let Some(last) = w.last_date() else {
        return w.clone();
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed_for(lat, lon, last, 0x5EED));
    let samples = w
        .samples()
        .iter()
        .map(|s| {
            let f = 1.0 + (rng.gen::<f64>() - 0.5) * 2.0 * amplitude;
            WeatherSample { date: s.date, rainfall_mm: (s.rainfall_mm * f).max(0.0) }
        })
        .collect();
    WeatherWindow::new(samples)
}
