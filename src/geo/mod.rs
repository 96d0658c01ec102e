//! geo
//!
//! Utilidades geográficas: distancia euclídea en grados (la que usan
//! interpolación y zonas de transición), haversine en km para informar
//! distancias reales, y validación de la caja soportada.

pub mod interp;
pub mod store;

use crate::error::FloodError;
use crate::models::types::BoundsCfg;

/// Distancia euclídea en espacio de grados.
#[inline]
pub fn degree_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    ((lat1 - lat2).powi(2) + (lon1 - lon2).powi(2)).sqrt()
}

#[inline]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let r = 6371.0_f64;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * r * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Rechaza coordenadas no finitas o fuera de la caja antes de calcular nada.
pub fn check_bounds(lat: f64, lon: f64, b: &BoundsCfg) -> Result<(), FloodError> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(FloodError::InvalidInput { lat, lon, reason: "non-finite coordinate".into() });
    }
    if lat < b.min_lat || lat > b.max_lat || lon < b.min_lon || lon > b.max_lon {
        return Err(FloodError::InvalidInput {
            lat,
            lon,
            reason: "coordinates outside Bangladesh boundaries".into(),
        });
    }
    Ok(())
}
