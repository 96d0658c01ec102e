//! map.rs
//! GeoJSON de estaciones coloreadas por riesgo (rampa verde -> rojo).

use geojson::GeoJson;
use serde_json::json;

use crate::models::estimate::RiskEstimate;
use crate::models::profile::LocationProfile;
use crate::models::types::RiskCfg;

fn color_from_norm(x: f64) -> &'static str {
    const R: [&str; 11] = [
        "#e9f7ef", "#d4f2e3", "#bfeacc", "#a9e3b6", "#fff3b0",
        "#ffe08a", "#ffc266", "#ff9f58", "#ff7a55", "#f5544f", "#d73a49",
    ];
    let i = (x.clamp(0.0, 1.0) * 10.0).floor() as usize;
    R[i]
}

/// Normaliza la probabilidad dentro de la banda de salida.
fn band_norm(p: f64, cfg: &RiskCfg) -> f64 {
    let span = cfg.risk_max - cfg.risk_min;
    if span > 0.0 {
        (p - cfg.risk_min) / span
    } else {
        0.0
    }
}

pub fn locations_geojson(items: &[(&LocationProfile, RiskEstimate)], cfg: &RiskCfg) -> String {
    let features: Vec<serde_json::Value> = items
        .iter()
        .map(|(p, est)| {
            let color = color_from_norm(band_norm(est.risk_probability, cfg));
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [p.longitude, p.latitude] },
                "properties": {
                    "name": p.name,
                    "risk_probability": (est.risk_probability * 1000.0).round() / 1000.0,
                    "status": est.status.label(),
                    "risk_level": est.status.css_class(),
                    "confidence": (est.confidence * 100.0).round() / 100.0,
                    "style": {
                        "marker-color": color,
                        "fillColor": color, "fillOpacity": 0.85, "color": color, "weight": 1
                    }
                }
            })
        })
        .collect();

    let gj = json!({ "type": "FeatureCollection", "features": features });
    GeoJson::from_json_value(gj)
        .unwrap_or(GeoJson::FeatureCollection(Default::default()))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_ends() {
        assert_eq!(color_from_norm(-1.0), "#e9f7ef");
        assert_eq!(color_from_norm(0.0), "#e9f7ef");
        assert_eq!(color_from_norm(1.0), "#d73a49");
        assert_eq!(color_from_norm(0.5), "#ffe08a");
        assert_eq!(color_from_norm(f64::NAN), "#e9f7ef");
    }

    #[test]
    fn band_norm_maps_band_to_unit() {
        let cfg = RiskCfg::default();
        assert_eq!(band_norm(cfg.risk_min, &cfg), 0.0);
        assert!((band_norm(cfg.risk_max, &cfg) - 1.0).abs() < 1e-12);
    }
}
