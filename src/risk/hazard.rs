//! hazard.rs
//! Puntuación de riesgo geográfico (feature 9 del clasificador), desglose
//! por tipo de inundación y recomendaciones por nivel.

use serde::Serialize;

use crate::models::estimate::{clamp_finite, RiskTier};
use crate::models::profile::{DrainageQuality, LocationProfile, Topography};

/// Riesgo geográfico estático de un perfil, en [0.02, 0.25].
pub fn geographic_risk(p: &LocationProfile) -> f64 {
    let elevation = match p.elevation_m {
        e if e < 5.0 => 0.9,
        e if e < 10.0 => 0.7,
        e if e < 20.0 => 0.4,
        e if e < 35.0 => 0.2,
        _ => 0.1,
    };
    let river = if p.river_distance_km <= 0.0 {
        1.0
    } else {
        (-p.river_distance_km / 10.0).exp().max(0.1)
    };
    let drainage = p.drainage_quality.score();
    let frequency = (p.flood_history_frequency / 15.0).min(0.9);
    let urban = p.urbanization_factor * 0.3;
    let rainfall = ((p.annual_rainfall_mm - 1200.0) / 2800.0).clamp(0.1, 0.8);
    let soil = p.soil_type.risk_factor();
    let confluence = (1.0 - p.river_confluence_km / 100.0).max(0.1);

    let r = (elevation * 0.12
        + river * 0.08
        + drainage * 0.06
        + frequency * 0.06
        + urban * 0.04
        + rainfall * 0.03
        + soil * 0.02
        + confluence * 0.01)
        * 0.5;
    if r.is_nan() {
        return 0.02;
    }
    r.clamp(0.02, 0.25)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
}

fn severity(x: f64, high: f64, moderate: f64) -> Severity {
    if x > high {
        Severity::High
    } else if x > moderate {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HazardEntry {
    pub risk_percentage: f64,
    pub severity_level: Severity,
    pub description: &'static str,
    pub typical_damage: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct HazardProfile {
    pub riverine: HazardEntry,
    pub urban_drainage: HazardEntry,
    pub flash: HazardEntry,
    pub tidal: HazardEntry,
}

/// Riesgo por tipo: desbordamiento fluvial, drenaje urbano, repentina, mareal.
pub fn hazard_profile(p: &LocationProfile) -> HazardProfile {
    let mut riverine = (1.0 - p.river_distance_km / 20.0).max(0.02);
    riverine *= 1.0 - p.elevation_m / 30.0;
    if p.flood_history_frequency > 8.0 {
        riverine *= 1.1;
    }

    let drainage_mult = match p.drainage_quality {
        DrainageQuality::Poor => 1.4,
        DrainageQuality::Moderate => 1.0,
        DrainageQuality::Good => 0.6,
    };
    let mut urban = p.urbanization_factor * 0.8 * drainage_mult;
    // ciudades con problemas de drenaje conocidos
    if p.drainage_quality == DrainageQuality::Poor && p.urbanization_factor >= 0.75 {
        urban *= 1.2;
    }

    let mut flash = (1.0 - p.elevation_m / 25.0) * 0.6;
    if matches!(p.topography, Topography::LowLyingUrban | Topography::RiverValley) {
        flash *= 1.3;
    }

    let tidal = if p.topography == Topography::CoastalLow {
        (1.0 - p.elevation_m / 8.0).max(0.15)
    } else {
        0.02
    };

    let pct = |x: f64, lo: f64, hi: f64| clamp_finite(x, lo, hi) * 100.0;
    HazardProfile {
        riverine: HazardEntry {
            risk_percentage: pct(riverine * 0.4, 0.02, 0.35),
            severity_level: severity(riverine, 0.6, 0.3),
            description: "Major river overflow causing widespread inundation",
            typical_damage: "Infrastructure damage, displacement, agricultural losses",
        },
        urban_drainage: HazardEntry {
            risk_percentage: pct(urban * 0.3, 0.02, 0.25),
            severity_level: severity(urban, 0.7, 0.4),
            description: "Waterlogging due to inadequate drainage systems",
            typical_damage: "Traffic disruption, property damage, health concerns",
        },
        flash: HazardEntry {
            risk_percentage: pct(flash * 0.35, 0.02, 0.3),
            severity_level: severity(flash, 0.6, 0.3),
            description: "Rapid onset flooding from intense rainfall",
            typical_damage: "Immediate safety risks, transportation disruption",
        },
        tidal: HazardEntry {
            risk_percentage: pct(tidal * 0.25, 0.02, 0.2),
            severity_level: severity(tidal, 0.5, 0.25),
            description: "Sea level rise and storm surge flooding",
            typical_damage: "Saltwater contamination, infrastructure corrosion",
        },
    }
}

pub fn recommendations(tier: RiskTier) -> Vec<&'static str> {
    match tier {
        RiskTier::Extreme | RiskTier::Critical => vec![
            "Immediate evacuation may be necessary",
            "Avoid all travel in the area",
            "Monitor emergency broadcasts",
            "Move to higher ground immediately",
        ],
        RiskTier::High => vec![
            "Prepare for possible evacuation",
            "Avoid unnecessary travel",
            "Stay tuned to weather updates",
            "Keep emergency supplies ready",
        ],
        RiskTier::Moderate => vec![
            "Monitor weather conditions closely",
            "Prepare emergency kit",
            "Check drainage around your property",
        ],
        RiskTier::Low | RiskTier::Minimal => vec!["Normal precautions sufficient"],
    }
}
