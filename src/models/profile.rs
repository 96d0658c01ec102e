//! profile.rs
//! Perfiles geográficos/hidrológicos por estación y perfil interpolado
//! para coordenadas arbitrarias.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrainageQuality {
    Poor,
    Moderate,
    Good,
}

impl DrainageQuality {
    /// Puntuación numérica usada para mezclar la categoría entre estaciones.
    pub fn score(self) -> f64 {
        match self {
            DrainageQuality::Poor => 0.85,
            DrainageQuality::Moderate => 0.45,
            DrainageQuality::Good => 0.15,
        }
    }

    /// Re-bucketing de una puntuación mezclada (>=0.70 Poor, >=0.30 Moderate).
    pub fn from_score(s: f64) -> Self {
        if s >= 0.70 {
            DrainageQuality::Poor
        } else if s >= 0.30 {
            DrainageQuality::Moderate
        } else {
            DrainageQuality::Good
        }
    }

    /// Multiplicador de escorrentía para el modelo de nivel de agua.
    pub fn runoff_multiplier(self) -> f64 {
        match self {
            DrainageQuality::Poor => 1.4,
            DrainageQuality::Moderate => 1.1,
            DrainageQuality::Good => 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    ClayAlluvial,
    SandyClay,
    SiltyAlluvial,
    SandyAlluvial,
    Loamy,
}

impl SoilType {
    pub fn risk_factor(self) -> f64 {
        match self {
            SoilType::ClayAlluvial => 0.8,
            SoilType::SandyClay => 0.6,
            SoilType::SiltyAlluvial => 0.5,
            SoilType::SandyAlluvial => 0.3,
            SoilType::Loamy => 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topography {
    LowLyingUrban,
    RiverValley,
    ElevatedPlain,
    RiverPlain,
    CoastalLow,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationProfile {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub river_distance_km: f64,
    pub drainage_quality: DrainageQuality,
    /// 0..1
    pub urbanization_factor: f64,
    pub annual_rainfall_mm: f64,
    /// Inundaciones por década
    pub flood_history_frequency: f64,
    /// 0..1
    pub base_risk_factor: f64,
    /// Nivel de agua (m) a partir del cual se considera inundación
    pub flood_threshold_m: f64,
    pub river_confluence_km: f64,
    pub soil_type: SoilType,
    pub topography: Topography,
    /// hab/km²
    pub population_density: f64,
    pub river_systems: Vec<String>,
}

/// Peso normalizado de una estación en una interpolación.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationWeight {
    pub name: String,
    pub weight: f64,
}

/// Perfil sintético para una coordenada no monitorizada, con su procedencia.
#[derive(Clone, Debug, Serialize)]
pub struct InterpolatedProfile {
    #[serde(flatten)]
    pub profile: LocationProfile,
    pub interpolated: bool,
    /// Estación con mayor peso
    pub primary_influence: String,
    /// Ratio de suavizado hacia la media de todas las estaciones
    pub smoothing_applied: f64,
    /// Top 3 estaciones y sus pesos
    pub weight_distribution: Vec<LocationWeight>,
}

/// Resultado de `SpatialInterpolator::interpolate`.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ProfileView {
    Exact(LocationProfile),
    Interpolated(InterpolatedProfile),
}

impl ProfileView {
    pub fn profile(&self) -> &LocationProfile {
        match self {
            ProfileView::Exact(p) => p,
            ProfileView::Interpolated(ip) => &ip.profile,
        }
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, ProfileView::Interpolated(_))
    }

    pub fn primary_influence(&self) -> &str {
        match self {
            ProfileView::Exact(p) => &p.name,
            ProfileView::Interpolated(ip) => &ip.primary_influence,
        }
    }

    pub fn smoothing_applied(&self) -> f64 {
        match self {
            ProfileView::Exact(_) => 0.0,
            ProfileView::Interpolated(ip) => ip.smoothing_applied,
        }
    }
}
