//! store.rs
//! Tabla fija de estaciones monitorizadas. Sólo lectura tras el arranque.

use once_cell::sync::Lazy;

use crate::error::FloodError;
use crate::models::profile::{DrainageQuality, LocationProfile, SoilType, Topography};

static BANGLADESH: Lazy<Vec<LocationProfile>> = Lazy::new(|| {
    let rivers = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        LocationProfile {
            name: "Dhaka".into(),
            latitude: 23.8103,
            longitude: 90.4125,
            elevation_m: 8.2,
            river_distance_km: 1.8,
            drainage_quality: DrainageQuality::Poor,
            urbanization_factor: 0.95,
            annual_rainfall_mm: 2025.0,
            flood_history_frequency: 8.0,
            base_risk_factor: 0.04,
            flood_threshold_m: 5.5,
            river_confluence_km: 12.5,
            soil_type: SoilType::ClayAlluvial,
            topography: Topography::LowLyingUrban,
            population_density: 23234.0,
            river_systems: rivers(&["Buriganga", "Turag", "Balu", "Shitalakhya"]),
        },
        LocationProfile {
            name: "Sylhet".into(),
            latitude: 24.8949,
            longitude: 91.8687,
            elevation_m: 11.8,
            river_distance_km: 0.2,
            drainage_quality: DrainageQuality::Moderate,
            urbanization_factor: 0.65,
            annual_rainfall_mm: 3334.0,
            flood_history_frequency: 12.0,
            base_risk_factor: 0.05,
            flood_threshold_m: 6.0,
            river_confluence_km: 25.3,
            soil_type: SoilType::SandyAlluvial,
            topography: Topography::RiverValley,
            population_density: 1020.0,
            river_systems: rivers(&["Surma", "Kushiyara", "Manu"]),
        },
        LocationProfile {
            name: "Rangpur".into(),
            latitude: 25.7439,
            longitude: 89.2752,
            elevation_m: 32.5,
            river_distance_km: 58.7,
            drainage_quality: DrainageQuality::Good,
            urbanization_factor: 0.45,
            annual_rainfall_mm: 1448.0,
            flood_history_frequency: 3.0,
            base_risk_factor: 0.02,
            flood_threshold_m: 4.8,
            river_confluence_km: 89.4,
            soil_type: SoilType::Loamy,
            topography: Topography::ElevatedPlain,
            population_density: 1265.0,
            river_systems: rivers(&["Teesta", "Karatoya"]),
        },
        LocationProfile {
            name: "Bahadurabad".into(),
            latitude: 25.1906,
            longitude: 89.7006,
            elevation_m: 16.3,
            river_distance_km: 0.8,
            drainage_quality: DrainageQuality::Moderate,
            urbanization_factor: 0.35,
            annual_rainfall_mm: 1832.0,
            flood_history_frequency: 9.0,
            base_risk_factor: 0.05,
            flood_threshold_m: 7.2,
            river_confluence_km: 8.2,
            soil_type: SoilType::SiltyAlluvial,
            topography: Topography::RiverPlain,
            population_density: 890.0,
            river_systems: rivers(&["Jamuna", "Brahmaputra", "Old Brahmaputra"]),
        },
        LocationProfile {
            name: "Chittagong".into(),
            latitude: 22.3569,
            longitude: 91.7832,
            elevation_m: 5.8,
            river_distance_km: 2.1,
            drainage_quality: DrainageQuality::Poor,
            urbanization_factor: 0.78,
            annual_rainfall_mm: 2666.0,
            flood_history_frequency: 7.0,
            base_risk_factor: 0.04,
            flood_threshold_m: 3.5,
            river_confluence_km: 42.8,
            soil_type: SoilType::SandyClay,
            topography: Topography::CoastalLow,
            population_density: 2800.0,
            river_systems: rivers(&["Karnaphuli", "Halda", "Sangu"]),
        },
    ]
});

#[derive(Clone, Debug)]
pub struct GeographicProfileStore {
    profiles: Vec<LocationProfile>,
}

impl GeographicProfileStore {
    /// Las 5 estaciones de Bangladesh.
    pub fn bangladesh() -> Self {
        Self { profiles: BANGLADESH.clone() }
    }

    pub fn new(profiles: Vec<LocationProfile>) -> Result<Self, FloodError> {
        if profiles.is_empty() {
            return Err(FloodError::Config("profile store needs at least one location".into()));
        }
        for (i, p) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|q| q.name == p.name) {
                return Err(FloodError::Config(format!("duplicate location {}", p.name)));
            }
        }
        Ok(Self { profiles })
    }

    pub fn get(&self, name: &str) -> Result<&LocationProfile, FloodError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| FloodError::NotFound(name.to_string()))
    }

    pub fn all(&self) -> &[LocationProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
