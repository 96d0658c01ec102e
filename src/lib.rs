//! floodgrid
//!
//! Estimación de riesgo de inundación para las estaciones de Bangladesh y
//! para coordenadas arbitrarias (interpolación espacial y zonas de
//! transición). El binario expone el motor por HTTP.

pub mod error;
pub mod geo;
pub mod models;
pub mod risk;
pub mod server;
pub mod weather;

pub use error::{ClassifierError, FloodError};
pub use geo::interp::SpatialInterpolator;
pub use geo::store::GeographicProfileStore;
pub use models::estimate::{RiskEstimate, RiskTier};
pub use models::profile::{LocationProfile, ProfileView};
pub use models::types::{AppCfg, RiskCfg};
pub use risk::blend::TransitionBlender;
pub use risk::classifier::{FloodClassifier, SyntheticRuleModel};
pub use risk::estimator::RiskEstimator;
pub use weather::{WeatherSample, WeatherSource, WeatherWindow};
