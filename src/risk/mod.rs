//! risk
//!
//! Cálculo de riesgo: features, clasificador, estimador por perfil,
//! mezcla en zonas de transición y desglose por tipo de inundación.

pub mod blend;
pub mod classifier;
pub mod estimator;
pub mod features;
pub mod hazard;
