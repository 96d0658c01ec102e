//! server
//! Capa HTTP fina sobre el motor de riesgo.

pub mod api;
pub mod map;
