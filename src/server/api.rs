//! api.rs
//! Rutas HTTP: /health, /api/locations, /api/predict/:location,
//! /api/predict/coordinates/:lat/:lon, /api/alerts, /api/status y /map/locations.

use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use tracing::{debug, info};

use crate::error::FloodError;
use crate::geo::check_bounds;
use crate::models::estimate::RiskEstimate;
use crate::models::profile::{LocationProfile, ProfileView};
use crate::risk::blend::TransitionBlender;
use crate::risk::hazard::{geographic_risk, hazard_profile, recommendations, HazardProfile};
use crate::server::map::locations_geojson;
use crate::weather::{WeatherSample, WeatherSource};

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<TransitionBlender>,
    pub weather: Arc<WeatherSource>,
    /// Fecha fija para la ventana de lluvia; `None` = hoy (UTC)
    pub today: Option<NaiveDate>,
}

impl ApiState {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/locations", get(locations))
        .route("/api/predict/:location", get(predict_location))
        .route("/api/predict/coordinates/:lat/:lon", get(predict_coordinates))
        .route("/api/alerts", get(alerts))
        .route("/api/status", get(status))
        .route("/map/locations", get(map_locations))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

/// Error de dominio como respuesta JSON `{ "error": ... }`.
pub struct ApiError(FloodError);

impl From<FloodError> for ApiError {
    fn from(e: FloodError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self.0 {
            FloodError::NotFound(_) => StatusCode::NOT_FOUND,
            FloodError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            FloodError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        debug!("{} -> {}", self.0, code);
        (code, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct LocationSummary<'a> {
    #[serde(flatten)]
    profile: &'a LocationProfile,
    geographic_risk: f64,
}

async fn locations(State(st): State<ApiState>) -> impl IntoResponse {
    let list: Vec<LocationSummary> = st
        .engine
        .interpolator()
        .store()
        .all()
        .iter()
        .map(|p| LocationSummary { profile: p, geographic_risk: geographic_risk(p) })
        .collect();
    Json(json!({ "locations": list, "count": list.len() }))
}

#[derive(Serialize)]
struct Prediction<'a> {
    location: &'a str,
    latitude: f64,
    longitude: f64,
    timestamp: String,
    weather_provider: &'static str,
    #[serde(flatten)]
    estimate: RiskEstimate,
    flood_predicted: bool,
    risk_level: &'static str,
    alert_level: &'static str,
    recommendations: Vec<&'static str>,
    flood_types: HazardProfile,
    rainfall: &'a [WeatherSample],
    water_levels: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_info: Option<&'a ProfileView>,
}

async fn predict_location(State(st): State<ApiState>, Path(location): Path<String>) -> Result<Response, ApiError> {
    let store = st.engine.interpolator().store();
    let profile = store.get(&location)?;
    let window = st.weather.window_for(profile, st.today()).await;
    let estimate = st.engine.estimate_named(&location, &window)?;
    let tiers = &st.engine.estimator().cfg().tiers;

    let out = Prediction {
        location: &profile.name,
        latitude: profile.latitude,
        longitude: profile.longitude,
        timestamp: Utc::now().to_rfc3339(),
        weather_provider: st.weather.provider(),
        flood_predicted: estimate.flood_predicted(tiers),
        risk_level: estimate.status.css_class(),
        alert_level: estimate.status.alert_level(),
        recommendations: recommendations(estimate.status),
        flood_types: hazard_profile(profile),
        rainfall: window.samples(),
        water_levels: st.engine.estimator().water_levels(profile, &window),
        location_info: None,
        estimate,
    };
    Ok(Json(out).into_response())
}

fn parse_coord(lat: &str, lon: &str) -> Result<(f64, f64), FloodError> {
    match (lat.parse::<f64>(), lon.parse::<f64>()) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        _ => Err(FloodError::InvalidInput { lat: f64::NAN, lon: f64::NAN, reason: format!("cannot parse '{lat}', '{lon}'") }),
    }
}

async fn predict_coordinates(
    State(st): State<ApiState>,
    Path((lat, lon)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (lat, lon) = parse_coord(&lat, &lon)?;
    let estimator = st.engine.estimator();
    check_bounds(lat, lon, &estimator.cfg().bounds)?;

    let view = st.engine.interpolator().interpolate(lat, lon);
    // coordenada de estación: misma ventana que /api/predict/:location
    let window = match &view {
        ProfileView::Exact(p) => st.weather.window_for(p, st.today()).await,
        ProfileView::Interpolated(_) => st.weather.window_at(lat, lon, st.engine.interpolator().store(), st.today()).await,
    };
    let estimate = st.engine.blend(lat, lon, &window)?;
    let tiers = &estimator.cfg().tiers;

    let out = Prediction {
        location: &view.profile().name,
        latitude: lat,
        longitude: lon,
        timestamp: Utc::now().to_rfc3339(),
        weather_provider: st.weather.provider(),
        flood_predicted: estimate.flood_predicted(tiers),
        risk_level: estimate.status.css_class(),
        alert_level: estimate.status.alert_level(),
        recommendations: recommendations(estimate.status),
        flood_types: hazard_profile(view.profile()),
        rainfall: window.samples(),
        water_levels: estimator.water_levels(view.profile(), &window),
        location_info: Some(&view),
        estimate,
    };
    Ok(Json(out).into_response())
}

/// Estimación de todas las estaciones con su propia ventana.
async fn estimate_all(st: &ApiState) -> Vec<(&LocationProfile, RiskEstimate)> {
    let today = st.today();
    let mut out = Vec::new();
    for p in st.engine.interpolator().store().all() {
        let window = st.weather.window_for(p, today).await;
        out.push((p, st.engine.estimator().estimate(p, &window)));
    }
    out
}

#[derive(Serialize)]
struct Alert<'a> {
    location: &'a str,
    alert_level: &'static str,
    status: &'static str,
    risk_probability: f64,
    recommendations: Vec<&'static str>,
}

async fn alerts(State(st): State<ApiState>) -> impl IntoResponse {
    let threshold = st.engine.estimator().cfg().alert_threshold;
    let all = estimate_all(&st).await;
    let list: Vec<Alert> = all
        .iter()
        .filter(|(_, e)| e.risk_probability >= threshold)
        .map(|(p, e)| Alert {
            location: &p.name,
            alert_level: e.status.alert_level(),
            status: e.status.label(),
            risk_probability: e.risk_probability,
            recommendations: recommendations(e.status),
        })
        .collect();
    if !list.is_empty() {
        info!("{} active flood alerts", list.len());
    }
    Json(json!({
        "alerts": list,
        "count": list.len(),
        "threshold": threshold,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

async fn status(State(st): State<ApiState>) -> impl IntoResponse {
    let est = st.engine.estimator();
    let cfg = est.cfg();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": est.classifier_name().unwrap_or("fallback"),
        "weather_provider": st.weather.provider(),
        "window_days": st.weather.days(),
        "locations": st.engine.interpolator().store().len(),
        "risk_band": [cfg.risk_min, cfg.risk_max],
    }))
}

async fn map_locations(State(st): State<ApiState>) -> impl IntoResponse {
    let all = estimate_all(&st).await;
    let body = locations_geojson(&all, st.engine.estimator().cfg());
    ([(CONTENT_TYPE, "application/geo+json; charset=utf-8")], body)
}
