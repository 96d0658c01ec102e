use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use floodgrid::server::api::{router, ApiState};
use floodgrid::{
    GeographicProfileStore, RiskCfg, RiskEstimator, SpatialInterpolator, SyntheticRuleModel, TransitionBlender,
    WeatherSource,
};

fn app() -> axum::Router {
    let cfg = Arc::new(RiskCfg::default());
    let store = Arc::new(GeographicProfileStore::bangladesh());
    let engine = TransitionBlender::new(
        SpatialInterpolator::new(store, cfg.interp.clone()),
        RiskEstimator::new(cfg, Some(Arc::new(SyntheticRuleModel::default()))),
    );
    router(ApiState {
        engine: Arc::new(engine),
        weather: Arc::new(WeatherSource::synthetic(7)),
        today: NaiveDate::from_ymd_opt(2025, 7, 21),
    })
}

async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
    let resp = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let (s, b) = get(uri).await;
    (s, serde_json::from_slice(&b).unwrap())
}

#[tokio::test]
async fn health_ok() {
    let (s, b) = get("/health").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(b, b"ok");
}

#[tokio::test]
async fn predict_known_location() {
    let (s, v) = get_json("/api/predict/Dhaka").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["location"], "Dhaka");
    let p = v["risk_probability"].as_f64().unwrap();
    assert!((0.02..=0.95).contains(&p), "p={p}");
    assert!(v["status"].as_str().unwrap().ends_with("RISK"));
    assert_eq!(v["rainfall"].as_array().unwrap().len(), 7);
    assert_eq!(v["water_levels"].as_array().unwrap().len(), 7);
    assert_eq!(v["contributing_factors"]["method"], "classifier");
    assert!(v["flood_types"]["riverine"]["risk_percentage"].is_number());
    assert_eq!(v["weather_provider"], "synthetic");
}

#[tokio::test]
async fn unknown_location_is_404() {
    let (s, v) = get_json("/api/predict/Khulna").await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert!(v["error"].as_str().unwrap().contains("Khulna"));
}

#[tokio::test]
async fn coordinates_outside_bangladesh_are_400() {
    let (s, v) = get_json("/api/predict/coordinates/28.6/77.2").await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().contains("outside"));

    let (s, _) = get_json("/api/predict/coordinates/abc/90.4").await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn station_coordinates_return_exact_profile() {
    let (s, v) = get_json("/api/predict/coordinates/22.3569/91.7832").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["location_info"]["name"], "Chittagong");
    assert!(v["location_info"].get("interpolated").is_none());
    assert_eq!(v["flood_types"]["tidal"]["severity_level"], "Moderate");
}

#[tokio::test]
async fn station_coordinates_match_named_prediction() {
    let (_, named) = get_json("/api/predict/Chittagong").await;
    let (s, coord) = get_json("/api/predict/coordinates/22.3569/91.7832").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(coord["rainfall"], named["rainfall"]);
    assert_eq!(coord["water_levels"], named["water_levels"]);
    assert_eq!(coord["risk_probability"], named["risk_probability"]);
    assert_eq!(coord["status"], named["status"]);
}

#[tokio::test]
async fn open_country_coordinates_are_interpolated() {
    let (s, v) = get_json("/api/predict/coordinates/24.3/90.9").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["location_info"]["interpolated"], true);
    assert_eq!(v["location_info"]["weight_distribution"].as_array().unwrap().len(), 3);
    let p = v["risk_probability"].as_f64().unwrap();
    assert!(p.is_finite() && (0.02..=0.95).contains(&p));
}

#[tokio::test]
async fn status_reports_model_and_band() {
    let (s, v) = get_json("/api/status").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["model"], "synthetic-rule");
    assert_eq!(v["locations"], 5);
    assert_eq!(v["risk_band"][0], 0.02);
}

#[tokio::test]
async fn alerts_and_map_cover_all_stations() {
    let (s, v) = get_json("/api/alerts").await;
    assert_eq!(s, StatusCode::OK);
    let n = v["count"].as_u64().unwrap();
    assert_eq!(v["alerts"].as_array().unwrap().len() as u64, n);
    assert!(n <= 5);

    let (s, v) = get_json("/map/locations").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["type"], "FeatureCollection");
    let feats = v["features"].as_array().unwrap();
    assert_eq!(feats.len(), 5);
    assert_eq!(feats[0]["geometry"]["type"], "Point");
    assert!(feats[0]["properties"]["style"]["fillColor"].as_str().unwrap().starts_with('#'));
}

#[tokio::test]
async fn locations_lists_profiles_with_geographic_risk() {
    let (s, v) = get_json("/api/locations").await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["count"], 5);
    let first = &v["locations"][0];
    assert_eq!(first["name"], "Dhaka");
    assert!(first["geographic_risk"].as_f64().unwrap() <= 0.25);
}
