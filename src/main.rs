//! main.rs
//! Servidor de riesgo de inundación (config desde ENV).

use anyhow::{Context, Result};
use std::{env, fs, sync::Arc};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use floodgrid::geo::interp::SpatialInterpolator;
use floodgrid::geo::store::GeographicProfileStore;
use floodgrid::models::types::{AppCfg, RiskCfg};
use floodgrid::risk::blend::TransitionBlender;
use floodgrid::risk::classifier::{FloodClassifier, SyntheticRuleModel};
use floodgrid::risk::estimator::RiskEstimator;
use floodgrid::server::api::{router, ApiState};
use floodgrid::weather::WeatherSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs (RUST_LOG, por defecto info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app_cfg = app_cfg_from_env();
    let risk_cfg = Arc::new(load_risk_cfg(app_cfg.risk_cfg_path.as_deref())?);

    let classifier: Option<Arc<dyn FloodClassifier>> = match app_cfg.model.as_str() {
        "synthetic" => Some(Arc::new(SyntheticRuleModel::default())),
        "none" => None,
        other => {
            warn!("FLOOD_MODEL={other} desconocido; sólo heurística");
            None
        }
    };

    let store = Arc::new(GeographicProfileStore::bangladesh());
    info!("{} estaciones cargadas", store.len());
    let interp = SpatialInterpolator::new(store, risk_cfg.interp.clone());
    let estimator = RiskEstimator::new(risk_cfg.clone(), classifier);
    info!("Modelo: {}", estimator.classifier_name().unwrap_or("fallback"));
    let engine = Arc::new(TransitionBlender::new(interp, estimator));

    let weather = Arc::new(WeatherSource::from_cfg(&app_cfg)?);
    info!("Clima: {} ({} días)", weather.provider(), weather.days());

    // API
    let app = router(ApiState { engine, weather, today: None });
    info!("Escuchando en http://{}", app_cfg.bind);
    let listener = tokio::net::TcpListener::bind(&app_cfg.bind)
        .await
        .with_context(|| format!("bind {}", app_cfg.bind))?;
    let serve = axum::serve(listener, app);
    tokio::select! {
        r = serve => { r?; },
        _ = signal::ctrl_c() => { info!("Señal de salida recibida"); }
    }

    Ok(())
}

fn app_cfg_from_env() -> AppCfg {
    let mut c = AppCfg::default();
    if let Ok(v) = env::var("BIND") { c.bind = v; }
    if let Ok(v) = env::var("OPENWEATHER_API_KEY") { c.openweather_key = Some(v); }
    if let Ok(v) = env::var("OPENWEATHER_URL") { c.openweather_url = v; }
    if let Ok(v) = env::var("WEATHER_TIMEOUT_S") { c.weather_timeout_s = v.parse().unwrap_or(c.weather_timeout_s); }
    if let Ok(v) = env::var("WINDOW_DAYS") { c.window_days = v.parse().unwrap_or(c.window_days); }
    if let Ok(v) = env::var("FLOOD_MODEL") { c.model = v; }
    if let Ok(v) = env::var("RISK_CFG_PATH") { c.risk_cfg_path = Some(v); }
    c
}

fn load_risk_cfg(path: Option<&str>) -> Result<RiskCfg> {
    let Some(path) = path else {
        return Ok(RiskCfg::default());
    };
    let txt = fs::read_to_string(path).with_context(|| format!("leer {path}"))?;
    let cfg: RiskCfg = serde_json::from_str(&txt).with_context(|| format!("RiskCfg inválido en {path}"))?;
    cfg.validate().with_context(|| format!("RiskCfg en {path}"))?;
    info!("RiskCfg cargado de {path}");
    Ok(cfg)
}
