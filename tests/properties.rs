use std::sync::Arc;

use chrono::NaiveDate;
use floodgrid::geo::haversine_km;
use floodgrid::models::estimate::{PredictionMethod, RiskTier};
use floodgrid::models::types::{RiskCfg, WaterCfg};
use floodgrid::risk::features::build_features;
use floodgrid::{
    GeographicProfileStore, LocationProfile, ProfileView, RiskEstimator, SpatialInterpolator, TransitionBlender,
    WeatherWindow,
};

fn quiet_cfg() -> Arc<RiskCfg> {
    Arc::new(RiskCfg { water: WaterCfg { jitter_sd: 0.0, ..WaterCfg::default() }, ..RiskCfg::default() })
}

fn store() -> Arc<GeographicProfileStore> {
    Arc::new(GeographicProfileStore::bangladesh())
}

fn interp() -> SpatialInterpolator {
    SpatialInterpolator::new(store(), RiskCfg::default().interp)
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

#[test]
fn points_inside_the_snap_radius_return_the_exact_profile() {
    let it = interp();
    for p in store().all() {
        for k in 0..16 {
            let a = k as f64 * std::f64::consts::TAU / 16.0;
            let (lat, lon) = (p.latitude + 0.0075 * a.sin(), p.longitude + 0.0075 * a.cos());
            assert!(haversine_km(lat, lon, p.latitude, p.longitude) < 0.9);
            match it.interpolate(lat, lon) {
                ProfileView::Exact(q) => assert_eq!(&q, p),
                other => panic!("{} at ({lat},{lon}) interpolated: {other:?}", p.name),
            }
        }
    }
}

#[test]
fn snap_radius_is_measured_in_degrees() {
    let it = interp();
    for p in store().all() {
        let inside = (p.latitude + 0.0079, p.longitude);
        let outside_north = (p.latitude + 0.0085, p.longitude);
        let outside_east = (p.latitude, p.longitude + 0.0085);
        assert!(matches!(it.interpolate(inside.0, inside.1), ProfileView::Exact(_)), "{}", p.name);
        assert!(it.interpolate(outside_north.0, outside_north.1).is_interpolated(), "{}", p.name);
        // al este 0.0085° quedan por debajo de 0.9 km y aun así se interpola
        assert!(haversine_km(outside_east.0, outside_east.1, p.latitude, p.longitude) < 0.9);
        assert!(it.interpolate(outside_east.0, outside_east.1).is_interpolated(), "{}", p.name);
    }
}

#[test]
fn chittagong_registered_coordinate_is_exact() {
    match interp().interpolate(22.3569, 91.7832) {
        ProfileView::Exact(p) => assert_eq!(p.name, "Chittagong"),
        other => panic!("expected Chittagong, got {other:?}"),
    }
}

#[test]
fn weights_sum_to_one_over_a_grid() {
    let it = interp();
    let mut lat = 20.5;
    while lat <= 26.7 {
        let mut lon = 88.0;
        while lon <= 92.8 {
            let s: f64 = it.weights(lat, lon).iter().map(|w| w.weight).sum();
            assert!((s - 1.0).abs() < 1e-9, "sum={s} at ({lat},{lon})");
            lon += 0.37;
        }
        lat += 0.41;
    }
}

fn windows() -> Vec<WeatherWindow> {
    vec![
        WeatherWindow::from_rainfall(day(1, 10), &[0.0; 7]),
        WeatherWindow::from_rainfall(day(7, 10), &[12.0, 40.0, 85.0, 100.0, 100.0, 60.0, 95.0]),
        WeatherWindow::from_rainfall(day(10, 1), &[3.0, 0.0, 0.0, 7.5, 22.0, 1.0, 0.0]),
        WeatherWindow::from_rainfall(day(5, 20), &[]),
    ]
}

#[test]
fn every_estimate_stays_inside_the_band() {
    let cfg = Arc::new(RiskCfg::default());
    let est = RiskEstimator::new(cfg.clone(), None);
    for p in store().all() {
        for w in windows() {
            let r = est.estimate(p, &w);
            assert!(
                (cfg.risk_min..=cfg.risk_max).contains(&r.risk_probability),
                "{}: {}",
                p.name,
                r.risk_probability
            );
            assert!((0.0..=1.0).contains(&r.confidence));
        }
    }
}

#[test]
fn fallback_path_is_idempotent() {
    let est = RiskEstimator::new(quiet_cfg(), None);
    let w = &windows()[2];
    for p in store().all() {
        let a = est.estimate(p, w).risk_probability;
        let b = est.estimate(p, w).risk_probability;
        assert_eq!(a, b, "{}", p.name);
    }
}

#[test]
fn more_three_day_rain_never_lowers_fallback_risk() {
    let cfg = quiet_cfg();
    let est = RiskEstimator::new(cfg.clone(), None);
    for p in store().all() {
        let w = WeatherWindow::from_rainfall(day(8, 1), &[0.0; 7]);
        let (base, _) = build_features(p, &w, &cfg);
        let mut prev = 0.0;
        for step in 0..60 {
            let mut fv = base;
            fv.rainfall_3day = step as f64 * 2.5;
            let r = est.fallback_probability(p, &fv, Some(8));
            assert!(r >= prev, "{}: {r} < {prev} at 3-day={}", p.name, fv.rainfall_3day);
            prev = r;
        }
    }
}

fn two_station_store() -> GeographicProfileStore {
    let base = GeographicProfileStore::bangladesh();
    let mut wet: LocationProfile = base.get("Sylhet").unwrap().clone();
    let mut dry: LocationProfile = base.get("Rangpur").unwrap().clone();
    wet.name = "Wet".into();
    (wet.latitude, wet.longitude) = (24.0, 90.0);
    dry.name = "Dry".into();
    (dry.latitude, dry.longitude) = (24.0, 90.12);
    GeographicProfileStore::new(vec![wet, dry]).unwrap()
}

#[test]
fn equidistant_blend_lies_between_the_two_stations() {
    let cfg = quiet_cfg();
    let s = Arc::new(two_station_store());
    let blender = TransitionBlender::new(
        SpatialInterpolator::new(s.clone(), cfg.interp.clone()),
        RiskEstimator::new(cfg, None),
    );
    for w in windows() {
        let r1 = blender.estimate_named("Wet", &w).unwrap().risk_probability;
        let r2 = blender.estimate_named("Dry", &w).unwrap().risk_probability;
        let b = blender.blend(24.0, 90.06, &w).unwrap();
        assert_eq!(b.contributing_factors.method, PredictionMethod::TransitionBlend);
        let p = b.risk_probability;
        assert!(p >= r1.min(r2) - 1e-12 && p <= r1.max(r2) + 1e-12, "p={p} r1={r1} r2={r2}");
    }
}

#[test]
fn dry_week_in_dhaka_is_minimal_or_low() {
    let est = RiskEstimator::new(Arc::new(RiskCfg::default()), Some(Arc::new(floodgrid::SyntheticRuleModel::default())));
    let dhaka = store().get("Dhaka").unwrap().clone();
    assert_eq!(dhaka.elevation_m, 8.2);
    for m in 1..=12 {
        let w = WeatherWindow::from_rainfall(day(m, 15), &[0.0; 7]);
        let r = est.estimate(&dhaka, &w);
        assert!(matches!(r.status, RiskTier::Minimal | RiskTier::Low), "month {m}: {:?} {}", r.status, r.risk_probability);
    }
}
