//! HTTP tests for the dashboard routes

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::sample_config;
use gnv_dashboard::models::Metric;
use gnv_dashboard::pipeline::load_dataset;
use gnv_dashboard::server::{configure, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;

fn sample_state(strict_metrics: bool) -> (TempDir, web::Data<AppState>) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = sample_config(temp_dir.path());
    config.strict_metrics = strict_metrics;
    let dataset = load_dataset(&config).unwrap();
    (temp_dir, web::Data::new(AppState::new(dataset, &config)))
}

#[actix_web::test]
async fn test_index_renders_map_tab_by_default() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("data-tab=\"mapa\" class=\"selected\""));
    assert!(body.contains("value=\"VOLUMEN_MILLONES\" checked"));
    assert!(body.contains("ANTIOQUIA"));
}

#[actix_web::test]
async fn test_tab_fragment_renders_table() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/tab/tabla").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("<table class=\"summary\">"));
    assert!(body.contains("<td>ANTIOQUIA</td>"));
    assert!(body.contains("<td>sin datos</td>"));
    assert!(!body.contains("<html"));
}

#[actix_web::test]
async fn test_unknown_tab_is_not_found() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;

    let req = test::TestRequest::get().uri("/tab/resumen").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/?tab=resumen").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_metric_selection_rebuilds_only_the_map() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    for tab in ["graficos", "tabla", "mapa"] {
        let req = test::TestRequest::get().uri(&format!("/tab/{tab}")).to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let req = test::TestRequest::post()
        .uri("/metric")
        .set_json(json!({ "metric": "VEHICULOS_MILLONES" }))
        .to_request();
    let figure: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(figure["metric"], "VEHICULOS_MILLONES");
    assert_eq!(figure["locations"], json!(["ANTIOQUIA", "CUNDINAMARCA"]));
    assert_eq!(figure["feature_id_key"], "properties.DPTO_CNMBR");

    let session = state.session.lock().unwrap();
    assert_eq!(session.selected_metric(), Metric::VehiclesMillions);
    assert_eq!(session.map_builds(), 2);
    assert!(session.cached_charts().is_some());
    assert!(session.cached_table().is_some());
}

#[actix_web::test]
async fn test_volume_per_station_reports_missing_as_null() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/metric")
        .set_json(json!({ "metric": "VOLUMEN_POR_EDS" }))
        .to_request();
    let figure: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(figure["values"][0], json!(1_500_000.0));
    assert!(figure["values"][1].is_null());
}

#[actix_web::test]
async fn test_unknown_metric_rejected_in_strict_mode() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/metric")
        .set_json(json!({ "metric": "PRECIO" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("PRECIO"));
    assert_eq!(
        state.session.lock().unwrap().selected_metric(),
        Metric::VolumeMillions
    );
}

#[actix_web::test]
async fn test_unknown_metric_falls_back_when_lenient() {
    let (_dir, state) = sample_state(false);
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/metric")
        .set_json(json!({ "metric": "PRECIO" }))
        .to_request();
    let figure: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(figure["metric"], "VOLUMEN_MILLONES");
}

#[actix_web::test]
async fn test_map_endpoint_returns_current_figure() {
    let (_dir, state) = sample_state(true);
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;

    let req = test::TestRequest::get().uri("/map").to_request();
    let figure: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(figure["geojson"]["type"], "FeatureCollection");
    assert_eq!(figure["geojson"]["features"].as_array().unwrap().len(), 2);
    assert_eq!(figure["color_scale"], "Viridis");
}
