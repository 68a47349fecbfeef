//! Weather feed tests against a local stand-in for the weather API
//!
//! - Field extraction and order preservation across a batch
//! - Fail-fast on a single bad city (status, malformed body, transport)
//! - Chart view state after a failed batch

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pulseboard_core::{
    ChartController, ChartStatus, ChartView, Field, PulseError, Sample, Units, WeatherConfig,
    WeatherFeed, FETCH_FAILED_MESSAGE,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Temperature derived from the city name so results are checkable
fn temp_for(city: &str, units: &str) -> f64 {
    let base = city.len() as f64;
    if units == "imperial" {
        base * 1.8 + 32.0
    } else {
        base
    }
}

async fn weather_handler(Query(params): Query<HashMap<String, String>>) -> Response {
    let city = params.get("q").cloned().unwrap_or_default();
    let units = params.get("units").cloned().unwrap_or_default();
    if params.get("appid").map(String::as_str) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"cod": 401}))).into_response();
    }
    match city.as_str() {
        "Atlantis" => (
            StatusCode::NOT_FOUND,
            Json(json!({"cod": "404", "message": "city not found"})),
        )
            .into_response(),
        "Garbled" => (StatusCode::OK, "not json at all").into_response(),
        "Calm" => Json(json!({
            "name": city,
            "main": {"temp": 10.0, "humidity": 40}
        }))
        .into_response(),
        _ => Json(json!({
            "name": city,
            "main": {"temp": temp_for(&city, &units), "humidity": 50 + city.len()},
            "wind": {"speed": city.len() as f64 / 2.0}
        }))
        .into_response(),
    }
}

async fn spawn_weather_api() -> String {
    let app = Router::new().route("/data/2.5/weather", get(weather_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/data/2.5/weather", addr)
}

fn feed(endpoint: String, units: Units) -> WeatherFeed {
    WeatherFeed::with_config(WeatherConfig {
        api_endpoint: endpoint,
        api_key: "test-key".to_string(),
        units,
        timeout_ms: Some(5_000),
        ..WeatherConfig::default()
    })
}

fn ten_cities() -> Vec<String> {
    [
        "London", "Paris", "Berlin", "Madrid", "Rome", "Vienna", "Prague", "Warsaw", "Lisbon",
        "Dublin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[tokio::test]
async fn batch_preserves_entity_order() {
    let feed = feed(spawn_weather_api().await, Units::Metric);
    let cities = ten_cities();

    let samples = feed.fetch_once(&cities, Field::Temperature).await.unwrap();

    let names: Vec<_> = samples.iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, cities);
    assert_eq!(samples[0], Sample::new("London", 6.0));
    assert_eq!(samples[4], Sample::new("Rome", 4.0));
}

#[tokio::test]
async fn extracts_selected_field_and_forwards_units() {
    let feed = feed(spawn_weather_api().await, Units::Imperial);
    let cities = vec!["Oslo".to_string()];

    let temp = feed.fetch_once(&cities, Field::Temperature).await.unwrap();
    assert_eq!(temp[0].value, 4.0 * 1.8 + 32.0);

    let humidity = feed.fetch_once(&cities, Field::Humidity).await.unwrap();
    assert_eq!(humidity[0].value, 54.0);

    let wind = feed.fetch_once(&cities, Field::WindSpeed).await.unwrap();
    assert_eq!(wind[0].value, 2.0);
}

#[tokio::test]
async fn one_missing_city_fails_the_whole_batch() {
    let feed = feed(spawn_weather_api().await, Units::Metric);
    let mut cities = ten_cities();
    cities[6] = "Atlantis".to_string();

    let err = feed
        .fetch_once(&cities, Field::Temperature)
        .await
        .unwrap_err();

    assert!(err.is_fetch_failure());
    match err {
        PulseError::Status { entity, status } => {
            assert_eq!(entity, "Atlantis");
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_fails_the_batch() {
    let feed = feed(spawn_weather_api().await, Units::Metric);
    let cities = vec!["Paris".to_string(), "Garbled".to_string()];

    let err = feed.fetch_once(&cities, Field::Humidity).await.unwrap_err();
    assert!(matches!(err, PulseError::Malformed { ref entity, .. } if entity == "Garbled"));
}

#[tokio::test]
async fn missing_field_is_malformed() {
    let feed = feed(spawn_weather_api().await, Units::Metric);
    let cities = vec!["Calm".to_string()];

    assert!(feed.fetch_once(&cities, Field::Temperature).await.is_ok());
    let err = feed.fetch_once(&cities, Field::WindSpeed).await.unwrap_err();
    assert!(matches!(err, PulseError::Malformed { .. }));
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let feed = feed(format!("http://{}/weather", addr), Units::Metric);
    let err = feed
        .fetch_once(&["Paris".to_string()], Field::Temperature)
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::Transport(_)));
    assert!(err.is_fetch_failure());
}

#[tokio::test]
async fn failed_batch_leaves_chart_in_error_with_previous_samples() {
    let feed = Arc::new(feed(spawn_weather_api().await, Units::Metric));
    let cities = ten_cities();

    let controller =
        ChartController::new(ChartView::default().with_selection(cities.clone(), Field::Humidity))
            .with_fetcher(feed);
    controller.mount().await;
    let before = controller.with_view(|v| {
        assert_eq!(v.status(), ChartStatus::Ready);
        v.samples().clone()
    });
    assert_eq!(before.len(), 10);

    let mut with_missing = cities;
    with_missing[9] = "Atlantis".to_string();
    controller.select_entities(with_missing).await;

    controller.with_view(|v| {
        assert_eq!(v.status(), ChartStatus::Error);
        assert_eq!(v.error(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(v.samples(), &before);
    });
}
