// Pulseboard HTTP server
//
// Serves the current series as JSON, pushes updates over SSE and renders
// the chart as SVG.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Json, Router,
};
use pulseboard_core::{
    ChartConfig, ChartView, Field, RandomFeed, Renderer, Sample, SampleChannel, ServerConfig,
    SortOrder, SvgRenderer, WeatherFeed, FETCH_FAILED_MESSAGE,
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<RandomFeed>,
    pub weather: Option<Arc<WeatherFeed>>,
    pub chart: ChartConfig,
}

impl AppState {
    pub fn new(feed: Arc<RandomFeed>) -> Self {
        Self {
            feed,
            weather: None,
            chart: ChartConfig::default(),
        }
    }

    pub fn with_weather(mut self, weather: Arc<WeatherFeed>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_chart(mut self, chart: ChartConfig) -> Self {
        self.chart = chart;
        self
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/data", get(data_handler))
        .route("/data/stream", get(data_stream_handler))
        .route("/chart.svg", get(chart_handler))
        .route("/weather", get(weather_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub struct PulseServer {
    config: ServerConfig,
    state: AppState,
}

impl PulseServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind the configured address and serve until the process exits
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        serve_on(listener, self.state).await
    }
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(
        target: "server",
        url = %format!("http://{}", addr),
        "Pulseboard server ready"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Handler-level failures
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Unavailable(&'static str),
    Upstream,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.to_string()),
            ApiError::Upstream => (StatusCode::BAD_GATEWAY, FETCH_FAILED_MESSAGE.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct DataQuery {
    min: Option<f64>,
}

/// Current series, optionally filtered to `value >= min`
async fn data_handler(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Json<Vec<Sample>> {
    let samples = state.feed.current().await;
    match query.min {
        Some(min) => Json(pulseboard_core::sample::filter_min(&samples, min)),
        None => Json(samples),
    }
}

/// SSE endpoint pushing every feed update as a `data` event.
///
/// A new client first receives the current series. The feed subscription
/// lives as long as the response stream.
async fn data_stream_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, rx) = watch::channel(state.feed.current().await);
    // Slow clients only ever see the latest set
    let subscription = state.feed.subscribe(Arc::new(move |samples: &[Sample]| {
        tx.send_replace(samples.to_vec());
    }));
    info!(target: "server", subscription = subscription.id(), "New SSE client connected");

    let stream = WatchStream::new(rx).filter_map(move |samples| {
        let _subscription = &subscription;
        match serde_json::to_string(&samples) {
            Ok(json) => Some(Ok(Event::default().event("data").data(json))),
            Err(e) => {
                warn!(target: "server", error = %e, "Failed to serialize samples");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct ChartQuery {
    sort: Option<String>,
    min: Option<f64>,
}

/// Current series rendered as an SVG bar chart
async fn chart_handler(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> std::result::Result<Response, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(s) => s
            .parse::<SortOrder>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => SortOrder::None,
    };

    let mut view = ChartView::new(state.chart.clone());
    view.push_received(state.feed.current().await);
    view.set_sort(sort);
    view.set_threshold(query.min);

    let svg = SvgRenderer::new().render(&view.frame());
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    cities: Option<String>,
    field: Option<String>,
}

/// One field per city from the weather API; any city failure fails the request
async fn weather_handler(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> std::result::Result<Json<Vec<Sample>>, ApiError> {
    let weather = state
        .weather
        .as_ref()
        .ok_or(ApiError::Unavailable("weather feed not configured"))?;

    let field = match query.field.as_deref() {
        Some(f) => f
            .parse::<Field>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => Field::default(),
    };
    let cities: Vec<String> = match query.cities.as_deref() {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        None => weather.config().cities.clone(),
    };

    match weather.fetch_once(&cities, field).await {
        Ok(samples) => Ok(Json(samples)),
        Err(e) => {
            warn!(target: "server", error = %e, field = %field, "Weather fetch failed");
            Err(ApiError::Upstream)
        }
    }
}
