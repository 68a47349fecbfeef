// Configuration: defaults, environment variables and an optional TOML overlay
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// HTTP server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PULSE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            host: std::env::var("PULSE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Random push feed configuration
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Tick interval in milliseconds
    pub interval_ms: u64,
    /// Values are drawn from `[0, upper_bound)`
    pub upper_bound: u32,
    pub labels: Vec<String>,
    pub initial: Vec<f64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            upper_bound: 20,
            labels: ["A", "B", "C", "D", "E", "F"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            initial: vec![12.0, 5.0, 6.0, 7.0, 10.0, 9.0],
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            interval_ms: std::env::var("PULSE_FEED_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.interval_ms),
            upper_bound: std::env::var("PULSE_FEED_UPPER_BOUND")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.upper_bound),
            ..default
        }
    }
}

/// Unit system requested from the weather API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "celsius" | "c" => Some(Units::Metric),
            "imperial" | "fahrenheit" | "f" => Some(Units::Imperial),
            "standard" | "kelvin" | "k" => Some(Units::Standard),
            _ => None,
        }
    }
}

/// Configuration for the weather pull feed
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Current-conditions endpoint (OpenWeatherMap compatible)
    pub api_endpoint: String,
    pub api_key: String,
    pub units: Units,
    /// Request timeout; `None` leaves requests unbounded
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
    /// Cities tracked by default
    pub cities: Vec<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            api_key: std::env::var("PULSE_WEATHER_API_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_default(),
            units: std::env::var("PULSE_WEATHER_UNITS")
                .ok()
                .and_then(|v| Units::parse(&v))
                .unwrap_or_default(),
            timeout_ms: None,
            user_agent: "pulseboard/0.1".to_string(),
            cities: [
                "London", "Paris", "Berlin", "Madrid", "Rome", "Vienna", "Prague", "Warsaw",
                "Lisbon", "Dublin",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl WeatherConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Chart geometry, colors and animation timings
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    /// Fraction of each band step left empty between bars
    pub padding_inner: f64,
    /// Fraction of a band step left empty at either end
    pub padding_outer: f64,
    pub duration_ms: u64,
    /// Extra delay per bar index
    pub stagger_ms: u64,
    pub bar_color: String,
    pub hover_color: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            padding_inner: 0.2,
            padding_outer: 0.1,
            duration_ms: 800,
            stagger_ms: 100,
            bar_color: "steelblue".to_string(),
            hover_color: "orange".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default)]
pub struct PulseConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub weather: WeatherConfig,
    pub chart: ChartConfig,
}

impl PulseConfig {
    /// Env-driven defaults for every section
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            feed: FeedConfig::from_env(),
            weather: WeatherConfig::default(),
            chart: ChartConfig::default(),
        }
    }

    /// Load configuration from a TOML file (path via PULSE_CONFIG or ./pulseboard.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::from_env();
        let path = std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "pulseboard.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "config", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::from_toml_str(&s, default.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target: "config", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "config", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    /// Overlay a TOML document onto `base`
    pub fn from_toml_str(s: &str, base: Self) -> crate::Result<Self> {
        let t: PulseToml =
            toml::from_str(s).map_err(|e| crate::PulseError::Config(e.to_string()))?;
        Ok(t.overlay(base))
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, Deserialize)]
struct PulseToml {
    pub server: Option<ServerToml>,
    pub feed: Option<FeedToml>,
    pub weather: Option<WeatherToml>,
    pub chart: Option<ChartToml>,
}

impl PulseToml {
    fn overlay(self, mut base: PulseConfig) -> PulseConfig {
        if let Some(s) = self.server {
            s.apply(&mut base.server);
        }
        if let Some(f) = self.feed {
            f.apply(&mut base.feed);
        }
        if let Some(w) = self.weather {
            w.apply(&mut base.weather);
        }
        if let Some(c) = self.chart {
            c.apply(&mut base.chart);
        }
        base
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServerToml {
    pub host: Option<String>,
    pub port: Option<u16>,
}
impl ServerToml {
    fn apply(self, s: &mut ServerConfig) {
        if let Some(v) = self.host {
            s.host = v;
        }
        if let Some(v) = self.port {
            s.port = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FeedToml {
    pub interval_ms: Option<u64>,
    pub upper_bound: Option<u32>,
    pub labels: Option<Vec<String>>,
    pub initial: Option<Vec<f64>>,
}
impl FeedToml {
    fn apply(self, f: &mut FeedConfig) {
        if let Some(v) = self.interval_ms.filter(|v| *v > 0) {
            f.interval_ms = v;
        }
        if let Some(v) = self.upper_bound.filter(|v| *v > 0) {
            f.upper_bound = v;
        }
        if let Some(v) = self.labels {
            f.labels = v;
        }
        if let Some(v) = self.initial {
            f.initial = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WeatherToml {
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub units: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub cities: Option<Vec<String>>,
}
impl WeatherToml {
    fn apply(self, w: &mut WeatherConfig) {
        if let Some(v) = self.api_endpoint {
            w.api_endpoint = v;
        }
        if let Some(v) = self.api_key.filter(|s| !s.is_empty()) {
            w.api_key = v;
        }
        if let Some(v) = self.units.as_deref().and_then(Units::parse) {
            w.units = v;
        }
        if let Some(v) = self.timeout_ms {
            w.timeout_ms = Some(v);
        }
        if let Some(v) = self.user_agent {
            w.user_agent = v;
        }
        if let Some(v) = self.cities {
            w.cities = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartToml {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub padding_inner: Option<f64>,
    pub padding_outer: Option<f64>,
    pub duration_ms: Option<u64>,
    pub stagger_ms: Option<u64>,
    pub bar_color: Option<String>,
    pub hover_color: Option<String>,
}
impl ChartToml {
    fn apply(self, c: &mut ChartConfig) {
        if let Some(v) = self.width.filter(|v| *v > 0.0) {
            c.width = v;
        }
        if let Some(v) = self.height.filter(|v| *v > 0.0) {
            c.height = v;
        }
        if let Some(v) = self.padding_inner {
            c.padding_inner = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.padding_outer {
            c.padding_outer = v.max(0.0);
        }
        if let Some(v) = self.duration_ms {
            c.duration_ms = v;
        }
        if let Some(v) = self.stagger_ms {
            c.stagger_ms = v;
        }
        if let Some(v) = self.bar_color {
            c.bar_color = v;
        }
        if let Some(v) = self.hover_color {
            c.hover_color = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overlays_only_given_fields() {
        let doc = r#"
            [server]
            port = 8080

            [feed]
            interval_ms = 1000
            labels = ["x", "y"]
            initial = [1.0, 2.0]

            [weather]
            units = "imperial"
            cities = ["Oslo"]

            [chart]
            stagger_ms = 50
            padding_inner = 3.0
        "#;
        let cfg = PulseConfig::from_toml_str(doc, PulseConfig::default()).unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, ServerConfig::default().host);
        assert_eq!(cfg.feed.interval_ms, 1000);
        assert_eq!(cfg.feed.upper_bound, 20);
        assert_eq!(cfg.feed.labels, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(cfg.weather.units, Units::Imperial);
        assert_eq!(cfg.weather.cities, vec!["Oslo".to_string()]);
        assert_eq!(cfg.chart.stagger_ms, 50);
        assert_eq!(cfg.chart.duration_ms, 800);
        assert_eq!(cfg.chart.padding_inner, 1.0);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = PulseConfig::from_toml_str("[server\nport = ", PulseConfig::default());
        assert!(matches!(err, Err(crate::PulseError::Config(_))));
    }

    #[test]
    fn default_feed_matches_initial_series() {
        let feed = FeedConfig::default();
        assert_eq!(feed.labels.len(), feed.initial.len());
        assert_eq!(feed.initial, vec![12.0, 5.0, 6.0, 7.0, 10.0, 9.0]);
        assert_eq!(feed.interval_ms, 5_000);
    }
}
