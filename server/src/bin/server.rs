use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use pulseboard_core::{PulseConfig, RandomFeed, WeatherFeed};
use pulseboard_server::{AppState, PulseServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,pulseboard_core=info,pulseboard_server=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();

    // Defaults + env + optional TOML overlay
    let config = PulseConfig::load();

    let feed = Arc::new(RandomFeed::new(&config.feed));
    let ticker = Arc::clone(&feed).spawn(Duration::from_millis(config.feed.interval_ms));

    let mut state = AppState::new(feed).with_chart(config.chart.clone());
    if config.weather.is_configured() {
        info!(
            target: "server",
            cities = config.weather.cities.len(),
            units = config.weather.units.as_str(),
            "Weather feed enabled"
        );
        state = state.with_weather(Arc::new(WeatherFeed::with_config(config.weather.clone())));
    } else {
        info!(target: "server", "PULSE_WEATHER_API_KEY not set; weather feed disabled");
    }

    let server = PulseServer::new(config.server.clone(), state);
    tokio::select! {
        result = server.serve() => {
            if let Err(e) = &result {
                error!(target: "server", error = %e, "Server stopped");
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!(target: "server", "Shutting down");
        }
    }

    ticker.abort();
    Ok(())
}
