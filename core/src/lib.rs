// Pulseboard Core Library
// Real-time sample feeds and the bar chart view that renders them

pub mod chart;
pub mod config;
pub mod feed;
pub mod sample;

// Export core types
pub use chart::{
    ChartController, ChartFrame, ChartStatus, ChartView, FetchTicket, Renderer, SvgRenderer,
    FETCH_FAILED_MESSAGE,
};
pub use config::{ChartConfig, FeedConfig, PulseConfig, ServerConfig, Units, WeatherConfig};
pub use feed::{
    RandomFeed, SampleCallback, SampleChannel, SampleFetcher, Subscribers, Subscription,
    WeatherFeed,
};
pub use sample::{Field, Sample, SampleSet, SortOrder};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request for {entity} returned status {status}")]
    Status { entity: String, status: u16 },

    #[error("Malformed response for {entity}: {reason}")]
    Malformed { entity: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PulseError {
    /// Transport failures, bad statuses and malformed bodies all surface to
    /// the user as the same "fetch failed" condition.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PulseError::Transport(_) | PulseError::Status { .. } | PulseError::Malformed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;
