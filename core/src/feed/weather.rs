/// Weather pull feed
///
/// Issues one current-conditions request per city against an
/// OpenWeatherMap-compatible API and extracts a single numeric field from
/// each reading. The batch fails on the first failing city.
use crate::config::WeatherConfig;
use crate::feed::SampleFetcher;
use crate::sample::{Field, Sample, SampleSet};
use crate::{PulseError, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Current conditions response
#[derive(Debug, Deserialize)]
struct CurrentConditions {
    main: MainReadings,
    wind: Option<WindReadings>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: f64,
}

impl CurrentConditions {
    fn extract(&self, field: Field) -> Option<f64> {
        let value = match field {
            Field::Temperature => self.main.temp,
            Field::Humidity => self.main.humidity,
            Field::WindSpeed => self.wind.as_ref()?.speed,
        };
        value.is_finite().then_some(value)
    }
}

pub struct WeatherFeed {
    config: WeatherConfig,
    http_client: reqwest::Client,
}

impl WeatherFeed {
    pub fn new() -> Self {
        Self::with_config(WeatherConfig::default())
    }

    pub fn with_config(config: WeatherConfig) -> Self {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http_client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Fetch `field` for a single city
    async fn fetch_entity(&self, entity: &str, field: Field) -> Result<Sample> {
        debug!(target: "weather", entity = %entity, field = %field, "Fetching current conditions");

        let response = self
            .http_client
            .get(&self.config.api_endpoint)
            .query(&[
                ("q", entity),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(target: "weather", entity = %entity, error = %e, "Weather API request failed");
                PulseError::Transport(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(target: "weather", entity = %entity, status = %status, "Weather API returned error");
            return Err(PulseError::Status {
                entity: entity.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(target: "weather", entity = %entity, error = %e, "Failed to read weather response");
            PulseError::Transport(e)
        })?;
        let conditions: CurrentConditions = serde_json::from_slice(&body).map_err(|e| {
            warn!(target: "weather", entity = %entity, error = %e, "Failed to parse weather response");
            PulseError::Malformed {
                entity: entity.to_string(),
                reason: e.to_string(),
            }
        })?;

        let value = conditions.extract(field).ok_or_else(|| PulseError::Malformed {
            entity: entity.to_string(),
            reason: format!("missing {}", field),
        })?;

        Ok(Sample::new(entity, value))
    }

    /// Fetch `field` for every entity concurrently; order follows `entities`
    pub async fn fetch_once(&self, entities: &[String], field: Field) -> Result<SampleSet> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let samples =
            try_join_all(entities.iter().map(|e| self.fetch_entity(e, field))).await?;
        debug!(target: "weather", entities = samples.len(), field = %field, "Weather batch fetched");
        Ok(samples)
    }
}

impl Default for WeatherFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleFetcher for WeatherFeed {
    async fn fetch_once(&self, entities: &[String], field: Field) -> Result<SampleSet> {
        WeatherFeed::fetch_once(self, entities, field).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_each_field() {
        let conditions: CurrentConditions = serde_json::from_str(
            r#"{"name":"Oslo","main":{"temp":3.5,"humidity":81},"wind":{"speed":4.2}}"#,
        )
        .unwrap();
        assert_eq!(conditions.extract(Field::Temperature), Some(3.5));
        assert_eq!(conditions.extract(Field::Humidity), Some(81.0));
        assert_eq!(conditions.extract(Field::WindSpeed), Some(4.2));
    }

    #[test]
    fn missing_wind_yields_none() {
        let conditions: CurrentConditions =
            serde_json::from_str(r#"{"main":{"temp":3.5,"humidity":81}}"#).unwrap();
        assert_eq!(conditions.extract(Field::WindSpeed), None);
        assert_eq!(conditions.extract(Field::Temperature), Some(3.5));
    }

    #[tokio::test]
    async fn empty_entity_list_issues_no_requests() {
        let feed = WeatherFeed::with_config(WeatherConfig {
            api_endpoint: "http://127.0.0.1:9/unreachable".to_string(),
            ..WeatherConfig::default()
        });
        let samples = feed.fetch_once(&[], Field::Humidity).await.unwrap();
        assert!(samples.is_empty());
    }
}
