// Samples and the linear scans applied to them before rendering
use crate::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One labeled numeric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Full ordered collection for one render cycle. Replaced wholesale on update.
pub type SampleSet = Vec<Sample>;

/// Numeric field extracted from a weather reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    #[default]
    Temperature,
    Humidity,
    WindSpeed,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::WindSpeed => "wind_speed",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Field::Temperature),
            "humidity" => Ok(Field::Humidity),
            "wind_speed" | "windspeed" | "wind" => Ok(Field::WindSpeed),
            other => Err(PulseError::InvalidInput(format!("unknown field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Insertion order
    #[default]
    None,
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(SortOrder::None),
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(PulseError::InvalidInput(format!(
                "unknown sort order: {}",
                other
            ))),
        }
    }
}

/// Samples with `value >= threshold`, input order preserved
pub fn filter_min(samples: &[Sample], threshold: f64) -> SampleSet {
    samples
        .iter()
        .filter(|s| s.value >= threshold)
        .cloned()
        .collect()
}

/// Stable sort by value. `SortOrder::None` leaves insertion order alone.
pub fn sort_by_value(samples: &mut [Sample], order: SortOrder) {
    match order {
        SortOrder::None => {}
        SortOrder::Ascending => samples.sort_by(|a, b| a.value.total_cmp(&b.value)),
        SortOrder::Descending => samples.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
}

pub fn max_value(samples: &[Sample]) -> Option<f64> {
    samples.iter().map(|s| s.value).reduce(f64::max)
}
