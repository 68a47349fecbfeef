/// Random push feed
///
/// Holds a fixed-size labeled series and regenerates every value on each
/// tick, publishing the new set to all subscribers.
use crate::config::FeedConfig;
use crate::feed::{SampleCallback, SampleChannel, Subscribers, Subscription};
use crate::sample::{Sample, SampleSet};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub struct RandomFeed {
    series: RwLock<SampleSet>,
    upper_bound: u32,
    subscribers: Subscribers,
}

impl RandomFeed {
    pub fn new(config: &FeedConfig) -> Self {
        let series = config
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let value = config.initial.get(i).copied().unwrap_or(0.0);
                Sample::new(label.clone(), value)
            })
            .collect();
        Self::with_series(series, config.upper_bound)
    }

    pub fn with_series(series: SampleSet, upper_bound: u32) -> Self {
        Self {
            series: RwLock::new(series),
            upper_bound: upper_bound.max(1),
            subscribers: Subscribers::new(),
        }
    }

    /// Current series snapshot
    pub async fn current(&self) -> SampleSet {
        self.series.read().await.clone()
    }

    /// Replace the series and publish it
    pub async fn replace(&self, samples: SampleSet) -> usize {
        *self.series.write().await = samples.clone();
        self.subscribers.publish(&samples)
    }

    /// Regenerate every value uniformly from `[0, upper_bound)` and publish
    pub async fn tick(&self) -> SampleSet {
        let next: SampleSet = {
            let series = self.series.read().await;
            let mut rng = rand::rng();
            series
                .iter()
                .map(|s| {
                    Sample::new(s.name.clone(), rng.random_range(0..self.upper_bound) as f64)
                })
                .collect()
        };

        let delivered = self.replace(next.clone()).await;
        debug!(target: "feed", samples = next.len(), delivered, "Feed tick");
        next
    }

    /// Spawn the process-lifetime tick loop. The first tick fires one full
    /// interval after start.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!(target: "feed", interval_ms = period.as_millis() as u64, "Starting random feed");
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn upper_bound(&self) -> u32 {
        self.upper_bound
    }
}

impl Default for RandomFeed {
    fn default() -> Self {
        Self::new(&FeedConfig::default())
    }
}

impl SampleChannel for RandomFeed {
    fn subscribe(&self, callback: SampleCallback) -> Subscription {
        self.subscribers.add(callback)
    }
}
