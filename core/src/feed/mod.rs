// Feed sources: where sample sets come from
//
// Push sources hand every new set to subscribed callbacks; pull sources
// fetch one set per call.

pub mod random;
pub mod weather;

pub use random::RandomFeed;
pub use weather::WeatherFeed;

use crate::sample::{Field, Sample, SampleSet};
use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Callback invoked with every published sample set
pub type SampleCallback = Arc<dyn Fn(&[Sample]) + Send + Sync>;

/// Push side of a feed
pub trait SampleChannel: Send + Sync {
    fn subscribe(&self, callback: SampleCallback) -> Subscription;
}

/// Pull side of a feed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SampleFetcher: Send + Sync {
    /// Fetch one value of `field` per entity, in entity order. Any failure
    /// fails the whole batch.
    async fn fetch_once(&self, entities: &[String], field: Field) -> Result<SampleSet>;
}

/// Scoped subscription handle.
///
/// The release hook runs exactly once: on `unsubscribe()` or on drop,
/// whichever comes first.
pub struct Subscription {
    id: u64,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(id: u64, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Callback registry shared by push feeds
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<SubscribersInner>,
}

#[derive(Default)]
struct SubscribersInner {
    callbacks: DashMap<u64, SampleCallback>,
    next_id: AtomicU64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: SampleCallback) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks.insert(id, callback);
        debug!(target: "feed", subscription = id, "Subscriber added");

        let inner: Weak<SubscribersInner> = Arc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(inner) = inner.upgrade() {
                inner.callbacks.remove(&id);
                debug!(target: "feed", subscription = id, "Subscriber removed");
            }
        })
    }

    /// Hand `samples` to every live callback. Returns how many were called.
    pub fn publish(&self, samples: &[Sample]) -> usize {
        // Snapshot first so a callback may unsubscribe without deadlocking the map
        let callbacks: Vec<SampleCallback> = self
            .inner
            .callbacks
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for callback in &callbacks {
            callback(samples);
        }
        callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.inner.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.callbacks.is_empty()
    }
}
