// Adapter wiring a ChartView to its feeds
//
// Owns the view behind a mutex, issues the fetches the view asks for and
// feeds push deliveries into it. Unmounting releases the push
// subscription exactly once.
use crate::chart::{ChartFrame, ChartView, FetchTicket};
use crate::feed::{SampleChannel, SampleFetcher, Subscription};
use crate::sample::{Field, Sample, SortOrder};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub struct ChartController {
    view: Arc<Mutex<ChartView>>,
    fetcher: Option<Arc<dyn SampleFetcher>>,
    subscription: Option<Subscription>,
}

impl ChartController {
    pub fn new(view: ChartView) -> Self {
        Self {
            view: Arc::new(Mutex::new(view)),
            fetcher: None,
            subscription: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SampleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ChartView> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read the view under the lock
    pub fn with_view<R>(&self, f: impl FnOnce(&ChartView) -> R) -> R {
        f(&self.lock())
    }

    pub fn frame(&self) -> ChartFrame {
        self.lock().frame()
    }

    /// Mount the view and run the initial fetch, if it has a selection
    pub async fn mount(&self) {
        let ticket = self.lock().mount();
        self.run(ticket).await;
    }

    /// Subscribe push deliveries into the view. A previous subscription is released.
    pub fn attach(&mut self, channel: &dyn SampleChannel) {
        let view = Arc::clone(&self.view);
        let subscription = channel.subscribe(Arc::new(move |samples: &[Sample]| {
            let mut view = view.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            view.push_received(samples.to_vec());
        }));
        debug!(target: "chart", subscription = subscription.id(), "Chart attached to channel");
        if let Some(previous) = self.subscription.replace(subscription) {
            previous.unsubscribe();
        }
    }

    pub async fn select_field(&self, field: Field) {
        let ticket = self.lock().select_field(field);
        self.run(ticket).await;
    }

    pub async fn select_entities(&self, entities: Vec<String>) {
        let ticket = self.lock().select_entities(entities);
        self.run(ticket).await;
    }

    pub async fn refresh(&self) {
        let ticket = self.lock().refresh();
        self.run(ticket).await;
    }

    pub fn set_sort(&self, order: SortOrder) {
        self.lock().set_sort(order);
    }

    pub fn set_threshold(&self, threshold: Option<f64>) {
        self.lock().set_threshold(threshold);
    }

    pub fn pointer_enter(&self, index: usize, x: f64, y: f64) {
        self.lock().pointer_enter(index, x, y);
    }

    pub fn pointer_leave(&self) {
        self.lock().pointer_leave();
    }

    /// Release the push subscription and stop every later state update
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.lock().unmount();
    }

    async fn run(&self, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let Some(fetcher) = self.fetcher.as_ref() else {
            debug!(target: "chart", "No fetcher attached; skipping fetch");
            return;
        };

        let result = fetcher.fetch_once(&ticket.entities, ticket.field).await;

        let mut view = self.lock();
        match result {
            Ok(samples) => view.fetch_succeeded(&ticket, samples),
            Err(e) => view.fetch_failed(&ticket, &e),
        };
    }
}

impl Drop for ChartController {
    fn drop(&mut self) {
        self.unmount();
    }
}
