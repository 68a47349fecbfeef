// Chart view state machine
//
// Every event the rendering adapter observes (mount, selection change,
// fetch completion, push delivery, pointer movement, teardown) is an
// explicit method here. Rendering reads the state through `frame()`.
use crate::chart::frame::{ChartFrame, Hover};
use crate::config::ChartConfig;
use crate::sample::{filter_min, sort_by_value, Field, SampleSet, SortOrder};
use crate::PulseError;
use serde::Serialize;
use tracing::{debug, info, warn};

/// User-facing message for any failed fetch
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// One issued fetch. Completions carrying an older generation are stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub entities: Vec<String>,
    pub field: Field,
}

pub struct ChartView {
    config: ChartConfig,
    /// Last full set delivered by a fetch or push
    samples: SampleSet,
    /// `samples` after filter and sort
    visible: SampleSet,
    field: Field,
    entities: Vec<String>,
    sort: SortOrder,
    threshold: Option<f64>,
    loading: bool,
    error: Option<String>,
    hover: Option<Hover>,
    generation: u64,
    torn_down: bool,
}

impl ChartView {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
            visible: Vec::new(),
            field: Field::default(),
            entities: Vec::new(),
            sort: SortOrder::None,
            threshold: None,
            loading: false,
            error: None,
            hover: None,
            generation: 0,
            torn_down: false,
        }
    }

    /// Initial selection, applied before `mount()`
    pub fn with_selection(mut self, entities: Vec<String>, field: Field) -> Self {
        self.entities = entities;
        self.field = field;
        self
    }

    pub fn status(&self) -> ChartStatus {
        if self.error.is_some() {
            ChartStatus::Error
        } else if self.loading {
            ChartStatus::Loading
        } else if !self.samples.is_empty() {
            ChartStatus::Ready
        } else {
            ChartStatus::Idle
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn visible(&self) -> &SampleSet {
        &self.visible
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// `Idle → Loading`. Returns the fetch to issue, or `None` for a view
    /// that waits on push delivery only.
    pub fn mount(&mut self) -> Option<FetchTicket> {
        if self.torn_down {
            return None;
        }
        debug!(target: "chart", entities = self.entities.len(), field = %self.field, "Chart mounted");
        if self.entities.is_empty() {
            self.loading = true;
            self.error = None;
            return None;
        }
        Some(self.begin_fetch())
    }

    pub fn select_field(&mut self, field: Field) -> Option<FetchTicket> {
        if self.torn_down {
            return None;
        }
        self.field = field;
        if self.entities.is_empty() {
            return None;
        }
        Some(self.begin_fetch())
    }

    /// Changing the entity set refetches; an empty selection drops back to `Idle`
    pub fn select_entities(&mut self, entities: Vec<String>) -> Option<FetchTicket> {
        if self.torn_down {
            return None;
        }
        self.entities = entities;
        if self.entities.is_empty() {
            // Invalidate anything still in flight
            self.generation += 1;
            self.samples.clear();
            self.loading = false;
            self.error = None;
            self.recompute();
            return None;
        }
        Some(self.begin_fetch())
    }

    /// Re-issue the current selection
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        if self.torn_down || self.entities.is_empty() {
            return None;
        }
        Some(self.begin_fetch())
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        FetchTicket {
            generation: self.generation,
            entities: self.entities.clone(),
            field: self.field,
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        if self.torn_down {
            return false;
        }
        if ticket.generation != self.generation {
            debug!(
                target: "chart",
                ticket = ticket.generation,
                current = self.generation,
                "Ignoring stale fetch completion"
            );
            return false;
        }
        true
    }

    /// `Loading → Ready`. An empty set counts as a malformed response.
    pub fn fetch_succeeded(&mut self, ticket: &FetchTicket, samples: SampleSet) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        if samples.is_empty() {
            warn!(target: "chart", generation = ticket.generation, "Fetch returned no samples");
            self.error = Some(FETCH_FAILED_MESSAGE.to_string());
            return true;
        }
        info!(target: "chart", samples = samples.len(), field = %ticket.field, "Chart data loaded");
        self.error = None;
        self.samples = samples;
        self.recompute();
        true
    }

    /// `Loading → Error`. Previously loaded samples stay untouched.
    pub fn fetch_failed(&mut self, ticket: &FetchTicket, cause: &PulseError) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        warn!(target: "chart", error = %cause, generation = ticket.generation, "Fetch failed");
        self.loading = false;
        self.error = Some(FETCH_FAILED_MESSAGE.to_string());
        true
    }

    /// Push delivery: replace the set and re-render in place
    pub fn push_received(&mut self, samples: SampleSet) -> bool {
        if self.torn_down {
            return false;
        }
        self.loading = false;
        self.error = None;
        self.samples = samples;
        self.recompute();
        true
    }

    pub fn set_sort(&mut self, order: SortOrder) {
        if self.torn_down {
            return;
        }
        self.sort = order;
        self.recompute();
    }

    /// Show only samples with `value >= threshold`. Non-destructive.
    pub fn set_threshold(&mut self, threshold: Option<f64>) {
        if self.torn_down {
            return;
        }
        self.threshold = threshold.filter(|t| t.is_finite());
        self.recompute();
    }

    /// Pointer entered the bar at `index` of the visible set
    pub fn pointer_enter(&mut self, index: usize, x: f64, y: f64) {
        if self.torn_down || index >= self.visible.len() {
            return;
        }
        self.hover = Some(Hover { index, x, y });
    }

    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    /// Tear down. Every later event is ignored.
    pub fn unmount(&mut self) {
        if !self.torn_down {
            debug!(target: "chart", "Chart unmounted");
        }
        self.torn_down = true;
        self.hover = None;
    }

    fn recompute(&mut self) {
        let mut visible = match self.threshold {
            Some(t) => filter_min(&self.samples, t),
            None => self.samples.clone(),
        };
        sort_by_value(&mut visible, self.sort);
        self.visible = visible;
        if self.hover.is_some_and(|h| h.index >= self.visible.len()) {
            self.hover = None;
        }
    }

    pub fn frame(&self) -> ChartFrame {
        ChartFrame::layout(
            &self.visible,
            &self.config,
            self.hover,
            self.status(),
            self.error.clone(),
        )
    }
}

impl Default for ChartView {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}
