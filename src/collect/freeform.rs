use regex::Regex;

use crate::event::{Category, Event, EventKind};
use crate::store::LineStore;

use super::{CollectError, Collector};

/// Smallest number of lines scanned between progress reports.
const MIN_BATCH_LINES: usize = 10_000;

/// Receives the percentage of lines scanned so far.
pub type ProgressHandler = Box<dyn Fn(usize) + Send + Sync>;

/// Emits an event for every line matching a user pattern.
pub struct FreeformCollector {
    pattern: Regex,
    progress: Option<ProgressHandler>,
}

impl FreeformCollector {
    pub fn new(pattern: &str) -> Result<Self, CollectError> {
        let pattern = Regex::new(pattern).map_err(|source| CollectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern,
            progress: None,
        })
    }

    /// Register a callback invoked after each batch of lines.
    pub fn on_progress(&mut self, handler: ProgressHandler) {
        self.progress = Some(handler);
    }

    /// Lines scanned per batch: at least 10,000, at most ten reports.
    pub fn batch_size(total: usize) -> usize {
        MIN_BATCH_LINES.max(total / 10 + 1)
    }
}

impl Collector for FreeformCollector {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn category(&self) -> Category {
        Category::Freeform
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let total = store.len();
        let batch = Self::batch_size(total);
        let mut events = Vec::new();
        let mut start = 1;

        while start <= total {
            let end = (start + batch).min(total + 1);
            for (n, line) in store.forward(start, end) {
                if self.pattern.is_match(line) {
                    events.push(Event::new(n, EventKind::Freeform(line.to_string())));
                }
            }
            if let Some(handler) = &self.progress {
                handler((end - 1) * 100 / total);
            }
            start = end;
        }

        events
    }
}
