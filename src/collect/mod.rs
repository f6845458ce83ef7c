//! Event collectors.
//!
//! Each collector makes one pass over a [`LineStore`] and returns the
//! events of its category in ascending line order. Collectors never fail
//! on log content: missing context leaves fields at their unknown marker.

pub mod cellmap;
pub mod clocktree;
pub mod command;
pub mod dft;
pub mod flow;
pub mod freeform;
pub mod heartbeat;
pub mod legalize;
pub mod route;

use serde::Deserialize;
use thiserror::Error;

use crate::event::{Category, Event};
use crate::store::LineStore;

pub use self::freeform::{FreeformCollector, ProgressHandler};

/// Errors that can occur while preparing collectors.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Collector extracts the events of one category from a log.
pub trait Collector {
    /// Returns the collector's name for logging.
    fn name(&self) -> &'static str;

    /// Category of every event this collector emits.
    fn category(&self) -> Category;

    /// Scan the store and return events in ascending line order.
    fn collect(&self, store: &LineStore) -> Vec<Event>;
}

/// Which collectors run over a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectorSet {
    pub commands: bool,
    pub cellmap: bool,
    pub clocktree: bool,
    pub globalroute: bool,
    pub legalize: bool,
    pub dft: bool,
    pub qor: bool,
    pub flow: bool,
    /// Free-form pattern; every matching line becomes an event.
    pub regex: Option<String>,
}

impl CollectorSet {
    /// Collectors enabled when nothing was asked for explicitly.
    pub fn default_bundle() -> Self {
        Self {
            commands: true,
            clocktree: true,
            globalroute: true,
            legalize: true,
            dft: true,
            qor: true,
            ..Default::default()
        }
    }

    /// Collectors used when comparing two logs.
    pub fn comparison() -> Self {
        Self {
            flow: true,
            ..Self::default_bundle()
        }
    }

    /// True if any collector of the default bundle was enabled explicitly.
    pub fn has_bundle_selection(&self) -> bool {
        self.commands
            || self.clocktree
            || self.globalroute
            || self.legalize
            || self.dft
            || self.qor
    }

    /// Enable the default bundle on top of the extras when no bundle
    /// collector was selected.
    pub fn or_default_bundle(self) -> Self {
        if self.has_bundle_selection() {
            return self;
        }
        Self {
            cellmap: self.cellmap,
            flow: self.flow,
            regex: self.regex,
            ..Self::default_bundle()
        }
    }

    /// Instantiate the enabled collectors in merge order. Later
    /// collectors win when two claim the same line.
    pub fn build(
        &self,
        verbose: bool,
        progress: Option<ProgressHandler>,
    ) -> Result<Vec<Box<dyn Collector>>, CollectError> {
        let mut collectors: Vec<Box<dyn Collector>> = Vec::with_capacity(9);

        if self.cellmap {
            collectors.push(Box::new(cellmap::CellMapCollector));
        }
        if self.commands {
            collectors.push(Box::new(command::CommandCollector));
        }
        if self.clocktree {
            collectors.push(Box::new(clocktree::ClockTreeCollector));
        }
        if self.globalroute {
            collectors.push(Box::new(route::GlobalRouteCollector));
        }
        if self.legalize {
            collectors.push(Box::new(legalize::LegalizeCollector::new(verbose)));
        }
        if self.dft {
            collectors.push(Box::new(dft::DftCollector));
        }
        if self.qor {
            collectors.push(Box::new(heartbeat::QorCollector));
        }
        if self.flow {
            collectors.push(Box::new(flow::FlowCollector));
        }
        if let Some(pattern) = &self.regex {
            let mut freeform = FreeformCollector::new(pattern)?;
            if let Some(handler) = progress {
                freeform.on_progress(handler);
            }
            collectors.push(Box::new(freeform));
        }

        Ok(collectors)
    }
}
