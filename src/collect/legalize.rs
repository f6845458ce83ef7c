//! Legalizer runs and coarse placement progress.
//!
//! Each legalizer event owns the lines up to the next legalizer or
//! placement event. Its displacement statistics come from that stretch,
//! and in verbose mode so does the runtime, bracketed by the nearest
//! `legalize_placement` function markers.

use std::sync::OnceLock;

use regex::Regex;

use crate::event::{
    Category, Event, EventKind, LegalizeEvent, LegalizeRuntime, LegalizeStats, UNKNOWN,
};
use crate::store::LineStore;

use super::Collector;

const LGL_START: &str = "Starting legalizer.";
const PLACE_START: &str = "Running placement using ";
const FUNC_BEGIN: &str = "START_FUNC: legalize_placement";
const FUNC_END: &str = "END_FUNC: legalize_placement";

/// Lines searched after a placement start for its coarse progress.
const PLACE_SEARCH_LINES: usize = 50;

fn coarse_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"coarse place (\d+)% done\.").expect("valid coarse regex"))
}

fn elapse_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ELAPSE:\s+(\d+) s").expect("valid elapse regex"))
}

fn elapse_stamp(line: &str) -> Option<u64> {
    elapse_re().captures(line)?[1].parse().ok()
}

/// Legalizer and placement starts.
pub struct LegalizeCollector {
    with_runtime: bool,
}

impl LegalizeCollector {
    /// `with_runtime` adds the runtime bracket to each legalizer run.
    pub fn new(with_runtime: bool) -> Self {
        Self { with_runtime }
    }

    fn stats(store: &LineStore, line_no: usize, next: usize) -> LegalizeStats {
        let mut stats = LegalizeStats::default();
        let token = |line: &str, idx: usize| {
            line.split_whitespace()
                .nth(idx)
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        for (_, line) in store.forward(line_no + 1, next) {
            if line.starts_with("number of cells aggregated:") {
                stats.total = token(line, 4);
            } else if line.starts_with("max cell displacement:") {
                stats.max = token(line, 3);
            } else if line.starts_with("avg cell displacement:") {
                stats.avg = token(line, 3);
            } else if line.starts_with("number of cells moved:") {
                stats.moved = token(line, 4);
            } else if line.starts_with("number of large displacements:") {
                stats.large = token(line, 4);
                break;
            }
        }

        stats
    }

    fn runtime(
        store: &LineStore,
        line_no: usize,
        prev: usize,
        next: usize,
    ) -> Option<LegalizeRuntime> {
        let begin = store
            .backward(line_no, prev)
            .filter(|(_, l)| l.starts_with(FUNC_BEGIN))
            .find_map(|(_, l)| elapse_stamp(l));
        let end = store
            .forward(line_no, next)
            .filter(|(_, l)| l.starts_with(FUNC_END))
            .find_map(|(_, l)| elapse_stamp(l));

        match (begin, end) {
            (Some(b), Some(e)) if b < e => Some(LegalizeRuntime::Elapsed(e - b)),
            (Some(_), Some(_)) => None,
            (Some(b), None) => Some(LegalizeRuntime::BeginAt(b)),
            (None, Some(e)) => Some(LegalizeRuntime::EndAt(e)),
            (None, None) => None,
        }
    }

    fn coarse_pct(store: &LineStore, line_no: usize) -> String {
        store
            .forward(line_no + 1, line_no + 1 + PLACE_SEARCH_LINES)
            .find_map(|(_, l)| coarse_re().captures(l).map(|c| c[1].to_string()))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

#[derive(Clone, Copy)]
enum Start {
    Legalizer,
    Placement,
}

impl Collector for LegalizeCollector {
    fn name(&self) -> &'static str {
        "legalize"
    }

    fn category(&self) -> Category {
        Category::Legalize
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let starts: Vec<(usize, Start)> = store
            .iter()
            .filter_map(|(n, line)| {
                if line.starts_with(LGL_START) {
                    Some((n, Start::Legalizer))
                } else if line.starts_with(PLACE_START) {
                    Some((n, Start::Placement))
                } else {
                    None
                }
            })
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(i, &(line_no, start))| {
                let prev = if i == 0 { 0 } else { starts[i - 1].0 };
                let next = starts
                    .get(i + 1)
                    .map(|(n, _)| *n)
                    .unwrap_or(store.len() + 1);

                let lgl = match start {
                    Start::Legalizer => {
                        let mut stats = Self::stats(store, line_no, next);
                        if self.with_runtime {
                            stats.runtime = Self::runtime(store, line_no, prev, next);
                        }
                        LegalizeEvent::Legalize(stats)
                    }
                    Start::Placement => LegalizeEvent::Place {
                        coarse_pct: Self::coarse_pct(store, line_no),
                    },
                };
                Event::new(line_no, EventKind::Legalize(lgl))
            })
            .collect()
    }
}
