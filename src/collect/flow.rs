use std::sync::OnceLock;

use regex::Regex;

use crate::event::{Category, Event, EventKind, FlowEvent, TimerSetting};
use crate::store::LineStore;

use super::Collector;

const UTILIZATION: &str = "Information: Current block utilization is";
const TIMER_SETTINGS: &str = "Timer Settings:";

/// Lines after the `Timer Settings:` header that may hold settings.
const TIMER_BLOCK_LINES: usize = 9;

/// Flow step banners and the step name each one reports.
const STEPS: &[(&str, &str)] = &[
    ("Running initial placement", "initial_place"),
    ("Running initial HFS and DRC step.", "initial_drc"),
    ("Running initial optimization step.", "initial_opto"),
    ("Running final (timing-driven) placement step.", "final_place"),
    ("Running final optimization step.", "final_opto"),
    ("Running clock synthesis step.", "build_clock"),
    ("Running clock routing step.", "route_clock"),
    ("Running congestion-aware direct-timing-driven placement", "DTDP"),
];

fn utilization_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"Information: Current block utilization is '(.*)', effective utilization is '(.*)'\. \(OPT-055\)",
        )
        .expect("valid utilization regex")
    })
}

fn timer_setting(line: &str) -> Option<(TimerSetting, String)> {
    let setting = TimerSetting::all()
        .iter()
        .copied()
        .find(|s| line.starts_with(s.prefix()))?;
    let value = line.split(':').nth(1).unwrap_or_default().trim().to_string();
    Some((setting, value))
}

/// Flow steps, utilization reports and timer settings.
pub struct FlowCollector;

impl Collector for FlowCollector {
    fn name(&self) -> &'static str {
        "flow"
    }

    fn category(&self) -> Category {
        Category::Flow
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let mut events = Vec::new();

        for (n, line) in store.iter() {
            let flow = if line.starts_with("Running") {
                match STEPS.iter().find(|(banner, _)| line == *banner) {
                    Some((_, step)) => FlowEvent::Step(*step),
                    None => continue,
                }
            } else if line.starts_with(UTILIZATION) {
                match utilization_re().captures(line) {
                    Some(caps) => FlowEvent::Utilization {
                        raw: caps[1].to_string(),
                        effective: caps[2].to_string(),
                    },
                    None => continue,
                }
            } else if line.starts_with(TIMER_SETTINGS) {
                let settings = store
                    .forward(n + 1, n + 1 + TIMER_BLOCK_LINES)
                    .filter_map(|(_, l)| timer_setting(l))
                    .collect();
                FlowEvent::TimerSettings(settings)
            } else {
                continue;
            };

            events.push(Event::new(n, EventKind::Flow(flow)));
        }

        events
    }
}
