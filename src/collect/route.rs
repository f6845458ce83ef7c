use std::sync::OnceLock;

use regex::Regex;

use crate::event::{Category, Event, EventKind, GlobalRouteEvent, RoutePhase};
use crate::store::LineStore;

use super::Collector;

const GR_START: &str = "Start Global Route ...";
const TRACK_ASSIGN: &str = "Start track assignment";

fn gr_phase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Start GR phase (\d+)").expect("valid GR phase regex"))
}

fn dr_iteration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Start DR iteration (\d+):").expect("valid DR regex"))
}

fn overflow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Both Dirs: Overflow =(\s+)(\d+) Max =(\s+)(\d+) GRCs =(\s+)(\d+) \((\S+)%")
            .expect("valid overflow regex")
    })
}

fn phase(line: &str) -> Option<RoutePhase> {
    if line.starts_with("Start GR phase ") {
        let caps = gr_phase_re().captures(line)?;
        return caps[1].parse().ok().map(RoutePhase::GlobalRoute);
    }
    if line == TRACK_ASSIGN {
        return Some(RoutePhase::TrackAssign);
    }
    if line.starts_with("Start DR iteration ") {
        let caps = dr_iteration_re().captures(line)?;
        return caps[1].parse().ok().map(RoutePhase::DetailRoute);
    }
    if line.starts_with("Initial.") || line.starts_with("phase") {
        let caps = overflow_re().captures(line)?;
        return Some(RoutePhase::Congestion(caps[7].to_string()));
    }
    None
}

/// Global-route runs with the phases each one went through.
pub struct GlobalRouteCollector;

impl Collector for GlobalRouteCollector {
    fn name(&self) -> &'static str {
        "globalroute"
    }

    fn category(&self) -> Category {
        Category::GlobalRoute
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let starts: Vec<usize> = store
            .iter()
            .filter(|(_, line)| line.starts_with(GR_START))
            .map(|(n, _)| n)
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let next = starts.get(i + 1).copied().unwrap_or(store.len() + 1);
                let phases = store
                    .forward(start + 1, next)
                    .filter_map(|(_, line)| phase(line))
                    .collect();
                Event::new(start, EventKind::GlobalRoute(GlobalRouteEvent { phases }))
            })
            .collect()
    }
}
