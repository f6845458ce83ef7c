use std::sync::OnceLock;

use regex::Regex;

use crate::event::{Category, ClockTreeEvent, CusStage, Event, EventKind, UNKNOWN};
use crate::store::LineStore;

use super::Collector;

const CTS_FUNC: &str = "START_FUNC: ctsInterf::";
const CCD_FUNC: &str = "START_FUNC: Concurrent Clock Data Optimization";
const CUS_INITIAL: &str = "Initial QoR";
const CUS_ESTIMATED: &str = "Final optimized QoR (commit with resolution)";
const CUS_NOTICE: &str = "INFO: CUS found no";

fn cts_step_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"START_FUNC: ctsInterf::(.*)\sCPU:").expect("valid cts regex"))
}

fn cus_setup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s+WNS\(setup\)=(\S+) TNS\(setup\)=(\S+) .*").expect("valid setup regex")
    })
}

fn cus_hold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s+WNS\(hold\)=(\S+) TNS\(hold\)=(\S+) .*").expect("valid hold regex")
    })
}

/// Clock-tree synthesis steps, CCD runs and CUS QoR snapshots.
pub struct ClockTreeCollector;

impl ClockTreeCollector {
    /// Read the setup and hold lines printed below a CUS QoR header.
    fn cus(store: &LineStore, line_no: usize, stage: CusStage) -> Option<ClockTreeEvent> {
        let setup = store
            .get(line_no + 1)
            .and_then(|l| cus_setup_re().captures(l));
        let hold = store
            .get(line_no + 2)
            .and_then(|l| cus_hold_re().captures(l));
        if setup.is_none() && hold.is_none() {
            return None;
        }

        let pair = |caps: Option<regex::Captures<'_>>| match caps {
            Some(c) => (c[1].to_string(), c[2].to_string()),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };
        let (wns, tns) = pair(setup);
        let (whs, ths) = pair(hold);

        Some(ClockTreeEvent::Cus {
            stage,
            wns,
            tns,
            whs,
            ths,
        })
    }
}

impl Collector for ClockTreeCollector {
    fn name(&self) -> &'static str {
        "clocktree"
    }

    fn category(&self) -> Category {
        Category::ClockTree
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let mut events = Vec::new();

        for (n, line) in store.iter() {
            let cts = if line.starts_with(CTS_FUNC) {
                let Some(caps) = cts_step_re().captures(line) else {
                    continue;
                };
                match caps[1].trim() {
                    "ccd" => continue,
                    step => ClockTreeEvent::Step(step.to_string()),
                }
            } else if line.starts_with(CCD_FUNC) {
                ClockTreeEvent::Ccd
            } else if line.starts_with(CUS_INITIAL) {
                match Self::cus(store, n, CusStage::Initial) {
                    Some(cus) => cus,
                    None => continue,
                }
            } else if line.starts_with(CUS_ESTIMATED) {
                match Self::cus(store, n, CusStage::Estimated) {
                    Some(cus) => cus,
                    None => continue,
                }
            } else if line.starts_with(CUS_NOTICE) {
                ClockTreeEvent::CusNotice(line["INFO: ".len()..].to_string())
            } else {
                continue;
            };

            events.push(Event::new(n, EventKind::ClockTree(cts)));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cts_steps_skip_ccd() {
        let store = LineStore::from_text(
            "START_FUNC: ctsInterf::buildClock  CPU: 1 s\n\
             START_FUNC: ctsInterf::ccd  CPU: 1 s\n\
             START_FUNC: Concurrent Clock Data Optimization (CPU: 3 s)",
        );
        let events = ClockTreeCollector.collect(&store);
        let got: Vec<(usize, String)> = events.iter().map(|e| (e.line, e.describe(false))).collect();
        assert_eq!(
            got,
            vec![(1, "buildClock".to_string()), (3, "CCD".to_string())]
        );
    }

    #[test]
    fn test_cus_snapshots() {
        let store = LineStore::from_text(
            "Initial QoR\n\
             \x20   WNS(setup)=-0.05 TNS(setup)=-1.20 NSV=3\n\
             \x20   WNS(hold)=-0.01 TNS(hold)=-0.02 NHV=1\n\
             Final optimized QoR (commit with resolution)\n\
             \x20   WNS(setup)=0.00 TNS(setup)=0.00 NSV=0\n\
             no hold line here\n\
             Initial QoR\n\
             nothing\n\
             INFO: CUS found no violations to fix",
        );
        let events = ClockTreeCollector.collect(&store);
        let got: Vec<(usize, String)> = events.iter().map(|e| (e.line, e.describe(false))).collect();
        assert_eq!(
            got,
            vec![
                (
                    1,
                    "CUS {initial wns -0.05, tns -1.20, whs -0.01, ths -0.02}".to_string()
                ),
                (4, "CUS {estimated wns 0.00, tns 0.00, whs --, ths --}".to_string()),
                (9, "CUS found no violations to fix".to_string()),
            ]
        );
    }

    #[test]
    fn test_cus_header_with_trailing_text() {
        let store = LineStore::from_text(
            "Initial QoR:\n\
             \x20   WNS(setup)=-0.05 TNS(setup)=-1.20 NSV=3\n\
             \x20   WNS(hold)=-0.01 TNS(hold)=-0.02 NHV=1\n\
             Final optimized QoR (commit with resolution) \n\
             \x20   WNS(setup)=0.00 TNS(setup)=0.00 NSV=0",
        );
        let events = ClockTreeCollector.collect(&store);
        let got: Vec<(usize, String)> = events.iter().map(|e| (e.line, e.describe(false))).collect();
        assert_eq!(
            got,
            vec![
                (
                    1,
                    "CUS {initial wns -0.05, tns -1.20, whs -0.01, ths -0.02}".to_string()
                ),
                (4, "CUS {estimated wns 0.00, tns 0.00, whs --, ths --}".to_string()),
            ]
        );
    }
}
