use std::sync::OnceLock;

use regex::Regex;

use crate::event::{Category, CommandEvent, Event, EventKind, TimingSummary, UNKNOWN};
use crate::store::LineStore;

use super::Collector;

const START_CMD: &str = "START_CMD:";
const SETUP_ROW: &str = "Design             (Setup) ";
const HOLD_ROW: &str = "Design             (Hold)";
const TABLE_RULE: &str = "----------";
const FATAL: &str = "The tool has just encountered a fatal error:";

/// Commands that are reported elsewhere and only add noise.
const IGNORED_COMMANDS: &[&str] = &["route_opt_cmd"];

/// How far below the setup row the hold row may appear.
const HOLD_SEARCH_LINES: usize = 100;

pub const SUMMARY_COMMAND: &str = "report_qor -summary";
pub const FATAL_COMMAND: &str = "FATAL";

fn command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"CMD:\s(.*)\sCPU:").expect("valid command regex"))
}

fn setup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Design\s+\(Setup\)\s+(\S+)\s+(\S+)\s+(\S+)").expect("valid setup regex")
    })
}

fn hold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Design\s+\(Hold\)\s+(\S+)\s+(\S+)\s+(\S+)").expect("valid hold regex")
    })
}

/// Tool commands, `report_qor -summary` tables and fatal errors.
pub struct CommandCollector;

impl CommandCollector {
    /// Pair a setup row with the hold row below it. Hold values stay
    /// unknown when the table ends or the search window runs out first.
    fn summary(store: &LineStore, line_no: usize, line: &str) -> Option<TimingSummary> {
        let setup = setup_re().captures(line)?;
        let mut summary = TimingSummary {
            wns: setup[1].to_string(),
            tns: setup[2].to_string(),
            nsv: setup[3].to_string(),
            whs: UNKNOWN.to_string(),
            ths: UNKNOWN.to_string(),
            nhv: UNKNOWN.to_string(),
        };

        for (_, candidate) in store.forward(line_no, line_no + HOLD_SEARCH_LINES) {
            if candidate.starts_with(TABLE_RULE) {
                break;
            }
            if !candidate.starts_with(HOLD_ROW) {
                continue;
            }
            if let Some(hold) = hold_re().captures(candidate) {
                summary.whs = hold[1].to_string();
                summary.ths = hold[2].to_string();
                summary.nhv = hold[3].to_string();
                break;
            }
        }

        Some(summary)
    }
}

impl Collector for CommandCollector {
    fn name(&self) -> &'static str {
        "command"
    }

    fn category(&self) -> Category {
        Category::Command
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let mut events = Vec::new();

        for (n, line) in store.iter() {
            let command = if line.starts_with(START_CMD) {
                let Some(caps) = command_re().captures(line) else {
                    continue;
                };
                let name = caps[1].trim();
                if IGNORED_COMMANDS.contains(&name) {
                    continue;
                }
                CommandEvent::new(name)
            } else if line.starts_with(SETUP_ROW) {
                let Some(summary) = Self::summary(store, n, line) else {
                    continue;
                };
                CommandEvent {
                    name: SUMMARY_COMMAND.to_string(),
                    summary: Some(summary),
                }
            } else if line == FATAL {
                CommandEvent::new(FATAL_COMMAND)
            } else {
                continue;
            };

            events.push(Event::new(n, EventKind::Command(command)));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(events: &[Event]) -> Vec<(usize, String)> {
        events
            .iter()
            .map(|e| (e.line, e.describe(false)))
            .collect()
    }

    #[test]
    fn test_start_cmd_lines() {
        let store = LineStore::from_text(
            "START_CMD: place_opt CPU: 12.3 s\n\
             START_CMD: route_opt_cmd CPU: 1 s\n\
             START_CMD: missing cpu marker\n\
             START_CMD:  clock_opt  CPU: 2 s",
        );
        let events = CommandCollector.collect(&store);
        assert_eq!(
            names(&events),
            vec![(1, "place_opt".to_string()), (4, "clock_opt".to_string())]
        );
    }

    #[test]
    fn test_summary_table() {
        let store = LineStore::from_text(
            "Design             (Setup)    -0.10    -5.00    12\n\
             Design             (Hold)     -0.01    -0.20     4\n\
             ----------",
        );
        let events = CommandCollector.collect(&store);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].line, 1);
        assert_eq!(
            events[0].describe(false),
            "report_qor -summary {WNS = -0.10, TNS = -5.00, NSV = 12, WHS = -0.01, THS = -0.20, NHV = 4}"
        );
    }

    #[test]
    fn test_summary_without_hold_row_keeps_setup() {
        let store = LineStore::from_text(
            "Design             (Setup)    -0.10    -5.00    12\n\
             ----------\n\
             Design             (Hold)     -0.01    -0.20     4",
        );
        let events = CommandCollector.collect(&store);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].describe(false),
            "report_qor -summary {WNS = -0.10, TNS = -5.00, NSV = 12, WHS = --, THS = --, NHV = --}"
        );

        let store = LineStore::from_text("Design             (Setup)    -0.10    -5.00    12\nsomething");
        let events = CommandCollector.collect(&store);
        assert_eq!(events.len(), 1);
        assert!(events[0].describe(false).ends_with("WHS = --, THS = --, NHV = --}"));
    }

    #[test]
    fn test_fatal_error() {
        let store = LineStore::from_text("x\nThe tool has just encountered a fatal error:\ny");
        let events = CommandCollector.collect(&store);
        assert_eq!(names(&events), vec![(2, "FATAL".to_string())]);
    }
}
