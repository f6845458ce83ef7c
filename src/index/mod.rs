//! Per-log event index keyed by line number.

use std::collections::BTreeMap;

use tracing::debug;

use crate::collect::Collector;
use crate::event::{Event, EventKind};
use crate::store::LineStore;

/// Every event extracted from one log, ordered by line number.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    events: BTreeMap<usize, Event>,
}

impl EventIndex {
    /// Run the collectors in order and merge their events. When two
    /// collectors claim the same line, the later one wins.
    pub fn build(store: &LineStore, collectors: &[Box<dyn Collector>]) -> Self {
        let mut index = Self::default();

        for collector in collectors {
            let events = collector.collect(store);
            debug!(
                collector = collector.name(),
                category = %collector.category(),
                count = events.len(),
                "collected events"
            );
            for event in events {
                index.insert(event);
            }
        }

        let folded = index.collapse_repeats();
        debug!(events = index.len(), folded, "built event index");

        index
    }

    /// Insert an event, replacing any event already on its line.
    pub fn insert(&mut self, event: Event) -> Option<Event> {
        self.events.insert(event.line, event)
    }

    /// Fold runs of identical plain commands on consecutive retained
    /// events into the first one. Returns how many events were removed.
    pub fn collapse_repeats(&mut self) -> usize {
        let mut removed = Vec::new();
        let mut run_head: Option<usize> = None;
        let lines: Vec<usize> = self.events.keys().copied().collect();

        for line in lines {
            let Some(head) = run_head else {
                run_head = Some(line);
                continue;
            };
            if Self::same_plain_command(&self.events[&head], &self.events[&line]) {
                if let Some(event) = self.events.get_mut(&head) {
                    event.repeat_count += 1;
                }
                removed.push(line);
            } else {
                run_head = Some(line);
            }
        }

        for line in &removed {
            self.events.remove(line);
        }
        removed.len()
    }

    fn same_plain_command(a: &Event, b: &Event) -> bool {
        match (&a.kind, &b.kind) {
            (EventKind::Command(x), EventKind::Command(y)) => {
                x.is_simple() && y.is_simple() && x.name == y.name
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, line: usize) -> Option<&Event> {
        self.events.get(&line)
    }

    /// Events in ascending line order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Line numbers in ascending order.
    pub fn lines(&self) -> Vec<usize> {
        self.events.keys().copied().collect()
    }
}

impl FromIterator<Event> for EventIndex {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut index = Self::default();
        for event in iter {
            index.insert(event);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::CollectorSet;
    use crate::event::{CommandEvent, TimingSummary};

    fn cmd(line: usize, name: &str) -> Event {
        Event::new(line, EventKind::Command(CommandEvent::new(name)))
    }

    #[test]
    fn test_three_repeats_collapse() {
        let mut index: EventIndex = [cmd(2, "place_opt"), cmd(5, "place_opt"), cmd(9, "place_opt")]
            .into_iter()
            .collect();
        assert_eq!(index.collapse_repeats(), 2);
        assert_eq!(index.len(), 1);
        let event = index.get(2).unwrap();
        assert_eq!(event.repeat_count, 3);
        assert_eq!(event.describe(false), "place_opt (repeated 3 times)");
    }

    #[test]
    fn test_runs_are_broken_by_other_events() {
        let mut index: EventIndex = [
            cmd(1, "a"),
            cmd(2, "a"),
            cmd(3, "b"),
            cmd(4, "a"),
            Event::new(5, EventKind::Freeform("x".into())),
            cmd(6, "a"),
        ]
        .into_iter()
        .collect();
        index.collapse_repeats();
        assert_eq!(index.lines(), vec![1, 3, 4, 5, 6]);
        assert_eq!(index.get(1).unwrap().repeat_count, 2);
        assert_eq!(index.get(4).unwrap().repeat_count, 1);
    }

    #[test]
    fn test_summaries_never_collapse() {
        let summary = TimingSummary {
            wns: "0".into(),
            tns: "0".into(),
            nsv: "0".into(),
            whs: "0".into(),
            ths: "0".into(),
            nhv: "0".into(),
        };
        let with_summary = |line| {
            Event::new(
                line,
                EventKind::Command(CommandEvent {
                    name: "report_qor -summary".into(),
                    summary: Some(summary.clone()),
                }),
            )
        };
        let mut index: EventIndex = [with_summary(1), with_summary(2)].into_iter().collect();
        assert_eq!(index.collapse_repeats(), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_later_collector_wins_same_line() {
        let store = LineStore::from_text("START_CMD: place_opt CPU: 1 s\nother");
        let set = CollectorSet {
            commands: true,
            regex: Some("START_CMD".into()),
            ..Default::default()
        };
        let collectors = set.build(false, None).unwrap();
        let index = EventIndex::build(&store, &collectors);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(1).unwrap().tag(), "REGEX");
    }

    #[test]
    fn test_empty_store_builds_empty_index() {
        let collectors = CollectorSet::default_bundle().build(true, None).unwrap();
        let index = EventIndex::build(&LineStore::default(), &collectors);
        assert!(index.is_empty());
    }
}
