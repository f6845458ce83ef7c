use crate::event::{Category, CellMapStep, Event, EventKind};
use crate::store::LineStore;

use super::Collector;

const INIT_INSTANCES_LEGAL: &str = "START_FUNC: bool nplCellMap::initInstancesLegal";
const INIT_INSTANCES: &str = "START_FUNC: bool nplCellMap::initInstances";

/// Cell-map initialization entry points.
pub struct CellMapCollector;

impl Collector for CellMapCollector {
    fn name(&self) -> &'static str {
        "cellmap"
    }

    fn category(&self) -> Category {
        Category::CellMap
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        store
            .iter()
            .filter_map(|(n, line)| {
                // The legal variant shares its prefix with the plain one.
                let step = if line.starts_with(INIT_INSTANCES_LEGAL) {
                    CellMapStep::InitInstancesLegal
                } else if line.starts_with(INIT_INSTANCES) {
                    CellMapStep::InitInstances
                } else {
                    return None;
                };
                Some(Event::new(n, EventKind::CellMap(step)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_variant_wins() {
        let store = LineStore::from_text(
            "START_FUNC: bool nplCellMap::initInstances() CPU: 1\n\
             noise\n\
             START_FUNC: bool nplCellMap::initInstancesLegal() CPU: 2",
        );
        let events = CellMapCollector.collect(&store);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].line, 1);
        assert_eq!(events[0].describe(false), "initInstances");
        assert_eq!(events[1].line, 3);
        assert_eq!(events[1].describe(false), "initInstancesLegal");
    }
}
