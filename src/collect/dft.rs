use crate::event::{Category, DftEvent, Event, EventKind};
use crate::store::LineStore;

use super::Collector;

const PRE_OPT: &str = "DFT: pre-opt wirelength:";
const POST_OPT: &str = "DFT: post-opt wirelength:";

fn last_token(line: &str) -> String {
    line.split(' ').next_back().unwrap_or_default().to_string()
}

/// Scan-chain wirelength before and after DFT optimization.
pub struct DftCollector;

impl Collector for DftCollector {
    fn name(&self) -> &'static str {
        "dft"
    }

    fn category(&self) -> Category {
        Category::Dft
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        store
            .iter()
            .filter(|(_, line)| line.starts_with(PRE_OPT))
            .filter_map(|(n, line)| {
                let post = store.get(n + 1).filter(|l| l.starts_with(POST_OPT))?;
                let dft = DftEvent {
                    pre_opt: last_token(line),
                    post_opt: last_token(post),
                };
                Some(Event::new(n, EventKind::Dft(dft)))
            })
            .collect()
    }
}
