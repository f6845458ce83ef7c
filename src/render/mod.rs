//! Fixed-width text rows for events.

pub mod compare;

use crate::event::{Event, QorEvent};
use crate::index::EventIndex;

pub use self::compare::{ColumnGroup, CompareLayout};

/// Single-log table header. With heartbeats enabled the info column
/// carries the heartbeat metric labels.
pub fn view_header(with_qor: bool, verbose: bool) -> String {
    let info = if with_qor {
        QorEvent::header(verbose)
    } else {
        "Info".to_string()
    };
    format!("{:>9}   {:<10}   {:<125}", "Line", "Tag", info)
}

/// One single-log row: line number, tag and message.
pub fn view_row(event: &Event, verbose: bool) -> String {
    format!(
        "{:>9} | {:<10} | {}",
        event.line,
        event.tag(),
        event.describe(verbose)
    )
}

/// Rows for every event of one log, in line order.
pub fn view_rows(index: &EventIndex, verbose: bool) -> Vec<String> {
    index.iter().map(|e| view_row(e, verbose)).collect()
}

/// Pad `text` with spaces or cut it to exactly `width` characters.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}
