//! Side-by-side rows for two aligned logs.
//!
//! Heartbeats show the metric columns of the selected groups; every
//! other event shows its compact message. Column widths are shared by
//! both sides and sized to the widest value found in either log.

use std::fmt;

use serde::Deserialize;

use crate::align::AlignedPair;
use crate::event::{Event, QorEvent, QorField};
use crate::index::EventIndex;

use super::fit;

/// Separator between the left and right halves of a row.
pub const SEPARATOR: &str = " |";

const MIN_TOTAL_WIDTH: usize = 100;
const MIN_MESSAGE_WIDTH: usize = 75;
/// Room taken by the line and tag columns in front of the message.
const ROW_PREFIX_WIDTH: usize = 25;
const ELLIPSIS: &str = " ...";

/// Named set of heartbeat columns shown in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnGroup {
    Setup,
    Hold,
    Area,
    Drc,
    Buf,
    Power,
    Runtime,
}

impl ColumnGroup {
    /// All groups in display order.
    pub fn all() -> &'static [Self] {
        &[
            Self::Setup,
            Self::Hold,
            Self::Area,
            Self::Drc,
            Self::Buf,
            Self::Power,
            Self::Runtime,
        ]
    }

    /// Groups shown when none are requested.
    pub fn defaults() -> Vec<Self> {
        vec![Self::Setup, Self::Drc]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Hold => "hold",
            Self::Area => "area",
            Self::Drc => "drc",
            Self::Buf => "buf",
            Self::Power => "power",
            Self::Runtime => "runtime",
        }
    }

    fn columns(self) -> &'static [Column] {
        match self {
            Self::Setup => &[Column::Wns, Column::Tns, Column::Nsv],
            Self::Hold => &[Column::Whs, Column::Ths, Column::Nhv],
            Self::Area => &[Column::Area, Column::NumInst],
            Self::Drc => &[Column::MaxTran, Column::MaxTranV, Column::MaxCap, Column::MaxCapV],
            Self::Buf => &[Column::NumBuf, Column::NumInv],
            Self::Power => &[Column::Leakage, Column::NumLvth, Column::PctLvth],
            Self::Runtime => &[Column::Elapsed, Column::Incr, Column::Mem],
        }
    }
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Column {
    Wns = 0,
    Tns = 1,
    Nsv = 2,
    Whs = 3,
    Ths = 4,
    Nhv = 5,
    Area = 6,
    NumInst = 7,
    MaxTran = 8,
    MaxTranV = 9,
    MaxCap = 10,
    MaxCapV = 11,
    NumBuf = 12,
    NumInv = 13,
    Leakage = 14,
    NumLvth = 15,
    PctLvth = 16,
    Elapsed = 17,
    Incr = 18,
    Mem = 19,
}

/// Number of Column variants, used for array sizing.
const COLUMN_COUNT: usize = 20;

const ALL_COLUMNS: [Column; COLUMN_COUNT] = [
    Column::Wns,
    Column::Tns,
    Column::Nsv,
    Column::Whs,
    Column::Ths,
    Column::Nhv,
    Column::Area,
    Column::NumInst,
    Column::MaxTran,
    Column::MaxTranV,
    Column::MaxCap,
    Column::MaxCapV,
    Column::NumBuf,
    Column::NumInv,
    Column::Leakage,
    Column::NumLvth,
    Column::PctLvth,
    Column::Elapsed,
    Column::Incr,
    Column::Mem,
];

impl Column {
    const fn label(self) -> &'static str {
        match self {
            Self::Wns => "WNS",
            Self::Tns => "TNS",
            Self::Nsv => "NSV",
            Self::Whs => "WHS",
            Self::Ths => "THS",
            Self::Nhv => "NHV",
            Self::Area => "AREA",
            Self::NumInst => "#INST",
            Self::MaxTran => "MTRAN",
            Self::MaxTranV => "MTV",
            Self::MaxCap => "MCAP",
            Self::MaxCapV => "MCV",
            Self::NumBuf => "#BUF",
            Self::NumInv => "#INV",
            Self::Leakage => "LEAKAGE",
            Self::NumLvth => "#LVTH",
            Self::PctLvth => "%LVTH",
            Self::Elapsed => "ELAPSED",
            Self::Incr => "INCR",
            Self::Mem => "MEM",
        }
    }

    fn value(self, qor: &QorEvent) -> String {
        let field = match self {
            Self::Wns => QorField::Wns,
            Self::Tns => QorField::Tns,
            Self::Nsv => QorField::Nsv,
            Self::Whs => QorField::Whv,
            Self::Ths => QorField::Thv,
            Self::Nhv => QorField::Nhv,
            Self::Area => QorField::Area,
            Self::NumInst => QorField::NumInst,
            Self::MaxTran => QorField::MaxTran,
            Self::MaxTranV => QorField::MaxTranV,
            Self::MaxCap => QorField::MaxCap,
            Self::MaxCapV => QorField::MaxCapV,
            Self::NumBuf => QorField::NumBuf,
            Self::NumInv => QorField::NumInv,
            Self::Leakage => QorField::Leakage,
            Self::NumLvth => QorField::NumLvth,
            Self::PctLvth => QorField::PctLvth,
            Self::Elapsed => QorField::Elapsed,
            Self::Incr => return qor.delta_text(),
            Self::Mem => QorField::PeakMem,
        };
        qor.get(field).to_string()
    }

    const fn position(self) -> usize {
        self as usize
    }
}

/// Widths and selected columns shared by both sides of a comparison.
#[derive(Debug, Clone)]
pub struct CompareLayout {
    columns: Vec<Column>,
    widths: [usize; COLUMN_COUNT],
    header: String,
    total_width: usize,
}

impl CompareLayout {
    /// Size every column to its label or the widest heartbeat value of
    /// either log. An empty `groups` selects the default groups.
    pub fn new(groups: &[ColumnGroup], left: &EventIndex, right: &EventIndex) -> Self {
        let groups = if groups.is_empty() {
            ColumnGroup::defaults()
        } else {
            groups.to_vec()
        };
        // Display order is fixed regardless of how groups were requested.
        let columns: Vec<Column> = ColumnGroup::all()
            .iter()
            .filter(|g| groups.contains(*g))
            .flat_map(|g| g.columns().iter().copied())
            .collect();

        let mut widths = ALL_COLUMNS.map(|c| c.label().len());
        for qor in left.iter().chain(right.iter()).filter_map(Event::as_qor) {
            for column in ALL_COLUMNS {
                let slot = &mut widths[column.position()];
                *slot = (*slot).max(column.value(qor).chars().count());
            }
        }

        let mut layout = Self {
            columns,
            widths,
            header: String::new(),
            total_width: 0,
        };

        let mut header = format!("{:>9}   {:<10}  ", "Line", "Tag");
        for column in &layout.columns {
            header.push_str(&layout.cell(*column, column.label()));
        }
        layout.total_width = header.len() + 1;
        layout.header = header;
        layout
    }

    fn cell(&self, column: Column, text: &str) -> String {
        let width = self.widths[column.position()];
        format!(" {text:>width$}")
    }

    /// Width of one side of a row.
    pub fn total_width(&self) -> usize {
        self.total_width.max(MIN_TOTAL_WIDTH)
    }

    /// Width of the message column on one side.
    pub fn message_width(&self) -> usize {
        MIN_MESSAGE_WIDTH.max(self.total_width.saturating_sub(ROW_PREFIX_WIDTH))
    }

    /// Column header for one side.
    pub fn header(&self) -> String {
        fit(&self.header, self.total_width())
    }

    /// Log name for one side, padded to the side width.
    pub fn title(&self, name: &str) -> String {
        fit(name, self.total_width())
    }

    /// Message text for one side, padded or truncated to the message width.
    pub fn message(&self, event: Option<&Event>) -> String {
        let width = self.message_width();
        let Some(event) = event else {
            return " ".repeat(width);
        };

        let msg = match event.as_qor() {
            Some(qor) => {
                let cells: String = self
                    .columns
                    .iter()
                    .map(|c| self.cell(*c, &c.value(qor)))
                    .collect();
                cells.strip_prefix(' ').unwrap_or(&cells).to_string()
            }
            None => event.describe_compact(false),
        };

        if msg.chars().count() > width {
            let mut cut: String = msg.chars().take(width - ELLIPSIS.len()).collect();
            cut.push_str(ELLIPSIS);
            cut
        } else {
            fit(&msg, width)
        }
    }

    /// One side of a row: line, tag and message.
    pub fn side(&self, event: Option<&Event>) -> String {
        let (line, tag) = match event {
            Some(e) => (e.line.to_string(), e.tag()),
            None => (String::new(), String::new()),
        };
        format!("{:>9} | {:<10} | {}", line, tag, self.message(event))
    }

    /// A full comparison row.
    pub fn row(&self, left: Option<&Event>, right: Option<&Event>) -> String {
        format!("{}{}{}", self.side(left), SEPARATOR, self.side(right))
    }
}

/// Render a whole comparison: the two log names, the column header and
/// one row per aligned pair. Nothing is rendered when both logs are empty.
pub fn render(
    names: (&str, &str),
    left: &EventIndex,
    right: &EventIndex,
    groups: &[ColumnGroup],
    pairs: &[AlignedPair],
) -> Vec<String> {
    if left.is_empty() && right.is_empty() {
        return Vec::new();
    }

    let layout = CompareLayout::new(groups, left, right);
    let header = layout.header();
    let mut rows = Vec::with_capacity(pairs.len() + 2);
    rows.push(format!(
        "{}{}{}",
        layout.title(names.0),
        SEPARATOR,
        layout.title(names.1)
    ));
    rows.push(format!("{header}{SEPARATOR}{header}"));

    for (l, r) in pairs {
        let l = l.and_then(|n| left.get(n));
        let r = r.and_then(|n| right.get(n));
        rows.push(layout.row(l, r));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CommandEvent, EventKind, QorSubtype};

    fn beat(line: usize, wns: &str) -> Event {
        let mut qor = QorEvent::new(QorSubtype::Npo, "");
        qor.name = "START".into();
        qor.metrics.set(QorField::Wns, wns);
        Event::new(line, EventKind::Qor(qor))
    }

    fn cmd(line: usize, name: &str) -> Event {
        Event::new(line, EventKind::Command(CommandEvent::new(name)))
    }

    #[test]
    fn test_default_groups_header() {
        let empty = EventIndex::default();
        let layout = CompareLayout::new(&[], &empty, &empty);
        let header = layout.header();
        assert_eq!(header.len(), MIN_TOTAL_WIDTH);
        let labels: Vec<&str> = header.split_whitespace().collect();
        assert_eq!(
            labels,
            vec!["Line", "Tag", "WNS", "TNS", "NSV", "MTRAN", "MTV", "MCAP", "MCV"]
        );
    }

    #[test]
    fn test_group_order_is_fixed() {
        let empty = EventIndex::default();
        let layout = CompareLayout::new(
            &[ColumnGroup::Runtime, ColumnGroup::Setup],
            &empty,
            &empty,
        );
        let labels: Vec<String> = layout
            .header()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        assert_eq!(labels[2..], ["WNS", "TNS", "NSV", "ELAPSED", "INCR", "MEM"]);
    }

    #[test]
    fn test_widths_follow_widest_value() {
        let left: EventIndex = [beat(3, "-123456.789")].into_iter().collect();
        let right: EventIndex = [beat(4, "0.0")].into_iter().collect();
        let layout = CompareLayout::new(&[ColumnGroup::Setup], &left, &right);

        let msg = layout.message(right.get(4));
        assert!(msg.starts_with("        0.0 "));
        assert_eq!(msg.len(), layout.message_width());
    }

    #[test]
    fn test_gap_side_is_blank() {
        let left: EventIndex = [cmd(5, "place_opt")].into_iter().collect();
        let layout = CompareLayout::new(&[], &left, &EventIndex::default());
        let row = layout.row(left.get(5), None);
        let (l, r) = row.split_once(SEPARATOR).unwrap();
        assert!(l.starts_with("        5 | CMD        | place_opt"));
        assert_eq!(r.len(), l.len());
        assert!(r.trim_start_matches(' ').starts_with('|'));
    }

    #[test]
    fn test_long_message_truncated() {
        let long = "x".repeat(200);
        let left: EventIndex = [Event::new(1, EventKind::Freeform(long))].into_iter().collect();
        let layout = CompareLayout::new(&[], &left, &EventIndex::default());
        let msg = layout.message(left.get(1));
        assert_eq!(msg.len(), layout.message_width());
        assert!(msg.ends_with("x ..."));
    }

    #[test]
    fn test_render_empty_logs() {
        let empty = EventIndex::default();
        assert!(render(("a", "b"), &empty, &empty, &[], &[]).is_empty());
    }

    #[test]
    fn test_render_titles_and_rows() {
        let left: EventIndex = [cmd(5, "place_opt")].into_iter().collect();
        let right: EventIndex = [cmd(8, "place_opt")].into_iter().collect();
        let rows = render(
            ("run_a.log", "run_b.log"),
            &left,
            &right,
            &[],
            &[(Some(5), Some(8))],
        );
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("run_a.log "));
        assert!(rows[0].contains(" |run_b.log"));
        assert!(rows[2].contains("place_opt"));
    }

    #[test]
    fn test_column_positions_match_table_order() {
        for (i, column) in ALL_COLUMNS.iter().enumerate() {
            assert_eq!(column.position(), i);
        }
    }
}
