//! QoR heartbeat payload and its fixed-width row layout.

use std::fmt;

use super::UNKNOWN;

/// Heartbeat line shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QorSubtype {
    /// Free-text heartbeat printed under an `ELAPSED  WORST NEG TOTAL NEG` header.
    Aps,
    /// Fixed-prefix heartbeat with buffer and inverter counts.
    Npo,
    /// Fixed-prefix heartbeat without buffer and inverter counts.
    Nro,
}

impl QorSubtype {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aps => "APS",
            Self::Npo => "NPO",
            Self::Nro => "NRO",
        }
    }
}

impl fmt::Display for QorSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named metric carried by a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QorField {
    Elapsed = 0,
    Wns = 1,
    Tns = 2,
    Nsv = 3,
    Whv = 4,
    Thv = 5,
    Nhv = 6,
    MaxTran = 7,
    MaxTranV = 8,
    MaxCap = 9,
    MaxCapV = 10,
    Area = 11,
    NumInst = 12,
    NumBuf = 13,
    NumInv = 14,
    NumLvth = 15,
    PctLvth = 16,
    Leakage = 17,
    PeakMem = 18,
}

/// Number of QorField variants, used for array sizing.
pub const QOR_FIELD_COUNT: usize = 19;

impl QorField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Elapsed => "elapsed",
            Self::Wns => "wns",
            Self::Tns => "tns",
            Self::Nsv => "nsv",
            Self::Whv => "whv",
            Self::Thv => "thv",
            Self::Nhv => "nhv",
            Self::MaxTran => "max_tran",
            Self::MaxTranV => "max_tran_v",
            Self::MaxCap => "max_cap",
            Self::MaxCapV => "max_cap_v",
            Self::Area => "area",
            Self::NumInst => "num_inst",
            Self::NumBuf => "num_buf",
            Self::NumInv => "num_inv",
            Self::NumLvth => "num_lvth",
            Self::PctLvth => "pct_lvth",
            Self::Leakage => "leakage",
            Self::PeakMem => "peak_mem",
        }
    }
}

/// Heartbeat metrics keyed by [`QorField`]. Every field is always
/// present and starts out as [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QorMetrics {
    values: [String; QOR_FIELD_COUNT],
}

impl Default for QorMetrics {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|_| UNKNOWN.to_string()),
        }
    }
}

impl QorMetrics {
    pub fn get(&self, field: QorField) -> &str {
        &self.values[field as usize]
    }

    pub fn set(&mut self, field: QorField, value: impl Into<String>) {
        self.values[field as usize] = value.into();
    }

    pub fn is_unknown(&self, field: QorField) -> bool {
        self.get(field) == UNKNOWN
    }
}

/// One column of the single-log heartbeat table.
#[derive(Debug, Clone, Copy)]
enum RowColumn {
    Field(QorField),
    DeltaElapsed,
}

const COMPACT_ROW: &[(RowColumn, &str, usize)] = &[
    (RowColumn::Field(QorField::Elapsed), "Elapsed", 9),
    (RowColumn::Field(QorField::Wns), "WNS", 10),
    (RowColumn::Field(QorField::Tns), "TNS", 10),
    (RowColumn::Field(QorField::Area), "Area", 12),
    (RowColumn::Field(QorField::NumBuf), "BufCnt", 10),
    (RowColumn::Field(QorField::NumInv), "InvCnt", 10),
    (RowColumn::Field(QorField::MaxTran), "MaxTran", 10),
    (RowColumn::Field(QorField::MaxCap), "MaxCap", 10),
    (RowColumn::DeltaElapsed, "DltElps", 7),
    (RowColumn::Field(QorField::PeakMem), "PeakMem", 7),
];

const VERBOSE_ROW: &[(RowColumn, &str, usize)] = &[
    (RowColumn::Field(QorField::Elapsed), "Elapsed", 9),
    (RowColumn::Field(QorField::Wns), "WNS", 10),
    (RowColumn::Field(QorField::Tns), "TNS", 10),
    (RowColumn::Field(QorField::Nsv), "NSV", 10),
    (RowColumn::Field(QorField::Whv), "WHV", 10),
    (RowColumn::Field(QorField::Thv), "THV", 10),
    (RowColumn::Field(QorField::Nhv), "NHV", 10),
    (RowColumn::Field(QorField::Area), "Area", 12),
    (RowColumn::Field(QorField::NumBuf), "BufCnt", 10),
    (RowColumn::Field(QorField::NumInv), "InvCnt", 10),
    (RowColumn::Field(QorField::NumInst), "InstCnt", 10),
    (RowColumn::Field(QorField::MaxTran), "MaxTran", 10),
    (RowColumn::Field(QorField::MaxTranV), "MTranV", 7),
    (RowColumn::Field(QorField::MaxCap), "MaxCap", 10),
    (RowColumn::Field(QorField::MaxCapV), "MCapV", 7),
    (RowColumn::Field(QorField::Leakage), "Leakage", 11),
    (RowColumn::Field(QorField::NumLvth), "NumLvth", 8),
    (RowColumn::Field(QorField::PctLvth), "%Lvth", 7),
    (RowColumn::DeltaElapsed, "DltElps", 7),
];

fn row_layout(verbose: bool) -> &'static [(RowColumn, &'static str, usize)] {
    if verbose {
        VERBOSE_ROW
    } else {
        COMPACT_ROW
    }
}

/// A decoded QoR heartbeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QorEvent {
    pub subtype: QorSubtype,
    /// Phase name, either printed on the heartbeat or derived from context.
    pub name: String,
    /// Source line, shown as-is when decoding failed.
    pub raw: String,
    pub metrics: QorMetrics,
    /// Seconds since the previous heartbeat. May be negative.
    pub delta_elapsed: i64,
}

impl QorEvent {
    pub fn new(subtype: QorSubtype, raw: impl Into<String>) -> Self {
        Self {
            subtype,
            name: String::new(),
            raw: raw.into(),
            metrics: QorMetrics::default(),
            delta_elapsed: 0,
        }
    }

    pub fn get(&self, field: QorField) -> &str {
        self.metrics.get(field)
    }

    /// `<subtype> <name>`, cut to the tag column width.
    pub fn tag(&self) -> String {
        let tag = format!("{} {}", self.subtype, self.name);
        tag.chars().take(10).collect::<String>().trim_end().to_string()
    }

    /// Delta elapsed with its unit, as shown in tables.
    pub fn delta_text(&self) -> String {
        format!("{}s", self.delta_elapsed)
    }

    /// Column header matching [`QorEvent::row`].
    pub fn header(verbose: bool) -> String {
        let cells: Vec<String> = row_layout(verbose)
            .iter()
            .map(|(_, label, width)| format!("{label:>width$}"))
            .collect();
        cells.join(" ")
    }

    /// Fixed-width metric row.
    pub fn row(&self, verbose: bool) -> String {
        let cells: Vec<String> = row_layout(verbose)
            .iter()
            .map(|(column, _, width)| {
                let value = match column {
                    RowColumn::Field(field) => self.get(*field).to_string(),
                    RowColumn::DeltaElapsed => self.delta_text(),
                };
                format!("{value:>width$}")
            })
            .collect();
        cells.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_default_to_unknown() {
        let metrics = QorMetrics::default();
        assert_eq!(metrics.get(QorField::Wns), UNKNOWN);
        assert!(metrics.is_unknown(QorField::PeakMem));
    }

    #[test]
    fn test_tag_truncates_to_ten_chars() {
        let mut qor = QorEvent::new(QorSubtype::Npo, "");
        qor.name = "Ph.12345678".into();
        assert_eq!(qor.tag(), "NPO Ph.123");
        qor.name = "END".into();
        assert_eq!(qor.tag(), "NPO END");
    }

    #[test]
    fn test_header_widths_match_rows() {
        let mut qor = QorEvent::new(QorSubtype::Aps, "");
        qor.metrics.set(QorField::Wns, "-0.123");
        qor.delta_elapsed = -4;
        for verbose in [false, true] {
            assert_eq!(QorEvent::header(verbose).len(), qor.row(verbose).len());
        }
        assert!(qor.row(false).contains("    -0.123"));
        assert!(qor.row(false).contains("    -4s"));
    }

    #[test]
    fn test_header_labels() {
        let compact = QorEvent::header(false);
        assert!(compact.trim_start().starts_with("Elapsed"));
        assert!(compact.ends_with("PeakMem"));
        assert_eq!(compact.split_whitespace().count(), 10);
        assert_eq!(QorEvent::header(true).split_whitespace().count(), 19);
    }
}
