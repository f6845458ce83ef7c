//! Immutable, 1-based line store for one log.
//!
//! Every collector reads the log through [`LineStore`]. The forward and
//! backward scan helpers clamp their ranges to the lines that exist, so
//! collectors can express "look N lines ahead" or "walk back to the
//! previous event" without bounds arithmetic of their own.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Number of leading lines searched for the tool banner.
const BANNER_SEARCH_LINES: usize = 10;

/// Banner line printed by the tool at startup.
const BANNER: &str = "IC Compiler II (TM)";

/// Reported when no banner is found.
pub const NO_BANNER: &str = "No ICC2 banner";

/// Logs longer than this are flagged as slow to analyze.
pub const LARGE_LOG_LINES: usize = 1_000_000;

/// Errors that can occur while loading a log.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("reading log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered lines of one log. Line numbers are 1-based.
#[derive(Debug, Clone, Default)]
pub struct LineStore {
    lines: Vec<String>,
}

impl LineStore {
    /// Create a store from already-split lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split a whole log text on `\n`, keeping a trailing empty line the
    /// same way the log writer would have left it.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect())
    }

    /// Read a plain-text log from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_text(&text))
    }

    /// Number of lines in the store.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Return line `line_no` (1-based), or `None` when out of range.
    pub fn get(&self, line_no: usize) -> Option<&str> {
        if line_no == 0 {
            return None;
        }
        self.lines.get(line_no - 1).map(String::as_str)
    }

    /// Iterate over every line with its 1-based number.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (i + 1, l.as_str()))
    }

    /// Lines `from..end` (1-based, `end` exclusive) in ascending order,
    /// clamped to the store.
    pub fn forward(&self, from: usize, end: usize) -> impl Iterator<Item = (usize, &str)> {
        let start = from.max(1);
        let end = end.min(self.lines.len() + 1).max(start);
        (start..end).map(move |n| (n, self.lines[n - 1].as_str()))
    }

    /// Lines from `from` down to `stop` (1-based, `stop` exclusive) in
    /// descending order, clamped to the store.
    pub fn backward(&self, from: usize, stop: usize) -> impl Iterator<Item = (usize, &str)> {
        let top = from.min(self.lines.len());
        let bottom = stop.saturating_add(1).max(1);
        (bottom..=top)
            .rev()
            .map(move |n| (n, self.lines[n - 1].as_str()))
    }

    /// Describe the tool banner found near the top of the log.
    pub fn banner(&self) -> String {
        let mut banner = NO_BANNER.to_string();

        for (n, line) in self.forward(1, BANNER_SEARCH_LINES + 1) {
            if line.trim() != BANNER {
                continue;
            }
            banner = BANNER.to_string();
            if let Some(version) = self.get(n + 2).map(str::trim) {
                if version.starts_with("Version") {
                    banner.push(' ');
                    banner.push_str(version);
                }
            }
        }

        banner
    }
}

/// Format a number of seconds as `H:MM:SS`.
pub fn format_hms(seconds: u64) -> String {
    let (mm, ss) = (seconds / 60, seconds % 60);
    let (hh, mm) = (mm / 60, mm % 60);
    format!("{hh}:{mm:02}:{ss:02}")
}

/// Parse an `H:MM:SS` string back into seconds. Anything else, including
/// values too large for an `i64`, yields `None`.
pub fn parse_hms(text: &str) -> Option<i64> {
    if text.starts_with('-') {
        return None;
    }
    let mut parts = text.split(':');
    let (hh, mm, ss) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let hh: i64 = hh.parse().ok()?;
    let mm: i64 = mm.parse().ok()?;
    let ss: i64 = ss.parse().ok()?;
    hh.checked_mul(3600)?
        .checked_add(mm.checked_mul(60)?)?
        .checked_add(ss)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(lines: &[&str]) -> LineStore {
        LineStore::new(lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_get_is_one_based() {
        let s = store(&["a", "b", "c"]);
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(1), Some("a"));
        assert_eq!(s.get(3), Some("c"));
        assert_eq!(s.get(4), None);
    }

    #[test]
    fn test_forward_clamps_to_store() {
        let s = store(&["a", "b", "c"]);
        let got: Vec<usize> = s.forward(0, 100).map(|(n, _)| n).collect();
        assert_eq!(got, vec![1, 2, 3]);

        let got: Vec<usize> = s.forward(2, 3).map(|(n, _)| n).collect();
        assert_eq!(got, vec![2]);

        assert_eq!(s.forward(5, 10).count(), 0);
        assert_eq!(s.forward(3, 2).count(), 0);
    }

    #[test]
    fn test_backward_clamps_and_excludes_stop() {
        let s = store(&["a", "b", "c", "d"]);
        let got: Vec<usize> = s.backward(10, 1).map(|(n, _)| n).collect();
        assert_eq!(got, vec![4, 3, 2]);

        let got: Vec<usize> = s.backward(3, 0).map(|(n, _)| n).collect();
        assert_eq!(got, vec![3, 2, 1]);

        assert_eq!(s.backward(2, 2).count(), 0);
        assert_eq!(s.backward(0, 0).count(), 0);
    }

    #[test]
    fn test_from_text_strips_carriage_returns() {
        let s = LineStore::from_text("one\r\ntwo\n");
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(1), Some("one"));
        assert_eq!(s.get(3), Some(""));
    }

    #[test]
    fn test_banner_with_version() {
        let s = store(&[
            "",
            "                IC Compiler II (TM)",
            "",
            "    Version R-2020.09 for linux64",
        ]);
        assert_eq!(s.banner(), "IC Compiler II (TM) Version R-2020.09 for linux64");
    }

    #[test]
    fn test_banner_missing() {
        let s = store(&["hello", "world"]);
        assert_eq!(s.banner(), NO_BANNER);
    }

    #[test]
    fn test_hms_round_trip_values() {
        assert_eq!(format_hms(0), "0:00:00");
        assert_eq!(format_hms(3725), "1:02:05");
        assert_eq!(parse_hms("1:02:05"), Some(3725));
        assert_eq!(parse_hms("--"), None);
        assert_eq!(parse_hms("-0:00:05"), None);
        assert_eq!(parse_hms("12:30"), None);
    }

    #[test]
    fn test_parse_hms_rejects_overflow() {
        assert_eq!(parse_hms("9223372036854775807:00:00"), None);
        assert_eq!(parse_hms("0:9223372036854775807:00"), None);
        assert_eq!(parse_hms("2562047788015215:00:07"), Some(2562047788015215 * 3600 + 7));
    }
}
