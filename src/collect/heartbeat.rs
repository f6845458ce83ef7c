//! QoR heartbeat decoding and derivation.
//!
//! Heartbeats come in three shapes. APS heartbeats are free-text rows
//! printed three lines below an `ELAPSED  WORST NEG TOTAL NEG` header.
//! NPO and NRO heartbeats share a fixed `    *   * ` prefix and are told
//! apart by token count. After decoding, two backward passes fill in
//! what the row itself does not carry: the elapsed time and peak memory
//! from the nearest `ELAPSE:` marker, and a phase name from the enclosing
//! function or stage banners.

use std::sync::OnceLock;

use regex::Regex;

use crate::event::{Category, Event, EventKind, QorEvent, QorField, QorSubtype};
use crate::store::{format_hms, parse_hms, LineStore};

use super::Collector;

/// Header printed above APS heartbeat rows.
pub const APS_HEADER: &str = "ELAPSED  WORST NEG TOTAL NEG";

/// Distance from the APS header to its heartbeat row.
const APS_ROW_OFFSET: usize = 3;

/// Prefix shared by NPO and NRO heartbeat rows.
pub const FIXED_PREFIX: &str = "    *   * ";

const APS_MIN_TOKENS: usize = 11;
const NPO_MIN_TOKENS: usize = 16;
const NRO_MIN_TOKENS: usize = 13;

/// How far back an APS heartbeat looks for its enclosing function.
const APS_NAME_SCAN_LINES: usize = 500;

const APS_FIELDS: [QorField; APS_MIN_TOKENS] = [
    QorField::Elapsed,
    QorField::Wns,
    QorField::Tns,
    QorField::Area,
    QorField::MaxTran,
    QorField::MaxCap,
    QorField::NumBuf,
    QorField::NumInv,
    QorField::NumLvth,
    QorField::PctLvth,
    QorField::PeakMem,
];

const NPO_FIELDS: [QorField; 14] = [
    QorField::Wns,
    QorField::Tns,
    QorField::Nsv,
    QorField::Whv,
    QorField::Thv,
    QorField::Nhv,
    QorField::MaxTranV,
    QorField::MaxTran,
    QorField::MaxCapV,
    QorField::Leakage,
    QorField::Area,
    QorField::NumInst,
    QorField::NumBuf,
    QorField::NumInv,
];

const NRO_FIELDS: [QorField; 11] = [
    QorField::Wns,
    QorField::Tns,
    QorField::Nsv,
    QorField::Whv,
    QorField::Thv,
    QorField::Nhv,
    QorField::MaxTranV,
    QorField::MaxCapV,
    QorField::Leakage,
    QorField::Area,
    QorField::NumInst,
];

/// Stage banners that name NPO and NRO heartbeats.
const STAGE_PREFIXES: &[&str] = &["npo-place-opt", "npo-clock-opt", "Route-opt"];

const APS_DRC_FUNC: &str = "START_FUNC: APS_S_DRC";
const APS_HOLD_FUNC: &str = "START_FUNC: APS_S_HOLD";
const APS_OPT_FUNC: &str = "START_FUNC: psynopt_delay_opto";

fn elapse_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ELAPSE:\s+(\d+) s ").expect("valid elapse regex"))
}

fn mem_peak_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"MEM-PEAK:\s+(\d+) Mb").expect("valid mem regex"))
}

fn stage_iter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ optimization (.*) Iter\s+1").expect("valid stage regex"))
}

/// A decoded heartbeat before it becomes an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heartbeat {
    /// 1-based line of the heartbeat row.
    pub line: usize,
    pub valid: bool,
    pub qor: QorEvent,
}

impl Heartbeat {
    fn new(line: usize, subtype: QorSubtype, raw: &str) -> Self {
        Self {
            line,
            valid: false,
            qor: QorEvent::new(subtype, raw),
        }
    }

    fn fill(&mut self, fields: &[QorField], tokens: &[&str]) {
        for (field, token) in fields.iter().zip(tokens) {
            self.qor.metrics.set(*field, *token);
        }
        self.valid = true;
    }

    pub fn into_event(self) -> Event {
        let mut event = Event::new(self.line, EventKind::Qor(self.qor));
        event.valid = self.valid;
        event
    }
}

/// Decode an APS heartbeat row.
pub fn decode_aps(line_no: usize, text: &str) -> Heartbeat {
    let mut hb = Heartbeat::new(line_no, QorSubtype::Aps, text);
    let mut tokens: Vec<&str> = text.split_whitespace().collect();

    if tokens.first().is_some_and(|t| !t.contains(':')) {
        hb.qor.name = tokens.remove(0).to_string();
    }

    if tokens.len() >= APS_MIN_TOKENS {
        hb.fill(&APS_FIELDS, &tokens);
    }
    if let Some(&whv) = tokens.get(APS_MIN_TOKENS) {
        // Hold violation is printed negated in this column.
        let whv = whv.strip_prefix('-').unwrap_or(whv);
        hb.qor.metrics.set(QorField::Whv, whv);
    }

    hb
}

/// Decode an NPO or NRO heartbeat row. Returns `None` for lines that do
/// not carry the fixed prefix or are too short to be either shape.
pub fn decode_fixed(line_no: usize, text: &str) -> Option<Heartbeat> {
    if !text.starts_with(FIXED_PREFIX) {
        return None;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (subtype, fields) = if tokens.len() >= NPO_MIN_TOKENS {
        (QorSubtype::Npo, &NPO_FIELDS[..])
    } else if tokens.len() >= NRO_MIN_TOKENS {
        (QorSubtype::Nro, &NRO_FIELDS[..])
    } else {
        return None;
    };

    let mut hb = Heartbeat::new(line_no, subtype, text);
    hb.fill(fields, &tokens[2..]);
    Some(hb)
}

/// Fill unknown elapsed times (and peak memory) from the nearest
/// `ELAPSE:` marker between each heartbeat and the one before it.
pub fn backfill_time(store: &LineStore, beats: &mut [Heartbeat]) {
    let mut prev = 0;

    for hb in beats.iter_mut() {
        let line_no = hb.line;
        if hb.qor.metrics.is_unknown(QorField::Elapsed) {
            let marker = store.backward(line_no, prev).find_map(|(_, l)| {
                let secs: u64 = elapse_re().captures(l)?[1].parse().ok()?;
                Some((secs, l))
            });
            if let Some((secs, marker)) = marker {
                hb.qor.metrics.set(QorField::Elapsed, format_hms(secs));
                if hb.qor.metrics.is_unknown(QorField::PeakMem) {
                    if let Some(caps) = mem_peak_re().captures(marker) {
                        hb.qor.metrics.set(QorField::PeakMem, &caps[1]);
                    }
                }
            }
        }
        prev = line_no;
    }
}

/// Seconds between consecutive heartbeats in collection order. The
/// first heartbeat gets its own elapsed time. Unparseable times count
/// as zero.
pub fn compute_deltas(beats: &mut [Heartbeat]) {
    let mut prev_secs = None;

    for hb in beats.iter_mut() {
        let secs = parse_hms(hb.qor.get(QorField::Elapsed)).unwrap_or(0);
        hb.qor.delta_elapsed = match prev_secs {
            None => secs,
            Some(prev) => secs - prev,
        };
        prev_secs = Some(secs);
    }
}

fn is_function_boundary(line: &str) -> bool {
    line.starts_with("START_FUNC: ") || line.starts_with("END_FUNC: ")
}

fn aps_name(store: &LineStore, line_no: usize) -> Option<&'static str> {
    let mut in_opto = false;

    for (_, line) in store.backward(line_no, line_no.saturating_sub(APS_NAME_SCAN_LINES)) {
        if !in_opto {
            if line.starts_with(APS_DRC_FUNC) {
                return Some("DRC");
            } else if line.starts_with(APS_OPT_FUNC) {
                in_opto = true;
            } else if is_function_boundary(line) {
                return None;
            }
        } else if line.starts_with(APS_HOLD_FUNC) {
            return Some("HOLD");
        } else if is_function_boundary(line) {
            return Some("OPT");
        }
    }

    None
}

/// Name carried by a stage banner, if `line` is one.
fn stage_name(line: &str) -> Option<String> {
    for &prefix in STAGE_PREFIXES {
        let Some(rest) = line.strip_prefix(prefix) else {
            continue;
        };
        if rest == " initial QoR" {
            return Some("START".to_string());
        }
        if rest == " final QoR" {
            return Some("END".to_string());
        }
        let caps = stage_iter_re().captures(rest)?;
        let name = caps[1].trim();
        return Some(match name.strip_prefix("Phase ") {
            Some(phase) => format!("Ph.{}", phase.split(' ').next().unwrap_or_default()),
            None => name.to_string(),
        });
    }
    None
}

/// Derive names for heartbeats that do not print one.
pub fn backfill_names(store: &LineStore, beats: &mut [Heartbeat]) {
    for i in 0..beats.len() {
        if !beats[i].qor.name.is_empty() {
            continue;
        }
        let line_no = beats[i].line;
        let subtype = beats[i].qor.subtype;

        let name = match subtype {
            QorSubtype::Aps => aps_name(store, line_no).map(str::to_string),
            QorSubtype::Npo | QorSubtype::Nro => {
                let prev = beats[..i]
                    .iter()
                    .rev()
                    .find(|hb| hb.qor.subtype == subtype)
                    .map_or(0, |hb| hb.line);
                store
                    .backward(line_no, prev)
                    .find_map(|(_, l)| stage_name(l))
            }
        };

        if let Some(name) = name {
            beats[i].qor.name = name;
        }
    }
}

/// Find and decode every heartbeat row, in line order.
pub fn scan(store: &LineStore) -> Vec<Heartbeat> {
    let mut beats = Vec::new();

    for (n, line) in store.iter() {
        if line.trim().starts_with(APS_HEADER) {
            let row = n + APS_ROW_OFFSET;
            if let Some(text) = store.get(row) {
                beats.push(decode_aps(row, text));
            }
        } else if let Some(hb) = decode_fixed(n, line) {
            beats.push(hb);
        }
    }

    beats
}

/// QoR heartbeats with derived timing and names.
pub struct QorCollector;

impl Collector for QorCollector {
    fn name(&self) -> &'static str {
        "qor"
    }

    fn category(&self) -> Category {
        Category::Qor
    }

    fn collect(&self, store: &LineStore) -> Vec<Event> {
        let mut beats = scan(store);
        backfill_time(store, &mut beats);
        compute_deltas(&mut beats);
        backfill_names(store, &mut beats);

        beats.into_iter().map(Heartbeat::into_event).collect()
    }
}
