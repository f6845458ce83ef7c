pub mod kinds;
pub mod qor;

use std::fmt;

pub use self::kinds::{
    CellMapStep, ClockTreeEvent, CommandEvent, CusStage, DftEvent, FlowEvent, GlobalRouteEvent,
    LegalizeEvent, LegalizeRuntime, LegalizeStats, RoutePhase, TimerSetting, TimingSummary,
};
pub use self::qor::{QorEvent, QorField, QorMetrics, QorSubtype};

/// Placeholder for a field the log did not provide.
pub const UNKNOWN: &str = "--";

/// Category identifies which collector produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Command,
    CellMap,
    ClockTree,
    GlobalRoute,
    Legalize,
    Dft,
    Flow,
    Qor,
    Freeform,
}

impl Category {
    /// Returns the canonical category name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "COMMAND",
            Self::CellMap => "CELLMAP",
            Self::ClockTree => "CLOCKTREE",
            Self::GlobalRoute => "GLOBALROUTE",
            Self::Legalize => "LEGALIZE",
            Self::Dft => "DFT",
            Self::Flow => "FLOW",
            Self::Qor => "QOR",
            Self::Freeform => "FREEFORM",
        }
    }

    /// Short tag shown in the tag column of rendered rows.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Command => "CMD",
            Self::CellMap => "CMAP",
            Self::ClockTree => "CTS",
            Self::GlobalRoute => "GR",
            Self::Legalize => "LGL",
            Self::Dft => "DFT",
            Self::Flow => "FLOW",
            Self::Qor => "QOR",
            Self::Freeform => "REGEX",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Command(CommandEvent),
    CellMap(CellMapStep),
    ClockTree(ClockTreeEvent),
    GlobalRoute(GlobalRouteEvent),
    Legalize(LegalizeEvent),
    Dft(DftEvent),
    Flow(FlowEvent),
    Qor(QorEvent),
    Freeform(String),
}

/// One typed event extracted from a log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// 1-based line number in the source log.
    pub line: usize,
    /// False when the line was recognized but its fields could not be decoded.
    pub valid: bool,
    /// Number of identical consecutive events folded into this one.
    pub repeat_count: u32,
    pub kind: EventKind,
}

impl Event {
    pub fn new(line: usize, kind: EventKind) -> Self {
        Self {
            line,
            valid: true,
            repeat_count: 1,
            kind,
        }
    }

    pub fn category(&self) -> Category {
        match &self.kind {
            EventKind::Command(_) => Category::Command,
            EventKind::CellMap(_) => Category::CellMap,
            EventKind::ClockTree(_) => Category::ClockTree,
            EventKind::GlobalRoute(_) => Category::GlobalRoute,
            EventKind::Legalize(_) => Category::Legalize,
            EventKind::Dft(_) => Category::Dft,
            EventKind::Flow(_) => Category::Flow,
            EventKind::Qor(_) => Category::Qor,
            EventKind::Freeform(_) => Category::Freeform,
        }
    }

    /// Category-specific subtype: the command name, the heartbeat shape,
    /// or the category tag for categories without subtypes.
    pub fn subtype(&self) -> &str {
        match &self.kind {
            EventKind::Command(cmd) => &cmd.name,
            EventKind::Legalize(LegalizeEvent::Legalize(_)) => "LGL",
            EventKind::Legalize(LegalizeEvent::Place { .. }) => "PLACE",
            EventKind::Qor(qor) => qor.subtype.as_str(),
            _ => self.category().tag(),
        }
    }

    /// Tag column text. Heartbeats show their shape and phase name.
    pub fn tag(&self) -> String {
        match &self.kind {
            EventKind::Qor(qor) => qor.tag(),
            _ => self.category().tag().to_string(),
        }
    }

    /// Full human-readable message.
    pub fn describe(&self, verbose: bool) -> String {
        match &self.kind {
            EventKind::Command(cmd) => cmd.describe(self.repeat_count),
            EventKind::CellMap(step) => step.as_str().to_string(),
            EventKind::ClockTree(cts) => cts.describe(),
            EventKind::GlobalRoute(gr) => gr.describe(),
            EventKind::Legalize(lgl) => lgl.describe(),
            EventKind::Dft(dft) => dft.describe(),
            EventKind::Flow(flow) => flow.describe(),
            EventKind::Qor(qor) => {
                if self.valid {
                    qor.row(verbose)
                } else {
                    qor.raw.trim().to_string()
                }
            }
            EventKind::Freeform(text) => text.clone(),
        }
    }

    /// Shorter message used where horizontal space is limited.
    pub fn describe_compact(&self, verbose: bool) -> String {
        match &self.kind {
            EventKind::Command(cmd) => cmd
                .compact()
                .unwrap_or_else(|| cmd.describe(self.repeat_count)),
            EventKind::GlobalRoute(gr) => gr.describe_compact(),
            EventKind::Flow(flow) => flow.describe_compact(),
            _ => self.describe(verbose),
        }
    }

    /// First space-delimited token of the full message.
    pub fn headline(&self) -> String {
        let text = self.describe(false);
        text.split(' ').next().unwrap_or_default().to_string()
    }

    pub fn as_qor(&self) -> Option<&QorEvent> {
        match &self.kind {
            EventKind::Qor(qor) => Some(qor),
            _ => None,
        }
    }
}
