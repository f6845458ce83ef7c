//! Payloads for every category except QoR heartbeats.

use crate::store::format_hms;

use super::UNKNOWN;

/// Setup and hold totals taken from a `report_qor -summary` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingSummary {
    pub wns: String,
    pub tns: String,
    pub nsv: String,
    pub whs: String,
    pub ths: String,
    pub nhv: String,
}

/// A tool command invocation, a QoR summary table, or a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub name: String,
    pub summary: Option<TimingSummary>,
}

impl CommandEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: None,
        }
    }

    /// Plain commands without extra detail can be folded when repeated.
    pub fn is_simple(&self) -> bool {
        self.summary.is_none()
    }

    pub fn describe(&self, repeat_count: u32) -> String {
        match &self.summary {
            Some(s) => format!(
                "{} {{WNS = {}, TNS = {}, NSV = {}, WHS = {}, THS = {}, NHV = {}}}",
                self.name, s.wns, s.tns, s.nsv, s.whs, s.ths, s.nhv
            ),
            None if repeat_count > 1 => {
                format!("{} (repeated {} times)", self.name, repeat_count)
            }
            None => self.name.clone(),
        }
    }

    pub fn compact(&self) -> Option<String> {
        self.summary.as_ref().map(|s| {
            format!(
                "{} {{S: {}, {}, {}; H: {}, {}, {}}}",
                self.name, s.wns, s.tns, s.nsv, s.whs, s.ths, s.nhv
            )
        })
    }
}

/// Cell-map initialization entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMapStep {
    InitInstances,
    InitInstancesLegal,
}

impl CellMapStep {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitInstances => "initInstances",
            Self::InitInstancesLegal => "initInstancesLegal",
        }
    }
}

/// Which concurrent-useful-skew QoR snapshot a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CusStage {
    Initial,
    Estimated,
}

impl CusStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Estimated => "estimated",
        }
    }
}

/// Clock-tree synthesis and concurrent clock/data optimization steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockTreeEvent {
    Step(String),
    Ccd,
    Cus {
        stage: CusStage,
        wns: String,
        tns: String,
        whs: String,
        ths: String,
    },
    CusNotice(String),
}

impl ClockTreeEvent {
    pub fn describe(&self) -> String {
        match self {
            Self::Step(step) => step.clone(),
            Self::Ccd => "CCD".to_string(),
            Self::Cus {
                stage,
                wns,
                tns,
                whs,
                ths,
            } => format!(
                "CUS {{{} wns {}, tns {}, whs {}, ths {}}}",
                stage.as_str(),
                wns,
                tns,
                whs,
                ths
            ),
            Self::CusNotice(text) => text.clone(),
        }
    }
}

/// One step of a global-route run, in log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePhase {
    /// Global route phase with its phase number.
    GlobalRoute(u32),
    TrackAssign,
    /// Detail route iteration number.
    DetailRoute(u32),
    /// Overflowing GRC percentage reported after a GR phase.
    Congestion(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PhaseKind {
    None,
    GlobalRoute,
    TrackAssign,
    DetailRoute,
}

/// A global-route run and the phases it went through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalRouteEvent {
    pub phases: Vec<RoutePhase>,
}

impl GlobalRouteEvent {
    pub fn describe(&self) -> String {
        format!("GR{}", self.phase_strings().0)
    }

    pub fn describe_compact(&self) -> String {
        format!("GR{}", self.phase_strings().1)
    }

    /// Compose the verbose and compact phase strings.
    ///
    /// Consecutive DR iterations collapse into a `[first-last]` range and
    /// the GRC percentages following a GR phase are listed in braces.
    pub fn phase_strings(&self) -> (String, String) {
        let phases = &self.phases;
        let mut verbose = String::new();
        let mut compact = String::new();
        let mut prev = PhaseKind::None;
        let mut i = 0;

        while i < phases.len() {
            match &phases[i] {
                RoutePhase::GlobalRoute(phase) => {
                    i += 1;
                    if prev != PhaseKind::GlobalRoute {
                        verbose.push_str(" : GR");
                        compact.push_str(" : GR");
                    }
                    verbose.push_str(&format!(" [{phase}]"));
                    compact.push_str(&format!(" [{phase}]"));

                    let mut grcs = Vec::new();
                    while let Some(RoutePhase::Congestion(pct)) = phases.get(i) {
                        grcs.push(format!("{pct}%"));
                        i += 1;
                    }
                    if let Some(first) = grcs.first() {
                        verbose.push_str(&format!(" GRC={{{}}}", grcs.join(" ")));
                        compact.push_str(&format!(" {first}"));
                    }
                    prev = PhaseKind::GlobalRoute;
                }
                RoutePhase::TrackAssign => {
                    i += 1;
                    verbose.push_str(" : TA");
                    compact.push_str(" : TA");
                    prev = PhaseKind::TrackAssign;
                }
                RoutePhase::DetailRoute(first) => {
                    i += 1;
                    let mut text = String::new();
                    if prev != PhaseKind::DetailRoute {
                        text.push_str(" : DR");
                    }
                    let mut last = *first;
                    while let Some(RoutePhase::DetailRoute(next)) = phases.get(i) {
                        if last.checked_add(1) != Some(*next) {
                            break;
                        }
                        last = *next;
                        i += 1;
                    }
                    if last > *first {
                        text.push_str(&format!(" [{first}-{last}]"));
                    } else {
                        text.push_str(&format!(" [{first}]"));
                    }
                    verbose.push_str(&text);
                    compact.push_str(&text);
                    prev = PhaseKind::DetailRoute;
                }
                RoutePhase::Congestion(_) => i += 1,
            }
        }

        (verbose, compact)
    }
}

/// How long a legalizer run took, from its enclosing function markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalizeRuntime {
    /// Both markers found: elapsed seconds between them.
    Elapsed(u64),
    /// Only the start marker found: its elapsed-time stamp.
    BeginAt(u64),
    /// Only the end marker found: its elapsed-time stamp.
    EndAt(u64),
}

/// Displacement statistics reported by one legalizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalizeStats {
    pub moved: String,
    pub total: String,
    pub avg: String,
    pub max: String,
    pub large: String,
    pub runtime: Option<LegalizeRuntime>,
}

impl Default for LegalizeStats {
    fn default() -> Self {
        Self {
            moved: UNKNOWN.to_string(),
            total: UNKNOWN.to_string(),
            avg: UNKNOWN.to_string(),
            max: UNKNOWN.to_string(),
            large: UNKNOWN.to_string(),
            runtime: None,
        }
    }
}

impl LegalizeStats {
    /// Percentage of moved cells, three decimals.
    pub fn moved_pct(&self) -> String {
        match (self.moved.parse::<u64>(), self.total.parse::<u64>()) {
            (Ok(moved), Ok(total)) if total != 0 => {
                format!("{:.3}", 100.0 * moved as f64 / total as f64)
            }
            _ => UNKNOWN.to_string(),
        }
    }
}

/// Legalization and placement progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegalizeEvent {
    Legalize(LegalizeStats),
    Place { coarse_pct: String },
}

impl LegalizeEvent {
    pub fn describe(&self) -> String {
        match self {
            Self::Legalize(stats) => {
                let mut msg = String::from("LGL");
                if stats.moved != UNKNOWN {
                    msg.push_str(&format!(
                        " : moved {}/{} {}% cells, avg {}, max {}, large {}",
                        stats.moved,
                        stats.total,
                        stats.moved_pct(),
                        stats.avg,
                        stats.max,
                        stats.large
                    ));
                }
                match stats.runtime {
                    Some(LegalizeRuntime::Elapsed(secs)) => {
                        msg.push_str(&format!(" : runtime {secs} s"));
                    }
                    Some(LegalizeRuntime::BeginAt(secs)) => {
                        msg.push_str(&format!(" : begin {}", format_hms(secs)));
                    }
                    Some(LegalizeRuntime::EndAt(secs)) => {
                        msg.push_str(&format!(" : end {}", format_hms(secs)));
                    }
                    None => {}
                }
                msg
            }
            Self::Place { coarse_pct } if coarse_pct != UNKNOWN => {
                format!("PLACE : {coarse_pct}% - 100%")
            }
            Self::Place { .. } => "PLACE".to_string(),
        }
    }
}

/// Scan-chain wirelength before and after DFT optimization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DftEvent {
    pub pre_opt: String,
    pub post_opt: String,
}

impl DftEvent {
    pub fn describe(&self) -> String {
        format!("DFT : wirelength {} -> {}", self.pre_opt, self.post_opt)
    }
}

/// Named timer settings reported in a `Timer Settings:` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSetting {
    DelayCalculation,
    SignalIntegrity,
    TimingWindow,
    AdvancedWaveform,
    Variation,
    Crpr,
    ReceiverModel,
}

impl TimerSetting {
    /// All settings in the order they are reported.
    pub fn all() -> &'static [Self] {
        &[
            Self::DelayCalculation,
            Self::SignalIntegrity,
            Self::TimingWindow,
            Self::AdvancedWaveform,
            Self::Variation,
            Self::Crpr,
            Self::ReceiverModel,
        ]
    }

    /// Line prefix introducing this setting.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::DelayCalculation => "Delay Calculation Style: ",
            Self::SignalIntegrity => "Signal Integrity Analysis: ",
            Self::TimingWindow => "Timing Window Analysis: ",
            Self::AdvancedWaveform => "Advanced Waveform Propagation:",
            Self::Variation => "Variation Type: ",
            Self::Crpr => "Clock Reconvergence Pessimism Removal: ",
            Self::ReceiverModel => "Advanced Receiver Model: ",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DelayCalculation => "delay",
            Self::SignalIntegrity => "SI",
            Self::TimingWindow => "TW",
            Self::AdvancedWaveform => "AWP",
            Self::Variation => "variation",
            Self::Crpr => "CRPR",
            Self::ReceiverModel => "CCS-RCV",
        }
    }
}

/// Flow milestones: optimization steps, utilization, timer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    Step(&'static str),
    Utilization { raw: String, effective: String },
    TimerSettings(Vec<(TimerSetting, String)>),
}

impl FlowEvent {
    pub fn describe(&self) -> String {
        match self {
            Self::Step(step) => step.to_string(),
            Self::Utilization { raw, effective } => {
                format!("utilization: raw = {raw}, effective = {effective}")
            }
            Self::TimerSettings(settings) => {
                let parts: Vec<String> = settings
                    .iter()
                    .map(|(setting, value)| format!("{} = {}", setting.label(), value))
                    .collect();
                timer_line(&parts)
            }
        }
    }

    pub fn describe_compact(&self) -> String {
        match self {
            Self::TimerSettings(settings) => {
                let parts: Vec<String> = settings.iter().map(|(_, v)| v.clone()).collect();
                timer_line(&parts)
            }
            _ => self.describe(),
        }
    }
}

fn timer_line(parts: &[String]) -> String {
    if parts.is_empty() {
        "timer settings:".to_string()
    } else {
        format!("timer settings: {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_phase_compaction() {
        let gr = GlobalRouteEvent {
            phases: vec![
                RoutePhase::GlobalRoute(1),
                RoutePhase::Congestion("50".into()),
                RoutePhase::Congestion("80".into()),
                RoutePhase::DetailRoute(1),
                RoutePhase::DetailRoute(2),
                RoutePhase::DetailRoute(3),
            ],
        };
        let (verbose, compact) = gr.phase_strings();
        assert_eq!(verbose, " : GR [1] GRC={50% 80%} : DR [1-3]");
        assert_eq!(compact, " : GR [1] 50% : DR [1-3]");
        assert_eq!(gr.describe(), "GR : GR [1] GRC={50% 80%} : DR [1-3]");
    }

    #[test]
    fn test_route_phase_breaks_on_gap_and_merges_gr() {
        let gr = GlobalRouteEvent {
            phases: vec![
                RoutePhase::GlobalRoute(0),
                RoutePhase::GlobalRoute(1),
                RoutePhase::Congestion("1.5".into()),
                RoutePhase::TrackAssign,
                RoutePhase::DetailRoute(1),
                RoutePhase::DetailRoute(2),
                RoutePhase::DetailRoute(5),
            ],
        };
        let (verbose, _) = gr.phase_strings();
        assert_eq!(verbose, " : GR [0] [1] GRC={1.5%} : TA : DR [1-2] [5]");
    }

    #[test]
    fn test_route_without_phases() {
        let gr = GlobalRouteEvent::default();
        assert_eq!(gr.describe(), "GR");
        assert_eq!(gr.describe_compact(), "GR");
    }

    #[test]
    fn test_legalize_describe() {
        let stats = LegalizeStats {
            moved: "25".into(),
            total: "1000".into(),
            avg: "0.12".into(),
            max: "3.4".into(),
            large: "0".into(),
            runtime: Some(LegalizeRuntime::Elapsed(42)),
        };
        assert_eq!(
            LegalizeEvent::Legalize(stats).describe(),
            "LGL : moved 25/1000 2.500% cells, avg 0.12, max 3.4, large 0 : runtime 42 s"
        );

        let begin_only = LegalizeStats {
            runtime: Some(LegalizeRuntime::BeginAt(3725)),
            ..Default::default()
        };
        assert_eq!(
            LegalizeEvent::Legalize(begin_only).describe(),
            "LGL : begin 1:02:05"
        );
    }

    #[test]
    fn test_moved_pct_unknown_on_zero_total() {
        let stats = LegalizeStats {
            moved: "3".into(),
            total: "0".into(),
            ..Default::default()
        };
        assert_eq!(stats.moved_pct(), UNKNOWN);
    }

    #[test]
    fn test_summary_command_strings() {
        let cmd = CommandEvent {
            name: "report_qor -summary".into(),
            summary: Some(TimingSummary {
                wns: "-0.10".into(),
                tns: "-5.00".into(),
                nsv: "12".into(),
                whs: "-0.01".into(),
                ths: "-0.20".into(),
                nhv: "4".into(),
            }),
        };
        assert!(!cmd.is_simple());
        assert_eq!(
            cmd.describe(1),
            "report_qor -summary {WNS = -0.10, TNS = -5.00, NSV = 12, WHS = -0.01, THS = -0.20, NHV = 4}"
        );
        assert_eq!(
            cmd.compact().unwrap(),
            "report_qor -summary {S: -0.10, -5.00, 12; H: -0.01, -0.20, 4}"
        );
    }

    #[test]
    fn test_timer_settings_forms() {
        let flow = FlowEvent::TimerSettings(vec![
            (TimerSetting::DelayCalculation, "elmore".into()),
            (TimerSetting::SignalIntegrity, "disabled".into()),
        ]);
        assert_eq!(
            flow.describe(),
            "timer settings: delay = elmore, SI = disabled"
        );
        assert_eq!(flow.describe_compact(), "timer settings: elmore, disabled");
    }
}
