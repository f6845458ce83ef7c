use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use optolog::align::align;
use optolog::collect::{CollectorSet, ProgressHandler};
use optolog::config::Config;
use optolog::index::EventIndex;
use optolog::render::{self, ColumnGroup};
use optolog::store::{LineStore, LARGE_LOG_LINES};

/// Typed event listing and side-by-side comparison of ICC2 logs.
#[derive(Parser)]
#[command(name = "optolog", about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Logging verbosity level (trace, debug, info, warn, error).
    /// Overrides the configuration file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the events found in one log.
    View(ViewArgs),
    /// Align the events of two logs side by side.
    Compare(CompareArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args)]
struct ViewArgs {
    /// Log file to analyze.
    log: PathBuf,

    /// Show tool commands.
    #[arg(long)]
    commands: bool,

    /// Show cell-map initialization.
    #[arg(long)]
    cellmap: bool,

    /// Show clock-tree synthesis steps.
    #[arg(long)]
    clocktree: bool,

    /// Show global-route runs.
    #[arg(long)]
    globalroute: bool,

    /// Show legalizer and placement runs.
    #[arg(long)]
    legalize: bool,

    /// Show DFT wirelength.
    #[arg(long)]
    dft: bool,

    /// Show QoR heartbeats.
    #[arg(long)]
    qor: bool,

    /// Show flow steps, utilization and timer settings.
    #[arg(long)]
    flow: bool,

    /// Show the default set of events.
    #[arg(long)]
    all: bool,

    /// Like --all, with extended heartbeat columns and legalizer runtimes.
    #[arg(long)]
    more: bool,

    /// Also show lines matching this regular expression.
    #[arg(long)]
    regex: Option<String>,
}

impl ViewArgs {
    fn apply(&self, cfg: &mut Config) {
        let c = &mut cfg.collectors;
        c.commands |= self.commands;
        c.cellmap |= self.cellmap;
        c.clocktree |= self.clocktree;
        c.globalroute |= self.globalroute;
        c.legalize |= self.legalize;
        c.dft |= self.dft;
        c.qor |= self.qor;
        c.flow |= self.flow;

        if self.all || self.more {
            *c = CollectorSet {
                cellmap: c.cellmap,
                flow: c.flow,
                regex: c.regex.take(),
                ..CollectorSet::default_bundle()
            };
        }
        if self.more {
            cfg.verbose = true;
        }
        if let Some(pattern) = &self.regex {
            c.regex = Some(pattern.clone());
        }
    }
}

#[derive(Args)]
struct CompareArgs {
    /// First log file.
    log1: PathBuf,

    /// Second log file.
    log2: PathBuf,

    /// Compare setup timing (default).
    #[arg(short, long)]
    setup: bool,

    /// Compare hold timing.
    #[arg(long)]
    hold: bool,

    /// Compare area and instance count.
    #[arg(short, long)]
    area: bool,

    /// Compare max transition and capacitance (default).
    #[arg(short, long)]
    drc: bool,

    /// Compare buffer and inverter counts.
    #[arg(short, long)]
    buf: bool,

    /// Compare leakage and low-Vt usage.
    #[arg(short, long)]
    power: bool,

    /// Compare runtime and peak memory.
    #[arg(short, long)]
    runtime: bool,

    /// Also align lines matching this regular expression.
    #[arg(long)]
    regex: Option<String>,
}

impl CompareArgs {
    fn apply(&self, cfg: &mut Config) {
        let flags = [
            (self.setup, ColumnGroup::Setup),
            (self.hold, ColumnGroup::Hold),
            (self.area, ColumnGroup::Area),
            (self.drc, ColumnGroup::Drc),
            (self.buf, ColumnGroup::Buf),
            (self.power, ColumnGroup::Power),
            (self.runtime, ColumnGroup::Runtime),
        ];
        let groups: Vec<ColumnGroup> = flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, group)| *group)
            .collect();
        if !groups.is_empty() {
            cfg.columns = groups;
        }
        if let Some(pattern) = &self.regex {
            cfg.collectors.regex = Some(pattern.clone());
        }
    }
}

/// Build-time version info, injected via RUSTFLAGS.
mod version {
    /// Release version string (set at build time).
    pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

    /// Git commit hash (set at build time via env, or "unknown").
    pub fn git_commit() -> &'static str {
        option_env!("GIT_COMMIT").unwrap_or("unknown")
    }

    /// Full version string with platform info.
    pub fn full() -> String {
        format!(
            "{} (commit: {}, {}/{})",
            RELEASE,
            git_commit(),
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle version subcommand before anything else.
    if let Command::Version = &cli.command {
        println!("optolog {}", version::full());
        return Ok(());
    }

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    // Initialize tracing.
    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level: {level}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = version::RELEASE, "starting optolog");

    match &cli.command {
        Command::View(args) => {
            args.apply(&mut cfg);
            cfg.validate()?;
            view(&cfg, &args.log)
        }
        Command::Compare(args) => {
            args.apply(&mut cfg);
            cfg.validate()?;
            compare(&cfg, &args.log1, &args.log2)
        }
        Command::Version => Ok(()),
    }
}

fn load_log(path: &Path) -> Result<LineStore> {
    let store =
        LineStore::load(path).with_context(|| format!("loading log {}", path.display()))?;

    info!(file = %path.display(), lines = store.len(), "loaded log");
    if store.len() > LARGE_LOG_LINES {
        warn!(
            lines = store.len(),
            "log has more than {LARGE_LOG_LINES} lines, analysis may be slow"
        );
    }
    info!(banner = %store.banner(), "detected tool banner");

    Ok(store)
}

fn build_index(store: &LineStore, set: &CollectorSet, cfg: &Config) -> Result<EventIndex> {
    if let Some(pattern) = &set.regex {
        info!(pattern = %pattern, "matching custom pattern");
    }

    let progress = if cfg.progress {
        let handler: ProgressHandler = Box::new(|percent: usize| {
            info!(percent, "scanning for custom pattern");
        });
        Some(handler)
    } else {
        None
    };

    let collectors = set
        .build(cfg.verbose, progress)
        .context("preparing collectors")?;

    Ok(EventIndex::build(store, &collectors))
}

fn view(cfg: &Config, path: &Path) -> Result<()> {
    let store = load_log(path)?;
    let set = cfg.collectors.clone().or_default_bundle();
    let index = build_index(&store, &set, cfg)?;

    if index.is_empty() {
        info!("no events found");
        return Ok(());
    }

    println!("{}", render::view_header(set.qor, cfg.verbose));
    for row in render::view_rows(&index, cfg.verbose) {
        println!("{row}");
    }

    Ok(())
}

fn compare(cfg: &Config, log1: &Path, log2: &Path) -> Result<()> {
    let set = CollectorSet {
        regex: cfg.collectors.regex.clone(),
        ..CollectorSet::comparison()
    };

    let left_store = load_log(log1)?;
    let left = build_index(&left_store, &set, cfg)?;
    let right_store = load_log(log2)?;
    let right = build_index(&right_store, &set, cfg)?;

    let pairs = align(&left, &right);

    let names = (log1.display().to_string(), log2.display().to_string());
    let rows = render::compare::render(
        (names.0.as_str(), names.1.as_str()),
        &left,
        &right,
        &cfg.columns,
        &pairs,
    );
    for row in rows {
        println!("{row}");
    }

    Ok(())
}
