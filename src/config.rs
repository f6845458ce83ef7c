use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::collect::CollectorSet;
use crate::render::ColumnGroup;

/// Top-level configuration for a log analysis run.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Logging verbosity (debug, info, warn, error). Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Collectors to run over each log. When none of the default bundle
    /// is enabled the whole bundle runs.
    #[serde(default)]
    pub collectors: CollectorSet,

    /// Extended heartbeat columns and legalizer runtimes.
    #[serde(default)]
    pub verbose: bool,

    /// Heartbeat column groups shown when comparing. Default: setup, drc.
    #[serde(default)]
    pub columns: Vec<ColumnGroup>,

    /// Report progress while scanning for a free-form pattern. Default: true.
    #[serde(default = "default_true")]
    pub progress: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            collectors: CollectorSet::default(),
            verbose: false,
            columns: Vec::new(),
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate the configuration for consistency.
    pub fn validate(&self) -> Result<()> {
        if let Some(pattern) = &self.collectors.regex {
            if let Err(e) = Regex::new(pattern) {
                bail!("collectors.regex {pattern:?} is not a valid pattern: {e}");
            }
        }

        let mut seen = HashSet::new();
        for group in &self.columns {
            if !seen.insert(*group) {
                bail!("column group appears more than once: {group}");
            }
        }

        Ok(())
    }
}
