// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::notice::{Event, EventSet};
use crate::scan::PatternSet;
use crate::types::ScannerKind;

/// Raw configuration as read from a TOML file, before validation.
///
/// ```toml
/// [monitor]
/// interval = "2s"
/// cooldown = "100s"
/// buffer_length = 1000
/// events = ["create", "update", "remove"]
///
/// [scan]
/// root = "/mnt/share/logs"
/// scanner = "path"
/// include = ['\.log$']
/// exclude = ["archive/**"]
/// detect_renames = false
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Cadence and delivery settings from `[monitor]`.
    #[serde(default)]
    pub monitor: MonitorSection,

    /// What to scan and how, from `[scan]`.
    #[serde(default)]
    pub scan: ScanSection,
}

/// `[monitor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    /// Time between the end of one scan and the start of the next.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Fixed wait after a failed scan before retrying.
    #[serde(default = "default_cooldown")]
    pub cooldown: String,

    /// Capacity of the notice buffer between the scan worker and the
    /// dispatcher. A full buffer stalls the worker.
    #[serde(default = "default_buffer_length")]
    pub buffer_length: usize,

    /// Event kinds delivered to subscribers.
    #[serde(default = "default_events")]
    pub events: Vec<Event>,
}

fn default_interval() -> String {
    "2s".to_string()
}

fn default_cooldown() -> String {
    "100s".to_string()
}

fn default_buffer_length() -> usize {
    1000
}

fn default_events() -> Vec<Event> {
    Event::ALL.to_vec()
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            cooldown: default_cooldown(),
            buffer_length: default_buffer_length(),
            events: default_events(),
        }
    }
}

/// `[scan]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSection {
    /// Resource locator: the directory to walk, or the listing file for
    /// `scanner = "listing"`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default)]
    pub scanner: ScannerKind,

    /// Regexes matched against item identities. Empty means everything.
    #[serde(default)]
    pub include: Vec<String>,

    /// Globs that drop matching identities.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Hash file contents so that moves are reported as renames.
    #[serde(default)]
    pub detect_renames: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            scanner: ScannerKind::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            detect_renames: false,
        }
    }
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)` (see `config::validate`), which
/// parses durations and compiles the pattern set exactly once.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub monitor: MonitorSection,
    pub scan: ScanSection,
    interval: Duration,
    cooldown: Duration,
    patterns: PatternSet,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        monitor: MonitorSection,
        scan: ScanSection,
        interval: Duration,
        cooldown: Duration,
        patterns: PatternSet,
    ) -> Self {
        Self {
            monitor,
            scan,
            interval,
            cooldown,
            patterns,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn events(&self) -> EventSet {
        self.monitor.events.iter().copied().collect()
    }
}
