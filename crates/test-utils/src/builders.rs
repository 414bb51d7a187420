#![allow(dead_code)]

use std::path::Path;

use pollwatch::config::{ConfigFile, RawConfigFile};
use pollwatch::errors::Result;
use pollwatch::notice::Event;
use pollwatch::types::ScannerKind;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with a fast interval so tests do not
/// sit in timers.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.monitor.interval = "10ms".to_string();
        Self { config }
    }

    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.scan.root = root.as_ref().to_path_buf();
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.scan.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.scan.exclude.push(pattern.to_string());
        self
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.config.monitor.interval = interval.to_string();
        self
    }

    pub fn cooldown(mut self, cooldown: &str) -> Self {
        self.config.monitor.cooldown = cooldown.to_string();
        self
    }

    pub fn buffer_length(mut self, len: usize) -> Self {
        self.config.monitor.buffer_length = len;
        self
    }

    pub fn events(mut self, events: &[Event]) -> Self {
        self.config.monitor.events = events.to_vec();
        self
    }

    pub fn scanner(mut self, kind: ScannerKind) -> Self {
        self.config.scan.scanner = kind;
        self
    }

    pub fn detect_renames(mut self, enabled: bool) -> Self {
        self.config.scan.detect_renames = enabled;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
