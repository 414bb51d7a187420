// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PollwatchError, Result};
use crate::scan::PatternSet;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PollwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let interval = non_zero_duration("[monitor].interval", &raw.monitor.interval)?;
        let cooldown = non_zero_duration("[monitor].cooldown", &raw.monitor.cooldown)?;
        validate_buffer(&raw)?;
        validate_root(&raw)?;

        // Compiled once here; an invalid pattern keeps the pipeline from
        // ever starting.
        let patterns = PatternSet::compile(&raw.scan.include, &raw.scan.exclude)?;

        Ok(ConfigFile::new_unchecked(
            raw.monitor,
            raw.scan,
            interval,
            cooldown,
            patterns,
        ))
    }
}

fn non_zero_duration(field: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value)
        .map_err(|e| PollwatchError::Config(format!("{field}: {e}")))?;
    if dur.is_zero() {
        return Err(PollwatchError::Config(format!(
            "{field} must be greater than zero (got \"{value}\")"
        )));
    }
    Ok(dur)
}

fn validate_buffer(cfg: &RawConfigFile) -> Result<()> {
    if cfg.monitor.buffer_length == 0 {
        return Err(PollwatchError::Config(
            "[monitor].buffer_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_root(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scan.root.as_os_str().is_empty() {
        return Err(PollwatchError::Config(
            "[scan].root must not be empty".to_string(),
        ));
    }
    Ok(())
}
