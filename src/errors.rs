// src/errors.rs

//! Crate-wide error types and the `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An include or exclude pattern that failed to compile.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid include regex `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid exclude glob `{pattern}`: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Failure of a single scan cycle. Recoverable: the monitor cools down and
/// retries.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan root {0:?} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("malformed listing line {line}: {reason}")]
    Listing { line: usize, reason: String },
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by the monitor's control surface.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("failed to spawn scan worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("scan worker faulted: {0}")]
    WorkerFault(String),

    #[error("scan worker exited without reporting")]
    WorkerLost,

    #[error("monitor dispatcher is no longer running")]
    DispatcherLost,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PollwatchError>;
