// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::notice::Event;
use crate::types::ScannerKind;

/// Command-line arguments for `pollwatch`.
///
/// Every flag except `--config`, `--log-level` and `--dry-run` overrides the
/// matching config file setting.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pollwatch",
    version,
    about = "Detect file changes by periodically re-scanning a directory tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `pollwatch.toml` in the current working directory, if it
    /// exists. Built-in defaults are used otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to scan (or listing file with `--scanner listing`).
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Include regex; may be repeated. Replaces the configured list.
    #[arg(long = "include", value_name = "REGEX")]
    pub include: Vec<String>,

    /// Exclude glob; may be repeated. Replaces the configured list.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Time between scans, e.g. `500ms`, `2s`, `1m`.
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Event kind to print (create, update, remove, rename); may be repeated.
    #[arg(long = "event", value_name = "KIND")]
    pub events: Vec<Event>,

    /// Scanner to use: `path` or `listing`.
    #[arg(long, value_name = "KIND")]
    pub scanner: Option<ScannerKind>,

    /// Hash file contents so moved files are reported as renames.
    #[arg(long)]
    pub detect_renames: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `POLLWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse and validate the configuration, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
