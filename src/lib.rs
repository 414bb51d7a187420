// src/lib.rs

pub mod cli;
pub mod config;
pub mod detect;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod notice;
pub mod scan;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path};
use crate::engine::{Monitor, TracingDiagnostics};
use crate::notice::{Event, Notice};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the monitor (scan worker + dispatcher)
/// - printing notices to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let raw = load_raw_config(&args)?;
    let cfg = ConfigFile::try_from(apply_overrides(raw, &args))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let monitor = Monitor::new(&cfg)?.with_diagnostics(Arc::new(TracingDiagnostics));
    let (handle, mut notices) = monitor.start(cfg.interval(), cfg.events())?;
    info!(root = ?cfg.scan.root, interval = ?cfg.interval(), "watching");

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(notice) => println!("{}", render_notice(&notice)),
                None => {
                    debug!("notice stream closed");
                    break;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("failed to listen for Ctrl+C: {e}");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    handle.stop().await.context("monitor did not stop cleanly")?;
    Ok(())
}

/// An explicit `--config` must exist; the default path is optional.
fn load_raw_config(args: &CliArgs) -> Result<RawConfigFile> {
    match &args.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_from_path(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))
            } else {
                debug!(?path, "no config file; using built-in defaults");
                Ok(RawConfigFile::default())
            }
        }
    }
}

fn apply_overrides(mut raw: RawConfigFile, args: &CliArgs) -> RawConfigFile {
    if let Some(root) = &args.root {
        raw.scan.root = root.clone();
    }
    if !args.include.is_empty() {
        raw.scan.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        raw.scan.exclude = args.exclude.clone();
    }
    if let Some(interval) = &args.interval {
        raw.monitor.interval = interval.clone();
    }
    if !args.events.is_empty() {
        raw.monitor.events = args.events.clone();
    }
    if let Some(scanner) = args.scanner {
        raw.scan.scanner = scanner;
    }
    if args.detect_renames {
        raw.scan.detect_renames = true;
    }
    raw
}

/// One line per notice: `<kind>\t<identity>`, or `rename\t<old> -> <new>`.
pub fn render_notice(notice: &Notice) -> String {
    match (notice.kind(), notice.renamed_from()) {
        (Event::Rename, Some(from)) => format!("rename\t{from} -> {}", notice.identity()),
        (kind, _) => format!("{kind}\t{}", notice.identity()),
    }
}

fn print_dry_run(cfg: &ConfigFile) {
    println!("pollwatch dry-run");
    println!("  monitor.interval = {:?}", cfg.interval());
    println!("  monitor.cooldown = {:?}", cfg.cooldown());
    println!("  monitor.buffer_length = {}", cfg.monitor.buffer_length);
    println!("  monitor.events = {}", cfg.events());
    println!();
    println!("  scan.root = {}", cfg.scan.root.display());
    println!("  scan.scanner = {:?}", cfg.scan.scanner);
    if !cfg.scan.include.is_empty() {
        println!("  scan.include = {:?}", cfg.scan.include);
    }
    if !cfg.scan.exclude.is_empty() {
        println!("  scan.exclude = {:?}", cfg.scan.exclude);
    }
    println!("  scan.detect_renames = {}", cfg.scan.detect_renames);

    debug!("dry-run complete (no scanning)");
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use clap::Parser;

    use super::*;
    use crate::scan::ItemMeta;

    #[test]
    fn renders_plain_and_rename_notices() {
        let meta = ItemMeta::new(1, SystemTime::UNIX_EPOCH);
        let created = Notice::new("logs/a.log", Event::Create, meta.clone());
        assert_eq!(render_notice(&created), "create\tlogs/a.log");

        let moved = Notice::renamed("b.txt", "a.txt", meta);
        assert_eq!(render_notice(&moved), "rename\ta.txt -> b.txt");
    }

    #[test]
    fn cli_flags_override_config() {
        let args = CliArgs::parse_from([
            "pollwatch",
            "--interval",
            "500ms",
            "--exclude",
            "tmp/**",
            "--detect-renames",
        ]);
        let mut raw = RawConfigFile::default();
        raw.scan.exclude = vec!["keep/**".to_string()];
        raw.scan.include = vec![r"\.log$".to_string()];

        let raw = apply_overrides(raw, &args);
        assert_eq!(raw.monitor.interval, "500ms");
        assert_eq!(raw.scan.exclude, vec!["tmp/**".to_string()]);
        assert_eq!(raw.scan.include, vec![r"\.log$".to_string()]);
        assert!(raw.scan.detect_renames);
    }
}
