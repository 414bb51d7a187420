// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use pollwatch::config::{load_and_validate, load_from_path};
use pollwatch::errors::{PatternError, PollwatchError};
use pollwatch::notice::{Event, EventSet};
use pollwatch::types::ScannerKind;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_loaded_and_compiled() {
    let file = config_file(
        r#"
[monitor]
interval = "500ms"
cooldown = "1m"
buffer_length = 16
events = ["create", "remove"]

[scan]
root = "/mnt/share"
scanner = "listing"
include = ['\.log$']
exclude = ["archive/**"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.interval(), Duration::from_millis(500));
    assert_eq!(cfg.cooldown(), Duration::from_secs(60));
    assert_eq!(cfg.monitor.buffer_length, 16);
    assert_eq!(cfg.events(), Event::Create | Event::Remove);
    assert_eq!(cfg.scan.scanner, ScannerKind::Listing);

    assert!(cfg.patterns().matches("app.log"));
    assert!(!cfg.patterns().matches("app.txt"));
    assert!(!cfg.patterns().matches("archive/app.log"));
}

#[test]
fn empty_file_uses_defaults() {
    let file = config_file("");
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.interval(), Duration::from_secs(2));
    assert_eq!(cfg.cooldown(), Duration::from_secs(100));
    assert_eq!(cfg.monitor.buffer_length, 1000);
    assert_eq!(cfg.events(), EventSet::all());
    assert_eq!(cfg.scan.scanner, ScannerKind::Path);
    assert!(!cfg.scan.detect_renames);
}

#[test]
fn invalid_include_regex_prevents_start() {
    let file = config_file(
        r#"
[scan]
include = ["(unclosed"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(PollwatchError::Pattern(PatternError::Regex { pattern, .. })) => {
            assert_eq!(pattern, "(unclosed");
        }
        Err(e) => panic!("Expected pattern error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_exclude_glob_prevents_start() {
    let file = config_file(
        r#"
[scan]
exclude = ["a/[b"]
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(PollwatchError::Pattern(PatternError::Glob { .. }))
    ));
}

#[test]
fn bad_duration_is_a_config_error() {
    let file = config_file(
        r#"
[monitor]
interval = "soon"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PollwatchError::Config(msg)) => assert!(msg.contains("interval")),
        Err(e) => panic!("Expected config error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_scanner_or_event_is_a_toml_error() {
    let file = config_file(
        r#"
[scan]
scanner = "inotify"
"#,
    );
    assert!(matches!(load_from_path(file.path()), Err(PollwatchError::Toml(_))));

    let file = config_file(
        r#"
[monitor]
events = ["modify"]
"#,
    );
    assert!(matches!(load_from_path(file.path()), Err(PollwatchError::Toml(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("pollwatch.toml")),
        Err(PollwatchError::Io(_))
    ));
}
