// tests/monitor_lifecycle.rs

mod common;

use std::time::{Duration, Instant};

use common::{drain, next_notice, start_scripted};
use pollwatch::errors::MonitorError;
use pollwatch::notice::Event;
use pollwatch_test_utils::{ConfigFileBuilder, ScriptedScanner, snapshot, with_timeout};

#[tokio::test]
async fn baseline_then_create_update_remove_in_order() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[("a", 1, 1)]))
        .then_snapshot(snapshot(&[("a", 1, 1), ("b", 1, 1)]))
        .then_snapshot(snapshot(&[("a", 1, 2), ("b", 1, 1)]))
        .then_snapshot(snapshot(&[("b", 1, 1)]));
    let cfg = ConfigFileBuilder::new().build();
    let mut run = start_scripted(&cfg, &scanner);

    let first = next_notice(&mut run.stream).await;
    assert_eq!((first.identity(), first.kind()), ("b", Event::Create));
    let second = next_notice(&mut run.stream).await;
    assert_eq!((second.identity(), second.kind()), ("a", Event::Update));
    let third = next_notice(&mut run.stream).await;
    assert_eq!((third.identity(), third.kind()), ("a", Event::Remove));

    run.handle.stop().await.unwrap();
    assert!(drain(&mut run.stream).await.is_empty());
    assert_eq!(run.diagnostics.kinds().last(), Some(&"stopped"));
}

#[tokio::test]
async fn interest_set_filters_before_delivery() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[("a", 1, 1)]))
        .then_snapshot(snapshot(&[("a", 1, 1), ("b", 1, 1)]))
        .then_snapshot(snapshot(&[("a", 1, 2), ("b", 1, 1)]))
        .then_snapshot(snapshot(&[("b", 1, 1)]));
    let cfg = ConfigFileBuilder::new().events(&[Event::Remove]).build();
    let mut run = start_scripted(&cfg, &scanner);

    let notice = next_notice(&mut run.stream).await;
    assert_eq!((notice.identity(), notice.kind()), ("a", Event::Remove));

    run.handle.stop().await.unwrap();
    assert!(drain(&mut run.stream).await.is_empty());
}

#[tokio::test]
async fn empty_interest_set_delivers_nothing() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[]))
        .then_snapshot(snapshot(&[("a", 1, 1)]));
    let cfg = ConfigFileBuilder::new().events(&[]).build();
    let mut run = start_scripted(&cfg, &scanner);

    with_timeout(run.diagnostics.wait_for("scan_completed", 3)).await;
    run.handle.stop().await.unwrap();
    assert!(drain(&mut run.stream).await.is_empty());
}

#[tokio::test]
async fn failed_scan_cools_down_then_recovers() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[("a", 1, 1)]))
        .then_fail("share unmounted")
        .then_snapshot(snapshot(&[("a", 1, 1), ("b", 1, 1)]));
    let cfg = ConfigFileBuilder::new().cooldown("80ms").build();
    let started = Instant::now();
    let mut run = start_scripted(&cfg, &scanner);

    // The failed scan must not replace the baseline, otherwise `b` would be
    // swallowed by a second baseline.
    let notice = next_notice(&mut run.stream).await;
    assert_eq!((notice.identity(), notice.kind()), ("b", Event::Create));
    assert!(started.elapsed() >= Duration::from_millis(80));

    let failures = run.diagnostics.messages("scan_failed");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("share unmounted"));
    assert!(failures[0].contains("80ms"));

    run.handle.stop().await.unwrap();
}

#[tokio::test]
async fn cooldown_holds_off_the_next_scan() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[("a", 1, 1)]))
        .then_fail("timeout");
    let cfg = ConfigFileBuilder::new().cooldown("1h").build();
    let run = start_scripted(&cfg, &scanner);

    with_timeout(run.diagnostics.wait_for("scan_failed", 1)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(scanner.scans(), 2);

    run.handle.stop().await.unwrap();
}

#[tokio::test]
async fn worker_panic_surfaces_from_stop() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[("a", 1, 1)]))
        .then_panic("scanner exploded");
    let cfg = ConfigFileBuilder::new().build();
    let mut run = start_scripted(&cfg, &scanner);

    // The dispatcher closes the stream as soon as it sees the fault.
    assert!(drain(&mut run.stream).await.is_empty());

    match run.handle.stop().await {
        Err(MonitorError::WorkerFault(msg)) => assert_eq!(msg, "scanner exploded"),
        other => panic!("expected worker fault, got {other:?}"),
    }
    assert_eq!(run.diagnostics.count("worker_faulted"), 1);
}

#[tokio::test]
async fn dropping_the_handle_shuts_everything_down() {
    let scanner = ScriptedScanner::new().then_snapshot(snapshot(&[("a", 1, 1)]));
    let cfg = ConfigFileBuilder::new().build();
    let mut run = start_scripted(&cfg, &scanner);

    with_timeout(run.diagnostics.wait_for("scan_completed", 2)).await;
    drop(run.handle);

    assert!(drain(&mut run.stream).await.is_empty());
    with_timeout(run.diagnostics.wait_for("stopped", 1)).await;

    let scans = scanner.scans();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(scanner.scans(), scans);
}

#[tokio::test]
async fn dropped_stream_does_not_stop_scanning() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(snapshot(&[]))
        .then_snapshot(snapshot(&[("a", 1, 1)]));
    let cfg = ConfigFileBuilder::new().build();
    let run = start_scripted(&cfg, &scanner);
    drop(run.stream);

    with_timeout(run.diagnostics.wait_for("scan_completed", 4)).await;
    assert_eq!(run.diagnostics.count("stream_closed"), 1);
    run.handle.stop().await.unwrap();
}
