// tests/monitor_shutdown.rs

mod common;

use std::time::{Duration, SystemTime};

use common::{next_notice, start_scripted};
use pollwatch::notice::Event;
use pollwatch::scan::{ItemMeta, Snapshot};
use pollwatch_test_utils::{ConfigFileBuilder, ScriptedScanner, with_timeout};

fn many(count: usize) -> Snapshot {
    (0..count)
        .map(|i| (format!("file-{i:04}"), ItemMeta::new(1, SystemTime::UNIX_EPOCH)))
        .collect()
}

#[tokio::test]
async fn stop_with_slow_consumer_closes_stream_without_late_notices() {
    for round in 0..20 {
        let scanner = ScriptedScanner::new()
            .then_snapshot(Snapshot::new())
            .then_snapshot(many(300));
        let cfg = ConfigFileBuilder::new().buffer_length(4).build();
        let mut run = start_scripted(&cfg, &scanner);

        // Read a few, slowly, then stop while the worker is still blocked
        // on the full buffer.
        let take = 1 + round % 5;
        for _ in 0..take {
            let notice = next_notice(&mut run.stream).await;
            assert_eq!(notice.kind(), Event::Create);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        run.handle.stop().await.unwrap();

        // Nothing may be read once stop() has returned.
        let late = with_timeout(run.stream.recv()).await;
        assert!(late.is_none(), "round {round}: {late:?} after stop");
        assert!(run.stream.recv().await.is_none());
        assert!(run.stream.try_recv().is_none());

        let discarded = run.diagnostics.messages("notices_discarded");
        assert_eq!(discarded.len(), 1, "round {round}");
        assert_eq!(run.diagnostics.kinds().last(), Some(&"stopped"));
    }
}

#[tokio::test]
async fn stop_after_partial_read_leaves_nothing_readable() {
    let scanner = ScriptedScanner::new()
        .then_snapshot(Snapshot::new())
        .then_snapshot(many(50));
    let cfg = ConfigFileBuilder::new().build();
    let mut run = start_scripted(&cfg, &scanner);

    let first = next_notice(&mut run.stream).await;
    assert_eq!(first.identity(), "file-0000");
    // Let the dispatcher hand the next notice to the stream.
    tokio::time::sleep(Duration::from_millis(50)).await;

    run.handle.stop().await.unwrap();
    assert!(run.stream.recv().await.is_none());
    assert!(run.stream.try_recv().is_none());

    // Every notice not read is accounted for.
    assert_eq!(
        run.diagnostics.messages("notices_discarded"),
        vec!["discarded 49 undelivered notices".to_string()]
    );
}

#[tokio::test]
async fn stop_during_first_scan_waits_for_the_worker() {
    let scanner = ScriptedScanner::new().then_snapshot(many(10));
    let cfg = ConfigFileBuilder::new().build();
    let mut run = start_scripted(&cfg, &scanner);

    run.handle.stop().await.unwrap();
    assert!(with_timeout(run.stream.recv()).await.is_none());
    assert_eq!(run.diagnostics.kinds().last(), Some(&"stopped"));
}
