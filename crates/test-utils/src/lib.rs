pub mod builders;
pub mod diagnostics;
pub mod scripted_scanner;

use std::sync::Once;
use std::time::{Duration, SystemTime};

use pollwatch::scan::{ItemMeta, Snapshot};
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::ConfigFileBuilder;
pub use diagnostics::RecordingDiagnostics;
pub use scripted_scanner::{ScriptedScanner, Step};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Build a snapshot from `(identity, size, mtime_secs)` triples.
pub fn snapshot(items: &[(&str, u64, u64)]) -> Snapshot {
    items
        .iter()
        .map(|(id, size, mtime)| {
            (
                id.to_string(),
                ItemMeta::new(*size, SystemTime::UNIX_EPOCH + Duration::from_secs(*mtime)),
            )
        })
        .collect()
}
