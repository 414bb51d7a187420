use std::sync::Mutex;
use std::time::Duration;

use pollwatch::engine::{Diagnostics, MonitorEvent};

/// Records every monitor event as `(kind, rendered message)`.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    pub fn messages(&self, kind: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Poll until at least `n` events of `kind` were recorded.
    pub async fn wait_for(&self, kind: &str, n: usize) {
        while self.count(kind) < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: MonitorEvent<'_>) {
        let entry = (event.kind(), event.to_string());
        self.events.lock().unwrap().push(entry);
    }
}
