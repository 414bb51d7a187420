#![allow(dead_code)]

use std::sync::Arc;

use pollwatch::config::ConfigFile;
use pollwatch::engine::{Monitor, MonitorHandle, NoticeStream};
use pollwatch::notice::Notice;
use pollwatch_test_utils::{RecordingDiagnostics, ScriptedScanner, init_tracing, with_timeout};

pub struct Running {
    pub handle: MonitorHandle,
    pub stream: NoticeStream,
    pub diagnostics: Arc<RecordingDiagnostics>,
}

/// Start a monitor around `scanner` with the cadence and interest taken
/// from `cfg`.
pub fn start_scripted(cfg: &ConfigFile, scanner: &ScriptedScanner) -> Running {
    init_tracing();
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let monitor =
        Monitor::with_scanner(cfg, scanner.boxed()).with_diagnostics(diagnostics.clone());
    let (handle, stream) = monitor
        .start(cfg.interval(), cfg.events())
        .expect("monitor should start");
    Running {
        handle,
        stream,
        diagnostics,
    }
}

/// Next notice, failing the test after 5 seconds.
pub async fn next_notice(stream: &mut NoticeStream) -> Notice {
    with_timeout(stream.recv())
        .await
        .expect("notice stream closed unexpectedly")
}

/// Collect everything left on a stream until it closes.
pub async fn drain(stream: &mut NoticeStream) -> Vec<Notice> {
    let mut rest = Vec::new();
    while let Some(notice) = with_timeout(stream.recv()).await {
        rest.push(notice);
    }
    rest
}
