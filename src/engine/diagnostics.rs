// src/engine/diagnostics.rs

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::errors::{MonitorError, ScanError};

/// Lifecycle events reported by a running monitor.
///
/// Borrowed data lives only for the duration of [`Diagnostics::record`].
#[derive(Debug)]
pub enum MonitorEvent<'a> {
    Started {
        cadence: Duration,
    },
    ScanStarted {
        cycle: u64,
    },
    ScanCompleted {
        cycle: u64,
        items: usize,
        notices: usize,
    },
    /// The scan failed; the next one is attempted after `retry_in`.
    ScanFailed {
        cycle: u64,
        error: &'a ScanError,
        retry_in: Duration,
    },
    /// The subscriber dropped its `NoticeStream`; further notices are
    /// discarded while the monitor keeps scanning.
    StreamClosed,
    /// Notices thrown away during shutdown: still buffered, interrupted
    /// mid-delivery, or handed over but never taken by the subscriber.
    NoticesDiscarded {
        count: usize,
    },
    WorkerFaulted {
        error: &'a MonitorError,
    },
    Stopped,
}

impl MonitorEvent<'_> {
    /// Short stable name of the event, e.g. `scan_failed`.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::Started { .. } => "started",
            MonitorEvent::ScanStarted { .. } => "scan_started",
            MonitorEvent::ScanCompleted { .. } => "scan_completed",
            MonitorEvent::ScanFailed { .. } => "scan_failed",
            MonitorEvent::StreamClosed => "stream_closed",
            MonitorEvent::NoticesDiscarded { .. } => "notices_discarded",
            MonitorEvent::WorkerFaulted { .. } => "worker_faulted",
            MonitorEvent::Stopped => "stopped",
        }
    }
}

impl fmt::Display for MonitorEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::Started { cadence } => write!(f, "started (cadence {cadence:?})"),
            MonitorEvent::ScanStarted { cycle } => write!(f, "scan {cycle} started"),
            MonitorEvent::ScanCompleted {
                cycle,
                items,
                notices,
            } => write!(f, "scan {cycle} completed: {items} items, {notices} notices"),
            MonitorEvent::ScanFailed {
                cycle,
                error,
                retry_in,
            } => write!(f, "scan {cycle} failed: {error}; retrying in {retry_in:?}"),
            MonitorEvent::StreamClosed => f.write_str("notice stream closed by subscriber"),
            MonitorEvent::NoticesDiscarded { count } => {
                write!(f, "discarded {count} undelivered notices")
            }
            MonitorEvent::WorkerFaulted { error } => write!(f, "{error}"),
            MonitorEvent::Stopped => f.write_str("stopped"),
        }
    }
}

/// Sink for monitor lifecycle events.
///
/// Called from the dispatcher task, so implementations must not block.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: MonitorEvent<'_>);
}

/// Discards everything. The default for a new `Monitor`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn record(&self, _event: MonitorEvent<'_>) {}
}

/// Forwards lifecycle events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: MonitorEvent<'_>) {
        match &event {
            MonitorEvent::Started { cadence } => info!(?cadence, "monitor started"),
            MonitorEvent::ScanStarted { cycle } => debug!(cycle, "scan started"),
            MonitorEvent::ScanCompleted {
                cycle,
                items,
                notices,
            } => debug!(cycle, items, notices, "scan completed"),
            MonitorEvent::ScanFailed {
                cycle,
                error,
                retry_in,
            } => warn!(cycle, error = %error, ?retry_in, "scan failed; cooling down"),
            MonitorEvent::StreamClosed => debug!("notice stream closed by subscriber"),
            MonitorEvent::NoticesDiscarded { count } => {
                debug!(count, "discarded undelivered notices on shutdown")
            }
            MonitorEvent::WorkerFaulted { error } => error!(error = %error, "scan worker faulted"),
            MonitorEvent::Stopped => info!("monitor stopped"),
        }
    }
}
