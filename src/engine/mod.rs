// src/engine/mod.rs

//! The monitor: scan cadence, scan worker and notice dispatch.
//!
//! Two executions cooperate:
//! - the scan worker, a dedicated OS thread that owns the scanner and the
//!   previous snapshot and runs one scan + diff per request (see [`worker`]);
//! - the dispatcher, a Tokio task that owns the cadence timer, hands out
//!   scan requests, filters buffered notices by interest and forwards them to
//!   the single [`NoticeStream`] (see [`monitor`]).
//!
//! They share no mutable state. Every handoff is a channel message, and
//! shutdown is ordered so that the stream closes only after the worker has
//! exited.

pub mod diagnostics;
pub mod monitor;
pub(crate) mod worker;

pub use diagnostics::{Diagnostics, MonitorEvent, NoopDiagnostics, TracingDiagnostics};
pub use monitor::{Monitor, MonitorHandle, NoticeStream};
