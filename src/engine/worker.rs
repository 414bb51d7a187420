// src/engine/worker.rs

//! The scan worker: a dedicated OS thread owning the scanner, the previous
//! snapshot and the change detector.
//!
//! Scanners do blocking IO, so they never run on the async runtime. The
//! worker sits in `blocking_recv` on the request channel and handles one
//! [`ScanRequest`] at a time. It exits once the dispatcher drops the request
//! sender, after finishing the request it is working on.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::detect::ChangeDetector;
use crate::errors::ScanError;
use crate::notice::Notice;
use crate::scan::{PatternSet, Scanner, Snapshot};

pub(crate) const WORKER_THREAD_NAME: &str = "pollwatch-scan";

/// One scan cycle, issued by the dispatcher.
///
/// `notices` is the buffer handle for this cycle. Every notice is written to
/// it before `done` is answered.
pub(crate) struct ScanRequest {
    pub notices: mpsc::Sender<Notice>,
    pub done: oneshot::Sender<CycleOutcome>,
}

pub(crate) type CycleOutcome = Result<CycleReport, ScanError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CycleReport {
    pub items: usize,
    pub notices: usize,
}

/// How the worker thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// The request channel closed.
    Clean,
    /// A scan panicked; carries the panic message.
    Faulted(String),
}

pub(crate) struct ScanWorker {
    scanner: Box<dyn Scanner>,
    locator: PathBuf,
    patterns: PatternSet,
    detector: ChangeDetector,
    previous: Option<Snapshot>,
}

impl ScanWorker {
    pub fn new(
        scanner: Box<dyn Scanner>,
        locator: PathBuf,
        patterns: PatternSet,
        detector: ChangeDetector,
    ) -> Self {
        Self {
            scanner,
            locator,
            patterns,
            detector,
            previous: None,
        }
    }

    /// Start the worker thread. `exited` receives the exit report as the
    /// thread's last action.
    pub fn spawn(
        self,
        requests: mpsc::Receiver<ScanRequest>,
        exited: oneshot::Sender<WorkerExit>,
    ) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let exit = self.run(requests);
                let _ = exited.send(exit);
            })
    }

    fn run(mut self, mut requests: mpsc::Receiver<ScanRequest>) -> WorkerExit {
        while let Some(ScanRequest { notices, done }) = requests.blocking_recv() {
            match panic::catch_unwind(AssertUnwindSafe(|| self.cycle(&notices))) {
                Ok(outcome) => {
                    // The dispatcher may have stopped waiting; nothing to do then.
                    let _ = done.send(outcome);
                }
                Err(payload) => return WorkerExit::Faulted(panic_message(payload.as_ref())),
            }
        }
        WorkerExit::Clean
    }

    /// Scan, diff and publish. The previous snapshot is replaced only when
    /// the scan succeeded.
    fn cycle(&mut self, notices: &mpsc::Sender<Notice>) -> CycleOutcome {
        let current = self.scanner.scan(&self.locator, &self.patterns)?;
        let changes = self.detector.diff(self.previous.as_ref(), &current);

        let report = CycleReport {
            items: current.len(),
            notices: changes.len(),
        };
        for notice in changes {
            if notices.blocking_send(notice).is_err() {
                break;
            }
        }

        self.previous = Some(current);
        Ok(report)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "scan panicked".to_string()
    }
}
