// src/engine/monitor.rs

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::ConfigFile;
use crate::detect::ChangeDetector;
use crate::errors::{MonitorError, PollwatchError, Result};
use crate::fs::RealFileSystem;
use crate::notice::{EventSet, Notice};
use crate::scan::{PatternSet, Scanner, build_scanner};
use crate::types::ScannerKind;

use super::diagnostics::{Diagnostics, MonitorEvent, NoopDiagnostics};
use super::worker::{CycleOutcome, ScanRequest, ScanWorker, WorkerExit};

/// A configured, not yet running, polling monitor.
///
/// ```no_run
/// # async fn demo(config: &pollwatch::config::ConfigFile) -> pollwatch::errors::Result<()> {
/// use pollwatch::engine::Monitor;
///
/// let monitor = Monitor::new(config)?;
/// let (handle, mut notices) = monitor.start(config.interval(), config.events())?;
/// while let Some(notice) = notices.recv().await {
///     println!("{notice}");
/// #   break;
/// }
/// handle.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Monitor {
    scanner: Box<dyn Scanner>,
    locator: PathBuf,
    patterns: PatternSet,
    detector: ChangeDetector,
    cooldown: Duration,
    buffer_length: usize,
    diagnostics: Arc<dyn Diagnostics>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("locator", &self.locator)
            .field("patterns", &self.patterns)
            .field("detector", &self.detector)
            .field("cooldown", &self.cooldown)
            .field("buffer_length", &self.buffer_length)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Build a monitor around the scanner named in `config`, reading the real
    /// file system.
    pub fn new(config: &ConfigFile) -> Result<Self> {
        if config.scan.detect_renames && config.scan.scanner == ScannerKind::Listing {
            return Err(PollwatchError::Config(
                "detect_renames needs file contents and is not supported by the listing scanner"
                    .to_string(),
            ));
        }
        let scanner = build_scanner(
            config.scan.scanner,
            Arc::new(RealFileSystem),
            config.scan.detect_renames,
        );
        Ok(Self::with_scanner(config, scanner))
    }

    /// Build a monitor around a caller-provided scanner. Everything except
    /// the scanner choice is taken from `config`.
    pub fn with_scanner(config: &ConfigFile, scanner: Box<dyn Scanner>) -> Self {
        Self {
            scanner,
            locator: config.scan.root.clone(),
            patterns: config.patterns().clone(),
            detector: ChangeDetector::new(config.scan.detect_renames),
            cooldown: config.cooldown(),
            buffer_length: config.monitor.buffer_length,
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Spawn the scan worker and the dispatcher and run the first scan
    /// immediately.
    ///
    /// Only notices whose kind is in `interest` reach the returned stream.
    /// Must be called from within a Tokio runtime.
    pub fn start(self, cadence: Duration, interest: EventSet) -> Result<(MonitorHandle, NoticeStream)> {
        if cadence.is_zero() {
            return Err(PollwatchError::Config(
                "cadence must be greater than zero".to_string(),
            ));
        }
        if self.buffer_length == 0 {
            return Err(PollwatchError::Config(
                "buffer_length must be >= 1".to_string(),
            ));
        }
        let runtime = Handle::try_current()
            .map_err(|e| MonitorError::Spawn(io::Error::other(e)))?;

        let (request_tx, request_rx) = mpsc::channel(1);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (buffer_tx, buffer_rx) = mpsc::channel(self.buffer_length);
        let (control_tx, control_rx) = mpsc::channel(1);
        let (outbound_tx, outbound_rx) = mpsc::channel(1);
        let gate = Arc::new(DeliveryGate::default());

        let worker = ScanWorker::new(self.scanner, self.locator, self.patterns, self.detector);
        // Detached; the dispatcher learns about the end of the thread through
        // the exit report.
        worker
            .spawn(request_rx, exit_tx)
            .map_err(MonitorError::Spawn)?;

        let dispatcher = Dispatcher {
            cadence,
            cooldown: self.cooldown,
            interest,
            requests: Some(request_tx),
            buffer_tx,
            buffer_rx,
            exited: exit_rx,
            control: control_rx,
            outbound: Some(outbound_tx),
            gate: Arc::clone(&gate),
            handed_over: 0,
            dropped: 0,
            diagnostics: self.diagnostics,
            cycle: 0,
        };
        let task = runtime.spawn(dispatcher.run());

        Ok((
            MonitorHandle {
                control: control_tx,
                task,
            },
            NoticeStream {
                rx: outbound_rx,
                gate,
            },
        ))
    }
}

/// Control surface of a running monitor.
///
/// Dropping the handle shuts the pipeline down just like [`stop`](Self::stop),
/// without waiting for it.
#[derive(Debug)]
pub struct MonitorHandle {
    control: mpsc::Sender<StopRequest>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the monitor and wait until the worker thread has exited and the
    /// notice stream is closed.
    ///
    /// Returns the worker's fault if it crashed while running.
    pub async fn stop(self) -> std::result::Result<(), MonitorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.control
            .send(StopRequest { reply })
            .await
            .map_err(|_| MonitorError::DispatcherLost)?;
        let result = reply_rx.await.map_err(|_| MonitorError::DispatcherLost)?;
        self.task.await.map_err(|_| MonitorError::DispatcherLost)?;
        result
    }
}

/// The single ordered stream of delivered notices.
///
/// Once `stop()` has returned, `recv` yields `None` even if a notice was
/// already on its way to the subscriber.
#[derive(Debug)]
pub struct NoticeStream {
    rx: mpsc::Receiver<Notice>,
    gate: Arc<DeliveryGate>,
}

impl NoticeStream {
    /// Next notice, or `None` once the monitor has stopped.
    pub async fn recv(&mut self) -> Option<Notice> {
        if self.gate.is_closed() {
            return None;
        }
        let notice = self.rx.recv().await?;
        self.gate.pass(notice)
    }

    pub fn try_recv(&mut self) -> Option<Notice> {
        if self.gate.is_closed() {
            return None;
        }
        let notice = self.rx.try_recv().ok()?;
        self.gate.pass(notice)
    }
}

/// Point where a notice becomes delivered. The dispatcher shuts it before
/// answering a stop request, so nothing gets through afterwards.
#[derive(Debug, Default)]
struct DeliveryGate {
    state: Mutex<GateState>,
}

#[derive(Debug, Default)]
struct GateState {
    closed: bool,
    taken: usize,
}

impl DeliveryGate {
    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn pass(&self, notice: Notice) -> Option<Notice> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.taken += 1;
        Some(notice)
    }

    /// Shut the gate. Returns how many of `handed_over` notices were never
    /// taken by the subscriber.
    fn close(&self, handed_over: usize) -> usize {
        let mut state = self.lock();
        state.closed = true;
        handed_over.saturating_sub(state.taken)
    }
}

#[derive(Debug)]
struct StopRequest {
    reply: oneshot::Sender<std::result::Result<(), MonitorError>>,
}

/// Why the dispatcher left its main loop.
enum Interrupt {
    Stop(StopRequest),
    /// The `MonitorHandle` was dropped.
    Abandoned,
    WorkerExited(std::result::Result<WorkerExit, RecvError>),
}

impl From<Option<StopRequest>> for Interrupt {
    fn from(request: Option<StopRequest>) -> Self {
        match request {
            Some(request) => Interrupt::Stop(request),
            None => Interrupt::Abandoned,
        }
    }
}

struct Dispatcher {
    cadence: Duration,
    cooldown: Duration,
    interest: EventSet,
    /// Dropped to ask the worker to exit.
    requests: Option<mpsc::Sender<ScanRequest>>,
    /// Kept so every cycle can hand the worker a clone.
    buffer_tx: mpsc::Sender<Notice>,
    buffer_rx: mpsc::Receiver<Notice>,
    exited: oneshot::Receiver<WorkerExit>,
    control: mpsc::Receiver<StopRequest>,
    /// `None` once closed, either at shutdown or because the subscriber
    /// went away.
    outbound: Option<mpsc::Sender<Notice>>,
    gate: Arc<DeliveryGate>,
    /// Notices accepted by the outbound channel.
    handed_over: usize,
    /// Notices dropped because a stop request won over their delivery.
    dropped: usize,
    diagnostics: Arc<dyn Diagnostics>,
    cycle: u64,
}

impl Dispatcher {
    async fn run(mut self) {
        self.diagnostics.record(MonitorEvent::Started {
            cadence: self.cadence,
        });

        let mut next_scan = Instant::now();
        let interrupt = loop {
            tokio::select! {
                biased;
                request = self.control.recv() => break Interrupt::from(request),
                exit = &mut self.exited => break Interrupt::WorkerExited(exit),
                _ = time::sleep_until(next_scan) => {}
            }

            match self.run_cycle().await {
                Ok(delay) => next_scan = Instant::now() + delay,
                Err(interrupt) => break interrupt,
            }
        };

        match interrupt {
            Interrupt::Stop(request) => {
                let result = self.shutdown().await;
                let _ = request.reply.send(result);
            }
            Interrupt::Abandoned => {
                let diagnostics = Arc::clone(&self.diagnostics);
                if let Err(error) = self.shutdown().await {
                    diagnostics.record(MonitorEvent::WorkerFaulted { error: &error });
                }
            }
            Interrupt::WorkerExited(exit) => self.fault(exit).await,
        }
    }

    /// One Scanning + Delivering pass. Returns the delay before the next
    /// scan.
    async fn run_cycle(&mut self) -> std::result::Result<Duration, Interrupt> {
        self.cycle += 1;
        let cycle = self.cycle;

        let (done, mut done_rx) = oneshot::channel();
        let request = ScanRequest {
            notices: self.buffer_tx.clone(),
            done,
        };
        let sent = match self.requests.as_ref() {
            Some(requests) => requests.send(request).await.is_ok(),
            None => false,
        };
        if !sent {
            return Err(Interrupt::WorkerExited((&mut self.exited).await));
        }
        self.diagnostics.record(MonitorEvent::ScanStarted { cycle });

        let outcome: CycleOutcome = loop {
            tokio::select! {
                biased;
                request = self.control.recv() => return Err(Interrupt::from(request)),
                Some(notice) = self.buffer_rx.recv() => self.deliver(notice).await?,
                done = &mut done_rx => match done {
                    Ok(outcome) => break outcome,
                    Err(_) => return Err(Interrupt::WorkerExited((&mut self.exited).await)),
                },
            }
        };

        // `done` is only answered after the last notice was buffered.
        while let Ok(notice) = self.buffer_rx.try_recv() {
            self.deliver(notice).await?;
        }

        match outcome {
            Ok(report) => {
                self.diagnostics.record(MonitorEvent::ScanCompleted {
                    cycle,
                    items: report.items,
                    notices: report.notices,
                });
                Ok(self.cadence)
            }
            Err(error) => {
                self.diagnostics.record(MonitorEvent::ScanFailed {
                    cycle,
                    error: &error,
                    retry_in: self.cooldown,
                });
                Ok(self.cooldown)
            }
        }
    }

    /// Forward one notice if it matches the interest set. A stop request
    /// that arrives while the subscriber is not reading wins, and the notice
    /// is dropped.
    async fn deliver(&mut self, notice: Notice) -> std::result::Result<(), Interrupt> {
        if !self.interest.contains(notice.kind()) {
            return Ok(());
        }
        let Some(outbound) = self.outbound.as_ref() else {
            return Ok(());
        };

        let delivered = tokio::select! {
            biased;
            request = self.control.recv() => {
                self.dropped += 1;
                return Err(Interrupt::from(request));
            }
            sent = outbound.send(notice) => sent.is_ok(),
        };
        if delivered {
            self.handed_over += 1;
        } else {
            self.outbound = None;
            self.diagnostics.record(MonitorEvent::StreamClosed);
        }
        Ok(())
    }

    /// Ordered shutdown: let the worker finish, then discard what it left
    /// in the buffer, then close the stream. Only then is the stopper
    /// answered.
    async fn shutdown(mut self) -> std::result::Result<(), MonitorError> {
        drop(self.requests.take());

        // Keep draining so a worker blocked on a full buffer can finish.
        let mut discarded = 0usize;
        let exit = loop {
            tokio::select! {
                biased;
                exit = &mut self.exited => break exit,
                Some(_) = self.buffer_rx.recv() => discarded += 1,
            }
        };
        discarded += self.drain_buffer();
        discarded += self.close_stream();
        if discarded > 0 {
            self.diagnostics
                .record(MonitorEvent::NoticesDiscarded { count: discarded });
        }
        self.diagnostics.record(MonitorEvent::Stopped);

        match exit {
            Ok(WorkerExit::Clean) => Ok(()),
            Ok(WorkerExit::Faulted(message)) => Err(MonitorError::WorkerFault(message)),
            Err(_) => Err(MonitorError::WorkerLost),
        }
    }

    /// The worker died on its own. Close everything and hold the error for
    /// the next `stop()`.
    async fn fault(mut self, exit: std::result::Result<WorkerExit, RecvError>) {
        let error = match exit {
            Ok(WorkerExit::Faulted(message)) => MonitorError::WorkerFault(message),
            Ok(WorkerExit::Clean) | Err(_) => MonitorError::WorkerLost,
        };
        self.diagnostics
            .record(MonitorEvent::WorkerFaulted { error: &error });

        let discarded = self.drain_buffer() + self.close_stream();
        if discarded > 0 {
            self.diagnostics
                .record(MonitorEvent::NoticesDiscarded { count: discarded });
        }
        self.diagnostics.record(MonitorEvent::Stopped);

        if let Some(request) = self.control.recv().await {
            let _ = request.reply.send(Err(error));
        }
    }

    /// Shut the delivery gate and drop the outbound sender. Returns the
    /// notices that never reached the subscriber, including one dropped
    /// mid-delivery by a stop request.
    fn close_stream(&mut self) -> usize {
        let stranded = self.gate.close(self.handed_over);
        drop(self.outbound.take());
        stranded + std::mem::take(&mut self.dropped)
    }

    fn drain_buffer(&mut self) -> usize {
        let mut count = 0;
        while self.buffer_rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}
