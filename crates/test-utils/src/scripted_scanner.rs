use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use pollwatch::errors::ScanError;
use pollwatch::scan::{PatternSet, Scanner, Snapshot};

/// One queued scan outcome.
#[derive(Debug, Clone)]
pub enum Step {
    Snapshot(Snapshot),
    /// Fail with an IO error carrying this message.
    Fail(String),
    /// Panic with this message.
    Panic(String),
}

#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Step>,
    last: Snapshot,
    scans: usize,
}

/// A scanner driven by a queue of outcomes.
///
/// Clones share the queue, so a test can keep one clone and push more steps
/// while the monitor owns another. Once the queue is empty the last
/// successful snapshot is returned again (an unchanged tree).
#[derive(Debug, Clone, Default)]
pub struct ScriptedScanner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, step: Step) -> Self {
        self.push(step);
        self
    }

    pub fn then_snapshot(self, snapshot: Snapshot) -> Self {
        self.then(Step::Snapshot(snapshot))
    }

    pub fn then_fail(self, reason: &str) -> Self {
        self.then(Step::Fail(reason.to_string()))
    }

    pub fn then_panic(self, message: &str) -> Self {
        self.then(Step::Panic(message.to_string()))
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().steps.push_back(step);
    }

    /// Number of scans performed so far.
    pub fn scans(&self) -> usize {
        self.script.lock().unwrap().scans
    }

    pub fn boxed(&self) -> Box<dyn Scanner> {
        Box::new(self.clone())
    }
}

impl Scanner for ScriptedScanner {
    fn scan(&mut self, locator: &Path, _patterns: &PatternSet) -> Result<Snapshot, ScanError> {
        let step = {
            let mut script = self.script.lock().unwrap();
            script.scans += 1;
            match script.steps.pop_front() {
                Some(step) => step,
                None => Step::Snapshot(script.last.clone()),
            }
        };

        match step {
            Step::Snapshot(snapshot) => {
                self.script.lock().unwrap().last = snapshot.clone();
                Ok(snapshot)
            }
            Step::Fail(reason) => Err(ScanError::Io {
                path: locator.to_path_buf(),
                source: io::Error::other(reason),
            }),
            Step::Panic(message) => panic!("{message}"),
        }
    }
}
