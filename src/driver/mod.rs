//! Evaluation driver
//!
//! A run injects the import preamble, splits the source into complete
//! units and evaluates them in order on a worker thread, reporting every
//! result on the console channel. Failing units never stop the run; the
//! run ends when the remainder is blank or incomplete.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::console::{ConsoleEvent, ConsoleSender};
use crate::frontend::analyze;
use crate::session::{Session, SessionError, SnippetResult, Status};

pub mod report;

pub use report::{report, ReportStyle};

/// Stack for the evaluation worker; deep recursion in evaluated code
/// recurses in the interpreter too
const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Driver errors
#[derive(Debug, Error)]
pub enum DriverError {
    /// Another run is still active
    #[error("A run is already in progress")]
    Busy,

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The worker thread could not be started
    #[error("Failed to start evaluation worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("Evaluation worker panicked")]
    WorkerPanicked,
}

/// Counts for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Units handed to the session
    pub units: usize,
    /// Results that ran to completion
    pub valid: usize,
    pub rejected: usize,
    /// Valid results whose execution threw
    pub thrown: usize,
    /// Unconsumed trailing text (blank or incomplete)
    pub remainder: String,
    /// Whether the run stopped early on `cancel()`
    pub cancelled: bool,
}

impl RunSummary {
    fn record(
        &mut self,
        result: &SnippetResult,
    ) {
        match (result.status, &result.thrown) {
            (Status::Rejected, _) => self.rejected += 1,
            (Status::Valid, Some(_)) => self.thrown += 1,
            (Status::Valid, None) => self.valid += 1,
        }
    }
}

/// Resets the busy flag when the run ends, however it ends
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs source text against a shared session, one run at a time
#[derive(Debug, Clone)]
pub struct Driver {
    session: Arc<Session>,
    console: ConsoleSender,
    busy: Arc<AtomicBool>,
    style: ReportStyle,
}

impl Driver {
    pub fn new(
        session: Arc<Session>,
        console: ConsoleSender,
    ) -> Self {
        Self {
            session,
            console,
            busy: Arc::new(AtomicBool::new(false)),
            style: ReportStyle::default(),
        }
    }

    pub fn with_style(
        mut self,
        style: ReportStyle,
    ) -> Self {
        self.style = style;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a run on a worker thread
    ///
    /// `imports` are evaluated first as `import X;` lines; they never
    /// become part of `source`. Fails with [`DriverError::Busy`] while
    /// another run is active.
    pub fn run(
        &self,
        source: impl Into<String>,
        imports: &[String],
    ) -> Result<RunHandle, DriverError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DriverError::Busy);
        }
        let guard = BusyGuard(self.busy.clone());
        if self.session.is_closed() {
            return Err(SessionError::Closed.into());
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            session: self.session.clone(),
            console: self.console.clone(),
            style: self.style,
            cancel: cancel.clone(),
        };
        let source = source.into();
        let imports = imports.to_vec();

        let thread = thread::Builder::new()
            .name("snippad-eval".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let _guard = guard;
                let summary = worker.run(&source, &imports);
                worker.console.send(ConsoleEvent::RunFinished);
                summary
            })
            .map_err(DriverError::Spawn)?;

        Ok(RunHandle {
            thread,
            cancel,
            session: self.session.clone(),
        })
    }

    /// Run and wait for the summary
    pub fn run_blocking(
        &self,
        source: impl Into<String>,
        imports: &[String],
    ) -> Result<RunSummary, DriverError> {
        self.run(source, imports)?.join()
    }
}

/// Handle to an active run
#[derive(Debug)]
pub struct RunHandle {
    thread: JoinHandle<Result<RunSummary, SessionError>>,
    cancel: Arc<AtomicBool>,
    session: Arc<Session>,
}

impl RunHandle {
    /// Stop before the next unit and interrupt the current one
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.session.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run to end
    pub fn join(self) -> Result<RunSummary, DriverError> {
        match self.thread.join() {
            Ok(summary) => Ok(summary?),
            Err(_) => Err(DriverError::WorkerPanicked),
        }
    }
}

/// State moved onto the worker thread
struct Worker {
    session: Arc<Session>,
    console: ConsoleSender,
    style: ReportStyle,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(
        &self,
        source: &str,
        imports: &[String],
    ) -> Result<RunSummary, SessionError> {
        info!(
            "run started: {} bytes, {} preamble imports",
            source.len(),
            imports.len()
        );
        self.session.resume();
        self.inject_imports(imports)?;

        let mut summary = RunSummary::default();
        let mut units = analyze(source);
        for unit in units.by_ref() {
            if self.cancel.load(Ordering::SeqCst) {
                summary.cancelled = true;
                break;
            }
            debug!("evaluating unit at offset {}: {:?}", unit.offset, unit.source);
            let results = self.session.evaluate(unit.source)?;
            summary.units += 1;
            for result in &results {
                summary.record(result);
                report(&self.console, self.style, result);
            }
        }
        summary.remainder = units.remainder().to_string();

        info!(
            "run finished: {} units, {} valid, {} rejected, {} thrown",
            summary.units, summary.valid, summary.rejected, summary.thrown
        );
        Ok(summary)
    }

    /// Evaluate the import preamble without reporting it
    fn inject_imports(
        &self,
        imports: &[String],
    ) -> Result<(), SessionError> {
        if imports.is_empty() {
            return Ok(());
        }
        let preamble: String = imports
            .iter()
            .map(|import| format!("import {};", import))
            .collect();
        for result in self.session.evaluate(&preamble)? {
            if result.is_rejected() {
                for diagnostic in &result.diagnostics {
                    warn!("preamble {} rejected: {}", result.source_text, diagnostic.message);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{console, ConsoleBuffer};

    fn driver() -> (Driver, crossbeam::channel::Receiver<ConsoleEvent>) {
        let (sender, receiver) = console();
        let session = Session::builder()
            .out(sender.writer(crate::console::Stream::Out))
            .err(sender.writer(crate::console::Stream::Err))
            .build()
            .unwrap();
        (Driver::new(Arc::new(session), sender), receiver)
    }

    #[test]
    fn test_run_counts_outcomes() {
        let (driver, receiver) = driver();
        let summary = driver
            .run_blocking("int x = 1;\nx + 1;\ny;\n1 / 0;\nint z =", &[])
            .unwrap();
        assert_eq!(summary.units, 4);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.thrown, 1);
        assert_eq!(summary.remainder.trim(), "int z =");

        let mut buffer = ConsoleBuffer::new();
        buffer.drain(&receiver);
        assert_eq!(buffer.runs_finished(), 1);
        assert!(buffer
            .text()
            .contains("Code evaluation successful at \"x + 1;\" and returned value 2"));
    }

    #[test]
    fn test_preamble_imports_resolve_calls() {
        let (driver, _receiver) = driver();
        let summary = driver
            .run_blocking("sqrt(16.0);", &["math.*".to_string()])
            .unwrap();
        assert_eq!(summary.valid, 1);
        assert_eq!(driver.session().imports(), ["math.*"]);
    }

    #[test]
    fn test_output_order_is_preserved() {
        let (driver, receiver) = driver();
        driver
            .run_blocking(
                "System.out.println(\"one\");\nSystem.out.println(\"two\");",
                &[],
            )
            .unwrap();
        let mut buffer = ConsoleBuffer::new();
        buffer.drain(&receiver);
        let text = buffer.text();
        let one = text.find("one\n").unwrap();
        let first_status = text.find("Code evaluation successful").unwrap();
        let two = text.find("two\n").unwrap();
        assert!(one < first_status && first_status < two);
    }

    #[test]
    fn test_closed_session_is_refused() {
        let (driver, _receiver) = driver();
        driver.session().close().unwrap();
        assert!(matches!(
            driver.run("1;", &[]),
            Err(DriverError::Session(SessionError::Closed))
        ));
        assert!(!driver.is_busy());
    }
}
