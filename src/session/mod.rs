//! Evaluation session
//!
//! A [`Session`] keeps the variables, methods, imports and classpath
//! libraries accumulated by the snippets evaluated in it. It is safe to
//! share between threads: evaluations are serialized, while `close()` may
//! be called from any thread to interrupt a running evaluation.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::frontend::check::{check_top_level, Checked, Ty};
use crate::frontend::parse_unit;
use crate::frontend::parser::ast::{Stmt, StmtKind};

pub mod error;
pub mod interp;
pub mod io;
pub mod library;
pub mod natives;
pub mod result;
mod state;
pub mod value;

pub use error::{ClasspathError, SessionError, SessionResult};
pub use io::{InputCloser, InputSource, NoInput, ReaderInput};
pub use result::{class, Diagnostic, Outcome, SnippetResult, Status, ThrownError};
pub use value::Value;

use interp::Interpreter;
use io::SessionIo;
use state::{SessionEnv, SessionState};

/// Builder for [`Session`]
#[derive(Default)]
pub struct SessionBuilder {
    out: Option<Box<dyn Write + Send>>,
    err: Option<Box<dyn Write + Send>>,
    input: Option<Box<dyn InputSource>>,
    classpath: Vec<PathBuf>,
}

impl SessionBuilder {
    /// Sink for `System.out` and `io.print*`; defaults to stdout
    pub fn out(
        mut self,
        out: impl Write + Send + 'static,
    ) -> Self {
        self.out = Some(Box::new(out));
        self
    }

    /// Sink for `System.err`; defaults to stderr
    pub fn err(
        mut self,
        err: impl Write + Send + 'static,
    ) -> Self {
        self.err = Some(Box::new(err));
        self
    }

    /// Line source for `readLine`; defaults to [`NoInput`]
    pub fn input(
        mut self,
        input: impl InputSource + 'static,
    ) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Add one classpath entry, loaded by [`build`](Self::build)
    pub fn classpath_entry(
        mut self,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.classpath.push(path.into());
        self
    }

    pub fn classpath<P: Into<PathBuf>>(
        mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> Self {
        self.classpath.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Create the session, failing on the first classpath entry that
    /// cannot be loaded
    pub fn build(self) -> SessionResult<Session> {
        let input = self.input.unwrap_or_else(|| Box::new(NoInput));
        let input_closer = input.closer();
        let session = Session {
            engine: Mutex::new(Engine {
                state: SessionState::default(),
                io: SessionIo {
                    out: self.out.unwrap_or_else(|| Box::new(std::io::stdout())),
                    err: self.err.unwrap_or_else(|| Box::new(std::io::stderr())),
                    input,
                },
            }),
            interrupt: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            input_closer,
        };
        for entry in &self.classpath {
            session.add_classpath_entry(entry)?;
        }
        info!("session ready");
        Ok(session)
    }
}

/// State and streams guarded by the session lock
struct Engine {
    state: SessionState,
    io: SessionIo,
}

/// Stateful evaluation context
pub struct Session {
    engine: Mutex<Engine>,
    interrupt: AtomicBool,
    closed: AtomicBool,
    input_closer: Option<InputCloser>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Evaluate one complete unit, returning one result per statement
    ///
    /// Blocks until the unit has run. Output written by the unit is flushed
    /// before this returns. Deep recursion needs a caller thread with a
    /// generous stack; the driver's worker thread has one.
    pub fn evaluate(
        &self,
        source: &str,
    ) -> SessionResult<Vec<SnippetResult>> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let mut engine = self.engine.lock();
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let stmts = match parse_unit(source) {
            Ok(stmts) => stmts,
            Err(diagnostics) => {
                debug!("unit rejected by parser: {:?}", source);
                return Ok(vec![SnippetResult::rejected(source.trim(), diagnostics)]);
            }
        };

        let mut results = Vec::with_capacity(stmts.len());
        for stmt in &stmts {
            engine.evaluate(source, stmt, &self.interrupt, &mut results);
        }
        // A stop is consumed by the evaluation it interrupted
        self.interrupt.store(false, Ordering::SeqCst);
        engine.io.flush()?;
        Ok(results)
    }

    /// Load a classpath entry; `Ok(false)` if it is already present
    pub fn add_classpath_entry(
        &self,
        path: impl AsRef<Path>,
    ) -> SessionResult<bool> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let path = std::path::absolute(path.as_ref()).map_err(|source| ClasspathError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;

        let mut engine = self.engine.lock();
        if engine.state.classpath.contains(&path) {
            return Ok(false);
        }
        let libraries = library::load_entry(&path, &engine.state.libraries)?;
        for library in libraries {
            engine
                .state
                .libraries
                .insert(library.package.clone(), library);
        }
        info!("added classpath entry {}", path.display());
        engine.state.classpath.insert(path);
        Ok(true)
    }

    /// Interrupt the running evaluation, or the next one if none is running
    ///
    /// The evaluation ends with an `InterruptedException` at its next loop
    /// iteration or call.
    pub fn stop(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    /// Drop a pending [`stop`](Self::stop) that no evaluation consumed
    pub fn resume(&self) {
        self.interrupt.store(false, Ordering::SeqCst);
    }

    /// Close the session. Idempotent.
    ///
    /// Interrupts a running evaluation and unblocks a pending input read,
    /// then waits for the evaluation to finish and releases the streams.
    pub fn close(&self) -> SessionResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.stop();
        if let Some(closer) = &self.input_closer {
            closer();
        }

        let mut engine = self.engine.lock();
        let mut streams = std::mem::replace(
            &mut engine.io,
            SessionIo {
                out: Box::new(std::io::sink()),
                err: Box::new(std::io::sink()),
                input: Box::new(NoInput),
            },
        );
        engine.state = SessionState::default();
        drop(engine);

        let flushed = streams.flush();
        if let Err(err) = &flushed {
            warn!("flushing session streams on close failed: {}", err);
        }
        info!("session closed");
        Ok(flushed?)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// `type name = value` for every session variable
    pub fn variables(&self) -> Vec<String> {
        let engine = self.engine.lock();
        engine
            .state
            .variables
            .iter()
            .map(|(name, variable)| format!("{} {} = {}", variable.ty, name, variable.value.echo()))
            .collect()
    }

    /// Signatures of the session methods
    pub fn methods(&self) -> Vec<String> {
        let engine = self.engine.lock();
        engine
            .state
            .methods
            .values()
            .map(|method| method.signature())
            .collect()
    }

    /// Active imports, `pkg.*` or `pkg.member`
    pub fn imports(&self) -> Vec<String> {
        let engine = self.engine.lock();
        engine.state.imports.iter().map(ToString::to_string).collect()
    }

    /// Loaded classpath entries in load order
    pub fn classpath(&self) -> Vec<PathBuf> {
        let engine = self.engine.lock();
        engine.state.classpath.iter().cloned().collect()
    }

    /// Packages contributed by classpath libraries
    pub fn packages(&self) -> Vec<String> {
        let engine = self.engine.lock();
        engine.state.libraries.keys().cloned().collect()
    }
}

impl fmt::Debug for Session {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Session")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!("close on drop: {}", err);
        }
    }
}

impl Engine {
    /// Evaluate one parsed statement of `unit`
    ///
    /// A compound declaration yields one result per declarator.
    fn evaluate(
        &mut self,
        unit: &str,
        stmt: &Stmt,
        interrupt: &AtomicBool,
        results: &mut Vec<SnippetResult>,
    ) {
        match &stmt.kind {
            StmtKind::VarDecl {
                ty,
                ty_span,
                declarators,
            } if declarators.len() > 1 => {
                let ty_text = unit.get(ty_span.range()).unwrap_or_default();
                for declarator in declarators {
                    let single = Stmt {
                        kind: StmtKind::VarDecl {
                            ty: *ty,
                            ty_span: *ty_span,
                            declarators: vec![declarator.clone()],
                        },
                        span: declarator.span,
                    };
                    let declarator_text = unit.get(declarator.span.range()).unwrap_or_default();
                    let source = format!("{} {};", ty_text, declarator_text);
                    results.push(self.evaluate_one(&single, source, interrupt));
                }
            }
            _ => {
                let source = unit.get(stmt.span.range()).unwrap_or(unit).trim().to_string();
                results.push(self.evaluate_one(stmt, source, interrupt));
            }
        }
    }

    fn evaluate_one(
        &mut self,
        stmt: &Stmt,
        source: String,
        interrupt: &AtomicBool,
    ) -> SnippetResult {
        let checked = match check_top_level(&SessionEnv { state: &self.state }, stmt) {
            Ok(checked) => checked,
            Err(diagnostics) => {
                debug!("rejected {:?}: {} diagnostics", source, diagnostics.len());
                return SnippetResult::rejected(source, diagnostics);
            }
        };

        let outcome = match (checked, &stmt.kind) {
            (Checked::Method, StmtKind::Method(method)) => {
                self.state.define_method(method.clone());
                Ok(None)
            }
            (Checked::Import, StmtKind::Import(import)) => {
                self.state.imports.insert(import.clone());
                Ok(None)
            }
            (Checked::Variables(types), StmtKind::VarDecl { declarators, .. }) => {
                let mut interp = Interpreter::new(&mut self.state, &mut self.io, interrupt);
                declarators.iter().try_for_each(|declarator| {
                    let ty = types
                        .iter()
                        .find(|(name, _)| *name == declarator.name)
                        .map(|(_, ty)| *ty)
                        .unwrap_or(Ty::Void);
                    interp.declare(&declarator.name, ty, declarator.init.as_ref())
                })
                .map(|_| None)
            }
            (Checked::Expr(ty), StmtKind::Expr(expr)) => {
                let mut interp = Interpreter::new(&mut self.state, &mut self.io, interrupt);
                interp.eval_top(expr).map(|value| match ty {
                    Ty::Void => None,
                    _ => Some(value.echo()),
                })
            }
            _ => Interpreter::new(&mut self.state, &mut self.io, interrupt)
                .run(stmt)
                .map(|_| None),
        };

        match outcome {
            Ok(value) => SnippetResult::valid(source, value),
            Err(thrown) => {
                debug!("{:?} threw {}", source, thrown);
                SnippetResult::thrown(source, thrown)
            }
        }
    }
}
