//! Line-based REPL with rustyline
//!
//! Lines are collected until the completeness analyzer accepts them, then
//! every complete unit is handed to the driver. An unfinished statement
//! keeps the continuation prompt up; it is never evaluated.

use std::io;
use std::sync::Arc;

use crossbeam::channel::Receiver;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{CompletionType, EditMode, Editor};
use thiserror::Error;
use tracing::{debug, warn};

use crate::console::{ConsoleEvent, ConsoleSender, TerminalPrinter};
use crate::driver::{Driver, DriverError, ReportStyle};
use crate::frontend::{analyze, CompletionKind};
use crate::session::Session;
use crate::util::config::ReplConfig;

pub mod commands;

pub use commands::{CommandHandler, CommandResult};

/// REPL errors
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("Readline error: {0}")]
    Readline(#[from] ReadlineError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Console error: {0}")]
    Io(#[from] io::Error),
}

/// Input split into the part ready to run and the part still being typed
#[derive(Debug, PartialEq, Eq)]
pub struct Pending<'a> {
    /// Complete units, empty if there are none
    pub ready: &'a str,
    /// Incomplete trailing text
    pub rest: &'a str,
}

/// Split buffered input at the end of its last complete unit
pub fn split_pending(buffer: &str) -> Pending<'_> {
    let mut units = analyze(buffer);
    let end = units
        .by_ref()
        .last()
        .map(|unit| unit.offset + unit.source.len())
        .unwrap_or(0);
    let rest = match units.remainder_kind() {
        CompletionKind::Incomplete => units.remainder().trim_start(),
        _ => "",
    };
    Pending {
        ready: &buffer[..end],
        rest,
    }
}

/// Line REPL
pub struct Repl {
    config: ReplConfig,
    editor: Editor<(), FileHistory>,
    driver: Driver,
    events: Receiver<ConsoleEvent>,
    printer: TerminalPrinter<io::Stdout, io::Stderr>,
    /// Imports injected before every evaluation
    imports: Vec<String>,
}

impl Repl {
    /// Create a REPL over `session`, whose streams must write to `console`
    pub fn new(
        session: Arc<Session>,
        console: ConsoleSender,
        events: Receiver<ConsoleEvent>,
        imports: Vec<String>,
        config: ReplConfig,
        colors: bool,
    ) -> Result<Self, ReplError> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(rl_config)?;

        // Load history if file exists
        if let Some(ref history_file) = config.history_file {
            if history_file.exists() {
                if let Err(err) = editor.load_history(history_file) {
                    warn!("could not load history {}: {}", history_file.display(), err);
                }
            }
        }

        Ok(Self {
            config,
            editor,
            driver: Driver::new(session, console).with_style(ReportStyle::Echo),
            events,
            printer: TerminalPrinter::stdio(colors, false),
            imports,
        })
    }

    /// Run the REPL until `:quit` or end of input
    pub fn run(&mut self) -> Result<(), ReplError> {
        println!("snippad REPL - Type :help for assistance");
        println!("Press Ctrl+D or :quit to exit\n");

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                self.config.prompt.clone()
            } else {
                self.config.continuation_prompt.clone()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    // Handle commands
                    if buffer.is_empty() && line.trim_start().starts_with(':') {
                        self.editor.add_history_entry(line.as_str())?;
                        let handler = CommandHandler::new(self.driver.session(), &self.imports);
                        match handler.handle(&line) {
                            CommandResult::Exit => break,
                            CommandResult::ClearScreen => self.editor.clear_screen()?,
                            CommandResult::Output(msg) => {
                                if !msg.is_empty() {
                                    println!("{}", msg);
                                }
                            }
                        }
                        continue;
                    }

                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    buffer.push_str(&line);

                    let pending = split_pending(&buffer);
                    if !pending.ready.is_empty() {
                        self.editor.add_history_entry(pending.ready)?;
                        self.evaluate(pending.ready)?;
                    }
                    buffer = pending.rest.to_string();
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl-D pressed
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C drops the unfinished statement
                    if !buffer.is_empty() {
                        buffer.clear();
                        println!("(Input discarded)");
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Save history
        if let Some(ref history_file) = self.config.history_file {
            if let Err(err) = self.editor.save_history(history_file) {
                warn!("could not save history {}: {}", history_file.display(), err);
            }
        }

        Ok(())
    }

    /// Run complete units and print their events until the run finishes
    fn evaluate(
        &mut self,
        source: &str,
    ) -> Result<(), ReplError> {
        debug!("repl evaluating {:?}", source);
        let handle = self.driver.run(source, &self.imports)?;
        for event in self.events.iter() {
            self.printer.print(&event)?;
            if event == ConsoleEvent::RunFinished {
                break;
            }
        }
        let summary = handle.join()?;
        debug!(
            "repl run: {} valid, {} rejected, {} thrown",
            summary.valid, summary.rejected, summary.thrown
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pending_keeps_unfinished_statement() {
        let pending = split_pending("int x = 1;\nint sq(int n) {\n  return n * n;");
        assert_eq!(pending.ready, "int x = 1;");
        assert_eq!(pending.rest, "int sq(int n) {\n  return n * n;");
    }

    #[test]
    fn test_split_pending_complete_input() {
        let pending = split_pending("x + 1");
        assert_eq!(pending.ready, "x + 1");
        assert_eq!(pending.rest, "");

        let pending = split_pending("  // just a comment");
        assert_eq!(pending.ready, "");
        assert_eq!(pending.rest, "");
    }

    #[test]
    fn test_split_pending_only_incomplete() {
        let pending = split_pending("int x =");
        assert_eq!(pending.ready, "");
        assert_eq!(pending.rest, "int x =");
    }
}
