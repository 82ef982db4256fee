//! Console events printed straight to a terminal
//!
//! Used by the command-line and line REPL front ends, which have no
//! display buffer of their own.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use super::output::ConsoleEvent;

/// Writes console events to an output and an error stream
pub struct TerminalPrinter<O, E> {
    out: O,
    err: E,
    colors: bool,
    status_lines: bool,
    /// The last text written to `out` did not end with a newline
    mid_line: bool,
}

impl TerminalPrinter<io::Stdout, io::Stderr> {
    /// Printer for the process's stdout and stderr
    pub fn stdio(
        colors: bool,
        status_lines: bool,
    ) -> Self {
        Self::new(io::stdout(), io::stderr(), colors, status_lines)
    }
}

impl<O: Write, E: Write> TerminalPrinter<O, E> {
    pub fn new(
        out: O,
        err: E,
        colors: bool,
        status_lines: bool,
    ) -> Self {
        Self {
            out,
            err,
            colors,
            status_lines,
            mid_line: false,
        }
    }

    /// Print one event
    pub fn print(
        &mut self,
        event: &ConsoleEvent,
    ) -> io::Result<()> {
        match event {
            ConsoleEvent::Output(text) => {
                self.out.write_all(text.as_bytes())?;
                self.out.flush()?;
                if !text.is_empty() {
                    self.mid_line = !text.ends_with('\n');
                }
            }
            ConsoleEvent::Error(text) => {
                self.fresh_line()?;
                if self.colors {
                    write!(self.err, "{}", text.red())?;
                } else {
                    self.err.write_all(text.as_bytes())?;
                }
                self.err.flush()?;
            }
            ConsoleEvent::Status(line) => {
                if !self.status_lines {
                    return Ok(());
                }
                self.fresh_line()?;
                if self.colors {
                    writeln!(self.out, "{}", line.dimmed())?;
                } else {
                    writeln!(self.out, "{}", line)?;
                }
                self.out.flush()?;
            }
            ConsoleEvent::Diagnostic(line) => {
                self.fresh_line()?;
                if self.colors {
                    writeln!(self.err, "{}", line.yellow())?;
                } else {
                    writeln!(self.err, "{}", line)?;
                }
                self.err.flush()?;
            }
            ConsoleEvent::InputRequested | ConsoleEvent::RunFinished => {}
        }
        Ok(())
    }

    /// Finish a partial output line before a line-oriented message
    fn fresh_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            self.out.write_all(b"\n")?;
            self.out.flush()?;
            self.mid_line = false;
        }
        Ok(())
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}
