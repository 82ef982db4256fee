//! Application state
//!
//! Owns the panes, the active run and the UI halves of the console
//! bridges. Everything here runs on the UI thread; the evaluation worker
//! only reaches it through console events.

use crossbeam::channel::Receiver;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};
use tracing::{debug, warn};

use crate::console::{ConsoleEvent, ConsoleInput, InputError};
use crate::driver::{Driver, RunHandle};

use super::components::{EditorPane, InputLine, OutputConsole};

/// Pane receiving keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Input,
}

/// User actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Run,
    Cancel,
    Clear,
    SubmitInput,
    SwitchFocus,
}

/// Application state
pub struct App {
    driver: Driver,
    events: Receiver<ConsoleEvent>,
    input: ConsoleInput,
    /// Imports injected before every run
    imports: Vec<String>,
    editor: EditorPane,
    output: OutputConsole,
    input_line: InputLine,
    focus: Focus,
    run: Option<RunHandle>,
    status: String,
}

impl App {
    /// Create the app; the driver's session must read from `input` and
    /// write to the channel behind `events`
    pub fn new(
        driver: Driver,
        events: Receiver<ConsoleEvent>,
        input: ConsoleInput,
        imports: Vec<String>,
    ) -> Self {
        Self {
            driver,
            events,
            input,
            imports,
            editor: EditorPane::new(),
            output: OutputConsole::new(),
            input_line: InputLine::new(),
            focus: Focus::Editor,
            run: None,
            status: "F5 runs the editor contents".to_string(),
        }
    }

    /// Start with `source` in the editor
    pub fn with_source(
        mut self,
        source: &str,
    ) -> Self {
        self.editor.set_text(source);
        self
    }

    pub fn editor(&self) -> &EditorPane {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorPane {
        &mut self.editor
    }

    pub fn output(&self) -> &OutputConsole {
        &self.output
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Handle key events
    pub fn handle_key_event(
        &mut self,
        key: KeyEvent,
    ) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => return Some(Action::Quit),
            KeyCode::Char('c') if ctrl => return Some(Action::Cancel),
            KeyCode::Char('r') if ctrl => return Some(Action::Run),
            KeyCode::F(5) => return Some(Action::Run),
            KeyCode::F(2) => return Some(Action::Clear),
            KeyCode::Tab => return Some(Action::SwitchFocus),
            KeyCode::PageUp => {
                self.output.scroll_up();
                return None;
            }
            KeyCode::PageDown => {
                self.output.scroll_down();
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Editor => {
                self.editor.handle_key(key);
                None
            }
            Focus::Input => match key.code {
                KeyCode::Enter => Some(Action::SubmitInput),
                KeyCode::Backspace => {
                    self.input_line.pop();
                    None
                }
                KeyCode::Char(ch) if !ctrl => {
                    self.input_line.push(ch);
                    None
                }
                KeyCode::Esc => {
                    self.focus = Focus::Editor;
                    None
                }
                _ => None,
            },
        }
    }

    /// Apply an action; returns `false` once the app should exit
    pub fn perform(
        &mut self,
        action: Action,
    ) -> bool {
        match action {
            Action::Quit => {
                self.shutdown();
                return false;
            }
            Action::Run => self.start_run(),
            Action::Cancel => self.cancel_run(),
            Action::Clear => self.output.clear(),
            Action::SubmitInput => self.submit_input(),
            Action::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Editor => Focus::Input,
                    Focus::Input => Focus::Editor,
                }
            }
        }
        true
    }

    pub fn scroll_output(
        &mut self,
        up: bool,
    ) {
        if up {
            self.output.scroll_up();
        } else {
            self.output.scroll_down();
        }
    }

    /// Run the editor contents
    pub fn start_run(&mut self) {
        if self.run.is_some() {
            self.status = "A run is already in progress".to_string();
            return;
        }
        match self.driver.run(self.editor.text(), &self.imports) {
            Ok(handle) => {
                debug!("run started from the editor");
                self.run = Some(handle);
                self.status = "Running... (Ctrl+C cancels)".to_string();
            }
            Err(err) => {
                warn!("could not start run: {}", err);
                self.status = err.to_string();
            }
        }
    }

    pub fn cancel_run(&mut self) {
        if let Some(handle) = &self.run {
            handle.cancel();
            self.status = "Cancelling...".to_string();
        }
    }

    /// Hand the input line to evaluated code
    pub fn submit_input(&mut self) {
        let line = self.input_line.take();
        match self.input.submit(line.clone()) {
            Ok(()) => {
                self.output
                    .buffer_mut()
                    .apply(ConsoleEvent::Output(format!("{}\n", line)));
                self.focus = Focus::Editor;
            }
            Err(InputError::SlotOccupied) => {
                self.input_line.restore(line);
                self.status = "Previous input not read yet".to_string();
            }
            Err(err) => {
                self.input_line.restore(line);
                self.status = err.to_string();
            }
        }
    }

    /// Apply console events and reap a finished run
    pub fn tick(&mut self) {
        self.output.drain(&self.events);

        if self.output.buffer().input_requested() {
            self.output.buffer_mut().acknowledge_input();
            self.focus = Focus::Input;
        }

        if self.run.as_ref().is_some_and(RunHandle::is_finished) {
            if let Some(handle) = self.run.take() {
                self.status = match handle.join() {
                    Ok(summary) => format!(
                        "{} {}: {} valid, {} rejected, {} thrown",
                        if summary.cancelled { "Cancelled after" } else { "Ran" },
                        plural(summary.units, "unit"),
                        summary.valid,
                        summary.rejected,
                        summary.thrown
                    ),
                    Err(err) => {
                        warn!("run failed: {}", err);
                        err.to_string()
                    }
                };
            }
            // Events sent after the last drain
            self.output.drain(&self.events);
        }
    }

    /// Close the session and wait for the active run
    pub fn shutdown(&mut self) {
        if let Some(handle) = &self.run {
            handle.cancel();
        }
        self.input.close();
        if let Err(err) = self.driver.session().close() {
            warn!("closing session: {}", err);
        }
        if let Some(handle) = self.run.take() {
            if let Err(err) = handle.join() {
                debug!("run ended on shutdown: {}", err);
            }
        }
    }

    /// Render the app
    pub fn render(
        &mut self,
        f: &mut Frame<'_>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(0),    // Editor and output
                Constraint::Length(3), // Input line
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_title_bar(f, chunks[0]);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        self.editor.render(f, panes[0], self.focus == Focus::Editor);
        self.output.render(f, panes[1]);

        let waiting = self.input.is_waiting();
        self.input_line
            .render(f, chunks[2], self.focus == Focus::Input, waiting);

        f.render_widget(
            Paragraph::new(Span::styled(
                format!(" {}", self.status),
                Style::default().fg(Color::Gray),
            ))
            .style(Style::default().bg(Color::Rgb(30, 30, 30))),
            chunks[3],
        );
    }

    fn render_title_bar(
        &self,
        f: &mut Frame<'_>,
        area: Rect,
    ) {
        let title = "  snippad  ";
        let help = "  F5:Run | F2:Clear | Tab:Focus | Ctrl+C:Cancel | Ctrl+Q:Quit  ";

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(help.len() as u16)])
            .split(area);

        f.render_widget(
            Paragraph::new(Span::styled(
                title,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .style(Style::default().bg(Color::Rgb(50, 50, 50)))
            .alignment(Alignment::Left),
            chunks[0],
        );

        f.render_widget(
            Paragraph::new(Span::styled(help, Style::default().fg(Color::Cyan)))
                .style(Style::default().bg(Color::Rgb(50, 50, 50)))
                .alignment(Alignment::Right),
            chunks[1],
        );
    }
}

fn plural(
    count: usize,
    noun: &str,
) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
