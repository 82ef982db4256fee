//! Terminal editor
//!
//! A ratatui front end: editor pane, output pane and input line. The UI
//! loop owns the display buffer and drains console events on every tick.

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

pub mod app;
pub mod components;

pub use app::{Action, App, Focus};

/// Terminal editor main structure
pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: App,
    restored: bool,
}

impl Tui {
    /// Switch the terminal to raw mode and the alternate screen
    pub fn new(app: App) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            app,
            restored: false,
        })
    }

    /// Run until the user quits
    pub fn run(&mut self) -> io::Result<()> {
        let tick_rate = Duration::from_millis(50);
        let mut last_tick = Instant::now();

        loop {
            self.app.tick();
            self.terminal.draw(|f| self.app.render(f))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                let action = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.app.handle_key_event(key)
                    }
                    Event::Mouse(mouse) => {
                        match mouse.kind {
                            MouseEventKind::ScrollUp => self.app.scroll_output(true),
                            MouseEventKind::ScrollDown => self.app.scroll_output(false),
                            _ => {}
                        }
                        None
                    }
                    _ => None,
                };
                if let Some(action) = action {
                    if !self.app.perform(action) {
                        return self.quit();
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
            }
        }
    }

    /// Restore the terminal
    fn quit(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        self.app.shutdown();
        let _ = self.quit();
    }
}
