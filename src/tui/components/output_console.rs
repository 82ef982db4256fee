/// Output console component
///
/// Shows the console buffer, styled by tone, following the newest output
/// until the user scrolls away.
use crossbeam::channel::Receiver;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::console::{ConsoleBuffer, ConsoleEvent, Tone};

/// Output console
#[derive(Debug, Default)]
pub struct OutputConsole {
    buffer: ConsoleBuffer,
    /// First visible line
    scroll: u16,
    /// Stick to the last line
    follow: bool,
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Output => Style::default().fg(Color::White),
        Tone::Error => Style::default().fg(Color::Red),
        Tone::Status => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        Tone::Diagnostic => Style::default().fg(Color::Yellow),
    }
}

impl OutputConsole {
    pub fn new() -> Self {
        Self {
            buffer: ConsoleBuffer::new(),
            scroll: 0,
            follow: true,
        }
    }

    pub fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ConsoleBuffer {
        &mut self.buffer
    }

    /// Apply pending console events
    pub fn drain(
        &mut self,
        events: &Receiver<ConsoleEvent>,
    ) -> usize {
        self.buffer.drain(events)
    }

    /// Clear output
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scroll = 0;
        self.follow = true;
    }

    /// Scroll up
    pub fn scroll_up(&mut self) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Scroll down; reaching the end resumes following
    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    /// Render output console
    pub fn render(
        &mut self,
        f: &mut Frame<'_>,
        area: Rect,
    ) {
        let block = Block::default().borders(Borders::ALL).title(" Output ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let lines: Vec<Line<'_>> = self
            .buffer
            .lines()
            .into_iter()
            .map(|segments| {
                Line::from(
                    segments
                        .into_iter()
                        .map(|segment| Span::styled(segment.text, tone_style(segment.tone)))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let bottom = lines.len().saturating_sub(inner.height as usize) as u16;
        if self.follow || self.scroll >= bottom {
            self.scroll = bottom;
            self.follow = true;
        }

        f.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), inner);
    }
}
