/// Input line component
///
/// One line of text handed to evaluated code that reads from the console.
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Input line
#[derive(Debug, Default)]
pub struct InputLine {
    text: String,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push(
        &mut self,
        ch: char,
    ) {
        self.text.push(ch);
    }

    pub fn pop(&mut self) {
        self.text.pop();
    }

    /// Take the line, leaving it empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Put back a line that could not be submitted
    pub fn restore(
        &mut self,
        text: String,
    ) {
        self.text = text;
    }

    /// Render input line
    pub fn render(
        &self,
        f: &mut Frame<'_>,
        area: Rect,
        focused: bool,
        waiting: bool,
    ) {
        let (title, border) = match (waiting, focused) {
            (true, _) => (" Input (program is waiting) ", Style::default().fg(Color::Yellow)),
            (false, true) => (" Input ", Style::default().fg(Color::Cyan)),
            (false, false) => (" Input ", Style::default()),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let prompt = "> ";
        f.render_widget(Paragraph::new(format!("{}{}", prompt, self.text)), inner);

        if focused {
            let x = inner.x + (prompt.len() + self.text.chars().count()) as u16;
            if x < inner.right() && inner.height > 0 {
                f.set_cursor_position((x, inner.y));
            }
        }
    }
}
