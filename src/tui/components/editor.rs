//! Editor pane
//!
//! A plain multi-line text buffer with a cursor. Columns count chars, not
//! bytes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Width of the line number gutter
const GUTTER: u16 = 5;

/// Source editor
#[derive(Debug, Clone)]
pub struct EditorPane {
    lines: Vec<String>,
    row: usize,
    col: usize,
    /// First visible line
    scroll: usize,
}

impl Default for EditorPane {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_index(
    line: &str,
    col: usize,
) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(index, _)| index)
        .unwrap_or(line.len())
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

impl EditorPane {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            scroll: 0,
        }
    }

    /// Replace the contents, cursor at the start
    pub fn set_text(
        &mut self,
        text: &str,
    ) {
        self.lines = text.split('\n').map(|line| line.trim_end_matches('\r').to_string()).collect();
        self.row = 0;
        self.col = 0;
        self.scroll = 0;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Cursor as (line, column), both from zero
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn insert_char(
        &mut self,
        ch: char,
    ) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        let line = &mut self.lines[self.row];
        let index = byte_index(line, self.col);
        line.insert(index, ch);
        self.col += 1;
    }

    /// Split the line at the cursor, keeping the indentation
    pub fn insert_newline(&mut self) {
        let line = &mut self.lines[self.row];
        let index = byte_index(line, self.col);
        let rest = line.split_off(index);
        let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        self.col = char_len(&indent);
        self.row += 1;
        self.lines.insert(self.row, indent + &rest);
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let index = byte_index(line, self.col - 1);
            line.remove(index);
            self.col -= 1;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
            self.lines[self.row].push_str(&line);
        }
    }

    pub fn delete(&mut self) {
        let len = char_len(&self.lines[self.row]);
        if self.col < len {
            let line = &mut self.lines[self.row];
            let index = byte_index(line, self.col);
            line.remove(index);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < char_len(&self.lines[self.row]) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(char_len(&self.lines[self.row]));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(char_len(&self.lines[self.row]));
        }
    }

    /// Apply an editing key; returns whether the key was used
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
    ) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char(ch) => self.insert_char(ch),
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Home => self.col = 0,
            KeyCode::End => self.col = char_len(&self.lines[self.row]),
            _ => return false,
        }
        true
    }

    /// Render the editor
    pub fn render(
        &mut self,
        f: &mut Frame<'_>,
        area: Rect,
        focused: bool,
    ) {
        let border = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Editor ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        // Keep the cursor line visible
        let height = inner.height as usize;
        if height > 0 {
            if self.row < self.scroll {
                self.scroll = self.row;
            } else if self.row >= self.scroll + height {
                self.scroll = self.row + 1 - height;
            }
        }

        let gutter = Style::default().fg(Color::DarkGray);
        let lines: Vec<Line<'_>> = self
            .lines
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(height)
            .map(|(number, text)| {
                Line::from(vec![
                    Span::styled(format!("{:>4} ", number + 1), gutter),
                    Span::raw(text.as_str()),
                ])
            })
            .collect();
        f.render_widget(Paragraph::new(lines), inner);

        if focused {
            let x = inner.x + GUTTER + self.col as u16;
            let y = inner.y + (self.row - self.scroll) as u16;
            if x < inner.right() && y < inner.bottom() {
                f.set_cursor_position((x, y));
            }
        }
    }
}
