//! TUI components

pub mod editor;
pub mod input_line;
pub mod output_console;

pub use editor::EditorPane;
pub use input_line::InputLine;
pub use output_console::OutputConsole;
