//! Console bridges between the evaluation worker and the UI thread

pub mod input;
pub mod output;
pub mod terminal;

pub use input::{console_input, ConsoleInput, ConsoleReader, InputError};
pub use output::{
    console, ConsoleBuffer, ConsoleEvent, ConsoleSender, ConsoleWriter, Segment, Stream, Tone,
};
pub use terminal::TerminalPrinter;
