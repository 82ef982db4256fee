//! Session streams
//!
//! Evaluated code writes to two `Write` sinks and reads lines from an
//! [`InputSource`]. Both are supplied when the session is built.

use std::io::{self, BufRead, Write};

/// Hook that makes a pending [`InputSource::read_line`] return end-of-stream
pub type InputCloser = Box<dyn Fn() + Send + Sync>;

/// Line source backing `System.in.readLine()` and `io.readLine()`
pub trait InputSource: Send {
    /// Next line without its terminator, `Ok(None)` at end-of-stream
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Closer the session calls from another thread on `close()`
    fn closer(&self) -> Option<InputCloser> {
        None
    }
}

/// Input that is always at end-of-stream
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(None)
    }
}

/// Input read from any buffered reader (stdin, a file, a byte slice)
#[derive(Debug)]
pub struct ReaderInput<R> {
    reader: R,
}

impl<R: BufRead + Send> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send> InputSource for ReaderInput<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Streams owned by the engine
pub(crate) struct SessionIo {
    pub out: Box<dyn Write + Send>,
    pub err: Box<dyn Write + Send>,
    pub input: Box<dyn InputSource>,
}

impl SessionIo {
    /// Flush both sinks
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_input_strips_terminators() {
        let mut input = ReaderInput::new("first\r\nsecond\nlast".as_bytes());
        assert_eq!(input.read_line().unwrap().as_deref(), Some("first"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(input.read_line().unwrap(), None);
        assert!(input.closer().is_none());
    }
}
