//! Console input bridge
//!
//! A single-slot rendezvous between the UI, which submits lines, and the
//! evaluation worker, which blocks in [`ConsoleReader::read_line`]. The
//! `closed` flag is checked before blocking and after every wake, so
//! closing always unblocks a pending read.

use std::io::{self, Read};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::debug;

use super::output::{ConsoleEvent, ConsoleSender};
use crate::session::{InputCloser, InputSource};

/// Errors from submitting input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A previous line has not been consumed yet
    #[error("Input slot is occupied; wait for the next input request")]
    SlotOccupied,

    /// The bridge was closed
    #[error("Console input is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Slot {
    line: Option<String>,
    closed: bool,
    waiting: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl Shared {
    fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        self.ready.notify_all();
    }
}

/// Create a connected input pair
///
/// With a console sender, the reader announces `InputRequested` before
/// it blocks.
pub fn console_input(events: Option<ConsoleSender>) -> (ConsoleInput, ConsoleReader) {
    let shared = Arc::new(Shared::default());
    (
        ConsoleInput {
            shared: shared.clone(),
        },
        ConsoleReader {
            shared,
            events,
            buffered: Vec::new(),
        },
    )
}

/// UI half: submits lines and closes the bridge
#[derive(Debug, Clone)]
pub struct ConsoleInput {
    shared: Arc<Shared>,
}

impl ConsoleInput {
    /// Hand one line to the reader
    pub fn submit(
        &self,
        line: impl Into<String>,
    ) -> Result<(), InputError> {
        let mut slot = self.shared.slot.lock();
        if slot.closed {
            return Err(InputError::Closed);
        }
        if slot.line.is_some() {
            return Err(InputError::SlotOccupied);
        }
        slot.line = Some(line.into());
        self.shared.ready.notify_one();
        Ok(())
    }

    /// Close the bridge; a pending read returns end-of-stream. Idempotent.
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.slot.lock().closed
    }

    /// Whether the reader is blocked waiting for a line
    pub fn is_waiting(&self) -> bool {
        self.shared.slot.lock().waiting
    }
}

/// Worker half: blocking line reads
#[derive(Debug)]
pub struct ConsoleReader {
    shared: Arc<Shared>,
    events: Option<ConsoleSender>,
    /// Bytes of a line not yet returned through `Read`
    buffered: Vec<u8>,
}

impl ConsoleReader {
    /// Block until a line is submitted; `Ok(None)` once closed
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut slot = self.shared.slot.lock();
        if slot.closed {
            return Ok(None);
        }
        if let Some(line) = slot.line.take() {
            return Ok(Some(line));
        }

        if let Some(events) = &self.events {
            events.send(ConsoleEvent::InputRequested);
        }
        debug!("waiting for console input");
        slot.waiting = true;
        let line = loop {
            if slot.closed {
                break None;
            }
            if let Some(line) = slot.line.take() {
                break Some(line);
            }
            self.shared.ready.wait(&mut slot);
        };
        slot.waiting = false;
        Ok(line)
    }
}

impl Read for ConsoleReader {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        if self.buffered.is_empty() {
            match self.read_line()? {
                Some(line) => {
                    self.buffered = line.into_bytes();
                    self.buffered.push(b'\n');
                }
                None => return Ok(0),
            }
        }
        let count = buf.len().min(self.buffered.len());
        buf[..count].copy_from_slice(&self.buffered[..count]);
        self.buffered.drain(..count);
        Ok(count)
    }
}

impl InputSource for ConsoleReader {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        ConsoleReader::read_line(self)
    }

    fn closer(&self) -> Option<InputCloser> {
        let shared = self.shared.clone();
        Some(Box::new(move || shared.close()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::output::console;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_submitted_line_is_read() {
        let (input, mut reader) = console_input(None);
        input.submit("hello").unwrap();
        assert_eq!(input.submit("again"), Err(InputError::SlotOccupied));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("hello"));
        input.submit("again").unwrap();
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("again"));
    }

    #[test]
    fn test_blocked_read_wakes_on_submit() {
        let (sender, receiver) = console();
        let (input, mut reader) = console_input(Some(sender));
        let worker = thread::spawn(move || reader.read_line().unwrap());

        assert_eq!(
            receiver.recv_timeout(Duration::from_secs(5)).unwrap(),
            ConsoleEvent::InputRequested
        );
        input.submit("42").unwrap();
        assert_eq!(worker.join().unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_close_unblocks_pending_read() {
        let (input, mut reader) = console_input(None);
        let closer = reader.closer().unwrap();
        let worker = thread::spawn(move || reader.read_line().unwrap());
        while !input.is_waiting() {
            thread::sleep(Duration::from_millis(1));
        }
        closer();
        assert_eq!(worker.join().unwrap(), None);
        assert_eq!(input.submit("late"), Err(InputError::Closed));
    }

    #[test]
    fn test_read_trait_appends_newline() {
        let (input, mut reader) = console_input(None);
        input.submit("ab").unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ab");
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'\n');
        input.close();
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
