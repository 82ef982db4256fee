//! Console output bridge
//!
//! The evaluation worker never touches the display buffer. Every write is
//! sent as a [`ConsoleEvent`] over an unbounded channel and applied by the
//! UI loop with [`ConsoleBuffer::drain`], so the buffer sees writes in the
//! order they were made.

use std::io::{self, Write};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::trace;

/// Message from the worker to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// Text written to the output sink
    Output(String),
    /// Text written to the error sink
    Error(String),
    /// Engine status line
    Status(String),
    /// Diagnostic line for a rejected snippet
    Diagnostic(String),
    /// Evaluated code is blocked waiting for a line of input
    InputRequested,
    /// The run ended; sent exactly once per run
    RunFinished,
}

/// Which sink a [`ConsoleWriter`] stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

/// Create a console channel
pub fn console() -> (ConsoleSender, Receiver<ConsoleEvent>) {
    let (sender, receiver) = channel::unbounded();
    (ConsoleSender { sender }, receiver)
}

/// Worker half of the console channel
#[derive(Debug, Clone)]
pub struct ConsoleSender {
    sender: Sender<ConsoleEvent>,
}

impl ConsoleSender {
    /// Send an event; events for a UI that has gone away are dropped
    pub fn send(
        &self,
        event: ConsoleEvent,
    ) {
        if let Err(err) = self.sender.send(event) {
            trace!("console receiver gone, dropping {:?}", err.into_inner());
        }
    }

    pub fn status(
        &self,
        line: impl Into<String>,
    ) {
        self.send(ConsoleEvent::Status(line.into()));
    }

    pub fn diagnostic(
        &self,
        line: impl Into<String>,
    ) {
        self.send(ConsoleEvent::Diagnostic(line.into()));
    }

    /// Writer that forwards bytes as `Output` or `Error` events
    pub fn writer(
        &self,
        stream: Stream,
    ) -> ConsoleWriter {
        ConsoleWriter {
            sender: self.clone(),
            stream,
            pending: Vec::new(),
        }
    }
}

/// `Write` sink backed by the console channel
///
/// Decodes UTF-8 incrementally: a character split across two writes is
/// held back until it is complete. Invalid bytes become U+FFFD.
#[derive(Debug)]
pub struct ConsoleWriter {
    sender: ConsoleSender,
    stream: Stream,
    pending: Vec<u8>,
}

impl ConsoleWriter {
    fn decode(&mut self) -> String {
        let mut text = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending.clear();
                    return text;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        // Truncated sequence at the end: wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            return text;
                        }
                    }
                }
            }
        }
    }

    fn emit(
        &self,
        text: String,
    ) {
        if text.is_empty() {
            return;
        }
        let event = match self.stream {
            Stream::Out => ConsoleEvent::Output(text),
            Stream::Err => ConsoleEvent::Error(text),
        };
        self.sender.send(event);
    }
}

impl Write for ConsoleWriter {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let text = self.decode();
        self.emit(text);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            self.pending.clear();
            self.emit(char::REPLACEMENT_CHARACTER.to_string());
        }
    }
}

/// Style of a piece of buffered text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Output,
    Error,
    Status,
    Diagnostic,
}

/// Run of text with one tone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tone: Tone,
    pub text: String,
}

/// UI-owned display buffer; append-only until cleared
#[derive(Debug, Default)]
pub struct ConsoleBuffer {
    segments: Vec<Segment>,
    input_requested: bool,
    runs_finished: usize,
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event
    pub fn apply(
        &mut self,
        event: ConsoleEvent,
    ) {
        match event {
            ConsoleEvent::Output(text) => self.append(Tone::Output, &text),
            ConsoleEvent::Error(text) => self.append(Tone::Error, &text),
            ConsoleEvent::Status(line) => self.append_line(Tone::Status, &line),
            ConsoleEvent::Diagnostic(line) => self.append_line(Tone::Diagnostic, &line),
            ConsoleEvent::InputRequested => self.input_requested = true,
            ConsoleEvent::RunFinished => {
                self.input_requested = false;
                self.runs_finished += 1;
            }
        }
    }

    /// Apply every pending event without blocking; returns how many
    pub fn drain(
        &mut self,
        receiver: &Receiver<ConsoleEvent>,
    ) -> usize {
        let mut applied = 0;
        while let Ok(event) = receiver.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn append(
        &mut self,
        tone: Tone,
        text: &str,
    ) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(last) if last.tone == tone => last.text.push_str(text),
            _ => self.segments.push(Segment {
                tone,
                text: text.to_string(),
            }),
        }
    }

    /// Whole-line events start on a fresh line
    fn append_line(
        &mut self,
        tone: Tone,
        line: &str,
    ) {
        let mid_line = self
            .segments
            .last()
            .is_some_and(|last| !last.text.ends_with('\n'));
        if mid_line {
            self.append(Tone::Output, "\n");
        }
        self.append(tone, line);
        self.append(tone, "\n");
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Buffered text without styling
    pub fn text(&self) -> String {
        self.segments.iter().map(|segment| segment.text.as_str()).collect()
    }

    /// Buffered text split into display lines
    pub fn lines(&self) -> Vec<Vec<Segment>> {
        let mut lines = vec![Vec::new()];
        for segment in &self.segments {
            let mut parts = segment.text.split('\n').peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    if let Some(line) = lines.last_mut() {
                        line.push(Segment {
                            tone: segment.tone,
                            text: part.to_string(),
                        });
                    }
                }
                if parts.peek().is_some() {
                    lines.push(Vec::new());
                }
            }
        }
        if lines.last().is_some_and(Vec::is_empty) {
            lines.pop();
        }
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether evaluated code is waiting for input
    pub fn input_requested(&self) -> bool {
        self.input_requested
    }

    /// Mark a pending input request as answered
    pub fn acknowledge_input(&mut self) {
        self.input_requested = false;
    }

    pub fn runs_finished(&self) -> usize {
        self.runs_finished
    }
}
