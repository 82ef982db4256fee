//! Snippet result model
//!
//! One [`SnippetResult`] per evaluated statement (one per declarator for a
//! compound declaration). Results are plain data and never change once the
//! session has produced them.

use std::fmt;

pub use crate::util::diagnostic::Diagnostic;

/// Compile-time status of a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Accepted and executed (possibly throwing)
    Valid,
    /// Refused before execution; session state is unchanged
    Rejected,
}

/// Exception class names raised by the interpreter
pub mod class {
    pub const ARITHMETIC: &str = "ArithmeticException";
    pub const NUMBER_FORMAT: &str = "NumberFormatException";
    pub const NULL_POINTER: &str = "NullPointerException";
    pub const STACK_OVERFLOW: &str = "StackOverflowError";
    pub const RUNTIME: &str = "RuntimeException";
    pub const INTERRUPTED: &str = "InterruptedException";
}

/// Error raised while a valid snippet was running
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class}: {message}")]
pub struct ThrownError {
    /// Exception class, see [`class`]
    pub class: String,
    pub message: String,
    /// Active method frames when the error was raised, innermost first
    pub trace: Vec<String>,
}

impl ThrownError {
    pub fn new(
        class: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            class: class.to_string(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Class, message and one `at` line per frame
    pub fn render(&self) -> String {
        let mut text = self.to_string();
        for frame in &self.trace {
            text.push_str("\n\tat ");
            text.push_str(frame);
        }
        text
    }
}

/// Classified outcome of one snippet
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetResult {
    /// Source of this snippet
    pub source_text: String,
    pub status: Status,
    /// Rendered value of an expression snippet
    pub value: Option<String>,
    /// Compile diagnostics; spans point into the evaluated unit
    pub diagnostics: Vec<Diagnostic>,
    /// Error raised while running a valid snippet
    pub thrown: Option<ThrownError>,
}

/// Borrowed view of a result, one arm per outcome tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    /// Ran to completion, with the value of an expression snippet
    Completed(Option<&'a str>),
    Rejected(&'a [Diagnostic]),
    Thrown(&'a ThrownError),
}

impl SnippetResult {
    /// Snippet that ran to completion
    pub fn valid(
        source_text: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            status: Status::Valid,
            value,
            diagnostics: Vec::new(),
            thrown: None,
        }
    }

    /// Snippet refused by the parser or checker
    pub fn rejected(
        source_text: impl Into<String>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            status: Status::Rejected,
            value: None,
            diagnostics,
            thrown: None,
        }
    }

    /// Valid snippet whose execution raised `thrown`
    pub fn thrown(
        source_text: impl Into<String>,
        thrown: ThrownError,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            status: Status::Valid,
            value: None,
            diagnostics: Vec::new(),
            thrown: Some(thrown),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == Status::Valid
    }

    pub fn is_rejected(&self) -> bool {
        self.status == Status::Rejected
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match (&self.status, &self.thrown) {
            (Status::Rejected, _) => Outcome::Rejected(&self.diagnostics),
            (Status::Valid, Some(thrown)) => Outcome::Thrown(thrown),
            (Status::Valid, None) => Outcome::Completed(self.value.as_deref()),
        }
    }
}

impl fmt::Display for SnippetResult {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.outcome() {
            Outcome::Completed(Some(value)) => write!(f, "{} ==> {}", self.source_text, value),
            Outcome::Completed(None) => write!(f, "{}", self.source_text),
            Outcome::Rejected(diagnostics) => {
                write!(f, "{} rejected", self.source_text)?;
                for diagnostic in diagnostics {
                    write!(f, "\n  {}", diagnostic)?;
                }
                Ok(())
            }
            Outcome::Thrown(thrown) => write!(f, "{} threw {}", self.source_text, thrown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::span::Span;

    #[test]
    fn test_outcome_tiers() {
        let ok = SnippetResult::valid("x + 1;", Some("2".to_string()));
        assert_eq!(ok.outcome(), Outcome::Completed(Some("2")));
        assert_eq!(ok.to_string(), "x + 1; ==> 2");

        let rejected = SnippetResult::rejected("y;", vec![Diagnostic::new("nope", Span::default())]);
        assert!(rejected.is_rejected());
        assert!(matches!(rejected.outcome(), Outcome::Rejected(d) if d.len() == 1));

        let mut error = ThrownError::new(class::ARITHMETIC, "/ by zero");
        error.trace.push("div".to_string());
        let thrown = SnippetResult::thrown("1 / 0;", error);
        assert!(thrown.is_valid());
        assert!(thrown.value.is_none());
        match thrown.outcome() {
            Outcome::Thrown(error) => {
                assert_eq!(error.render(), "ArithmeticException: / by zero\n\tat div")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
