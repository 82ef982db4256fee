//! Per-snippet run reporting

use crate::console::{ConsoleEvent, ConsoleSender};
use crate::session::{Outcome, SnippetResult};

/// How results are announced on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// One status line per snippet, as the editor shows them
    #[default]
    Status,
    /// REPL style: `==> value` for expressions, errors only otherwise
    Echo,
    /// Only failures
    Quiet,
}

/// Send the console lines for one result
pub fn report(
    console: &ConsoleSender,
    style: ReportStyle,
    result: &SnippetResult,
) {
    let source = result.source_text.as_str();
    match result.outcome() {
        Outcome::Completed(value) => match (style, value) {
            (ReportStyle::Status, Some(value)) => console.status(format!(
                "Code evaluation successful at \"{}\" and returned value {}",
                source, value
            )),
            (ReportStyle::Status, None) => {
                console.status(format!("Code evaluation successful at \"{}\"", source))
            }
            (ReportStyle::Echo, Some(value)) => console.send(ConsoleEvent::Output(format!("==> {}\n", value))),
            _ => {}
        },
        Outcome::Rejected(diagnostics) => {
            console.status(format!("Code evaluation failed at \"{}\"", source));
            for diagnostic in diagnostics {
                console.diagnostic(format!("\"{}\" -> {}", source, diagnostic.message));
            }
        }
        Outcome::Thrown(thrown) => {
            if style == ReportStyle::Status {
                console.status(format!(
                    "Code evaluation failed with an exception at \"{}\"",
                    source
                ));
            }
            console.send(ConsoleEvent::Error(format!("{}\n", thrown.render())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::console;
    use crate::session::{class, Diagnostic, ThrownError};
    use crate::util::span::Span;

    #[test]
    fn test_status_lines() {
        let (sender, receiver) = console();
        report(
            &sender,
            ReportStyle::Status,
            &SnippetResult::valid("x + 1;", Some("2".to_string())),
        );
        report(&sender, ReportStyle::Status, &SnippetResult::valid("int x = 1;", None));
        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            [
                ConsoleEvent::Status(
                    "Code evaluation successful at \"x + 1;\" and returned value 2".to_string()
                ),
                ConsoleEvent::Status("Code evaluation successful at \"int x = 1;\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_rejection_lists_diagnostics() {
        let (sender, receiver) = console();
        let result = SnippetResult::rejected(
            "y;",
            vec![Diagnostic::new("cannot find symbol: variable y", Span::default())],
        );
        report(&sender, ReportStyle::Quiet, &result);
        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            ConsoleEvent::Diagnostic("\"y;\" -> cannot find symbol: variable y".to_string())
        );
    }

    #[test]
    fn test_echo_style() {
        let (sender, receiver) = console();
        report(
            &sender,
            ReportStyle::Echo,
            &SnippetResult::valid("\"a\";", Some("\"a\"".to_string())),
        );
        report(
            &sender,
            ReportStyle::Echo,
            &SnippetResult::thrown("1 / 0;", ThrownError::new(class::ARITHMETIC, "/ by zero")),
        );
        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            [
                ConsoleEvent::Output("==> \"a\"\n".to_string()),
                ConsoleEvent::Error("ArithmeticException: / by zero\n".to_string()),
            ]
        );
    }
}
