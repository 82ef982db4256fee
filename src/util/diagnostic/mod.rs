//! Diagnostics reported against a unit of source text

use std::fmt;

use crate::util::span::Span;

/// A compile-time message pointing into the unit it was produced from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Rendered message
    pub message: String,
    /// Location inside the unit's source text
    pub span: Span,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Source text the diagnostic points at, if the span fits `source`
    pub fn excerpt<'a>(
        &self,
        source: &'a str,
    ) -> Option<&'a str> {
        source.get(self.span.range()).filter(|text| !text.is_empty())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.span.start, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::span::Position;

    #[test]
    fn test_excerpt_and_display() {
        let span = Span::new(Position::with_offset(1, 5, 4), Position::with_offset(1, 6, 5));
        let diagnostic = Diagnostic::new("cannot find symbol: variable y", span);
        assert_eq!(diagnostic.excerpt("x + y;"), Some("y"));
        assert_eq!(diagnostic.excerpt("x"), None);
        assert_eq!(diagnostic.to_string(), "1:5: cannot find symbol: variable y");
    }
}
