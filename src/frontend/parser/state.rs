//! Parser state and token stream management

use super::super::lexer::tokens::*;
use super::ParseError;
use crate::util::span::Span;

/// Binding power levels for Pratt parser
pub const BP_LOWEST: u8 = 0;
pub const BP_ASSIGN: u8 = 10;
pub const BP_TERNARY: u8 = 15;
pub const BP_OR: u8 = 20;
pub const BP_AND: u8 = 30;
pub const BP_EQ: u8 = 40;
pub const BP_CMP: u8 = 50;
pub const BP_ADD: u8 = 60;
pub const BP_MUL: u8 = 70;
pub const BP_UNARY: u8 = 80;
pub const BP_POSTFIX: u8 = 85;
pub const BP_CALL: u8 = 90;

/// Deepest statement and expression nesting a unit may use
pub const MAX_NESTING: usize = 512;

static EOF: TokenKind = TokenKind::Eof;

/// Parser state for tracking position and errors
#[derive(Debug)]
pub struct ParserState<'a> {
    /// Token stream, always terminated by `Eof`
    tokens: &'a [Token],
    /// Current position in token stream
    pos: usize,
    /// Parsing errors
    errors: Vec<ParseError>,
    /// Current nesting level of statements and expressions
    depth: usize,
}

impl<'a> ParserState<'a> {
    /// Create a new parser state
    #[inline]
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Check if at end of token stream
    #[inline]
    pub fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Get current token
    #[inline]
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Current token kind, `Eof` past the end
    #[inline]
    pub fn kind(&self) -> &TokenKind {
        self.current().map(|t| &t.kind).unwrap_or(&EOF)
    }

    /// Check the current token kind
    #[inline]
    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    /// Peek at nth token ahead
    #[inline]
    pub fn peek_nth(
        &self,
        n: usize,
    ) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    /// Span of the current token
    #[inline]
    pub fn span(&self) -> Span {
        match self.current() {
            Some(token) => token.span,
            None => self.prev_span(),
        }
    }

    /// Span of the most recently consumed token
    #[inline]
    pub fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Span from `start` to the end of the last consumed token
    #[inline]
    pub fn span_from(
        &self,
        start: Span,
    ) -> Span {
        start.to(self.prev_span())
    }

    /// Advance to next token
    #[inline]
    pub fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// Skip a specific token
    #[inline]
    pub fn skip(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect a specific token, report error if not found
    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> Option<Span> {
        if self.at(kind) {
            let span = self.span();
            self.bump();
            Some(span)
        } else {
            self.error_expected(&kind.describe());
            None
        }
    }

    /// Expect the `;` that ends a statement
    ///
    /// The final statement of a unit may leave it out.
    pub fn expect_semicolon(&mut self) -> Option<()> {
        if self.skip(&TokenKind::Semicolon) || self.at_end() {
            Some(())
        } else {
            self.error_expected("';'");
            None
        }
    }

    /// Expect an identifier and return its name
    pub fn expect_identifier(&mut self) -> Option<(String, Span)> {
        match self.kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.span();
                self.bump();
                Some((name, span))
            }
            _ => {
                self.error_expected("<identifier>");
                None
            }
        }
    }

    /// Current nesting level
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Go one nesting level deeper, failing past [`MAX_NESTING`]
    pub fn enter_nesting(&mut self) -> Option<()> {
        if self.depth >= MAX_NESTING {
            self.error(ParseError::TooDeep {
                limit: MAX_NESTING,
                span: self.span(),
            });
            return None;
        }
        self.depth += 1;
        Some(())
    }

    /// Return to a level saved with [`ParserState::depth`]
    #[inline]
    pub fn restore_depth(
        &mut self,
        depth: usize,
    ) {
        self.depth = depth;
    }

    /// Add a parse error
    #[inline]
    pub fn error(
        &mut self,
        error: ParseError,
    ) {
        self.errors.push(error);
    }

    /// Report that `expected` was required at the current token
    pub fn error_expected(
        &mut self,
        expected: &str,
    ) {
        let error = if self.at_end() {
            ParseError::UnexpectedEof { span: self.span() }
        } else {
            ParseError::Expected {
                expected: expected.to_string(),
                found: self.kind().describe(),
                span: self.span(),
            }
        };
        self.error(error);
    }

    /// Check if there are errors
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get all errors
    #[inline]
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Whether the current token starts a `String` typed declaration
    pub fn at_string_declaration(&self) -> bool {
        matches!(self.kind(), TokenKind::Identifier(name) if name == "String")
            && matches!(
                self.peek_nth(1).map(|t| &t.kind),
                Some(TokenKind::Identifier(_))
            )
    }

    /// Whether the current token starts a typed declaration
    pub fn at_declaration(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::KwInt
                | TokenKind::KwDouble
                | TokenKind::KwBoolean
                | TokenKind::KwVar
                | TokenKind::KwVoid
        ) || self.at_string_declaration()
    }
}
