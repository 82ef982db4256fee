//! Completeness analyzer
//!
//! Splits free-form text into syntactically complete units. A unit is the
//! exact slice from its first token to its terminator; leading whitespace and
//! comments are skipped. Text after the last complete unit stays in the
//! remainder and is never evaluated, so an editor buffer that ends in the
//! middle of a statement simply yields fewer units.
//!
//! Boundaries depend only on the text being analyzed, so analyzing the whole
//! buffer once and re-analyzing each remainder produce the same units.

use super::lexer::{Lexer, TokenKind};

/// Completeness of the first unit in a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Ends with `;` or a closing block brace
    Complete,
    /// Ends at end of input on a token that can finish a statement; the
    /// missing `;` is implied
    CompleteWithSemi,
    /// More input is required (open delimiter, dangling operator, ...)
    Incomplete,
    /// Nothing but whitespace and comments
    Empty,
}

impl CompletionKind {
    /// Whether the analyzed slice can be evaluated
    pub fn is_complete(self) -> bool {
        matches!(self, CompletionKind::Complete | CompletionKind::CompleteWithSemi)
    }
}

/// Result of analyzing the first unit of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion<'a> {
    pub kind: CompletionKind,
    /// The unit (complete kinds) or the pending fragment (`Incomplete`)
    pub source: &'a str,
    /// Byte offset of `source` inside the analyzed text
    pub offset: usize,
    /// Text after the unit
    pub remaining: &'a str,
}

/// One complete unit and the text that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceUnit<'a> {
    /// Exact slice of the analyzed text
    pub source: &'a str,
    /// Byte offset of `source` inside the text given to [`analyze`]
    pub offset: usize,
    /// Unconsumed text after this unit
    pub remaining: &'a str,
    /// The unit ended at end of input without a `;`
    pub implied_semicolon: bool,
}

/// Lazily split `text` into complete units
pub fn analyze(text: &str) -> Analyzer<'_> {
    Analyzer {
        text,
        consumed: 0,
        finished: false,
    }
}

/// Iterator over the complete units of a text
#[derive(Debug, Clone)]
pub struct Analyzer<'a> {
    text: &'a str,
    consumed: usize,
    finished: bool,
}

impl<'a> Analyzer<'a> {
    /// Text not yet consumed by a unit
    pub fn remainder(&self) -> &'a str {
        &self.text[self.consumed..]
    }

    /// Kind of the text left once iteration stopped
    pub fn remainder_kind(&self) -> CompletionKind {
        analyze_completion(self.remainder()).kind
    }
}

impl<'a> Iterator for Analyzer<'a> {
    type Item = SourceUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let rest = self.remainder();
        let completion = analyze_completion(rest);
        if !completion.kind.is_complete() {
            self.finished = true;
            return None;
        }

        let offset = self.consumed + completion.offset;
        self.consumed += rest.len() - completion.remaining.len();
        tracing::debug!(
            "unit at {}: {:?}",
            offset,
            completion.source.lines().next().unwrap_or_default()
        );

        Some(SourceUnit {
            source: completion.source,
            offset,
            remaining: completion.remaining,
            implied_semicolon: completion.kind == CompletionKind::CompleteWithSemi,
        })
    }
}

/// Whether `text` holds nothing but whitespace and comments
pub fn is_blank(text: &str) -> bool {
    analyze_completion(text).kind == CompletionKind::Empty
}

/// Analyze the first unit of `text`
pub fn analyze_completion(text: &str) -> Completion<'_> {
    let mut lexer = Lexer::new(text);
    let mut scan = Scan::default();

    loop {
        let token = match lexer.next_token() {
            None => break,
            Some(Err(err)) if err.is_incomplete() => {
                return scan.incomplete(text);
            }
            Some(Err(_)) => {
                // Malformed literal: keep it inside the unit and let the
                // parser report it.
                let start = lexer.start_position().offset;
                scan.start.get_or_insert(start);
                scan.end = lexer.position().offset;
                scan.prev = Some(TokenKind::Unknown('?'));
                scan.closed_header = false;
                continue;
            }
            Some(Ok(token)) => token,
        };

        scan.start.get_or_insert(token.span.start.offset);
        scan.end = token.span.end.offset;
        let at_top = scan.parens == 0 && scan.braces == 0;
        let mut closes_header = false;
        let after_do_while = std::mem::take(&mut scan.do_condition);

        match token.kind {
            TokenKind::KwDo if at_top => scan.open_dos += 1,
            TokenKind::KwWhile
                if at_top
                    && scan.open_dos > 0
                    && matches!(scan.prev, Some(TokenKind::Semicolon) | Some(TokenKind::RBrace)) =>
            {
                // Condition of a `do` loop, not the header of a new loop
                scan.open_dos -= 1;
                scan.do_condition = true;
            }
            TokenKind::LParen | TokenKind::LBracket => {
                if at_top
                    && !after_do_while
                    && matches!(
                        scan.prev,
                        Some(TokenKind::KwIf) | Some(TokenKind::KwWhile) | Some(TokenKind::KwFor)
                    )
                {
                    scan.header_open = true;
                }
                scan.parens += 1;
            }
            TokenKind::RParen | TokenKind::RBracket => {
                scan.parens = scan.parens.saturating_sub(1);
                if scan.parens == 0 && scan.braces == 0 && scan.header_open {
                    scan.header_open = false;
                    closes_header = true;
                }
            }
            TokenKind::LBrace => {
                if at_top {
                    scan.statement_block = !opens_expression_brace(scan.prev.as_ref());
                }
                scan.braces += 1;
            }
            TokenKind::RBrace => {
                if scan.braces == 0 {
                    // Stray closer; cut here and let the parser reject it
                    return scan.complete(text);
                }
                scan.braces -= 1;
                if scan.braces == 0
                    && scan.parens == 0
                    && scan.statement_block
                    && !scan.continues(peek_kind(&lexer))
                {
                    return scan.complete(text);
                }
            }
            TokenKind::Semicolon if at_top => {
                if !scan.continues(peek_kind(&lexer)) {
                    return scan.complete(text);
                }
            }
            _ => {}
        }

        scan.closed_header = closes_header;
        scan.prev = Some(token.kind);
    }

    let Some(start) = scan.start else {
        return Completion {
            kind: CompletionKind::Empty,
            source: "",
            offset: text.len(),
            remaining: text,
        };
    };

    let ends_statement = scan
        .prev
        .as_ref()
        .is_some_and(|kind| kind.can_end_expression());
    if scan.parens == 0
        && scan.braces == 0
        && scan.open_dos == 0
        && ends_statement
        && !scan.closed_header
    {
        Completion {
            kind: CompletionKind::CompleteWithSemi,
            source: &text[start..scan.end],
            offset: start,
            remaining: &text[scan.end..],
        }
    } else {
        scan.incomplete(text)
    }
}

/// Scanner state for one unit
#[derive(Debug, Default)]
struct Scan {
    start: Option<usize>,
    end: usize,
    prev: Option<TokenKind>,
    parens: usize,
    braces: usize,
    statement_block: bool,
    header_open: bool,
    closed_header: bool,
    /// Top-level `do` statements still waiting for their `while`
    open_dos: usize,
    /// The last token was the `while` of a `do` loop
    do_condition: bool,
}

impl Scan {
    /// Whether a statement that just ended runs on into the `next` token
    fn continues(
        &self,
        next: Option<TokenKind>,
    ) -> bool {
        match next {
            Some(TokenKind::KwElse) => true,
            Some(TokenKind::KwWhile) => self.open_dos > 0,
            // A `do` body at end of input still needs its condition
            None => self.open_dos > 0,
            _ => false,
        }
    }

    fn complete<'a>(
        &self,
        text: &'a str,
    ) -> Completion<'a> {
        let start = self.start.unwrap_or(0);
        Completion {
            kind: CompletionKind::Complete,
            source: &text[start..self.end],
            offset: start,
            remaining: &text[self.end..],
        }
    }

    fn incomplete<'a>(
        &self,
        text: &'a str,
    ) -> Completion<'a> {
        let start = self.start.unwrap_or(0);
        Completion {
            kind: CompletionKind::Incomplete,
            source: &text[start..],
            offset: start,
            remaining: &text[start..],
        }
    }
}

/// A `{` after one of these tokens belongs to an expression, not a block
fn opens_expression_brace(prev: Option<&TokenKind>) -> bool {
    matches!(
        prev,
        Some(TokenKind::Eq)
            | Some(TokenKind::PlusEq)
            | Some(TokenKind::MinusEq)
            | Some(TokenKind::Comma)
            | Some(TokenKind::LParen)
            | Some(TokenKind::Question)
            | Some(TokenKind::Colon)
            | Some(TokenKind::Arrow)
            | Some(TokenKind::KwReturn)
    )
}

fn peek_kind(lexer: &Lexer<'_>) -> Option<TokenKind> {
    let mut lookahead = lexer.clone();
    match lookahead.next_token() {
        Some(Ok(token)) => Some(token.kind),
        _ => None,
    }
}
