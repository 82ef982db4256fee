//! Tokenizer implementation
//! Main lexer structure and token generation logic

use std::iter::Peekable;
use std::str::Chars;

use super::tokens::{LexError, Token, TokenKind};
use crate::util::span::{Position, Span};

/// Main lexer structure
///
/// Cloning a lexer is cheap and gives an independent cursor, which is how
/// callers look ahead without consuming tokens.
#[derive(Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    start_offset: usize,
    start_line: usize,
    start_column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            start_offset: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Get current position
    pub fn position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset)
    }

    /// Start position of the token most recently scanned (or attempted)
    pub fn start_position(&self) -> Position {
        Position::with_offset(self.start_line, self.start_column, self.start_offset)
    }

    /// Get span of current token
    fn span(&self) -> Span {
        Span::new(self.start_position(), self.position())
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    fn eat(
        &mut self,
        expected: char,
    ) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let opened_at = self.position();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                self.start_offset = opened_at.offset;
                                self.start_line = opened_at.line;
                                self.start_column = opened_at.column;
                                return Err(LexError::UnterminatedComment {
                                    position: opened_at.to_string(),
                                });
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Generate next token, `None` once the input is exhausted
    pub fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }

        self.start_offset = self.offset;
        self.start_line = self.line;
        self.start_column = self.column;

        let c = self.advance()?;

        let kind = match c {
            c if is_identifier_start(c) => self.scan_identifier(c),
            c if c.is_ascii_digit() => return Some(self.scan_number(c)),
            '"' => return Some(self.scan_string()),
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' if self.eat('=') => TokenKind::StarEq,
            '*' => TokenKind::Star,
            '/' if self.eat('=') => TokenKind::SlashEq,
            '/' => TokenKind::Slash,
            '%' if self.eat('=') => TokenKind::PercentEq,
            '%' => TokenKind::Percent,
            '=' if self.eat('=') => TokenKind::EqEq,
            '=' => TokenKind::Eq,
            '!' if self.eat('=') => TokenKind::Neq,
            '!' => TokenKind::Not,
            '<' if self.eat('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.eat('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            '&' if self.eat('&') => TokenKind::And,
            '|' if self.eat('|') => TokenKind::Or,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            other => TokenKind::Unknown(other),
        };

        Some(Ok(self.make_token(kind)))
    }

    /// Scan identifier or keyword
    fn scan_identifier(
        &mut self,
        first_char: char,
    ) -> TokenKind {
        let mut value = String::new();
        value.push(first_char);

        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::keyword(&value).unwrap_or(TokenKind::Identifier(value))
    }

    /// Scan a decimal integer or floating point literal
    fn scan_number(
        &mut self,
        first_char: char,
    ) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first_char);
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let signed = matches!(lookahead.peek(), Some('+') | Some('-'));
            if signed {
                lookahead.next();
            }
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.advance();
                if signed {
                    if let Some(sign) = self.advance() {
                        text.push(sign);
                    }
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let kind = if is_float {
            text.parse::<f64>()
                .map(TokenKind::FloatLiteral)
                .map_err(|_| LexError::InvalidNumber(text.clone()))?
        } else {
            text.parse::<i64>()
                .map(TokenKind::IntLiteral)
                .map_err(|_| LexError::InvalidNumber(text.clone()))?
        };
        Ok(self.make_token(kind))
    }

    /// Scan a string literal; the opening quote is already consumed
    fn scan_string(&mut self) -> Result<Token, LexError> {
        let opened_at = self.start_position();
        let mut value = String::new();
        let mut bad_escape = None;

        loop {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedString {
                        position: opened_at.to_string(),
                    })
                }
                Some('\n') => {
                    // A raw newline cannot be repaired by more input
                    return Err(LexError::UnclosedLine {
                        position: opened_at.to_string(),
                    });
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('0') => value.push('\0'),
                        Some('"') => value.push('"'),
                        Some('\'') => value.push('\''),
                        Some('\\') => value.push('\\'),
                        Some(other) => {
                            bad_escape.get_or_insert(other);
                        }
                        None => {
                            return Err(LexError::UnterminatedString {
                                position: opened_at.to_string(),
                            })
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        match bad_escape {
            Some(ch) => Err(LexError::InvalidEscape { ch }),
            None => Ok(self.make_token(TokenKind::StringLiteral(value))),
        }
    }

    /// Create token with current span
    fn make_token(
        &self,
        kind: TokenKind,
    ) -> Token {
        Token {
            kind,
            span: self.span(),
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_identifier_char(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}
