//! Lexer for snippet language
//!
//! The tokenizer is pull-based (`Lexer::next_token`) so the completeness
//! analyzer can stop at the first unit boundary without lexing the rest of
//! the buffer; `tokenize` drains it for the parser.

pub mod tokenizer;
pub mod tokens;

pub use tokenizer::Lexer;
pub use tokens::{LexError, Token, TokenKind};

use crate::util::span::Span;

/// Tokenize a whole unit, appending an `Eof` token
pub fn tokenize(source: &str) -> Result<Vec<Token>, (LexError, Span)> {
    tracing::trace!("lexing {} bytes", source.len());

    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        match lexer.next_token() {
            Some(Ok(token)) => tokens.push(token),
            Some(Err(err)) => {
                return Err((err, Span::new(lexer.start_position(), lexer.position())))
            }
            None => break,
        }
    }

    let end = lexer.position();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("  \t\n // note\n /* block */ "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            kinds("int x = 1;"),
            vec![
                TokenKind::KwInt,
                TokenKind::Identifier("x".to_string()),
                TokenKind::Eq,
                TokenKind::IntLiteral(1),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("a += 1; b++ <= --c && d != e || !f"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::PlusEq,
                TokenKind::IntLiteral(1),
                TokenKind::Semicolon,
                TokenKind::Identifier("b".to_string()),
                TokenKind::PlusPlus,
                TokenKind::Le,
                TokenKind::MinusMinus,
                TokenKind::Identifier("c".to_string()),
                TokenKind::And,
                TokenKind::Identifier("d".to_string()),
                TokenKind::Neq,
                TokenKind::Identifier("e".to_string()),
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Identifier("f".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(kinds("42")[0], TokenKind::IntLiteral(42));
        assert_eq!(kinds("1_000")[0], TokenKind::IntLiteral(1000));
        assert_eq!(kinds("2.5")[0], TokenKind::FloatLiteral(2.5));
        assert_eq!(kinds("1e3")[0], TokenKind::FloatLiteral(1000.0));
        // `1.` followed by a name is a member access, not a float
        assert_eq!(kinds("1.x")[1], TokenKind::Dot);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\tb\n\"q\"""#)[0],
            TokenKind::StringLiteral("a\tb\n\"q\"".to_string())
        );
    }

    #[test]
    fn test_unterminated_constructs_are_incomplete() {
        let (err, _) = tokenize("\"abc").unwrap_err();
        assert!(err.is_incomplete());
        let (err, _) = tokenize("x /* open").unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_line_break_in_string_is_not_incomplete() {
        let (err, span) = tokenize("x = \"abc\ndef\"").unwrap_err();
        assert!(matches!(err, LexError::UnclosedLine { .. }));
        assert!(!err.is_incomplete());
        assert_eq!(span.start.offset, 4);
    }

    #[test]
    fn test_unknown_character_is_a_token() {
        assert_eq!(kinds("#")[0], TokenKind::Unknown('#'));
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = tokenize("a\n  b").unwrap();
        assert_eq!(tokens[1].span.start.line, 2);
        assert_eq!(tokens[1].span.start.column, 3);
        assert_eq!(tokens[1].span.start.offset, 4);
    }
}
