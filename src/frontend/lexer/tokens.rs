//! Token types

use crate::util::span::Span;

/// Lexer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unclosed string literal starting at {position}")]
    UnterminatedString { position: String },
    #[error("unclosed string literal at {position}")]
    UnclosedLine { position: String },
    #[error("unclosed comment starting at {position}")]
    UnterminatedComment { position: String },
    #[error("illegal escape character in string literal: \\{ch}")]
    InvalidEscape { ch: char },
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
}

impl LexError {
    /// True when more input could turn the offending text into valid tokens
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            LexError::UnterminatedString { .. } | LexError::UnterminatedComment { .. }
        )
    }
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwInt,
    KwDouble,
    KwBoolean,
    KwVar,
    KwVoid,
    KwIf,
    KwElse,
    KwWhile,
    KwDo,
    KwFor,
    KwReturn,
    KwBreak,
    KwContinue,
    KwThrow,
    KwImport,
    KwTrue,
    KwFalse,
    KwNull,

    // Identifiers
    Identifier(String),

    // Literals
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    PlusPlus,
    MinusMinus,
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Question,
    Colon,
    Arrow,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,

    /// A character the language has no use for; the parser rejects it
    Unknown(char),

    Eof,
}

impl TokenKind {
    /// Look up a keyword
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "int" => TokenKind::KwInt,
            "double" => TokenKind::KwDouble,
            "boolean" => TokenKind::KwBoolean,
            "var" => TokenKind::KwVar,
            "void" => TokenKind::KwVoid,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "do" => TokenKind::KwDo,
            "for" => TokenKind::KwFor,
            "return" => TokenKind::KwReturn,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "throw" => TokenKind::KwThrow,
            "import" => TokenKind::KwImport,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            "null" => TokenKind::KwNull,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a unit may end right after this token without a `;`
    pub fn can_end_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::KwNull
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::KwBreak
                | TokenKind::KwContinue
                | TokenKind::KwReturn
        )
    }

    /// Human readable form used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::IntLiteral(n) => format!("'{}'", n),
            TokenKind::FloatLiteral(f) => format!("'{}'", f),
            TokenKind::StringLiteral(_) => "string literal".to_string(),
            TokenKind::Unknown(c) => format!("illegal character '{}'", c),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::KwInt => "int",
            TokenKind::KwDouble => "double",
            TokenKind::KwBoolean => "boolean",
            TokenKind::KwVar => "var",
            TokenKind::KwVoid => "void",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwWhile => "while",
            TokenKind::KwDo => "do",
            TokenKind::KwFor => "for",
            TokenKind::KwReturn => "return",
            TokenKind::KwBreak => "break",
            TokenKind::KwContinue => "continue",
            TokenKind::KwThrow => "throw",
            TokenKind::KwImport => "import",
            TokenKind::KwTrue => "true",
            TokenKind::KwFalse => "false",
            TokenKind::KwNull => "null",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::EqEq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Not => "!",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "->",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Semicolon => ";",
            _ => "?",
        }
    }
}

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
