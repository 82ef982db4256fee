//! Frontend for snippet text
//!
//! This module contains the lexer, the completeness analyzer that cuts
//! editor text into units, the parser and the static checker.

use tracing::debug;

use crate::util::diagnostic::Diagnostic;

pub mod analyzer;
pub mod check;
pub mod lexer;
pub mod parser;

pub use analyzer::{
    analyze, analyze_completion, is_blank, Analyzer, Completion, CompletionKind, SourceUnit,
};

/// Tokenize and parse one unit, reporting failures as diagnostics
pub fn parse_unit(source: &str) -> Result<Vec<parser::ast::Stmt>, Vec<Diagnostic>> {
    let tokens = lexer::tokenize(source)
        .map_err(|(error, span)| vec![Diagnostic::new(error.to_string(), span)])?;
    debug!("tokenized into {} tokens", tokens.len());

    parser::parse(&tokens).map_err(|errors| {
        errors
            .into_iter()
            .map(|error| Diagnostic::new(error.to_string(), error.span()))
            .collect()
    })
}
