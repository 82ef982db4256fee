//! Parser module
//!
//! A Pratt parser for snippet units. A unit normally holds one statement;
//! the last statement of a unit may omit its `;`.

pub mod ast;
mod expr;
mod led;
mod nud;
mod state;
mod stmt;

pub use state::{ParserState, MAX_NESTING};

use crate::frontend::lexer::{LexError, Token};
use crate::util::span::Span;
use ast::*;

/// Parse the tokens of one unit into statements
///
/// Parsing stops at the first statement that fails; all errors collected up
/// to that point are returned.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, Vec<ParseError>> {
    let mut state = ParserState::new(tokens);
    let mut stmts = Vec::new();

    while !state.at_end() {
        match state.parse_stmt() {
            Some(stmt) => {
                if !matches!(stmt.kind, StmtKind::Empty) {
                    stmts.push(stmt);
                }
            }
            None => break,
        }
    }

    if state.has_errors() {
        Err(state.into_errors())
    } else {
        tracing::trace!("parsed {} statements", stmts.len());
        Ok(stmts)
    }
}

/// Parse error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("{expected} expected, found {found}")]
    Expected {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("illegal start of expression: {found}")]
    IllegalStart { found: String, span: Span },

    #[error("reached end of input while parsing")]
    UnexpectedEof { span: Span },

    #[error("unexpected type; required: variable, found: value")]
    NotAVariable { span: Span },

    #[error("{message}")]
    Invalid { message: String, span: Span },

    #[error("{error}")]
    Lex { error: LexError, span: Span },

    #[error("too deeply nested; at most {limit} levels are allowed")]
    TooDeep { limit: usize, span: Span },
}

impl ParseError {
    /// Source span the error points at
    pub fn span(&self) -> Span {
        match self {
            ParseError::Expected { span, .. }
            | ParseError::IllegalStart { span, .. }
            | ParseError::UnexpectedEof { span }
            | ParseError::NotAVariable { span }
            | ParseError::Invalid { span, .. }
            | ParseError::Lex { span, .. }
            | ParseError::TooDeep { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    fn parse_source(source: &str) -> Result<Vec<Stmt>, Vec<ParseError>> {
        parse(&tokenize(source).unwrap())
    }

    fn single(source: &str) -> StmtKind {
        let mut stmts = parse_source(source).unwrap();
        assert_eq!(stmts.len(), 1, "expected one statement in {:?}", source);
        stmts.remove(0).kind
    }

    #[test]
    fn test_compound_declaration() {
        match single("int a = 1, b = a + 1;") {
            StmtKind::VarDecl {
                ty, declarators, ..
            } => {
                assert_eq!(ty, TypeRef::Int);
                let names: Vec<_> = declarators.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
                assert!(declarators.iter().all(|d| d.init.is_some()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_string_declaration_and_expression() {
        assert!(matches!(
            single("String s = \"x\";"),
            StmtKind::VarDecl {
                ty: TypeRef::Str,
                ..
            }
        ));
        // `String` alone is just a name
        assert!(matches!(single("String"), StmtKind::Expr(Expr::Var(..))));
    }

    #[test]
    fn test_method_declaration() {
        match single("int sq(int n) { return n * n; }") {
            StmtKind::Method(method) => {
                assert_eq!(method.name, "sq");
                assert_eq!(method.signature(), "int sq(int)");
                assert_eq!(method.body.stmts.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        match single("1 + 2 * 3 - 4") {
            StmtKind::Expr(Expr::Binary {
                op: BinOp::Sub,
                left,
                ..
            }) => {
                assert!(matches!(*left, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }

        match single("a = b = 3;") {
            StmtKind::Expr(Expr::Assign { target, value, .. }) => {
                assert_eq!(target, "a");
                assert!(matches!(*value, Expr::Assign { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_qualified_calls() {
        match single("System.out.println(math.max(1, 2));") {
            StmtKind::Expr(Expr::Call { path, args, .. }) => {
                assert_eq!(path, vec!["System", "out", "println"]);
                assert!(matches!(&args[0], Expr::Call { path, .. } if path.len() == 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_control_flow() {
        assert!(matches!(
            single("if (x > 1) y = 1; else { y = 2; }"),
            StmtKind::If {
                else_branch: Some(_),
                ..
            }
        ));
        assert!(matches!(
            single("for (int i = 0; i < 3; i++) s += i;"),
            StmtKind::For {
                init: Some(_),
                cond: Some(_),
                ..
            }
        ));
        assert!(matches!(
            single("do { i--; } while (i > 0);"),
            StmtKind::DoWhile { .. }
        ));
    }

    #[test]
    fn test_imports() {
        match single("import math.*;") {
            StmtKind::Import(import) => assert_eq!(import.to_string(), "math.*"),
            other => panic!("unexpected {:?}", other),
        }
        match single("import a.b.twice") {
            StmtKind::Import(import) => {
                assert_eq!(import.package, "a.b");
                assert_eq!(import.member.as_deref(), Some("twice"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_semicolon_only_at_end() {
        assert!(parse_source("x + 1").is_ok());
        let errors = parse_source("{ x = 1 }").unwrap_err();
        assert!(matches!(&errors[0], ParseError::Expected { expected, .. } if expected == "';'"));
    }

    #[test]
    fn test_errors_carry_spans() {
        let errors = parse_source("int x = ;").unwrap_err();
        assert_eq!(errors[0].span().start.offset, 8);

        let errors = parse_source("1 = 2;").unwrap_err();
        assert!(matches!(errors[0], ParseError::NotAVariable { .. }));
    }

    #[test]
    fn test_nesting_is_limited() {
        let worker = std::thread::Builder::new()
            .stack_size(16 * 1024 * 1024)
            .spawn(|| {
                let shallow = format!("{}1{};", "(".repeat(100), ")".repeat(100));
                assert!(parse_source(&shallow).is_ok());

                let groups = format!("{}1{};", "(".repeat(200_000), ")".repeat(200_000));
                let errors = parse_source(&groups).unwrap_err();
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0], ParseError::TooDeep { limit: MAX_NESTING, .. }));

                let blocks = format!("{}{}", "{".repeat(MAX_NESTING + 1), "}".repeat(MAX_NESTING + 1));
                let errors = parse_source(&blocks).unwrap_err();
                assert!(matches!(errors[0], ParseError::TooDeep { .. }));

                let chain = vec!["1"; MAX_NESTING + 2].join(" + ");
                let errors = parse_source(&chain).unwrap_err();
                assert!(matches!(errors[0], ParseError::TooDeep { .. }));

                let negations = format!("{}true;", "!".repeat(MAX_NESTING + 1));
                let errors = parse_source(&negations).unwrap_err();
                assert!(matches!(errors[0], ParseError::TooDeep { .. }));
            })
            .unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_void_variable_rejected() {
        let errors = parse_source("void v;").unwrap_err();
        assert_eq!(errors[0].to_string(), "'void' type not allowed here");
    }
}
