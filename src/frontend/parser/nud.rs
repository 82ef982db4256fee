//! Prefix expression parsing (nud - null denotation)

use super::super::lexer::tokens::*;
use super::ast::*;
use super::state::*;
use super::ParseError;

impl<'a> ParserState<'a> {
    /// Parse a prefix expression at the current position
    pub(crate) fn parse_prefix(&mut self) -> Option<Expr> {
        let span = self.span();
        let literal = match self.kind() {
            TokenKind::IntLiteral(n) => Some(Literal::Int(*n)),
            TokenKind::FloatLiteral(f) => Some(Literal::Float(*f)),
            TokenKind::StringLiteral(s) => Some(Literal::Str(s.clone())),
            TokenKind::KwTrue => Some(Literal::Bool(true)),
            TokenKind::KwFalse => Some(Literal::Bool(false)),
            TokenKind::KwNull => Some(Literal::Null),
            _ => None,
        };
        if let Some(literal) = literal {
            self.bump();
            return Some(Expr::Lit(literal, span));
        }

        match self.kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.bump();
                Some(Expr::Var(name, span))
            }
            TokenKind::LParen => self.parse_group(),
            TokenKind::Minus | TokenKind::Plus | TokenKind::Not => self.parse_unary(),
            TokenKind::PlusPlus | TokenKind::MinusMinus => self.parse_prefix_step(),
            TokenKind::Eof => {
                self.error(ParseError::UnexpectedEof { span });
                None
            }
            other => {
                let found = other.describe();
                self.error(ParseError::IllegalStart { found, span });
                None
            }
        }
    }

    /// Parse `( expr )`
    fn parse_group(&mut self) -> Option<Expr> {
        self.bump(); // consume '('
        let expr = self.parse_expression(BP_LOWEST)?;
        self.expect(&TokenKind::RParen)?;
        Some(expr)
    }

    /// Parse unary operator expression
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.span();
        let op = match self.kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        self.bump();

        let operand = self.parse_expression(BP_UNARY)?;

        // Unary plus is the identity
        let Some(op) = op else {
            return Some(operand);
        };

        Some(Expr::Unary {
            op,
            expr: Box::new(operand),
            span: self.span_from(start),
        })
    }

    /// Parse `++x` / `--x`
    fn parse_prefix_step(&mut self) -> Option<Expr> {
        let start = self.span();
        let delta = if self.at(&TokenKind::PlusPlus) { 1 } else { -1 };
        self.bump();

        let operand = self.parse_expression(BP_UNARY)?;
        let target = self.assignment_target(operand)?;

        Some(Expr::Step {
            target,
            delta,
            prefix: true,
            span: self.span_from(start),
        })
    }

    /// Name of the variable an assignment or step writes to
    pub(crate) fn assignment_target(
        &mut self,
        expr: Expr,
    ) -> Option<String> {
        match expr {
            Expr::Var(name, _) => Some(name),
            other => {
                self.error(ParseError::NotAVariable { span: other.span() });
                None
            }
        }
    }
}
