//! Infix expression parsing (led - left denotation)

use super::super::lexer::tokens::*;
use super::ast::*;
use super::state::*;
use super::ParseError;

/// Led parser: receives the left operand and the right binding power
type InfixFn<'a> = fn(&mut ParserState<'a>, Expr, u8) -> Option<Expr>;

impl<'a> ParserState<'a> {
    /// Get infix binding powers and parser for current token
    #[inline]
    pub(crate) fn infix_info(&self) -> Option<(u8, u8, InfixFn<'a>)> {
        let info: (u8, u8, InfixFn<'a>) = match self.kind() {
            // Assignment (right associative)
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq => (BP_ASSIGN, BP_ASSIGN, Self::parse_assign),
            // Conditional (right associative)
            TokenKind::Question => (BP_TERNARY, BP_TERNARY, Self::parse_ternary),
            TokenKind::Or => (BP_OR, BP_OR + 1, Self::parse_binary),
            TokenKind::And => (BP_AND, BP_AND + 1, Self::parse_binary),
            TokenKind::EqEq | TokenKind::Neq => (BP_EQ, BP_EQ + 1, Self::parse_binary),
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => {
                (BP_CMP, BP_CMP + 1, Self::parse_binary)
            }
            TokenKind::Plus | TokenKind::Minus => (BP_ADD, BP_ADD + 1, Self::parse_binary),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
                (BP_MUL, BP_MUL + 1, Self::parse_binary)
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                (BP_POSTFIX, BP_POSTFIX + 1, Self::parse_postfix_step)
            }
            TokenKind::LParen => (BP_CALL, BP_CALL + 1, Self::parse_call),
            TokenKind::Dot => (BP_CALL, BP_CALL + 1, Self::parse_member),
            _ => return None,
        };
        Some(info)
    }

    /// Parse assignment expression
    fn parse_assign(
        &mut self,
        lhs: Expr,
        right_bp: u8,
    ) -> Option<Expr> {
        let op = match self.kind() {
            TokenKind::PlusEq => AssignOp::Compound(BinOp::Add),
            TokenKind::MinusEq => AssignOp::Compound(BinOp::Sub),
            TokenKind::StarEq => AssignOp::Compound(BinOp::Mul),
            TokenKind::SlashEq => AssignOp::Compound(BinOp::Div),
            TokenKind::PercentEq => AssignOp::Compound(BinOp::Mod),
            _ => AssignOp::Set,
        };
        let start = lhs.span();
        let target = self.assignment_target(lhs)?;
        self.bump();

        let value = self.parse_expression(right_bp)?;

        Some(Expr::Assign {
            op,
            target,
            value: Box::new(value),
            span: self.span_from(start),
        })
    }

    /// Parse `cond ? a : b`
    fn parse_ternary(
        &mut self,
        cond: Expr,
        right_bp: u8,
    ) -> Option<Expr> {
        self.bump(); // consume '?'
        let then_expr = self.parse_expression(BP_LOWEST)?;
        self.expect(&TokenKind::Colon)?;
        let else_expr = self.parse_expression(right_bp)?;

        let span = cond.span().to(else_expr.span());
        Some(Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span,
        })
    }

    /// Parse binary operator expression
    fn parse_binary(
        &mut self,
        lhs: Expr,
        right_bp: u8,
    ) -> Option<Expr> {
        let op = match self.kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::Neq => BinOp::Neq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            TokenKind::And => BinOp::And,
            TokenKind::Or => BinOp::Or,
            _ => {
                self.error_expected("<operator>");
                return None;
            }
        };
        self.bump();

        let rhs = self.parse_expression(right_bp)?;

        let span = lhs.span().to(rhs.span());
        Some(Expr::Binary {
            op,
            left: Box::new(lhs),
            right: Box::new(rhs),
            span,
        })
    }

    /// Parse `x++` / `x--`
    fn parse_postfix_step(
        &mut self,
        lhs: Expr,
        _right_bp: u8,
    ) -> Option<Expr> {
        let delta = if self.at(&TokenKind::PlusPlus) { 1 } else { -1 };
        let start = lhs.span();
        let target = self.assignment_target(lhs)?;
        self.bump();

        Some(Expr::Step {
            target,
            delta,
            prefix: false,
            span: self.span_from(start),
        })
    }

    /// Parse call arguments after a name or dotted path
    fn parse_call(
        &mut self,
        lhs: Expr,
        _right_bp: u8,
    ) -> Option<Expr> {
        let start = lhs.span();
        let path = match lhs {
            Expr::Var(name, _) => vec![name],
            Expr::Path(path, _) => path,
            other => {
                self.error(ParseError::Invalid {
                    message: "expression is not callable".to_string(),
                    span: other.span(),
                });
                return None;
            }
        };
        self.bump(); // consume '('

        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression(BP_LOWEST)?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;

        Some(Expr::Call {
            path,
            args,
            span: self.span_from(start),
        })
    }

    /// Parse `.name` after a name or dotted path
    fn parse_member(
        &mut self,
        lhs: Expr,
        _right_bp: u8,
    ) -> Option<Expr> {
        let start = lhs.span();
        let mut path = match lhs {
            Expr::Var(name, _) => vec![name],
            Expr::Path(path, _) => path,
            other => {
                self.error(ParseError::Invalid {
                    message: "member access is only supported on package names".to_string(),
                    span: other.span(),
                });
                return None;
            }
        };
        self.bump(); // consume '.'

        let (name, _) = self.expect_identifier()?;
        path.push(name);

        Some(Expr::Path(path, self.span_from(start)))
    }
}
