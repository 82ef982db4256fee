//! Pratt Parser expression parsing

use super::ast::*;
use super::state::*;

impl<'a> ParserState<'a> {
    /// Parse an expression using Pratt parser
    ///
    /// # Algorithm
    /// 1. Parse prefix expression (nud)
    /// 2. While the next token is an infix or postfix operator whose left
    ///    binding power is at least `min_bp`, hand the expression to its led
    ///    parser, which parses its right operand with the right binding power
    ///
    /// Every nested expression and every applied operator counts towards
    /// [`MAX_NESTING`], which bounds the depth of the resulting tree.
    pub fn parse_expression(
        &mut self,
        min_bp: u8,
    ) -> Option<Expr> {
        let outer = self.depth();
        let expr = self.parse_operators(min_bp);
        self.restore_depth(outer);
        expr
    }

    fn parse_operators(
        &mut self,
        min_bp: u8,
    ) -> Option<Expr> {
        self.enter_nesting()?;
        let mut lhs = self.parse_prefix()?;

        loop {
            let (left_bp, right_bp, infix_fn) = match self.infix_info() {
                Some(info) => info,
                None => break,
            };

            if left_bp < min_bp {
                break;
            }

            self.enter_nesting()?;
            lhs = (infix_fn)(self, lhs, right_bp)?;
        }

        Some(lhs)
    }
}
