//! Statement parsing

use std::sync::Arc;

use super::super::lexer::tokens::*;
use super::ast::*;
use super::state::*;
use super::ParseError;
use crate::util::span::Span;

impl<'a> ParserState<'a> {
    /// Parse a statement
    pub fn parse_stmt(&mut self) -> Option<Stmt> {
        let outer = self.depth();
        let stmt = self
            .enter_nesting()
            .and_then(|()| self.parse_stmt_kind());
        self.restore_depth(outer);
        stmt
    }

    fn parse_stmt_kind(&mut self) -> Option<Stmt> {
        let start = self.span();

        if self.at_declaration() {
            return self.parse_declaration(start);
        }

        match self.kind() {
            TokenKind::Semicolon => {
                self.bump();
                Some(Stmt {
                    kind: StmtKind::Empty,
                    span: start,
                })
            }
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Some(Stmt {
                    kind: StmtKind::Block(block),
                    span,
                })
            }
            TokenKind::KwIf => self.parse_if_stmt(start),
            TokenKind::KwWhile => self.parse_while_stmt(start),
            TokenKind::KwDo => self.parse_do_stmt(start),
            TokenKind::KwFor => self.parse_for_stmt(start),
            TokenKind::KwReturn => self.parse_return_stmt(start),
            TokenKind::KwBreak | TokenKind::KwContinue => self.parse_jump_stmt(start),
            TokenKind::KwThrow => self.parse_throw_stmt(start),
            TokenKind::KwImport => self.parse_import_stmt(start),
            TokenKind::KwElse => {
                self.error(ParseError::Invalid {
                    message: "'else' without 'if'".to_string(),
                    span: start,
                });
                None
            }
            _ => self.parse_expr_stmt(start),
        }
    }

    /// Parse `{ stmt* }`
    pub fn parse_block(&mut self) -> Option<Block> {
        let start = self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();

        while !self.at(&TokenKind::RBrace) {
            if self.at_end() {
                self.error(ParseError::UnexpectedEof { span: self.span() });
                return None;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.bump(); // consume '}'

        Some(Block {
            stmts,
            span: self.span_from(start),
        })
    }

    /// Parse a declared type keyword (or `String`)
    fn parse_type(&mut self) -> Option<(TypeRef, Span)> {
        let span = self.span();
        let ty = match self.kind() {
            TokenKind::KwInt => TypeRef::Int,
            TokenKind::KwDouble => TypeRef::Double,
            TokenKind::KwBoolean => TypeRef::Boolean,
            TokenKind::KwVar => TypeRef::Var,
            TokenKind::KwVoid => TypeRef::Void,
            TokenKind::Identifier(name) if name == "String" => TypeRef::Str,
            _ => {
                self.error_expected("<type>");
                return None;
            }
        };
        self.bump();
        Some((ty, span))
    }

    /// Parse a variable or method declaration
    fn parse_declaration(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        let (ty, ty_span) = self.parse_type()?;

        let is_method = matches!(self.kind(), TokenKind::Identifier(_))
            && matches!(
                self.peek_nth(1).map(|t| &t.kind),
                Some(TokenKind::LParen)
            );
        if is_method {
            let method = self.parse_method(start, ty, ty_span)?;
            return Some(Stmt {
                kind: StmtKind::Method(Arc::new(method)),
                span: self.span_from(start),
            });
        }

        let kind = self.parse_var_decl(ty, ty_span)?;
        self.expect_semicolon()?;
        Some(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// Parse the declarators of `ty a = 1, b`; the type is already consumed
    fn parse_var_decl(
        &mut self,
        ty: TypeRef,
        ty_span: Span,
    ) -> Option<StmtKind> {
        if ty == TypeRef::Void {
            self.error(ParseError::Invalid {
                message: "'void' type not allowed here".to_string(),
                span: ty_span,
            });
            return None;
        }

        let mut declarators = Vec::new();
        loop {
            let (name, name_span) = self.expect_identifier()?;
            let init = if self.skip(&TokenKind::Eq) {
                Some(self.parse_expression(BP_ASSIGN)?)
            } else {
                None
            };
            declarators.push(Declarator {
                name,
                init,
                span: self.span_from(name_span),
            });

            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }

        if ty == TypeRef::Var && declarators.len() > 1 {
            self.error(ParseError::Invalid {
                message: "'var' is not allowed in a compound declaration".to_string(),
                span: ty_span,
            });
            return None;
        }

        Some(StmtKind::VarDecl {
            ty,
            ty_span,
            declarators,
        })
    }

    /// Parse `name(params) { body }`; the return type is already consumed
    fn parse_method(
        &mut self,
        start: Span,
        return_type: TypeRef,
        ty_span: Span,
    ) -> Option<MethodDecl> {
        if return_type == TypeRef::Var {
            self.error(ParseError::Invalid {
                message: "'var' is not allowed here".to_string(),
                span: ty_span,
            });
            return None;
        }

        let (name, _) = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;

        let mut params: Vec<Param> = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (ty, span) = self.parse_type()?;
                if matches!(ty, TypeRef::Var | TypeRef::Void) {
                    self.error(ParseError::Invalid {
                        message: format!("'{}' is not allowed here", ty),
                        span,
                    });
                    return None;
                }
                let (param_name, _) = self.expect_identifier()?;
                params.push(Param {
                    ty,
                    name: param_name,
                    span: self.span_from(span),
                });
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_block()?;

        Some(MethodDecl {
            name,
            return_type,
            params,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse `if (cond) stmt [else stmt]`
    fn parse_if_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'if'
        let cond = self.parse_condition()?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.skip(&TokenKind::KwElse) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };

        Some(Stmt {
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span: self.span_from(start),
        })
    }

    /// Parse `while (cond) stmt`
    fn parse_while_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'while'
        let cond = self.parse_condition()?;
        let body = Box::new(self.parse_stmt()?);

        Some(Stmt {
            kind: StmtKind::While { cond, body },
            span: self.span_from(start),
        })
    }

    /// Parse `do stmt while (cond);`
    fn parse_do_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'do'
        let body = Box::new(self.parse_stmt()?);
        self.expect(&TokenKind::KwWhile)?;
        let cond = self.parse_condition()?;
        self.expect_semicolon()?;

        Some(Stmt {
            kind: StmtKind::DoWhile { body, cond },
            span: self.span_from(start),
        })
    }

    /// Parse `for (init; cond; update) stmt`
    fn parse_for_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'for'
        self.expect(&TokenKind::LParen)?;

        let init = if self.at(&TokenKind::Semicolon) {
            None
        } else if self.at_declaration() {
            let init_start = self.span();
            let (ty, ty_span) = self.parse_type()?;
            let kind = self.parse_var_decl(ty, ty_span)?;
            Some(Box::new(Stmt {
                kind,
                span: self.span_from(init_start),
            }))
        } else {
            let expr = self.parse_expression(BP_LOWEST)?;
            let span = expr.span();
            Some(Box::new(Stmt {
                kind: StmtKind::Expr(expr),
                span,
            }))
        };
        self.expect(&TokenKind::Semicolon)?;

        let cond = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(BP_LOWEST)?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let mut update = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                update.push(self.parse_expression(BP_LOWEST)?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;

        let body = Box::new(self.parse_stmt()?);

        Some(Stmt {
            kind: StmtKind::For {
                init,
                cond,
                update,
                body,
            },
            span: self.span_from(start),
        })
    }

    /// Parse `( expr )` after a control keyword
    fn parse_condition(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expression(BP_LOWEST)?;
        self.expect(&TokenKind::RParen)?;
        Some(cond)
    }

    /// Parse `return [expr];`
    fn parse_return_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'return'
        let value = if self.at(&TokenKind::Semicolon) || self.at_end() {
            None
        } else {
            Some(self.parse_expression(BP_LOWEST)?)
        };
        self.expect_semicolon()?;

        Some(Stmt {
            kind: StmtKind::Return(value),
            span: self.span_from(start),
        })
    }

    /// Parse `break;` / `continue;`
    fn parse_jump_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        let kind = if self.at(&TokenKind::KwBreak) {
            StmtKind::Break
        } else {
            StmtKind::Continue
        };
        self.bump();
        self.expect_semicolon()?;

        Some(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// Parse `throw expr;`
    fn parse_throw_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'throw'
        let value = self.parse_expression(BP_LOWEST)?;
        self.expect_semicolon()?;

        Some(Stmt {
            kind: StmtKind::Throw(value),
            span: self.span_from(start),
        })
    }

    /// Parse `import a.b.*;` / `import a.b.member;`
    fn parse_import_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        self.bump(); // consume 'import'

        let (first, _) = self.expect_identifier()?;
        let mut segments = vec![first];
        let mut wildcard = false;

        while self.skip(&TokenKind::Dot) {
            if self.skip(&TokenKind::Star) {
                wildcard = true;
                break;
            }
            let (segment, _) = self.expect_identifier()?;
            segments.push(segment);
        }

        let import = if wildcard {
            ImportDecl {
                package: segments.join("."),
                member: None,
            }
        } else if segments.len() > 1 {
            let member = segments.pop();
            ImportDecl {
                package: segments.join("."),
                member,
            }
        } else {
            self.error_expected("'.'");
            return None;
        };
        self.expect_semicolon()?;

        Some(Stmt {
            kind: StmtKind::Import(import),
            span: self.span_from(start),
        })
    }

    /// Parse `expr;`
    fn parse_expr_stmt(
        &mut self,
        start: Span,
    ) -> Option<Stmt> {
        let expr = self.parse_expression(BP_LOWEST)?;
        self.expect_semicolon()?;

        Some(Stmt {
            kind: StmtKind::Expr(expr),
            span: self.span_from(start),
        })
    }
}
