//! Static acceptance of parsed statements
//!
//! A statement is checked in full before it runs, so a rejected unit never
//! touches session state. Names that live outside the statement (session
//! variables, methods, packages) are looked up through [`Environment`].

use std::fmt;

use indexmap::IndexMap;

use super::parser::ast::*;
use crate::util::diagnostic::Diagnostic;
use crate::util::span::Span;

/// Static type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    Double,
    Boolean,
    Str,
    Void,
    /// Type of the `null` literal
    Null,
}

impl Ty {
    /// Type named by a declaration; `var` has none until inferred
    pub fn from_ref(ty: TypeRef) -> Option<Ty> {
        match ty {
            TypeRef::Int => Some(Ty::Int),
            TypeRef::Double => Some(Ty::Double),
            TypeRef::Boolean => Some(Ty::Boolean),
            TypeRef::Str => Some(Ty::Str),
            TypeRef::Void => Some(Ty::Void),
            TypeRef::Var => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Ty::Int | Ty::Double)
    }

    /// Whether a value of type `value` may be stored in a slot of this type
    pub fn accepts(
        self,
        value: Ty,
    ) -> bool {
        self == value
            || (self == Ty::Double && value == Ty::Int)
            || (self == Ty::Str && value == Ty::Null)
    }

    /// Result type of arithmetic on two numeric operands
    fn widen(
        self,
        other: Ty,
    ) -> Ty {
        if self == Ty::Double || other == Ty::Double {
            Ty::Double
        } else {
            Ty::Int
        }
    }

    fn is_reference(self) -> bool {
        matches!(self, Ty::Str | Ty::Null)
    }
}

impl fmt::Display for Ty {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Ty::Int => "int",
            Ty::Double => "double",
            Ty::Boolean => "boolean",
            Ty::Str => "String",
            Ty::Void => "void",
            Ty::Null => "<null>",
        };
        f.write_str(name)
    }
}

/// Names visible to a statement beyond its own locals
pub trait Environment {
    /// Type of a session variable
    fn global(
        &self,
        name: &str,
    ) -> Option<Ty>;

    /// Resolve the call target `path` and type the call against `args`
    fn call(
        &self,
        path: &[String],
        args: &[Ty],
    ) -> Result<Ty, String>;

    /// Validate an import against the known packages
    fn import(
        &self,
        import: &ImportDecl,
    ) -> Result<(), String>;
}

/// Check arguments against a declared parameter list
pub fn check_arguments(
    name: &str,
    params: &[Ty],
    args: &[Ty],
) -> Result<(), String> {
    let fits = params.len() == args.len()
        && params.iter().zip(args).all(|(param, arg)| param.accepts(*arg));
    if fits {
        Ok(())
    } else {
        Err(format!(
            "method {} cannot be applied to given types; required: {}; found: {}",
            name,
            type_list(params),
            type_list(args)
        ))
    }
}

/// `int, String` style list, `no arguments` when empty
pub fn type_list(types: &[Ty]) -> String {
    if types.is_empty() {
        "no arguments".to_string()
    } else {
        types
            .iter()
            .map(Ty::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// What a top-level statement introduces, once accepted
#[derive(Debug, Clone, PartialEq)]
pub enum Checked {
    /// Expression statement and its type
    Expr(Ty),
    /// Variable declaration and the declared (or inferred) types
    Variables(Vec<(String, Ty)>),
    Method,
    Import,
    /// Any other statement
    Statement,
}

/// Check a statement typed at the top level of a session
pub fn check_top_level<E: Environment + ?Sized>(
    env: &E,
    stmt: &Stmt,
) -> Result<Checked, Vec<Diagnostic>> {
    let mut checker = Checker::new(env);
    checker.scopes.push(IndexMap::new());

    let checked = match &stmt.kind {
        StmtKind::Expr(expr) => checker.expr(expr).map(Checked::Expr),
        StmtKind::VarDecl { ty, declarators, .. } => {
            checker.var_decl(*ty, declarators);
            let declared = checker.scopes[0]
                .iter()
                .map(|(name, ty)| (name.clone(), *ty))
                .collect();
            Some(Checked::Variables(declared))
        }
        StmtKind::Method(method) => {
            checker.method(method);
            Some(Checked::Method)
        }
        StmtKind::Import(import) => {
            if let Err(message) = env.import(import) {
                checker.error(message, stmt.span);
            }
            Some(Checked::Import)
        }
        _ => {
            checker.stmt(stmt);
            Some(Checked::Statement)
        }
    };

    match checked {
        Some(checked) if checker.diagnostics.is_empty() => Ok(checked),
        _ => Err(checker.diagnostics),
    }
}

/// Check a method declaration on its own (library loading)
pub fn check_method<E: Environment + ?Sized>(
    env: &E,
    method: &MethodDecl,
) -> Result<(), Vec<Diagnostic>> {
    let mut checker = Checker::new(env);
    checker.method(method);
    if checker.diagnostics.is_empty() {
        Ok(())
    } else {
        Err(checker.diagnostics)
    }
}

/// Method whose body is being checked
struct MethodContext {
    name: String,
    params: Vec<Ty>,
    return_type: Ty,
}

struct Checker<'e, E: Environment + ?Sized> {
    env: &'e E,
    /// Local scopes, innermost last. At the top level scope 0 holds the
    /// variables the statement declares for the session.
    scopes: Vec<IndexMap<String, Ty>>,
    method: Option<MethodContext>,
    loop_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'e, E: Environment + ?Sized> Checker<'e, E> {
    fn new(env: &'e E) -> Self {
        Self {
            env,
            scopes: Vec::new(),
            method: None,
            loop_depth: 0,
            diagnostics: Vec::new(),
        }
    }

    fn error(
        &mut self,
        message: impl Into<String>,
        span: Span,
    ) {
        self.diagnostics.push(Diagnostic::new(message, span));
    }

    /// Nested inside a method or a block, where only statement
    /// expressions and no declarations of methods or imports are allowed
    fn is_nested(&self) -> bool {
        self.method.is_some() || self.scopes.len() > 1
    }

    fn lookup(
        &self,
        name: &str,
    ) -> Option<Ty> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .or_else(|| self.env.global(name))
    }

    fn declare(
        &mut self,
        name: &str,
        ty: Ty,
        span: Span,
    ) {
        // Top-level declarations replace session variables instead of
        // clashing with them
        let top_level_declaration = self.method.is_none() && self.scopes.len() == 1;
        let clash = !top_level_declaration
            && self
                .scopes
                .iter()
                .skip(usize::from(self.method.is_none()))
                .any(|scope| scope.contains_key(name));
        if clash {
            self.error(format!("variable {} is already defined", name), span);
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn in_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.scopes.push(IndexMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn method(
        &mut self,
        method: &MethodDecl,
    ) {
        if self.is_nested() {
            self.error(
                "method declarations are only allowed at the top level",
                method.span,
            );
            return;
        }

        let params: Vec<Ty> = method
            .params
            .iter()
            .filter_map(|p| Ty::from_ref(p.ty))
            .collect();
        let return_type = Ty::from_ref(method.return_type).unwrap_or(Ty::Void);

        let saved_scopes = std::mem::take(&mut self.scopes);
        self.method = Some(MethodContext {
            name: method.name.clone(),
            params: params.clone(),
            return_type,
        });

        self.scopes.push(IndexMap::new());
        for (param, ty) in method.params.iter().zip(&params) {
            self.declare(&param.name, *ty, param.span);
        }
        self.in_scope(|this| {
            for stmt in &method.body.stmts {
                this.stmt(stmt);
            }
        });

        if return_type != Ty::Void && block_completes(&method.body) {
            self.error("missing return statement", method.body.span);
        }

        self.method = None;
        self.scopes = saved_scopes;
    }

    fn var_decl(
        &mut self,
        ty: TypeRef,
        declarators: &[Declarator],
    ) {
        for declarator in declarators {
            let declared = match (Ty::from_ref(ty), &declarator.init) {
                (Some(declared), Some(init)) => {
                    if let Some(value) = self.value(init) {
                        if !declared.accepts(value) {
                            self.error(
                                format!(
                                    "incompatible types: {} cannot be converted to {}",
                                    value, declared
                                ),
                                init.span(),
                            );
                        }
                    }
                    declared
                }
                (Some(declared), None) => declared,
                (None, Some(init)) => match self.value(init) {
                    Some(Ty::Null) => {
                        self.error(
                            format!(
                                "cannot infer type for variable {} (variable initializer is 'null')",
                                declarator.name
                            ),
                            declarator.span,
                        );
                        continue;
                    }
                    Some(value) => value,
                    None => continue,
                },
                (None, None) => {
                    self.error(
                        format!(
                            "cannot infer type for variable {} (cannot use 'var' without initializer)",
                            declarator.name
                        ),
                        declarator.span,
                    );
                    continue;
                }
            };
            self.declare(&declarator.name, declared, declarator.span);
        }
    }

    fn stmt(
        &mut self,
        stmt: &Stmt,
    ) {
        match &stmt.kind {
            StmtKind::VarDecl { ty, declarators, .. } => self.var_decl(*ty, declarators),
            StmtKind::Method(method) => self.method(method),
            StmtKind::Import(_) => {
                self.error("import declarations are only allowed at the top level", stmt.span)
            }
            StmtKind::Expr(expr) => {
                if self.is_nested() && !expr.is_statement_expression() {
                    self.error("not a statement", expr.span());
                } else {
                    self.expr(expr);
                }
            }
            StmtKind::Block(block) => self.in_scope(|this| {
                for stmt in &block.stmts {
                    this.stmt(stmt);
                }
            }),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.condition(cond);
                self.body(then_branch);
                if let Some(else_branch) = else_branch {
                    self.body(else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.condition(cond);
                self.loop_body(body);
            }
            StmtKind::DoWhile { body, cond } => {
                self.loop_body(body);
                self.condition(cond);
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.in_scope(|this| {
                if let Some(init) = init {
                    match &init.kind {
                        StmtKind::VarDecl { ty, declarators, .. } => {
                            this.var_decl(*ty, declarators)
                        }
                        StmtKind::Expr(expr) => this.statement_expr(expr),
                        _ => this.stmt(init),
                    }
                }
                if let Some(cond) = cond {
                    this.condition(cond);
                }
                for expr in update {
                    this.statement_expr(expr);
                }
                this.loop_body(body);
            }),
            StmtKind::Return(value) => self.return_stmt(value.as_ref(), stmt.span),
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.error("break outside switch or loop", stmt.span);
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error("continue outside of loop", stmt.span);
                }
            }
            StmtKind::Throw(value) => {
                self.value(value);
            }
            StmtKind::Empty => {}
        }
    }

    /// Branch or loop body; a bare declaration is not allowed there
    fn body(
        &mut self,
        stmt: &Stmt,
    ) {
        if matches!(stmt.kind, StmtKind::VarDecl { .. }) {
            self.error("variable declaration not allowed here", stmt.span);
            return;
        }
        self.in_scope(|this| this.stmt(stmt));
    }

    fn loop_body(
        &mut self,
        stmt: &Stmt,
    ) {
        self.loop_depth += 1;
        self.body(stmt);
        self.loop_depth -= 1;
    }

    fn statement_expr(
        &mut self,
        expr: &Expr,
    ) {
        if expr.is_statement_expression() {
            self.expr(expr);
        } else {
            self.error("not a statement", expr.span());
        }
    }

    fn return_stmt(
        &mut self,
        value: Option<&Expr>,
        span: Span,
    ) {
        let Some(return_type) = self.method.as_ref().map(|m| m.return_type) else {
            self.error("return outside method", span);
            return;
        };

        match (return_type, value) {
            (Ty::Void, Some(value)) => {
                self.error("incompatible types: unexpected return value", value.span())
            }
            (Ty::Void, None) => {}
            (_, None) => self.error("missing return value", span),
            (expected, Some(value)) => {
                if let Some(found) = self.value(value) {
                    if !expected.accepts(found) {
                        self.error(
                            format!(
                                "incompatible types: {} cannot be converted to {}",
                                found, expected
                            ),
                            value.span(),
                        );
                    }
                }
            }
        }
    }

    fn condition(
        &mut self,
        cond: &Expr,
    ) {
        if let Some(ty) = self.value(cond) {
            if ty != Ty::Boolean {
                self.error(
                    format!("incompatible types: {} cannot be converted to boolean", ty),
                    cond.span(),
                );
            }
        }
    }

    /// Type of an expression used as a value (`void` is rejected)
    fn value(
        &mut self,
        expr: &Expr,
    ) -> Option<Ty> {
        let ty = self.expr(expr)?;
        if ty == Ty::Void {
            self.error("'void' type not allowed here", expr.span());
            return None;
        }
        Some(ty)
    }

    /// Type of an expression, `None` once an error has been reported
    fn expr(
        &mut self,
        expr: &Expr,
    ) -> Option<Ty> {
        match expr {
            Expr::Lit(literal, _) => Some(match literal {
                Literal::Int(_) => Ty::Int,
                Literal::Float(_) => Ty::Double,
                Literal::Str(_) => Ty::Str,
                Literal::Bool(_) => Ty::Boolean,
                Literal::Null => Ty::Null,
            }),
            Expr::Var(name, span) => {
                let ty = self.lookup(name);
                if ty.is_none() {
                    self.error(format!("cannot find symbol: variable {}", name), *span);
                }
                ty
            }
            Expr::Path(path, span) => {
                self.error(format!("cannot find symbol: {}", path.join(".")), *span);
                None
            }
            Expr::Unary { op, expr, span } => {
                let operand = self.value(expr)?;
                let ok = match op {
                    UnOp::Neg => operand.is_numeric(),
                    UnOp::Not => operand == Ty::Boolean,
                };
                if ok {
                    Some(operand)
                } else {
                    let symbol = if *op == UnOp::Neg { "-" } else { "!" };
                    self.error(
                        format!("bad operand type {} for unary operator '{}'", operand, symbol),
                        *span,
                    );
                    None
                }
            }
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let lhs = self.value(left);
                let rhs = self.value(right);
                let (lhs, rhs) = (lhs?, rhs?);
                let ty = binary_type(*op, lhs, rhs);
                if ty.is_none() {
                    let message = if matches!(op, BinOp::Eq | BinOp::Neq) {
                        format!("incomparable types: {} and {}", lhs, rhs)
                    } else {
                        format!(
                            "bad operand types for binary operator '{}' (first type: {}, second type: {})",
                            op.symbol(),
                            lhs,
                            rhs
                        )
                    };
                    self.error(message, *span);
                }
                ty
            }
            Expr::Assign {
                op,
                target,
                value,
                span,
            } => {
                let target_ty = self.lookup(target);
                let value_ty = self.value(value)?;
                let Some(target_ty) = target_ty else {
                    self.error(format!("cannot find symbol: variable {}", target), *span);
                    return None;
                };
                let ok = match op {
                    AssignOp::Set => target_ty.accepts(value_ty),
                    AssignOp::Compound(BinOp::Add) if target_ty == Ty::Str => true,
                    AssignOp::Compound(_) => target_ty.is_numeric() && value_ty.is_numeric(),
                };
                if !ok {
                    self.error(
                        format!(
                            "incompatible types: {} cannot be converted to {}",
                            value_ty, target_ty
                        ),
                        value.span(),
                    );
                    return None;
                }
                Some(target_ty)
            }
            Expr::Step { target, span, .. } => {
                let Some(ty) = self.lookup(target) else {
                    self.error(format!("cannot find symbol: variable {}", target), *span);
                    return None;
                };
                if !ty.is_numeric() {
                    self.error(format!("bad operand type {} for increment", ty), *span);
                    return None;
                }
                Some(ty)
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
                span,
            } => {
                self.condition(cond);
                let a = self.value(then_expr);
                let b = self.value(else_expr);
                let (a, b) = (a?, b?);
                let ty = if a == b {
                    Some(a)
                } else if a.is_numeric() && b.is_numeric() {
                    Some(a.widen(b))
                } else if a.is_reference() && b.is_reference() {
                    Some(Ty::Str)
                } else {
                    None
                };
                if ty.is_none() {
                    self.error(
                        format!(
                            "incompatible types in conditional expression: {} and {}",
                            a, b
                        ),
                        *span,
                    );
                }
                ty
            }
            Expr::Call { path, args, span } => {
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.value(arg));
                }
                let arg_types: Vec<Ty> = arg_types.into_iter().collect::<Option<_>>()?;

                // The method being declared is visible to its own body
                let own = match (&self.method, path.as_slice()) {
                    (Some(method), [name]) if *name == method.name => {
                        Some(check_arguments(name, &method.params, &arg_types).map(|_| method.return_type))
                    }
                    _ => None,
                };
                let result = own.unwrap_or_else(|| self.env.call(path, &arg_types));
                match result {
                    Ok(ty) => Some(ty),
                    Err(message) => {
                        self.error(message, *span);
                        None
                    }
                }
            }
        }
    }
}

/// Result type of a binary operator, `None` when the operands don't fit
fn binary_type(
    op: BinOp,
    lhs: Ty,
    rhs: Ty,
) -> Option<Ty> {
    match op {
        BinOp::Add if lhs == Ty::Str || rhs == Ty::Str => Some(Ty::Str),
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            (lhs.is_numeric() && rhs.is_numeric()).then(|| lhs.widen(rhs))
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            (lhs.is_numeric() && rhs.is_numeric()).then_some(Ty::Boolean)
        }
        BinOp::Eq | BinOp::Neq => {
            let comparable = (lhs.is_numeric() && rhs.is_numeric())
                || (lhs == Ty::Boolean && rhs == Ty::Boolean)
                || (lhs.is_reference() && rhs.is_reference());
            comparable.then_some(Ty::Boolean)
        }
        BinOp::And | BinOp::Or => (lhs == Ty::Boolean && rhs == Ty::Boolean).then_some(Ty::Boolean),
    }
}

/// Whether execution can fall off the end of a block
fn block_completes(block: &Block) -> bool {
    block.stmts.iter().all(completes)
}

fn completes(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) | StmtKind::Throw(_) => false,
        StmtKind::Block(block) => block_completes(block),
        StmtKind::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => completes(then_branch) || completes(else_branch),
        StmtKind::While { cond, body } => !is_true(Some(cond)) || breaks(body),
        StmtKind::DoWhile { body, cond } => (completes(body) && !is_true(Some(cond))) || breaks(body),
        StmtKind::For { cond, body, .. } => !is_true(cond.as_ref()) || breaks(body),
        _ => true,
    }
}

/// A missing or literal `true` loop condition
fn is_true(cond: Option<&Expr>) -> bool {
    match cond {
        None => true,
        Some(Expr::Lit(Literal::Bool(value), _)) => *value,
        Some(_) => false,
    }
}

/// Whether a `break` leaves the enclosing loop from inside `stmt`
fn breaks(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Break => true,
        StmtKind::Block(block) => block.stmts.iter().any(breaks),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => breaks(then_branch) || else_branch.as_deref().is_some_and(breaks),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;
    use crate::frontend::parser::parse;

    /// Environment with a single global `g: int` and `twice(int): int`
    struct TestEnv;

    impl Environment for TestEnv {
        fn global(
            &self,
            name: &str,
        ) -> Option<Ty> {
            (name == "g").then_some(Ty::Int)
        }

        fn call(
            &self,
            path: &[String],
            args: &[Ty],
        ) -> Result<Ty, String> {
            match path {
                [name] if name == "twice" => {
                    check_arguments(name, &[Ty::Int], args).map(|_| Ty::Int)
                }
                [a, b, c] if a == "System" && b == "out" && c == "println" => Ok(Ty::Void),
                _ => Err(format!("cannot find symbol: method {}", path.join("."))),
            }
        }

        fn import(
            &self,
            import: &ImportDecl,
        ) -> Result<(), String> {
            if import.package == "math" {
                Ok(())
            } else {
                Err(format!("package {} does not exist", import.package))
            }
        }
    }

    fn check(source: &str) -> Result<Checked, Vec<String>> {
        let stmts = parse(&tokenize(source).unwrap()).unwrap();
        check_top_level(&TestEnv, &stmts[0])
            .map_err(|diags| diags.into_iter().map(|d| d.message).collect())
    }

    #[test]
    fn test_expression_types() {
        assert_eq!(check("1 + 2"), Ok(Checked::Expr(Ty::Int)));
        assert_eq!(check("1 + 2.5"), Ok(Checked::Expr(Ty::Double)));
        assert_eq!(check("\"n=\" + g"), Ok(Checked::Expr(Ty::Str)));
        assert_eq!(check("g > 1 ? \"a\" : null"), Ok(Checked::Expr(Ty::Str)));
        assert_eq!(check("twice(g)"), Ok(Checked::Expr(Ty::Int)));
        assert_eq!(check("System.out.println(1)"), Ok(Checked::Expr(Ty::Void)));
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            check("int a = 1, b = a + 1;"),
            Ok(Checked::Variables(vec![
                ("a".to_string(), Ty::Int),
                ("b".to_string(), Ty::Int)
            ]))
        );
        assert_eq!(
            check("var s = \"x\";"),
            Ok(Checked::Variables(vec![("s".to_string(), Ty::Str)]))
        );
        // Redeclaring a session variable replaces it
        assert!(check("String g = \"now a string\";").is_ok());
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            check("int x = \"s\";"),
            Err(vec!["incompatible types: String cannot be converted to int".to_string()])
        );
        assert_eq!(check("y + 1"), Err(vec!["cannot find symbol: variable y".to_string()]));
        assert!(check("if (g) g = 1;").is_err());
        assert!(check("twice(\"a\")").is_err());
        assert!(check("var n = null;").is_err());
        assert!(check("int v = System.out.println(1);").is_err());
        assert_eq!(check("break;"), Err(vec!["break outside switch or loop".to_string()]));
        assert_eq!(check("return 1;"), Err(vec!["return outside method".to_string()]));
        assert_eq!(
            check("import text.*;"),
            Err(vec!["package text does not exist".to_string()])
        );
    }

    #[test]
    fn test_methods() {
        assert_eq!(check("int sq(int n) { return n * n; }"), Ok(Checked::Method));
        assert_eq!(
            check("int fact(int n) { if (n <= 1) return 1; else return n * fact(n - 1); }"),
            Ok(Checked::Method)
        );
        assert_eq!(
            check("int bad(int n) { if (n > 0) return 1; }"),
            Err(vec!["missing return statement".to_string()])
        );
        assert_eq!(
            check("int spin() { while (true) { } }"),
            Ok(Checked::Method)
        );
        assert!(check("void f() { g; }").is_err());
        assert!(check("void f(int a) { int a = 1; }").is_err());
        assert!(check("void f() { return 1; }").is_err());
    }

    #[test]
    fn test_blocks_and_loops() {
        assert_eq!(
            check("for (int i = 0; i < 3; i++) { g += i; }"),
            Ok(Checked::Statement)
        );
        assert!(check("while (g > 0) { int t = g; int t = 1; }").is_err());
        assert!(check("{ 1 + 2; }").is_err());
        assert!(check("while (true) break;").is_ok());
    }
}
