//! Abstract Syntax Tree types

use std::fmt;
use std::sync::Arc;

use crate::util::span::Span;

/// Declared type as written in source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Int,
    Double,
    Boolean,
    Str,
    Void,
    /// `var`, inferred from the initializer
    Var,
}

impl fmt::Display for TypeRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            TypeRef::Int => "int",
            TypeRef::Double => "double",
            TypeRef::Boolean => "boolean",
            TypeRef::Str => "String",
            TypeRef::Void => "void",
            TypeRef::Var => "var",
        };
        f.write_str(name)
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// Assignment operators; `Compound(op)` is `op=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Compound(BinOp),
}

/// Expression
#[derive(Debug, Clone)]
pub enum Expr {
    Lit(Literal, Span),
    Var(String, Span),
    /// Dotted name that is not (yet) a call, e.g. `math.sqrt` in `math.sqrt(2)`
    Path(Vec<String>, Span),
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Assign {
        op: AssignOp,
        target: String,
        value: Box<Expr>,
        span: Span,
    },
    /// `++x`, `x--`, ...
    Step {
        target: String,
        delta: i64,
        prefix: bool,
        span: Span,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },
    Call {
        path: Vec<String>,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit(_, span) | Expr::Var(_, span) | Expr::Path(_, span) => *span,
            Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Step { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }

    /// Whether the expression may stand alone as a statement inside a block
    pub fn is_statement_expression(&self) -> bool {
        matches!(
            self,
            Expr::Assign { .. } | Expr::Step { .. } | Expr::Call { .. }
        )
    }
}

/// One `name [= init]` part of a variable declaration
#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Method parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeRef,
    pub name: String,
    pub span: Span,
}

/// Method declaration
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: TypeRef,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

impl MethodDecl {
    /// `int sq(int)` style signature
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{} {}({})", self.return_type, self.name, params.join(", "))
    }
}

/// `import pkg.*;` or `import pkg.member;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportDecl {
    pub package: String,
    /// `None` for a wildcard import
    pub member: Option<String>,
}

impl ImportDecl {
    /// Parse the text after `import`, e.g. `math.*`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (package, member) = match text.strip_suffix(".*") {
            Some(package) => (package, None),
            None => {
                let (package, member) = text.rsplit_once('.')?;
                (package, Some(member.to_string()))
            }
        };
        if package.is_empty() || package.split('.').any(str::is_empty) {
            return None;
        }
        Some(Self {
            package: package.to_string(),
            member,
        })
    }
}

impl fmt::Display for ImportDecl {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}", self.package, member),
            None => write!(f, "{}.*", self.package),
        }
    }
}

/// Block of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl {
        ty: TypeRef,
        ty_span: Span,
        declarators: Vec<Declarator>,
    },
    Method(Arc<MethodDecl>),
    Import(ImportDecl),
    Expr(Expr),
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Throw(Expr),
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_parse() {
        let wildcard = ImportDecl::parse("math.*").unwrap();
        assert_eq!(wildcard.package, "math");
        assert_eq!(wildcard.member, None);
        assert_eq!(wildcard.to_string(), "math.*");

        let single = ImportDecl::parse("a.b.util.twice").unwrap();
        assert_eq!(single.package, "a.b.util");
        assert_eq!(single.member.as_deref(), Some("twice"));

        assert!(ImportDecl::parse("math").is_none());
        assert!(ImportDecl::parse("a..b").is_none());
    }
}
