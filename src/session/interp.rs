//! Tree-walking interpreter
//!
//! Runs checked statements against the session state. Runtime failures
//! travel as `Err(ThrownError)` and carry the method frames active when
//! they were raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use super::io::SessionIo;
use super::natives::NativeContext;
use super::result::{class, ThrownError};
use super::state::{CallScope, Callee, SessionState, Variable};
use super::value::{Value, MAX_STRING_LEN};
use crate::frontend::check::Ty;
use crate::frontend::parser::ast::*;

/// Deepest method nesting before `StackOverflowError`
pub const MAX_CALL_DEPTH: usize = 256;

type Exec<T> = Result<T, ThrownError>;

/// How a statement finished
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Activation of the top-level snippet or of one method call
struct Frame {
    /// Trace name; `None` for the snippet itself
    name: Option<String>,
    scope: CallScope,
    /// Local scopes, innermost last
    locals: Vec<IndexMap<String, Variable>>,
}

impl Frame {
    fn new(
        name: Option<String>,
        scope: CallScope,
    ) -> Self {
        Self {
            name,
            scope,
            locals: vec![IndexMap::new()],
        }
    }

    fn scope_of(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.locals.iter().rposition(|scope| scope.contains_key(name))
    }
}

pub(crate) struct Interpreter<'s> {
    state: &'s mut SessionState,
    io: &'s mut SessionIo,
    interrupt: &'s AtomicBool,
    frames: Vec<Frame>,
}

impl<'s> Interpreter<'s> {
    pub fn new(
        state: &'s mut SessionState,
        io: &'s mut SessionIo,
        interrupt: &'s AtomicBool,
    ) -> Self {
        Self {
            state,
            io,
            interrupt,
            frames: vec![Frame::new(None, CallScope::Session)],
        }
    }

    /// Declare a session variable
    ///
    /// The variable exists afterwards even when the initializer throws; it
    /// then holds the default value of its type.
    pub fn declare(
        &mut self,
        name: &str,
        ty: Ty,
        init: Option<&Expr>,
    ) -> Exec<()> {
        let value = match init {
            Some(init) => self.eval(init).map(|value| value.coerce(ty)),
            None => Ok(Value::default_for(ty)),
        };
        let (value, result) = match value {
            Ok(value) => (value, Ok(())),
            Err(thrown) => (Value::default_for(ty), Err(thrown)),
        };
        self.state.define_variable(name, Variable { ty, value });
        result
    }

    /// Evaluate a top-level expression statement
    pub fn eval_top(
        &mut self,
        expr: &Expr,
    ) -> Exec<Value> {
        self.eval(expr)
    }

    /// Run any other top-level statement
    pub fn run(
        &mut self,
        stmt: &Stmt,
    ) -> Exec<()> {
        self.exec(stmt).map(|_| ())
    }

    fn frame(&self) -> &Frame {
        // The snippet frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Error of `class` with the current method frames as its trace
    fn raise(
        &self,
        class: &str,
        message: impl Into<String>,
    ) -> ThrownError {
        let mut thrown = ThrownError::new(class, message);
        thrown.trace = self.trace();
        thrown
    }

    fn trace(&self) -> Vec<String> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| frame.name.clone())
            .collect()
    }

    fn check_interrupt(&self) -> Exec<()> {
        if self.interrupt.load(Ordering::SeqCst) {
            Err(self.raise(class::INTERRUPTED, "evaluation interrupted"))
        } else {
            Ok(())
        }
    }

    fn in_scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Exec<T>,
    ) -> Exec<T> {
        self.frame_mut().locals.push(IndexMap::new());
        let result = body(self);
        self.frame_mut().locals.pop();
        result
    }

    fn lookup(
        &self,
        name: &str,
    ) -> Option<&Variable> {
        let frame = self.frame();
        if let Some(index) = frame.scope_of(name) {
            return frame.locals[index].get(name);
        }
        match frame.scope {
            CallScope::Session => self.state.variables.get(name),
            CallScope::Library(_) => None,
        }
    }

    fn slot(
        &mut self,
        name: &str,
    ) -> Option<&mut Variable> {
        match self.frame().scope_of(name) {
            Some(index) => self.frame_mut().locals[index].get_mut(name),
            None if matches!(self.frame().scope, CallScope::Session) => {
                self.state.variables.get_mut(name)
            }
            None => None,
        }
    }

    fn load(
        &self,
        name: &str,
    ) -> Exec<Value> {
        self.lookup(name)
            .map(|variable| variable.value.clone())
            .ok_or_else(|| self.raise(class::RUNTIME, format!("cannot find symbol: variable {}", name)))
    }

    /// Store into an existing variable, returning the stored value
    fn store(
        &mut self,
        name: &str,
        value: Value,
    ) -> Exec<Value> {
        match self.slot(name) {
            Some(variable) => {
                variable.value = value.coerce(variable.ty);
                Ok(variable.value.clone())
            }
            None => Err(self.raise(class::RUNTIME, format!("cannot find symbol: variable {}", name))),
        }
    }

    fn exec_block(
        &mut self,
        block: &Block,
    ) -> Exec<Flow> {
        self.in_scope(|this| {
            for stmt in &block.stmts {
                match this.exec(stmt)? {
                    Flow::Normal => {}
                    flow => return Ok(flow),
                }
            }
            Ok(Flow::Normal)
        })
    }

    fn exec(
        &mut self,
        stmt: &Stmt,
    ) -> Exec<Flow> {
        match &stmt.kind {
            StmtKind::VarDecl { ty, declarators, .. } => {
                for declarator in declarators {
                    let value = match &declarator.init {
                        Some(init) => self.eval(init)?,
                        None => Value::default_for(Ty::from_ref(*ty).unwrap_or(Ty::Void)),
                    };
                    let ty = Ty::from_ref(*ty).unwrap_or_else(|| value.ty());
                    let variable = Variable {
                        ty,
                        value: value.coerce(ty),
                    };
                    if let Some(scope) = self.frame_mut().locals.last_mut() {
                        scope.insert(declarator.name.clone(), variable);
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::Block(block) => self.exec_block(block),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.truth(cond)? {
                    self.exec(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::While { cond, body } => {
                loop {
                    self.check_interrupt()?;
                    if !self.truth(cond)? {
                        break;
                    }
                    match self.exec(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::DoWhile { body, cond } => {
                loop {
                    self.check_interrupt()?;
                    match self.exec(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.truth(cond)? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.in_scope(|this| {
                if let Some(init) = init {
                    this.exec(init)?;
                }
                loop {
                    this.check_interrupt()?;
                    if let Some(cond) = cond {
                        if !this.truth(cond)? {
                            break;
                        }
                    }
                    match this.exec(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    for expr in update {
                        this.eval(expr)?;
                    }
                }
                Ok(Flow::Normal)
            }),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Throw(expr) => {
                let value = self.eval(expr)?;
                Err(self.raise(class::RUNTIME, value.to_string()))
            }
            // Only reachable at the top level, where the session binds them
            StmtKind::Method(_) | StmtKind::Import(_) | StmtKind::Empty => Ok(Flow::Normal),
        }
    }

    fn truth(
        &mut self,
        cond: &Expr,
    ) -> Exec<bool> {
        match self.eval(cond)? {
            Value::Bool(value) => Ok(value),
            other => Err(self.raise(
                class::RUNTIME,
                format!("incompatible types: {} cannot be converted to boolean", other.ty()),
            )),
        }
    }

    fn eval(
        &mut self,
        expr: &Expr,
    ) -> Exec<Value> {
        match expr {
            Expr::Lit(literal, _) => Ok(match literal {
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(f) => Value::Double(*f),
                Literal::Str(s) => Value::string(s.as_str()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            Expr::Var(name, _) => self.load(name),
            Expr::Path(path, _) => Err(self.raise(
                class::RUNTIME,
                format!("cannot find symbol: variable {}", path.join(".")),
            )),
            Expr::Unary { op, expr, .. } => {
                let value = self.eval(expr)?;
                match (op, value) {
                    (UnOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                    (UnOp::Neg, Value::Double(f)) => Ok(Value::Double(-f)),
                    (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (op, value) => Err(self.raise(
                        class::RUNTIME,
                        format!("bad operand type {} for unary operator {:?}", value.ty(), op),
                    )),
                }
            }
            Expr::Binary {
                op: BinOp::And,
                left,
                right,
                ..
            } => Ok(Value::Bool(self.truth(left)? && self.truth(right)?)),
            Expr::Binary {
                op: BinOp::Or,
                left,
                right,
                ..
            } => Ok(Value::Bool(self.truth(left)? || self.truth(right)?)),
            Expr::Binary {
                op, left, right, ..
            } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                self.binary(*op, lhs, rhs)
            }
            Expr::Assign {
                op, target, value, ..
            } => {
                let value = self.eval(value)?;
                let value = match op {
                    AssignOp::Set => value,
                    AssignOp::Compound(op) => {
                        let current = self.load(target)?;
                        self.binary(*op, current, value)?
                    }
                };
                self.store(target, value)
            }
            Expr::Step {
                target,
                delta,
                prefix,
                ..
            } => {
                let current = self.load(target)?;
                let stepped = self.binary(BinOp::Add, current.clone(), Value::Int(*delta))?;
                let stored = self.store(target, stepped)?;
                Ok(if *prefix { stored } else { current })
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                if self.truth(cond)? {
                    self.eval(then_expr)
                } else {
                    self.eval(else_expr)
                }
            }
            Expr::Call { path, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call(path, values)
            }
        }
    }

    fn binary(
        &self,
        op: BinOp,
        lhs: Value,
        rhs: Value,
    ) -> Exec<Value> {
        use Value::*;

        let value = match (op, &lhs, &rhs) {
            (BinOp::Add, Str(_), _) | (BinOp::Add, _, Str(_)) => {
                let text = format!("{}{}", lhs, rhs);
                if text.len() > MAX_STRING_LEN {
                    return Err(self.raise(
                        class::RUNTIME,
                        format!("requested length too large: {}", text.len()),
                    ));
                }
                Value::string(text)
            }
            (BinOp::Div | BinOp::Mod, Int(_), Int(0)) => {
                return Err(self.raise(class::ARITHMETIC, "/ by zero"));
            }
            (_, Int(a), Int(b)) => match op {
                BinOp::Add => Int(a.wrapping_add(*b)),
                BinOp::Sub => Int(a.wrapping_sub(*b)),
                BinOp::Mul => Int(a.wrapping_mul(*b)),
                BinOp::Div => Int(a.wrapping_div(*b)),
                BinOp::Mod => Int(a.wrapping_rem(*b)),
                BinOp::Eq => Bool(a == b),
                BinOp::Neq => Bool(a != b),
                BinOp::Lt => Bool(a < b),
                BinOp::Le => Bool(a <= b),
                BinOp::Gt => Bool(a > b),
                BinOp::Ge => Bool(a >= b),
                BinOp::And | BinOp::Or => return Err(self.bad_operands(op, &lhs, &rhs)),
            },
            (_, Int(_) | Double(_), Int(_) | Double(_)) => {
                let (a, b) = match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(self.bad_operands(op, &lhs, &rhs)),
                };
                match op {
                    BinOp::Add => Double(a + b),
                    BinOp::Sub => Double(a - b),
                    BinOp::Mul => Double(a * b),
                    BinOp::Div => Double(a / b),
                    BinOp::Mod => Double(a % b),
                    BinOp::Eq => Bool(a == b),
                    BinOp::Neq => Bool(a != b),
                    BinOp::Lt => Bool(a < b),
                    BinOp::Le => Bool(a <= b),
                    BinOp::Gt => Bool(a > b),
                    BinOp::Ge => Bool(a >= b),
                    BinOp::And | BinOp::Or => return Err(self.bad_operands(op, &lhs, &rhs)),
                }
            }
            (BinOp::Eq | BinOp::Neq, Bool(a), Bool(b)) => Bool((a == b) == (op == BinOp::Eq)),
            (BinOp::Eq | BinOp::Neq, Str(_) | Null, Str(_) | Null) => {
                Bool((lhs == rhs) == (op == BinOp::Eq))
            }
            _ => return Err(self.bad_operands(op, &lhs, &rhs)),
        };
        Ok(value)
    }

    fn bad_operands(
        &self,
        op: BinOp,
        lhs: &Value,
        rhs: &Value,
    ) -> ThrownError {
        self.raise(
            class::RUNTIME,
            format!(
                "bad operand types for binary operator '{}': {} and {}",
                op.symbol(),
                lhs.ty(),
                rhs.ty()
            ),
        )
    }

    fn call(
        &mut self,
        path: &[String],
        args: Vec<Value>,
    ) -> Exec<Value> {
        self.check_interrupt()?;
        let scope = self.frame().scope.clone();
        let callee = self.state.linker().resolve(&scope, path).ok_or_else(|| {
            self.raise(
                class::RUNTIME,
                format!("cannot find symbol: method {}", path.join(".")),
            )
        })?;
        trace!("call {}", callee.frame_name());

        match callee {
            Callee::Native { function, .. } => {
                let mut context = NativeContext {
                    out: &mut *self.io.out,
                    err: &mut *self.io.err,
                    input: &mut *self.io.input,
                };
                (function.func)(&mut context, &args).map_err(|mut thrown| {
                    if thrown.trace.is_empty() {
                        thrown.trace = self.trace();
                    }
                    thrown
                })
            }
            Callee::Session(method) => self.invoke(method.name.clone(), CallScope::Session, &method, args),
            Callee::Library { library, method } => {
                let name = format!("{}.{}", library.package, method.name);
                self.invoke(name, CallScope::Library(library), &method, args)
            }
        }
    }

    fn invoke(
        &mut self,
        name: String,
        scope: CallScope,
        method: &Arc<MethodDecl>,
        args: Vec<Value>,
    ) -> Exec<Value> {
        // The snippet frame does not count towards the depth
        if self.frames.len() > MAX_CALL_DEPTH {
            return Err(self.raise(class::STACK_OVERFLOW, format!("call depth exceeded {}", MAX_CALL_DEPTH)));
        }
        if method.params.len() != args.len() {
            return Err(self.raise(
                class::RUNTIME,
                format!("method {} cannot be applied to given types", name),
            ));
        }

        let mut frame = Frame::new(Some(name), scope);
        for (param, arg) in method.params.iter().zip(args) {
            let ty = Ty::from_ref(param.ty).unwrap_or_else(|| arg.ty());
            frame.locals[0].insert(
                param.name.clone(),
                Variable {
                    ty,
                    value: arg.coerce(ty),
                },
            );
        }

        self.frames.push(frame);
        let flow = self.exec_block(&method.body);
        self.frames.pop();

        let return_type = Ty::from_ref(method.return_type).unwrap_or(Ty::Void);
        match flow? {
            Flow::Return(value) => Ok(value.coerce(return_type)),
            _ => Ok(Value::Void),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_unit;
    use crate::session::io::NoInput;

    fn io() -> SessionIo {
        SessionIo {
            out: Box::new(Vec::new()),
            err: Box::new(Vec::new()),
            input: Box::new(NoInput),
        }
    }

    fn eval(
        state: &mut SessionState,
        source: &str,
    ) -> Exec<Value> {
        let stmt = parse_unit(source).unwrap().remove(0);
        let interrupt = AtomicBool::new(false);
        let mut io = io();
        let mut interp = Interpreter::new(state, &mut io, &interrupt);
        match &stmt.kind {
            StmtKind::Expr(expr) => interp.eval_top(expr),
            StmtKind::Method(method) => {
                state_define(&mut interp, method.clone());
                Ok(Value::Void)
            }
            _ => interp.run(&stmt).map(|_| Value::Void),
        }
    }

    fn state_define(
        interp: &mut Interpreter<'_>,
        method: Arc<MethodDecl>,
    ) {
        interp.state.define_method(method);
    }

    #[test]
    fn test_integer_arithmetic() {
        let mut state = SessionState::default();
        assert_eq!(eval(&mut state, "7 / 2;").unwrap(), Value::Int(3));
        assert_eq!(eval(&mut state, "-7 % 3;").unwrap(), Value::Int(-1));
        assert_eq!(eval(&mut state, "1 + 2.5;").unwrap(), Value::Double(3.5));
        assert_eq!(eval(&mut state, "\"n=\" + 1 + 2;").unwrap(), Value::string("n=12"));
        assert_eq!(
            eval(&mut state, "9223372036854775807 + 1;").unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn test_division_by_zero() {
        let mut state = SessionState::default();
        let thrown = eval(&mut state, "1 / 0;").unwrap_err();
        assert_eq!(thrown.class, class::ARITHMETIC);
        assert_eq!(thrown.message, "/ by zero");
        assert!(thrown.trace.is_empty());
        assert_eq!(eval(&mut state, "1.0 / 0;").unwrap(), Value::Double(f64::INFINITY));
    }

    #[test]
    fn test_unbounded_string_growth_throws() {
        let mut state = SessionState::default();
        let thrown = eval(&mut state, "{ String s = \"ab\"; while (true) { s = s + s; } }").unwrap_err();
        assert_eq!(thrown.class, class::RUNTIME);
        assert!(thrown.message.starts_with("requested length too large"));
    }

    #[test]
    fn test_loops_and_locals() {
        let mut state = SessionState::default();
        eval(
            &mut state,
            "int sum(int n) { int total = 0; for (int i = 1; i <= n; i++) { if (i % 2 == 0) continue; total += i; } return total; }",
        )
        .unwrap();
        assert_eq!(eval(&mut state, "sum(5);").unwrap(), Value::Int(9));

        eval(
            &mut state,
            "int firstOver(int limit) { int i = 0; while (true) { i++; if (i * i > limit) break; } return i; }",
        )
        .unwrap();
        assert_eq!(eval(&mut state, "firstOver(50);").unwrap(), Value::Int(8));
    }

    #[test]
    fn test_trace_lists_frames_innermost_first() {
        let mut state = SessionState::default();
        eval(&mut state, "int inner(int x) { return 10 / x; }").unwrap();
        eval(&mut state, "int outer(int x) { return inner(x - 1); }").unwrap();
        let thrown = eval(&mut state, "outer(1);").unwrap_err();
        assert_eq!(thrown.trace, ["inner", "outer"]);
    }

    #[test]
    fn test_throw_uses_display_text() {
        let mut state = SessionState::default();
        let thrown = eval(&mut state, "throw \"boom\" + 1;").unwrap_err();
        assert_eq!(thrown.class, class::RUNTIME);
        assert_eq!(thrown.message, "boom1");
    }

    #[test]
    fn test_interrupt_stops_loops() {
        let mut state = SessionState::default();
        let stmt = parse_unit("while (true) { }").unwrap().remove(0);
        let interrupt = AtomicBool::new(true);
        let mut io = io();
        let mut interp = Interpreter::new(&mut state, &mut io, &interrupt);
        let thrown = interp.run(&stmt).unwrap_err();
        assert_eq!(thrown.class, class::INTERRUPTED);
    }

    #[test]
    fn test_declare_keeps_variable_when_initializer_throws() {
        let mut state = SessionState::default();
        let init = match parse_unit("1 / 0;").unwrap().remove(0).kind {
            StmtKind::Expr(expr) => expr,
            other => panic!("unexpected {:?}", other),
        };
        let interrupt = AtomicBool::new(false);
        let mut io = io();
        let mut interp = Interpreter::new(&mut state, &mut io, &interrupt);
        assert!(interp.declare("x", Ty::Int, Some(&init)).is_err());
        assert_eq!(state.variables["x"].value, Value::Int(0));
    }
}
