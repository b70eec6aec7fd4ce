// ABOUTME: Tree-walking evaluator: statement/expression dispatch and control-flow unwinding

use crate::ast::{AssignTarget, BinaryOp, Expr, IncDecOp, Position, Program, Stmt, UnaryOp};
use crate::env::Environment;
use crate::error::ScriptError;
use crate::value::{FunctionValue, Value};
use log::trace;
use std::rc::Rc;

/// A non-local exit in flight: `return`, `break`, or `continue` (§5).
#[derive(Debug, Clone)]
enum Signal {
    Return(Value),
    Break,
    Continue,
}

/// The outcome of evaluating a statement or block: either a plain value, or
/// a signal that must keep unwinding until something catches it.
#[derive(Debug, Clone)]
enum Flow {
    Normal(Value),
    Signal(Signal),
}

pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    /// Evaluates a whole program in the given (root) environment, returning
    /// the value of its last statement — or, if `return` fires at top level,
    /// the returned value as the program's final value (§7).
    pub fn interpret(&self, program: &Program, env: &Rc<Environment>) -> Result<Value, ScriptError> {
        match self.eval_block(&program.statements, env, false)? {
            Flow::Normal(v) => Ok(v),
            Flow::Signal(Signal::Return(v)) => Ok(v),
            Flow::Signal(Signal::Break) => Err(ScriptError::runtime("break outside of loop")),
            Flow::Signal(Signal::Continue) => Err(ScriptError::runtime("continue outside of loop")),
        }
    }

    fn eval_block(
        &self,
        statements: &[Stmt],
        env: &Rc<Environment>,
        in_loop: bool,
    ) -> Result<Flow, ScriptError> {
        let mut result = Value::Null;
        for stmt in statements {
            match self.eval_stmt(stmt, env, in_loop)? {
                Flow::Normal(v) => result = v,
                signal @ Flow::Signal(_) => return Ok(signal),
            }
        }
        Ok(Flow::Normal(result))
    }

    fn eval_stmt(&self, stmt: &Stmt, env: &Rc<Environment>, in_loop: bool) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let v = self.eval_expr(value, env)?;
                env.define(name.clone(), v);
                Ok(Flow::Normal(Value::Null))
            }

            Stmt::Assign { target, value, .. } => {
                let v = self.eval_expr(value, env)?;
                self.do_assign(target, v.clone(), env)?;
                Ok(Flow::Normal(v))
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let c = self.eval_expr(cond, env)?;
                if c.is_truthy() {
                    self.eval_stmt(then_branch, env, in_loop)
                } else if let Some(eb) = else_branch {
                    self.eval_stmt(eb, env, in_loop)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }

            Stmt::While { cond, body, .. } => {
                loop {
                    let c = self.eval_expr(cond, env)?;
                    if !c.is_truthy() {
                        break;
                    }
                    match self.eval_stmt(body, env, true)? {
                        Flow::Normal(_) => {}
                        Flow::Signal(Signal::Break) => break,
                        Flow::Signal(Signal::Continue) => continue,
                        signal @ Flow::Signal(Signal::Return(_)) => return Ok(signal),
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }

            Stmt::For {
                init,
                cond,
                increment,
                body,
                ..
            } => {
                if let Some(init_stmt) = init {
                    self.eval_stmt(init_stmt, env, in_loop)?;
                }
                loop {
                    let keep_going = match cond {
                        Some(c) => self.eval_expr(c, env)?.is_truthy(),
                        None => true,
                    };
                    if !keep_going {
                        break;
                    }

                    match self.eval_stmt(body, env, true)? {
                        Flow::Normal(_) => {}
                        Flow::Signal(Signal::Break) => break,
                        Flow::Signal(Signal::Continue) => {
                            if let Some(inc) = increment {
                                self.eval_stmt(inc, env, in_loop)?;
                            }
                            continue;
                        }
                        signal @ Flow::Signal(Signal::Return(_)) => return Ok(signal),
                    }

                    if let Some(inc) = increment {
                        self.eval_stmt(inc, env, in_loop)?;
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }

            Stmt::Break(pos) => {
                if in_loop {
                    Ok(Flow::Signal(Signal::Break))
                } else {
                    Err(self.runtime_at("break outside of loop", *pos))
                }
            }

            Stmt::Continue(pos) => {
                if in_loop {
                    Ok(Flow::Signal(Signal::Continue))
                } else {
                    Err(self.runtime_at("continue outside of loop", *pos))
                }
            }

            Stmt::FunctionDef {
                name, params, body, ..
            } => {
                let func = Value::Function(Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    closure: env.clone(),
                }));
                env.define(name.clone(), func);
                Ok(Flow::Normal(Value::Null))
            }

            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Signal(Signal::Return(v)))
            }

            Stmt::Block { statements, .. } => {
                let child = Environment::child(env.clone());
                self.eval_block(statements, &child, in_loop)
            }

            Stmt::ExprStmt { expr, .. } => Ok(Flow::Normal(self.eval_expr(expr, env)?)),
        }
    }

    fn do_assign(
        &self,
        target: &AssignTarget,
        value: Value,
        env: &Rc<Environment>,
    ) -> Result<(), ScriptError> {
        match target {
            AssignTarget::Variable(name) => {
                env.set(name, value);
                Ok(())
            }
            AssignTarget::Index(name, index_expr) => {
                let array = self.lookup_array(name, env, index_expr.position())?;
                let index = self.eval_index(index_expr, env, &array)?;
                array.borrow_mut()[index] = value;
                Ok(())
            }
        }
    }

    fn eval_expr(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, ScriptError> {
        match expr {
            Expr::Int(i, _) => Ok(Value::Int(*i)),
            Expr::Float(f, _) => Ok(Value::Float(*f)),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Str(s, _) => Ok(Value::string(s.clone())),

            Expr::Array(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, env)?);
                }
                Ok(Value::array(values))
            }

            Expr::Variable(name, pos) => env
                .get(name)
                .ok_or_else(|| self.runtime_at(format!("undefined variable '{}'", name), *pos)),

            Expr::Index(array_expr, index_expr, pos) => {
                let array_val = self.eval_expr(array_expr, env)?;
                let array = match array_val {
                    Value::Array(a) => a,
                    other => {
                        return Err(self.runtime_at(
                            format!("cannot index into value of type {}", other.type_name()),
                            *pos,
                        ))
                    }
                };
                let index = self.eval_index(index_expr, env, &array)?;
                Ok(array.borrow()[index].clone())
            }

            Expr::Call(name, args, pos) => self.eval_call(name, args, env, *pos),

            Expr::Unary(op, operand, pos) => {
                let v = self.eval_expr(operand, env)?;
                self.eval_unary(*op, v, *pos)
            }

            Expr::Binary(op, left, right, pos) => {
                let lv = self.eval_expr(left, env)?;
                let rv = self.eval_expr(right, env)?;
                self.eval_binary(*op, lv, rv, *pos)
            }

            Expr::PreIncDec(op, target, pos) => {
                let name = self.incdec_target_name(target, *pos)?;
                let current = env
                    .get(&name)
                    .ok_or_else(|| self.runtime_at(format!("undefined variable '{}'", name), *pos))?;
                let updated = self.apply_incdec(*op, current, *pos)?;
                env.set(&name, updated.clone());
                Ok(updated)
            }

            Expr::PostIncDec(op, target, pos) => {
                let name = self.incdec_target_name(target, *pos)?;
                let current = env
                    .get(&name)
                    .ok_or_else(|| self.runtime_at(format!("undefined variable '{}'", name), *pos))?;
                let updated = self.apply_incdec(*op, current.clone(), *pos)?;
                env.set(&name, updated);
                Ok(current)
            }
        }
    }

    fn incdec_target_name(&self, target: &Expr, pos: Position) -> Result<String, ScriptError> {
        match target {
            Expr::Variable(name, _) => Ok(name.clone()),
            _ => Err(self.runtime_at("++/-- can only be applied to a variable", pos)),
        }
    }

    fn apply_incdec(&self, op: IncDecOp, value: Value, pos: Position) -> Result<Value, ScriptError> {
        let delta: i64 = match op {
            IncDecOp::Inc => 1,
            IncDecOp::Dec => -1,
        };
        match value {
            Value::Int(i) => Ok(Value::Int(i + delta)),
            Value::Float(f) => Ok(Value::Float(f + delta as f64)),
            other => Err(self.runtime_at(
                format!("cannot increment/decrement value of type {}", other.type_name()),
                pos,
            )),
        }
    }

    fn lookup_array(
        &self,
        name: &str,
        env: &Rc<Environment>,
        pos: Position,
    ) -> Result<Rc<std::cell::RefCell<Vec<Value>>>, ScriptError> {
        match env.get(name) {
            Some(Value::Array(a)) => Ok(a),
            Some(other) => Err(self.runtime_at(
                format!("cannot index into value of type {}", other.type_name()),
                pos,
            )),
            None => Err(self.runtime_at(format!("undefined variable '{}'", name), pos)),
        }
    }

    fn eval_index(
        &self,
        index_expr: &Expr,
        env: &Rc<Environment>,
        array: &Rc<std::cell::RefCell<Vec<Value>>>,
    ) -> Result<usize, ScriptError> {
        let pos = index_expr.position();
        let index_val = self.eval_expr(index_expr, env)?;
        let index = match index_val {
            Value::Int(i) => i,
            other => {
                return Err(self.runtime_at(
                    format!("array index must be an integer, got {}", other.type_name()),
                    pos,
                ))
            }
        };
        let len = array.borrow().len();
        if index < 0 || index as usize >= len {
            return Err(self.runtime_at(
                format!("index {} out of bounds (length {})", index, len),
                pos,
            ));
        }
        Ok(index as usize)
    }

    fn eval_call(
        &self,
        name: &str,
        arg_exprs: &[Expr],
        env: &Rc<Environment>,
        pos: Position,
    ) -> Result<Value, ScriptError> {
        let callee = env
            .get(name)
            .ok_or_else(|| self.runtime_at(format!("undefined function '{}'", name), pos))?;

        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.eval_expr(arg, env)?);
        }

        match callee {
            Value::Function(func) => self.call_function(&func, args, pos),
            Value::HostFn(builtin) => {
                trace!("calling built-in '{}' with {} args", builtin.name, args.len());
                (builtin.func)(&args)
            }
            other => Err(self.runtime_at(
                format!("'{}' is not callable (found {})", name, other.type_name()),
                pos,
            )),
        }
    }

    fn call_function(
        &self,
        func: &Rc<FunctionValue>,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Value, ScriptError> {
        if args.len() != func.params.len() {
            return Err(self.runtime_at(
                format!(
                    "function '{}' expects {} argument(s), got {}",
                    func.name,
                    func.params.len(),
                    args.len()
                ),
                pos,
            ));
        }

        let call_env = Environment::child(func.closure.clone());
        for (param, arg) in func.params.iter().zip(args.into_iter()) {
            call_env.define(param.clone(), arg);
        }

        match self.eval_block(&func.body, &call_env, false)? {
            Flow::Normal(_) => Ok(Value::Null),
            Flow::Signal(Signal::Return(v)) => Ok(v),
            Flow::Signal(Signal::Break) => Err(self.runtime_at("break outside of loop", pos)),
            Flow::Signal(Signal::Continue) => Err(self.runtime_at("continue outside of loop", pos)),
        }
    }

    fn eval_unary(&self, op: UnaryOp, value: Value, pos: Position) -> Result<Value, ScriptError> {
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
            UnaryOp::Neg => match value {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(self.runtime_at(
                    format!("cannot negate value of type {}", other.type_name()),
                    pos,
                )),
            },
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: Value,
        right: Value,
        pos: Position,
    ) -> Result<Value, ScriptError> {
        match op {
            BinaryOp::Add => self.eval_add(left, right, pos),
            BinaryOp::Sub => self.eval_numeric(left, right, pos, "-", |a, b| a - b, |a, b| a - b),
            BinaryOp::Mul => self.eval_numeric(left, right, pos, "*", |a, b| a * b, |a, b| a * b),
            BinaryOp::Mod => self.eval_mod(left, right, pos),
            BinaryOp::Div => self.eval_div(left, right, pos),

            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::NotEq => Ok(Value::Bool(left != right)),

            BinaryOp::Lt => self.eval_compare(left, right, pos, |o| o == std::cmp::Ordering::Less),
            BinaryOp::Gt => self.eval_compare(left, right, pos, |o| o == std::cmp::Ordering::Greater),
            BinaryOp::LtEq => {
                self.eval_compare(left, right, pos, |o| o != std::cmp::Ordering::Greater)
            }
            BinaryOp::GtEq => self.eval_compare(left, right, pos, |o| o != std::cmp::Ordering::Less),

            // Both operands are fully evaluated by the caller before this is
            // invoked — && and || are deliberately non-short-circuit here,
            // matching the reference implementation's behavior (see DESIGN.md).
            BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        }
    }

    fn eval_add(&self, left: Value, right: Value, pos: Position) -> Result<Value, ScriptError> {
        if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
            return Ok(Value::string(format!(
                "{}{}",
                left.display_string(),
                right.display_string()
            )));
        }
        self.eval_numeric(left, right, pos, "+", |a, b| a + b, |a, b| a + b)
    }

    fn eval_div(&self, left: Value, right: Value, pos: Position) -> Result<Value, ScriptError> {
        let (a, b) = self.require_numeric_pair(&left, &right, pos, "/")?;
        if b == 0.0 {
            return Err(self.runtime_at("Division by zero", pos));
        }
        if let (Value::Int(ai), Value::Int(bi)) = (&left, &right) {
            if ai % bi == 0 {
                return Ok(Value::Int(ai / bi));
            }
        }
        Ok(Value::Float(a / b))
    }

    fn eval_mod(&self, left: Value, right: Value, pos: Position) -> Result<Value, ScriptError> {
        if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
            if *b == 0 {
                return Err(self.runtime_at("Division by zero", pos));
            }
            return Ok(Value::Int(a % b));
        }
        let (a, b) = self.require_numeric_pair(&left, &right, pos, "%")?;
        Ok(Value::Float(a % b))
    }

    fn eval_numeric(
        &self,
        left: Value,
        right: Value,
        pos: Position,
        op_name: &str,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, ScriptError> {
        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
            _ => {
                let (a, b) = self.require_numeric_pair(&left, &right, pos, op_name)?;
                Ok(Value::Float(float_op(a, b)))
            }
        }
    }

    fn require_numeric_pair(
        &self,
        left: &Value,
        right: &Value,
        pos: Position,
        op_name: &str,
    ) -> Result<(f64, f64), ScriptError> {
        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(self.runtime_at(
                format!(
                    "cannot apply '{}' to types {} and {}",
                    op_name,
                    left.type_name(),
                    right.type_name()
                ),
                pos,
            )),
        }
    }

    fn eval_compare(
        &self,
        left: Value,
        right: Value,
        pos: Position,
        accept: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, ScriptError> {
        let ordering = match (&left, &right) {
            (Value::Str(a), Value::Str(b)) => a.as_str().cmp(b.as_str()),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a
                    .partial_cmp(&b)
                    .ok_or_else(|| self.runtime_at("comparison produced no ordering (NaN?)", pos))?,
                _ => {
                    return Err(self.runtime_at(
                        format!(
                            "cannot compare types {} and {}",
                            left.type_name(),
                            right.type_name()
                        ),
                        pos,
                    ))
                }
            },
        };
        Ok(Value::Bool(accept(ordering)))
    }

    fn runtime_at(&self, message: impl Into<String>, pos: Position) -> ScriptError {
        ScriptError::runtime(format!(
            "{} (line {}, column {})",
            message.into(),
            pos.line,
            pos.column
        ))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
