//! Core expression and statement evaluator.

use std::rc::Rc;

use microc_types::ast::*;
use microc_types::{validate_program, validate_tree, Node};

use crate::env::{Binding, Ctx, Scope};
use crate::error::{EvalError, EvalResult};
use crate::options::EvalOptions;
use crate::output::Output;
use crate::runtime;
use crate::value::{ArrayRef, Function, Instance, Value};

/// Remaining stack below which the evaluator grows it.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each stack extension.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to completion; carries the statement's value.
    Normal(Value),
    /// A `return` is unwinding to the nearest function call.
    Return(Value),
}

/// Tree-walking evaluator: runs AST nodes against a [`Ctx`] and produces
/// Values.
pub struct Evaluator {
    options: EvalOptions,
    /// Destination of `printf`.
    output: Output,
    /// Number of user function calls currently active.
    depth: usize,
}

impl Evaluator {
    pub fn new(options: EvalOptions) -> Self {
        let output = if options.capture_output {
            Output::captured()
        } else {
            Output::Stdout
        };
        Self {
            options,
            output,
            depth: 0,
        }
    }

    /// Lines written by `printf` so far, when output is captured.
    pub fn output(&self) -> &[String] {
        self.output.lines()
    }

    /// Take the captured lines, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<String> {
        self.output.take()
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry points
    // ══════════════════════════════════════════════════════════════════════

    /// Validate and run a whole program against `ctx`.
    ///
    /// Yields null, or the result of `main()` when
    /// [`auto_execute_main`](EvalOptions::auto_execute_main) is set and
    /// `main` is defined. A dynamic error is logged together with the
    /// root environment and then returned.
    pub fn run(&mut self, program: &Program, ctx: &Ctx) -> EvalResult<Value> {
        if !self.options.skip_validation {
            validate_program(program)?;
        }
        tracing::debug!(statements = program.stmts.len(), "running program");

        let result = self.eval_program(program, ctx).and_then(|value| {
            if self.options.auto_execute_main {
                self.call_main(ctx).map(|main| main.unwrap_or(value))
            } else {
                Ok(value)
            }
        });
        report(result, ctx)
    }

    /// Validate and evaluate a bare expression against `ctx`.
    pub fn eval(&mut self, expr: &Expr, ctx: &Ctx) -> EvalResult<Value> {
        if !self.options.skip_validation {
            validate_tree(Node::Expr(expr))?;
        }
        let result = self.eval_expr(expr, ctx);
        report(result, ctx)
    }

    /// Call `main()` if the program defined one.
    fn call_main(&mut self, ctx: &Ctx) -> EvalResult<Option<Value>> {
        match ctx.lookup("main") {
            Some(Binding {
                value: Value::Function(main),
                ..
            }) => self.call_function(&main, Vec::new()).map(Some),
            _ => Ok(None),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Programs
    // ══════════════════════════════════════════════════════════════════════

    /// Run top-level statements in order against `ctx`, without validation.
    ///
    /// A top-level `return` stops the program.
    pub fn eval_program(&mut self, program: &Program, ctx: &Ctx) -> EvalResult<Value> {
        for stmt in &program.stmts {
            if let Flow::Return(_) = self.exec_stmt(stmt, ctx)? {
                break;
            }
        }
        Ok(Value::Null)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr, ctx: &Ctx) -> EvalResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expr_inner(expr, ctx)
        })
    }

    fn eval_expr_inner(&mut self, expr: &Expr, ctx: &Ctx) -> EvalResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal(*lit)),
            Expr::Var(name) => ctx.get(name),
            Expr::BinOp { left, op, right } => {
                let lv = self.eval_expr(left, ctx)?;
                let rv = self.eval_expr(right, ctx)?;
                runtime::binary(*op, &lv, &rv)
            }
            Expr::And { left, right } => {
                let lv = self.eval_expr(left, ctx)?;
                if !lv.is_truthy() {
                    return Ok(Value::Int(0));
                }
                let rv = self.eval_expr(right, ctx)?;
                Ok(Value::Int(i64::from(rv.is_truthy())))
            }
            Expr::Or { left, right } => {
                let lv = self.eval_expr(left, ctx)?;
                if lv.is_truthy() {
                    return Ok(Value::Int(1));
                }
                let rv = self.eval_expr(right, ctx)?;
                Ok(Value::Int(i64::from(rv.is_truthy())))
            }
            Expr::Unary {
                op,
                operand,
                postfix,
            } => self.eval_unary(*op, operand, *postfix, ctx),
            Expr::Assign { name, value } => {
                let value = self.eval_expr(value, ctx)?;
                let value = runtime::coerce(ctx.get_type(name)?, value)?;
                ctx.set(name, value.clone())?;
                Ok(value)
            }
            Expr::Call { callee, args } => {
                let func = self.eval_expr(callee, ctx)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.eval_expr(arg, ctx)?);
                }
                self.call_value(&func, arg_vals, callee)
            }
            Expr::ArrayAccess { array, index } => {
                let (items, i) = self.eval_element(array, index, ctx)?;
                let item = items.borrow()[i].clone();
                Ok(item)
            }
            Expr::ArrayAssign {
                array,
                index,
                value,
            } => {
                // All three operands run before any check fails.
                let target = self.eval_expr(array, ctx)?;
                let index_val = self.eval_expr(index, ctx)?;
                let value = self.eval_expr(value, ctx)?;
                let (items, i) = check_element(target, index_val, array)?;
                store_element(&items, i, value)
            }
        }
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        postfix: bool,
        ctx: &Ctx,
    ) -> EvalResult<Value> {
        let step: fn(&Value) -> EvalResult<Value> = match op {
            UnaryOp::Neg => return runtime::negate(&self.eval_expr(operand, ctx)?),
            UnaryOp::Not => return Ok(runtime::not(&self.eval_expr(operand, ctx)?)),
            UnaryOp::Inc => runtime::increment,
            UnaryOp::Dec => runtime::decrement,
        };

        // The operand is evaluated once; assignable operands get the new
        // value written back.
        let (old, new) = match operand {
            Expr::Var(name) => {
                let old = ctx.get(name)?;
                let new = step(&old)?;
                ctx.set(name, new.clone())?;
                (old, new)
            }
            Expr::ArrayAccess { array, index } => {
                let (items, i) = self.eval_element(array, index, ctx)?;
                let old = items.borrow()[i].clone();
                let new = step(&old)?;
                items.borrow_mut()[i] = new.clone();
                (old, new)
            }
            other => {
                let value = self.eval_expr(other, ctx)?;
                return step(&value);
            }
        };
        Ok(if postfix { old } else { new })
    }

    // ── Arrays ───────────────────────────────────────────────────────────

    /// Evaluate `array[index]` down to checked storage and position.
    fn eval_element(
        &mut self,
        array: &Expr,
        index: &Expr,
        ctx: &Ctx,
    ) -> EvalResult<(ArrayRef, usize)> {
        let target = self.eval_expr(array, ctx)?;
        let index_val = self.eval_expr(index, ctx)?;
        check_element(target, index_val, array)
    }

    fn build_array(
        &mut self,
        ty: Type,
        size: usize,
        init: Option<&[Expr]>,
        ctx: &Ctx,
    ) -> EvalResult<Vec<Value>> {
        // Char arrays always keep room for the terminator.
        let (limit, fill) = match ty {
            Type::Char => (size.saturating_sub(1), Value::Char('\0')),
            Type::Int | Type::Void => (size, Value::Int(0)),
        };

        let mut items = Vec::new();
        items
            .try_reserve_exact(size)
            .map_err(|_| EvalError::AllocationFailed { len: size })?;
        for expr in init.unwrap_or_default() {
            let value = self.eval_expr(expr, ctx)?;
            if items.len() < limit {
                items.push(runtime::coerce_element(Some(ty), value)?);
            }
        }
        items.resize(size, fill);
        Ok(items)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    /// Call `func` with positional arguments. `callee` names the callee in
    /// error messages.
    pub fn call_value(&mut self, func: &Value, args: Vec<Value>, callee: &Expr) -> EvalResult<Value> {
        match func {
            Value::Function(f) => self.call_function(f, args),
            Value::Native(native) => native.call(&args),
            Value::Class(class) => Ok(Value::Instance(Rc::new(Instance {
                class: Rc::clone(class),
            }))),
            _ => Err(EvalError::NotCallable(callee.describe())),
        }
    }

    /// Invoke a user function in a fresh scope on top of its closure.
    pub fn call_function(&mut self, func: &Function, args: Vec<Value>) -> EvalResult<Value> {
        let params = func.params();
        if args.len() != params.len() {
            return Err(EvalError::ArityMismatch {
                name: func.name().to_string(),
                expected: params.len(),
                got: args.len(),
            });
        }
        let max_depth = self.options.max_call_depth;
        if self.depth >= max_depth {
            return Err(EvalError::StackOverflow { depth: max_depth });
        }

        let mut scope = Scope::new();
        for (param, arg) in params.iter().zip(args) {
            let arg = runtime::coerce(param.ty, arg)?;
            scope.insert(param.name.clone(), Binding::new(param.ty, arg));
        }
        let local = func.closure().push(scope);

        self.depth += 1;
        tracing::trace!(name = func.name(), depth = self.depth, "call");
        let result = self.exec_stmts(func.body(), &local);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => runtime::coerce(Some(func.ret()), value),
            Flow::Normal(_) => Ok(Value::Null),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statement execution
    // ══════════════════════════════════════════════════════════════════════

    /// Execute a single statement.
    pub fn exec_stmt(&mut self, stmt: &Stmt, ctx: &Ctx) -> EvalResult<Flow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.exec_stmt_inner(stmt, ctx)
        })
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, ctx: &Ctx) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => Ok(Flow::Normal(self.eval_expr(expr, ctx)?)),
            Stmt::VarDef { ty, name, value } => {
                let value = match value {
                    Some(expr) => {
                        let value = self.eval_expr(expr, ctx)?;
                        runtime::coerce(Some(*ty), value)?
                    }
                    None => default_value(*ty),
                };
                ctx.var_def(Some(*ty), name.clone(), value);
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::ArrayDef {
                ty,
                name,
                size,
                init,
            } => {
                let items = self.build_array(*ty, *size, init.as_deref(), ctx)?;
                ctx.var_def(Some(*ty), name.clone(), Value::array(items));
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Printf(expr) => self.exec_printf(expr, ctx),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, ctx)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(cond, ctx)?.is_truthy() {
                    self.exec_stmt(then_branch, ctx)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch, ctx)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond, ctx)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.exec_stmt(body, ctx)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Block(block) => {
                let inner = ctx.push(Scope::new());
                self.exec_stmts(&block.stmts, &inner)
            }
            Stmt::Seq(stmts) => self.exec_stmts(stmts, ctx),
            Stmt::Function(def) => {
                let func = Value::Function(Rc::new(Function::new(Rc::clone(def), ctx.clone())));
                ctx.var_def(Some(def.ret), def.name.clone(), func.clone());
                Ok(Flow::Normal(func))
            }
        }
    }

    /// Execute statements in order, stopping at the first `return`.
    fn exec_stmts(&mut self, stmts: &[Stmt], ctx: &Ctx) -> EvalResult<Flow> {
        for stmt in stmts {
            if let flow @ Flow::Return(_) = self.exec_stmt(stmt, ctx)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal(Value::Null))
    }

    fn exec_printf(&mut self, expr: &Expr, ctx: &Ctx) -> EvalResult<Flow> {
        let value = self.eval_expr(expr, ctx)?;
        if let Expr::Var(name) = expr {
            match ctx.get_type(name)? {
                Some(Type::Void) => {
                    return Err(EvalError::type_mismatch(
                        "printf cannot print values of type void",
                    ));
                }
                Some(Type::Int) if matches!(value, Value::Array(_)) => {
                    return Err(EvalError::type_mismatch(
                        "printf cannot print int arrays directly",
                    ));
                }
                _ => {}
            }
        }
        self.output.write_line(value.show());
        Ok(Flow::Normal(Value::Null))
    }
}

/// Log a failed run with the root environment, then pass the result on.
fn report(result: EvalResult<Value>, ctx: &Ctx) -> EvalResult<Value> {
    if let Err(err) = &result {
        tracing::error!(kind = %err.kind(), %err, env = %ctx, "evaluation failed");
    }
    result
}

fn literal(lit: Lit) -> Value {
    match lit {
        Lit::Null => Value::Null,
        Lit::Int(n) => Value::Int(n),
        Lit::Char(c) => Value::Char(c),
        Lit::Bool(b) => Value::Bool(b),
    }
}

/// Value of a declaration without initializer.
fn default_value(ty: Type) -> Value {
    match ty {
        Type::Int => Value::Int(0),
        Type::Char => Value::Char('\0'),
        Type::Void => Value::Null,
    }
}

/// Resolve an evaluated `array[index]` to storage and a position in
/// bounds. `array` names the target in error messages.
fn check_element(
    target: Value,
    index_val: Value,
    array: &Expr,
) -> EvalResult<(ArrayRef, usize)> {
    let Value::Array(items) = target else {
        return Err(EvalError::TypeMismatch(format!(
            "{} is not an array",
            array.describe()
        )));
    };
    let Value::Int(index) = index_val else {
        return Err(EvalError::TypeMismatch(format!(
            "array index must be an int, got {}",
            index_val.type_name()
        )));
    };

    let len = items.borrow().len();
    match usize::try_from(index) {
        Ok(i) if i < len => Ok((items, i)),
        _ => Err(EvalError::IndexOutOfBounds { index, len }),
    }
}

/// Store into an array slot, converting int/char to the kind already held
/// there.
fn store_element(items: &ArrayRef, i: usize, value: Value) -> EvalResult<Value> {
    let slot = match items.borrow()[i] {
        Value::Int(_) => Some(Type::Int),
        Value::Char(_) => Some(Type::Char),
        _ => None,
    };
    let value = runtime::coerce_element(slot, value)?;
    items.borrow_mut()[i] = value.clone();
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> Evaluator {
        Evaluator::new(EvalOptions::default().with_capture_output(true))
    }

    #[test]
    fn return_travels_as_flow_through_blocks() {
        let ctx = Ctx::new();
        let stmt = Stmt::block(vec![
            Stmt::ret(Some(Expr::int(4))),
            Stmt::printf(Expr::int(1)),
        ]);
        let mut eval = evaluator();
        assert_eq!(eval.exec_stmt(&stmt, &ctx), Ok(Flow::Return(Value::Int(4))));
        assert!(eval.output().is_empty());
    }

    #[test]
    fn block_scope_is_dropped_after_early_return() {
        let ctx = Ctx::new();
        let stmt = Stmt::block(vec![
            Stmt::var_def(Type::Int, "inner", None),
            Stmt::ret(None),
        ]);
        evaluator().exec_stmt(&stmt, &ctx).unwrap();
        assert!(!ctx.contains("inner"));
        assert!(ctx.is_root());
    }

    #[test]
    fn seq_declares_in_enclosing_scope() {
        let ctx = Ctx::new();
        let stmt = Stmt::do_while(
            Stmt::var_def(Type::Int, "once", Some(Expr::int(1))),
            Expr::int(0),
        );
        evaluator().exec_stmt(&stmt, &ctx).unwrap();
        assert_eq!(ctx.get("once"), Ok(Value::Int(1)));
    }

    #[test]
    fn non_assignable_increment_yields_new_value() {
        let ctx = Ctx::new();
        let expr = Expr::postfix(UnaryOp::Inc, Expr::int(1));
        assert_eq!(evaluator().eval_expr(&expr, &ctx), Ok(Value::Int(2)));
    }

    #[test]
    fn eval_validates_expression() {
        let ctx = Ctx::from_values([("if", Value::Int(1))]);
        let err = evaluator().eval(&Expr::var("if"), &ctx).unwrap_err();
        assert!(matches!(err, EvalError::Validation(_)));
    }
}
