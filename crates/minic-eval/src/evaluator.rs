//! Core statement and expression evaluator.

use std::time::{Duration, Instant};

use minic_types::ast::*;
use minic_types::{Program, PRINT};

use crate::config::{EvalConfig, Truthiness};
use crate::env::Environment;
use crate::error::{Budget, EvalError, EvalResult};
use crate::host::OutputSink;
use crate::stack::{ensure_sufficient_stack, CallFrame, CallStack, FrameSnapshot};
use crate::value::{Arithmetic, Value};

/// Steps between wall-clock checks.
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Fall through to the next statement.
    Normal,
    /// Unwind to the enclosing call, carrying the returned value if any.
    Return(Option<Value>),
}

/// The tree-walking evaluator for one run.
///
/// Operands and call arguments are evaluated left to right. Call arguments
/// are evaluated in the caller's frame before the callee's frame exists.
pub struct Evaluator<'p, 's> {
    program: &'p Program,
    config: &'p EvalConfig,
    arith: Arithmetic,
    stack: CallStack<'p>,
    sink: &'s mut dyn OutputSink,
    steps: u64,
    started: Instant,
    backtrace: Option<Vec<FrameSnapshot>>,
}

impl<'p, 's> Evaluator<'p, 's> {
    /// Prepare a run of `program`'s entry function. Observed values go to `sink`.
    pub fn new(program: &'p Program, config: &'p EvalConfig, sink: &'s mut dyn OutputSink) -> Self {
        let entry = CallFrame::new(program.entry(), Environment::new());
        Self {
            program,
            config,
            arith: Arithmetic::new(config.width, config.overflow),
            stack: CallStack::new(entry, config.max_call_depth),
            sink,
            steps: 0,
            started: Instant::now(),
            backtrace: None,
        }
    }

    /// Execute the entry function with zero arguments.
    pub fn run_entry(&mut self) -> EvalResult<Value> {
        let program = self.program;
        let entry = program.entry();
        if self.config.max_call_depth == 0 {
            return Err(EvalError::StackExhausted { depth: 0 });
        }
        self.started = Instant::now();
        let result = self.exec_body(entry);
        if result.is_err() {
            self.capture_backtrace();
        }
        result?.ok_or_else(|| EvalError::VoidValue(entry.name.clone()))
    }

    /// Steps consumed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Deepest call depth reached so far.
    pub fn max_depth(&self) -> usize {
        self.stack.high_water()
    }

    /// Frames active when the first error was raised, innermost first.
    pub fn take_backtrace(&mut self) -> Vec<FrameSnapshot> {
        self.backtrace.take().unwrap_or_default()
    }

    fn capture_backtrace(&mut self) {
        if self.backtrace.is_none() {
            self.backtrace = Some(self.stack.capture());
        }
    }

    /// Consume one step, enforcing the step and wall-clock budgets.
    fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if let Some(limit) = self.config.step_budget {
            if self.steps > limit {
                return Err(EvalError::BudgetExceeded {
                    budget: Budget::Steps,
                    limit,
                });
            }
        }
        if let Some(limit) = self.config.time_budget_ms {
            if self.steps % CLOCK_CHECK_INTERVAL == 1
                && self.started.elapsed() >= Duration::from_millis(limit)
            {
                return Err(EvalError::BudgetExceeded {
                    budget: Budget::WallClockMillis,
                    limit,
                });
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate a call to a user function. `None` is a `void` function's result.
    fn eval_call(&mut self, call: &'p Call) -> EvalResult<Option<Value>> {
        // Program::new already rejects unknown callees and arity mismatches.
        let program = self.program;
        let function = program
            .function(&call.callee)
            .ok_or_else(|| EvalError::UndefinedFunction(call.callee.clone()))?;
        if function.arity() != call.args.len() {
            return Err(EvalError::ArityMismatch {
                function: function.name.clone(),
                expected: function.arity(),
                found: call.args.len(),
            });
        }

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }
        self.invoke(function, args)
    }

    fn invoke(&mut self, function: &'p Function, args: Vec<Value>) -> EvalResult<Option<Value>> {
        let _span = tracing::debug_span!(
            "call",
            function = %function.name,
            depth = self.stack.depth() + 1
        )
        .entered();

        let env = Environment::with_params(function.params.iter().map(String::as_str).zip(args));
        self.stack.push(CallFrame::new(function, env))?;

        let result = ensure_sufficient_stack(|| self.exec_body(function));
        if result.is_err() {
            self.capture_backtrace();
        }
        self.stack.pop();
        result
    }

    /// Run a function body in the current frame.
    fn exec_body(&mut self, function: &'p Function) -> EvalResult<Option<Value>> {
        match self.exec_block(&function.body)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => match function.returns {
                ReturnType::Void => Ok(None),
                ReturnType::Int => Err(EvalError::FallOffEnd(function.name.clone())),
            },
        }
    }

    fn observe(&mut self, value: Value) {
        tracing::trace!(%value, "print");
        self.sink.observe(value);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Blocks & statements
    // ══════════════════════════════════════════════════════════════════════

    /// Run `f` inside a fresh nested scope of the current frame.
    /// The scope is popped whatever `f` returns.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<R>) -> EvalResult<R> {
        self.stack.current_mut().env.push_scope();
        let result = f(self);
        self.stack.current_mut().env.pop_scope();
        result
    }

    /// Run a block in a nested scope.
    ///
    /// On error the block is left open in the frame's position so the
    /// backtrace points at the failing statement.
    fn exec_block(&mut self, block: &'p Block) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| {
            self.stack.current_mut().enter_block();
            let flow = self.scoped(|this| {
                for stmt in &block.stmts {
                    if let Flow::Return(value) = this.exec_stmt(stmt)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            })?;
            self.stack.current_mut().leave_block();
            Ok(flow)
        })
    }

    fn exec_stmt(&mut self, stmt: &'p Stmt) -> EvalResult<Flow> {
        self.stack.current_mut().advance();
        // Declarations are free.
        if !matches!(stmt, Stmt::Declare { .. }) {
            self.tick()?;
        }
        match stmt {
            Stmt::Declare { name } => {
                self.stack.current_mut().env.declare(name)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                self.stack.current_mut().env.assign(name, value)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                if self.eval_condition(condition)? {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body } => self.exec_while(condition, body),
            Stmt::Return { value } => {
                let value = value.as_ref().map(|v| self.eval_expr(v)).transpose()?;
                Ok(Flow::Return(value))
            }
            Stmt::Print { value } => {
                let value = self.eval_expr(value)?;
                self.observe(value);
                Ok(Flow::Normal)
            }
            Stmt::Call(call) if call.callee == PRINT => {
                // Unreachable for validated programs; kept as the runtime contract.
                let [arg] = call.args.as_slice() else {
                    return Err(EvalError::ArityMismatch {
                        function: PRINT.to_string(),
                        expected: 1,
                        found: call.args.len(),
                    });
                };
                let value = self.eval_expr(arg)?;
                self.observe(value);
                Ok(Flow::Normal)
            }
            Stmt::Call(call) => {
                self.eval_call(call)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_while(&mut self, condition: &'p Expr, body: &'p Block) -> EvalResult<Flow> {
        let mut iterations: u64 = 0;
        loop {
            if iterations > 0 {
                self.tick()?;
            }
            if !self.eval_condition(condition)? {
                return Ok(Flow::Normal);
            }
            iterations += 1;
            if let Some(limit) = self.config.loop_iteration_budget {
                if iterations > limit {
                    return Err(EvalError::BudgetExceeded {
                        budget: Budget::LoopIterations,
                        limit,
                    });
                }
            }
            if let Flow::Return(value) = self.exec_block(body)? {
                return Ok(Flow::Return(value));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn eval_expr(&mut self, expr: &'p Expr) -> EvalResult<Value> {
        match expr {
            Expr::Int { value } => self.arith.literal(*value),
            Expr::Var { name } => self.stack.current().env.read(name),
            Expr::Binary { op, left, right } => {
                ensure_sufficient_stack(|| self.eval_binary(*op, left, right))
            }
            Expr::Call(call) => self
                .eval_call(call)?
                .ok_or_else(|| EvalError::VoidValue(call.callee.clone())),
        }
    }

    fn eval_binary(&mut self, op: BinOp, left: &'p Expr, right: &'p Expr) -> EvalResult<Value> {
        match op {
            BinOp::And => {
                if !self.eval_condition(left)? {
                    return Ok(Value::FALSE);
                }
                Ok(Value::from_bool(self.eval_condition(right)?))
            }
            BinOp::Or => {
                if self.eval_condition(left)? {
                    return Ok(Value::TRUE);
                }
                Ok(Value::from_bool(self.eval_condition(right)?))
            }
            _ => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                self.arith.apply(op, lhs, rhs)
            }
        }
    }

    /// Evaluate an expression used as a condition.
    fn eval_condition(&mut self, expr: &'p Expr) -> EvalResult<bool> {
        let value = self.eval_expr(expr)?;
        match (self.config.truthiness, value.get()) {
            (Truthiness::NonZero, v) => Ok(v != 0),
            (Truthiness::Strict, 0) => Ok(false),
            (Truthiness::Strict, 1) => Ok(true),
            (Truthiness::Strict, v) => Err(EvalError::InvalidCondition(v)),
        }
    }
}
