//! Construction-time validation of a function set.
//!
//! Checks performed, all accumulated into one [`ModelErrors`]:
//! - function names are unique and none shadows the `print` builtin
//! - parameter names are distinct within each function
//! - the entry function exists, takes no parameters, and returns `int`
//! - every call targets a known function with the right arity
//! - `void` calls are never used as values
//! - `return` statements agree with the declared return type
//!
//! Variable resolution is not part of this pass; see [`crate::bindings`].

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::*;
use crate::error::{ModelError, ModelErrors};
use crate::program::PRINT;
use crate::stack::ensure_sufficient_stack;

/// Index functions by name, recording duplicates and reserved names.
pub(crate) fn index_functions(
    functions: &[Function],
    errors: &mut ModelErrors,
) -> BTreeMap<String, usize> {
    let mut index = BTreeMap::new();
    for (i, function) in functions.iter().enumerate() {
        if function.name == PRINT {
            errors.push(ModelError::ReservedName {
                name: function.name.clone(),
            });
            continue;
        }
        if index.insert(function.name.clone(), i).is_some() {
            errors.push(ModelError::DuplicateFunction {
                name: function.name.clone(),
            });
        }
    }
    index
}

/// Check the designated entry point. Returns its index when usable.
pub(crate) fn check_entry(
    functions: &[Function],
    index: &BTreeMap<String, usize>,
    entry: &str,
    errors: &mut ModelErrors,
) -> Option<usize> {
    let Some(&i) = index.get(entry) else {
        errors.push(ModelError::MissingEntry { name: entry.into() });
        return None;
    };
    let function = &functions[i];
    if !function.params.is_empty() {
        errors.push(ModelError::InvalidEntry {
            name: entry.into(),
            reason: format!("must take no parameters, takes {}", function.arity()),
        });
    }
    if function.returns != ReturnType::Int {
        errors.push(ModelError::InvalidEntry {
            name: entry.into(),
            reason: "must return int".into(),
        });
    }
    Some(i)
}

/// Check parameters, calls, and returns of every function.
pub(crate) fn check_bodies(
    functions: &[Function],
    index: &BTreeMap<String, usize>,
    errors: &mut ModelErrors,
) {
    for function in functions {
        let mut seen = BTreeSet::new();
        for param in &function.params {
            if !seen.insert(param.as_str()) {
                errors.push(ModelError::DuplicateParameter {
                    function: function.name.clone(),
                    name: param.clone(),
                });
            }
        }

        let mut checker = BodyChecker {
            functions,
            index,
            current: function,
            errors: &mut *errors,
        };
        checker.block(&function.body);
    }
}

struct BodyChecker<'a> {
    functions: &'a [Function],
    index: &'a BTreeMap<String, usize>,
    current: &'a Function,
    errors: &'a mut ModelErrors,
}

impl BodyChecker<'_> {
    fn block(&mut self, block: &Block) {
        ensure_sufficient_stack(|| {
            for stmt in &block.stmts {
                self.stmt(stmt);
            }
        });
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { .. } => {}
            Stmt::Assign { value, .. } | Stmt::Print { value } => self.expr(value),
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                self.expr(condition);
                self.block(then_block);
                if let Some(else_block) = else_block {
                    self.block(else_block);
                }
            }
            Stmt::While { condition, body } => {
                self.expr(condition);
                self.block(body);
            }
            Stmt::Return { value } => self.ret(value.as_ref()),
            Stmt::Call(call) => self.call(call, false),
        }
    }

    fn ret(&mut self, value: Option<&Expr>) {
        match (self.current.returns, value) {
            (ReturnType::Void, Some(_)) => self.errors.push(ModelError::ReturnValueInVoid {
                function: self.current.name.clone(),
            }),
            (ReturnType::Int, None) => self.errors.push(ModelError::MissingReturnValue {
                function: self.current.name.clone(),
            }),
            _ => {}
        }
        if let Some(value) = value {
            self.expr(value);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| match expr {
            Expr::Int { .. } | Expr::Var { .. } => {}
            Expr::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::Call(call) => self.call(call, true),
        });
    }

    /// `as_value` is true when the call result feeds an expression.
    fn call(&mut self, call: &Call, as_value: bool) {
        for arg in &call.args {
            self.expr(arg);
        }

        let caller = &self.current.name;
        if call.callee == PRINT {
            if as_value {
                self.errors.push(ModelError::VoidValue {
                    caller: caller.clone(),
                    callee: call.callee.clone(),
                });
            }
            if call.args.len() != 1 {
                self.errors.push(ModelError::ArityMismatch {
                    caller: caller.clone(),
                    callee: call.callee.clone(),
                    expected: 1,
                    found: call.args.len(),
                });
            }
            return;
        }

        let Some(&i) = self.index.get(&call.callee) else {
            self.errors.push(ModelError::UnknownFunction {
                caller: caller.clone(),
                callee: call.callee.clone(),
            });
            return;
        };
        let callee = &self.functions[i];
        if callee.arity() != call.args.len() {
            self.errors.push(ModelError::ArityMismatch {
                caller: caller.clone(),
                callee: call.callee.clone(),
                expected: callee.arity(),
                found: call.args.len(),
            });
        }
        if as_value && callee.returns == ReturnType::Void {
            self.errors.push(ModelError::VoidValue {
                caller: caller.clone(),
                callee: call.callee.clone(),
            });
        }
    }
}
