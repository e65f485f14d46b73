//! Optional static resolution of variable names.
//!
//! Mirrors the runtime scope rules: parameters live in the function's top
//! scope, every block opens a nested scope, a declaration is visible from
//! the statement after it to the end of its block, and redeclaring a name
//! in the same block is an error while redeclaring it in a nested block
//! shadows.
//!
//! This pass is not part of [`Program::new`]; callers that want unresolved
//! names rejected up front run [`Program::check_bindings`] themselves.

use std::collections::BTreeSet;

use crate::ast::*;
use crate::error::{ModelError, ModelErrors};
use crate::program::Program;
use crate::stack::ensure_sufficient_stack;

impl Program {
    /// Statically resolve every variable read and assignment.
    pub fn check_bindings(&self) -> Result<(), ModelErrors> {
        let mut errors = ModelErrors::new();
        for function in self.functions() {
            let mut resolver = Resolver {
                function: &function.name,
                scopes: vec![function.params.iter().cloned().collect()],
                errors: &mut errors,
            };
            resolver.block(&function.body);
        }
        errors.into_result(())
    }
}

struct Resolver<'a> {
    function: &'a str,
    scopes: Vec<BTreeSet<String>>,
    errors: &'a mut ModelErrors,
}

impl Resolver<'_> {
    fn block(&mut self, block: &Block) {
        ensure_sufficient_stack(|| {
            self.scopes.push(BTreeSet::new());
            for stmt in &block.stmts {
                self.stmt(stmt);
            }
            self.scopes.pop();
        });
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { name } => {
                let fresh = self
                    .scopes
                    .last_mut()
                    .is_some_and(|scope| scope.insert(name.clone()));
                if !fresh {
                    self.errors.push(ModelError::Redeclaration {
                        function: self.function.to_string(),
                        name: name.clone(),
                    });
                }
            }
            Stmt::Assign { name, value } => {
                self.expr(value);
                self.resolve(name);
            }
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
            Stmt::Return { value } => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            Stmt::Print { value } => self.expr(value),
            Stmt::Call(call) => self.args(call),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| match expr {
            Expr::Int { .. } => {}
            Expr::Var { name } => self.resolve(name),
            Expr::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::Call(call) => self.args(call),
        });
    }

    fn args(&mut self, call: &Call) {
        for arg in &call.args {
            self.expr(arg);
        }
    }

    fn resolve(&mut self, name: &str) {
        if !self.scopes.iter().rev().any(|scope| scope.contains(name)) {
            self.errors.push(ModelError::UnresolvedVariable {
                function: self.function.to_string(),
                name: name.to_string(),
            });
        }
    }
}
