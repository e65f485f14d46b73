//! Scoped variable environment of one call frame.

use std::collections::BTreeMap;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// A single block's bindings. `None` marks declared-but-unassigned.
#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: BTreeMap<String, Option<Value>>,
}

/// Scope chain private to one call frame.
///
/// Names are looked up from innermost scope outward. `declare` always
/// creates in the innermost scope, `assign` updates the nearest scope that
/// declares the name. The root scope holds the function's parameters and is
/// never popped.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// Create an environment with one empty root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Create an environment whose root scope binds the given parameters.
    pub fn with_params<'a>(params: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let root = Scope {
            bindings: params
                .into_iter()
                .map(|(name, value)| (name.to_string(), Some(value)))
                .collect(),
        };
        Self { scopes: vec![root] }
    }

    /// Push a nested block scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost block scope, discarding its bindings.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of scopes, root included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Introduce an unassigned binding in the innermost scope.
    pub fn declare(&mut self, name: &str) -> EvalResult<()> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(EvalError::UndefinedVariable(name.to_string()));
        };
        if scope.bindings.contains_key(name) {
            return Err(EvalError::AlreadyDeclared(name.to_string()));
        }
        scope.bindings.insert(name.to_string(), None);
        Ok(())
    }

    /// Overwrite the nearest binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> EvalResult<()> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.bindings.get_mut(name))
            .map(|slot| *slot = Some(value))
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    /// Read the nearest binding of `name`.
    pub fn read(&self, name: &str) -> EvalResult<Value> {
        match self.scopes.iter().rev().find_map(|scope| scope.bindings.get(name)) {
            Some(Some(value)) => Ok(*value),
            Some(None) => Err(EvalError::Uninitialized(name.to_string())),
            None => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
