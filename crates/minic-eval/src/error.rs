//! Runtime error types for the MiniC evaluator.

use std::fmt;

use minic_types::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which externally imposed budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    /// Total statements and loop condition checks in the run.
    Steps,
    /// Iterations of a single `while` statement.
    LoopIterations,
    /// Wall-clock milliseconds since the run started.
    WallClockMillis,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steps => write!(f, "step"),
            Self::LoopIterations => write!(f, "loop iteration"),
            Self::WallClockMillis => write!(f, "wall-clock (ms)"),
        }
    }
}

/// A fatal runtime error. Every error aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("variable '{0}' read before assignment")]
    Uninitialized(String),

    #[error("variable '{0}' already declared in this block")]
    AlreadyDeclared(String),

    #[error("function '{function}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {bits}-bit arithmetic")]
    IntegerOverflow { bits: u32 },

    #[error("function '{0}' reached the end of its body without returning a value")]
    FallOffEnd(String),

    #[error("void function '{0}' used as a value")]
    VoidValue(String),

    #[error("condition evaluated to {0}, expected 0 or 1")]
    InvalidCondition(i64),

    #[error("call stack exhausted ({depth} frames)")]
    StackExhausted { depth: usize },

    #[error("{budget} budget of {limit} exhausted")]
    BudgetExceeded { budget: Budget, limit: u64 },
}

impl EvalError {
    /// The taxonomy tag surfaced to embedders.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UndefinedVariable(_) | Self::UndefinedFunction(_) => ErrorKind::UnresolvedName,
            Self::Uninitialized(_) => ErrorKind::UseBeforeInit,
            Self::AlreadyDeclared(_) => ErrorKind::Redeclaration,
            Self::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Self::DivisionByZero => ErrorKind::DivisionByZero,
            Self::IntegerOverflow { .. } => ErrorKind::IntegerOverflow,
            Self::FallOffEnd(_) => ErrorKind::FallOffEnd,
            Self::VoidValue(_) => ErrorKind::VoidValue,
            Self::InvalidCondition(_) => ErrorKind::InvalidCondition,
            Self::StackExhausted { .. } => ErrorKind::StackExhausted,
            Self::BudgetExceeded { .. } => ErrorKind::BudgetExceeded,
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
