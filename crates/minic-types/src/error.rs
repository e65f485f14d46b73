use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of validation errors stored before the rest are only counted.
pub const MAX_ERRORS: usize = 20;

/// Failure taxonomy shared by program validation and execution.
///
/// Every error surfaced to an embedder, static or dynamic, is tagged with
/// exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Variable or function name that cannot be reached.
    UnresolvedName,
    /// Read of a declared variable that was never assigned.
    UseBeforeInit,
    /// Second declaration of a name in the same block.
    Redeclaration,
    /// Call with the wrong number of arguments.
    ArityMismatch,
    DivisionByZero,
    /// Arithmetic result outside the configured width under the trap policy.
    IntegerOverflow,
    /// An `int` function finished its body without returning.
    FallOffEnd,
    /// The missing result of a `void` call was used as a value.
    VoidValue,
    /// Condition value rejected by the strict truthiness policy.
    InvalidCondition,
    /// Call depth ceiling exceeded.
    StackExhausted,
    /// Step, loop-iteration, or wall-clock budget consumed.
    BudgetExceeded,
    /// Structural defect in the program (duplicates, bad entry point, ...).
    InvalidProgram,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnresolvedName => "unresolved_name",
            Self::UseBeforeInit => "use_before_init",
            Self::Redeclaration => "redeclaration",
            Self::ArityMismatch => "arity_mismatch",
            Self::DivisionByZero => "division_by_zero",
            Self::IntegerOverflow => "integer_overflow",
            Self::FallOffEnd => "fall_off_end",
            Self::VoidValue => "void_value",
            Self::InvalidCondition => "invalid_condition",
            Self::StackExhausted => "stack_exhausted",
            Self::BudgetExceeded => "budget_exceeded",
            Self::InvalidProgram => "invalid_program",
        };
        f.write_str(s)
    }
}

/// A defect found while building or checking a [`Program`](crate::Program).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("duplicate function '{name}'")]
    DuplicateFunction { name: String },

    #[error("duplicate parameter '{name}' in function '{function}'")]
    DuplicateParameter { function: String, name: String },

    #[error("'{name}' is reserved for the builtin")]
    ReservedName { name: String },

    #[error("entry function '{name}' is not defined")]
    MissingEntry { name: String },

    #[error("entry function '{name}' {reason}")]
    InvalidEntry { name: String, reason: String },

    #[error("function '{caller}' calls unknown function '{callee}'")]
    UnknownFunction { caller: String, callee: String },

    #[error("function '{caller}' calls '{callee}' with {found} argument(s), expected {expected}")]
    ArityMismatch {
        caller: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("function '{caller}' uses the result of void function '{callee}'")]
    VoidValue { caller: String, callee: String },

    #[error("void function '{function}' returns a value")]
    ReturnValueInVoid { function: String },

    #[error("function '{function}' has a return without a value")]
    MissingReturnValue { function: String },

    #[error("unresolved variable '{name}' in function '{function}'")]
    UnresolvedVariable { function: String, name: String },

    #[error("variable '{name}' declared twice in the same block of '{function}'")]
    Redeclaration { function: String, name: String },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFunction { .. } | Self::UnresolvedVariable { .. } => {
                ErrorKind::UnresolvedName
            }
            Self::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Self::VoidValue { .. } => ErrorKind::VoidValue,
            Self::Redeclaration { .. } => ErrorKind::Redeclaration,
            Self::DuplicateFunction { .. }
            | Self::DuplicateParameter { .. }
            | Self::ReservedName { .. }
            | Self::MissingEntry { .. }
            | Self::InvalidEntry { .. }
            | Self::ReturnValueInVoid { .. }
            | Self::MissingReturnValue { .. } => ErrorKind::InvalidProgram,
        }
    }
}

/// Accumulated validation errors, capped at [`MAX_ERRORS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelErrors {
    pub errors: Vec<ModelError>,
    pub total: usize,
}

impl ModelErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ModelError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total += 1;
    }

    pub fn has_errors(&self) -> bool {
        self.total > 0
    }

    /// True if any stored error has the given kind.
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    pub fn first(&self) -> Option<&ModelError> {
        self.errors.first()
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ModelErrors> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(value)
        }
    }
}

impl fmt::Display for ModelErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid program ({} error(s))", self.total)?;
        for error in &self.errors {
            write!(f, "\n  [{}] {error}", error.kind())?;
        }
        if self.total > self.errors.len() {
            write!(f, "\n  ... and {} more", self.total - self.errors.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ModelErrors {}

/// Failure to load a program from its JSON representation.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed program json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(#[from] ModelErrors),
}
