//! Program model for MiniC.
//!
//! This crate defines the AST a front end hands to the evaluator, the
//! construction-time validation that turns a function set into a
//! [`Program`], the shared [`ErrorKind`] taxonomy, JSON interchange, and a
//! pretty printer.

pub mod ast;
mod bindings;
mod error;
mod printer;
mod program;
mod stack;
mod validate;

pub use error::{ErrorKind, LoadError, ModelError, ModelErrors, MAX_ERRORS};
pub use program::{Program, DEFAULT_ENTRY, PRINT};
pub use stack::ensure_sufficient_stack;
