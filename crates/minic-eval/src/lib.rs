//! MiniC tree-walking evaluator: reference execution semantics.
//!
//! Runs a validated [`minic_types::Program`] from its entry function,
//! recording every `print` in order, and reports the entry function's
//! result or the first runtime error.
//!
//! ```text
//! Program → Interpreter::run → Evaluator (frames, scopes, arithmetic) → RunReport
//! ```

mod config;
mod env;
mod error;
mod evaluator;
mod host;
mod stack;
mod value;

pub use config::{EvalConfig, Truthiness, DEFAULT_MAX_CALL_DEPTH};
pub use env::Environment;
pub use error::{Budget, EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use host::{run, Interpreter, OutputLog, OutputSink, RunReport, WriterSink};
pub use minic_types::ErrorKind;
pub use stack::{CallFrame, CallStack, FrameSnapshot};
pub use value::{Arithmetic, IntWidth, OverflowPolicy, Value};
