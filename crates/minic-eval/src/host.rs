//! Host bridge: running a program, collecting its output, reporting the outcome.
//!
//! Every run records its observations into an [`OutputLog`]. An embedder may
//! also attach an [`OutputSink`] that sees each value as it is printed, e.g.
//! a [`WriterSink`] streaming to stdout.

use std::io;

use minic_types::Program;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::stack::FrameSnapshot;
use crate::value::Value;

// ══════════════════════════════════════════════════════════════════════════════
// Sinks
// ══════════════════════════════════════════════════════════════════════════════

/// Receiver of observed values, in execution order.
pub trait OutputSink {
    fn observe(&mut self, value: Value);
}

impl OutputSink for Vec<Value> {
    fn observe(&mut self, value: Value) {
        self.push(value);
    }
}

/// Append-only record of a run's observed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputLog {
    values: Vec<Value>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.values.iter().copied()
    }

    /// The values as plain integers.
    pub fn to_i64s(&self) -> Vec<i64> {
        self.iter().map(Value::get).collect()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl OutputSink for OutputLog {
    fn observe(&mut self, value: Value) {
        self.values.push(value);
    }
}

/// Forwards each value to the run's log and to the embedder's sink.
struct Tee<'a> {
    log: &'a mut OutputLog,
    extra: &'a mut dyn OutputSink,
}

impl OutputSink for Tee<'_> {
    fn observe(&mut self, value: Value) {
        self.log.observe(value);
        self.extra.observe(value);
    }
}

/// Writes each value on its own line.
///
/// A write failure cannot abort the run; the first one is kept and later
/// values are dropped.
pub struct WriterSink<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: io::Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// The first write error, if any occurred.
    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Flush and hand back the writer, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> OutputSink for WriterSink<W> {
    fn observe(&mut self, value: Value) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.writer, "{value}") {
            self.error = Some(err);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Reports
// ══════════════════════════════════════════════════════════════════════════════

/// Everything observable about one finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Values printed before the run ended.
    pub output: OutputLog,
    /// The entry function's result, or the error that aborted the run.
    pub outcome: EvalResult<Value>,
    /// Steps consumed (statements plus loop condition checks).
    pub steps: u64,
    /// Deepest call depth reached, entry frame included.
    pub max_depth: usize,
    /// Frames active when the run failed, innermost first. Empty on success.
    pub backtrace: Vec<FrameSnapshot>,
}

impl RunReport {
    pub fn value(&self) -> Option<Value> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&EvalError> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Canonical JSON form of the report.
    ///
    /// ```text
    /// { "output": [..], "outcome": { "value": 0 } | { "error": { "kind", "message" } },
    ///   "steps": .., "max_depth": .., "backtrace": [..] }
    /// ```
    pub fn to_json_value(&self) -> serde_json::Value {
        let outcome = match &self.outcome {
            Ok(value) => serde_json::json!({ "value": value }),
            Err(err) => serde_json::json!({
                "error": { "kind": err.kind(), "message": err.to_string() }
            }),
        };
        serde_json::json!({
            "output": self.output,
            "outcome": outcome,
            "steps": self.steps,
            "max_depth": self.max_depth,
            "backtrace": self.backtrace,
        })
    }

    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Lowercase hex SHA-256 of [`RunReport::to_json`].
    ///
    /// Equal for two runs exactly when their output, outcome, step count,
    /// depth and backtrace agree.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_json().as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Interpreter
// ══════════════════════════════════════════════════════════════════════════════

/// Runs validated programs under one fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: EvalConfig,
}

impl Interpreter {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Execute the program's entry function.
    pub fn run(&self, program: &Program) -> RunReport {
        self.execute(program, None)
    }

    /// Execute the program's entry function, also streaming each observed
    /// value to `sink` as it is printed.
    pub fn run_with_sink(&self, program: &Program, sink: &mut dyn OutputSink) -> RunReport {
        self.execute(program, Some(sink))
    }

    fn execute(&self, program: &Program, extra: Option<&mut dyn OutputSink>) -> RunReport {
        let _span = tracing::debug_span!(
            "run",
            entry = %program.entry_name(),
            functions = program.len()
        )
        .entered();

        let mut log = OutputLog::new();
        let mut tee;
        let sink: &mut dyn OutputSink = match extra {
            Some(extra) => {
                tee = Tee {
                    log: &mut log,
                    extra,
                };
                &mut tee
            }
            None => &mut log,
        };

        let mut evaluator = Evaluator::new(program, &self.config, sink);
        let outcome = evaluator.run_entry();
        let backtrace = evaluator.take_backtrace();
        let steps = evaluator.steps();
        let max_depth = evaluator.max_depth();

        match &outcome {
            Ok(value) => tracing::debug!(%value, steps, max_depth, "run finished"),
            Err(err) => tracing::warn!(
                kind = %err.kind(),
                error = %err,
                steps,
                "run aborted"
            ),
        }

        RunReport {
            output: log,
            outcome,
            steps,
            max_depth,
            backtrace,
        }
    }
}

/// Run `program` under the default configuration.
pub fn run(program: &Program) -> RunReport {
    Interpreter::default().run(program)
}
