//! Per-run evaluator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::value::{IntWidth, OverflowPolicy};

/// Default ceiling on simultaneously active call frames.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 2048;

/// How condition values map to true/false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truthiness {
    /// Any non-zero value is true.
    #[default]
    NonZero,
    /// Only `0` and `1` are accepted; anything else aborts the run.
    Strict,
}

/// Fixed parameters of one run.
///
/// Every field has a default, so a partial JSON document such as
/// `{ "width": 32, "step_budget": 100000 }` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub width: IntWidth,
    pub overflow: OverflowPolicy,
    pub truthiness: Truthiness,
    /// Maximum number of simultaneously active frames, entry frame included.
    pub max_call_depth: usize,
    /// Total steps (statements plus `while` condition checks) allowed.
    pub step_budget: Option<u64>,
    /// Iterations allowed per execution of one `while` statement.
    pub loop_iteration_budget: Option<u64>,
    /// Wall-clock time allowed for the whole run, in milliseconds.
    pub time_budget_ms: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            width: IntWidth::default(),
            overflow: OverflowPolicy::default(),
            truthiness: Truthiness::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            step_budget: None,
            loop_iteration_budget: None,
            time_budget_ms: None,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_width(mut self, width: IntWidth) -> Self {
        self.width = width;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_truthiness(mut self, truthiness: Truthiness) -> Self {
        self.truthiness = truthiness;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_step_budget(mut self, steps: u64) -> Self {
        self.step_budget = Some(steps);
        self
    }

    pub fn with_loop_iteration_budget(mut self, iterations: u64) -> Self {
        self.loop_iteration_budget = Some(iterations);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(u64::try_from(budget.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
