//! Call stack with a depth ceiling.
//!
//! The evaluator recurses on the host stack once per MiniC call, nested
//! block, and nested expression. Each level goes through
//! [`ensure_sufficient_stack`], so the configured depth ceiling, not the
//! host thread's stack size, is what stops runaway recursion.

use minic_types::ast::Function;
use serde::Serialize;

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};

pub use minic_types::ensure_sufficient_stack;

// ══════════════════════════════════════════════════════════════════════════════
// Frames
// ══════════════════════════════════════════════════════════════════════════════

/// Activation record of one in-flight call.
#[derive(Debug, Clone)]
pub struct CallFrame<'p> {
    pub function: &'p Function,
    pub env: Environment,
    /// Statement being executed: one 1-based index per open block, from
    /// the function body inward. A `0` entry means the block has not
    /// started its first statement.
    pub position: Vec<usize>,
}

impl<'p> CallFrame<'p> {
    pub fn new(function: &'p Function, env: Environment) -> Self {
        Self {
            function,
            env,
            position: Vec::new(),
        }
    }

    /// Open a block: its statements are indexed from 1.
    pub fn enter_block(&mut self) {
        self.position.push(0);
    }

    /// Move to the next statement of the innermost open block.
    pub fn advance(&mut self) {
        if let Some(index) = self.position.last_mut() {
            *index += 1;
        }
    }

    /// Close the innermost block, returning to its enclosing statement.
    pub fn leave_block(&mut self) {
        self.position.pop();
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            function: self.function.name.clone(),
            position: self.position.clone(),
        }
    }
}

/// Owned copy of a frame's identity, kept in failure backtraces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSnapshot {
    pub function: String,
    /// Statement indices from the function body inward, see [`CallFrame::position`].
    pub position: Vec<usize>,
}

/// Stack of active frames. Never empty: the bottom frame is the entry call.
///
/// The executing frame is held apart from its suspended callers so that
/// access to it is infallible.
#[derive(Debug)]
pub struct CallStack<'p> {
    current: CallFrame<'p>,
    callers: Vec<CallFrame<'p>>,
    max_depth: usize,
    high_water: usize,
}

impl<'p> CallStack<'p> {
    /// Start a stack with the entry frame active.
    pub fn new(entry: CallFrame<'p>, max_depth: usize) -> Self {
        Self {
            current: entry,
            callers: Vec::new(),
            max_depth,
            high_water: 1,
        }
    }

    /// Make `frame` the active frame, suspending the current one.
    ///
    /// Fails with stack exhaustion when the ceiling is already reached;
    /// the frame is not pushed in that case.
    pub fn push(&mut self, frame: CallFrame<'p>) -> EvalResult<()> {
        if self.depth() >= self.max_depth {
            return Err(EvalError::StackExhausted {
                depth: self.max_depth,
            });
        }
        let caller = std::mem::replace(&mut self.current, frame);
        self.callers.push(caller);
        self.high_water = self.high_water.max(self.depth());
        Ok(())
    }

    /// Discard the active frame and resume its caller.
    /// Returns `None` (and keeps the entry frame) when only the entry frame is left.
    pub fn pop(&mut self) -> Option<CallFrame<'p>> {
        let caller = self.callers.pop()?;
        Some(std::mem::replace(&mut self.current, caller))
    }

    pub fn current(&self) -> &CallFrame<'p> {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut CallFrame<'p> {
        &mut self.current
    }

    /// Number of active frames, entry frame included.
    pub fn depth(&self) -> usize {
        self.callers.len() + 1
    }

    /// Deepest depth reached so far.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Snapshot all frames, innermost first.
    pub fn capture(&self) -> Vec<FrameSnapshot> {
        std::iter::once(&self.current)
            .chain(self.callers.iter().rev())
            .map(CallFrame::snapshot)
            .collect()
    }
}
