//! Host stack safety for recursive walks over the AST.
//!
//! Every walker in the workspace (validation, binding resolution, printing,
//! evaluation) recurses once per nested block or expression. Wrapping each
//! level in [`ensure_sufficient_stack`] grows the host stack on demand, so
//! nesting depth is bounded by memory rather than the thread's stack size.

/// Minimum host stack to keep available before recursing (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Host stack allocated per growth (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the host stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
