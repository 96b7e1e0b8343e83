//! Stack growth for recursive rendering.
//!
//! Nested zones render recursively and expressions evaluate recursively, so
//! deeply nested templates could exhaust the native stack. Both paths run
//! through [`ensure_sufficient_stack`], which grows the stack with `stacker`
//! when the remaining space drops below the red zone.

/// Run `f`, growing the stack first if little of it is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
