//! Error handling for the multitasking core.
//!
//! The error surface is deliberately narrow: a bare-metal core has no
//! recovery infrastructure, so everything that can be rejected is
//! rejected at the registration surface, before the timer is armed.
//! Anything that goes wrong after that point is terminal and routed to
//! the fault trap instead of an error value.

use core::fmt;

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors reported by the task registration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Task identifier outside `0..TASK_COUNT`.
    InvalidTaskId(usize),
    /// A kernel operation was called before `kernel::init()`.
    NotInitialized,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidTaskId(id) => write!(f, "invalid task id: {}", id),
            KernelError::NotInitialized => write!(f, "kernel not initialized"),
        }
    }
}
