//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstraction for the Cortex-M4.
//! The registration surface runs on the main thread while the SysTick
//! handler mutates the same scheduler state, so every access outside
//! the handler goes through a critical section.

use cortex_m::interrupt;

/// Execute a closure with interrupts disabled.
///
/// Interrupts are masked on entry and restored on exit, making the
/// enclosed access to shared scheduler state atomic with respect to the
/// switch handler. Keep critical sections short: a tick that fires
/// while masked is delayed, not lost, but task quotas stretch.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
