//! # CyclOS Configuration
//!
//! Compile-time constants governing the scheduler and system behavior.
//! All limits are fixed at compile time — no dynamic allocation.

/// Number of tasks in the system. Fixed at boot; there is no interface
/// to add or remove tasks once the timer is armed.
pub const TASK_COUNT: usize = 3;

/// Per-task stack size in bytes. Must hold the deepest call chain plus
/// one full saved context (32 bytes hardware frame + 36 bytes software
/// frame) at the top whenever the task is preempted.
pub const STACK_SIZE: usize = 256;

/// SysTick frequency in Hz. The tick period is the time quota each task
/// receives before the switch routine preempts it (500 Hz = 2 ms).
pub const TICK_HZ: u32 = 500;

/// Number of switch invocations between firings of the heartbeat hook.
/// The hook is a courtesy side effect for the surrounding application
/// and never alters scheduling decisions.
pub const HEARTBEAT_TICKS: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
