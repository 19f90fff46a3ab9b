//! # CyclOS — a minimal preemptive round-robin multitasking core
//!
//! A fixed set of independently coded tasks time-sliced on a single
//! ARM Cortex-M4 core by the SysTick interrupt. Each tick, the switch
//! handler saves the interrupted task's register state, advances to the
//! next task in a fixed cyclic order, and restores that task's state
//! before returning from the exception. Tasks cannot opt out of or
//! influence preemption: there are no priorities, no blocking
//! primitives, no inter-task communication, and no task lifecycle
//! beyond creation at boot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Application Tasks (×3)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                   │
//! │   init() · create_task() · on_heartbeat() · on_fault()   │
//! │                     · start()                            │
//! ├───────────────────────────┬─────────────────────────────┤
//! │  Scheduler (scheduler.rs) │  Sync Primitives (sync.rs)  │
//! │  ─ context slot table     │  ─ critical_section         │
//! │  ─ round-robin selector   │                             │
//! │  ─ heartbeat divisor      │                             │
//! │  ─ fault trap             │                             │
//! ├───────────────────────────┴─────────────────────────────┤
//! │                 Task Model (task.rs)                     │
//! │     TaskStack · ContextFrame (hardware + software)       │
//! ├─────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                 │
//! │        SysTick config · naked switch handler             │
//! ├─────────────────────────────────────────────────────────┤
//! │           ARM Cortex-M4 Hardware (Thumb-2)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Switch Protocol
//!
//! The slot table holds one saved stack pointer per task plus a
//! reserved scheduler slot. Each tick the handler: stacks the software
//! register half on the outgoing stack and files the stack pointer
//! under the active index; hops onto the scheduler slot's stack for
//! bookkeeping (round-robin advance, heartbeat divisor); files the
//! scheduler stack pointer back; then restores the incoming task from
//! its slot and exception-returns into it. A freshly created task is
//! dispatched through the exact same path, because its initial saved
//! context is laid out identically to a preempted one.
//!
//! The active index starts at a sentinel one past the last task, which
//! makes the first tick record the boot stack into the scheduler slot
//! (the boot stack becomes the bookkeeping stack) and dispatch task 1
//! first — the cyclic order is 1, 2, 0, 1, …
//!
//! ## Memory Model
//!
//! - **No heap**: all state is statically allocated
//! - **Pure `core`**: no `alloc`, no `std`
//! - **Fixed task set**: `[TaskStack; TASK_COUNT]` plus a slot table of
//!   `TASK_COUNT + 1` saved stack pointers, all inside one scheduler
//!   struct created at boot and alive until power-off
//! - **Critical sections**: `cortex_m::interrupt::free()` around every
//!   access from thread mode

#![no_std]

pub mod arch;
pub mod config;
pub mod errors;
pub mod kernel;
pub mod scheduler;
pub mod sync;
pub mod task;
