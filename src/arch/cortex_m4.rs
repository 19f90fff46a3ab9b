//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) processor:
//! SysTick timer configuration and the context-switch exception handler.
//!
//! ## Context Switch Mechanism
//!
//! Tasks run in Thread mode on the main stack pointer; the switch
//! handler re-points SP between per-task stack regions directly. On
//! exception entry the hardware stacks R0–R3, R12, LR, PC and xPSR onto
//! the outgoing task's stack; the handler stacks R4–R11 and LR (the
//! EXC_RETURN value) on top of that, which completes the saved context.
//! Restoring is the mirror image, finished by the exception return that
//! unstacks the hardware frame from the incoming task's stack.
//!
//! In between, the handler hops onto the stack recorded in the
//! scheduler slot, so its own bookkeeping never eats into a task's
//! stack budget.

use cortex_m::peripheral::syst::SystClkSource;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer to fire at `TICK_HZ`, the fixed time
/// quota each task receives. Each tick invokes the `SysTick` exception
/// handler below, which performs one complete context switch.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// SysTick handler (context switch)
// ---------------------------------------------------------------------------

/// SysTick exception handler — the context switch itself. The only code
/// that reads or writes raw register state across task boundaries.
///
/// ## Sequence
/// 1. Stack R4–R11 and LR onto the outgoing stack (the hardware already
///    stacked R0–R3, R12, LR, PC, xPSR on entry)
/// 2. `park`: file the outgoing stack pointer in the slot table, fetch
///    the scheduler slot
/// 3. Hop onto the scheduler stack
/// 4. `rotate`: advance the round-robin index and the heartbeat divisor,
///    file the scheduler stack pointer back, fetch the incoming slot
/// 5. Hop onto the incoming task's stack
/// 6. Unstack R4–R11 and LR, then exception-return, which unstacks the
///    hardware frame and resumes the task — at its entry point if it
///    has never run, at the interrupted instruction otherwise
///
/// On the very first tick the "outgoing task" is the boot idle loop:
/// its stack pointer lands in the scheduler slot (the active index
/// starts at the sentinel) and the boot stack becomes the scheduler
/// stack from then on.
///
/// # Safety
/// Naked function invoked directly through the vector table. It must
/// not be reentered; the tick period is configuration and assumed to
/// exceed the worst-case switch time.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[allow(non_snake_case)]
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn SysTick() {
    core::arch::naked_asm!(
        // Software half of the outgoing context.
        "push {{r4-r11, lr}}",
        // slots[active] = sp; r0 = scheduler slot.
        "mov r0, sp",
        "bl {park}",
        "mov sp, r0",
        // Bookkeeping on the scheduler stack; files sp back into the
        // scheduler slot and returns the incoming task's slot.
        "bl {rotate}",
        "mov sp, r0",
        // Software half of the incoming context, then exception return
        // unstacks its hardware half.
        "pop {{r4-r11, lr}}",
        "bx lr",
        park = sym park,
        rotate = sym rotate,
    );
}

/// Record the outgoing stack pointer and return the scheduler stack.
/// Called from the handler while still on the outgoing stack.
///
/// # Safety
/// Called from the SysTick handler only, after `kernel::init()`.
#[cfg(all(target_arch = "arm", target_os = "none"))]
unsafe extern "C" fn park(sp: *mut u32) -> *mut u32 {
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    scheduler.record_active(sp)
}

/// Advance the round robin and return the incoming task's stack.
/// Called from the handler on the scheduler stack; `sp` is the
/// scheduler stack pointer to file back into its slot.
///
/// # Safety
/// Called from the SysTick handler only, after `kernel::init()`.
#[cfg(all(target_arch = "arm", target_os = "none"))]
unsafe extern "C" fn rotate(sp: *mut u32) -> *mut u32 {
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    scheduler.reschedule(sp)
}
