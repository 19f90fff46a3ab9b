//! # Kernel
//!
//! Top-level initialization and the public API of CyclOS: the global
//! scheduler instance, the task registration surface, and system
//! startup. All public functions use critical sections to ensure
//! interrupt safety.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()          ← Install the global scheduler
//!         ├─► kernel::create_task()   ← Register tasks (×TASK_COUNT)
//!         ├─► kernel::on_heartbeat()  ← Optional application hooks
//!         ├─► kernel::on_fault()
//!         └─► kernel::start()         ← Arm SysTick, park in the idle
//!               loop; the first tick hands control to a task and the
//!               idle loop never resumes
//! ```

use crate::arch::cortex_m4;
use crate::errors::{KernelError, KernelResult};
use crate::scheduler::Scheduler;
use crate::sync;
use crate::task::TaskEntry;

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Global scheduler instance.
///
/// # Safety
/// Accessed via `SCHEDULER_PTR`, which is set during `init()`. All
/// access is through critical sections or from the SysTick handler
/// (where execution is already serialized).
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Raw pointer to the global scheduler, used by the arch layer (the
/// SysTick handler cannot easily use references) and by the fault trap.
///
/// # Safety
/// Set once during `init()`, read from ISR context.
pub static mut SCHEDULER_PTR: *mut Scheduler = core::ptr::null_mut();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the kernel. Must be called exactly once, from the main
/// thread, before any other kernel function.
pub fn init() {
    unsafe {
        SCHEDULER_PTR = core::ptr::addr_of_mut!(SCHEDULER);
        *SCHEDULER_PTR = Scheduler::new();
    }
}

/// Register task `id` with the given entry point, building its initial
/// saved context. Call once per task index in `0..TASK_COUNT`, before
/// `start()`.
///
/// # Errors
/// - [`KernelError::NotInitialized`] if `init()` has not run.
/// - [`KernelError::InvalidTaskId`] if `id` is out of range.
pub fn create_task(id: usize, entry: TaskEntry) -> KernelResult<()> {
    sync::critical_section(|_cs| unsafe {
        if SCHEDULER_PTR.is_null() {
            return Err(KernelError::NotInitialized);
        }
        (*SCHEDULER_PTR).create_task(id, entry)
    })
}

/// Register the heartbeat hook, fired once every `HEARTBEAT_TICKS`
/// switch invocations on the scheduler stack (e.g. to toggle a status
/// LED). Keep it short — it runs inside the switch handler.
pub fn on_heartbeat(hook: fn()) -> KernelResult<()> {
    sync::critical_section(|_cs| unsafe {
        if SCHEDULER_PTR.is_null() {
            return Err(KernelError::NotInitialized);
        }
        (*SCHEDULER_PTR).set_heartbeat(hook);
        Ok(())
    })
}

/// Register the fault hook, invoked if a task's entry function returns
/// (e.g. to raise a fault indicator) before that task parks for good.
pub fn on_fault(hook: fn()) -> KernelResult<()> {
    sync::critical_section(|_cs| unsafe {
        if SCHEDULER_PTR.is_null() {
            return Err(KernelError::NotInitialized);
        }
        (*SCHEDULER_PTR).set_fault(hook);
        Ok(())
    })
}

/// Start the system. **Does not return.**
///
/// Verifies that every task slot has been populated, arms SysTick, and
/// parks in the idle loop. The first tick records this boot stack into
/// the scheduler slot and dispatches task 1; the idle loop is never
/// scheduled again.
///
/// If the task table is incomplete the timer is never armed and the
/// system parks immediately — a configuration error fails fast rather
/// than switching into a null stack pointer.
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    let armed = sync::critical_section(|_cs| unsafe {
        !SCHEDULER_PTR.is_null() && (*SCHEDULER_PTR).ready()
    });

    if armed {
        cortex_m4::configure_systick(&mut core_peripherals.SYST);
    }

    // Idle until the first tick takes over (or forever, if a
    // configuration error kept the timer disarmed).
    loop {
        cortex_m::asm::wfi();
    }
}
