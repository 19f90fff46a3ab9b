//! # Scheduler
//!
//! Core scheduling state and logic for CyclOS: the context slot table,
//! the per-task stack regions, the round-robin selector, and the
//! bookkeeping the switch handler performs between stack switches.
//!
//! ## Switch Protocol
//!
//! The SysTick handler (see `arch::cortex_m4`) drives two methods per
//! invocation:
//!
//! 1. [`Scheduler::record_active`] — file the outgoing stack pointer in
//!    the slot table and hand back the scheduler slot, so the handler
//!    can move onto the dedicated bookkeeping stack.
//! 2. [`Scheduler::reschedule`] — advance the round-robin index, run the
//!    heartbeat divisor, file the scheduler stack pointer back into its
//!    slot, and hand back the incoming task's stack pointer.
//!
//! ## Bootstrap
//!
//! `active` starts at the sentinel `TASK_COUNT`, which is also the index
//! of the scheduler slot. On the very first tick the boot/idle stack
//! pointer is therefore recorded straight into the scheduler slot: the
//! stack the system booted on becomes the scheduler's bookkeeping stack
//! for the rest of its life, and the first task ever dispatched is task
//! 1, not task 0 (sentinel-plus-one modulo TASK_COUNT — kept for
//! compatibility with the behavior this core reimplements).

use crate::config::{HEARTBEAT_TICKS, TASK_COUNT};
use crate::errors::{KernelError, KernelResult};
use crate::task::{ContextFrame, TaskEntry, TaskStack};

/// Index of the scheduler slot in the context slot table, one past the
/// last task slot. Doubles as the idle sentinel for `active` before the
/// first switch.
pub const SCHEDULER_SLOT: usize = TASK_COUNT;

/// Number of entries in the context slot table: one per task plus the
/// scheduler slot.
pub const SLOT_COUNT: usize = TASK_COUNT + 1;

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: all task stack regions, the context
/// slot table, and the active index. Stored as a global `static mut`
/// in `kernel.rs`; created once at boot and never destroyed.
///
/// Slots `0..TASK_COUNT` each point at a complete [`ContextFrame`]
/// inside the corresponding stack region whenever that task is not
/// executing. Slot `TASK_COUNT` points at a usable location on the
/// scheduler's own bookkeeping stack. Entries are written once by
/// [`Scheduler::create_task`] and thereafter mutated only from the
/// switch handler.
pub struct Scheduler {
    /// Private stack region for each task.
    stacks: [TaskStack; TASK_COUNT],

    /// Context slot table: saved stack pointers, one per task plus the
    /// scheduler slot.
    slots: [*mut u32; SLOT_COUNT],

    /// Index of the task that owns the processor. Starts at the
    /// `TASK_COUNT` sentinel until the first switch.
    active: usize,

    /// Switch invocations since the heartbeat hook last fired.
    heartbeat_ticks: u32,

    /// Courtesy hook fired once every `HEARTBEAT_TICKS` invocations,
    /// on the scheduler stack. Never alters scheduling decisions.
    heartbeat: Option<fn()>,

    /// Hook invoked from the fault trap before the system parks.
    fault: Option<fn()>,
}

// Safety: the raw pointers in the slot table only ever point into the
// scheduler's own stack regions or the boot stack. All mutation happens
// either before the timer is armed or inside the switch handler, which
// is never reentered.
unsafe impl Send for Scheduler {}
unsafe impl Sync for Scheduler {}

impl Scheduler {
    /// Create an empty scheduler with the active index at the sentinel.
    pub const fn new() -> Self {
        Self {
            stacks: [TaskStack::NEW; TASK_COUNT],
            slots: [core::ptr::null_mut(); SLOT_COUNT],
            active: SCHEDULER_SLOT,
            heartbeat_ticks: 0,
            heartbeat: None,
            fault: None,
        }
    }

    // -----------------------------------------------------------------------
    // Task initializer
    // -----------------------------------------------------------------------

    /// Construct the initial saved context for task `id` so the switch
    /// protocol can dispatch it exactly like a preempted task.
    ///
    /// The context is placed at the top of the task's stack region and
    /// its address recorded in the slot table. Must be called once per
    /// task before the timer is armed; an out-of-range `id` is rejected
    /// rather than corrupting a neighbouring region.
    pub fn create_task(&mut self, id: usize, entry: TaskEntry) -> KernelResult<()> {
        if id >= TASK_COUNT {
            return Err(KernelError::InvalidTaskId(id));
        }

        let top = self.stacks[id].top();
        let frame = (top as usize - core::mem::size_of::<ContextFrame>()) as *mut ContextFrame;

        // Safety: `frame` lies entirely inside stack region `id`
        // (STACK_SIZE holds at least two frames, checked at compile
        // time) and nothing else references that memory yet.
        unsafe {
            frame.write(ContextFrame::initial(entry, top, task_fault));
        }

        self.slots[id] = frame as *mut u32;
        Ok(())
    }

    /// True once every task slot holds an initial context. `start`
    /// refuses to arm the timer before this.
    pub fn ready(&self) -> bool {
        self.slots[..TASK_COUNT].iter().all(|sp| !sp.is_null())
    }

    // -----------------------------------------------------------------------
    // Switch bookkeeping (called from the SysTick handler)
    // -----------------------------------------------------------------------

    /// Step 1 of the switch: file the outgoing stack pointer under the
    /// current active index and return the scheduler slot.
    ///
    /// On the very first invocation `active` is the sentinel, which is
    /// the scheduler slot itself: the boot stack pointer is recorded
    /// there and immediately returned, so the handler keeps running on
    /// the boot stack and that stack becomes the scheduler stack.
    pub fn record_active(&mut self, sp: *mut u32) -> *mut u32 {
        self.slots[self.active] = sp;
        self.slots[SCHEDULER_SLOT]
    }

    /// Steps 3–5 of the switch, run on the scheduler stack: advance the
    /// round-robin index, tick the heartbeat divisor, file the scheduler
    /// stack pointer back into its slot, and return the stack pointer of
    /// the newly active task.
    pub fn reschedule(&mut self, scheduler_sp: *mut u32) -> *mut u32 {
        self.active = next_task(self.active);

        self.heartbeat_ticks = (self.heartbeat_ticks + 1) % HEARTBEAT_TICKS;
        if self.heartbeat_ticks == 0 {
            if let Some(hook) = self.heartbeat {
                hook();
            }
        }

        self.slots[SCHEDULER_SLOT] = scheduler_sp;
        self.slots[self.active]
    }

    // -----------------------------------------------------------------------
    // Hooks and introspection
    // -----------------------------------------------------------------------

    /// Register the heartbeat hook. Keep it short: it runs inside the
    /// switch handler, on the scheduler stack.
    pub fn set_heartbeat(&mut self, hook: fn()) {
        self.heartbeat = Some(hook);
    }

    /// Register the fault hook invoked when a task body returns.
    pub fn set_fault(&mut self, hook: fn()) {
        self.fault = Some(hook);
    }

    /// Index of the task that currently owns the processor
    /// (`TASK_COUNT` until the first switch).
    pub fn active_task(&self) -> usize {
        self.active
    }

    /// Raw slot table entry, for inspection.
    pub fn slot(&self, index: usize) -> *mut u32 {
        self.slots[index]
    }
}

/// Round-robin selector: fixed cyclic order, no priorities, no skipping.
/// Starting from the `TASK_COUNT` sentinel the first selection is task
/// `(TASK_COUNT + 1) % TASK_COUNT`, i.e. task 1.
pub const fn next_task(current: usize) -> usize {
    (current + 1) % TASK_COUNT
}

// ---------------------------------------------------------------------------
// Fault trap
// ---------------------------------------------------------------------------

/// Landing point for a task whose entry function returns. Task bodies
/// loop forever by convention, so reaching this is a protocol violation:
/// the registered fault hook gets a chance to raise an indicator, then
/// the task parks for good (the other tasks keep being scheduled).
pub(crate) extern "C" fn task_fault() -> ! {
    // Read through the raw pointer: this runs in task context and the
    // hook field is only written before the timer is armed.
    let hook = unsafe {
        let scheduler = crate::kernel::SCHEDULER_PTR;
        if scheduler.is_null() {
            None
        } else {
            (*scheduler).fault
        }
    };
    if let Some(hook) = hook {
        hook();
    }
    loop {
        cortex_m::asm::wfi();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;
    use core::sync::atomic::{AtomicU32, Ordering};

    extern "C" fn spin() -> ! {
        loop {}
    }

    fn populated() -> Scheduler {
        let mut scheduler = Scheduler::new();
        for id in 0..TASK_COUNT {
            scheduler.create_task(id, spin).unwrap();
        }
        scheduler
    }

    #[test]
    fn test_starts_at_sentinel() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.active_task(), TASK_COUNT);
        assert!(!scheduler.ready());
    }

    #[test]
    fn test_next_task_is_cyclic() {
        assert_eq!(next_task(TASK_COUNT), (TASK_COUNT + 1) % TASK_COUNT);
        assert_eq!(next_task(0), 1);
        assert_eq!(next_task(1), 2);
        assert_eq!(next_task(2), 0);
    }

    #[test]
    fn test_create_task_places_context_below_stack_top() {
        let mut scheduler = Scheduler::new();
        scheduler.create_task(0, spin).unwrap();

        let top = scheduler.stacks[0].top() as usize;
        let slot = scheduler.slot(0) as usize;
        assert_eq!(slot, top - size_of::<ContextFrame>());

        // Safety: the slot points at the frame just written.
        let frame = unsafe { &*(scheduler.slot(0) as *const ContextFrame) };
        assert_eq!(frame.hardware.pc, spin as usize as u32);
        assert_eq!(frame.hardware.lr, task_fault as usize as u32);
    }

    #[test]
    fn test_create_task_rejects_out_of_range_id() {
        let mut scheduler = Scheduler::new();
        assert_eq!(
            scheduler.create_task(TASK_COUNT, spin),
            Err(KernelError::InvalidTaskId(TASK_COUNT))
        );
    }

    #[test]
    fn test_ready_after_all_tasks_created() {
        let mut scheduler = Scheduler::new();
        for id in 0..TASK_COUNT {
            assert!(!scheduler.ready());
            scheduler.create_task(id, spin).unwrap();
        }
        assert!(scheduler.ready());
    }

    #[test]
    fn test_bootstrap_records_boot_stack_into_scheduler_slot() {
        let mut scheduler = populated();
        let boot_sp = 0x2000_4000usize as *mut u32;

        // First invocation: active is the sentinel, so the boot stack
        // pointer lands in the scheduler slot and is returned as the
        // bookkeeping stack.
        assert_eq!(scheduler.record_active(boot_sp), boot_sp);
        assert_eq!(scheduler.slot(SCHEDULER_SLOT), boot_sp);

        // The first task ever dispatched is task 1.
        let next = scheduler.reschedule(boot_sp);
        assert_eq!(scheduler.active_task(), 1);
        assert_eq!(next, scheduler.slot(1));
    }

    #[test]
    fn test_round_robin_cycle_after_sentinel() {
        let mut scheduler = populated();
        let sp = 0x2000_4000usize as *mut u32;

        let mut order = [0usize; 8];
        for pick in order.iter_mut() {
            let _ = scheduler.record_active(sp);
            let _ = scheduler.reschedule(sp);
            *pick = scheduler.active_task();
        }
        assert_eq!(order, [1, 2, 0, 1, 2, 0, 1, 2]);

        // After k invocations the index is (TASK_COUNT + k) % TASK_COUNT;
        // every window of TASK_COUNT consecutive picks covers each task
        // exactly once.
        for window in order.windows(TASK_COUNT) {
            let mut seen = [false; TASK_COUNT];
            for &id in window {
                assert!(!seen[id]);
                seen[id] = true;
            }
        }
    }

    #[test]
    fn test_saved_stack_pointer_round_trips() {
        let mut scheduler = populated();
        let boot_sp = 0x2000_4000usize as *mut u32;

        // Bootstrap onto the scheduler stack.
        let scheduler_sp = scheduler.record_active(boot_sp);
        scheduler.reschedule(scheduler_sp);

        // Give each task a distinct fake preemption point and verify it
        // reads back identical when the cycle comes around again.
        let marks: [*mut u32; TASK_COUNT] = [
            0x1000_0010usize as *mut u32,
            0x1000_0020usize as *mut u32,
            0x1000_0030usize as *mut u32,
        ];
        let mut resumed = core::ptr::null_mut();
        for _ in 0..TASK_COUNT {
            let id = scheduler.active_task();
            let scheduler_sp = scheduler.record_active(marks[id]);
            resumed = scheduler.reschedule(scheduler_sp);
        }
        // One full cycle later, task 1 resumes where it was "preempted".
        assert_eq!(scheduler.active_task(), 1);
        assert_eq!(resumed, marks[1]);
    }

    #[test]
    fn test_heartbeat_fires_once_per_period() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn bump() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let mut scheduler = populated();
        scheduler.set_heartbeat(bump);
        let sp = 0x2000_4000usize as *mut u32;

        let total = 2 * HEARTBEAT_TICKS + 500;
        for _ in 0..total {
            let _ = scheduler.reschedule(sp);
        }
        assert_eq!(FIRED.load(Ordering::Relaxed), total / HEARTBEAT_TICKS);
    }
}
