//! # Task Model
//!
//! Defines the per-task memory: the private stack region and the saved
//! register context that lives at its top whenever the task is not the
//! one executing.
//!
//! ## Saved Context Layout
//!
//! The context is split into two halves, matching what the Cortex-M4
//! exception machinery does and does not stack automatically:
//!
//! - **Hardware frame**: R0–R3, R12, LR, PC, xPSR — pushed by the
//!   processor on exception entry, popped again on exception return.
//!   The field order is fixed by the architecture.
//! - **Software frame**: R4–R11 plus LR — the callee-saved registers the
//!   switch routine itself must preserve. Stored immediately below the
//!   hardware frame.
//!
//! While a task is running, the top of its stack region is live call
//! frames and the saved context is logically invalid. The moment it is
//! preempted, these 68 bytes hold the complete resumable state.

use crate::config::STACK_SIZE;

/// The entry point signature for a task.
///
/// Tasks loop forever and take no arguments. A task that returns anyway
/// lands in the fault trap via the `lr` planted in its initial frame.
pub type TaskEntry = extern "C" fn() -> !;

/// xPSR value for a task that has never run: Thumb state bit set,
/// no active exception, default flags.
pub const XPSR_THUMB: u32 = 0x0100_0000;

/// EXC_RETURN value meaning "return to Thread mode, resume on the main
/// stack". Planted in the software frame's LR so that the first switch
/// into a fresh task performs a normal exception return onto its stack.
pub const EXC_RETURN_THREAD_MSP: u32 = 0xFFFF_FFF9;

// ---------------------------------------------------------------------------
// Saved register context
// ---------------------------------------------------------------------------

/// Registers the switch routine saves and restores by hand (R4–R11, LR).
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SoftwareFrame {
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    pub lr: u32,
}

/// Registers the exception entry sequence stacks automatically.
/// Field order is the architectural unstacking order.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct HardwareFrame {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

/// One complete saved register context as it sits in memory at the top
/// of a preempted task's stack: software frame below, hardware frame
/// above, so that `pop {r4-r11, lr}` followed by an exception return
/// consumes the whole thing.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ContextFrame {
    pub software: SoftwareFrame,
    pub hardware: HardwareFrame,
}

impl ContextFrame {
    /// A fully zeroed frame.
    pub const ZEROED: Self = Self {
        software: SoftwareFrame {
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            lr: 0,
        },
        hardware: HardwareFrame {
            r0: 0,
            r1: 0,
            r2: 0,
            r3: 0,
            r12: 0,
            lr: 0,
            pc: 0,
            xpsr: 0,
        },
    };

    /// Build the initial context for a task that has never run, so the
    /// switch protocol can bootstrap it exactly like a preempted one.
    ///
    /// - `pc` is the entry point, `xpsr` marks normal Thumb execution.
    /// - `hardware.lr` is the fault trap: if the entry function ever
    ///   returns, control lands there instead of in undefined memory.
    /// - `software.r7` mirrors the stack top so early frame-pointer
    ///   relative code in the task sees a consistent value.
    /// - `software.lr` is EXC_RETURN for Thread mode on the main stack.
    pub fn initial(entry: TaskEntry, stack_top: *mut u32, on_return: TaskEntry) -> Self {
        let mut frame = Self::ZEROED;
        frame.software.r7 = stack_top as usize as u32;
        frame.software.lr = EXC_RETURN_THREAD_MSP;
        frame.hardware.lr = on_return as usize as u32;
        frame.hardware.pc = entry as usize as u32;
        frame.hardware.xpsr = XPSR_THUMB;
        frame
    }
}

// ---------------------------------------------------------------------------
// Task stack region
// ---------------------------------------------------------------------------

/// A task's private stack region. Fixed size, never resized, never
/// shared, never freed. Aligned to 8 bytes as required by the AAPCS;
/// the stack grows downward from `top()`.
#[repr(align(8))]
pub struct TaskStack([u8; STACK_SIZE]);

impl TaskStack {
    /// An empty stack region, used to initialize the static array.
    pub const NEW: Self = Self([0; STACK_SIZE]);

    /// One past the highest address of the region — the initial stack
    /// pointer of a task with an empty stack.
    pub fn top(&mut self) -> *mut u32 {
        // STACK_SIZE is a multiple of 8 and the region is 8-aligned,
        // so the top keeps the AAPCS stack alignment.
        unsafe { self.0.as_mut_ptr().add(STACK_SIZE) as *mut u32 }
    }
}

// A context must fit in the stack region with room left to run.
const _: () = assert!(STACK_SIZE >= 2 * core::mem::size_of::<ContextFrame>());

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};

    extern "C" fn spin() -> ! {
        loop {}
    }

    extern "C" fn trap() -> ! {
        loop {}
    }

    #[test]
    fn test_frame_layout_matches_exception_unstacking() {
        // 9 software words + 8 hardware words.
        assert_eq!(size_of::<SoftwareFrame>(), 36);
        assert_eq!(size_of::<HardwareFrame>(), 32);
        assert_eq!(size_of::<ContextFrame>(), 68);

        // Software half sits below the hardware half.
        assert_eq!(offset_of!(ContextFrame, software), 0);
        assert_eq!(offset_of!(ContextFrame, hardware), 36);

        // Architectural unstacking order of the hardware frame.
        assert_eq!(offset_of!(HardwareFrame, r0), 0);
        assert_eq!(offset_of!(HardwareFrame, r1), 4);
        assert_eq!(offset_of!(HardwareFrame, r2), 8);
        assert_eq!(offset_of!(HardwareFrame, r3), 12);
        assert_eq!(offset_of!(HardwareFrame, r12), 16);
        assert_eq!(offset_of!(HardwareFrame, lr), 20);
        assert_eq!(offset_of!(HardwareFrame, pc), 24);
        assert_eq!(offset_of!(HardwareFrame, xpsr), 28);
    }

    #[test]
    fn test_initial_frame_decodes_to_entry_state() {
        let mut stack = TaskStack::NEW;
        let top = stack.top();
        let frame = ContextFrame::initial(spin, top, trap);

        assert_eq!(frame.hardware.pc, spin as usize as u32);
        assert_eq!(frame.hardware.xpsr, XPSR_THUMB);
        assert_eq!(frame.hardware.lr, trap as usize as u32);
        assert_eq!(frame.software.lr, EXC_RETURN_THREAD_MSP);
        assert_eq!(frame.software.r7, top as usize as u32);

        // Everything else starts zeroed.
        assert_eq!(frame.hardware.r0, 0);
        assert_eq!(frame.hardware.r1, 0);
        assert_eq!(frame.hardware.r2, 0);
        assert_eq!(frame.hardware.r3, 0);
        assert_eq!(frame.hardware.r12, 0);
        assert_eq!(frame.software.r4, 0);
        assert_eq!(frame.software.r11, 0);
    }

    #[test]
    fn test_stack_top_is_region_end() {
        let mut stack = TaskStack::NEW;
        let base = stack.0.as_ptr() as usize;
        assert_eq!(stack.top() as usize, base + STACK_SIZE);
        assert_eq!(stack.top() as usize % 8, 0);
    }
}
