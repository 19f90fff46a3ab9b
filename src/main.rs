//! # CyclOS Example Firmware
//!
//! Three tasks time-sliced round-robin, mirroring the classic bring-up
//! demo this core is meant for (poll an input, blink an output, count
//! events) with the board layer abstracted away: each task keeps its
//! state in counters, and the application observes the system through
//! the heartbeat and fault hooks instead of driving LEDs directly.
//!
//! | Task | Role | Behavior |
//! |------|------|----------|
//! | `poll_task`  | Input watcher | Tight polling loop, no delays |
//! | `blink_task` | Slow toggler  | Toggle + busy-wait delay |
//! | `count_task` | Event counter | Counts edges of a software signal |
//!
//! None of the tasks ever yields or sleeps through the kernel — there
//! is no such interface. They are simply preempted every tick and
//! resumed, in order, two ticks later.

#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_main)]

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod firmware {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use cortex_m_rt::entry;
    use panic_halt as _;

    use cyclos::kernel;

    /// Iterations of the busy-wait delay loop, tuned for a visible
    /// blink period at the default core clock.
    const COUNT_DELAY: u32 = 3_000_000;

    /// Software stand-ins for the board's input line and indicators.
    static SIGNAL: AtomicBool = AtomicBool::new(false);
    static MIRROR: AtomicBool = AtomicBool::new(false);
    static EDGE_COUNT: AtomicU32 = AtomicU32::new(0);
    static HEARTBEATS: AtomicU32 = AtomicU32::new(0);
    static FAULTED: AtomicBool = AtomicBool::new(false);

    /// Busy-wait delay. The task stays runnable the whole time and
    /// keeps being preempted and resumed mid-loop.
    fn delay() {
        for _ in 0..COUNT_DELAY {
            cortex_m::asm::nop();
        }
    }

    /// Mirrors the input level into an output, as fast as it can.
    /// On real hardware this is the "LED follows button" task.
    extern "C" fn poll_task() -> ! {
        loop {
            let level = SIGNAL.load(Ordering::Relaxed);
            MIRROR.store(level, Ordering::Relaxed);
        }
    }

    /// Toggles the software signal at a human-visible rate via the
    /// busy-wait delay. On real hardware this is the blinking LED.
    extern "C" fn blink_task() -> ! {
        loop {
            SIGNAL.fetch_xor(true, Ordering::Relaxed);
            delay();
        }
    }

    /// Counts rising edges of the software signal.
    extern "C" fn count_task() -> ! {
        let mut last = false;
        loop {
            let level = SIGNAL.load(Ordering::Relaxed);
            if level && !last {
                EDGE_COUNT.fetch_add(1, Ordering::Relaxed);
            }
            last = level;
        }
    }

    /// Heartbeat hook: fired once every `HEARTBEAT_TICKS` switches, on
    /// the scheduler stack. On real hardware this toggles the status
    /// LED; here it keeps a counter the debugger can watch.
    fn heartbeat() {
        HEARTBEATS.fetch_add(1, Ordering::Relaxed);
    }

    /// Fault hook: a task body returned. On real hardware this lights
    /// the fault LED before the offending task parks.
    fn fault() {
        FAULTED.store(true, Ordering::Relaxed);
    }

    /// Firmware entry point: create the tasks, register the hooks, arm
    /// the timer, and wait for the first tick to take over.
    #[entry]
    fn main() -> ! {
        let core_peripherals = cortex_m::Peripherals::take().unwrap();

        kernel::init();

        kernel::create_task(0, poll_task).expect("failed to create poll_task");
        kernel::create_task(1, blink_task).expect("failed to create blink_task");
        kernel::create_task(2, count_task).expect("failed to create count_task");

        kernel::on_heartbeat(heartbeat).expect("kernel not initialized");
        kernel::on_fault(fault).expect("kernel not initialized");

        // Arm SysTick and park; the first tick dispatches blink_task
        // (task 1) and this boot stack becomes the scheduler stack.
        kernel::start(core_peripherals)
    }
}

/// The firmware only makes sense on the target; building for the host
/// (e.g. `cargo test`) gets an empty binary.
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn main() {}
