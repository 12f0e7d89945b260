//! Cancellation latch.
//!
//! Interrupts are produced by:
//! - the console reader thread (Ctrl+C byte on the UART console)
//! - the BOOT button poll on the same thread
//!
//! and consumed by the supervisor and session manager at their suspension
//! points (countdown slices, grace-window slices, accept-timeout returns).
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ Console ^C  │────▶│ InterruptLatch │────▶│ Supervisor /     │
//! │ BOOT button │────▶│ (0, 1 or 2)    │     │ SessionManager   │
//! └─────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! Signals are not queued.  The latch saturates at two levels: the
//! "current" signal and one pending escalation.  Anything beyond that is
//! dropped.

use core::sync::atomic::{AtomicU8, Ordering};
use core::time::Duration;

use crate::app::ports::Clock;

/// Highest level the latch holds.
const MAX_PENDING: u8 = 2;

/// Process-wide latch used by the firmware binary.
pub static INTERRUPTS: InterruptLatch = InterruptLatch::new();

/// Lock-free two-level cancellation latch.
pub struct InterruptLatch {
    pending: AtomicU8,
}

impl InterruptLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
        }
    }

    /// Record one signal.  Safe to call from another thread or ISR context.
    /// Returns `false` if the latch was already saturated (signal dropped).
    pub fn raise(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < MAX_PENDING).then_some(n + 1)
            })
            .is_ok()
    }

    /// Consume one signal.  Returns `true` if one was pending.
    pub fn take(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Number of signals waiting to be observed.
    pub fn pending(&self) -> u8 {
        self.pending.load(Ordering::Acquire)
    }

    /// Drop every pending signal.
    pub fn clear(&self) {
        self.pending.store(0, Ordering::Release);
    }
}

impl Default for InterruptLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`wait_interruptible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration passed without a signal.
    Elapsed,
    /// A signal was consumed before the duration passed.
    Interrupted,
}

/// Sleep for `duration` in `slice`-sized steps, polling `latch` before
/// each step.  A signal already pending on entry interrupts immediately.
pub fn wait_interruptible(
    clock: &mut impl Clock,
    latch: &InterruptLatch,
    duration: Duration,
    slice: Duration,
) -> WaitOutcome {
    wait_interruptible_with(clock, latch, duration, slice, || {})
}

/// [`wait_interruptible`], calling `on_slice` after every step.
pub fn wait_interruptible_with(
    clock: &mut impl Clock,
    latch: &InterruptLatch,
    duration: Duration,
    slice: Duration,
    mut on_slice: impl FnMut(),
) -> WaitOutcome {
    let start = clock.now();
    loop {
        if latch.take() {
            return WaitOutcome::Interrupted;
        }
        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= duration {
            return WaitOutcome::Elapsed;
        }
        clock.sleep(slice.min(duration - elapsed));
        on_slice();
    }
}
