//! Interrupt-to-task event counting.

use core::sync::atomic::{AtomicU32, Ordering};

/// Count of interrupts recorded by one handler.
///
/// Single writer (the handler), single reader (the supervisory call). The
/// increment is a relaxed load followed by a store so that it also builds
/// on cores without atomic read-modify-write (Cortex-M0/M0+).
#[derive(Debug, Default)]
pub struct InterruptCounter {
    count: AtomicU32,
}

impl InterruptCounter {
    /// Counter at zero, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one interrupt. Call only from the owning handler.
    pub fn record(&self) {
        let seen = self.count.load(Ordering::Relaxed);
        self.count.store(seen.wrapping_add(1), Ordering::Relaxed);
    }

    /// Interrupts recorded so far.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Back to zero. Only while the owning interrupt source is disabled.
    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_increments() {
        static EVENTS: InterruptCounter = InterruptCounter::new();
        let before = EVENTS.count();
        EVENTS.record();
        EVENTS.record();
        assert_eq!(EVENTS.count(), before.wrapping_add(2));
    }

    #[test]
    fn test_clear_returns_to_zero() {
        let events = InterruptCounter::new();
        events.record();
        events.clear();
        assert_eq!(events.count(), 0);
        events.record();
        assert_eq!(events.count(), 1);
    }
}
