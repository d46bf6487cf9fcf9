//! Simulated time base and delay provider.

use core::cell::Cell;
use std::boxed::Box;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

/// Shared simulated clock, in nanoseconds since creation.
///
/// Clones share the same time base.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ns: Rc<Cell<u64>>,
}

impl SimClock {
    /// Create a clock at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in nanoseconds.
    pub fn now_ns(&self) -> u64 {
        self.now_ns.get()
    }

    /// Current simulated time in whole microseconds.
    pub fn now_us(&self) -> u64 {
        self.now_ns.get() / 1_000
    }

    /// Move time forward.
    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get().saturating_add(ns));
    }
}

/// Delay provider that advances a [`SimClock`] instead of sleeping.
pub struct MockDelay<'a> {
    clock: SimClock,
    isr: Option<Box<dyn FnMut() + 'a>>,
    calls: usize,
}

impl<'a> MockDelay<'a> {
    /// Delay with no interrupt simulation.
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            isr: None,
            calls: 0,
        }
    }

    /// Delay that runs `isr` after every delay step.
    ///
    /// The closure decides for itself whether its interrupt is pending,
    /// exactly like a real handler reading its status register.
    pub fn with_isr(clock: SimClock, isr: impl FnMut() + 'a) -> Self {
        Self {
            clock,
            isr: Some(Box::new(isr)),
            calls: 0,
        }
    }

    /// Number of delay calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Simulated microseconds elapsed on the shared clock.
    pub fn elapsed_us(&self) -> u64 {
        self.clock.now_us()
    }

    fn step(&mut self, ns: u64) {
        self.clock.advance_ns(ns);
        self.calls += 1;
        if let Some(isr) = self.isr.as_mut() {
            isr();
        }
    }
}

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.step(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.step(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.step(u64::from(ms) * 1_000_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_advances_shared_clock() {
        let clock = SimClock::new();
        let mut delay = MockDelay::new(clock.clone());
        delay.delay_us(10);
        delay.delay_ms(1);
        assert_eq!(clock.now_us(), 1_010);
        assert_eq!(delay.calls(), 2);
    }

    #[test]
    fn test_isr_runs_after_each_step() {
        let clock = SimClock::new();
        let hits = Cell::new(0u32);
        let mut delay = MockDelay::with_isr(clock, || hits.set(hits.get() + 1));
        delay.delay_us(1);
        delay.delay_us(1);
        drop(delay);
        assert_eq!(hits.get(), 2);
    }
}
