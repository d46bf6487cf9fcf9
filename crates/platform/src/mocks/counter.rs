//! Clock-driven PWM counter and timer/counter mocks.

use core::cell::RefCell;
use std::rc::Rc;

use super::clock::SimClock;
use crate::counter::{Counter, TimerCounter};

/// Ticks accumulated between `start_ns` and `now_ns` at `ticks_per_us`.
fn ticks_between(start_ns: u64, now_ns: u64, ticks_per_us: u32) -> u64 {
    now_ns.saturating_sub(start_ns) * u64::from(ticks_per_us) / 1_000
}

/// PWM counter that is either running or held off by a gate-kill.
pub struct MockCounter {
    clock: SimClock,
    base: u32,
    started_ns: u64,
    ticks_per_us: Option<u32>,
}

impl MockCounter {
    /// Counter still running at `ticks_per_us` (gate-kill ineffective).
    pub fn running(clock: SimClock, ticks_per_us: u32) -> Self {
        let started_ns = clock.now_ns();
        Self {
            clock,
            base: 0,
            started_ns,
            ticks_per_us: Some(ticks_per_us),
        }
    }

    /// Counter held at `value` by the kill input.
    pub fn killed(clock: SimClock, value: u32) -> Self {
        Self {
            clock,
            base: value,
            started_ns: 0,
            ticks_per_us: None,
        }
    }
}

impl Counter for MockCounter {
    fn counter(&self) -> u32 {
        match self.ticks_per_us {
            Some(rate) => {
                let ticks = ticks_between(self.started_ns, self.clock.now_ns(), rate);
                self.base.wrapping_add(ticks as u32)
            }
            None => self.base,
        }
    }
}

#[derive(Debug, Default)]
struct TimerRegs {
    compare: u32,
    period: u32,
    loaded: u32,
    started_ns: Option<u64>,
    enabled: bool,
    irq_enabled: bool,
    irq_latched: bool,
    fired: bool,
    triggers: usize,
}

/// Timer/counter block counting at a fixed rate against a [`SimClock`].
///
/// Clones share the same registers, so a test can hand one clone to the
/// diagnostic and another to the interrupt handler closure.
#[derive(Clone)]
pub struct MockTimer {
    regs: Rc<RefCell<TimerRegs>>,
    clock: SimClock,
    ticks_per_us: u32,
    stuck_bits: u32,
    stuck_low_bits: u32,
}

impl MockTimer {
    /// Timer counting at `ticks_per_us`.
    pub fn new(clock: SimClock, ticks_per_us: u32) -> Self {
        Self {
            regs: Rc::new(RefCell::new(TimerRegs::default())),
            clock,
            ticks_per_us,
            stuck_bits: 0,
            stuck_low_bits: 0,
        }
    }

    /// Counter reads have `bits` stuck at 1.
    #[must_use]
    pub fn with_stuck_bits(mut self, bits: u32) -> Self {
        self.stuck_bits = bits;
        self
    }

    /// Counter reads have `bits` stuck at 0.
    #[must_use]
    pub fn with_stuck_low_bits(mut self, bits: u32) -> Self {
        self.stuck_low_bits = bits;
        self
    }

    /// Block enabled.
    pub fn is_enabled(&self) -> bool {
        self.regs.borrow().enabled
    }

    /// Counting (enabled and started).
    pub fn is_running(&self) -> bool {
        self.regs.borrow().started_ns.is_some()
    }

    /// Compare value last programmed.
    pub fn compare(&self) -> u32 {
        self.regs.borrow().compare
    }

    /// Number of start triggers accepted.
    pub fn triggers(&self) -> usize {
        self.regs.borrow().triggers
    }

    fn raw_count(&self, regs: &TimerRegs) -> u32 {
        let Some(start) = regs.started_ns else {
            return regs.loaded;
        };
        let ticks = ticks_between(start, self.clock.now_ns(), self.ticks_per_us);
        let value = u64::from(regs.loaded) + ticks;
        if regs.period == 0 {
            value as u32
        } else {
            (value % (u64::from(regs.period) + 1)) as u32
        }
    }

    fn sync(&self) {
        let mut regs = self.regs.borrow_mut();
        let Some(start) = regs.started_ns else {
            return;
        };
        let reached = u64::from(regs.loaded)
            + ticks_between(start, self.clock.now_ns(), self.ticks_per_us);
        if !regs.fired && reached >= u64::from(regs.compare) {
            regs.fired = true;
            regs.irq_latched = true;
        }
    }
}

impl Counter for MockTimer {
    fn counter(&self) -> u32 {
        self.sync();
        let regs = self.regs.borrow();
        (self.raw_count(&regs) | self.stuck_bits) & !self.stuck_low_bits
    }
}

impl TimerCounter for MockTimer {
    fn set_compare(&mut self, compare: u32) {
        self.regs.borrow_mut().compare = compare;
    }

    fn set_period(&mut self, period: u32) {
        self.regs.borrow_mut().period = period;
    }

    fn set_counter(&mut self, value: u32) {
        let now = self.clock.now_ns();
        let mut regs = self.regs.borrow_mut();
        regs.loaded = value;
        if regs.started_ns.is_some() {
            regs.started_ns = Some(now);
        }
    }

    fn enable(&mut self) {
        self.regs.borrow_mut().enabled = true;
    }

    fn disable(&mut self) {
        self.sync();
        let mut regs = self.regs.borrow_mut();
        let frozen = self.raw_count(&regs);
        regs.loaded = frozen;
        regs.started_ns = None;
        regs.enabled = false;
    }

    fn trigger_start(&mut self) {
        let now = self.clock.now_ns();
        let mut regs = self.regs.borrow_mut();
        if regs.enabled {
            regs.started_ns = Some(now);
            regs.fired = false;
            regs.triggers += 1;
        }
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.regs.borrow_mut().irq_enabled = enabled;
    }

    fn interrupt_pending(&self) -> bool {
        self.sync();
        let regs = self.regs.borrow();
        regs.irq_enabled && regs.irq_latched
    }

    fn clear_interrupt(&mut self) {
        self.regs.borrow_mut().irq_latched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_only_after_trigger() {
        let clock = SimClock::new();
        let mut timer = MockTimer::new(clock.clone(), 1);
        timer.set_period(65_535);
        timer.enable();
        clock.advance_ns(5_000);
        assert_eq!(timer.counter(), 0, "no counting before trigger");
        timer.trigger_start();
        clock.advance_ns(7_000);
        assert_eq!(timer.counter(), 7);
    }

    #[test]
    fn test_timer_latches_on_compare_and_freezes_on_disable() {
        let clock = SimClock::new();
        let mut timer = MockTimer::new(clock.clone(), 1);
        timer.set_period(65_535);
        timer.set_compare(100);
        timer.set_interrupt_enabled(true);
        timer.enable();
        timer.trigger_start();
        clock.advance_ns(99_000);
        assert!(!timer.interrupt_pending());
        clock.advance_ns(1_000);
        assert!(timer.interrupt_pending());
        timer.disable();
        clock.advance_ns(50_000);
        assert_eq!(timer.counter(), 100, "disabled timer must hold its value");
    }

    #[test]
    fn test_killed_counter_holds() {
        let clock = SimClock::new();
        let pwm = MockCounter::killed(clock.clone(), 42);
        clock.advance_ns(10_000_000);
        assert_eq!(pwm.counter(), 42);
    }
}
