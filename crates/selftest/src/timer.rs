//! Timer/counter increment diagnostic.
//!
//! The timer is started from zero with a compare value; its terminal-count
//! interrupt must arrive within a guarded wait, and the counter value the
//! handler froze must lie within a tolerance band around the compare value.
//! A counter clocked too fast or too slow, a stuck bit, or a missing
//! interrupt are all caught.
//!
//! The board's interrupt vector calls [`timer_interrupt`]; the supervisory
//! [`TimerCounterTest::run`] only watches the shared [`InterruptCounter`].

use embedded_hal::delay::DelayNs;
use platform::TimerCounter;

use crate::config::{
    TIMER_COMPARE, TIMER_INTERRUPT_BUDGET, TIMER_PERIOD, TIMER_TOLERANCE_BASIS_POINTS,
};
use crate::fault::FaultInjection;
use crate::guard::{guarded_wait, PollBudget};
use crate::interrupt::InterruptCounter;
use crate::status::{Failure, TestStatus, Timeout};

/// Basis points in 100 %.
const BASIS_POINTS_PER_UNIT: u64 = 10_000;

// ─── Tolerance band ──────────────────────────────────────────────────────────

/// Relative tolerance in basis points (1 bp = 0.01 %).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tolerance {
    basis_points: u32,
}

impl Tolerance {
    /// Tolerance of `basis_points` / 10 000.
    pub const fn from_basis_points(basis_points: u32) -> Self {
        Self { basis_points }
    }

    /// Tolerance in basis points.
    pub const fn basis_points(&self) -> u32 {
        self.basis_points
    }
}

/// Inclusive `[low, high]` range of accepted counter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToleranceBand {
    /// Lowest accepted value.
    pub low: u32,
    /// Highest accepted value.
    pub high: u32,
}

impl ToleranceBand {
    /// `expected ± expected * tolerance`, rounded towards `expected` and
    /// clamped to the `u32` range.
    pub fn around(expected: u32, tolerance: Tolerance) -> Self {
        let delta = u64::from(expected)
            .saturating_mul(u64::from(tolerance.basis_points))
            .checked_div(BASIS_POINTS_PER_UNIT)
            .unwrap_or(0);
        let delta = u32::try_from(delta).unwrap_or(u32::MAX);
        Self {
            low: expected.saturating_sub(delta),
            high: expected.saturating_add(delta),
        }
    }

    /// Whether `value` is accepted; both ends are inclusive.
    pub fn contains(&self, value: u32) -> bool {
        (self.low..=self.high).contains(&value)
    }
}

// ─── Diagnostic ──────────────────────────────────────────────────────────────

/// Timer test parameters for one target clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerTestConfig {
    /// Compare value; also the expected counter reading.
    pub compare: u32,
    /// Reload value.
    pub period: u32,
    /// Accepted deviation of the reading from `compare`.
    pub tolerance: Tolerance,
    /// Waiting for the terminal-count interrupt.
    pub interrupt: PollBudget,
}

impl TimerTestConfig {
    /// Compare 50000, period 65535, ±2.4 %, 600 × 1 µs.
    pub const DEFAULT: Self = Self {
        compare: TIMER_COMPARE,
        period: TIMER_PERIOD,
        tolerance: Tolerance::from_basis_points(TIMER_TOLERANCE_BASIS_POINTS),
        interrupt: TIMER_INTERRUPT_BUDGET,
    };

    /// Accepted counter readings.
    pub fn band(&self) -> ToleranceBand {
        ToleranceBand::around(self.compare, self.tolerance)
    }
}

impl Default for TimerTestConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Single-shot timer/counter diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct TimerCounterTest {
    config: TimerTestConfig,
}

impl TimerCounterTest {
    /// Diagnostic with `config`.
    pub const fn new(config: TimerTestConfig) -> Self {
        Self { config }
    }

    /// Parameters in use.
    pub fn config(&self) -> &TimerTestConfig {
        &self.config
    }

    /// Start the timer from zero and check where its interrupt stopped it.
    ///
    /// `events` must be the counter [`timer_interrupt`] records on for this
    /// timer. The timer is disabled again on every return path.
    pub fn run<T, D>(
        &self,
        timer: &mut T,
        events: &InterruptCounter,
        delay: &mut D,
        faults: &FaultInjection,
    ) -> TestStatus
    where
        T: TimerCounter,
        D: DelayNs,
    {
        timer.disable();
        timer.clear_interrupt();
        timer.set_compare(self.config.compare);
        timer.set_period(self.config.period);
        timer.set_counter(0);

        let baseline = events.count();
        timer.set_interrupt_enabled(true);
        timer.enable();
        if !faults.timer_trigger_withheld() {
            timer.trigger_start();
        }

        let outcome = guarded_wait(delay, self.config.interrupt, || events.count() != baseline);
        let observed = timer.counter();
        timer.disable();
        timer.set_interrupt_enabled(false);

        if outcome.timed_out() {
            #[cfg(feature = "defmt")]
            defmt::warn!("timer terminal-count interrupt missing");
            return Failure::Timeout(Timeout::Interrupt).into();
        }

        let band = self.config.band();
        if band.contains(observed) {
            TestStatus::Pass
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("timer read {} outside [{}, {}]", observed, band.low, band.high);
            Failure::CounterOutOfRange {
                observed,
                low: band.low,
                high: band.high,
            }
            .into()
        }
    }
}

impl Default for TimerCounterTest {
    fn default() -> Self {
        Self::new(TimerTestConfig::DEFAULT)
    }
}

/// Terminal-count interrupt handler body.
///
/// Stops the timer so the supervisory call reads the value it had at
/// interrupt time, clears the status and records the event.
pub fn timer_interrupt<T: TimerCounter>(timer: &mut T, events: &InterruptCounter) {
    if timer.interrupt_pending() {
        timer.disable();
        timer.clear_interrupt();
        events.record();
    }
}
