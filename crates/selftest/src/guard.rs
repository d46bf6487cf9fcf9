//! Timing-guarded polling.
//!
//! Every wait a diagnostic performs on hardware goes through
//! [`guarded_wait`], so the worst-case blocking time of any call is the sum
//! of the [`PollBudget`]s it uses. `poll_interval_us * max_polls` must cover
//! the peripheral's worst case at its slowest configured rate; that is the
//! call site's contract, checked in its unit tests through
//! [`PollBudget::budget_us`].

use embedded_hal::delay::DelayNs;

/// How long, and how finely, a guarded wait may poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget {
    /// Delay between two polls, in microseconds.
    pub poll_interval_us: u32,
    /// Number of polls before giving up.
    pub max_polls: u32,
}

impl PollBudget {
    /// Budget of `max_polls` polls spaced `poll_interval_us` apart.
    pub const fn new(poll_interval_us: u32, max_polls: u32) -> Self {
        Self {
            poll_interval_us,
            max_polls,
        }
    }

    /// Worst-case wait, in microseconds.
    pub fn budget_us(&self) -> u64 {
        u64::from(self.poll_interval_us).saturating_mul(u64::from(self.max_polls))
    }
}

/// Result of a guarded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitOutcome {
    /// Condition became true within budget.
    Satisfied,
    /// Every poll saw the condition false.
    TimedOut,
}

impl WaitOutcome {
    /// Returns `true` for [`TimedOut`](Self::TimedOut).
    pub fn timed_out(self) -> bool {
        self == Self::TimedOut
    }
}

/// Poll count of one wait in progress.
struct GuardWindow {
    elapsed: u32,
    expiry: u32,
}

impl GuardWindow {
    fn open(budget: PollBudget) -> Self {
        Self {
            elapsed: 0,
            expiry: budget.max_polls,
        }
    }

    /// Account for one poll; `false` once the window is used up.
    fn tick(&mut self) -> bool {
        if self.elapsed >= self.expiry {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(1);
        true
    }

    fn is_last(&self) -> bool {
        self.elapsed >= self.expiry
    }
}

/// Evaluate `condition` up to `budget.max_polls` times, delaying
/// `budget.poll_interval_us` between polls.
///
/// Returns [`WaitOutcome::TimedOut`] after exactly `max_polls` false polls;
/// a zero budget times out without evaluating `condition`. There is no
/// delay after the final poll.
pub fn guarded_wait<D, F>(delay: &mut D, budget: PollBudget, mut condition: F) -> WaitOutcome
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let mut window = GuardWindow::open(budget);
    while window.tick() {
        if condition() {
            return WaitOutcome::Satisfied;
        }
        if !window.is_last() {
            delay.delay_us(budget.poll_interval_us);
        }
    }
    WaitOutcome::TimedOut
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use core::cell::Cell;

    use platform::mocks::{MockDelay, SimClock};

    use super::*;

    #[test]
    fn test_never_true_polls_exactly_max() {
        let clock = SimClock::new();
        let mut delay = MockDelay::new(clock.clone());
        let polls = Cell::new(0u32);
        let outcome = guarded_wait(&mut delay, PollBudget::new(10, 7), || {
            polls.set(polls.get() + 1);
            false
        });
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(polls.get(), 7, "must poll exactly max_polls times");
        assert_eq!(clock.now_us(), 60, "six gaps between seven polls");
    }

    #[test]
    fn test_immediately_true_does_not_delay() {
        let clock = SimClock::new();
        let mut delay = MockDelay::new(clock.clone());
        let outcome = guarded_wait(&mut delay, PollBudget::new(10, 7), || true);
        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(delay.calls(), 0);
    }

    #[test]
    fn test_zero_budget_times_out_without_polling() {
        let clock = SimClock::new();
        let mut delay = MockDelay::new(clock);
        let mut polled = false;
        let outcome = guarded_wait(&mut delay, PollBudget::new(1, 0), || {
            polled = true;
            true
        });
        assert!(outcome.timed_out());
        assert!(!polled);
    }

    #[test]
    fn test_budget_us_saturates() {
        assert_eq!(PollBudget::new(10, 400).budget_us(), 4_000);
        assert_eq!(
            PollBudget::new(u32::MAX, u32::MAX).budget_us(),
            u64::from(u32::MAX) * u64::from(u32::MAX)
        );
    }
}
