//! Timer/counter abstraction layer
//!
//! [`Counter`] is the read-only view a PWM gate-kill check needs;
//! [`TimerCounter`] adds the compare/period programming and terminal-count
//! interrupt handling used by the timer increment check.

/// Free-running counter that can only be sampled.
pub trait Counter {
    /// Current counter value.
    fn counter(&self) -> u32;
}

/// Programmable timer/counter with a compare-match interrupt.
pub trait TimerCounter: Counter {
    /// Set the compare value that raises the terminal-count interrupt.
    fn set_compare(&mut self, compare: u32);

    /// Set the period (reload) value.
    fn set_period(&mut self, period: u32);

    /// Load the counter register.
    fn set_counter(&mut self, value: u32);

    /// Enable the counter block. Counting starts on [`trigger_start`](Self::trigger_start).
    fn enable(&mut self);

    /// Stop and disable the counter block. The counter value is retained.
    fn disable(&mut self);

    /// Issue the reload/start trigger.
    fn trigger_start(&mut self);

    /// Unmask (or mask) the compare-match interrupt.
    fn set_interrupt_enabled(&mut self, enabled: bool);

    /// Masked compare-match interrupt status.
    fn interrupt_pending(&self) -> bool;

    /// Clear the compare-match interrupt status.
    fn clear_interrupt(&mut self);
}
