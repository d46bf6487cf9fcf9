//! PWM gate-kill diagnostic.
//!
//! With the kill input asserted by the board before the call, the PWM
//! counter must stand still. Two samples [`GATE_KILL_SETTLE_MS`] apart have
//! to be equal.

use embedded_hal::delay::DelayNs;
use platform::Counter;

use crate::config::GATE_KILL_SETTLE_MS;
use crate::fault::FaultInjection;
use crate::status::{Failure, TestStatus};

/// Single-shot gate-kill diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct GateKillTest {
    settle_ms: u32,
}

impl GateKillTest {
    /// Default sample interval.
    pub const fn new() -> Self {
        Self {
            settle_ms: GATE_KILL_SETTLE_MS,
        }
    }

    /// Sample interval in milliseconds.
    #[must_use]
    pub const fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Sample, wait, sample again.
    pub fn run<C, D>(&self, pwm: &C, delay: &mut D, faults: &FaultInjection) -> TestStatus
    where
        C: Counter,
        D: DelayNs,
    {
        let reference = pwm.counter();
        delay.delay_ms(self.settle_ms);
        let observed = faults.gate_kill_sample(pwm.counter());

        if observed == reference {
            TestStatus::Pass
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("PWM counter moved under gate-kill: {} -> {}", reference, observed);
            Failure::CounterAdvanced { reference, observed }.into()
        }
    }
}

impl Default for GateKillTest {
    fn default() -> Self {
        Self::new()
    }
}
