//! Resumable I2C master/slave loopback diagnostic.
//!
//! Each value of the `[0, 0xFF]` sweep takes two transfers:
//!
//! ```text
//!   Write: master ──value──▶ slave        slave loads !value into its read buffer
//!   Read:  master ◀──!value── slave       master undoes the complement and compares
//! ```
//!
//! Both transfers normally finish in one call. A master still owned by
//! another transfer is not a fault: the call reports `StillTesting` and the
//! next one retries the same transfer, up to a retry limit.

use embedded_hal::delay::DelayNs;
use platform::I2cLoopbackPair;

use crate::config::{I2C_BUSY_RETRIES, I2C_RANGE_END, I2C_TRANSFER_BUDGET};
use crate::fault::{FaultInjection, Injection};
use crate::guard::{guarded_wait, PollBudget};
use crate::loopback::{LoopbackCursor, LoopbackPhase};
use crate::status::{Failure, Precondition, TestStatus, Timeout};

/// Transfer the next call starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cStep {
    /// Master writes the cursor value.
    Write,
    /// Master reads the slave's response.
    Read,
}

/// I2C loopback diagnostic for one master/slave pair; owns its sweep cursor.
#[derive(Debug, Clone)]
pub struct I2cLoopbackTest {
    cursor: LoopbackCursor,
    phase: LoopbackPhase,
    step: I2cStep,
    busy_retries: u8,
    completed_passes: u32,
    transfer: PollBudget,
    retry_limit: u8,
}

impl I2cLoopbackTest {
    /// Diagnostic with default budgets, cursor at 0.
    pub const fn new() -> Self {
        Self {
            cursor: LoopbackCursor::new(I2C_RANGE_END),
            phase: LoopbackPhase::Idle,
            step: I2cStep::Write,
            busy_retries: 0,
            completed_passes: 0,
            transfer: I2C_TRANSFER_BUDGET,
            retry_limit: I2C_BUSY_RETRIES,
        }
    }

    /// Same diagnostic with a different per-transfer budget (slow buses).
    #[must_use]
    pub const fn with_transfer_budget(mut self, transfer: PollBudget) -> Self {
        self.transfer = transfer;
        self
    }

    /// Current cursor.
    pub fn cursor(&self) -> &LoopbackCursor {
        &self.cursor
    }

    /// Current phase.
    pub fn phase(&self) -> LoopbackPhase {
        self.phase
    }

    /// Transfer the next call starts with.
    pub fn step(&self) -> I2cStep {
        self.step
    }

    /// Sweeps completed since construction.
    pub fn completed_passes(&self) -> u32 {
        self.completed_passes
    }

    /// Write the cursor value, read the slave's complement back, compare.
    ///
    /// Returns `StillTesting` after a match or while the master is owned by
    /// another transfer, `Pass` when the match completed the sweep, `Fail`
    /// on timeout, bus error, mismatch, or when the master stayed busy for
    /// every retry. A failure leaves the cursor in place and restarts the
    /// value with a write.
    pub fn run<P, D>(&mut self, pair: &mut P, delay: &mut D, faults: &FaultInjection) -> TestStatus
    where
        P: I2cLoopbackPair,
        D: DelayNs,
    {
        if !pair.is_enabled() {
            return Precondition::PeripheralDisabled.into();
        }

        self.phase = LoopbackPhase::Testing;
        let status = self.exchange(pair, delay, faults);

        if status.is_fail() {
            self.step = I2cStep::Write;
            self.busy_retries = 0;
        }

        #[cfg(feature = "defmt")]
        match status {
            TestStatus::Fail(reason) => defmt::warn!("I2C loopback failed: {}", reason),
            TestStatus::Pass => defmt::info!("I2C loopback sweep complete"),
            _ => {}
        }

        status
    }

    fn exchange<P: I2cLoopbackPair, D: DelayNs>(
        &mut self,
        pair: &mut P,
        delay: &mut D,
        faults: &FaultInjection,
    ) -> TestStatus {
        let expected = self.cursor.next();

        if self.step == I2cStep::Write {
            if !pair.start_write(faults.loopback_transmit(Injection::I2cLoopback, expected)) {
                return self.master_owned();
            }
            self.busy_retries = 0;
            if guarded_wait(delay, self.transfer, || !pair.is_master_busy()).timed_out() {
                return Failure::Timeout(Timeout::Transmit).into();
            }
            let Some(seen) = pair.slave_take_written() else {
                return Failure::BusError.into();
            };
            pair.slave_respond(!seen);
            self.step = I2cStep::Read;
        }

        if !pair.start_read() {
            return self.master_owned();
        }
        self.busy_retries = 0;
        let finished = !guarded_wait(delay, self.transfer, || !pair.is_master_busy()).timed_out();
        let response = pair.master_received();
        pair.slave_reset_read();

        if !finished {
            return Failure::Timeout(Timeout::Receive).into();
        }
        let Some(response) = response else {
            return Failure::BusError.into();
        };
        let received = !response;
        if received != expected {
            return Failure::DataMismatch { expected, received }.into();
        }

        self.step = I2cStep::Write;
        if self.cursor.advance() {
            self.phase = LoopbackPhase::Completed;
            self.completed_passes = self.completed_passes.wrapping_add(1);
            TestStatus::Pass
        } else {
            TestStatus::StillTesting
        }
    }

    /// Master refused to start; retry next call unless the limit is spent.
    fn master_owned(&mut self) -> TestStatus {
        self.busy_retries = self.busy_retries.saturating_add(1);
        if self.busy_retries >= self.retry_limit {
            Failure::Timeout(Timeout::MasterRelease).into()
        } else {
            TestStatus::StillTesting
        }
    }
}

impl Default for I2cLoopbackTest {
    fn default() -> Self {
        Self::new()
    }
}
