//! Resumable UART/SPI loopback diagnostic.
//!
//! The I2C diagnostic in [`crate::i2c`] shares the cursor and phase types.
//!
//! One call exchanges exactly one data unit through the block's internal
//! loopback path. A [`LoopbackCursor`] remembers where the sweep stands, so
//! the exhaustive `[0, bound]` sweep is spread over many short calls from the
//! periodic safety monitor:
//!
//! ```text
//!   Idle ──run()──▶ Testing ──run()──▶ ... ──bound matched──▶ Completed
//!                     ▲                                          │
//!                     └────────────── next run() ────────────────┘
//! ```
//!
//! A mismatch leaves the cursor where it was; the next call retries the same
//! value. Preconditions never touch the cursor.

use embedded_hal::delay::DelayNs;
use platform::{InterruptMasks, LoopbackPort, PortMode};

use crate::config::{
    SPI_BUDGET, SPI_RANGE_END, UART_RANGE_END, UART_RECEIVE_BUDGET, UART_SETTLE_US,
    UART_TRANSMIT_BUDGET,
};
use crate::fault::{FaultInjection, Injection};
use crate::guard::{guarded_wait, PollBudget};
use crate::status::{Buffer, Failure, Precondition, TestStatus, Timeout};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Position of a loopback sweep.
///
/// Invariant: `next <= bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopbackCursor {
    next: u8,
    bound: u8,
}

impl LoopbackCursor {
    /// Cursor at the start of a `[0, bound]` sweep.
    pub const fn new(bound: u8) -> Self {
        Self { next: 0, bound }
    }

    /// Value the next call transmits.
    pub fn next(&self) -> u8 {
        self.next
    }

    /// Last value of the sweep (inclusive).
    pub fn bound(&self) -> u8 {
        self.bound
    }

    /// Step past a matched value. Returns `true` when that value was the
    /// bound, in which case the cursor is back at 0.
    pub(crate) fn advance(&mut self) -> bool {
        if self.next >= self.bound {
            self.next = 0;
            true
        } else {
            self.next = self.next.wrapping_add(1);
            false
        }
    }
}

/// Where a sweep stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopbackPhase {
    /// No value exchanged yet.
    Idle,
    /// Sweep in progress.
    Testing,
    /// Last call completed a sweep; the next call starts a new one.
    Completed,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Everything that distinguishes one loopback diagnostic from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopbackProfile {
    /// Injection site consulted on the transmit path.
    pub site: Injection,
    /// Mode the block must be in.
    pub mode: PortMode,
    /// Last value of the sweep (inclusive).
    pub bound: u8,
    /// Waiting for application data to leave both FIFOs.
    pub drain: PollBudget,
    /// Waiting for the test value to leave the transmitter.
    pub transmit: PollBudget,
    /// Waiting for the test value to arrive.
    pub receive: PollBudget,
    /// Delay before the FIFOs are cleared on the way out.
    pub settle_us: u32,
}

impl LoopbackProfile {
    /// UART in loopback, `[0, 0xF0]`.
    pub const UART: Self = Self {
        site: Injection::UartLoopback,
        mode: PortMode::Uart,
        bound: UART_RANGE_END,
        drain: UART_TRANSMIT_BUDGET,
        transmit: UART_TRANSMIT_BUDGET,
        receive: UART_RECEIVE_BUDGET,
        settle_us: UART_SETTLE_US,
    };

    /// SPI master in loopback, `[0, 0xFF]`.
    pub const SPI: Self = Self {
        site: Injection::SpiLoopback,
        mode: PortMode::SpiMaster,
        bound: SPI_RANGE_END,
        drain: SPI_BUDGET,
        transmit: SPI_BUDGET,
        receive: SPI_BUDGET,
        settle_us: 0,
    };
}

// ─── Diagnostic ──────────────────────────────────────────────────────────────

/// Loopback diagnostic for one serial block; owns its sweep cursor.
#[derive(Debug, Clone)]
pub struct LoopbackTest {
    profile: LoopbackProfile,
    cursor: LoopbackCursor,
    phase: LoopbackPhase,
    completed_passes: u32,
}

impl LoopbackTest {
    /// Diagnostic driven by `profile`, cursor at 0.
    pub const fn new(profile: LoopbackProfile) -> Self {
        Self {
            profile,
            cursor: LoopbackCursor::new(profile.bound),
            phase: LoopbackPhase::Idle,
            completed_passes: 0,
        }
    }

    /// UART diagnostic with default budgets.
    pub const fn uart() -> Self {
        Self::new(LoopbackProfile::UART)
    }

    /// SPI diagnostic with default budgets.
    pub const fn spi() -> Self {
        Self::new(LoopbackProfile::SPI)
    }

    /// Current cursor.
    pub fn cursor(&self) -> &LoopbackCursor {
        &self.cursor
    }

    /// Current phase.
    pub fn phase(&self) -> LoopbackPhase {
        self.phase
    }

    /// Sweeps completed since construction.
    pub fn completed_passes(&self) -> u32 {
        self.completed_passes
    }

    /// Profile in use.
    pub fn profile(&self) -> &LoopbackProfile {
        &self.profile
    }

    /// Exchange the cursor value once through `port`'s loopback path.
    ///
    /// Returns `StillTesting` after a match, `Pass` when the match completed
    /// the sweep, `Fail` on timeout or mismatch. Interrupt masks are zeroed
    /// for the exchange and restored afterwards; both FIFOs are cleared on
    /// every path past the enable/mode check.
    pub fn run<P, D>(
        &mut self,
        port: &mut P,
        delay: &mut D,
        faults: &FaultInjection,
    ) -> TestStatus
    where
        P: LoopbackPort,
        D: DelayNs,
    {
        if !port.is_enabled() {
            return Precondition::PeripheralDisabled.into();
        }
        if port.mode() != self.profile.mode {
            return Precondition::WrongMode.into();
        }

        let status = match self.check_drained(port, delay) {
            Err(reason) => reason.into(),
            Ok(()) => {
                port.clear_tx_fifo();
                port.clear_rx_fifo();
                let saved = port.interrupt_masks();
                port.set_interrupt_masks(InterruptMasks::NONE);
                let status = self.exchange(port, delay, faults);
                port.set_interrupt_masks(saved);
                status
            }
        };

        if self.profile.settle_us > 0 {
            delay.delay_us(self.profile.settle_us);
        }
        port.clear_tx_fifo();
        port.clear_rx_fifo();

        #[cfg(feature = "defmt")]
        match status {
            TestStatus::Fail(reason) => {
                defmt::warn!("{} loopback failed: {}", self.profile.mode, reason);
            }
            TestStatus::Pass => defmt::info!("{} loopback sweep complete", self.profile.mode),
            _ => {}
        }

        status
    }

    /// Receive then transmit side must be empty of application data.
    fn check_drained<P: LoopbackPort, D: DelayNs>(
        &self,
        port: &P,
        delay: &mut D,
    ) -> Result<(), Precondition> {
        if guarded_wait(delay, self.profile.drain, || port.rx_available() == 0).timed_out() {
            return Err(Precondition::BufferNotEmpty(Buffer::Rx));
        }
        let tx_idle = || port.tx_in_flight() == 0 && !port.is_bus_busy();
        if guarded_wait(delay, self.profile.drain, tx_idle).timed_out() {
            return Err(Precondition::BufferNotEmpty(Buffer::Tx));
        }
        Ok(())
    }

    fn exchange<P: LoopbackPort, D: DelayNs>(
        &mut self,
        port: &mut P,
        delay: &mut D,
        faults: &FaultInjection,
    ) -> TestStatus {
        self.phase = LoopbackPhase::Testing;
        let expected = self.cursor.next();
        port.put(faults.loopback_transmit(self.profile.site, expected));

        if guarded_wait(delay, self.profile.transmit, || port.tx_in_flight() == 0).timed_out() {
            return Failure::Timeout(Timeout::Transmit).into();
        }
        if guarded_wait(delay, self.profile.receive, || port.rx_available() > 0).timed_out() {
            return Failure::Timeout(Timeout::Receive).into();
        }

        let received = port.get();
        if received != expected {
            return Failure::DataMismatch { expected, received }.into();
        }

        if self.cursor.advance() {
            self.phase = LoopbackPhase::Completed;
            self.completed_passes = self.completed_passes.wrapping_add(1);
            TestStatus::Pass
        } else {
            TestStatus::StillTesting
        }
    }
}
