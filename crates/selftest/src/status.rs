//! Diagnostic status and failure taxonomy.
//!
//! [`TestStatus`] is the only result channel of every diagnostic entry point.
//! Nothing is retried internally; the caller (normally the periodic safety
//! monitor) decides what a failure means for the application.

use core::fmt;

use thiserror_no_std::Error;

/// Which FIFO of a serial block was found non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Buffer {
    /// Receive FIFO.
    Rx,
    /// Transmit FIFO, or an SPI transfer still holding the bus.
    Tx,
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx => f.write_str("receive"),
            Self::Tx => f.write_str("transmit"),
        }
    }
}

/// Peripheral state that made a diagnostic refuse to run.
///
/// Reported before any persistent state is touched; retrying next period is
/// legitimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Precondition {
    /// Peripheral clock or block enable is off.
    #[error("peripheral disabled")]
    PeripheralDisabled,
    /// Block configured for a different mode than the diagnostic drives.
    #[error("peripheral in wrong mode")]
    WrongMode,
    /// Application data still queued and did not drain within budget.
    #[error("{0} buffer not empty")]
    BufferNotEmpty(Buffer),
    /// Watchdog limits are not `lower < warn < upper`.
    #[error("watchdog window limits out of order")]
    InvalidWindow,
}

/// Event a guarded wait gave up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Transmit path never drained.
    #[error("transmit completion")]
    Transmit,
    /// Looped-back data never arrived.
    #[error("receive data")]
    Receive,
    /// Expected interrupt never fired.
    #[error("interrupt")]
    Interrupt,
    /// DMA completion flag never set.
    #[error("DMA transfer completion")]
    TransferComplete,
    /// I2C master stayed owned by another transfer for every retry.
    #[error("I2C master release")]
    MasterRelease,
}

/// Destination buffer of the DMA pattern test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternBuffer {
    /// Destination A, expected all zeroes.
    ZeroFill,
    /// Destination B, expected the repeating `00 00 FF` pattern.
    PeriodicFill,
}

impl fmt::Display for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFill => f.write_str("zero-fill"),
            Self::PeriodicFill => f.write_str("periodic-fill"),
        }
    }
}

/// Why a diagnostic reported [`TestStatus::Fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Failure {
    /// A bounded wait expired.
    #[error("timed out waiting for {0}")]
    Timeout(Timeout),
    /// Loopback returned a different data unit.
    #[error("loopback mismatch: sent {expected:#04x}, received {received:#04x}")]
    DataMismatch {
        /// Value the cursor transmitted.
        expected: u8,
        /// Value read back.
        received: u8,
    },
    /// DMA destination differs from the expected pattern.
    #[error("{buffer} destination differs at offset {offset}")]
    PatternMismatch {
        /// Destination that differs.
        buffer: PatternBuffer,
        /// First differing byte.
        offset: usize,
    },
    /// Counter value at the terminal-count interrupt lies outside the band.
    #[error("counter {observed} outside [{low}, {high}]")]
    CounterOutOfRange {
        /// Value read at interrupt time.
        observed: u32,
        /// Inclusive lower bound.
        low: u32,
        /// Inclusive upper bound.
        high: u32,
    },
    /// I2C transfer finished without delivering exactly one byte.
    #[error("I2C transfer not acknowledged or ended in a bus error")]
    BusError,
    /// PWM counter kept running while the gate-kill input was asserted.
    #[error("counter advanced from {reference} to {observed} under gate-kill")]
    CounterAdvanced {
        /// First sample.
        reference: u32,
        /// Second sample.
        observed: u32,
    },
}

/// Result of one diagnostic invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestStatus {
    /// Test (or the full sweep) completed without a fault.
    Pass,
    /// Resumable test made progress; call again to continue.
    StillTesting,
    /// Fault detected.
    Fail(Failure),
    /// Peripheral not in a testable state; nothing was changed.
    PreconditionFailed(Precondition),
}

impl TestStatus {
    /// Returns `true` for [`Pass`](Self::Pass).
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns `true` for any [`Fail`](Self::Fail).
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Failure reason, if this is a `Fail`.
    pub fn failure(&self) -> Option<Failure> {
        match self {
            Self::Fail(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<Failure> for TestStatus {
    fn from(reason: Failure) -> Self {
        Self::Fail(reason)
    }
}

impl From<Precondition> for TestStatus {
    fn from(reason: Precondition) -> Self {
        Self::PreconditionFailed(reason)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("pass"),
            Self::StillTesting => f.write_str("still testing"),
            Self::Fail(reason) => write!(f, "fail: {reason}"),
            Self::PreconditionFailed(reason) => write!(f, "precondition failed: {reason}"),
        }
    }
}
