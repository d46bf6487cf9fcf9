//! Suite-level aggregation of diagnostic results.
//!
//! The safety monitor records the latest [`TestStatus`] of each diagnostic
//! here and acts on the overall [`Verdict`]. A resumable diagnostic reports
//! `StillTesting` again on the call after it completes a sweep; that keeps
//! the completed sweep counted until a failure replaces it.

use heapless::Vec;

use crate::status::TestStatus;

/// Diagnostics the suite knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiagnosticId {
    /// UART loopback sweep.
    Uart,
    /// SPI loopback sweep.
    Spi,
    /// I2C master/slave loopback sweep.
    I2c,
    /// DMA pattern check.
    Dma,
    /// PWM gate-kill check.
    PwmGateKill,
    /// Timer/counter increment check.
    TimerCounter,
    /// Window watchdog check.
    WindowWatchdog,
}

impl DiagnosticId {
    /// Number of diagnostics.
    pub const COUNT: usize = 7;

    /// Every diagnostic, in suite order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Uart,
        Self::Spi,
        Self::I2c,
        Self::Dma,
        Self::PwmGateKill,
        Self::TimerCounter,
        Self::WindowWatchdog,
    ];
}

/// Overall suite state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// Every expected diagnostic passed.
    Healthy,
    /// Nothing failed, but something is still sweeping or has not reported.
    InProgress,
    /// At least one diagnostic failed or could not run.
    Faulted,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: DiagnosticId,
    latest: TestStatus,
    /// A sweep (or single-shot run) passed and nothing failed since.
    passed: bool,
}

/// Latest status per diagnostic.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    entries: Vec<Entry, { DiagnosticId::COUNT }>,
}

impl SuiteReport {
    /// Empty report.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Store `status` as the latest result of `id`.
    ///
    /// `Pass` marks `id` passed; `Fail` and `PreconditionFailed` clear the
    /// mark; `StillTesting` leaves it as it was.
    pub fn record(&mut self, id: DiagnosticId, status: TestStatus) {
        let passed_before = self.entry(id).is_some_and(|entry| entry.passed);
        let passed = match status {
            TestStatus::Pass => true,
            TestStatus::StillTesting => passed_before,
            TestStatus::Fail(_) | TestStatus::PreconditionFailed(_) => false,
        };
        let entry = Entry {
            id,
            latest: status,
            passed,
        };

        if let Some(slot) = self.entries.iter_mut().find(|seen| seen.id == id) {
            *slot = entry;
        } else if self.entries.push(entry).is_err() {
            // One slot per DiagnosticId; only reachable if COUNT is stale.
            #[cfg(feature = "defmt")]
            defmt::error!("suite report full, {} not recorded", id);
        }
    }

    /// Latest result of `id`.
    pub fn status(&self, id: DiagnosticId) -> Option<TestStatus> {
        self.entry(id).map(|entry| entry.latest)
    }

    /// Whether `id` has passed since its last failure.
    pub fn has_passed(&self, id: DiagnosticId) -> bool {
        self.entry(id).is_some_and(|entry| entry.passed)
    }

    /// Recorded results, in first-recorded order.
    pub fn entries(&self) -> impl Iterator<Item = (DiagnosticId, TestStatus)> + '_ {
        self.entries.iter().map(|entry| (entry.id, entry.latest))
    }

    /// Verdict over the `expected` diagnostics.
    ///
    /// Any failure or precondition failure is `Faulted`; otherwise a
    /// missing or still-sweeping diagnostic is `InProgress`.
    pub fn verdict(&self, expected: &[DiagnosticId]) -> Verdict {
        let faulted = self.entries.iter().any(|entry| {
            matches!(entry.latest, TestStatus::Fail(_) | TestStatus::PreconditionFailed(_))
        });
        if faulted {
            return Verdict::Faulted;
        }
        let all_passed = expected.iter().all(|&id| self.has_passed(id));
        if all_passed {
            Verdict::Healthy
        } else {
            Verdict::InProgress
        }
    }

    /// Forget every result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn entry(&self, id: DiagnosticId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}
