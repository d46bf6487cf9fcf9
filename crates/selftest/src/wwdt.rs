//! Window watchdog diagnostic.
//!
//! ```text
//!                 reset cause == watchdog
//!   NotArmed ─────────────────────────────────▶ PostResetVerifying ──▶ Pass / Fail
//!      │
//!      │ otherwise: clear events, program window, enable
//!      ▼
//!   WaitingLowerBound ──count ≥ lower──▶ WaitingWarn ──interrupt──▶ Pass
//!                                            │
//!                                            └──count ≥ upper──▶ device reset
//! ```
//!
//! The warn interrupt is the evidence that the window counts and signals
//! correctly. When the watchdog still reaches its upper limit and resets the
//! device, the next boot sees a watchdog reset cause and judges the
//! [`InterruptCounter`], which must live in memory that survives the reset
//! (a `.uninit` / no-init section on hardware). At least one recorded warn
//! interrupt passes; none fails. If the supervision budget runs out before
//! either happens the watchdog is disabled and the run fails.

use embedded_hal::delay::DelayNs;
use platform::{
    LimitAction, ResetCause, ResetReason, WarnAction, WindowLimits, WindowedWatchdog,
};

use crate::config::{
    WWDT_LOWER_LIMIT, WWDT_SUPERVISION_BUDGET, WWDT_UPPER_LIMIT, WWDT_WARN_LIMIT,
};
use crate::fault::FaultInjection;
use crate::guard::{guarded_wait, PollBudget};
use crate::interrupt::InterruptCounter;
use crate::status::{Failure, Precondition, TestStatus, Timeout};

/// Window watchdog diagnostic phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WwdtPhase {
    /// Not run yet.
    NotArmed,
    /// Armed, count still below the lower limit.
    WaitingLowerBound,
    /// Lower limit passed, waiting for the warn interrupt.
    WaitingWarn,
    /// Booted from a watchdog reset the previous run provoked.
    PostResetVerifying,
}

/// Window watchdog test parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WwdtConfig {
    /// Limits programmed for the test window.
    pub limits: WindowLimits,
    /// Polling of the counter while the window runs.
    pub supervision: PollBudget,
}

impl WwdtConfig {
    /// Limits 50000 / 80000 / 100000, supervised for 5 s.
    pub const DEFAULT: Self = Self {
        limits: WindowLimits {
            lower: WWDT_LOWER_LIMIT,
            warn: WWDT_WARN_LIMIT,
            upper: WWDT_UPPER_LIMIT,
        },
        supervision: WWDT_SUPERVISION_BUDGET,
    };
}

impl Default for WwdtConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Watchdog registers as last seen by the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogSnapshot {
    /// Counter value just before the watchdog was disabled.
    pub count: u32,
    /// Limits in effect.
    pub limits: WindowLimits,
}

/// What the last run observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WwdtState {
    /// Warn interrupts recorded during the last run.
    pub interrupts: u32,
    /// Reset cause read at the start of the last run.
    pub last_reset: Option<ResetReason>,
    /// Register snapshot taken at the end of the last run.
    pub snapshot: WatchdogSnapshot,
}

/// Window watchdog diagnostic.
///
/// `events` is the counter [`watchdog_interrupt`] records on; typically a
/// `static InterruptCounter` shared with the vector and placed where a
/// watchdog reset does not reinitialise it.
pub struct WwdtMonitor<'a> {
    config: WwdtConfig,
    events: &'a InterruptCounter,
    phase: WwdtPhase,
    state: WwdtState,
}

impl<'a> WwdtMonitor<'a> {
    /// Monitor with `config`, observing `events`.
    pub const fn new(config: WwdtConfig, events: &'a InterruptCounter) -> Self {
        Self {
            config,
            events,
            phase: WwdtPhase::NotArmed,
            state: WwdtState {
                interrupts: 0,
                last_reset: None,
                snapshot: WatchdogSnapshot {
                    count: 0,
                    limits: config.limits,
                },
            },
        }
    }

    /// Phase the last run ended in.
    pub fn phase(&self) -> WwdtPhase {
        self.phase
    }

    /// Observations of the last run.
    pub fn state(&self) -> WwdtState {
        self.state
    }

    /// Run (or, after a watchdog reset, conclude) the window check.
    ///
    /// Blocks for at most `config.supervision`. If the warn interrupt never
    /// arrives, real hardware resets before this returns. Limits that are not
    /// `lower < warn < upper` are refused before anything is touched.
    pub fn run<W, R, D>(
        &mut self,
        wdt: &mut W,
        reset: &mut R,
        delay: &mut D,
        faults: &FaultInjection,
    ) -> TestStatus
    where
        W: WindowedWatchdog,
        R: ResetCause,
        D: DelayNs,
    {
        let limits = self.config.limits;
        if !limits.is_ordered() {
            return Precondition::InvalidWindow.into();
        }

        let reason = reset.reset_reason();
        reset.clear_reset_reason();
        self.state.last_reset = Some(reason);

        if reason == ResetReason::Watchdog {
            return self.verify_after_reset(wdt);
        }

        self.phase = WwdtPhase::WaitingLowerBound;

        wdt.unlock();
        wdt.disable();
        self.events.clear();
        wdt.set_limits(limits);
        wdt.set_actions(LimitAction::Reset, WarnAction::Interrupt, LimitAction::Reset);
        wdt.clear_interrupt();
        wdt.unmask_interrupt();
        wdt.enable();

        let events = self.events;
        let mut phase = self.phase;
        let outcome = guarded_wait(delay, self.config.supervision, || {
            if events.count() != 0 {
                return true;
            }
            if wdt.counter() >= limits.lower {
                phase = WwdtPhase::WaitingWarn;
                if faults.wwdt_services_after_lower() {
                    wdt.service();
                }
            }
            false
        });
        self.phase = phase;

        self.take_snapshot(wdt);
        wdt.disable();
        wdt.lock();
        self.state.interrupts = events.count();

        if outcome.timed_out() {
            #[cfg(feature = "defmt")]
            defmt::warn!("watchdog warn interrupt missing, count {}", self.state.snapshot.count);
            Failure::Timeout(Timeout::Interrupt).into()
        } else {
            TestStatus::Pass
        }
    }

    /// Judge the interrupts the window that reset the device recorded.
    fn verify_after_reset<W: WindowedWatchdog>(&mut self, wdt: &mut W) -> TestStatus {
        self.phase = WwdtPhase::PostResetVerifying;
        wdt.unlock();
        wdt.disable();
        self.take_snapshot(wdt);
        wdt.lock();

        self.state.interrupts = self.events.count();
        self.events.clear();

        if self.state.interrupts == 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("watchdog reset without a recorded warn interrupt");
            Failure::Timeout(Timeout::Interrupt).into()
        } else {
            #[cfg(feature = "defmt")]
            defmt::info!("watchdog reset verified, {} warn interrupt(s)", self.state.interrupts);
            TestStatus::Pass
        }
    }

    fn take_snapshot<W: WindowedWatchdog>(&mut self, wdt: &W) {
        self.state.snapshot = WatchdogSnapshot {
            count: wdt.counter(),
            limits: self.config.limits,
        };
    }
}

/// Warn interrupt handler body.
pub fn watchdog_interrupt<W: WindowedWatchdog>(
    wdt: &mut W,
    events: &InterruptCounter,
    faults: &FaultInjection,
) {
    if wdt.interrupt_pending() {
        if !faults.wwdt_interrupt_dropped() {
            events.record();
        }
        wdt.clear_interrupt();
    }
}
