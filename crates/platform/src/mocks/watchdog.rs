//! Windowed watchdog and reset-cause mocks.

use core::cell::RefCell;
use std::rc::Rc;

use super::clock::SimClock;
use crate::watchdog::{
    LimitAction, ResetCause, ResetReason, WarnAction, WindowLimits, WindowedWatchdog,
};

/// Why the simulated watchdog asked for a device reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogReset {
    /// Serviced while the count was still below the lower limit.
    EarlyService,
    /// Count reached the upper limit.
    UpperLimit,
}

#[derive(Debug)]
struct WdtRegs {
    locked: bool,
    enabled: bool,
    limits: WindowLimits,
    lower_action: LimitAction,
    warn_action: WarnAction,
    upper_action: LimitAction,
    window_start_ns: u64,
    frozen: u32,
    irq_unmasked: bool,
    irq_latched: bool,
    warn_fired: bool,
    reset: Option<WatchdogReset>,
    services: usize,
    ignored_writes: usize,
}

impl Default for WdtRegs {
    fn default() -> Self {
        Self {
            locked: true,
            enabled: false,
            limits: WindowLimits { lower: 0, warn: 0, upper: 0 },
            lower_action: LimitAction::None,
            warn_action: WarnAction::None,
            upper_action: LimitAction::None,
            window_start_ns: 0,
            frozen: 0,
            irq_unmasked: false,
            irq_latched: false,
            warn_fired: false,
            reset: None,
            services: 0,
            ignored_writes: 0,
        }
    }
}

/// Window watchdog counting at a fixed rate against a [`SimClock`].
///
/// Starts locked and disabled. Once a reset is requested the counter
/// freezes: the simulated device is considered to be rebooting.
#[derive(Clone)]
pub struct MockWatchdog {
    regs: Rc<RefCell<WdtRegs>>,
    clock: SimClock,
    ticks_per_ms: u32,
}

impl MockWatchdog {
    /// Watchdog counting at `ticks_per_ms`.
    pub fn new(clock: SimClock, ticks_per_ms: u32) -> Self {
        Self {
            regs: Rc::new(RefCell::new(WdtRegs::default())),
            clock,
            ticks_per_ms,
        }
    }

    /// Configuration registers locked.
    pub fn is_locked(&self) -> bool {
        self.regs.borrow().locked
    }

    /// Counting enabled.
    pub fn is_enabled(&self) -> bool {
        self.regs.borrow().enabled
    }

    /// Limits last programmed.
    pub fn limits(&self) -> WindowLimits {
        self.regs.borrow().limits
    }

    /// Reset the simulated device would have taken, if any.
    pub fn reset_requested(&self) -> Option<WatchdogReset> {
        self.sync();
        self.regs.borrow().reset
    }

    /// Number of accepted services.
    pub fn services(&self) -> usize {
        self.regs.borrow().services
    }

    /// Configuration writes dropped because the watchdog was locked.
    pub fn ignored_writes(&self) -> usize {
        self.regs.borrow().ignored_writes
    }

    fn live_count(&self, regs: &WdtRegs) -> u32 {
        if !regs.enabled || regs.reset.is_some() {
            return regs.frozen;
        }
        let elapsed = self.clock.now_ns().saturating_sub(regs.window_start_ns);
        let ticks = elapsed * u64::from(self.ticks_per_ms) / 1_000_000;
        ticks.min(u64::from(regs.limits.upper)) as u32
    }

    fn sync(&self) {
        let mut regs = self.regs.borrow_mut();
        if !regs.enabled || regs.reset.is_some() {
            return;
        }
        let count = self.live_count(&regs);
        if !regs.warn_fired && count >= regs.limits.warn {
            regs.warn_fired = true;
            if regs.warn_action == WarnAction::Interrupt {
                regs.irq_latched = true;
            }
        }
        if count >= regs.limits.upper && regs.upper_action == LimitAction::Reset {
            regs.frozen = count;
            regs.reset = Some(WatchdogReset::UpperLimit);
        }
    }

    /// Apply `write` only while unlocked.
    fn protected(&self, write: impl FnOnce(&mut WdtRegs)) {
        let mut regs = self.regs.borrow_mut();
        if regs.locked {
            regs.ignored_writes += 1;
        } else {
            write(&mut regs);
        }
    }
}

impl WindowedWatchdog for MockWatchdog {
    fn unlock(&mut self) {
        self.regs.borrow_mut().locked = false;
    }

    fn lock(&mut self) {
        self.regs.borrow_mut().locked = true;
    }

    fn set_limits(&mut self, limits: WindowLimits) {
        self.protected(|regs| regs.limits = limits);
    }

    fn set_actions(&mut self, lower: LimitAction, warn: WarnAction, upper: LimitAction) {
        self.protected(|regs| {
            regs.lower_action = lower;
            regs.warn_action = warn;
            regs.upper_action = upper;
        });
    }

    fn enable(&mut self) {
        let now = self.clock.now_ns();
        self.protected(|regs| {
            regs.enabled = true;
            regs.window_start_ns = now;
            regs.warn_fired = false;
        });
    }

    fn disable(&mut self) {
        self.sync();
        let frozen = {
            let regs = self.regs.borrow();
            self.live_count(&regs)
        };
        self.protected(|regs| {
            regs.frozen = frozen;
            regs.enabled = false;
        });
    }

    fn counter(&self) -> u32 {
        self.sync();
        let regs = self.regs.borrow();
        self.live_count(&regs)
    }

    fn service(&mut self) {
        self.sync();
        let count = {
            let regs = self.regs.borrow();
            self.live_count(&regs)
        };
        let now = self.clock.now_ns();
        let mut regs = self.regs.borrow_mut();
        if !regs.enabled || regs.reset.is_some() {
            return;
        }
        if count < regs.limits.lower && regs.lower_action == LimitAction::Reset {
            regs.frozen = count;
            regs.reset = Some(WatchdogReset::EarlyService);
            return;
        }
        regs.window_start_ns = now;
        regs.warn_fired = false;
        regs.services += 1;
    }

    fn unmask_interrupt(&mut self) {
        self.regs.borrow_mut().irq_unmasked = true;
    }

    fn interrupt_pending(&self) -> bool {
        self.sync();
        let regs = self.regs.borrow();
        regs.irq_unmasked && regs.irq_latched
    }

    fn clear_interrupt(&mut self) {
        self.regs.borrow_mut().irq_latched = false;
    }
}

/// Reset-cause register with a fixed boot reason.
pub struct MockResetCause {
    reason: Option<ResetReason>,
}

impl MockResetCause {
    /// Device booted because of `reason`.
    pub fn new(reason: ResetReason) -> Self {
        Self {
            reason: Some(reason),
        }
    }

    /// Cause has been cleared since boot.
    pub fn is_cleared(&self) -> bool {
        self.reason.is_none()
    }
}

impl ResetCause for MockResetCause {
    fn reset_reason(&self) -> ResetReason {
        self.reason.unwrap_or(ResetReason::Other)
    }

    fn clear_reset_reason(&mut self) {
        self.reason = None;
    }
}
