//! Windowed watchdog and reset-cause abstraction layer
//!
//! The watchdog counts up from zero after each service. Servicing below the
//! lower limit, or letting the count reach the upper limit, resets the
//! device. Crossing the warn limit raises an interrupt when that action is
//! selected.

/// Counter limits of a windowed watchdog, in watchdog ticks.
///
/// Invariant for a usable window: `lower < warn < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowLimits {
    /// Earliest count at which servicing is legal.
    pub lower: u32,
    /// Count at which the warn action fires.
    pub warn: u32,
    /// Count at which the upper action fires.
    pub upper: u32,
}

impl WindowLimits {
    /// `lower < warn < upper`.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.lower < self.warn && self.warn < self.upper
    }
}

/// Action taken when the count violates the lower or upper limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitAction {
    /// No action.
    None,
    /// Device reset.
    Reset,
}

/// Action taken when the count crosses the warn limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WarnAction {
    /// No action.
    None,
    /// Raise the watchdog interrupt.
    Interrupt,
}

/// Windowed watchdog capability set.
///
/// Configuration writes are ignored by hardware while the watchdog is
/// locked; callers bracket them with [`unlock`](Self::unlock) /
/// [`lock`](Self::lock).
pub trait WindowedWatchdog {
    /// Open the configuration registers for writing.
    fn unlock(&mut self);

    /// Close the configuration registers.
    fn lock(&mut self);

    /// Program all three limits.
    fn set_limits(&mut self, limits: WindowLimits);

    /// Select the lower, warn and upper actions.
    fn set_actions(&mut self, lower: LimitAction, warn: WarnAction, upper: LimitAction);

    /// Start counting from zero.
    fn enable(&mut self);

    /// Stop counting.
    fn disable(&mut self);

    /// Current watchdog count.
    fn counter(&self) -> u32;

    /// Service (kick) the watchdog, restarting the window.
    fn service(&mut self);

    /// Unmask the warn interrupt.
    fn unmask_interrupt(&mut self);

    /// Masked warn interrupt status.
    fn interrupt_pending(&self) -> bool;

    /// Clear the warn interrupt status.
    fn clear_interrupt(&mut self);
}

/// Cause of the most recent device reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetReason {
    /// Power-on or brown-out.
    PowerOn,
    /// External reset pin.
    External,
    /// Hardware watchdog.
    Watchdog,
    /// Software-requested reset.
    Software,
    /// Anything the platform does not classify.
    Other,
}

/// Reset-cause register access.
pub trait ResetCause {
    /// Cause recorded for the last reset.
    fn reset_reason(&self) -> ResetReason;

    /// Clear the recorded cause so the next boot reports fresh information.
    fn clear_reset_reason(&mut self);
}
