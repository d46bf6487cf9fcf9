//! Deliberate corruption of a diagnostic's own data path.
//!
//! Each [`Injection`] site perturbs exactly one of two points: the value
//! leaving the system under test (transmit path) or the value about to be
//! compared (compare path). With a site enabled, the matching diagnostic
//! must report `Fail`; that is how the diagnostic's fault coverage is itself
//! verified.
//!
//! ```rust,ignore
//! static FAULTS: FaultInjection = FaultInjection::none().with(Injection::UartLoopback);
//!
//! let status = uart_test.run(&mut uart, &mut delay, &FAULTS);
//! assert!(status.is_fail());
//! ```

use crate::config::{DMA_FAULT_BYTE, GATE_KILL_FAULT_OFFSET, LOOPBACK_FAULT_SENTINEL};

/// One injection site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Injection {
    /// UART transmit: the sentinel value is sent one higher.
    UartLoopback,
    /// SPI transmit: the sentinel value is sent one higher.
    SpiLoopback,
    /// I2C master write: the sentinel value is sent one higher.
    I2cLoopback,
    /// DMA compare: first byte of the zero-fill destination overwritten.
    DmaPattern,
    /// Gate-kill compare: second counter sample offset.
    PwmGateKill,
    /// Timer transmit: start trigger withheld.
    TimerCounter,
    /// Watchdog transmit: serviced once the lower limit passes.
    WwdtLowerLimit,
    /// Watchdog compare: handler does not record the interrupt.
    WwdtInterrupt,
}

impl Injection {
    const fn bit(self) -> u16 {
        1u16.wrapping_shl(self as u32)
    }
}

/// Set of enabled injection sites.
///
/// Assembled once, usually as a `static`, and passed by reference into
/// every diagnostic. [`FaultInjection::none`] is the production value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultInjection {
    enabled: u16,
}

impl FaultInjection {
    /// No site enabled.
    pub const fn none() -> Self {
        Self { enabled: 0 }
    }

    /// Same set plus `site`.
    #[must_use]
    pub const fn with(self, site: Injection) -> Self {
        Self {
            enabled: self.enabled | site.bit(),
        }
    }

    /// Whether `site` is enabled.
    pub const fn is_enabled(&self, site: Injection) -> bool {
        self.enabled & site.bit() != 0
    }

    /// Whether any site is enabled.
    pub const fn any(&self) -> bool {
        self.enabled != 0
    }

    // ─── Transmit path ───────────────────────────────────────────────────────

    /// Value actually written to a loopback port for cursor value `value`.
    pub fn loopback_transmit(&self, site: Injection, value: u8) -> u8 {
        if self.is_enabled(site) && value == LOOPBACK_FAULT_SENTINEL {
            #[cfg(feature = "defmt")]
            defmt::debug!("fault injection: {} sends {} for {}", site, value.wrapping_add(1), value);
            value.wrapping_add(1)
        } else {
            value
        }
    }

    /// Timer start trigger suppressed.
    pub fn timer_trigger_withheld(&self) -> bool {
        self.is_enabled(Injection::TimerCounter)
    }

    /// Watchdog serviced as soon as the lower limit is reached.
    pub fn wwdt_services_after_lower(&self) -> bool {
        self.is_enabled(Injection::WwdtLowerLimit)
    }

    // ─── Compare path ────────────────────────────────────────────────────────

    /// Overwrite the first byte of the zero-fill destination.
    pub fn corrupt_dma_destination(&self, destination: &mut [u8]) {
        if self.is_enabled(Injection::DmaPattern) {
            if let Some(first) = destination.first_mut() {
                *first = DMA_FAULT_BYTE;
            }
        }
    }

    /// Second gate-kill counter sample as the comparison sees it.
    pub fn gate_kill_sample(&self, sample: u32) -> u32 {
        if self.is_enabled(Injection::PwmGateKill) {
            sample.wrapping_add(GATE_KILL_FAULT_OFFSET)
        } else {
            sample
        }
    }

    /// Watchdog interrupt acknowledged but not recorded.
    pub fn wwdt_interrupt_dropped(&self) -> bool {
        self.is_enabled(Injection::WwdtInterrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_transparent() {
        let faults = FaultInjection::none();
        assert!(!faults.any());
        assert_eq!(faults.loopback_transmit(Injection::UartLoopback, 100), 100);
        assert_eq!(faults.gate_kill_sample(7), 7);
        let mut dst = [0u8; 4];
        faults.corrupt_dma_destination(&mut dst);
        assert_eq!(dst, [0; 4]);
        assert!(!faults.timer_trigger_withheld());
    }

    #[test]
    fn test_loopback_site_only_hits_sentinel() {
        let faults = FaultInjection::none().with(Injection::SpiLoopback);
        assert_eq!(faults.loopback_transmit(Injection::SpiLoopback, 99), 99);
        assert_eq!(faults.loopback_transmit(Injection::SpiLoopback, 100), 101);
        assert_eq!(
            faults.loopback_transmit(Injection::UartLoopback, 100),
            100,
            "UART path must not see the SPI injection"
        );
    }

    #[test]
    fn test_sites_are_independent() {
        let faults = FaultInjection::none()
            .with(Injection::DmaPattern)
            .with(Injection::WwdtInterrupt);
        assert!(faults.is_enabled(Injection::DmaPattern));
        assert!(faults.is_enabled(Injection::WwdtInterrupt));
        assert!(!faults.is_enabled(Injection::WwdtLowerLimit));
        assert!(!faults.is_enabled(Injection::PwmGateKill));
        let mut dst = [0u8; 4];
        faults.corrupt_dma_destination(&mut dst);
        assert_eq!(dst, [0x01, 0, 0, 0]);
    }

    #[test]
    fn test_const_static_assembly() {
        static FAULTS: FaultInjection = FaultInjection::none().with(Injection::PwmGateKill);
        assert_eq!(FAULTS.gate_kill_sample(5), 15);
    }
}
