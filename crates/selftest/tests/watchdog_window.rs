//! Integration tests for the window watchdog diagnostic, including the
//! reset / next-boot sequence.

#![allow(clippy::arithmetic_side_effects, clippy::use_debug)]

use platform::mocks::{MockDelay, MockResetCause, MockWatchdog, SimClock, WatchdogReset};
use platform::ResetReason;
use selftest::config::{WWDT_LOWER_LIMIT, WWDT_UPPER_LIMIT};
use selftest::{
    watchdog_interrupt, Failure, FaultInjection, Injection, InterruptCounter, TestStatus, Timeout,
    WwdtConfig, WwdtMonitor, WwdtPhase,
};

/// 32 kHz watchdog clock.
const TICKS_PER_MS: u32 = 32;

struct Boot {
    status: TestStatus,
    phase: WwdtPhase,
    interrupts: u32,
    wdt: MockWatchdog,
}

/// One boot of the device. `events` stands in for the no-init counter that
/// survives a watchdog reset.
fn boot_with(reason: ResetReason, faults: &FaultInjection, events: &InterruptCounter) -> Boot {
    let clock = SimClock::new();
    let mut wdt = MockWatchdog::new(clock.clone(), TICKS_PER_MS);
    let mut isr_wdt = wdt.clone();
    let mut delay =
        MockDelay::with_isr(clock, || watchdog_interrupt(&mut isr_wdt, events, faults));
    let mut reset = MockResetCause::new(reason);
    let mut monitor = WwdtMonitor::new(WwdtConfig::DEFAULT, events);

    let status = monitor.run(&mut wdt, &mut reset, &mut delay, faults);
    assert!(reset.is_cleared(), "reset cause must be cleared on every run");
    Boot {
        status,
        phase: monitor.phase(),
        interrupts: monitor.state().interrupts,
        wdt,
    }
}

fn boot(reason: ResetReason, faults: &FaultInjection) -> Boot {
    boot_with(reason, faults, &InterruptCounter::new())
}

#[test]
fn healthy_window_passes_on_warn_interrupt() {
    let run = boot(ResetReason::PowerOn, &FaultInjection::none());
    assert_eq!(run.status, TestStatus::Pass);
    assert_eq!(run.phase, WwdtPhase::WaitingWarn);
    assert_eq!(run.interrupts, 1);
    assert_eq!(run.wdt.reset_requested(), None);
    assert_eq!(run.wdt.limits().lower, WWDT_LOWER_LIMIT);
    assert_eq!(run.wdt.ignored_writes(), 0, "no configuration write while locked");
}

#[test]
fn lost_interrupt_resets_device_and_next_boot_fails() {
    let faults = FaultInjection::none().with(Injection::WwdtInterrupt);
    let events = InterruptCounter::new();

    let first = boot_with(ResetReason::PowerOn, &faults, &events);
    assert_eq!(
        first.wdt.reset_requested(),
        Some(WatchdogReset::UpperLimit),
        "unserviced window without interrupt must reset the device"
    );
    assert_eq!(first.interrupts, 0);
    // On hardware the call never returns; the mock lets it run out of budget.
    assert_eq!(first.status, TestStatus::Fail(Failure::Timeout(Timeout::Interrupt)));

    let second = boot_with(ResetReason::Watchdog, &faults, &events);
    assert_eq!(second.phase, WwdtPhase::PostResetVerifying);
    assert_eq!(second.interrupts, 0);
    assert_eq!(second.status, TestStatus::Fail(Failure::Timeout(Timeout::Interrupt)));
    assert!(second.wdt.is_locked());
    assert!(!second.wdt.is_enabled());
}

#[test]
fn reset_after_recorded_interrupt_passes_on_next_boot() {
    let events = InterruptCounter::new();

    let first = boot_with(ResetReason::PowerOn, &FaultInjection::none(), &events);
    assert_eq!(first.status, TestStatus::Pass);
    assert_eq!(events.count(), 1);

    // Device reset by the watchdog before the counter was consumed.
    let second = boot_with(ResetReason::Watchdog, &FaultInjection::none(), &events);
    assert_eq!(second.status, TestStatus::Pass);
    assert_eq!(second.phase, WwdtPhase::PostResetVerifying);
    assert_eq!(second.interrupts, 1);
    assert_eq!(events.count(), 0);

    // A second watchdog reset with nothing recorded since is not evidence.
    let third = boot_with(ResetReason::Watchdog, &FaultInjection::none(), &events);
    assert_eq!(third.status, TestStatus::Fail(Failure::Timeout(Timeout::Interrupt)));
}

#[test]
fn stale_events_do_not_satisfy_a_fresh_window() {
    let faults = FaultInjection::none().with(Injection::WwdtInterrupt);
    let events = InterruptCounter::new();
    events.record();
    events.record();

    let run = boot_with(ResetReason::PowerOn, &faults, &events);
    assert_eq!(run.status, TestStatus::Fail(Failure::Timeout(Timeout::Interrupt)));
    assert_eq!(run.interrupts, 0);
}

#[test]
fn lower_limit_service_injection_suppresses_warn() {
    let faults = FaultInjection::none().with(Injection::WwdtLowerLimit);
    let run = boot(ResetReason::PowerOn, &faults);
    assert_eq!(run.status, TestStatus::Fail(Failure::Timeout(Timeout::Interrupt)));
    assert_eq!(run.phase, WwdtPhase::WaitingWarn);
    assert!(run.wdt.services() > 0);
    assert_eq!(run.wdt.reset_requested(), None, "services were inside the window");
    assert!(run.wdt.is_locked());
    assert!(!run.wdt.is_enabled());
}

#[test]
fn other_reset_causes_arm_the_window() {
    for reason in [ResetReason::External, ResetReason::Software, ResetReason::Other] {
        let run = boot(reason, &FaultInjection::none());
        assert_eq!(run.status, TestStatus::Pass, "{reason:?} must arm a fresh window");
        assert_eq!(run.phase, WwdtPhase::WaitingWarn);
    }
}

#[test]
fn upper_limit_is_reachable_within_supervision_budget() {
    let upper_us = u64::from(WWDT_UPPER_LIMIT) * 1_000 / u64::from(TICKS_PER_MS);
    assert!(WwdtConfig::DEFAULT.supervision.budget_us() > upper_us);
}
