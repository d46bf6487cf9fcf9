//! Integration tests for the resumable UART/SPI loopback diagnostics.
//!
//! Run with: cargo test -p selftest --test loopback_sweep

// Test files legitimately use arithmetic and indexing for verification.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic, clippy::use_debug)]

use platform::mocks::{LoopbackFault, MockDelay, MockLoopbackPort, SimClock};
use platform::{LoopbackPort, PortMode};
use selftest::{
    Buffer, DiagnosticId, Failure, FaultInjection, Injection, LoopbackPhase, LoopbackTest,
    Precondition, SuiteReport, TestStatus, Verdict,
};

// ── Test A ──────────────────────────────────────────────────────────────────
// A clean UART sweeps [0, 0xF0] once per pass

#[test]
fn uart_sweep_covers_reduced_range_then_passes() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::Uart);
    let mut test = LoopbackTest::uart();
    let faults = FaultInjection::none();

    for value in 0u8..0xF0 {
        assert_eq!(
            test.run(&mut port, &mut delay, &faults),
            TestStatus::StillTesting,
            "value {value:#04x} is not the last of the sweep"
        );
    }
    assert_eq!(test.run(&mut port, &mut delay, &faults), TestStatus::Pass);
    assert_eq!(test.phase(), LoopbackPhase::Completed);
    assert_eq!(test.completed_passes(), 1);
    assert_eq!(test.cursor().next(), 0, "cursor wraps after the bound matched");

    let expected: Vec<u8> = (0u8..=0xF0).collect();
    assert_eq!(port.transmitted(), expected.as_slice());
}

#[test]
fn next_call_after_pass_starts_new_sweep() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::Uart);
    let mut test = LoopbackTest::uart();
    let faults = FaultInjection::none();

    while test.run(&mut port, &mut delay, &faults) != TestStatus::Pass {}
    assert_eq!(test.run(&mut port, &mut delay, &faults), TestStatus::StillTesting);
    assert_eq!(test.phase(), LoopbackPhase::Testing);
    assert_eq!(port.transmitted().last(), Some(&0));
}

// ── Test B ──────────────────────────────────────────────────────────────────
// SPI sweeps the full byte range

#[test]
fn spi_sweep_covers_full_byte_range() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::SpiMaster);
    let mut test = LoopbackTest::spi();
    let faults = FaultInjection::none();

    let mut calls = 0usize;
    loop {
        calls += 1;
        match test.run(&mut port, &mut delay, &faults) {
            TestStatus::StillTesting => {}
            TestStatus::Pass => break,
            other => panic!("unexpected status {other:?} on call {calls}"),
        }
    }
    assert_eq!(calls, 256);
}

// ── Test C ──────────────────────────────────────────────────────────────────
// Transmit-side fault injection

#[test]
fn uart_injection_fails_on_sentinel_and_never_sends_it() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::Uart);
    let mut test = LoopbackTest::uart();
    let faults = FaultInjection::none().with(Injection::UartLoopback);

    for _ in 0..100 {
        assert_eq!(test.run(&mut port, &mut delay, &faults), TestStatus::StillTesting);
    }
    for _ in 0..3 {
        assert_eq!(
            test.run(&mut port, &mut delay, &faults),
            TestStatus::Fail(Failure::DataMismatch { expected: 100, received: 101 }),
            "sentinel must keep failing while the injection is active"
        );
        assert_eq!(test.cursor().next(), 100);
    }
    assert!(
        !port.transmitted().contains(&100),
        "the uncorrupted sentinel must never reach the wire"
    );
}

#[test]
fn spi_injection_does_not_affect_uart() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::Uart);
    let mut test = LoopbackTest::uart();
    let faults = FaultInjection::none().with(Injection::SpiLoopback);

    let mut status = TestStatus::StillTesting;
    while status == TestStatus::StillTesting {
        status = test.run(&mut port, &mut delay, &faults);
    }
    assert_eq!(status, TestStatus::Pass);
}

// ── Test D ──────────────────────────────────────────────────────────────────
// Preconditions do not disturb the sweep

#[test]
fn pending_rx_data_reports_precondition_and_keeps_cursor() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::SpiMaster);
    let mut test = LoopbackTest::spi();
    let faults = FaultInjection::none();

    for _ in 0..10 {
        test.run(&mut port, &mut delay, &faults);
    }
    port.preload_rx(&[0xDE, 0xAD]);
    assert_eq!(
        test.run(&mut port, &mut delay, &faults),
        TestStatus::PreconditionFailed(Precondition::BufferNotEmpty(Buffer::Rx))
    );
    assert_eq!(test.cursor().next(), 10);
    assert_eq!(port.rx_available(), 0, "FIFOs are cleared on the precondition path");

    assert_eq!(test.run(&mut port, &mut delay, &faults), TestStatus::StillTesting);
    assert_eq!(test.cursor().next(), 11);
}

#[test]
fn every_value_sent_once_despite_interleaved_preconditions() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::SpiMaster);
    let mut test = LoopbackTest::spi();
    let faults = FaultInjection::none();

    let mut call = 0u32;
    loop {
        call += 1;
        if call % 7 == 0 {
            port.set_tx_backlog(1);
        }
        match test.run(&mut port, &mut delay, &faults) {
            TestStatus::Pass => break,
            TestStatus::StillTesting => {}
            TestStatus::PreconditionFailed(Precondition::BufferNotEmpty(Buffer::Tx)) => {
                assert_eq!(call % 7, 0);
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    let mut seen = [0u8; 256];
    for &value in port.transmitted() {
        seen[usize::from(value)] += 1;
    }
    assert!(seen.iter().all(|&n| n == 1), "each value transmitted exactly once");
}

#[test]
fn wrong_mode_never_touches_fifos() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::SpiSlave);
    let mut test = LoopbackTest::spi();

    let status = test.run(&mut port, &mut delay, &FaultInjection::none());
    assert_eq!(status, TestStatus::PreconditionFailed(Precondition::WrongMode));
    assert_eq!(port.fifo_clears(), 0);
}

// ── Test E ──────────────────────────────────────────────────────────────────
// Hardware faults

#[test]
fn stuck_low_bit_detected_on_first_value_using_it() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::Uart).with_fault(LoopbackFault::StuckLow(0x04));
    let mut test = LoopbackTest::uart();
    let faults = FaultInjection::none();

    for _ in 0..4 {
        assert_eq!(test.run(&mut port, &mut delay, &faults), TestStatus::StillTesting);
    }
    assert_eq!(
        test.run(&mut port, &mut delay, &faults),
        TestStatus::Fail(Failure::DataMismatch { expected: 0x04, received: 0x00 })
    );
}

// ── Test F ──────────────────────────────────────────────────────────────────
// Suite report across periodic calls

#[test]
fn completed_sweep_stays_healthy_while_next_sweep_runs() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut port = MockLoopbackPort::new(PortMode::SpiMaster);
    let mut test = LoopbackTest::spi();
    let mut report = SuiteReport::new();
    let faults = FaultInjection::none();

    loop {
        let status = test.run(&mut port, &mut delay, &faults);
        report.record(DiagnosticId::Spi, status);
        if status == TestStatus::Pass {
            break;
        }
        assert_eq!(report.verdict(&[DiagnosticId::Spi]), Verdict::InProgress);
    }
    assert_eq!(report.verdict(&[DiagnosticId::Spi]), Verdict::Healthy);

    for _ in 0..10 {
        let status = test.run(&mut port, &mut delay, &faults);
        assert_eq!(status, TestStatus::StillTesting);
        report.record(DiagnosticId::Spi, status);
        assert_eq!(report.verdict(&[DiagnosticId::Spi]), Verdict::Healthy);
    }

    port.set_bus_busy(true);
    report.record(DiagnosticId::Spi, test.run(&mut port, &mut delay, &faults));
    assert_eq!(report.verdict(&[DiagnosticId::Spi]), Verdict::Faulted);
}
