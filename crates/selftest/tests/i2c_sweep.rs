//! Integration tests for the resumable I2C master/slave loopback diagnostic.
//!
//! Run with: cargo test -p selftest --test i2c_sweep

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::panic, clippy::use_debug)]

use platform::mocks::{I2cFault, MockDelay, MockI2cPair, SimClock};
use selftest::{
    Failure, FaultInjection, I2cLoopbackTest, I2cStep, Injection, LoopbackPhase, TestStatus,
};

// ── Test A ──────────────────────────────────────────────────────────────────
// A clean bus sweeps the full byte range

#[test]
fn sweep_covers_full_byte_range_then_wraps() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut pair = MockI2cPair::new();
    let mut test = I2cLoopbackTest::new();
    let faults = FaultInjection::none();

    let mut calls = 0usize;
    loop {
        calls += 1;
        match test.run(&mut pair, &mut delay, &faults) {
            TestStatus::StillTesting => {}
            TestStatus::Pass => break,
            other => panic!("unexpected status {other:?} on call {calls}"),
        }
    }
    assert_eq!(calls, 256);
    assert_eq!(test.phase(), LoopbackPhase::Completed);
    assert_eq!(test.completed_passes(), 1);
    assert_eq!(test.cursor().next(), 0);

    let expected: Vec<u8> = (0u8..=0xFF).collect();
    assert_eq!(pair.written(), expected.as_slice());
    assert_eq!(pair.slave_read_resets(), 256);
}

// ── Test B ──────────────────────────────────────────────────────────────────
// Transmit-side fault injection

#[test]
fn injection_fails_on_sentinel_and_leaves_cursor() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut pair = MockI2cPair::new();
    let mut test = I2cLoopbackTest::new();
    let faults = FaultInjection::none().with(Injection::I2cLoopback);

    for _ in 0..100 {
        assert_eq!(test.run(&mut pair, &mut delay, &faults), TestStatus::StillTesting);
    }
    for _ in 0..2 {
        assert_eq!(
            test.run(&mut pair, &mut delay, &faults),
            TestStatus::Fail(Failure::DataMismatch { expected: 100, received: 101 })
        );
        assert_eq!(test.cursor().next(), 100);
        assert_eq!(test.step(), I2cStep::Write);
    }
    assert!(!pair.written().contains(&100));
}

#[test]
fn serial_injections_do_not_reach_i2c() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut pair = MockI2cPair::new();
    let mut test = I2cLoopbackTest::new();
    let faults = FaultInjection::none()
        .with(Injection::UartLoopback)
        .with(Injection::SpiLoopback);

    let mut status = TestStatus::StillTesting;
    while status == TestStatus::StillTesting {
        status = test.run(&mut pair, &mut delay, &faults);
    }
    assert_eq!(status, TestStatus::Pass);
}

// ── Test C ──────────────────────────────────────────────────────────────────
// Bus contention and defects

#[test]
fn contention_delays_but_does_not_skip_values() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut pair = MockI2cPair::new();
    let mut test = I2cLoopbackTest::new();
    let faults = FaultInjection::none();

    let mut call = 0u32;
    loop {
        call += 1;
        if call % 5 == 0 {
            pair.refuse_starts(2);
        }
        if call % 11 == 0 {
            pair.refuse_reads(1);
        }
        match test.run(&mut pair, &mut delay, &faults) {
            TestStatus::Pass => break,
            TestStatus::StillTesting => {}
            other => panic!("unexpected status {other:?} on call {call}"),
        }
    }

    let expected: Vec<u8> = (0u8..=0xFF).collect();
    assert_eq!(pair.written(), expected.as_slice(), "each value written exactly once");
    assert!(pair.refused_starts() > 0);
}

#[test]
fn stuck_slave_bit_detected_on_first_value_without_it() {
    let clock = SimClock::new();
    let mut delay = MockDelay::new(clock);
    let mut pair = MockI2cPair::new().with_fault(I2cFault::StuckHigh(0x80));
    let mut test = I2cLoopbackTest::new();

    assert_eq!(
        test.run(&mut pair, &mut delay, &FaultInjection::none()),
        TestStatus::Fail(Failure::DataMismatch { expected: 0x00, received: 0x80 })
    );
}
