//! Class B peripheral self-test engine
//!
//! Incremental, resumable, fault-injectable diagnostics for IEC 60730
//! Class B controllers. Each diagnostic drives one peripheral through the
//! capability traits of the [`platform`] crate and reports a [`TestStatus`].
//!
//! # Building Blocks
//!
//! - [`guard`] - every hardware wait is a [`guarded_wait`] with a
//!   [`PollBudget`], so each call has a known worst-case blocking time
//! - [`fault`] - [`FaultInjection`] corrupts a diagnostic's own data path to
//!   prove the diagnostic catches it
//! - [`interrupt`] - [`InterruptCounter`] hands interrupt events to the
//!   supervisory call
//!
//! # Diagnostics
//!
//! | Diagnostic | Kind | Entry point |
//! |------------|------|-------------|
//! | UART / SPI loopback | resumable | [`LoopbackTest::run`] |
//! | I2C master/slave loopback | resumable | [`I2cLoopbackTest::run`] |
//! | DMA pattern | single-shot | [`DmaPatternTest::run`] |
//! | PWM gate-kill | single-shot | [`GateKillTest::run`] |
//! | Timer/counter | single-shot + ISR | [`TimerCounterTest::run`], [`timer_interrupt`] |
//! | Window watchdog | supervisory + ISR | [`WwdtMonitor::run`], [`watchdog_interrupt`] |
//!
//! # Example
//!
//! ```rust,ignore
//! use selftest::{FaultInjection, LoopbackTest, SuiteReport, DiagnosticId, Verdict};
//!
//! static FAULTS: FaultInjection = FaultInjection::none();
//!
//! let mut uart_test = LoopbackTest::uart();
//! let mut report = SuiteReport::new();
//!
//! // Called from the periodic safety monitor
//! let status = uart_test.run(&mut uart, &mut delay, &FAULTS);
//! report.record(DiagnosticId::Uart, status);
//! if report.verdict(&DiagnosticId::ALL) == Verdict::Faulted {
//!     enter_safe_state();
//! }
//! ```
//!
//! # Features
//!
//! - `std`: Enable the `platform` mocks for host-side tooling
//! - `defmt`: Verdict logging and `defmt::Format` on every public type

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)] // status accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod dma;
pub mod fault;
pub mod gate_kill;
pub mod guard;
pub mod i2c;
pub mod interrupt;
pub mod loopback;
pub mod report;
pub mod status;
pub mod timer;
pub mod wwdt;

pub use dma::{DmaPatternTest, DmaTestBuffers};
pub use fault::{FaultInjection, Injection};
pub use gate_kill::GateKillTest;
pub use guard::{guarded_wait, PollBudget, WaitOutcome};
pub use i2c::{I2cLoopbackTest, I2cStep};
pub use interrupt::InterruptCounter;
pub use loopback::{LoopbackCursor, LoopbackPhase, LoopbackProfile, LoopbackTest};
pub use report::{DiagnosticId, SuiteReport, Verdict};
pub use status::{Buffer, Failure, PatternBuffer, Precondition, TestStatus, Timeout};
pub use timer::{timer_interrupt, Tolerance, ToleranceBand, TimerCounterTest, TimerTestConfig};
pub use wwdt::{
    watchdog_interrupt, WatchdogSnapshot, WwdtConfig, WwdtMonitor, WwdtPhase, WwdtState,
};
