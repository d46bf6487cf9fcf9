//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests on the host.
//!
//! Time is simulated: [`SimClock`] is shared between a [`MockDelay`] and the
//! time-driven mocks ([`MockCounter`], [`MockTimer`], [`MockWatchdog`]), so a
//! diagnostic's own delays are what move the hardware forward. A
//! [`MockDelay`] built with [`MockDelay::with_isr`] runs an interrupt-handler
//! closure after every delay step, standing in for preemption.

#![cfg(any(test, feature = "std"))]
// Host-only test scaffolding.
#![allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]

mod clock;
mod counter;
mod dma;
mod i2c;
mod loopback;
mod watchdog;

pub use clock::{MockDelay, SimClock};
pub use counter::{MockCounter, MockTimer};
pub use dma::{DmaFault, MockDmaController};
pub use i2c::{I2cFault, MockI2cPair};
pub use loopback::{LoopbackFault, MockLoopbackPort};
pub use watchdog::{MockResetCause, MockWatchdog, WatchdogReset};
