//! Peripheral capability layer for Class B self-tests
//!
//! This crate provides trait-based abstractions for the peripherals the
//! self-test engine exercises, enabling the diagnostics to be developed and
//! tested without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (startup / periodic scheduler)
//!         ↓
//! Self-test engine (selftest crate)
//!         ↓
//! Capability traits (this crate)
//!         ↓
//! Board support (PAC / vendor HAL)
//! ```
//!
//! # Capability Sets
//!
//! - [`LoopbackPort`] - UART or SPI block with an internal loopback path
//! - [`I2cLoopbackPair`] - I2C master under test and a slave on the same bus
//! - [`DmaController`] - descriptor-based memory-to-memory DMA
//! - [`Counter`] / [`TimerCounter`] - PWM and timer/counter blocks
//! - [`WindowedWatchdog`] / [`ResetCause`] - window watchdog and reset cause
//!
//! Delays come from [`embedded_hal::delay::DelayNs`]; this crate does not
//! define its own.
//!
//! # Features
//!
//! - `std`: Enable the host-side mocks in [`mocks`]
//! - `defmt`: Enable `defmt::Format` on every public type

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
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[cfg(feature = "std")]
extern crate std;

pub mod counter;
pub mod dma;
pub mod i2c;
pub mod peripheral;
pub mod watchdog;

pub mod mocks;

pub use counter::{Counter, TimerCounter};
pub use dma::{ChannelConfig, Descriptor, DescriptorSlot, DmaController, TransferWidth};
pub use i2c::I2cLoopbackPair;
pub use peripheral::{InterruptMasks, LoopbackPort, PortMode};
pub use watchdog::{
    LimitAction, ResetCause, ResetReason, WarnAction, WindowLimits, WindowedWatchdog,
};
