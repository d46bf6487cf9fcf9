//! Self-test configuration and constants
//!
//! Central defaults for every diagnostic. The `const` profiles built from
//! these (`LoopbackProfile::UART`, `TimerTestConfig::DEFAULT`,
//! `WwdtConfig::DEFAULT`, ...) are what boards override when their clocks or
//! bit rates differ.

use crate::guard::PollBudget;

// ─── Loopback ────────────────────────────────────────────────────────────────

/// Last value of the UART sweep (reduced range, inclusive).
pub const UART_RANGE_END: u8 = 0xF0;

/// Last value of the SPI sweep (full byte range, inclusive).
pub const SPI_RANGE_END: u8 = 0xFF;

/// Cursor value the loopback transmit injection corrupts.
pub const LOOPBACK_FAULT_SENTINEL: u8 = 100;

/// UART: waiting for application data to drain, and for transmit completion.
pub const UART_TRANSMIT_BUDGET: PollBudget = PollBudget::new(1, 400);

/// UART: waiting for the looped-back byte.
pub const UART_RECEIVE_BUDGET: PollBudget = PollBudget::new(10, 400);

/// UART: line settle time before the FIFOs are cleared.
pub const UART_SETTLE_US: u32 = 100;

/// SPI: every wait.
pub const SPI_BUDGET: PollBudget = PollBudget::new(1, 32);

/// Last value of the I2C sweep (full byte range, inclusive).
pub const I2C_RANGE_END: u8 = 0xFF;

/// I2C: one single-byte master transfer.
pub const I2C_TRANSFER_BUDGET: PollBudget = PollBudget::new(1, 800);

/// I2C: consecutive calls that may find the master owned by another
/// transfer before the diagnostic fails.
pub const I2C_BUSY_RETRIES: u8 = 100;

// ─── DMA ─────────────────────────────────────────────────────────────────────

/// Bytes in each DMA destination.
pub const DMA_BLOCK_LEN: usize = 64;

/// 32-bit words moved by the zero-fill descriptor.
pub const DMA_ZERO_WORDS: usize = 16;

/// Repeating unit of the periodic-fill source.
pub const DMA_PERIOD: [u8; 3] = [0x00, 0x00, 0xFF];

/// Destination prefill, so a transfer that never happened cannot pass.
pub const DMA_GARBAGE_FILL: u8 = 0xAA;

/// Byte the DMA compare injection writes into the zero-fill destination.
pub const DMA_FAULT_BYTE: u8 = 0x01;

/// Waiting for DMA completion.
pub const DMA_COMPLETION_BUDGET: PollBudget = PollBudget::new(1, 1_000);

// ─── PWM gate-kill ───────────────────────────────────────────────────────────

/// Interval between the two counter samples.
pub const GATE_KILL_SETTLE_MS: u32 = 10;

/// Offset the gate-kill compare injection adds to the second sample.
pub const GATE_KILL_FAULT_OFFSET: u32 = 10;

// ─── Timer/counter ───────────────────────────────────────────────────────────

/// Compare value; the terminal-count interrupt fires when it is reached.
pub const TIMER_COMPARE: u32 = 50_000;

/// Reload value.
pub const TIMER_PERIOD: u32 = 65_535;

/// Tolerance of the counter reading at interrupt time (2.4 %).
pub const TIMER_TOLERANCE_BASIS_POINTS: u32 = 240;

/// Waiting for the terminal-count interrupt.
pub const TIMER_INTERRUPT_BUDGET: PollBudget = PollBudget::new(1, 600);

// ─── Window watchdog ─────────────────────────────────────────────────────────

/// Earliest legal service, in watchdog ticks.
pub const WWDT_LOWER_LIMIT: u32 = 50_000;

/// Warn interrupt, in watchdog ticks.
pub const WWDT_WARN_LIMIT: u32 = 80_000;

/// Reset, in watchdog ticks.
pub const WWDT_UPPER_LIMIT: u32 = 100_000;

/// Supervision of one watchdog run (5 s, above the 3.2 s upper limit at 32 kHz).
pub const WWDT_SUPERVISION_BUDGET: PollBudget = PollBudget::new(1_000, 5_000);
