//! Serial peripheral abstraction layer
//!
//! Capability set the loopback diagnostics need from a UART or SPI block:
//! enable/mode query, interrupt masks, FIFO levels, single data-unit access.
//! Wiring the internal loopback path is the board's job, not this trait's.

/// Operating mode a serial block is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortMode {
    /// Asynchronous UART.
    Uart,
    /// SPI master.
    SpiMaster,
    /// SPI slave.
    SpiSlave,
}

/// Receive and transmit interrupt enable masks of one serial block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptMasks {
    /// Receive interrupt sources enabled.
    pub rx: u32,
    /// Transmit interrupt sources enabled.
    pub tx: u32,
}

impl InterruptMasks {
    /// Every interrupt source disabled.
    pub const NONE: Self = Self { rx: 0, tx: 0 };
}

/// Serial block with an internal loopback path (UART or SPI).
///
/// All methods are synchronous register accesses; the self-test engine does
/// its own bounded polling around them.
pub trait LoopbackPort {
    /// Peripheral clock and block enable are both on.
    fn is_enabled(&self) -> bool;

    /// Mode the block is currently configured for.
    fn mode(&self) -> PortMode;

    /// Read the receive/transmit interrupt masks.
    fn interrupt_masks(&self) -> InterruptMasks;

    /// Write the receive/transmit interrupt masks.
    fn set_interrupt_masks(&mut self, masks: InterruptMasks);

    /// Data units still queued for transmission, including the shift register.
    fn tx_in_flight(&self) -> usize;

    /// Data units waiting in the receive FIFO, including the shift register.
    fn rx_available(&self) -> usize;

    /// SPI only: slave select still asserted by a transfer in progress.
    fn is_bus_busy(&self) -> bool {
        false
    }

    /// Drop everything in the transmit FIFO.
    fn clear_tx_fifo(&mut self);

    /// Drop everything in the receive FIFO.
    fn clear_rx_fifo(&mut self);

    /// Queue one data unit for transmission.
    fn put(&mut self, value: u8);

    /// Pop one data unit from the receive FIFO.
    fn get(&mut self) -> u8;
}
