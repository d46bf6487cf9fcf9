//! DMA abstraction layer
//!
//! Descriptor-based DMA controller capability set: channel configuration,
//! two chained descriptors (ping/pong), software trigger and completion flag.

/// Which of the two chained descriptors of a channel is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorSlot {
    /// First descriptor, executed on trigger.
    Ping,
    /// Second descriptor, executed after `Ping` completes.
    Pong,
}

/// Element width moved per DMA beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferWidth {
    /// 8-bit beats.
    Byte,
    /// 16-bit beats.
    HalfWord,
    /// 32-bit beats.
    Word,
}

impl TransferWidth {
    /// Bytes moved per beat.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::HalfWord => 2,
            Self::Word => 4,
        }
    }
}

/// One memory-to-memory transfer.
///
/// Holds raw pointers because the controller keeps using them after
/// [`DmaController::program`] returns.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Source start address.
    pub src: *const u8,
    /// Destination start address.
    pub dst: *mut u8,
    /// Number of beats.
    pub count: usize,
    /// Beat width.
    pub width: TransferWidth,
}

impl Descriptor {
    /// Total bytes this descriptor moves.
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        self.count.saturating_mul(self.width.bytes())
    }
}

/// Channel-level configuration, built by the caller before the test runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Channel index on the controller.
    pub channel: u8,
    /// Arbitration priority (0 = highest).
    pub priority: u8,
}

/// DMA controller capability set.
pub trait DmaController {
    /// Enable the controller block.
    fn enable(&mut self);

    /// Configure the channel and enable it.
    fn configure_channel(&mut self, config: &ChannelConfig);

    /// Disable the channel, aborting any transfer in flight.
    fn disable_channel(&mut self, channel: u8);

    /// Load a descriptor into `slot` of `channel`.
    ///
    /// # Safety
    ///
    /// `descriptor.src` must be readable and `descriptor.dst` writable for
    /// `descriptor.len_bytes()` bytes, and no other reference to the
    /// destination may be used until the transfer is complete or the channel
    /// has been disabled with [`disable_channel`](Self::disable_channel).
    unsafe fn program(&mut self, channel: u8, slot: DescriptorSlot, descriptor: Descriptor);

    /// Software-trigger the channel.
    fn trigger(&mut self, channel: u8);

    /// Completion interrupt status of `channel` (unmasked).
    fn is_complete(&self, channel: u8) -> bool;

    /// Clear the completion status of `channel`.
    fn clear_complete(&mut self, channel: u8);
}
