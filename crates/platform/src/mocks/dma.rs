//! DMA controller that performs its transfers with plain memory copies.

use crate::dma::{ChannelConfig, Descriptor, DescriptorSlot, DmaController};

/// Defect wired into the simulated controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaFault {
    /// Transfers complete correctly.
    None,
    /// Trigger is accepted but nothing moves and completion never flags.
    Stalled,
    /// Completes, but one destination byte of `slot` ends up as `value`.
    CorruptByte {
        /// Descriptor whose destination is corrupted.
        slot: DescriptorSlot,
        /// Byte offset into that destination.
        offset: usize,
        /// Value written there.
        value: u8,
    },
    /// Completes after the ping descriptor without following the chain.
    BrokenChain,
}

/// Mock DMA controller with one active channel.
pub struct MockDmaController {
    enabled: bool,
    channel: Option<ChannelConfig>,
    ping: Option<Descriptor>,
    pong: Option<Descriptor>,
    complete: bool,
    fault: DmaFault,
    triggers: usize,
    disables: usize,
}

impl MockDmaController {
    /// Healthy controller.
    pub fn new() -> Self {
        Self::with_fault(DmaFault::None)
    }

    /// Controller with a defect.
    pub fn with_fault(fault: DmaFault) -> Self {
        Self {
            enabled: false,
            channel: None,
            ping: None,
            pong: None,
            complete: false,
            fault,
            triggers: 0,
            disables: 0,
        }
    }

    /// Number of software triggers accepted.
    pub fn triggers(&self) -> usize {
        self.triggers
    }

    /// Number of channel disables.
    pub fn disables(&self) -> usize {
        self.disables
    }

    /// Channel configuration last applied.
    pub fn channel(&self) -> Option<ChannelConfig> {
        self.channel
    }

    fn execute(descriptor: &Descriptor) {
        // SAFETY: `program`'s contract makes both ranges valid for
        // `len_bytes()` until completion or disable; the test buffers are
        // distinct objects, so the ranges cannot overlap.
        unsafe {
            core::ptr::copy_nonoverlapping(descriptor.src, descriptor.dst, descriptor.len_bytes());
        }
    }

    fn corrupt(descriptor: &Descriptor, offset: usize, value: u8) {
        if offset < descriptor.len_bytes() {
            // SAFETY: `offset` is inside the destination range checked above.
            unsafe { descriptor.dst.add(offset).write(value) };
        }
    }
}

impl Default for MockDmaController {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaController for MockDmaController {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn configure_channel(&mut self, config: &ChannelConfig) {
        self.channel = Some(*config);
        self.complete = false;
    }

    fn disable_channel(&mut self, channel: u8) {
        if self.channel.is_some_and(|c| c.channel == channel) {
            self.channel = None;
            self.ping = None;
            self.pong = None;
        }
        self.disables += 1;
    }

    unsafe fn program(&mut self, channel: u8, slot: DescriptorSlot, descriptor: Descriptor) {
        if !self.channel.is_some_and(|c| c.channel == channel) {
            return;
        }
        match slot {
            DescriptorSlot::Ping => self.ping = Some(descriptor),
            DescriptorSlot::Pong => self.pong = Some(descriptor),
        }
    }

    fn trigger(&mut self, channel: u8) {
        if !self.enabled || !self.channel.is_some_and(|c| c.channel == channel) {
            return;
        }
        self.triggers += 1;
        if self.fault == DmaFault::Stalled {
            return;
        }
        if let Some(ping) = self.ping.as_ref() {
            Self::execute(ping);
        }
        if self.fault != DmaFault::BrokenChain {
            if let Some(pong) = self.pong.as_ref() {
                Self::execute(pong);
            }
        }
        if let DmaFault::CorruptByte { slot, offset, value } = self.fault {
            let target = match slot {
                DescriptorSlot::Ping => self.ping.as_ref(),
                DescriptorSlot::Pong => self.pong.as_ref(),
            };
            if let Some(descriptor) = target {
                Self::corrupt(descriptor, offset, value);
            }
        }
        self.complete = true;
    }

    fn is_complete(&self, channel: u8) -> bool {
        self.complete && self.channel.is_some_and(|c| c.channel == channel)
    }

    fn clear_complete(&mut self, _channel: u8) {
        self.complete = false;
    }
}
