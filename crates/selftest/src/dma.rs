//! DMA pattern diagnostic.
//!
//! Two chained descriptors move known data into two destinations that were
//! prefilled with garbage:
//!
//! | Slot | Source | Width | Destination |
//! |------|--------|-------|-------------|
//! | Ping | 16 zero words | 32-bit | zero-fill (64 bytes) |
//! | Pong | `00 00 FF` repeated | 8-bit | periodic-fill (64 bytes) |
//!
//! Both destinations are then compared byte-wise. Completion is awaited
//! with a guarded wait; a controller that never flags completion is
//! reported as a timeout and its channel disabled before returning.

use embedded_hal::delay::DelayNs;
use platform::{ChannelConfig, Descriptor, DescriptorSlot, DmaController, TransferWidth};

use crate::config::{
    DMA_BLOCK_LEN, DMA_COMPLETION_BUDGET, DMA_GARBAGE_FILL, DMA_PERIOD, DMA_ZERO_WORDS,
};
use crate::fault::FaultInjection;
use crate::guard::{guarded_wait, PollBudget};
use crate::status::{Failure, PatternBuffer, TestStatus, Timeout};

static ZERO_SOURCE: [u32; DMA_ZERO_WORDS] = [0; DMA_ZERO_WORDS];

static PERIODIC_SOURCE: [u8; DMA_BLOCK_LEN] = periodic_source();

// const context: the loop condition bounds every index.
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
const fn periodic_source() -> [u8; DMA_BLOCK_LEN] {
    let mut out = [0u8; DMA_BLOCK_LEN];
    let mut i = 0;
    while i < DMA_BLOCK_LEN {
        out[i] = DMA_PERIOD[i % DMA_PERIOD.len()];
        i += 1;
    }
    out
}

/// Destination memory of the DMA pattern test.
///
/// Word-aligned so the zero-fill descriptor can use 32-bit beats. Boards
/// place this in DMA-reachable RAM, typically as a `static mut` handed out
/// once at startup.
#[repr(C, align(4))]
pub struct DmaTestBuffers {
    zero_fill: [u8; DMA_BLOCK_LEN],
    periodic_fill: [u8; DMA_BLOCK_LEN],
}

impl DmaTestBuffers {
    /// Buffers filled with garbage.
    pub const fn new() -> Self {
        Self {
            zero_fill: [DMA_GARBAGE_FILL; DMA_BLOCK_LEN],
            periodic_fill: [DMA_GARBAGE_FILL; DMA_BLOCK_LEN],
        }
    }

    /// Destination of the zero-fill descriptor.
    pub fn zero_fill(&self) -> &[u8] {
        &self.zero_fill
    }

    /// Destination of the periodic-fill descriptor.
    pub fn periodic_fill(&self) -> &[u8] {
        &self.periodic_fill
    }

    fn prefill(&mut self) {
        self.zero_fill.fill(DMA_GARBAGE_FILL);
        self.periodic_fill.fill(DMA_GARBAGE_FILL);
    }

    /// First byte that differs from the expected content.
    fn first_mismatch(&self) -> Option<(PatternBuffer, usize)> {
        if let Some(offset) = self.zero_fill.iter().position(|&b| b != 0) {
            return Some((PatternBuffer::ZeroFill, offset));
        }
        self.periodic_fill
            .iter()
            .zip(DMA_PERIOD.iter().cycle())
            .position(|(got, want)| got != want)
            .map(|offset| (PatternBuffer::PeriodicFill, offset))
    }
}

impl Default for DmaTestBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-shot DMA pattern diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct DmaPatternTest {
    channel: ChannelConfig,
    completion: PollBudget,
}

impl DmaPatternTest {
    /// Test on `channel` with the default completion budget.
    pub const fn new(channel: ChannelConfig) -> Self {
        Self {
            channel,
            completion: DMA_COMPLETION_BUDGET,
        }
    }

    /// Same test with a different completion budget.
    #[must_use]
    pub const fn with_completion_budget(mut self, completion: PollBudget) -> Self {
        self.completion = completion;
        self
    }

    /// Run the transfer and verify both destinations.
    pub fn run<C, D>(
        &self,
        dma: &mut C,
        buffers: &mut DmaTestBuffers,
        delay: &mut D,
        faults: &FaultInjection,
    ) -> TestStatus
    where
        C: DmaController,
        D: DelayNs,
    {
        let channel = self.channel.channel;
        buffers.prefill();

        dma.enable();
        dma.configure_channel(&self.channel);
        dma.clear_complete(channel);

        let zero = Descriptor {
            src: ZERO_SOURCE.as_ptr().cast::<u8>(),
            dst: buffers.zero_fill.as_mut_ptr(),
            count: DMA_ZERO_WORDS,
            width: TransferWidth::Word,
        };
        let periodic = Descriptor {
            src: PERIODIC_SOURCE.as_ptr(),
            dst: buffers.periodic_fill.as_mut_ptr(),
            count: DMA_BLOCK_LEN,
            width: TransferWidth::Byte,
        };
        // SAFETY: sources are statics of exactly `len_bytes()` bytes. The
        // destinations are `len_bytes()` long and stay exclusively borrowed
        // through `buffers` until the channel is disabled below, on both the
        // completion and the timeout path.
        unsafe {
            dma.program(channel, DescriptorSlot::Ping, zero);
            dma.program(channel, DescriptorSlot::Pong, periodic);
        }
        dma.trigger(channel);

        let outcome = guarded_wait(delay, self.completion, || dma.is_complete(channel));
        dma.disable_channel(channel);
        if outcome.timed_out() {
            #[cfg(feature = "defmt")]
            defmt::warn!("DMA channel {} never completed", channel);
            return Failure::Timeout(Timeout::TransferComplete).into();
        }
        dma.clear_complete(channel);

        faults.corrupt_dma_destination(&mut buffers.zero_fill);

        match buffers.first_mismatch() {
            Some((buffer, offset)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("DMA {} destination differs at {}", buffer, offset);
                Failure::PatternMismatch { buffer, offset }.into()
            }
            None => TestStatus::Pass,
        }
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_source_layout() {
        assert_eq!(&PERIODIC_SOURCE[..6], &[0x00, 0x00, 0xFF, 0x00, 0x00, 0xFF]);
        assert_eq!(PERIODIC_SOURCE[63], 0x00, "64 = 21 * 3 + 1, truncated mid-period");
        assert_eq!(PERIODIC_SOURCE[62], 0xFF);
    }

    #[test]
    fn test_fresh_buffers_fail_comparison() {
        let buffers = DmaTestBuffers::new();
        assert_eq!(buffers.first_mismatch(), Some((PatternBuffer::ZeroFill, 0)));
    }

    #[test]
    fn test_buffers_are_word_aligned() {
        let buffers = DmaTestBuffers::new();
        assert_eq!(buffers.zero_fill.as_ptr() as usize % 4, 0);
        assert_eq!(buffers.periodic_fill.as_ptr() as usize % 4, 0);
    }
}
