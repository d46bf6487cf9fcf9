//! Serial block with a simulated internal loopback path.

use heapless::{Deque, Vec};

use crate::peripheral::{InterruptMasks, LoopbackPort, PortMode};

/// Receive FIFO depth of the simulated block.
const RX_FIFO_DEPTH: usize = 16;

/// Transmit log capacity (several full sweeps).
const TX_LOG_LEN: usize = 1024;

/// Defect wired into the simulated loopback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopbackFault {
    /// Data comes back unchanged.
    None,
    /// These bits always read back as 1.
    StuckHigh(u8),
    /// These bits always read back as 0.
    StuckLow(u8),
    /// Transmitter works but nothing reaches the receiver.
    OpenLoop,
    /// Transmitter never shifts data out.
    TxStalled,
}

/// Mock UART/SPI block.
pub struct MockLoopbackPort {
    enabled: bool,
    mode: PortMode,
    masks: InterruptMasks,
    fault: LoopbackFault,
    rx: Deque<u8, RX_FIFO_DEPTH>,
    tx_pending: usize,
    bus_busy: bool,
    transmitted: Vec<u8, TX_LOG_LEN>,
    masks_at_put: Option<InterruptMasks>,
    fifo_clears: usize,
}

impl MockLoopbackPort {
    /// Enabled block in `mode` with a healthy loopback path.
    pub fn new(mode: PortMode) -> Self {
        Self {
            enabled: true,
            mode,
            masks: InterruptMasks { rx: 0x0004, tx: 0x0100 },
            fault: LoopbackFault::None,
            rx: Deque::new(),
            tx_pending: 0,
            bus_busy: false,
            transmitted: Vec::new(),
            masks_at_put: None,
            fifo_clears: 0,
        }
    }

    /// Same block with a defect in the loopback path.
    #[must_use]
    pub fn with_fault(mut self, fault: LoopbackFault) -> Self {
        self.fault = fault;
        self
    }

    /// Power the block down (or back up).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Leave application data sitting in the receive FIFO.
    pub fn preload_rx(&mut self, data: &[u8]) {
        for &byte in data {
            let _ = self.rx.push_back(byte);
        }
    }

    /// Leave `count` application data units stuck in the transmit path.
    pub fn set_tx_backlog(&mut self, count: usize) {
        self.tx_pending = count;
    }

    /// Hold slave select asserted.
    pub fn set_bus_busy(&mut self, busy: bool) {
        self.bus_busy = busy;
    }

    /// Every value written with [`LoopbackPort::put`], in order.
    pub fn transmitted(&self) -> &[u8] {
        &self.transmitted
    }

    /// Interrupt masks that were in effect at the most recent `put`.
    pub fn masks_at_last_put(&self) -> Option<InterruptMasks> {
        self.masks_at_put
    }

    /// Combined count of transmit and receive FIFO clears.
    pub fn fifo_clears(&self) -> usize {
        self.fifo_clears
    }

    fn loop_back(&self, value: u8) -> Option<u8> {
        match self.fault {
            LoopbackFault::None => Some(value),
            LoopbackFault::StuckHigh(bits) => Some(value | bits),
            LoopbackFault::StuckLow(bits) => Some(value & !bits),
            LoopbackFault::OpenLoop | LoopbackFault::TxStalled => None,
        }
    }
}

impl LoopbackPort for MockLoopbackPort {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn mode(&self) -> PortMode {
        self.mode
    }

    fn interrupt_masks(&self) -> InterruptMasks {
        self.masks
    }

    fn set_interrupt_masks(&mut self, masks: InterruptMasks) {
        self.masks = masks;
    }

    fn tx_in_flight(&self) -> usize {
        self.tx_pending
    }

    fn rx_available(&self) -> usize {
        self.rx.len()
    }

    fn is_bus_busy(&self) -> bool {
        self.bus_busy
    }

    fn clear_tx_fifo(&mut self) {
        self.tx_pending = 0;
        self.fifo_clears += 1;
    }

    fn clear_rx_fifo(&mut self) {
        self.rx.clear();
        self.fifo_clears += 1;
    }

    fn put(&mut self, value: u8) {
        self.masks_at_put = Some(self.masks);
        let _ = self.transmitted.push(value);
        if self.fault == LoopbackFault::TxStalled {
            self.tx_pending += 1;
            return;
        }
        if let Some(echo) = self.loop_back(value) {
            let _ = self.rx.push_back(echo);
        }
    }

    fn get(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }
}
