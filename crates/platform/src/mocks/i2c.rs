//! I2C master/slave pair on a simulated bus.

use heapless::Vec;

use crate::i2c::I2cLoopbackPair;

/// Write log capacity (several full sweeps).
const WRITE_LOG_LEN: usize = 1024;

/// Defect wired into the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cFault {
    /// Bytes arrive unchanged.
    None,
    /// These bits always read as 1 at the slave.
    StuckHigh(u8),
    /// Slave never acknowledges; writes complete without reaching it.
    NoAck,
    /// Master never leaves the busy state once a transfer starts.
    Hung,
    /// Master reads end in a bus error.
    ReadError,
}

/// Mock I2C master with a slave that answers through its read buffer.
pub struct MockI2cPair {
    enabled: bool,
    fault: I2cFault,
    busy_starts: usize,
    busy_reads: usize,
    master_busy: bool,
    slave_written: Option<u8>,
    slave_read_buf: Option<u8>,
    received: Option<u8>,
    written: Vec<u8, WRITE_LOG_LEN>,
    refused_starts: usize,
    slave_read_resets: usize,
}

impl MockI2cPair {
    /// Enabled pair on a healthy bus.
    pub fn new() -> Self {
        Self {
            enabled: true,
            fault: I2cFault::None,
            busy_starts: 0,
            busy_reads: 0,
            master_busy: false,
            slave_written: None,
            slave_read_buf: None,
            received: None,
            written: Vec::new(),
            refused_starts: 0,
            slave_read_resets: 0,
        }
    }

    /// Same pair with a defect on the bus.
    #[must_use]
    pub fn with_fault(mut self, fault: I2cFault) -> Self {
        self.fault = fault;
        self
    }

    /// Power the master down (or back up).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Refuse the next `count` transfer starts as if another transfer owned
    /// the master.
    pub fn refuse_starts(&mut self, count: usize) {
        self.busy_starts = count;
    }

    /// Refuse the next `count` read starts only.
    pub fn refuse_reads(&mut self, count: usize) {
        self.busy_reads = count;
    }

    /// Every value the master started a write with, in order.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Starts refused so far.
    pub fn refused_starts(&self) -> usize {
        self.refused_starts
    }

    /// Times the slave read buffer was re-armed.
    pub fn slave_read_resets(&self) -> usize {
        self.slave_read_resets
    }

    /// Consume one refusal if any are left.
    fn refuse(&mut self) -> bool {
        if self.busy_starts > 0 {
            self.busy_starts -= 1;
            self.refused_starts += 1;
            true
        } else {
            false
        }
    }
}

impl Default for MockI2cPair {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cLoopbackPair for MockI2cPair {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn start_write(&mut self, value: u8) -> bool {
        if self.refuse() {
            return false;
        }
        let _ = self.written.push(value);
        match self.fault {
            I2cFault::Hung => self.master_busy = true,
            I2cFault::NoAck => {}
            I2cFault::StuckHigh(bits) => self.slave_written = Some(value | bits),
            I2cFault::None | I2cFault::ReadError => self.slave_written = Some(value),
        }
        true
    }

    fn start_read(&mut self) -> bool {
        if self.busy_reads > 0 {
            self.busy_reads -= 1;
            self.refused_starts += 1;
            return false;
        }
        if self.refuse() {
            return false;
        }
        self.received = match self.fault {
            I2cFault::Hung => {
                self.master_busy = true;
                None
            }
            I2cFault::ReadError => None,
            _ => self.slave_read_buf,
        };
        true
    }

    fn is_master_busy(&self) -> bool {
        self.master_busy
    }

    fn master_received(&self) -> Option<u8> {
        self.received
    }

    fn slave_take_written(&mut self) -> Option<u8> {
        self.slave_written.take()
    }

    fn slave_respond(&mut self, value: u8) {
        self.slave_read_buf = Some(value);
    }

    fn slave_reset_read(&mut self) {
        self.slave_read_buf = None;
        self.slave_read_resets += 1;
    }
}
