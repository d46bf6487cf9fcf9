//! I2C master/slave pair abstraction layer
//!
//! The I2C diagnostic needs two blocks on one bus: the master under test and
//! a slave the board wires up next to it (another SCB, or an external
//! device). Each exchange is a one-byte master write followed by a one-byte
//! master read of the slave's response. Slave addressing and buffer setup
//! belong to board initialisation.

/// Master under test plus the slave it talks to.
///
/// Transfers are started here and completed by the blocks' own interrupt
/// handling; the self-test engine polls [`is_master_busy`] with a bound.
///
/// [`is_master_busy`]: I2cLoopbackPair::is_master_busy
pub trait I2cLoopbackPair {
    /// Clock and block enable of the master are on.
    fn is_enabled(&self) -> bool;

    /// Start a one-byte write to the slave.
    ///
    /// Returns `false`, changing nothing, when the master is still owned by
    /// another transfer.
    fn start_write(&mut self, value: u8) -> bool;

    /// Start a one-byte read from the slave.
    ///
    /// Returns `false`, changing nothing, when the master is still owned by
    /// another transfer.
    fn start_read(&mut self) -> bool;

    /// A started transfer has not finished yet.
    fn is_master_busy(&self) -> bool;

    /// Byte the last read delivered, or `None` if it ended in a bus error or
    /// with a byte count other than one.
    fn master_received(&self) -> Option<u8>;

    /// Byte the slave took from a completed one-byte write. Clears the
    /// slave's write status and re-arms its write buffer.
    fn slave_take_written(&mut self) -> Option<u8>;

    /// Place `value` in the slave's read buffer for the next master read.
    fn slave_respond(&mut self, value: u8);

    /// Clear the slave's read status and re-arm its read buffer.
    fn slave_reset_read(&mut self);
}
