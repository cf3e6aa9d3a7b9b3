use crate::interrupts::InterruptManager;

/// Port-mapped I/O and halt notifications for the host platform.
///
/// Port accesses carry the 8-bit port number from the instruction plus the
/// byte the CPU drives onto the upper half of the address bus (A for
/// `IN A,(n)`/`OUT (n),A`, B for the `(C)` forms and block I/O).
pub trait PeripheralManager: Send {
    fn read_byte_from_port(&mut self, port: u8, context: u8) -> u8;

    fn write_byte_to_port(&mut self, port: u8, context: u8, value: u8);

    /// The CPU executed HALT.
    fn signal_halt(&mut self) {}

    /// The CPU left the halted state.
    fn signal_resume(&mut self) {}

    /// Called once while the core is being built so peripherals can raise
    /// interrupts later.
    fn attach_interrupt_manager(&mut self, _interrupts: InterruptManager) {}
}

/// Peripheral manager for systems without port I/O. Reads float high.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPeripherals;

impl PeripheralManager for NoPeripherals {
    fn read_byte_from_port(&mut self, _port: u8, _context: u8) -> u8 {
        0xFF
    }

    fn write_byte_to_port(&mut self, _port: u8, _context: u8, _value: u8) {}
}
