use std::sync::{Arc, Mutex, PoisonError};

use dynaz80::{AddressSegment, ReadableAddressSegment, WriteableAddressSegment};

/// Captured bytes shared between a segment owned by the MMU and the host.
pub type SharedOutput = Arc<Mutex<Vec<u8>>>;

const BASE: u16 = 0xFF00;
/// Serial transfer data
const SB: u16 = 0x01;
/// Serial transfer control
const SC: u16 = 0x02;
const TRANSFER_START: u8 = 0x80;
const INTERNAL_CLOCK: u8 = 0x01;

/// Game Boy I/O page (0xFF00-0xFFFF) with just enough of the serial port
/// to capture what test ROMs print. A transfer started with the internal
/// clock completes at once, SB reads back as if nothing was connected.
/// Every other register is plain storage.
pub struct SerialPort {
    registers: [u8; 0x100],
    output: SharedOutput,
}

impl SerialPort {
    pub fn new() -> Self {
        Self {
            registers: [0; 0x100],
            output: SharedOutput::default(),
        }
    }

    pub fn output(&self) -> SharedOutput {
        Arc::clone(&self.output)
    }
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSegment for SerialPort {
    fn address(&self) -> u16 {
        BASE
    }

    fn length(&self) -> u32 {
        0x100
    }
}

impl ReadableAddressSegment for SerialPort {
    fn read_byte(&self, offset: u16) -> u8 {
        self.registers[usize::from(offset)]
    }
}

impl WriteableAddressSegment for SerialPort {
    fn write_byte(&mut self, offset: u16, value: u8) {
        if offset == SC && value & (TRANSFER_START | INTERNAL_CLOCK) == TRANSFER_START | INTERNAL_CLOCK {
            let byte = self.registers[usize::from(SB)];
            self.output
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(byte);
            self.registers[usize::from(SB)] = 0xFF;
            self.registers[usize::from(SC)] = value & !TRANSFER_START;
            return;
        }
        self.registers[usize::from(offset)] = value;
    }
}
