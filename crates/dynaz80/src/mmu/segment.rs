//! Address segments supplied by the host.
//!
//! A segment owns a fixed `[address, address + length)` extent of the
//! address space and is accessed through offsets local to that extent.
//! Capability is expressed through which traits a segment implements and
//! is fixed once it is wrapped in a [`Segment`].

pub trait AddressSegment: Send {
    fn address(&self) -> u16;

    /// Length in bytes; a single segment may cover all 0x10000 bytes.
    fn length(&self) -> u32;
}

pub trait ReadableAddressSegment: AddressSegment {
    fn read_byte(&self, offset: u16) -> u8;

    /// Little-endian word. `offset + 1` is always inside the segment.
    fn read_word(&self, offset: u16) -> u16 {
        u16::from_le_bytes([self.read_byte(offset), self.read_byte(offset.wrapping_add(1))])
    }

    fn read_bytes(&self, offset: u16, buffer: &mut [u8]) {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.read_byte(offset.wrapping_add(i as u16));
        }
    }
}

pub trait WriteableAddressSegment: AddressSegment {
    fn write_byte(&mut self, offset: u16, value: u8);

    fn write_word(&mut self, offset: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(offset, lo);
        self.write_byte(offset.wrapping_add(1), hi);
    }

    fn write_bytes(&mut self, offset: u16, values: &[u8]) {
        for (i, value) in values.iter().enumerate() {
            self.write_byte(offset.wrapping_add(i as u16), *value);
        }
    }
}

pub trait ReadWriteAddressSegment: ReadableAddressSegment + WriteableAddressSegment {}

impl<T: ReadableAddressSegment + WriteableAddressSegment> ReadWriteAddressSegment for T {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentCapability {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// A host segment tagged with its capability.
pub enum Segment {
    ReadOnly(Box<dyn ReadableAddressSegment>),
    WriteOnly(Box<dyn WriteableAddressSegment>),
    ReadWrite(Box<dyn ReadWriteAddressSegment>),
}

impl Segment {
    pub fn read_only(segment: impl ReadableAddressSegment + 'static) -> Self {
        Segment::ReadOnly(Box::new(segment))
    }

    pub fn write_only(segment: impl WriteableAddressSegment + 'static) -> Self {
        Segment::WriteOnly(Box::new(segment))
    }

    pub fn read_write(segment: impl ReadWriteAddressSegment + 'static) -> Self {
        Segment::ReadWrite(Box::new(segment))
    }

    pub fn address(&self) -> u16 {
        match self {
            Segment::ReadOnly(s) => s.address(),
            Segment::WriteOnly(s) => s.address(),
            Segment::ReadWrite(s) => s.address(),
        }
    }

    pub fn length(&self) -> u32 {
        match self {
            Segment::ReadOnly(s) => s.length(),
            Segment::WriteOnly(s) => s.length(),
            Segment::ReadWrite(s) => s.length(),
        }
    }

    /// Exclusive end address, in the 17-bit space so `0x10000` is allowed.
    #[inline]
    pub fn end(&self) -> u32 {
        u32::from(self.address()) + self.length()
    }

    pub fn capability(&self) -> SegmentCapability {
        match self {
            Segment::ReadOnly(_) => SegmentCapability::ReadOnly,
            Segment::WriteOnly(_) => SegmentCapability::WriteOnly,
            Segment::ReadWrite(_) => SegmentCapability::ReadWrite,
        }
    }

    /// `false` when the segment cannot be read.
    pub(super) fn read_bytes(&self, offset: u16, buffer: &mut [u8]) -> bool {
        match self {
            Segment::ReadOnly(s) => s.read_bytes(offset, buffer),
            Segment::ReadWrite(s) => s.read_bytes(offset, buffer),
            Segment::WriteOnly(_) => return false,
        }
        true
    }

    pub(super) fn read_byte(&self, offset: u16) -> Option<u8> {
        match self {
            Segment::ReadOnly(s) => Some(s.read_byte(offset)),
            Segment::ReadWrite(s) => Some(s.read_byte(offset)),
            Segment::WriteOnly(_) => None,
        }
    }

    pub(super) fn read_word(&self, offset: u16) -> Option<u16> {
        match self {
            Segment::ReadOnly(s) => Some(s.read_word(offset)),
            Segment::ReadWrite(s) => Some(s.read_word(offset)),
            Segment::WriteOnly(_) => None,
        }
    }

    /// `false` when the segment cannot be written.
    pub(super) fn write_byte(&mut self, offset: u16, value: u8) -> bool {
        match self {
            Segment::WriteOnly(s) => s.write_byte(offset, value),
            Segment::ReadWrite(s) => s.write_byte(offset, value),
            Segment::ReadOnly(_) => return false,
        }
        true
    }

    pub(super) fn write_word(&mut self, offset: u16, value: u16) -> bool {
        match self {
            Segment::WriteOnly(s) => s.write_word(offset, value),
            Segment::ReadWrite(s) => s.write_word(offset, value),
            Segment::ReadOnly(_) => return false,
        }
        true
    }

    pub(super) fn write_bytes(&mut self, offset: u16, values: &[u8]) -> bool {
        match self {
            Segment::WriteOnly(s) => s.write_bytes(offset, values),
            Segment::ReadWrite(s) => s.write_bytes(offset, values),
            Segment::ReadOnly(_) => return false,
        }
        true
    }
}

/// Plain read-write memory.
pub struct RamSegment {
    address: u16,
    memory: Vec<u8>,
}

impl RamSegment {
    /// Zero-filled RAM of `length` bytes.
    pub fn new(address: u16, length: usize) -> Self {
        Self {
            address,
            memory: vec![0; length],
        }
    }

    /// RAM of `length` bytes starting with `contents` at offset 0.
    pub fn with_contents(address: u16, length: usize, contents: &[u8]) -> Self {
        let mut segment = Self::new(address, length);
        let len = contents.len().min(length);
        segment.memory[..len].copy_from_slice(&contents[..len]);
        segment
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }
}

impl AddressSegment for RamSegment {
    fn address(&self) -> u16 {
        self.address
    }

    fn length(&self) -> u32 {
        self.memory.len() as u32
    }
}

impl ReadableAddressSegment for RamSegment {
    fn read_byte(&self, offset: u16) -> u8 {
        self.memory[offset as usize]
    }

    fn read_bytes(&self, offset: u16, buffer: &mut [u8]) {
        let start = offset as usize;
        buffer.copy_from_slice(&self.memory[start..start + buffer.len()]);
    }
}

impl WriteableAddressSegment for RamSegment {
    fn write_byte(&mut self, offset: u16, value: u8) {
        self.memory[offset as usize] = value;
    }

    fn write_bytes(&mut self, offset: u16, values: &[u8]) {
        let start = offset as usize;
        self.memory[start..start + values.len()].copy_from_slice(values);
    }
}

/// Read-only memory. Bytes past the supplied image read as 0xFF.
pub struct RomSegment {
    address: u16,
    memory: Vec<u8>,
}

impl RomSegment {
    pub fn new(address: u16, length: usize, image: &[u8]) -> Self {
        let mut memory = vec![0xFF; length];
        let len = image.len().min(length);
        memory[..len].copy_from_slice(&image[..len]);
        Self { address, memory }
    }
}

impl AddressSegment for RomSegment {
    fn address(&self) -> u16 {
        self.address
    }

    fn length(&self) -> u32 {
        self.memory.len() as u32
    }
}

impl ReadableAddressSegment for RomSegment {
    fn read_byte(&self, offset: u16) -> u8 {
        self.memory[offset as usize]
    }

    fn read_bytes(&self, offset: u16, buffer: &mut [u8]) {
        let start = offset as usize;
        buffer.copy_from_slice(&self.memory[start..start + buffer.len()]);
    }
}

/// Write-only sink that keeps every byte written to it, e.g. a latch
/// register that reads back as open bus.
pub struct WriteOnlySegment {
    address: u16,
    memory: Vec<u8>,
}

impl WriteOnlySegment {
    pub fn new(address: u16, length: usize) -> Self {
        Self {
            address,
            memory: vec![0; length],
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }
}

impl AddressSegment for WriteOnlySegment {
    fn address(&self) -> u16 {
        self.address
    }

    fn length(&self) -> u32 {
        self.memory.len() as u32
    }
}

impl WriteableAddressSegment for WriteOnlySegment {
    fn write_byte(&mut self, offset: u16, value: u8) {
        self.memory[offset as usize] = value;
    }
}
