use crate::mmu::SegmentMmu;

/// Most bytes a single block may consume before decoding is cut short.
pub const MAX_BLOCK_BYTES: u32 = 0xFFFF;

/// Forward-only reader over the MMU used while decoding a block.
pub struct Prefetch<'a> {
    mmu: &'a SegmentMmu,
    start: u16,
    offset: u32,
}

impl<'a> Prefetch<'a> {
    pub fn new(mmu: &'a SegmentMmu, start: u16) -> Self {
        Self {
            mmu,
            start,
            offset: 0,
        }
    }

    /// Address of the next byte to be read.
    #[inline]
    pub fn address(&self) -> u16 {
        self.start.wrapping_add(self.offset as u16)
    }

    #[inline]
    pub fn start(&self) -> u16 {
        self.start
    }

    #[inline]
    pub fn total_bytes_read(&self) -> u32 {
        self.offset
    }

    /// True once the block has consumed its byte allowance.
    #[inline]
    pub fn limit_reached(&self) -> bool {
        self.offset >= MAX_BLOCK_BYTES
    }

    pub fn next_byte(&mut self) -> u8 {
        let value = self.mmu.read_byte(self.address());
        self.offset += 1;
        value
    }

    pub fn next_signed_byte(&mut self) -> i8 {
        self.next_byte() as i8
    }

    pub fn next_word(&mut self) -> u16 {
        let value = self.mmu.read_word(self.address());
        self.offset += 2;
        value
    }

    pub fn next_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.mmu.read_bytes(self.address(), &mut bytes);
        self.offset += N as u32;
        bytes
    }
}
