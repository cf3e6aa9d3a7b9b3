//! Segmented memory management.
//!
//! The 16-bit address space is carved into host-supplied segments that must
//! cover `[0, 0x10000)` exactly once. Accesses are routed to the owning
//! segment by binary search; accesses that straddle a boundary are split
//! into per-segment pieces and wrap from 0xFFFF to 0x0000.

use log::{debug, trace};

use crate::error::ConfigError;

pub mod segment;

pub use segment::{
    AddressSegment, RamSegment, ReadWriteAddressSegment, ReadableAddressSegment, RomSegment,
    Segment, SegmentCapability, WriteOnlySegment, WriteableAddressSegment,
};

const ADDRESS_SPACE: u32 = 0x1_0000;

/// Called with `(address, length)` after every write.
pub type WriteListener = Box<dyn FnMut(u16, usize) + Send>;

pub struct SegmentMmu {
    segments: Vec<Segment>,
    listeners: Vec<WriteListener>,
}

impl SegmentMmu {
    /// Validate and sort `segments`.
    ///
    /// Fails if the list is empty, a segment has zero length or runs past
    /// 0xFFFF, or the sorted segments leave a gap or overlap anywhere in the
    /// address space.
    pub fn new(mut segments: Vec<Segment>) -> Result<Self, ConfigError> {
        if segments.is_empty() {
            return Err(ConfigError::EmptySegmentList);
        }

        for segment in &segments {
            if segment.length() == 0 {
                return Err(ConfigError::ZeroLengthSegment {
                    address: segment.address(),
                });
            }
            if segment.end() > ADDRESS_SPACE {
                return Err(ConfigError::SegmentOutOfRange {
                    address: segment.address(),
                    length: segment.length(),
                });
            }
        }

        segments.sort_by_key(Segment::address);

        let mut covered = 0u32;
        for segment in &segments {
            let start = u32::from(segment.address());
            if start > covered {
                return Err(ConfigError::SegmentGap {
                    from: covered,
                    to: start,
                });
            }
            if start < covered {
                return Err(ConfigError::SegmentOverlap {
                    from: start,
                    to: covered.min(segment.end()),
                });
            }
            covered = segment.end();
        }
        if covered < ADDRESS_SPACE {
            return Err(ConfigError::SegmentGap {
                from: covered,
                to: ADDRESS_SPACE,
            });
        }

        for segment in &segments {
            debug!(
                "MMU: [{:#06X}, {:#07X}) {:?}",
                segment.address(),
                segment.end(),
                segment.capability()
            );
        }

        Ok(Self {
            segments,
            listeners: Vec::new(),
        })
    }

    /// Register a write listener. Listeners run synchronously, in
    /// subscription order, inside the writing call.
    pub fn subscribe(&mut self, listener: impl FnMut(u16, usize) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Index of the segment owning `address`. Coverage of the whole space is
    /// guaranteed by construction.
    #[inline]
    fn index_of(&self, address: u16) -> usize {
        self.segments
            .partition_point(|s| s.address() <= address)
            .saturating_sub(1)
    }

    /// Segment index, local offset and bytes left in that segment.
    #[inline]
    fn locate(&self, address: u16) -> (usize, u16, usize) {
        let index = self.index_of(address);
        let segment = &self.segments[index];
        let offset = address - segment.address();
        let available = (segment.end() - u32::from(address)) as usize;
        (index, offset, available)
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        let (index, offset, _) = self.locate(address);
        self.segments[index].read_byte(offset).unwrap_or_else(|| {
            trace!("MMU: read from write-only address {address:#06X}");
            0xFF
        })
    }

    /// Little-endian word. A word at a segment boundary takes its low byte
    /// from one segment and its high byte from the next.
    pub fn read_word(&self, address: u16) -> u16 {
        let (index, offset, available) = self.locate(address);
        if available >= 2 {
            if let Some(word) = self.segments[index].read_word(offset) {
                return word;
            }
            trace!("MMU: read from write-only address {address:#06X}");
            return 0xFFFF;
        }
        let mut bytes = [0u8; 2];
        self.read_bytes(address, &mut bytes);
        u16::from_le_bytes(bytes)
    }

    /// Fill `buffer` from consecutive addresses starting at `address`.
    pub fn read_bytes(&self, address: u16, buffer: &mut [u8]) {
        let mut cursor = address;
        let mut done = 0;
        while done < buffer.len() {
            let (index, offset, available) = self.locate(cursor);
            let chunk = available.min(buffer.len() - done);
            let piece = &mut buffer[done..done + chunk];
            if !self.segments[index].read_bytes(offset, piece) {
                trace!("MMU: read from write-only range at {cursor:#06X}");
                piece.fill(0xFF);
            }
            done += chunk;
            cursor = cursor.wrapping_add(chunk as u16);
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        let (index, offset, _) = self.locate(address);
        if !self.segments[index].write_byte(offset, value) {
            trace!("MMU: ignored write of {value:#04X} to read-only address {address:#06X}");
        }
        self.notify(address, 1);
    }

    pub fn write_word(&mut self, address: u16, value: u16) {
        let (index, offset, available) = self.locate(address);
        if available >= 2 {
            if !self.segments[index].write_word(offset, value) {
                trace!("MMU: ignored write of {value:#06X} to read-only address {address:#06X}");
            }
            self.notify(address, 2);
        } else {
            self.write_bytes(address, &value.to_le_bytes());
        }
    }

    pub fn write_bytes(&mut self, address: u16, values: &[u8]) {
        let mut cursor = address;
        let mut done = 0;
        while done < values.len() {
            let (index, offset, available) = self.locate(cursor);
            let chunk = available.min(values.len() - done);
            if !self.segments[index].write_bytes(offset, &values[done..done + chunk]) {
                trace!("MMU: ignored write to read-only range at {cursor:#06X}");
            }
            done += chunk;
            cursor = cursor.wrapping_add(chunk as u16);
        }
        self.notify(address, values.len());
    }

    /// Copy one byte from `source` to `destination`, as LDI/LDD do.
    pub fn transfer_byte(&mut self, source: u16, destination: u16) -> u8 {
        let value = self.read_byte(source);
        self.write_byte(destination, value);
        value
    }

    fn notify(&mut self, address: u16, length: usize) {
        for listener in &mut self.listeners {
            listener(address, length);
        }
    }
}
