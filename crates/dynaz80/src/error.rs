use std::fmt;

use thiserror::Error;

/// Faults detected while wiring the core together. These abort startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no address segments were supplied")]
    EmptySegmentList,
    #[error("address segment at {address:#06X} has zero length")]
    ZeroLengthSegment { address: u16 },
    #[error("address segment at {address:#06X} with length {length:#X} runs past the end of the address space")]
    SegmentOutOfRange { address: u16, length: u32 },
    #[error("address segments leave a gap at [{from:#06X}, {to:#06X})")]
    SegmentGap { from: u32, to: u32 },
    #[error("address segments overlap at [{from:#06X}, {to:#06X})")]
    SegmentOverlap { from: u32, to: u32 },
}

/// Opcode table that was being consulted when decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodePrefix {
    None,
    Cb,
    Ed,
    Dd,
    Fd,
    DdCb,
    FdCb,
}

impl fmt::Display for OpcodePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpcodePrefix::None => "primary",
            OpcodePrefix::Cb => "CB",
            OpcodePrefix::Ed => "ED",
            OpcodePrefix::Dd => "DD",
            OpcodePrefix::Fd => "FD",
            OpcodePrefix::DdCb => "DDCB",
            OpcodePrefix::FdCb => "FDCB",
        };
        f.write_str(name)
    }
}

/// The opcode tables are incomplete for the byte stream being decoded.
///
/// This is never recoverable: skipping bytes would silently desynchronise
/// the instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported {prefix} opcode 0x{opcode:02X} at 0x{address:04X}")]
    UnsupportedOpcode {
        prefix: OpcodePrefix,
        opcode: u8,
        address: u16,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
