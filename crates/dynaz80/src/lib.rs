pub mod alu;
pub mod cache;
pub mod config;
pub mod dynarec;
pub mod engine;
pub mod error;
pub mod flags;
pub mod interrupts;
pub mod mmu;
pub mod peripherals;
pub mod prefetch;
pub mod registers;
pub mod timing;

pub use cache::{BlockCache, CacheStats};
pub use config::{CoreConfig, CpuMode, ExecutionStrategy, InitialState};
pub use dynarec::{BlockTiming, CompiledBlock, DynaRec, ExecutionContext};
pub use engine::{Core, StopReason};
pub use error::{ConfigError, CoreError, DecodeError, OpcodePrefix};
pub use flags::{FlagLayout, Flags};
pub use interrupts::{InterruptManager, InterruptPhase};
pub use mmu::{
    AddressSegment, RamSegment, ReadWriteAddressSegment, ReadableAddressSegment, RomSegment,
    Segment, SegmentCapability, SegmentMmu, WriteOnlySegment, WriteableAddressSegment,
};
pub use peripherals::{NoPeripherals, PeripheralManager};
pub use registers::{InterruptMode, Registers};
pub use timing::{InstructionTimings, InstructionTimingsSync};
