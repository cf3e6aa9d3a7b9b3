//! Dynamic recompiler.
//!
//! A block is decoded once into a list of closures that capture everything
//! known at decode time (operands, immediates, branch targets, ALU
//! routines). The closures are folded into a single callable together with
//! the block epilogue, so re-executing a cached block costs no decoding.

use log::trace;

use crate::config::CpuMode;
use crate::error::{DecodeError, OpcodePrefix};
use crate::mmu::SegmentMmu;
use crate::prefetch::Prefetch;
use crate::timing::InstructionTimings;

mod block;
mod cb;
mod context;
mod ed;
mod emit;
mod game_boy;
mod operand;
mod primary;

pub use block::{BlockTiming, CompiledBlock, Operation};
pub use context::ExecutionContext;
pub use operand::{Condition, Operand8, Reg16, Reg8};

/// What the decoder does after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DecodeState {
    Continue,
    /// The instruction set PC itself; stop decoding.
    Finalize,
    /// Stop decoding and move PC past the last byte decoded.
    FinalizeAndSync,
}

/// Register standing in for HL in the current instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum IndexRegister {
    #[default]
    Hl,
    Ix,
    Iy,
}

impl IndexRegister {
    pub(crate) fn pair(self) -> Reg16 {
        match self {
            IndexRegister::Hl => Reg16::Hl,
            IndexRegister::Ix => Reg16::Ix,
            IndexRegister::Iy => Reg16::Iy,
        }
    }

    pub(crate) fn high(self) -> Reg8 {
        match self {
            IndexRegister::Hl => Reg8::H,
            IndexRegister::Ix => Reg8::Ixh,
            IndexRegister::Iy => Reg8::Iyh,
        }
    }

    pub(crate) fn low(self) -> Reg8 {
        match self {
            IndexRegister::Hl => Reg8::L,
            IndexRegister::Ix => Reg8::Ixl,
            IndexRegister::Iy => Reg8::Iyl,
        }
    }
}

/// Translates machine code into [`CompiledBlock`]s for one CPU mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynaRec {
    mode: CpuMode,
}

impl DynaRec {
    pub fn new(mode: CpuMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CpuMode {
        self.mode
    }

    /// Decode the block starting at `address`.
    ///
    /// Decoding stops after a control transfer, a HALT, or once the block
    /// has consumed 65535 bytes.
    pub fn compile(&self, mmu: &SegmentMmu, address: u16) -> Result<CompiledBlock, DecodeError> {
        let mut decoder = Decoder::new(Prefetch::new(mmu, address), self.mode);
        let sync_pc = loop {
            match decoder.decode_instruction()? {
                DecodeState::Continue if decoder.prefetch.limit_reached() => break true,
                DecodeState::Continue => {}
                DecodeState::Finalize => break false,
                DecodeState::FinalizeAndSync => break true,
            }
        };
        let block = decoder.finish(sync_pc);
        trace!(
            "compiled block at {:#06X}: {} bytes, {:?}",
            block.address(),
            block.length(),
            block.timing()
        );
        Ok(block)
    }
}

/// Per-block decoding state.
pub(crate) struct Decoder<'m> {
    prefetch: Prefetch<'m>,
    mode: CpuMode,
    operations: Vec<Operation>,
    timings: InstructionTimings,
    dynamic: bool,
    index: IndexRegister,
    instruction_address: u16,
}

impl<'m> Decoder<'m> {
    fn new(prefetch: Prefetch<'m>, mode: CpuMode) -> Self {
        Self {
            instruction_address: prefetch.start(),
            prefetch,
            mode,
            operations: Vec::new(),
            timings: InstructionTimings::default(),
            dynamic: false,
            index: IndexRegister::Hl,
        }
    }

    fn decode_instruction(&mut self) -> Result<DecodeState, DecodeError> {
        self.instruction_address = self.prefetch.address();
        self.index = IndexRegister::Hl;
        let opcode = self.prefetch.next_byte();
        match self.mode {
            CpuMode::Z80 => self.decode_primary(opcode),
            CpuMode::GameBoy => self.decode_game_boy(opcode),
        }
    }

    fn finish(self, sync_pc: bool) -> CompiledBlock {
        let timing = if self.dynamic {
            BlockTiming::Dynamic(self.timings)
        } else {
            BlockTiming::Static(self.timings)
        };
        CompiledBlock::finalize(
            self.prefetch.start(),
            self.prefetch.total_bytes_read(),
            self.operations,
            timing,
            sync_pc,
        )
    }

    #[inline]
    fn emit(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Add a fixed cost in M-cycles and T-states.
    #[inline]
    fn cost(&mut self, machine_cycles: u32, clock_cycles: u32) {
        self.timings.add_cycles(machine_cycles, clock_cycles);
    }

    /// Fixed cost on the LR35902, where every M-cycle is four T-states.
    #[inline]
    fn cost_m(&mut self, machine_cycles: u32) {
        self.cost(machine_cycles, machine_cycles * 4);
    }

    /// Extra cost an operation may add at run time.
    #[inline]
    fn extra(&mut self, machine_cycles: u32, clock_cycles: u32) -> InstructionTimings {
        self.dynamic = true;
        InstructionTimings::new(machine_cycles, clock_cycles)
    }

    #[inline]
    fn next_byte(&mut self) -> u8 {
        self.prefetch.next_byte()
    }

    #[inline]
    fn next_word(&mut self) -> u16 {
        self.prefetch.next_word()
    }

    /// Signed displacement or relative jump offset.
    #[inline]
    fn next_displacement(&mut self) -> i8 {
        self.prefetch.next_signed_byte()
    }

    /// Address of the instruction after the one being decoded.
    #[inline]
    fn next_address(&self) -> u16 {
        self.prefetch.address()
    }

    /// Bytes decoded in this block so far.
    #[inline]
    fn consumed(&self) -> u32 {
        self.prefetch.total_bytes_read()
    }

    /// Target of a relative jump whose displacement was just read.
    #[inline]
    fn relative_target(&mut self) -> u16 {
        let displacement = self.next_displacement();
        self.next_address().wrapping_add(displacement as i16 as u16)
    }

    fn unsupported(&self, prefix: OpcodePrefix, opcode: u8) -> DecodeError {
        DecodeError::UnsupportedOpcode {
            prefix,
            opcode,
            address: self.instruction_address,
        }
    }
}
