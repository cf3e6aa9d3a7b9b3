use std::mem;

use crate::mmu::SegmentMmu;
use crate::peripherals::PeripheralManager;
use crate::registers::Registers;
use crate::timing::InstructionTimings;

/// Machine state a compiled block runs against.
pub struct ExecutionContext<'a> {
    pub registers: &'a mut Registers,
    pub mmu: &'a mut SegmentMmu,
    pub peripherals: &'a mut dyn PeripheralManager,
    extra: InstructionTimings,
    halted: bool,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        registers: &'a mut Registers,
        mmu: &'a mut SegmentMmu,
        peripherals: &'a mut dyn PeripheralManager,
    ) -> Self {
        Self {
            registers,
            mmu,
            peripherals,
            extra: InstructionTimings::default(),
            halted: false,
        }
    }

    /// True once the block executed HALT (or STOP).
    #[inline]
    pub fn halted(&self) -> bool {
        self.halted
    }

    #[inline]
    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    /// Cost that depends on run-time state: taken branches, repeat loops.
    #[inline]
    pub(crate) fn add_timing(&mut self, timings: InstructionTimings) {
        self.extra += timings;
    }

    #[inline]
    pub(crate) fn take_extra_timing(&mut self) -> InstructionTimings {
        mem::take(&mut self.extra)
    }

    pub fn push_word(&mut self, value: u16) {
        self.registers.sp = self.registers.sp.wrapping_sub(2);
        self.mmu.write_word(self.registers.sp, value);
    }

    pub fn pop_word(&mut self) -> u16 {
        let value = self.mmu.read_word(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(2);
        value
    }
}
