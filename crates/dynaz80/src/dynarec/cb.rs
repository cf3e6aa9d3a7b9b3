//! CB-prefixed bit operations, including the DDCB/FDCB indexed forms.

use crate::config::CpuMode;
use crate::error::DecodeError;

use super::emit;
use super::operand::{Operand8, Reg8};
use super::primary::plain_register;
use super::{DecodeState, Decoder, IndexRegister};

impl Decoder<'_> {
    pub(super) fn decode_bit_prefix(&mut self) -> Result<DecodeState, DecodeError> {
        match self.index {
            IndexRegister::Hl => {
                let opcode = self.next_byte();
                self.decode_bit(opcode);
            }
            IndexRegister::Ix | IndexRegister::Iy => self.decode_indexed_bit(),
        }
        Ok(DecodeState::Continue)
    }

    fn decode_bit(&mut self, opcode: u8) {
        let y = (opcode >> 3) & 0x07;
        let operand = plain_register(opcode);
        let memory = operand.is_memory();

        match opcode >> 6 {
            0 => {
                let shift = emit::shift_function(y, self.mode);
                self.emit(emit::modify8(operand, shift));
                if memory {
                    self.bit_cost(4, 15);
                } else {
                    self.bit_cost(2, 8);
                }
            }
            1 => {
                self.emit(emit::bit_test(y, operand));
                if memory {
                    self.bit_cost(3, 12);
                } else {
                    self.bit_cost(2, 8);
                }
            }
            x => {
                self.emit(emit::bit_assign(y, x == 3, operand, None));
                if memory {
                    self.bit_cost(4, 15);
                } else {
                    self.bit_cost(2, 8);
                }
            }
        }
    }

    /// `DD CB d op` / `FD CB d op`: the displacement comes before the
    /// opcode. Register fields other than 6 receive a copy of the result.
    fn decode_indexed_bit(&mut self) {
        let displacement = self.next_displacement();
        let opcode = self.next_byte();
        let y = (opcode >> 3) & 0x07;
        let operand = Operand8::Indexed(self.index.pair(), displacement);
        let copy = Reg8::from_code(opcode);

        match opcode >> 6 {
            0 => {
                let shift = emit::shift_function(y, self.mode);
                match copy {
                    Some(register) => self.emit(emit::modify8_and_copy(operand, shift, register)),
                    None => self.emit(emit::modify8(operand, shift)),
                }
                self.cost(5, 19);
            }
            1 => {
                self.emit(emit::bit_test(y, operand));
                self.cost(4, 16);
            }
            x => {
                self.emit(emit::bit_assign(y, x == 3, operand, copy));
                self.cost(5, 19);
            }
        }
    }

    /// CB costs include the prefix byte. LR35902 T-states are always four
    /// per M-cycle.
    fn bit_cost(&mut self, machine_cycles: u32, clock_cycles: u32) {
        match self.mode {
            CpuMode::Z80 => self.cost(machine_cycles, clock_cycles),
            CpuMode::GameBoy => self.cost_m(machine_cycles),
        }
    }
}
