//! ED-prefixed opcodes.

use crate::error::{DecodeError, OpcodePrefix};
use crate::registers::InterruptMode;

use super::emit;
use super::operand::Reg8;
use super::{DecodeState, Decoder, IndexRegister};

impl Decoder<'_> {
    /// An index prefix in front of ED is spent without effect.
    pub(super) fn decode_extended(&mut self) -> Result<DecodeState, DecodeError> {
        self.index = IndexRegister::Hl;
        let opcode = self.next_byte();
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let p = y >> 1;
        let q = y & 0x01;

        match opcode {
            0x40..=0x7F => match z {
                // IN r,(C) / IN (C)
                0 => {
                    self.emit(emit::input_register(Reg8::from_code(y)));
                    self.cost(3, 12);
                }
                // OUT (C),r / OUT (C),0
                1 => {
                    self.emit(emit::output_register(Reg8::from_code(y)));
                    self.cost(3, 12);
                }
                // SBC HL,rr / ADC HL,rr
                2 => {
                    let source = self.pair(p);
                    if q == 0 {
                        self.emit(emit::subtract16_with_carry(source));
                    } else {
                        self.emit(emit::add16_with_carry(source));
                    }
                    self.cost(4, 15);
                }
                // LD (nn),rr / LD rr,(nn)
                3 => {
                    let address = self.next_word();
                    let register = self.pair(p);
                    if q == 0 {
                        self.emit(emit::store16(address, register));
                    } else {
                        self.emit(emit::load16_from_memory(register, address));
                    }
                    self.cost(6, 20);
                }
                // NEG and its mirrors
                4 => {
                    self.emit(emit::negate());
                    self.cost(2, 8);
                }
                // RETN / RETI and mirrors
                5 => {
                    self.emit(emit::return_from_interrupt());
                    self.cost(4, 14);
                    return Ok(DecodeState::Finalize);
                }
                // IM 0/1/2 and mirrors
                6 => {
                    let mode = match y & 0x03 {
                        0 | 1 => InterruptMode::Im0,
                        2 => InterruptMode::Im1,
                        _ => InterruptMode::Im2,
                    };
                    self.emit(emit::set_interrupt_mode(mode));
                    self.cost(2, 8);
                }
                _ => match y {
                    0 => {
                        self.emit(emit::load_i_from_a());
                        self.cost(2, 9);
                    }
                    1 => {
                        let consumed = self.consumed();
                        self.emit(emit::load_r_from_a(consumed));
                        self.cost(2, 9);
                    }
                    2 => {
                        self.emit(emit::load_a_from_i());
                        self.cost(2, 9);
                    }
                    3 => {
                        let consumed = self.consumed();
                        self.emit(emit::load_a_from_r(consumed));
                        self.cost(2, 9);
                    }
                    4 => {
                        self.emit(emit::rotate_right_digit());
                        self.cost(5, 18);
                    }
                    5 => {
                        self.emit(emit::rotate_left_digit());
                        self.cost(5, 18);
                    }
                    _ => return Err(self.unsupported(OpcodePrefix::Ed, opcode)),
                },
            },

            // Block transfer, compare and I/O. y selects the direction and
            // whether the instruction repeats, z the kind.
            0xA0..=0xA3 | 0xA8..=0xAB | 0xB0..=0xB3 | 0xB8..=0xBB => {
                let step = if y & 0x01 == 0 { 1 } else { -1 };
                let repeat = y >= 6;
                let operation = match z {
                    0 => emit::block_load(step, repeat),
                    1 => emit::block_compare(step, repeat),
                    2 => emit::block_input(step, repeat),
                    _ => emit::block_output(step, repeat),
                };
                self.emit(operation);
                self.cost(4, 16);
                if repeat {
                    // Repeating forms end the block so code they overwrite
                    // is decoded again.
                    self.dynamic = true;
                    let next = self.next_address();
                    self.emit(emit::jump(next));
                    return Ok(DecodeState::Finalize);
                }
            }

            _ => return Err(self.unsupported(OpcodePrefix::Ed, opcode)),
        }

        Ok(DecodeState::Continue)
    }
}
