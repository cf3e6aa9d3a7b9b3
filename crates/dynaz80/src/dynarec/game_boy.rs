//! LR35902 unprefixed opcodes.
//!
//! The table follows the Z80 layout where the two agree. Z80-only opcodes
//! (EX, EXX, DJNZ, port I/O, the ED/DD/FD prefixes and the parity/sign
//! conditions) are replaced or undefined.

use crate::alu;
use crate::error::{DecodeError, OpcodePrefix};
use crate::flags::Flags;

use super::emit::{self, AluOp};
use super::operand::{Condition, Operand8, Reg16, Reg8};
use super::primary::plain_register;
use super::{DecodeState, Decoder};

impl Decoder<'_> {
    pub(super) fn decode_game_boy(&mut self, opcode: u8) -> Result<DecodeState, DecodeError> {
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let p = y >> 1;

        match opcode {
            // NOP
            0x00 => self.cost_m(1),

            // LD rr,nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.next_word();
                self.emit(emit::load16(self.pair(p), value));
                self.cost_m(3);
            }

            // LD (BC),A / LD (DE),A / LD (HL+),A / LD (HL-),A
            0x02 | 0x12 => {
                let pointer = if opcode == 0x02 { Reg16::Bc } else { Reg16::De };
                self.emit(emit::load8(Operand8::Indirect(pointer), Operand8::Register(Reg8::A)));
                self.cost_m(2);
            }
            0x22 | 0x32 => {
                let step = if opcode == 0x22 { 1 } else { -1 };
                self.emit(emit::load8_post_step(
                    Operand8::Indirect(Reg16::Hl),
                    Operand8::Register(Reg8::A),
                    step,
                ));
                self.cost_m(2);
            }

            // LD A,(BC) / LD A,(DE) / LD A,(HL+) / LD A,(HL-)
            0x0A | 0x1A => {
                let pointer = if opcode == 0x0A { Reg16::Bc } else { Reg16::De };
                self.emit(emit::load8(Operand8::Register(Reg8::A), Operand8::Indirect(pointer)));
                self.cost_m(2);
            }
            0x2A | 0x3A => {
                let step = if opcode == 0x2A { 1 } else { -1 };
                self.emit(emit::load8_post_step(
                    Operand8::Register(Reg8::A),
                    Operand8::Indirect(Reg16::Hl),
                    step,
                ));
                self.cost_m(2);
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.emit(emit::increment16(self.pair(p)));
                self.cost_m(2);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.emit(emit::decrement16(self.pair(p)));
                self.cost_m(2);
            }

            // INC r / DEC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let operand = plain_register(y);
                self.emit(emit::increment8(operand));
                self.cost_m(if operand.is_memory() { 3 } else { 1 });
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let operand = plain_register(y);
                self.emit(emit::decrement8(operand));
                self.cost_m(if operand.is_memory() { 3 } else { 1 });
            }

            // LD r,n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let destination = plain_register(y);
                let value = self.next_byte();
                self.emit(emit::load8(destination, Operand8::Immediate(value)));
                self.cost_m(if destination.is_memory() { 3 } else { 2 });
            }

            // RLCA / RRCA / RLA / RRA
            0x07 | 0x0F | 0x17 | 0x1F => {
                let rotate: fn(&mut Flags, u8) -> u8 = match opcode {
                    0x07 => alu::rotate_left,
                    0x0F => alu::rotate_right,
                    0x17 => alu::rotate_left_through_carry,
                    _ => alu::rotate_right_through_carry,
                };
                self.emit(emit::rotate_accumulator(rotate, self.mode));
                self.cost_m(1);
            }

            // LD (nn),SP
            0x08 => {
                let address = self.next_word();
                self.emit(emit::store16(address, Reg16::Sp));
                self.cost_m(5);
            }

            // ADD HL,rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.emit(emit::add16(Reg16::Hl, self.pair(p)));
                self.cost_m(2);
            }

            // STOP. The second byte is part of the instruction.
            0x10 => {
                self.next_byte();
                self.emit(emit::halt());
                self.cost_m(1);
                return Ok(DecodeState::FinalizeAndSync);
            }

            // JR e
            0x18 => {
                let target = self.relative_target();
                self.emit(emit::jump(target));
                self.cost_m(3);
                return Ok(DecodeState::Finalize);
            }

            // JR cc,e
            0x20 | 0x28 | 0x30 | 0x38 => {
                let target = self.relative_target();
                let next = self.next_address();
                let taken = self.extra(1, 4);
                self.emit(emit::jump_if(Condition::from_code(y - 4), target, next, taken));
                self.cost_m(2);
                return Ok(DecodeState::Finalize);
            }

            // DAA / CPL / SCF / CCF
            0x27 => {
                self.emit(emit::decimal_adjust(self.mode));
                self.cost_m(1);
            }
            0x2F => {
                self.emit(emit::complement());
                self.cost_m(1);
            }
            0x37 => {
                self.emit(emit::set_carry_flag());
                self.cost_m(1);
            }
            0x3F => {
                self.emit(emit::invert_carry_flag(self.mode));
                self.cost_m(1);
            }

            // HALT
            0x76 => {
                self.emit(emit::halt());
                self.cost_m(1);
                return Ok(DecodeState::FinalizeAndSync);
            }

            // LD r,r'
            0x40..=0x7F => {
                let destination = plain_register(y);
                let source = plain_register(z);
                self.emit(emit::load8(destination, source));
                let memory = destination.is_memory() || source.is_memory();
                self.cost_m(if memory { 2 } else { 1 });
            }

            // ALU A,r
            0x80..=0xBF => {
                let source = plain_register(z);
                self.emit(emit::alu8(AluOp::from_code(y), source));
                self.cost_m(if source.is_memory() { 2 } else { 1 });
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                let next = self.next_address();
                let taken = self.extra(3, 12);
                self.emit(emit::ret_if(Condition::from_code(y), next, taken));
                self.cost_m(2);
                return Ok(DecodeState::Finalize);
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                self.emit(emit::pop(self.stack_pair(p)));
                self.cost_m(3);
            }

            // JP cc,nn
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let target = self.next_word();
                let next = self.next_address();
                let taken = self.extra(1, 4);
                self.emit(emit::jump_if(Condition::from_code(y), target, next, taken));
                self.cost_m(3);
                return Ok(DecodeState::Finalize);
            }

            // JP nn
            0xC3 => {
                let target = self.next_word();
                self.emit(emit::jump(target));
                self.cost_m(4);
                return Ok(DecodeState::Finalize);
            }

            // CALL cc,nn
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let target = self.next_word();
                let next = self.next_address();
                let taken = self.extra(3, 12);
                self.emit(emit::call_if(Condition::from_code(y), target, next, taken));
                self.cost_m(3);
                return Ok(DecodeState::Finalize);
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.emit(emit::push(self.stack_pair(p)));
                self.cost_m(4);
            }

            // ALU A,n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.next_byte();
                self.emit(emit::alu8(AluOp::from_code(y), Operand8::Immediate(value)));
                self.cost_m(2);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let next = self.next_address();
                self.emit(emit::call(u16::from(y) * 8, next));
                self.cost_m(4);
                return Ok(DecodeState::Finalize);
            }

            // RET / RETI
            0xC9 => {
                self.emit(emit::ret());
                self.cost_m(4);
                return Ok(DecodeState::Finalize);
            }
            0xD9 => {
                self.emit(emit::return_enabling_interrupts());
                self.cost_m(4);
                return Ok(DecodeState::Finalize);
            }

            0xCB => return self.decode_bit_prefix(),

            // CALL nn
            0xCD => {
                let target = self.next_word();
                let next = self.next_address();
                self.emit(emit::call(target, next));
                self.cost_m(6);
                return Ok(DecodeState::Finalize);
            }

            // LDH (n),A / LDH A,(n)
            0xE0 => {
                let offset = self.next_byte();
                self.emit(emit::load8(Operand8::HighPage(offset), Operand8::Register(Reg8::A)));
                self.cost_m(3);
            }
            0xF0 => {
                let offset = self.next_byte();
                self.emit(emit::load8(Operand8::Register(Reg8::A), Operand8::HighPage(offset)));
                self.cost_m(3);
            }

            // LD (C),A / LD A,(C)
            0xE2 => {
                self.emit(emit::load8(Operand8::HighPageC, Operand8::Register(Reg8::A)));
                self.cost_m(2);
            }
            0xF2 => {
                self.emit(emit::load8(Operand8::Register(Reg8::A), Operand8::HighPageC));
                self.cost_m(2);
            }

            // ADD SP,e
            0xE8 => {
                let offset = self.next_displacement();
                self.emit(emit::add_stack_offset(offset));
                self.cost_m(4);
            }

            // JP (HL)
            0xE9 => {
                self.emit(emit::jump_to_register(Reg16::Hl));
                self.cost_m(1);
                return Ok(DecodeState::Finalize);
            }

            // LD (nn),A / LD A,(nn)
            0xEA => {
                let address = self.next_word();
                self.emit(emit::load8(Operand8::Absolute(address), Operand8::Register(Reg8::A)));
                self.cost_m(4);
            }
            0xFA => {
                let address = self.next_word();
                self.emit(emit::load8(Operand8::Register(Reg8::A), Operand8::Absolute(address)));
                self.cost_m(4);
            }

            // DI / EI
            0xF3 | 0xFB => {
                self.emit(emit::set_interrupts_enabled(opcode == 0xFB));
                self.cost_m(1);
            }

            // LD HL,SP+e
            0xF8 => {
                let offset = self.next_displacement();
                self.emit(emit::load_hl_stack_offset(offset));
                self.cost_m(3);
            }

            // LD SP,HL
            0xF9 => {
                self.emit(emit::copy16(Reg16::Sp, Reg16::Hl));
                self.cost_m(2);
            }

            _ => return Err(self.unsupported(OpcodePrefix::None, opcode)),
        }

        Ok(DecodeState::Continue)
    }
}
