//! Z80 unprefixed opcodes and the DD/FD index prefixes.

use crate::alu;
use crate::error::DecodeError;
use crate::flags::Flags;
use crate::timing::InstructionTimings;

use super::emit::{self, AluOp};
use super::operand::{Condition, Operand8, Reg16, Reg8};
use super::{DecodeState, Decoder, IndexRegister};

impl Decoder<'_> {
    pub(super) fn decode_primary(&mut self, opcode: u8) -> Result<DecodeState, DecodeError> {
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let p = y >> 1;

        match opcode {
            // NOP
            0x00 => self.cost(1, 4),

            // LD rr,nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.next_word();
                let register = self.pair(p);
                self.emit(emit::load16(register, value));
                self.cost(3, 10);
            }

            // LD (BC),A / LD (DE),A
            0x02 | 0x12 => {
                let pointer = if opcode == 0x02 { Reg16::Bc } else { Reg16::De };
                self.emit(emit::load8(Operand8::Indirect(pointer), Operand8::Register(Reg8::A)));
                self.cost(2, 7);
            }

            // LD A,(BC) / LD A,(DE)
            0x0A | 0x1A => {
                let pointer = if opcode == 0x0A { Reg16::Bc } else { Reg16::De };
                self.emit(emit::load8(Operand8::Register(Reg8::A), Operand8::Indirect(pointer)));
                self.cost(2, 7);
            }

            // LD (nn),HL
            0x22 => {
                let address = self.next_word();
                self.emit(emit::store16(address, self.index.pair()));
                self.cost(5, 16);
            }

            // LD HL,(nn)
            0x2A => {
                let address = self.next_word();
                self.emit(emit::load16_from_memory(self.index.pair(), address));
                self.cost(5, 16);
            }

            // LD (nn),A
            0x32 => {
                let address = self.next_word();
                self.emit(emit::load8(Operand8::Absolute(address), Operand8::Register(Reg8::A)));
                self.cost(4, 13);
            }

            // LD A,(nn)
            0x3A => {
                let address = self.next_word();
                self.emit(emit::load8(Operand8::Register(Reg8::A), Operand8::Absolute(address)));
                self.cost(4, 13);
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.emit(emit::increment16(self.pair(p)));
                self.cost(1, 6);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.emit(emit::decrement16(self.pair(p)));
                self.cost(1, 6);
            }

            // INC r / DEC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let operand = self.operand(y);
                self.emit(emit::increment8(operand));
                self.read_modify_write_cost(operand);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let operand = self.operand(y);
                self.emit(emit::decrement8(operand));
                self.read_modify_write_cost(operand);
            }

            // LD r,n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let destination = self.operand(y);
                let value = self.next_byte();
                self.emit(emit::load8(destination, Operand8::Immediate(value)));
                match destination {
                    Operand8::Indexed(..) => self.cost(2, 7),
                    Operand8::Indirect(_) => self.cost(3, 10),
                    _ => self.cost(2, 7),
                }
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
                self.cost(1, 4);
            }

            // EX AF,AF'
            0x08 => {
                self.emit(emit::exchange_af());
                self.cost(1, 4);
            }

            // ADD HL,rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.emit(emit::add16(self.index.pair(), self.pair(p)));
                self.cost(3, 11);
            }

            // DJNZ e
            0x10 => {
                let target = self.relative_target();
                let next = self.next_address();
                let taken = self.extra(1, 5);
                self.emit(emit::decrement_jump_non_zero(target, next, taken));
                self.cost(2, 8);
                return Ok(DecodeState::Finalize);
            }

            // JR e
            0x18 => {
                let target = self.relative_target();
                self.emit(emit::jump(target));
                self.cost(3, 12);
                return Ok(DecodeState::Finalize);
            }

            // JR cc,e
            0x20 | 0x28 | 0x30 | 0x38 => {
                let target = self.relative_target();
                let next = self.next_address();
                let taken = self.extra(1, 5);
                self.emit(emit::jump_if(Condition::from_code(y - 4), target, next, taken));
                self.cost(2, 7);
                return Ok(DecodeState::Finalize);
            }

            // DAA / CPL / SCF / CCF
            0x27 => {
                self.emit(emit::decimal_adjust(self.mode));
                self.cost(1, 4);
            }
            0x2F => {
                self.emit(emit::complement());
                self.cost(1, 4);
            }
            0x37 => {
                self.emit(emit::set_carry_flag());
                self.cost(1, 4);
            }
            0x3F => {
                self.emit(emit::invert_carry_flag(self.mode));
                self.cost(1, 4);
            }

            // HALT
            0x76 => {
                self.emit(emit::halt());
                self.cost(1, 4);
                return Ok(DecodeState::FinalizeAndSync);
            }

            // LD r,r'
            0x40..=0x7F => {
                // With a memory operand the other side is always H or L,
                // never IXH/IXL.
                let (destination, source) = if y == 6 {
                    (self.memory_operand(), plain_register(z))
                } else if z == 6 {
                    (plain_register(y), self.memory_operand())
                } else {
                    (self.operand(y), self.operand(z))
                };
                self.emit(emit::load8(destination, source));
                if destination.is_memory() || source.is_memory() {
                    self.cost(2, 7);
                } else {
                    self.cost(1, 4);
                }
            }

            // ALU A,r
            0x80..=0xBF => {
                let source = self.operand(z);
                self.emit(emit::alu8(AluOp::from_code(y), source));
                if source.is_memory() {
                    self.cost(2, 7);
                } else {
                    self.cost(1, 4);
                }
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                let next = self.next_address();
                let taken = self.extra(2, 6);
                self.emit(emit::ret_if(Condition::from_code(y), next, taken));
                self.cost(1, 5);
                return Ok(DecodeState::Finalize);
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                self.emit(emit::pop(self.stack_pair(p)));
                self.cost(3, 10);
            }

            // JP cc,nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let target = self.next_word();
                let next = self.next_address();
                let taken = InstructionTimings::default();
                self.emit(emit::jump_if(Condition::from_code(y), target, next, taken));
                self.cost(3, 10);
                return Ok(DecodeState::Finalize);
            }

            // JP nn
            0xC3 => {
                let target = self.next_word();
                self.emit(emit::jump(target));
                self.cost(3, 10);
                return Ok(DecodeState::Finalize);
            }

            // CALL cc,nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let target = self.next_word();
                let next = self.next_address();
                let taken = self.extra(2, 7);
                self.emit(emit::call_if(Condition::from_code(y), target, next, taken));
                self.cost(3, 10);
                return Ok(DecodeState::Finalize);
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.emit(emit::push(self.stack_pair(p)));
                self.cost(3, 11);
            }

            // ALU A,n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.next_byte();
                self.emit(emit::alu8(AluOp::from_code(y), Operand8::Immediate(value)));
                self.cost(2, 7);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let next = self.next_address();
                self.emit(emit::call(u16::from(y) * 8, next));
                self.cost(3, 11);
                return Ok(DecodeState::Finalize);
            }

            // RET
            0xC9 => {
                self.emit(emit::ret());
                self.cost(3, 10);
                return Ok(DecodeState::Finalize);
            }

            0xCB => return self.decode_bit_prefix(),

            // CALL nn
            0xCD => {
                let target = self.next_word();
                let next = self.next_address();
                self.emit(emit::call(target, next));
                self.cost(5, 17);
                return Ok(DecodeState::Finalize);
            }

            // OUT (n),A / IN A,(n)
            0xD3 => {
                let port = self.next_byte();
                self.emit(emit::output_immediate(port));
                self.cost(3, 11);
            }
            0xDB => {
                let port = self.next_byte();
                self.emit(emit::input_immediate(port));
                self.cost(3, 11);
            }

            // EXX
            0xD9 => {
                self.emit(emit::exchange_all());
                self.cost(1, 4);
            }

            0xDD | 0xFD => return self.decode_index_prefixes(opcode),

            // EX (SP),HL
            0xE3 => {
                self.emit(emit::exchange_stack_top(self.index.pair()));
                self.cost(5, 19);
            }

            // JP (HL)
            0xE9 => {
                self.emit(emit::jump_to_register(self.index.pair()));
                self.cost(1, 4);
                return Ok(DecodeState::Finalize);
            }

            // EX DE,HL (never substituted)
            0xEB => {
                self.emit(emit::exchange_de_hl());
                self.cost(1, 4);
            }

            0xED => return self.decode_extended(),

            // DI / EI
            0xF3 | 0xFB => {
                self.emit(emit::set_interrupts_enabled(opcode == 0xFB));
                self.cost(1, 4);
            }

            // LD SP,HL
            0xF9 => {
                self.emit(emit::copy16(Reg16::Sp, self.index.pair()));
                self.cost(1, 6);
            }
        }

        Ok(DecodeState::Continue)
    }

    /// DD / FD: the next opcode uses IX / IY in place of HL.
    ///
    /// In a run of prefixes only the last one counts; each costs a NOP.
    /// The byte allowance is checked between prefixes since a run of them
    /// never reaches an instruction boundary.
    fn decode_index_prefixes(&mut self, mut prefix: u8) -> Result<DecodeState, DecodeError> {
        loop {
            self.index = if prefix == 0xDD {
                IndexRegister::Ix
            } else {
                IndexRegister::Iy
            };
            self.cost(1, 4);
            if self.prefetch.limit_reached() {
                return Ok(DecodeState::FinalizeAndSync);
            }
            match self.next_byte() {
                next @ (0xDD | 0xFD) => prefix = next,
                next => return self.decode_primary(next),
            }
        }
    }

    /// `rp` table: BC, DE, HL (or the index register), SP.
    pub(super) fn pair(&self, code: u8) -> Reg16 {
        match code & 0x03 {
            0 => Reg16::Bc,
            1 => Reg16::De,
            2 => self.index.pair(),
            _ => Reg16::Sp,
        }
    }

    /// `rp2` table for PUSH/POP: AF replaces SP.
    pub(super) fn stack_pair(&self, code: u8) -> Reg16 {
        match code & 0x03 {
            3 => Reg16::Af,
            _ => self.pair(code),
        }
    }

    /// 8-bit operand for a 3-bit field, with H, L and (HL) replaced under
    /// an index prefix. Reads the displacement for `(IX+d)`.
    pub(super) fn operand(&mut self, code: u8) -> Operand8 {
        match code & 0x07 {
            4 => Operand8::Register(self.index.high()),
            5 => Operand8::Register(self.index.low()),
            6 => self.memory_operand(),
            other => plain_register(other),
        }
    }

    /// `(HL)`, or `(IX+d)` / `(IY+d)` whose displacement fetch and address
    /// calculation cost two M-cycles.
    pub(super) fn memory_operand(&mut self) -> Operand8 {
        match self.index {
            IndexRegister::Hl => Operand8::Indirect(Reg16::Hl),
            IndexRegister::Ix | IndexRegister::Iy => {
                let displacement = self.next_displacement();
                self.cost(2, 8);
                Operand8::Indexed(self.index.pair(), displacement)
            }
        }
    }

    fn read_modify_write_cost(&mut self, operand: Operand8) {
        if operand.is_memory() {
            self.cost(3, 11);
        } else {
            self.cost(1, 4);
        }
    }
}

/// Register for a 3-bit field without index substitution; `6` is `(HL)`.
pub(super) fn plain_register(code: u8) -> Operand8 {
    match Reg8::from_code(code) {
        Some(register) => Operand8::Register(register),
        None => Operand8::Indirect(Reg16::Hl),
    }
}
