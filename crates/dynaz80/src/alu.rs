//! Arithmetic and logic operations.
//!
//! Every operation is a total function over its operands: it returns the
//! wrapped result and updates `flags` as the hardware would. Flags that an
//! instruction leaves unaffected are not touched here either.

use crate::flags::Flags;

#[inline]
fn half_carry_add(a: u8, b: u8, carry: u8) -> bool {
    (a & 0x0F) + (b & 0x0F) + carry > 0x0F
}

#[inline]
fn half_carry_sub(a: u8, b: u8, carry: u8) -> bool {
    (a & 0x0F) < (b & 0x0F) + carry
}

/// 8-bit increment used by `INC r` and `INC (HL)`. Carry is unaffected.
pub fn increment(flags: &mut Flags, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    flags.set_half_carry(value & 0x0F == 0x0F);
    flags.set_result_flags(result);
    flags.set_parity_overflow(value == 0x7F);
    flags.set_subtract(false);
    result
}

/// 8-bit decrement used by `DEC r` and `DEC (HL)`. Carry is unaffected.
pub fn decrement(flags: &mut Flags, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    flags.set_half_carry(value & 0x0F == 0x00);
    flags.set_result_flags(result);
    flags.set_parity_overflow(value == 0x80);
    flags.set_subtract(true);
    result
}

fn add8(flags: &mut Flags, a: u8, b: u8, carry_in: bool) -> u8 {
    let carry = u8::from(carry_in);
    let full = u16::from(a) + u16::from(b) + u16::from(carry);
    let result = full as u8;

    flags.set_result_flags(result);
    flags.set_half_carry(half_carry_add(a, b, carry));
    flags.set_parity_overflow((a ^ b) & 0x80 == 0 && (a ^ result) & 0x80 != 0);
    flags.set_subtract(false);
    flags.set_carry(full > 0xFF);
    result
}

fn sub8(flags: &mut Flags, a: u8, b: u8, carry_in: bool) -> u8 {
    let carry = u8::from(carry_in);
    let result = a.wrapping_sub(b).wrapping_sub(carry);

    flags.set_result_flags(result);
    flags.set_half_carry(half_carry_sub(a, b, carry));
    flags.set_parity_overflow((a ^ b) & 0x80 != 0 && (a ^ result) & 0x80 != 0);
    flags.set_subtract(true);
    flags.set_carry(u16::from(a) < u16::from(b) + u16::from(carry));
    result
}

pub fn add(flags: &mut Flags, a: u8, b: u8) -> u8 {
    add8(flags, a, b, false)
}

pub fn add_with_carry(flags: &mut Flags, a: u8, b: u8) -> u8 {
    let carry = flags.carry();
    add8(flags, a, b, carry)
}

pub fn subtract(flags: &mut Flags, a: u8, b: u8) -> u8 {
    sub8(flags, a, b, false)
}

pub fn subtract_with_carry(flags: &mut Flags, a: u8, b: u8) -> u8 {
    let carry = flags.carry();
    sub8(flags, a, b, carry)
}

/// `CP`: subtract for flags only. The undocumented bits come from the
/// operand rather than the discarded result.
pub fn compare(flags: &mut Flags, a: u8, b: u8) {
    sub8(flags, a, b, false);
    flags.set_undocumented_flags(b);
}

/// `NEG`
pub fn negate(flags: &mut Flags, a: u8) -> u8 {
    sub8(flags, 0, a, false)
}

/// `ADD HL,rr` and friends.
///
/// Sign, zero and parity are left alone; only the undocumented bits are
/// refreshed from the high byte of the result.
pub fn add16(flags: &mut Flags, a: u16, b: u16) -> u16 {
    let full = u32::from(a) + u32::from(b);
    let result = full as u16;

    flags.set_half_carry((a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF);
    flags.set_subtract(false);
    flags.set_carry(full > 0xFFFF);
    flags.set_undocumented_flags((result >> 8) as u8);
    result
}

fn set_flags16(flags: &mut Flags, result: u16) {
    let [hi, _] = result.to_be_bytes();
    flags.set_sign(result & 0x8000 != 0);
    flags.set_zero(result == 0);
    flags.set_undocumented_flags(hi);
}

/// `ADC HL,rr`
pub fn add16_with_carry(flags: &mut Flags, a: u16, b: u16) -> u16 {
    let carry = u16::from(flags.carry());
    let full = u32::from(a) + u32::from(b) + u32::from(carry);
    let result = full as u16;

    set_flags16(flags, result);
    flags.set_half_carry((a & 0x0FFF) + (b & 0x0FFF) + carry > 0x0FFF);
    flags.set_parity_overflow((a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0);
    flags.set_subtract(false);
    flags.set_carry(full > 0xFFFF);
    result
}

/// `SBC HL,rr`
pub fn subtract16_with_carry(flags: &mut Flags, a: u16, b: u16) -> u16 {
    let carry = u16::from(flags.carry());
    let result = a.wrapping_sub(b).wrapping_sub(carry);

    set_flags16(flags, result);
    flags.set_half_carry((a & 0x0FFF) < (b & 0x0FFF) + carry);
    flags.set_parity_overflow((a ^ b) & 0x8000 != 0 && (a ^ result) & 0x8000 != 0);
    flags.set_subtract(true);
    flags.set_carry(u32::from(a) < u32::from(b) + u32::from(carry));
    result
}

/// Half carry is forced high for AND and low for OR/XOR.
pub fn and(flags: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a & b;
    flags.set_parity_flags(result);
    flags.set_half_carry(true);
    flags.set_subtract(false);
    flags.set_carry(false);
    result
}

pub fn or(flags: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a | b;
    flags.set_parity_flags(result);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    flags.set_carry(false);
    result
}

pub fn xor(flags: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a ^ b;
    flags.set_parity_flags(result);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    flags.set_carry(false);
    result
}

/// Z80 `DAA`.
///
/// The correction is built from the 0x06/0x60 table: the low digit is
/// fixed when it overflowed (or H is set), the high digit when the whole
/// value overflowed (or C is set). N selects add or subtract.
pub fn decimal_adjust(flags: &mut Flags, a: u8) -> u8 {
    let mut correction = 0u8;
    let mut carry = flags.carry();

    if flags.half_carry() || a & 0x0F > 0x09 {
        correction |= 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
        carry = true;
    }

    let result = if flags.subtract() {
        flags.set_half_carry(flags.half_carry() && a & 0x0F < 0x06);
        a.wrapping_sub(correction)
    } else {
        flags.set_half_carry(a & 0x0F > 0x09);
        a.wrapping_add(correction)
    };

    flags.set_parity_flags(result);
    flags.set_carry(carry);
    result
}

/// LR35902 `DAA`: same table, but H always ends up clear and the low
/// digit check only applies after an addition.
pub fn decimal_adjust_game_boy(flags: &mut Flags, a: u8) -> u8 {
    let mut adjust: u8 = if flags.carry() { 0x60 } else { 0x00 };
    if flags.half_carry() {
        adjust |= 0x06;
    }

    let result = if !flags.subtract() {
        if a & 0x0F > 0x09 {
            adjust |= 0x06;
        }
        if a > 0x99 {
            adjust |= 0x60;
        }
        a.wrapping_add(adjust)
    } else {
        a.wrapping_sub(adjust)
    };

    flags.set_carry(adjust >= 0x60);
    flags.set_half_carry(false);
    flags.set_zero(result == 0);
    result
}

/// `CPL`
pub fn complement(flags: &mut Flags, a: u8) -> u8 {
    let result = !a;
    flags.set_half_carry(true);
    flags.set_subtract(true);
    flags.set_undocumented_flags(result);
    result
}

/// `SCF`
pub fn set_carry_flag(flags: &mut Flags, a: u8) {
    flags.set_half_carry(false);
    flags.set_subtract(false);
    flags.set_carry(true);
    flags.set_undocumented_flags(a);
}

/// `CCF`: the previous carry moves into half carry.
pub fn invert_carry_flag(flags: &mut Flags, a: u8) {
    let carry = flags.carry();
    flags.set_half_carry(carry);
    flags.set_subtract(false);
    flags.set_carry(!carry);
    flags.set_undocumented_flags(a);
}

#[inline]
fn shifted(flags: &mut Flags, result: u8, carry: bool) -> u8 {
    flags.set_parity_flags(result);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    flags.set_carry(carry);
    result
}

/// `RLC`: bit 7 goes to carry and to bit 0.
pub fn rotate_left(flags: &mut Flags, value: u8) -> u8 {
    shifted(flags, value.rotate_left(1), value & 0x80 != 0)
}

/// `RL`: bit 7 goes to carry, the old carry fills bit 0.
pub fn rotate_left_through_carry(flags: &mut Flags, value: u8) -> u8 {
    let result = (value << 1) | u8::from(flags.carry());
    shifted(flags, result, value & 0x80 != 0)
}

/// `RRC`: bit 0 goes to carry and to bit 7.
pub fn rotate_right(flags: &mut Flags, value: u8) -> u8 {
    shifted(flags, value.rotate_right(1), value & 0x01 != 0)
}

/// `RR`: bit 0 goes to carry, the old carry fills bit 7.
pub fn rotate_right_through_carry(flags: &mut Flags, value: u8) -> u8 {
    let result = (value >> 1) | (u8::from(flags.carry()) << 7);
    shifted(flags, result, value & 0x01 != 0)
}

/// `SLA`: bit 7 goes to carry, bit 0 is cleared.
pub fn shift_left(flags: &mut Flags, value: u8) -> u8 {
    shifted(flags, value << 1, value & 0x80 != 0)
}

/// `SLL` (undocumented): bit 7 goes to carry, bit 0 is set.
pub fn shift_left_set(flags: &mut Flags, value: u8) -> u8 {
    shifted(flags, (value << 1) | 0x01, value & 0x80 != 0)
}

/// `SRA`: bit 0 goes to carry, bit 7 is kept.
pub fn shift_right(flags: &mut Flags, value: u8) -> u8 {
    shifted(flags, (value >> 1) | (value & 0x80), value & 0x01 != 0)
}

/// `SRL`: bit 0 goes to carry, bit 7 is cleared.
pub fn shift_right_logical(flags: &mut Flags, value: u8) -> u8 {
    shifted(flags, value >> 1, value & 0x01 != 0)
}

/// LR35902 `SWAP`: exchange nibbles.
pub fn swap(flags: &mut Flags, value: u8) -> u8 {
    let result = value.rotate_left(4);
    shifted(flags, result, false)
}

/// Accumulator rotates (`RLCA`, `RLA`, `RRCA`, `RRA`) only touch H, N, C and
/// the undocumented bits; sign, zero and parity survive.
pub fn rotate_accumulator(flags: &mut Flags, a: u8, rotate: fn(&mut Flags, u8) -> u8) -> u8 {
    let saved = (flags.sign(), flags.zero(), flags.parity_overflow());
    let result = rotate(flags, a);
    flags.set_sign(saved.0);
    flags.set_zero(saved.1);
    flags.set_parity_overflow(saved.2);
    result
}

/// `BIT b,value`. Undocumented bits are taken from `value`; indexed forms
/// overwrite them afterwards.
pub fn bit_test(flags: &mut Flags, bit: u8, value: u8) {
    let set = value & (1 << bit) != 0;
    flags.set_zero(!set);
    flags.set_parity_overflow(!set);
    flags.set_sign(bit == 7 && set);
    flags.set_half_carry(true);
    flags.set_subtract(false);
    flags.set_undocumented_flags(value);
}

/// `RLD`: returns the new accumulator and the new memory byte.
pub fn rotate_left_digit(flags: &mut Flags, a: u8, memory: u8) -> (u8, u8) {
    let result_a = (a & 0xF0) | (memory >> 4);
    let result_memory = (memory << 4) | (a & 0x0F);
    flags.set_parity_flags(result_a);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    (result_a, result_memory)
}

/// `RRD`: returns the new accumulator and the new memory byte.
pub fn rotate_right_digit(flags: &mut Flags, a: u8, memory: u8) -> (u8, u8) {
    let result_a = (a & 0xF0) | (memory & 0x0F);
    let result_memory = (a << 4) | (memory >> 4);
    flags.set_parity_flags(result_a);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    (result_a, result_memory)
}

/// LR35902 `ADD SP,e` / `LD HL,SP+e`: H and C come from the low byte.
pub fn add_stack_offset(flags: &mut Flags, sp: u16, offset: i8) -> u16 {
    let offset = offset as i16 as u16;
    flags.set_zero(false);
    flags.set_subtract(false);
    flags.set_half_carry((sp & 0x000F) + (offset & 0x000F) > 0x000F);
    flags.set_carry((sp & 0x00FF) + (offset & 0x00FF) > 0x00FF);
    sp.wrapping_add(offset)
}

/// Flags after `LDI`/`LDD`: `remaining` is BC after the decrement.
pub fn block_transfer(flags: &mut Flags, a: u8, value: u8, remaining: u16) {
    let n = value.wrapping_add(a);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    flags.set_parity_overflow(remaining != 0);
    flags.set_flag5(n & 0x02 != 0);
    flags.set_flag3(n & 0x08 != 0);
}

/// Flags after `CPI`/`CPD`. Carry is unaffected.
pub fn block_compare(flags: &mut Flags, a: u8, value: u8, remaining: u16) {
    let result = a.wrapping_sub(value);
    let half = half_carry_sub(a, value, 0);
    let n = result.wrapping_sub(u8::from(half));
    flags.set_sign(result & 0x80 != 0);
    flags.set_zero(result == 0);
    flags.set_half_carry(half);
    flags.set_subtract(true);
    flags.set_parity_overflow(remaining != 0);
    flags.set_flag5(n & 0x02 != 0);
    flags.set_flag3(n & 0x08 != 0);
}

/// Flags after `INI`/`IND`/`OUTI`/`OUTD`: `counter` is B after the decrement.
pub fn block_io(flags: &mut Flags, counter: u8) {
    flags.set_result_flags(counter);
    flags.set_subtract(true);
}

#[cfg(test)]
mod tests;
