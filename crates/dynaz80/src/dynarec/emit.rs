//! Builders for the closures that make up a compiled block.
//!
//! Everything that can be decided while decoding (registers, immediates,
//! branch targets, the ALU routine to call) is captured by value so the
//! closures only touch machine state when they run.

use crate::alu;
use crate::config::CpuMode;
use crate::flags::Flags;
use crate::registers::{InterruptMode, Registers};
use crate::timing::InstructionTimings;

use super::block::{operation, Operation};
use super::operand::{Condition, Operand8, Reg16, Reg8};

type UnaryFn = fn(&mut Flags, u8) -> u8;
type BinaryFn = fn(&mut Flags, u8, u8) -> u8;

/// The eight accumulator operations of the `10 ooo rrr` opcode group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    AddWithCarry,
    Subtract,
    SubtractWithCarry,
    And,
    Xor,
    Or,
    Compare,
}

impl AluOp {
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::AddWithCarry,
            2 => AluOp::Subtract,
            3 => AluOp::SubtractWithCarry,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Compare,
        }
    }

    fn function(self) -> BinaryFn {
        fn compare(flags: &mut Flags, a: u8, value: u8) -> u8 {
            alu::compare(flags, a, value);
            a
        }

        match self {
            AluOp::Add => alu::add,
            AluOp::AddWithCarry => alu::add_with_carry,
            AluOp::Subtract => alu::subtract,
            AluOp::SubtractWithCarry => alu::subtract_with_carry,
            AluOp::And => alu::and,
            AluOp::Xor => alu::xor,
            AluOp::Or => alu::or,
            AluOp::Compare => compare,
        }
    }
}

/// Rotate/shift routine for the CB `00 ooo rrr` group. Slot 6 is SLL on
/// the Z80 and SWAP on the LR35902.
pub fn shift_function(code: u8, mode: CpuMode) -> UnaryFn {
    match code & 0x07 {
        0 => alu::rotate_left,
        1 => alu::rotate_right,
        2 => alu::rotate_left_through_carry,
        3 => alu::rotate_right_through_carry,
        4 => alu::shift_left,
        5 => alu::shift_right,
        6 if mode == CpuMode::GameBoy => alu::swap,
        6 => alu::shift_left_set,
        _ => alu::shift_right_logical,
    }
}

// Loads

pub fn load8(destination: Operand8, source: Operand8) -> Operation {
    operation(move |ctx| {
        let value = source.read(ctx);
        destination.write(ctx, value);
    })
}

/// LR35902 `LD (HL+),A` style: the load, then HL moves by `step`.
pub fn load8_post_step(destination: Operand8, source: Operand8, step: i8) -> Operation {
    operation(move |ctx| {
        let value = source.read(ctx);
        destination.write(ctx, value);
        let hl = ctx.registers.hl().wrapping_add(step as i16 as u16);
        ctx.registers.gp_mut().set_hl(hl);
    })
}

pub fn load16(destination: Reg16, value: u16) -> Operation {
    operation(move |ctx| destination.write(ctx.registers, value))
}

pub fn copy16(destination: Reg16, source: Reg16) -> Operation {
    operation(move |ctx| {
        let value = source.read(ctx.registers);
        destination.write(ctx.registers, value);
    })
}

pub fn load16_from_memory(destination: Reg16, address: u16) -> Operation {
    operation(move |ctx| {
        let value = ctx.mmu.read_word(address);
        destination.write(ctx.registers, value);
    })
}

pub fn store16(address: u16, source: Reg16) -> Operation {
    operation(move |ctx| {
        let value = source.read(ctx.registers);
        ctx.mmu.write_word(address, value);
    })
}

/// `LD A,I`. P/V reports IFF2.
pub fn load_a_from_i() -> Operation {
    operation(|ctx| {
        let value = ctx.registers.i;
        load_a_special(ctx.registers, value);
    })
}

/// `LD A,R`. R is only brought up to date when the block finishes, so the
/// bytes decoded so far in the block are added here.
pub fn load_a_from_r(consumed: u32) -> Operation {
    operation(move |ctx| {
        let r = ctx.registers.r;
        let value = (r & 0x80) | ((u32::from(r) + consumed) & 0x7F) as u8;
        load_a_special(ctx.registers, value);
    })
}

fn load_a_special(registers: &mut Registers, value: u8) {
    let iff2 = registers.iff2;
    registers.acc_mut().a = value;
    let flags = registers.flags_mut();
    flags.set_result_flags(value);
    flags.set_half_carry(false);
    flags.set_subtract(false);
    flags.set_parity_overflow(iff2);
}

pub fn load_i_from_a() -> Operation {
    operation(|ctx| {
        let a = ctx.registers.a();
        ctx.registers.i = a;
    })
}

/// `LD R,A`. `consumed` bytes of the block are still to be added by the
/// epilogue, so they are taken off here.
pub fn load_r_from_a(consumed: u32) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.a();
        let low = (u32::from(a) + 0x80 - (consumed & 0x7F)) & 0x7F;
        ctx.registers.r = (a & 0x80) | low as u8;
    })
}

/// LR35902 `LD HL,SP+e`.
pub fn load_hl_stack_offset(offset: i8) -> Operation {
    operation(move |ctx| {
        let sp = ctx.registers.sp;
        let value = alu::add_stack_offset(ctx.registers.flags_mut(), sp, offset);
        ctx.registers.gp_mut().set_hl(value);
    })
}

/// LR35902 `ADD SP,e`.
pub fn add_stack_offset(offset: i8) -> Operation {
    operation(move |ctx| {
        let sp = ctx.registers.sp;
        ctx.registers.sp = alu::add_stack_offset(ctx.registers.flags_mut(), sp, offset);
    })
}

// Arithmetic and logic

pub fn alu8(op: AluOp, source: Operand8) -> Operation {
    let function = op.function();
    operation(move |ctx| {
        let value = source.read(ctx);
        let a = ctx.registers.a();
        let result = function(ctx.registers.flags_mut(), a, value);
        ctx.registers.acc_mut().a = result;
    })
}

/// Read, transform, write back. Used by INC/DEC and the CB rotates.
pub fn modify8(operand: Operand8, function: UnaryFn) -> Operation {
    operation(move |ctx| {
        let value = operand.read(ctx);
        let result = function(ctx.registers.flags_mut(), value);
        operand.write(ctx, result);
    })
}

/// Indexed CB forms also copy the result into a register (undocumented).
pub fn modify8_and_copy(operand: Operand8, function: UnaryFn, copy: Reg8) -> Operation {
    operation(move |ctx| {
        let value = operand.read(ctx);
        let result = function(ctx.registers.flags_mut(), value);
        operand.write(ctx, result);
        copy.write(ctx.registers, result);
    })
}

pub fn increment8(operand: Operand8) -> Operation {
    modify8(operand, alu::increment)
}

pub fn decrement8(operand: Operand8) -> Operation {
    modify8(operand, alu::decrement)
}

pub fn increment16(register: Reg16) -> Operation {
    operation(move |ctx| {
        let value = register.read(ctx.registers).wrapping_add(1);
        register.write(ctx.registers, value);
    })
}

pub fn decrement16(register: Reg16) -> Operation {
    operation(move |ctx| {
        let value = register.read(ctx.registers).wrapping_sub(1);
        register.write(ctx.registers, value);
    })
}

/// `ADD HL,rr` and its index register forms.
pub fn add16(destination: Reg16, source: Reg16) -> Operation {
    operation(move |ctx| {
        let a = destination.read(ctx.registers);
        let b = source.read(ctx.registers);
        let result = alu::add16(ctx.registers.flags_mut(), a, b);
        destination.write(ctx.registers, result);
    })
}

pub fn add16_with_carry(source: Reg16) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.hl();
        let b = source.read(ctx.registers);
        let result = alu::add16_with_carry(ctx.registers.flags_mut(), a, b);
        ctx.registers.gp_mut().set_hl(result);
    })
}

pub fn subtract16_with_carry(source: Reg16) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.hl();
        let b = source.read(ctx.registers);
        let result = alu::subtract16_with_carry(ctx.registers.flags_mut(), a, b);
        ctx.registers.gp_mut().set_hl(result);
    })
}

/// Operations of the form `A = f(flags, A)`.
pub fn accumulator(function: UnaryFn) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.a();
        let result = function(ctx.registers.flags_mut(), a);
        ctx.registers.acc_mut().a = result;
    })
}

pub fn decimal_adjust(mode: CpuMode) -> Operation {
    match mode {
        CpuMode::Z80 => accumulator(alu::decimal_adjust),
        CpuMode::GameBoy => accumulator(alu::decimal_adjust_game_boy),
    }
}

pub fn negate() -> Operation {
    accumulator(alu::negate)
}

pub fn complement() -> Operation {
    accumulator(alu::complement)
}

pub fn set_carry_flag() -> Operation {
    operation(|ctx| {
        let a = ctx.registers.a();
        alu::set_carry_flag(ctx.registers.flags_mut(), a);
    })
}

/// `CCF`. The LR35902 clears H instead of copying the old carry into it.
pub fn invert_carry_flag(mode: CpuMode) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.a();
        let flags = ctx.registers.flags_mut();
        alu::invert_carry_flag(flags, a);
        if mode == CpuMode::GameBoy {
            flags.set_half_carry(false);
        }
    })
}

/// `RLCA`, `RRCA`, `RLA`, `RRA`. The LR35902 always clears Z.
pub fn rotate_accumulator(rotate: UnaryFn, mode: CpuMode) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.a();
        let flags = ctx.registers.flags_mut();
        let result = alu::rotate_accumulator(flags, a, rotate);
        if mode == CpuMode::GameBoy {
            flags.set_zero(false);
        }
        ctx.registers.acc_mut().a = result;
    })
}

pub fn rotate_left_digit() -> Operation {
    digit_rotation(alu::rotate_left_digit)
}

pub fn rotate_right_digit() -> Operation {
    digit_rotation(alu::rotate_right_digit)
}

fn digit_rotation(function: fn(&mut Flags, u8, u8) -> (u8, u8)) -> Operation {
    operation(move |ctx| {
        let address = ctx.registers.hl();
        let memory = ctx.mmu.read_byte(address);
        let a = ctx.registers.a();
        let (a, memory) = function(ctx.registers.flags_mut(), a, memory);
        ctx.registers.acc_mut().a = a;
        ctx.mmu.write_byte(address, memory);
    })
}

// Bit manipulation

pub fn bit_test(bit: u8, operand: Operand8) -> Operation {
    operation(move |ctx| {
        let value = operand.read(ctx);
        let flags = ctx.registers.flags_mut();
        alu::bit_test(flags, bit, value);
        if let Operand8::Indexed(..) = operand {
            if let Some(address) = operand.address(ctx.registers) {
                ctx.registers.flags_mut().set_undocumented_flags((address >> 8) as u8);
            }
        }
    })
}

/// `RES b` (`set == false`) or `SET b`, with the optional indexed register
/// copy.
pub fn bit_assign(bit: u8, set: bool, operand: Operand8, copy: Option<Reg8>) -> Operation {
    let mask = 1u8 << bit;
    operation(move |ctx| {
        let value = operand.read(ctx);
        let result = if set { value | mask } else { value & !mask };
        operand.write(ctx, result);
        if let Some(copy) = copy {
            copy.write(ctx.registers, result);
        }
    })
}

// Exchanges and stack

pub fn push(register: Reg16) -> Operation {
    operation(move |ctx| {
        let value = register.read(ctx.registers);
        ctx.push_word(value);
    })
}

pub fn pop(register: Reg16) -> Operation {
    operation(move |ctx| {
        let value = ctx.pop_word();
        register.write(ctx.registers, value);
    })
}

pub fn exchange_de_hl() -> Operation {
    operation(|ctx| {
        let gp = ctx.registers.gp_mut();
        let (de, hl) = (gp.de(), gp.hl());
        gp.set_de(hl);
        gp.set_hl(de);
    })
}

pub fn exchange_af() -> Operation {
    operation(|ctx| ctx.registers.switch_accumulator_and_flags())
}

pub fn exchange_all() -> Operation {
    operation(|ctx| ctx.registers.switch_general_purpose_registers())
}

/// `EX (SP),HL` and the index register forms.
pub fn exchange_stack_top(register: Reg16) -> Operation {
    operation(move |ctx| {
        let sp = ctx.registers.sp;
        let top = ctx.mmu.read_word(sp);
        let value = register.read(ctx.registers);
        ctx.mmu.write_word(sp, value);
        register.write(ctx.registers, top);
    })
}

// Control flow. Every builder here leaves PC pointing at the next
// instruction to run.

pub fn jump(target: u16) -> Operation {
    operation(move |ctx| ctx.registers.pc = target)
}

pub fn jump_if(condition: Condition, target: u16, next: u16, taken: InstructionTimings) -> Operation {
    operation(move |ctx| {
        if condition.holds(ctx.registers.flags()) {
            ctx.registers.pc = target;
            ctx.add_timing(taken);
        } else {
            ctx.registers.pc = next;
        }
    })
}

/// `JP (HL)`, `JP (IX)`, `JP (IY)`
pub fn jump_to_register(register: Reg16) -> Operation {
    operation(move |ctx| {
        let pc = register.read(ctx.registers);
        ctx.registers.pc = pc;
    })
}

pub fn decrement_jump_non_zero(target: u16, next: u16, taken: InstructionTimings) -> Operation {
    operation(move |ctx| {
        let b = ctx.registers.gp().b.wrapping_sub(1);
        ctx.registers.gp_mut().b = b;
        if b != 0 {
            ctx.registers.pc = target;
            ctx.add_timing(taken);
        } else {
            ctx.registers.pc = next;
        }
    })
}

/// `CALL nn` and `RST p`.
pub fn call(target: u16, return_address: u16) -> Operation {
    operation(move |ctx| {
        ctx.push_word(return_address);
        ctx.registers.pc = target;
    })
}

pub fn call_if(
    condition: Condition,
    target: u16,
    return_address: u16,
    taken: InstructionTimings,
) -> Operation {
    operation(move |ctx| {
        if condition.holds(ctx.registers.flags()) {
            ctx.push_word(return_address);
            ctx.registers.pc = target;
            ctx.add_timing(taken);
        } else {
            ctx.registers.pc = return_address;
        }
    })
}

pub fn ret() -> Operation {
    operation(|ctx| {
        let pc = ctx.pop_word();
        ctx.registers.pc = pc;
    })
}

pub fn ret_if(condition: Condition, next: u16, taken: InstructionTimings) -> Operation {
    operation(move |ctx| {
        if condition.holds(ctx.registers.flags()) {
            let pc = ctx.pop_word();
            ctx.registers.pc = pc;
            ctx.add_timing(taken);
        } else {
            ctx.registers.pc = next;
        }
    })
}

/// Z80 `RETN`/`RETI`: IFF1 is restored from IFF2.
pub fn return_from_interrupt() -> Operation {
    operation(|ctx| {
        ctx.registers.iff1 = ctx.registers.iff2;
        let pc = ctx.pop_word();
        ctx.registers.pc = pc;
    })
}

/// LR35902 `RETI`: return and set IME.
pub fn return_enabling_interrupts() -> Operation {
    operation(|ctx| {
        ctx.registers.iff1 = true;
        ctx.registers.iff2 = true;
        let pc = ctx.pop_word();
        ctx.registers.pc = pc;
    })
}

// System

pub fn halt() -> Operation {
    operation(|ctx| ctx.halt())
}

pub fn set_interrupts_enabled(enabled: bool) -> Operation {
    operation(move |ctx| {
        ctx.registers.iff1 = enabled;
        ctx.registers.iff2 = enabled;
    })
}

pub fn set_interrupt_mode(mode: InterruptMode) -> Operation {
    operation(move |ctx| ctx.registers.interrupt_mode = mode)
}

// Port I/O

/// `IN A,(n)`. Flags are unaffected.
pub fn input_immediate(port: u8) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.a();
        let value = ctx.peripherals.read_byte_from_port(port, a);
        ctx.registers.acc_mut().a = value;
    })
}

pub fn output_immediate(port: u8) -> Operation {
    operation(move |ctx| {
        let a = ctx.registers.a();
        ctx.peripherals.write_byte_to_port(port, a, a);
    })
}

/// `IN r,(C)`. With no register (`IN (C)`) only the flags change.
pub fn input_register(destination: Option<Reg8>) -> Operation {
    operation(move |ctx| {
        let (b, c) = (ctx.registers.gp().b, ctx.registers.gp().c);
        let value = ctx.peripherals.read_byte_from_port(c, b);
        let flags = ctx.registers.flags_mut();
        flags.set_parity_flags(value);
        flags.set_half_carry(false);
        flags.set_subtract(false);
        if let Some(destination) = destination {
            destination.write(ctx.registers, value);
        }
    })
}

/// `OUT (C),r`. With no register (`OUT (C),0`) zero is written.
pub fn output_register(source: Option<Reg8>) -> Operation {
    operation(move |ctx| {
        let (b, c) = (ctx.registers.gp().b, ctx.registers.gp().c);
        let value = source.map_or(0, |reg| reg.read(ctx.registers));
        ctx.peripherals.write_byte_to_port(c, b, value);
    })
}

// Block instructions. Repeating forms loop here until they finish. The
// block's static cost covers the final iteration; each iteration that
// goes round again costs 5 M-cycles / 21 T-states on top.

const REPEAT: InstructionTimings = InstructionTimings::new(5, 21);

/// `LDI`, `LDD`, `LDIR`, `LDDR`
pub fn block_load(step: i8, repeat: bool) -> Operation {
    let delta = step as i16 as u16;
    operation(move |ctx| loop {
        let (hl, de) = (ctx.registers.hl(), ctx.registers.de());
        let value = ctx.mmu.transfer_byte(hl, de);
        let bc = ctx.registers.bc().wrapping_sub(1);
        let gp = ctx.registers.gp_mut();
        gp.set_hl(hl.wrapping_add(delta));
        gp.set_de(de.wrapping_add(delta));
        gp.set_bc(bc);
        let a = ctx.registers.a();
        alu::block_transfer(ctx.registers.flags_mut(), a, value, bc);
        if !repeat || bc == 0 {
            break;
        }
        ctx.add_timing(REPEAT);
    })
}

/// `CPI`, `CPD`, `CPIR`, `CPDR`
pub fn block_compare(step: i8, repeat: bool) -> Operation {
    let delta = step as i16 as u16;
    operation(move |ctx| loop {
        let hl = ctx.registers.hl();
        let value = ctx.mmu.read_byte(hl);
        let bc = ctx.registers.bc().wrapping_sub(1);
        let gp = ctx.registers.gp_mut();
        gp.set_hl(hl.wrapping_add(delta));
        gp.set_bc(bc);
        let a = ctx.registers.a();
        let flags = ctx.registers.flags_mut();
        alu::block_compare(flags, a, value, bc);
        if !repeat || bc == 0 || flags.zero() {
            break;
        }
        ctx.add_timing(REPEAT);
    })
}

/// `INI`, `IND`, `INIR`, `INDR`
pub fn block_input(step: i8, repeat: bool) -> Operation {
    let delta = step as i16 as u16;
    operation(move |ctx| loop {
        let (b, c, hl) = (ctx.registers.gp().b, ctx.registers.gp().c, ctx.registers.hl());
        let value = ctx.peripherals.read_byte_from_port(c, b);
        ctx.mmu.write_byte(hl, value);
        let b = b.wrapping_sub(1);
        let gp = ctx.registers.gp_mut();
        gp.b = b;
        gp.set_hl(hl.wrapping_add(delta));
        alu::block_io(ctx.registers.flags_mut(), b);
        if !repeat || b == 0 {
            break;
        }
        ctx.add_timing(REPEAT);
    })
}

/// `OUTI`, `OUTD`, `OTIR`, `OTDR`. B is decremented before the port is
/// driven.
pub fn block_output(step: i8, repeat: bool) -> Operation {
    let delta = step as i16 as u16;
    operation(move |ctx| loop {
        let hl = ctx.registers.hl();
        let value = ctx.mmu.read_byte(hl);
        let b = ctx.registers.gp().b.wrapping_sub(1);
        let c = ctx.registers.gp().c;
        ctx.peripherals.write_byte_to_port(c, b, value);
        let gp = ctx.registers.gp_mut();
        gp.b = b;
        gp.set_hl(hl.wrapping_add(delta));
        alu::block_io(ctx.registers.flags_mut(), b);
        if !repeat || b == 0 {
            break;
        }
        ctx.add_timing(REPEAT);
    })
}
