//! Operands resolved at decode time.

use crate::flags::Flags;
use crate::registers::Registers;

use super::context::ExecutionContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
}

impl Reg8 {
    /// Register named by a 3-bit opcode field. `6` is the memory operand and
    /// has no register.
    pub fn from_code(code: u8) -> Option<Self> {
        match code & 0x07 {
            0 => Some(Reg8::B),
            1 => Some(Reg8::C),
            2 => Some(Reg8::D),
            3 => Some(Reg8::E),
            4 => Some(Reg8::H),
            5 => Some(Reg8::L),
            7 => Some(Reg8::A),
            _ => None,
        }
    }

    #[inline]
    pub fn read(self, registers: &Registers) -> u8 {
        match self {
            Reg8::A => registers.a(),
            Reg8::B => registers.gp().b,
            Reg8::C => registers.gp().c,
            Reg8::D => registers.gp().d,
            Reg8::E => registers.gp().e,
            Reg8::H => registers.gp().h,
            Reg8::L => registers.gp().l,
            Reg8::Ixh => (registers.ix >> 8) as u8,
            Reg8::Ixl => registers.ix as u8,
            Reg8::Iyh => (registers.iy >> 8) as u8,
            Reg8::Iyl => registers.iy as u8,
        }
    }

    #[inline]
    pub fn write(self, registers: &mut Registers, value: u8) {
        match self {
            Reg8::A => registers.acc_mut().a = value,
            Reg8::B => registers.gp_mut().b = value,
            Reg8::C => registers.gp_mut().c = value,
            Reg8::D => registers.gp_mut().d = value,
            Reg8::E => registers.gp_mut().e = value,
            Reg8::H => registers.gp_mut().h = value,
            Reg8::L => registers.gp_mut().l = value,
            Reg8::Ixh => registers.ix = (registers.ix & 0x00FF) | (u16::from(value) << 8),
            Reg8::Ixl => registers.ix = (registers.ix & 0xFF00) | u16::from(value),
            Reg8::Iyh => registers.iy = (registers.iy & 0x00FF) | (u16::from(value) << 8),
            Reg8::Iyl => registers.iy = (registers.iy & 0xFF00) | u16::from(value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg16 {
    Af,
    Bc,
    De,
    Hl,
    Sp,
    Ix,
    Iy,
}

impl Reg16 {
    #[inline]
    pub fn read(self, registers: &Registers) -> u16 {
        match self {
            Reg16::Af => registers.af(),
            Reg16::Bc => registers.bc(),
            Reg16::De => registers.de(),
            Reg16::Hl => registers.hl(),
            Reg16::Sp => registers.sp,
            Reg16::Ix => registers.ix,
            Reg16::Iy => registers.iy,
        }
    }

    #[inline]
    pub fn write(self, registers: &mut Registers, value: u16) {
        match self {
            Reg16::Af => registers.acc_mut().set_af(value),
            Reg16::Bc => registers.gp_mut().set_bc(value),
            Reg16::De => registers.gp_mut().set_de(value),
            Reg16::Hl => registers.gp_mut().set_hl(value),
            Reg16::Sp => registers.sp = value,
            Reg16::Ix => registers.ix = value,
            Reg16::Iy => registers.iy = value,
        }
    }
}

/// 8-bit source or destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand8 {
    Register(Reg8),
    Immediate(u8),
    /// `(BC)`, `(DE)`, `(HL)`
    Indirect(Reg16),
    /// `(IX+d)`, `(IY+d)`
    Indexed(Reg16, i8),
    /// `(nn)`
    Absolute(u16),
    /// `(0xFF00+n)`
    HighPage(u8),
    /// `(0xFF00+C)`
    HighPageC,
}

impl Operand8 {
    /// Effective address for memory operands.
    #[inline]
    pub fn address(self, registers: &Registers) -> Option<u16> {
        match self {
            Operand8::Register(_) | Operand8::Immediate(_) => None,
            Operand8::Indirect(reg) => Some(reg.read(registers)),
            Operand8::Indexed(reg, displacement) => {
                Some(reg.read(registers).wrapping_add(displacement as i16 as u16))
            }
            Operand8::Absolute(address) => Some(address),
            Operand8::HighPage(offset) => Some(0xFF00 | u16::from(offset)),
            Operand8::HighPageC => Some(0xFF00 | u16::from(registers.gp().c)),
        }
    }

    #[inline]
    pub fn read(self, ctx: &ExecutionContext<'_>) -> u8 {
        match self {
            Operand8::Register(reg) => reg.read(ctx.registers),
            Operand8::Immediate(value) => value,
            _ => match self.address(ctx.registers) {
                Some(address) => ctx.mmu.read_byte(address),
                None => 0xFF,
            },
        }
    }

    /// Writes to an immediate are discarded; the decoder never emits them.
    #[inline]
    pub fn write(self, ctx: &mut ExecutionContext<'_>, value: u8) {
        match self {
            Operand8::Register(reg) => reg.write(ctx.registers, value),
            Operand8::Immediate(_) => {}
            _ => {
                if let Some(address) = self.address(ctx.registers) {
                    ctx.mmu.write_byte(address, value);
                }
            }
        }
    }

    #[inline]
    pub fn is_memory(self) -> bool {
        !matches!(self, Operand8::Register(_) | Operand8::Immediate(_))
    }
}

/// Branch condition from the `cc` opcode field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    NonZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Positive,
    Minus,
}

impl Condition {
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Condition::NonZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Positive,
            _ => Condition::Minus,
        }
    }

    #[inline]
    pub fn holds(self, flags: &Flags) -> bool {
        match self {
            Condition::NonZero => !flags.zero(),
            Condition::Zero => flags.zero(),
            Condition::NoCarry => !flags.carry(),
            Condition::Carry => flags.carry(),
            Condition::ParityOdd => !flags.parity_overflow(),
            Condition::ParityEven => flags.parity_overflow(),
            Condition::Positive => !flags.sign(),
            Condition::Minus => flags.sign(),
        }
    }
}
