use crate::flags::{FlagLayout, Flags};

/// One bank of the B, C, D, E, H and L registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeneralPurposeRegisterSet {
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
}

impl GeneralPurposeRegisterSet {
    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        let [b, c] = value.to_be_bytes();
        self.b = b;
        self.c = c;
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        let [d, e] = value.to_be_bytes();
        self.d = d;
        self.e = e;
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        let [h, l] = value.to_be_bytes();
        self.h = h;
        self.l = l;
    }
}

/// One bank of the accumulator and flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccumulatorAndFlags {
    pub a: u8,
    pub flags: Flags,
}

impl AccumulatorAndFlags {
    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.flags.register()])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.flags.set_register(f);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterruptMode {
    #[default]
    Im0,
    Im1,
    Im2,
}

/// Full Z80 register file.
///
/// Primary and alternate banks live side by side; `EXX` and `EX AF,AF'`
/// flip which bank is active instead of copying register contents.
#[derive(Clone, Debug, Default)]
pub struct Registers {
    general_purpose: [GeneralPurposeRegisterSet; 2],
    accumulator: [AccumulatorAndFlags; 2],
    gp_bank: usize,
    af_bank: usize,
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,
    pub iff1: bool,
    pub iff2: bool,
    pub interrupt_mode: InterruptMode,
}

impl Registers {
    /// Zeroed register file whose flags pack with `layout`.
    pub fn new(layout: FlagLayout) -> Self {
        let flags = Flags::new(layout);
        let accumulator = AccumulatorAndFlags { a: 0, flags };
        Self {
            accumulator: [accumulator; 2],
            ..Self::default()
        }
    }

    #[inline]
    pub fn gp(&self) -> &GeneralPurposeRegisterSet {
        &self.general_purpose[self.gp_bank]
    }

    #[inline]
    pub fn gp_mut(&mut self) -> &mut GeneralPurposeRegisterSet {
        &mut self.general_purpose[self.gp_bank]
    }

    #[inline]
    pub fn acc(&self) -> &AccumulatorAndFlags {
        &self.accumulator[self.af_bank]
    }

    #[inline]
    pub fn acc_mut(&mut self) -> &mut AccumulatorAndFlags {
        &mut self.accumulator[self.af_bank]
    }

    /// `EXX`
    #[inline]
    pub fn switch_general_purpose_registers(&mut self) {
        self.gp_bank ^= 1;
    }

    /// `EX AF,AF'`
    #[inline]
    pub fn switch_accumulator_and_flags(&mut self) {
        self.af_bank ^= 1;
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.acc().a
    }

    #[inline]
    pub fn flags(&self) -> &Flags {
        &self.acc().flags
    }

    #[inline]
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.acc_mut().flags
    }

    #[inline]
    pub fn af(&self) -> u16 {
        self.acc().af()
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        self.gp().bc()
    }

    #[inline]
    pub fn de(&self) -> u16 {
        self.gp().de()
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        self.gp().hl()
    }

    /// Add `bytes` to the low seven bits of R, leaving bit 7 alone.
    #[inline]
    pub fn increment_refresh(&mut self, bytes: u32) {
        let low = (u32::from(self.r & 0x7F) + bytes) & 0x7F;
        self.r = (self.r & 0x80) | low as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exx_switches_banks_without_copying() {
        let mut regs = Registers::new(FlagLayout::Z80);
        regs.gp_mut().set_bc(0x1234);
        regs.switch_general_purpose_registers();
        assert_eq!(regs.bc(), 0);
        regs.gp_mut().set_hl(0xBEEF);
        regs.switch_general_purpose_registers();
        assert_eq!(regs.bc(), 0x1234);
        assert_eq!(regs.hl(), 0);
    }

    #[test]
    fn ex_af_switches_accumulator_and_flags() {
        let mut regs = Registers::new(FlagLayout::Z80);
        regs.acc_mut().set_af(0x12FF);
        regs.switch_accumulator_and_flags();
        assert_eq!(regs.af(), 0);
        regs.switch_accumulator_and_flags();
        assert_eq!(regs.af(), 0x12FF);
    }

    #[test]
    fn refresh_wraps_in_seven_bits() {
        let mut regs = Registers::new(FlagLayout::Z80);
        regs.r = 0x7F;
        regs.increment_refresh(1);
        assert_eq!(regs.r, 0x00);

        regs.r = 0xFE;
        regs.increment_refresh(3);
        assert_eq!(regs.r, 0x81);
    }
}
