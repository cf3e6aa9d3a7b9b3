use bitflags::bitflags;

bitflags! {
    /// Flag bits in the Z80 F register.
    ///
    /// Layout (bit index in the byte, from MSB to LSB):
    /// - bit 7: S (sign)
    /// - bit 6: Z (zero)
    /// - bit 5: undocumented copy of result bit 5
    /// - bit 4: H (half carry)
    /// - bit 3: undocumented copy of result bit 3
    /// - bit 2: P/V (parity or overflow)
    /// - bit 1: N (subtract)
    /// - bit 0: C (carry)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FlagBits: u8 {
        const SIGN = 0b1000_0000;
        const ZERO = 0b0100_0000;
        const FLAG5 = 0b0010_0000;
        const HALF_CARRY = 0b0001_0000;
        const FLAG3 = 0b0000_1000;
        const PARITY_OVERFLOW = 0b0000_0100;
        const SUBTRACT = 0b0000_0010;
        const CARRY = 0b0000_0001;
    }
}

/// How the named flag bits are packed into the raw F byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlagLayout {
    #[default]
    Z80,
    /// LR35902 packing: Z=7, N=6, H=5, C=4, low nibble always zero.
    GameBoy,
}

/// The flags register.
///
/// Bits are always held in Z80 order; the layout only matters when the raw
/// byte is read or written (PUSH AF, POP AF, reset snapshots).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    bits: FlagBits,
    layout: FlagLayout,
}

macro_rules! flag_accessors {
    ($($get:ident, $set:ident => $bit:ident;)*) => {
        $(
            #[inline]
            pub fn $get(&self) -> bool {
                self.bits.contains(FlagBits::$bit)
            }

            #[inline]
            pub fn $set(&mut self, value: bool) {
                self.bits.set(FlagBits::$bit, value);
            }
        )*
    };
}

impl Flags {
    pub fn new(layout: FlagLayout) -> Self {
        Self {
            bits: FlagBits::empty(),
            layout,
        }
    }

    flag_accessors! {
        sign, set_sign => SIGN;
        zero, set_zero => ZERO;
        flag5, set_flag5 => FLAG5;
        half_carry, set_half_carry => HALF_CARRY;
        flag3, set_flag3 => FLAG3;
        parity_overflow, set_parity_overflow => PARITY_OVERFLOW;
        subtract, set_subtract => SUBTRACT;
        carry, set_carry => CARRY;
    }

    #[inline]
    pub fn bits(&self) -> FlagBits {
        self.bits
    }

    #[inline]
    pub fn layout(&self) -> FlagLayout {
        self.layout
    }

    /// Raw F byte in the register's packing.
    pub fn register(&self) -> u8 {
        match self.layout {
            FlagLayout::Z80 => self.bits.bits(),
            FlagLayout::GameBoy => {
                (u8::from(self.zero()) << 7)
                    | (u8::from(self.subtract()) << 6)
                    | (u8::from(self.half_carry()) << 5)
                    | (u8::from(self.carry()) << 4)
            }
        }
    }

    pub fn set_register(&mut self, value: u8) {
        match self.layout {
            FlagLayout::Z80 => self.bits = FlagBits::from_bits_retain(value),
            FlagLayout::GameBoy => {
                self.bits = FlagBits::empty();
                self.set_zero(value & 0x80 != 0);
                self.set_subtract(value & 0x40 != 0);
                self.set_half_carry(value & 0x20 != 0);
                self.set_carry(value & 0x10 != 0);
            }
        }
    }

    /// Sign, zero and both undocumented bits from `result`.
    #[inline]
    pub fn set_result_flags(&mut self, result: u8) {
        self.set_sign(result & 0x80 != 0);
        self.set_zero(result == 0);
        self.set_undocumented_flags(result);
    }

    /// Result flags plus parity in P/V.
    #[inline]
    pub fn set_parity_flags(&mut self, result: u8) {
        self.set_result_flags(result);
        self.set_parity_overflow(parity(result));
    }

    #[inline]
    pub fn set_undocumented_flags(&mut self, result: u8) {
        self.set_flag5(result & 0x20 != 0);
        self.set_flag3(result & 0x08 != 0);
    }
}

/// True when `value` has an even number of set bits.
#[inline]
pub const fn parity(value: u8) -> bool {
    value.count_ones() % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z80_layout_round_trips_every_bit() {
        let mut flags = Flags::new(FlagLayout::Z80);
        flags.set_register(0xD7);
        assert!(flags.sign());
        assert!(flags.zero());
        assert!(!flags.flag5());
        assert!(flags.half_carry());
        assert!(!flags.flag3());
        assert!(flags.parity_overflow());
        assert!(flags.subtract());
        assert!(flags.carry());
        assert_eq!(flags.register(), 0xD7);
    }

    #[test]
    fn game_boy_layout_drops_the_low_nibble() {
        let mut flags = Flags::new(FlagLayout::GameBoy);
        flags.set_register(0xBF);
        assert!(flags.zero());
        assert!(!flags.subtract());
        assert!(flags.half_carry());
        assert!(flags.carry());
        assert_eq!(flags.register(), 0xB0);
    }

    #[test]
    fn result_flags_track_the_operand() {
        let mut flags = Flags::default();
        flags.set_parity_flags(0x00);
        assert!(flags.zero());
        assert!(flags.parity_overflow());
        assert!(!flags.sign());

        flags.set_parity_flags(0xA8);
        assert!(!flags.zero());
        assert!(flags.sign());
        assert!(flags.flag5());
        assert!(flags.flag3());
        assert!(!flags.parity_overflow());
    }
}
