use typed_builder::TypedBuilder;

use crate::flags::FlagLayout;
use crate::registers::{InterruptMode, Registers};

/// Instruction set the decoder accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CpuMode {
    #[default]
    Z80,
    /// Sharp LR35902: no ED/DD/FD tables, Game Boy opcode replacements and
    /// flag packing.
    GameBoy,
}

impl CpuMode {
    pub fn flag_layout(self) -> FlagLayout {
        match self {
            CpuMode::Z80 => FlagLayout::Z80,
            CpuMode::GameBoy => FlagLayout::GameBoy,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionStrategy {
    /// Compile each block once and reuse it until a write touches it.
    #[default]
    Caching,
    /// Decode every block afresh before running it.
    Uncached,
}

/// Register snapshot the core starts from.
///
/// Every field defaults to zero, which is the Z80 reset state with the
/// program counter at 0x0000.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct InitialState {
    #[builder(default)]
    pub af: u16,
    #[builder(default)]
    pub bc: u16,
    #[builder(default)]
    pub de: u16,
    #[builder(default)]
    pub hl: u16,
    #[builder(default)]
    pub af_alt: u16,
    #[builder(default)]
    pub bc_alt: u16,
    #[builder(default)]
    pub de_alt: u16,
    #[builder(default)]
    pub hl_alt: u16,
    #[builder(default)]
    pub ix: u16,
    #[builder(default)]
    pub iy: u16,
    #[builder(default)]
    pub i: u8,
    #[builder(default)]
    pub r: u8,
    #[builder(default)]
    pub sp: u16,
    #[builder(default)]
    pub pc: u16,
    #[builder(default)]
    pub iff1: bool,
    #[builder(default)]
    pub iff2: bool,
    #[builder(default)]
    pub interrupt_mode: InterruptMode,
}

impl Default for InitialState {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl InitialState {
    /// State the DMG boot ROM leaves behind when it jumps to the cartridge
    /// at 0x0100 (Pan Docs values). IME is clear.
    pub fn game_boy_dmg() -> Self {
        Self::builder()
            .af(0x01B0)
            .bc(0x0013)
            .de(0x00D8)
            .hl(0x014D)
            .sp(0xFFFE)
            .pc(0x0100)
            .build()
    }

    /// Build a register file from this snapshot.
    pub fn to_registers(&self, layout: FlagLayout) -> Registers {
        let mut registers = Registers::new(layout);

        registers.switch_accumulator_and_flags();
        registers.acc_mut().set_af(self.af_alt);
        registers.switch_accumulator_and_flags();
        registers.acc_mut().set_af(self.af);

        registers.switch_general_purpose_registers();
        let alternate = registers.gp_mut();
        alternate.set_bc(self.bc_alt);
        alternate.set_de(self.de_alt);
        alternate.set_hl(self.hl_alt);
        registers.switch_general_purpose_registers();
        let primary = registers.gp_mut();
        primary.set_bc(self.bc);
        primary.set_de(self.de);
        primary.set_hl(self.hl);

        registers.ix = self.ix;
        registers.iy = self.iy;
        registers.i = self.i;
        registers.r = self.r;
        registers.sp = self.sp;
        registers.pc = self.pc;
        registers.iff1 = self.iff1;
        registers.iff2 = self.iff2;
        registers.interrupt_mode = self.interrupt_mode;
        registers
    }
}

#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct CoreConfig {
    #[builder(default)]
    pub mode: CpuMode,
    #[builder(default)]
    pub initial_state: InitialState,
    #[builder(default)]
    pub strategy: ExecutionStrategy,
}
