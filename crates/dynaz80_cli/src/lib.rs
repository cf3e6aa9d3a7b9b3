//! Host runner: loads a raw image into a flat machine, runs it on the
//! dynamic recompiler and collects what the program printed.

use std::sync::PoisonError;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use typed_builder::TypedBuilder;

use dynaz80::{
    CacheStats, Core, CoreConfig, CpuMode, InitialState, InterruptManager, NoPeripherals,
    PeripheralManager, RamSegment, Registers, RomSegment, Segment, StopReason,
};

mod serial;

pub use serial::{SerialPort, SharedOutput};

/// Ten seconds of a 4 MHz CPU.
pub const DEFAULT_CYCLE_BUDGET: u64 = 40_000_000;
pub const DEFAULT_CONSOLE_PORT: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Z80,
    GameBoy,
}

impl Platform {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "z80" | "Z80" => Some(Platform::Z80),
            "gb" | "GB" | "gameboy" | "game-boy" => Some(Platform::GameBoy),
            _ => None,
        }
    }
}

#[derive(TypedBuilder)]
pub struct RunOptions {
    pub platform: Platform,
    pub image: Vec<u8>,
    /// Where the image is loaded and execution starts. Z80 only; Game Boy
    /// images are always mapped at 0x0000 and start at 0x0100.
    #[builder(default)]
    pub load_address: u16,
    #[builder(default = DEFAULT_CYCLE_BUDGET)]
    pub cycle_budget: u64,
    /// Z80 port whose writes are captured as console output.
    #[builder(default = DEFAULT_CONSOLE_PORT)]
    pub console_port: u8,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: Vec<u8>,
    pub stop: StopReason,
    pub registers: Registers,
    pub clock: u64,
    pub cache: CacheStats,
}

impl RunSummary {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    fn collect<P: PeripheralManager>(core: &Core<P>, stop: StopReason, output: Vec<u8>) -> Self {
        Self {
            output,
            stop,
            registers: core.registers().clone(),
            clock: core.clock(),
            cache: core.cache().stats(),
        }
    }
}

/// Port peripheral that captures every byte written to one port.
#[derive(Debug, Default)]
pub struct ConsolePorts {
    port: u8,
    output: Vec<u8>,
}

impl ConsolePorts {
    pub fn new(port: u8) -> Self {
        Self {
            port,
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl PeripheralManager for ConsolePorts {
    fn read_byte_from_port(&mut self, _port: u8, _context: u8) -> u8 {
        0xFF
    }

    fn write_byte_to_port(&mut self, port: u8, _context: u8, value: u8) {
        if port == self.port {
            self.output.push(value);
        }
    }
}

pub fn run(options: RunOptions) -> Result<RunSummary> {
    match options.platform {
        Platform::Z80 => run_z80(options),
        Platform::GameBoy => run_game_boy(options),
    }
}

pub fn run_z80(options: RunOptions) -> Result<RunSummary> {
    let load = usize::from(options.load_address);
    if options.image.len() > 0x10000 - load {
        bail!(
            "image of {} bytes does not fit at {:#06X}",
            options.image.len(),
            options.load_address
        );
    }
    info!(
        "loading {} byte Z80 image at {:#06X}",
        options.image.len(),
        options.load_address
    );

    let mut memory = vec![0u8; 0x10000];
    memory[load..load + options.image.len()].copy_from_slice(&options.image);
    let (low, high) = memory.split_at(0x8000);
    let segments = vec![
        Segment::read_write(RamSegment::with_contents(0x0000, 0x8000, low)),
        Segment::read_write(RamSegment::with_contents(0x8000, 0x8000, high)),
    ];

    let config = CoreConfig::builder()
        .mode(CpuMode::Z80)
        .initial_state(InitialState::builder().pc(options.load_address).build())
        .build();
    let mut core = Core::new(
        config,
        segments,
        ConsolePorts::new(options.console_port),
        InterruptManager::new(),
    )
    .context("failed to build the Z80 core")?;

    let stop = core.run_for(options.cycle_budget)?;
    let output = core.peripherals().output().to_vec();
    Ok(RunSummary::collect(&core, stop, output))
}

pub fn run_game_boy(options: RunOptions) -> Result<RunSummary> {
    if options.image.len() > 0x8000 {
        warn!(
            "Game Boy image is {} bytes; only the first 32 KiB are mapped",
            options.image.len()
        );
    }
    if options.load_address != 0 {
        warn!("load address is ignored for Game Boy images");
    }
    info!("loading {} byte Game Boy image", options.image.len());

    let serial = SerialPort::new();
    let output = serial.output();
    let segments = vec![
        Segment::read_only(RomSegment::new(0x0000, 0x8000, &options.image)),
        Segment::read_write(RamSegment::new(0x8000, 0x7F00)),
        Segment::read_write(serial),
    ];

    let config = CoreConfig::builder()
        .mode(CpuMode::GameBoy)
        .initial_state(InitialState::game_boy_dmg())
        .build();
    let mut core = Core::new(config, segments, NoPeripherals, InterruptManager::new())
        .context("failed to build the Game Boy core")?;

    let stop = core.run_for(options.cycle_budget)?;
    let output = output.lock().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(RunSummary::collect(&core, stop, output))
}

#[cfg(test)]
mod tests;
