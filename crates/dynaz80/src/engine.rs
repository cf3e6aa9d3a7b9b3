//! The execution loop.
//!
//! [`Core`] resolves the block at PC, executes it and advances the virtual
//! clock by what it cost. A halted core blocks in the interrupt handshake
//! until a peripheral delivers an interrupt.

use std::sync::Arc;

use log::{debug, error};

use crate::cache::BlockCache;
use crate::config::{CoreConfig, CpuMode, ExecutionStrategy};
use crate::dynarec::{CompiledBlock, DynaRec, ExecutionContext};
use crate::error::{CoreError, DecodeError};
use crate::interrupts::InterruptManager;
use crate::mmu::{Segment, SegmentMmu};
use crate::peripherals::PeripheralManager;
use crate::registers::{InterruptMode, Registers};
use crate::timing::{InstructionTimings, InstructionTimingsSync};

const RST_ACCEPT: InstructionTimings = InstructionTimings::new(3, 13);
const VECTOR_ACCEPT: InstructionTimings = InstructionTimings::new(5, 19);
const GAME_BOY_ACCEPT: InstructionTimings = InstructionTimings::new(5, 20);

/// Why [`Core::run_for`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The clock advanced by at least the requested number of T-states.
    CycleBudget,
    /// HALT with interrupts disabled and nothing in flight. Nothing can
    /// wake the CPU.
    HaltedWithInterruptsDisabled,
    /// HALT with interrupts enabled and no request queued. The next
    /// [`Core::step`] blocks until one arrives.
    HaltedAwaitingInterrupt,
}

pub struct Core<P: PeripheralManager> {
    registers: Registers,
    mmu: SegmentMmu,
    peripherals: P,
    cache: BlockCache,
    dynarec: DynaRec,
    interrupts: InterruptManager,
    strategy: ExecutionStrategy,
    timing_syncs: Vec<Box<dyn InstructionTimingsSync>>,
    clock: u64,
    parked: bool,
}

impl<P: PeripheralManager> Core<P> {
    pub fn new(
        config: CoreConfig,
        segments: Vec<Segment>,
        mut peripherals: P,
        interrupts: InterruptManager,
    ) -> Result<Self, CoreError> {
        let mut mmu = SegmentMmu::new(segments)?;
        let cache = BlockCache::new();
        mmu.subscribe(cache.write_listener());
        peripherals.attach_interrupt_manager(interrupts.clone());

        debug!(
            "core: {:?} mode, {:?} strategy, PC={:#06X}",
            config.mode, config.strategy, config.initial_state.pc
        );

        Ok(Self {
            registers: config.initial_state.to_registers(config.mode.flag_layout()),
            mmu,
            peripherals,
            cache,
            dynarec: DynaRec::new(config.mode),
            interrupts,
            strategy: config.strategy,
            timing_syncs: Vec::new(),
            clock: 0,
            parked: false,
        })
    }

    pub fn mode(&self) -> CpuMode {
        self.dynarec.mode()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn mmu(&self) -> &SegmentMmu {
        &self.mmu
    }

    /// Writes made through this reference invalidate cached blocks like any
    /// CPU write.
    pub fn mmu_mut(&mut self) -> &mut SegmentMmu {
        &mut self.mmu
    }

    pub fn peripherals(&self) -> &P {
        &self.peripherals
    }

    pub fn peripherals_mut(&mut self) -> &mut P {
        &mut self.peripherals
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    pub fn interrupts(&self) -> &InterruptManager {
        &self.interrupts
    }

    /// T-states elapsed since the core was built.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn add_timing_sync(&mut self, sink: impl InstructionTimingsSync + 'static) {
        self.timing_syncs.push(Box::new(sink));
    }

    /// Run one block, or service the halt handshake if halted.
    pub fn step(&mut self) -> Result<InstructionTimings, CoreError> {
        if self.interrupts.is_halted() {
            return Ok(self.wait_for_interrupt());
        }

        let address = self.registers.pc;
        let block = self.fetch(address).map_err(|e| {
            self.dump_registers(&e);
            e
        })?;

        let mut ctx = ExecutionContext::new(&mut self.registers, &mut self.mmu, &mut self.peripherals);
        let timings = block.execute(&mut ctx);
        let halted = ctx.halted();

        if halted {
            self.interrupts.halt();
            self.peripherals.signal_halt();
            self.parked = !self.registers.iff1 && !self.interrupts.interrupt_in_flight();
        }
        self.advance(timings);
        Ok(timings)
    }

    fn fetch(&self, address: u16) -> Result<Arc<CompiledBlock>, DecodeError> {
        match self.strategy {
            ExecutionStrategy::Caching => self
                .cache
                .get_or_compile(address, || self.dynarec.compile(&self.mmu, address)),
            ExecutionStrategy::Uncached => self.dynarec.compile(&self.mmu, address).map(Arc::new),
        }
    }

    fn dump_registers(&self, e: &DecodeError) {
        let r = &self.registers;
        error!(
            "{e}: PC={:#06X} SP={:#06X} AF={:#06X} BC={:#06X} DE={:#06X} HL={:#06X}",
            r.pc,
            r.sp,
            r.af(),
            r.bc(),
            r.de(),
            r.hl()
        );
    }

    fn advance(&mut self, timings: InstructionTimings) {
        if timings.is_zero() {
            return;
        }
        for sink in &mut self.timing_syncs {
            sink.sync(timings);
        }
        self.clock += u64::from(timings.clock_cycles);
    }

    /// Halt handshake: acknowledge the halt, wait for an interrupt and
    /// accept it. With IFF1 clear and nothing in flight the core resumes
    /// straight away. An interrupt delivered while IFF1 is clear is
    /// consumed without being accepted.
    ///
    /// Blocks the calling thread until another thread delivers an
    /// interrupt unless one is already pending.
    pub fn wait_for_interrupt(&mut self) -> InstructionTimings {
        self.interrupts.notify_halt();
        self.parked = false;

        let timings = if !self.registers.iff1 && !self.interrupts.interrupt_in_flight() {
            InstructionTimings::default()
        } else {
            let address = self.interrupts.wait_for_next_interrupt();
            if self.registers.iff1 {
                self.accept_interrupt(address)
            } else {
                debug!("interrupt {address:#06X} ignored: interrupts disabled");
                InstructionTimings::default()
            }
        };

        self.interrupts.notify_resume();
        self.peripherals.signal_resume();
        self.advance(timings);
        timings
    }

    fn accept_interrupt(&mut self, value: u16) -> InstructionTimings {
        self.registers.iff1 = false;
        self.registers.iff2 = false;
        let return_address = self.registers.pc;
        {
            let mut ctx = ExecutionContext::new(&mut self.registers, &mut self.mmu, &mut self.peripherals);
            ctx.push_word(return_address);
        }

        let (target, timings) = match self.dynarec.mode() {
            CpuMode::GameBoy => (value, GAME_BOY_ACCEPT),
            CpuMode::Z80 => match self.registers.interrupt_mode {
                InterruptMode::Im0 => (value & 0x38, RST_ACCEPT),
                InterruptMode::Im1 => (0x0038, RST_ACCEPT),
                InterruptMode::Im2 => {
                    let vector = u16::from_be_bytes([self.registers.i, value as u8 & 0xFE]);
                    (self.mmu.read_word(vector), VECTOR_ACCEPT)
                }
            },
        };

        debug!(
            "interrupt accepted: value={value:#06X} mode={:?} return={return_address:#06X} target={target:#06X} SP={:#06X}",
            self.registers.interrupt_mode, self.registers.sp
        );
        self.registers.pc = target;
        timings
    }

    /// Run until a decode fault. Blocks while halted.
    pub fn run(&mut self) -> Result<(), CoreError> {
        loop {
            self.step()?;
        }
    }

    /// Run until the clock advanced by at least `t_states` or the CPU
    /// halted with no interrupt to service. Never blocks in the halt
    /// handshake waiting for a request.
    pub fn run_for(&mut self, t_states: u64) -> Result<StopReason, CoreError> {
        let target = self.clock.saturating_add(t_states);
        let reason = loop {
            if self.clock >= target {
                break StopReason::CycleBudget;
            }
            if self.registers.iff1 && self.interrupts.is_halted_without_request() {
                break StopReason::HaltedAwaitingInterrupt;
            }
            self.step()?;
            if self.parked {
                break StopReason::HaltedWithInterruptsDisabled;
            }
        };

        let stats = self.cache.stats();
        debug!(
            "run stopped ({reason:?}) at PC={:#06X} after {} T-states; cache: {} blocks, {} hits, {} misses, {} invalidations",
            self.registers.pc,
            self.clock,
            self.cache.len(),
            stats.hits,
            stats.misses,
            stats.invalidations
        );
        Ok(reason)
    }
}

#[cfg(test)]
mod tests;
