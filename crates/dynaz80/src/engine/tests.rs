use std::sync::{Arc, Mutex};
use std::thread;

use super::*;
use crate::config::InitialState;
use crate::error::OpcodePrefix;
use crate::mmu::{RamSegment, RomSegment};

#[derive(Default)]
struct RecordingPorts {
    writes: Vec<(u8, u8)>,
    halts: usize,
    resumes: usize,
    attached: Option<InterruptManager>,
}

impl PeripheralManager for RecordingPorts {
    fn read_byte_from_port(&mut self, _port: u8, _context: u8) -> u8 {
        0xFF
    }

    fn write_byte_to_port(&mut self, port: u8, _context: u8, value: u8) {
        self.writes.push((port, value));
    }

    fn signal_halt(&mut self) {
        self.halts += 1;
    }

    fn signal_resume(&mut self) {
        self.resumes += 1;
    }

    fn attach_interrupt_manager(&mut self, interrupts: InterruptManager) {
        self.attached = Some(interrupts);
    }
}

fn ram(program: &[u8]) -> Vec<Segment> {
    vec![Segment::read_write(RamSegment::with_contents(0x0000, 0x10000, program))]
}

fn core_with(config: CoreConfig, program: &[u8]) -> Core<RecordingPorts> {
    Core::new(config, ram(program), RecordingPorts::default(), InterruptManager::new()).unwrap()
}

fn z80(program: &[u8]) -> Core<RecordingPorts> {
    let state = InitialState::builder().sp(0xFF00).build();
    core_with(CoreConfig::builder().initial_state(state).build(), program)
}

#[test]
fn construction_fails_on_a_segment_gap() {
    let segments = vec![Segment::read_write(RamSegment::new(0x0000, 0x8000))];
    let result = Core::new(
        CoreConfig::default(),
        segments,
        RecordingPorts::default(),
        InterruptManager::new(),
    );
    assert!(matches!(
        result,
        Err(CoreError::Config(crate::error::ConfigError::SegmentGap {
            from: 0x8000,
            to: 0x10000
        }))
    ));
}

#[test]
fn peripherals_receive_the_interrupt_manager() {
    let core = z80(&[0x76]);
    assert!(core.peripherals().attached.is_some());
}

#[test]
fn step_runs_one_block_and_advances_the_clock() {
    // LD A,0x41 ; OUT (0x01),A ; JP 0x0000
    let mut core = z80(&[0x3E, 0x41, 0xD3, 0x01, 0xC3, 0x00, 0x00]);
    let timings = core.step().unwrap();

    assert_eq!(timings, InstructionTimings::new(2 + 3 + 3, 7 + 11 + 10));
    assert_eq!(core.clock(), 28);
    assert_eq!(core.registers().pc, 0x0000);
    assert_eq!(core.peripherals().writes, vec![(0x01, 0x41)]);
    assert_eq!(core.registers().r, 7);
}

#[test]
fn cached_blocks_are_compiled_once() {
    // INC A ; JP 0x0000
    let mut core = z80(&[0x3C, 0xC3, 0x00, 0x00]);
    for _ in 0..10 {
        core.step().unwrap();
    }
    assert_eq!(core.registers().a(), 10);
    let stats = core.cache().stats();
    assert_eq!(stats.compilations, 1);
    assert_eq!(stats.hits, 9);
}

#[test]
fn uncached_strategy_never_fills_the_cache() {
    let config = CoreConfig::builder().strategy(ExecutionStrategy::Uncached).build();
    let mut core = core_with(config, &[0x3C, 0xC3, 0x00, 0x00]);
    for _ in 0..4 {
        core.step().unwrap();
    }
    assert_eq!(core.registers().a(), 4);
    assert!(core.cache().is_empty());
    assert_eq!(core.cache().stats().compilations, 0);
}

#[test]
fn self_modifying_code_is_recompiled() {
    // LD A,0x01 ; LD HL,0x0001 ; INC (HL) ; JP 0x0000
    // INC (HL) bumps the immediate of the first instruction.
    let mut core = z80(&[0x3E, 0x01, 0x21, 0x01, 0x00, 0x34, 0xC3, 0x00, 0x00]);
    core.step().unwrap();
    assert_eq!(core.registers().a(), 0x01);
    assert_eq!(core.mmu().read_byte(0x0001), 0x02);

    core.step().unwrap();
    assert_eq!(core.registers().a(), 0x02, "stale block was not reused");
    assert_eq!(core.cache().stats().compilations, 2);
}

#[test]
fn host_writes_invalidate_blocks() {
    let mut core = z80(&[0x3E, 0x01, 0xC3, 0x00, 0x00]);
    core.step().unwrap();
    core.mmu_mut().write_byte(0x0001, 0x07);
    core.step().unwrap();
    assert_eq!(core.registers().a(), 0x07);
}

#[test]
fn timing_sinks_see_every_block() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut core = z80(&[0x00, 0xC3, 0x00, 0x00]);
    {
        let seen = Arc::clone(&seen);
        core.add_timing_sync(move |timings: InstructionTimings| seen.lock().unwrap().push(timings));
    }
    core.step().unwrap();
    core.step().unwrap();
    let expected = InstructionTimings::new(4, 14);
    assert_eq!(*seen.lock().unwrap(), vec![expected, expected]);
}

#[test]
fn run_for_stops_on_the_cycle_budget() {
    let mut core = z80(&[0x00, 0xC3, 0x00, 0x00]);
    assert_eq!(core.run_for(100).unwrap(), StopReason::CycleBudget);
    assert_eq!(core.clock(), 112);
}

#[test]
fn halt_with_interrupts_disabled_parks_the_core() {
    // DI ; LD A,0x2A ; HALT
    let mut core = z80(&[0xF3, 0x3E, 0x2A, 0x76]);
    assert_eq!(core.run_for(1_000_000).unwrap(), StopReason::HaltedWithInterruptsDisabled);
    assert_eq!(core.registers().pc, 0x0004);
    assert_eq!(core.registers().a(), 0x2A);
    assert_eq!(core.peripherals().halts, 1);
    assert!(core.interrupts().is_halted());
}

#[test]
fn halted_core_with_interrupts_disabled_resumes_without_waiting() {
    // DI ; HALT ; INC A ; HALT
    let mut core = z80(&[0xF3, 0x76, 0x3C, 0x76]);
    core.run_for(1_000).unwrap();
    assert_eq!(core.step().unwrap(), InstructionTimings::default());
    assert!(!core.interrupts().is_halted());
    assert_eq!(core.peripherals().resumes, 1);

    assert_eq!(core.run_for(1_000).unwrap(), StopReason::HaltedWithInterruptsDisabled);
    assert_eq!(core.registers().a(), 1);
}

#[test]
fn halt_with_interrupts_enabled_returns_instead_of_blocking() {
    // EI ; HALT
    let mut core = z80(&[0xFB, 0x76]);
    assert_eq!(core.run_for(1_000_000).unwrap(), StopReason::HaltedAwaitingInterrupt);
    assert_eq!(core.registers().pc, 0x0002);
    assert!(core.interrupts().is_halted());
    assert!(core.clock() < 1_000_000);

    // Still nothing to service on the next call.
    let clock = core.clock();
    assert_eq!(core.run_for(1_000).unwrap(), StopReason::HaltedAwaitingInterrupt);
    assert_eq!(core.clock(), clock);
}

#[test]
fn queued_request_is_serviced_by_run_for() {
    // EI ; HALT, with JP 0x0038 as the handler
    let state = InitialState::builder().sp(0xFF00).interrupt_mode(InterruptMode::Im1).build();
    let mut program = vec![0u8; 0x40];
    program[..2].copy_from_slice(&[0xFB, 0x76]);
    program[0x38..0x3B].copy_from_slice(&[0xC3, 0x38, 0x00]);
    let mut core = core_with(CoreConfig::builder().initial_state(state).build(), &program);
    assert_eq!(core.run_for(1_000).unwrap(), StopReason::HaltedAwaitingInterrupt);

    assert!(core.interrupts().request_interrupt(0x00FF));
    assert_eq!(core.run_for(100).unwrap(), StopReason::CycleBudget);
    assert!(!core.interrupts().is_halted());
    assert_eq!(core.registers().pc, 0x0038);
    assert_eq!(core.mmu().read_word(0xFEFE), 0x0002);
}

#[test]
fn decode_faults_propagate_out_of_the_loop() {
    let mut core = z80(&[0x00, 0xED, 0x00]);
    let err = core.run_for(100).unwrap_err();
    assert_eq!(
        err,
        CoreError::Decode(DecodeError::UnsupportedOpcode {
            prefix: OpcodePrefix::Ed,
            opcode: 0x00,
            address: 0x0001,
        })
    );
    assert!(core.cache().is_empty());
}

fn halted_with_interrupts_enabled(mode: InterruptMode) -> Core<RecordingPorts> {
    let state = InitialState::builder()
        .sp(0xFF00)
        .iff1(true)
        .iff2(true)
        .interrupt_mode(mode)
        .i(0x40)
        .build();
    let mut program = vec![0u8; 0x10000];
    program[0x0000] = 0x76;
    // IM 2 vector table entry
    program[0x4010] = 0x34;
    program[0x4011] = 0x12;
    let mut core = core_with(CoreConfig::builder().initial_state(state).build(), &program);
    core.step().unwrap();
    assert!(core.interrupts().is_halted());
    core
}

#[test]
fn im1_accepts_at_0x38() {
    let mut core = halted_with_interrupts_enabled(InterruptMode::Im1);
    core.interrupts().request_interrupt(0x00FF);
    let timings = core.step().unwrap();

    assert_eq!(timings, InstructionTimings::new(3, 13));
    assert_eq!(core.registers().pc, 0x0038);
    assert_eq!(core.registers().sp, 0xFEFE);
    assert_eq!(core.mmu().read_word(0xFEFE), 0x0001, "return address is past the HALT");
    assert!(!core.registers().iff1);
    assert!(!core.registers().iff2);
    assert!(!core.interrupts().is_halted());
    assert_eq!(core.clock(), 4 + 13);
}

#[test]
fn im0_treats_the_value_as_an_rst() {
    let mut core = halted_with_interrupts_enabled(InterruptMode::Im0);
    core.interrupts().request_interrupt(0x00D7);
    core.step().unwrap();
    assert_eq!(core.registers().pc, 0x0010);
}

#[test]
fn im2_reads_the_vector_table() {
    let mut core = halted_with_interrupts_enabled(InterruptMode::Im2);
    core.interrupts().request_interrupt(0x0011);
    let timings = core.step().unwrap();
    assert_eq!(timings, InstructionTimings::new(5, 19));
    assert_eq!(core.registers().pc, 0x1234);
}

#[test]
fn game_boy_jumps_to_the_delivered_address() {
    let state = InitialState::builder().sp(0xFFFE).iff1(true).build();
    let config = CoreConfig::builder()
        .mode(CpuMode::GameBoy)
        .initial_state(state)
        .build();
    let mut core = core_with(config, &[0x00, 0x76]);
    core.step().unwrap();
    core.interrupts().request_interrupt(0x0050);
    let timings = core.step().unwrap();

    assert_eq!(timings, InstructionTimings::new(5, 20));
    assert_eq!(core.registers().pc, 0x0050);
    assert_eq!(core.mmu().read_word(0xFFFC), 0x0002);
}

#[test]
fn request_while_running_interrupts_the_next_step() {
    let state = InitialState::builder().sp(0xFF00).iff1(true).interrupt_mode(InterruptMode::Im1).build();
    let mut core = core_with(CoreConfig::builder().initial_state(state).build(), &[0x00, 0xC3, 0x00, 0x00]);
    core.step().unwrap();
    core.interrupts().request_interrupt(0x0000);
    core.step().unwrap();
    assert_eq!(core.registers().pc, 0x0038);
    assert_eq!(core.mmu().read_word(0xFEFE), 0x0000);
}

#[test]
fn interrupt_with_interrupts_disabled_is_consumed() {
    let mut core = z80(&[0xF3, 0x00, 0xC3, 0x01, 0x00]);
    core.step().unwrap();
    core.interrupts().request_interrupt(0x0038);
    assert_eq!(core.step().unwrap(), InstructionTimings::default());
    assert_eq!(core.registers().pc, 0x0001);
    assert!(!core.interrupts().interrupt_in_flight());
}

#[test]
fn interrupt_from_another_thread_wakes_the_loop() {
    // EI ; HALT
    let state = InitialState::builder().sp(0xFF00).interrupt_mode(InterruptMode::Im1).build();
    let mut program = vec![0u8; 0x40];
    program[0x00] = 0xFB;
    program[0x01] = 0x76;
    // 0x38: DI ; HALT
    program[0x38] = 0xF3;
    program[0x39] = 0x76;
    let mut core = core_with(CoreConfig::builder().initial_state(state).build(), &program);

    core.step().unwrap();
    assert!(core.interrupts().is_halted());

    let interrupts = core.interrupts().clone();
    let producer = thread::spawn(move || interrupts.interrupt(0x00FF));

    // Blocks in the handshake until the producer delivers.
    let timings = core.step().unwrap();
    assert!(producer.join().unwrap());
    assert_eq!(timings, InstructionTimings::new(3, 13));

    let reason = core.run_for(u64::MAX).unwrap();
    assert_eq!(reason, StopReason::HaltedWithInterruptsDisabled);
    assert_eq!(core.registers().pc, 0x003A);
}

#[test]
fn rom_segments_are_not_written() {
    // LD A,0x55 ; LD (0x0010),A ; LD A,(0x0010) ; DI ; HALT
    let program = [0x3E, 0x55, 0x32, 0x10, 0x00, 0x3A, 0x10, 0x00, 0xF3, 0x76];
    let segments = vec![
        Segment::read_only(RomSegment::new(0x0000, 0x8000, &program)),
        Segment::read_write(RamSegment::new(0x8000, 0x8000)),
    ];
    let mut core = Core::new(
        CoreConfig::default(),
        segments,
        RecordingPorts::default(),
        InterruptManager::new(),
    )
    .unwrap();
    core.run_for(10_000).unwrap();
    assert_eq!(core.registers().a(), 0xFF);
}
