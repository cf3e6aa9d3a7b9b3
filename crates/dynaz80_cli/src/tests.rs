use dynaz80::{ReadableAddressSegment, StopReason, WriteableAddressSegment};

use super::*;

/// Prints each byte of `text` on port 0x01, then DI ; HALT.
fn z80_printer(text: &[u8]) -> Vec<u8> {
    let mut program = Vec::new();
    for &byte in text {
        // LD A,n ; OUT (0x01),A
        program.extend_from_slice(&[0x3E, byte, 0xD3, 0x01]);
    }
    program.extend_from_slice(&[0xF3, 0x76]);
    program
}

#[test]
fn platform_names() {
    assert_eq!(Platform::from_name("z80"), Some(Platform::Z80));
    assert_eq!(Platform::from_name("gameboy"), Some(Platform::GameBoy));
    assert_eq!(Platform::from_name("nes"), None);
}

#[test]
fn z80_console_output_is_captured() {
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(z80_printer(b"OK\n"))
        .build();
    let summary = run(options).unwrap();

    assert_eq!(summary.output_text(), "OK\n");
    assert_eq!(summary.stop, StopReason::HaltedWithInterruptsDisabled);
    assert_eq!(summary.registers.pc, 14);
}

#[test]
fn z80_image_runs_from_the_load_address() {
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(z80_printer(b"hi"))
        .load_address(0x7FFC)
        .build();
    let summary = run(options).unwrap();

    assert_eq!(summary.output, b"hi");
    assert_eq!(summary.registers.pc, 0x7FFC + 10);
}

#[test]
fn z80_other_ports_are_not_console_output() {
    // LD A,0x21 ; OUT (0x02),A ; OUT (0x07),A ; DI ; HALT
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(vec![0x3E, 0x21, 0xD3, 0x02, 0xD3, 0x07, 0xF3, 0x76])
        .console_port(0x07)
        .build();
    let summary = run(options).unwrap();
    assert_eq!(summary.output, b"!");
}

#[test]
fn z80_cycle_budget_stops_a_spinning_program() {
    // JR $
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(vec![0x18, 0xFE])
        .cycle_budget(1_200)
        .build();
    let summary = run(options).unwrap();

    assert_eq!(summary.stop, StopReason::CycleBudget);
    assert_eq!(summary.clock, 1_200);
    assert_eq!(summary.cache.compilations, 1);
}

#[test]
fn z80_image_too_large_for_the_load_address() {
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(vec![0; 0x20])
        .load_address(0xFFF0)
        .build();
    assert!(run(options).is_err());
}

#[test]
fn z80_halt_with_interrupts_enabled_ends_the_run() {
    // EI ; HALT: no peripheral here ever raises an interrupt.
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(vec![0xFB, 0x76])
        .cycle_budget(1_000)
        .build();
    let summary = run(options).unwrap();

    assert_eq!(summary.stop, StopReason::HaltedAwaitingInterrupt);
    assert_eq!(summary.registers.pc, 2);
    assert!(summary.clock < 1_000);
}

#[test]
fn game_boy_halt_with_ime_set_ends_the_run() {
    let mut rom = vec![0u8; 0x100];
    // EI ; HALT
    rom.extend_from_slice(&[0xFB, 0x76]);

    let options = RunOptions::builder()
        .platform(Platform::GameBoy)
        .image(rom)
        .build();
    let summary = run(options).unwrap();

    assert_eq!(summary.stop, StopReason::HaltedAwaitingInterrupt);
    assert_eq!(summary.registers.pc, 0x0102);
}

#[test]
fn z80_decode_fault_is_reported() {
    let options = RunOptions::builder()
        .platform(Platform::Z80)
        .image(vec![0xED, 0xFF])
        .build();
    let err = run(options).unwrap_err();
    assert!(err.to_string().contains("ED opcode 0xFF"), "{err}");
}

#[test]
fn game_boy_serial_output_is_captured() {
    let mut rom = vec![0u8; 0x150];
    let mut code = Vec::new();
    for &byte in b"Passed" {
        // LD A,n ; LDH (SB),A ; LD A,0x81 ; LDH (SC),A
        code.extend_from_slice(&[0x3E, byte, 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02]);
    }
    // DI ; HALT
    code.extend_from_slice(&[0xF3, 0x76]);
    rom[0x100..0x100 + code.len()].copy_from_slice(&code);
    rom.resize(0x100 + code.len(), 0);

    let options = RunOptions::builder()
        .platform(Platform::GameBoy)
        .image(rom)
        .build();
    let summary = run(options).unwrap();

    assert_eq!(summary.output_text(), "Passed");
    assert_eq!(summary.stop, StopReason::HaltedWithInterruptsDisabled);
}

#[test]
fn serial_transfer_needs_the_internal_clock() {
    let mut serial = SerialPort::new();
    let output = serial.output();
    serial.write_byte(0x01, b'x');
    serial.write_byte(0x02, 0x80);
    assert!(output.lock().unwrap().is_empty());
    assert_eq!(serial.read_byte(0x02), 0x80);

    serial.write_byte(0x02, 0x81);
    assert_eq!(*output.lock().unwrap(), b"x");
    assert_eq!(serial.read_byte(0x01), 0xFF);
    assert_eq!(serial.read_byte(0x02), 0x01);
}
