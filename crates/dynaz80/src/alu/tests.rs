use super::*;
use crate::flags::{FlagLayout, Flags};

fn flags() -> Flags {
    Flags::new(FlagLayout::Z80)
}

#[test]
fn add_then_subtract_round_trips_every_pair() {
    let mut f = flags();
    for a in 0..=255u8 {
        for b in 0..=255u8 {
            let sum = add(&mut f, a, b);
            assert_eq!(f.carry(), u16::from(a) + u16::from(b) > 255, "carry for {a:#04x}+{b:#04x}");
            assert_eq!(subtract(&mut f, sum, b), a);
        }
    }
}

#[test]
fn add_sets_overflow_and_half_carry() {
    let mut f = flags();
    assert_eq!(add(&mut f, 0x7F, 0x01), 0x80);
    assert!(f.parity_overflow());
    assert!(f.half_carry());
    assert!(f.sign());
    assert!(!f.carry());
    assert!(!f.subtract());

    assert_eq!(add(&mut f, 0xFF, 0x01), 0x00);
    assert!(f.zero());
    assert!(f.carry());
    assert!(!f.parity_overflow());
}

#[test]
fn add_with_carry_consumes_the_carry() {
    let mut f = flags();
    f.set_carry(true);
    assert_eq!(add_with_carry(&mut f, 0x0E, 0x01), 0x10);
    assert!(f.half_carry());
    assert!(!f.carry());
}

#[test]
fn subtract_with_carry_borrows() {
    let mut f = flags();
    f.set_carry(true);
    assert_eq!(subtract_with_carry(&mut f, 0x00, 0x00), 0xFF);
    assert!(f.carry());
    assert!(f.half_carry());
    assert!(f.subtract());
    assert!(f.sign());
}

#[test]
fn subtract_detects_signed_overflow() {
    let mut f = flags();
    assert_eq!(subtract(&mut f, 0x80, 0x01), 0x7F);
    assert!(f.parity_overflow());
    assert!(!f.carry());
}

#[test]
fn compare_keeps_operand_and_takes_undocumented_bits_from_it() {
    let mut f = flags();
    compare(&mut f, 0x10, 0x28);
    assert!(f.carry());
    assert!(f.flag5());
    assert!(f.flag3());
    assert!(!f.zero());

    compare(&mut f, 0x42, 0x42);
    assert!(f.zero());
    assert!(!f.carry());
}

#[test]
fn increment_and_decrement_overflow_at_the_sign_boundary() {
    let mut f = flags();
    f.set_carry(true);
    assert_eq!(increment(&mut f, 0x7F), 0x80);
    assert!(f.parity_overflow());
    assert!(f.half_carry());
    assert!(f.carry(), "carry is unaffected");

    assert_eq!(decrement(&mut f, 0x80), 0x7F);
    assert!(f.parity_overflow());
    assert!(f.half_carry());
    assert!(f.subtract());

    assert_eq!(decrement(&mut f, 0x01), 0x00);
    assert!(f.zero());
    assert!(!f.parity_overflow());
}

#[test]
fn logic_ops_keep_the_half_carry_asymmetry() {
    let mut f = flags();
    f.set_carry(true);
    assert_eq!(and(&mut f, 0xF0, 0x3C), 0x30);
    assert!(f.half_carry());
    assert!(!f.carry());
    assert!(f.parity_overflow());

    assert_eq!(or(&mut f, 0x01, 0x02), 0x03);
    assert!(!f.half_carry());
    assert!(f.parity_overflow());

    assert_eq!(xor(&mut f, 0xFF, 0xFF), 0x00);
    assert!(!f.half_carry());
    assert!(f.zero());
}

#[test]
fn add16_leaves_sign_zero_and_parity_alone() {
    let mut f = flags();
    f.set_zero(true);
    f.set_sign(true);
    f.set_parity_overflow(true);
    assert_eq!(add16(&mut f, 0x0FFF, 0x0001), 0x1000);
    assert!(f.half_carry());
    assert!(f.zero());
    assert!(f.sign());
    assert!(f.parity_overflow());
    assert!(!f.carry());

    assert_eq!(add16(&mut f, 0xFFFF, 0x0001), 0x0000);
    assert!(f.carry());
}

#[test]
fn add16_refreshes_undocumented_bits_from_high_byte() {
    let mut f = flags();
    add16(&mut f, 0x2800, 0x0000);
    assert!(f.flag5());
    assert!(f.flag3());
}

#[test]
fn sixteen_bit_carry_ops_set_full_flags() {
    let mut f = flags();
    f.set_carry(true);
    assert_eq!(subtract16_with_carry(&mut f, 0x0001, 0x0000), 0x0000);
    assert!(f.zero());
    assert!(f.subtract());
    assert!(!f.carry());

    f.set_carry(false);
    assert_eq!(add16_with_carry(&mut f, 0x7FFF, 0x0001), 0x8000);
    assert!(f.parity_overflow());
    assert!(f.sign());
    assert!(f.half_carry());
}

#[test]
fn decimal_adjust_after_addition() {
    let mut f = flags();
    let sum = add(&mut f, 0x15, 0x27);
    assert_eq!(decimal_adjust(&mut f, sum), 0x42);
    assert!(!f.carry());

    let sum = add(&mut f, 0x99, 0x01);
    assert_eq!(decimal_adjust(&mut f, sum), 0x00);
    assert!(f.carry());
    assert!(f.zero());
}

#[test]
fn decimal_adjust_after_subtraction() {
    let mut f = flags();
    let difference = subtract(&mut f, 0x42, 0x15);
    assert_eq!(decimal_adjust(&mut f, difference), 0x27);
    assert!(f.subtract());
}

#[test]
fn game_boy_decimal_adjust_clears_half_carry() {
    let mut f = Flags::new(FlagLayout::GameBoy);
    let sum = add(&mut f, 0x38, 0x45);
    assert_eq!(decimal_adjust_game_boy(&mut f, sum), 0x83);
    assert!(!f.half_carry());
    assert!(!f.carry());
}

#[test]
fn rotates_pick_the_right_carry_source() {
    let mut f = flags();
    assert_eq!(rotate_left(&mut f, 0x81), 0x03);
    assert!(f.carry());

    f.set_carry(false);
    assert_eq!(rotate_left_through_carry(&mut f, 0x81), 0x02);
    assert!(f.carry());

    assert_eq!(rotate_right(&mut f, 0x01), 0x80);
    assert!(f.carry());

    f.set_carry(false);
    assert_eq!(rotate_right_through_carry(&mut f, 0x01), 0x00);
    assert!(f.carry());
    assert!(f.zero());
}

#[test]
fn shifts_fill_vacated_bits() {
    let mut f = flags();
    assert_eq!(shift_left(&mut f, 0xC1), 0x82);
    assert!(f.carry());
    assert_eq!(shift_left_set(&mut f, 0x40), 0x81);
    assert!(!f.carry());
    assert_eq!(shift_right(&mut f, 0x81), 0xC0);
    assert!(f.carry());
    assert_eq!(shift_right_logical(&mut f, 0x81), 0x40);
    assert!(f.carry());
    assert!(!f.half_carry());
    assert!(!f.subtract());
}

#[test]
fn accumulator_rotate_preserves_sign_zero_parity() {
    let mut f = flags();
    f.set_zero(true);
    f.set_parity_overflow(true);
    assert_eq!(rotate_accumulator(&mut f, 0x80, rotate_left), 0x01);
    assert!(f.zero());
    assert!(f.parity_overflow());
    assert!(f.carry());
}

#[test]
fn bit_test_reports_clear_bits_as_zero() {
    let mut f = flags();
    bit_test(&mut f, 7, 0x80);
    assert!(!f.zero());
    assert!(f.sign());
    assert!(f.half_carry());

    bit_test(&mut f, 0, 0x80);
    assert!(f.zero());
    assert!(f.parity_overflow());
}

#[test]
fn digit_rotations_move_nibbles() {
    let mut f = flags();
    assert_eq!(rotate_left_digit(&mut f, 0x12, 0x34), (0x13, 0x42));
    assert_eq!(rotate_right_digit(&mut f, 0x12, 0x34), (0x14, 0x23));
}

#[test]
fn stack_offset_flags_come_from_low_byte() {
    let mut f = Flags::new(FlagLayout::GameBoy);
    assert_eq!(add_stack_offset(&mut f, 0x00FF, 1), 0x0100);
    assert!(f.half_carry());
    assert!(f.carry());
    assert!(!f.zero());

    assert_eq!(add_stack_offset(&mut f, 0x1000, -1), 0x0FFF);
    assert!(!f.half_carry());
    assert!(!f.carry());
}

#[test]
fn swap_exchanges_nibbles() {
    let mut f = Flags::new(FlagLayout::GameBoy);
    f.set_carry(true);
    assert_eq!(swap(&mut f, 0xF1), 0x1F);
    assert!(!f.carry());
    assert_eq!(swap(&mut f, 0x00), 0x00);
    assert!(f.zero());
}

#[test]
fn block_compare_tracks_remaining_count() {
    let mut f = flags();
    f.set_carry(true);
    block_compare(&mut f, 0x10, 0x10, 0);
    assert!(f.zero());
    assert!(!f.parity_overflow());
    assert!(f.carry(), "carry is unaffected");

    block_transfer(&mut f, 0x00, 0x00, 5);
    assert!(f.parity_overflow());
}
