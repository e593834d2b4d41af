#![allow(clippy::unwrap_used, reason = "allow in test files")]

use super::*;

#[test]
fn round_power_of_two_rounds_half_up() {
    assert_eq!(round_power_of_two(0, 4), 0);
    assert_eq!(round_power_of_two(7, 4), 0);
    assert_eq!(round_power_of_two(8, 4), 1);
    assert_eq!(round_power_of_two(24, 4), 2);
    assert_eq!(round_power_of_two(1, 1), 1);
}

#[test]
fn divide_and_round_rounds_half_up() {
    assert_eq!(divide_and_round(0, 3), 0);
    assert_eq!(divide_and_round(4, 3), 1);
    assert_eq!(divide_and_round(5, 3), 2);
    assert_eq!(divide_and_round(10, 4), 3);
    assert_eq!(divide_and_round(9, 2), 5);
}

#[test]
fn clip_pixel_respects_bit_depth() {
    assert_eq!(clip_pixel(-1, 8), 0);
    assert_eq!(clip_pixel(0, 8), 0);
    assert_eq!(clip_pixel(255, 8), 255);
    assert_eq!(clip_pixel(256, 8), 255);
    assert_eq!(clip_pixel(70_000, 10), 1023);
    assert_eq!(clip_pixel(4096, 12), 4095);
}

#[test]
fn saturate_u16_clamps_both_ends() {
    assert_eq!(saturate_u16(-5), 0);
    assert_eq!(saturate_u16(0), 0);
    assert_eq!(saturate_u16(65_535), 65_535);
    assert_eq!(saturate_u16(65_536), 65_535);
}
