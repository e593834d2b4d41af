#[cfg(test)]
mod tests;

#[cfg(target_arch = "x86_64")]
cpufeatures::new!(cpuid_avx2, "avx2");

#[cfg(target_arch = "x86_64")]
pub use cpuid_avx2::get as has_avx2;

/// Shifts `value` right by `n` bits, rounding half away from zero
/// for non-negative inputs.
#[must_use]
pub const fn round_power_of_two(value: i32, n: i32) -> i32 {
    (value + (1 << (n - 1))) >> n
}

/// Integer division rounding half up. `y` must be positive.
#[must_use]
pub const fn divide_and_round(x: i32, y: i32) -> i32 {
    (x + (y >> 1)) / y
}

/// Clamps `value` to the representable pixel range for `bit_depth`.
#[must_use]
pub fn clip_pixel(value: i32, bit_depth: u8) -> u16 {
    let max = (1i32 << bit_depth) - 1;
    value.clamp(0, max) as u16
}

/// Narrows a shifted accumulator to `u16`, saturating at both ends.
/// Matches the semantics of a hardware saturating narrow, which the
/// vector paths rely on.
#[must_use]
pub(crate) fn saturate_u16(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}
