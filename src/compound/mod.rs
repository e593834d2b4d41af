#[cfg(target_arch = "x86_64")]
mod avx2;
mod rust;

use cfg_if::cfg_if;

use crate::{
    convolve::ConvolveParams,
    filter::{COMPOUND_ROUND1_BITS, FILTER_BITS, ROUND0_BITS},
};

/// Log2 of the distance weighted blend precision. Weight pairs sum to
/// `1 << DIST_PRECISION_BITS`.
pub const DIST_PRECISION_BITS: i32 = 4;

/// Forward/backward weight pairs for the distance weighted blend,
/// ordered by increasing temporal distance ratio.
pub static DIST_WTD_WEIGHTS: [[i32; 2]; 4] = [[9, 7], [11, 5], [12, 4], [13, 3]];

/// Final right shift folding the accumulator back to pixel scale.
const ROUND_BITS: i32 = 2 * FILTER_BITS - ROUND0_BITS - COMPOUND_ROUND1_BITS;

fn round_offset(bit_depth: u8) -> i32 {
    let offset_bits = i32::from(bit_depth) + 2 * FILTER_BITS - ROUND0_BITS;
    (1 << (offset_bits - COMPOUND_ROUND1_BITS)) + (1 << (offset_bits - COMPOUND_ROUND1_BITS - 1))
}

// The vector kernels only handle 4-wide and multiple-of-8 rows; other
// shapes stay on the scalar path.
macro_rules! blend {
    ($name:ident($($arg:expr),* $(,)?), $w:expr) => {
        cfg_if! {
            if #[cfg(all(target_arch = "x86_64", not(feature = "no_simd")))] {
                if crate::util::has_avx2() && ($w == 4 || $w % 8 == 0) {
                    // SAFETY: We check for AVX2 first
                    unsafe {
                        avx2::$name($($arg),*);
                    }
                } else {
                    rust::$name($($arg),*);
                }
            } else {
                rust::$name($($arg),*);
            }
        }
    };
}

/// Averages the stored first prediction with `pre` and folds the
/// intermediate offset back out, producing final pixels.
pub fn comp_avg(
    pre: &[u16],
    pre_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    width: usize,
    height: usize,
    conv_params: &ConvolveParams<'_>,
    bit_depth: u8,
) {
    blend!(
        comp_avg(pre, pre_stride, dst, dst_stride, width, height, conv_params, bit_depth),
        width
    );
}

/// Distance weighted variant of [`comp_avg`]: the stored prediction is
/// scaled by the forward weight and `pre` by the backward weight before
/// the offset is removed.
pub fn jnt_comp_avg(
    pre: &[u16],
    pre_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    width: usize,
    height: usize,
    conv_params: &ConvolveParams<'_>,
    bit_depth: u8,
) {
    blend!(
        jnt_comp_avg(pre, pre_stride, dst, dst_stride, width, height, conv_params, bit_depth),
        width
    );
}
