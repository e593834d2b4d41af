#![allow(clippy::undocumented_unsafe_blocks)]

use std::arch::x86_64::*;

use super::{DIST_PRECISION_BITS, ROUND_BITS, round_offset};
use crate::convolve::ConvolveParams;

// Both blends run in i32 lanes: average or weight the two offset-scale
// predictions, remove the offset with the rounding bias folded in,
// shift, then clamp to the pixel range before narrowing.

#[inline]
unsafe fn load_u16x8_epi32(ptr: *const u16) -> __m256i {
    _mm256_cvtepu16_epi32(_mm_loadu_si128(ptr as *const __m128i))
}

#[inline]
unsafe fn load_u16x4_epi32(ptr: *const u16) -> __m128i {
    _mm_cvtepu16_epi32(_mm_loadl_epi64(ptr as *const __m128i))
}

#[target_feature(enable = "avx2")]
unsafe fn blend_avx2<const JNT: bool>(
    stored: *const u16,
    stored_stride: usize,
    pre: *const u16,
    pre_stride: usize,
    dst: *mut u16,
    dst_stride: usize,
    w: usize,
    h: usize,
    fwd: i32,
    bck: i32,
    bit_depth: u8,
) {
    // Rounding bias folded into the offset removal.
    let bias = (1 << (ROUND_BITS - 1)) - round_offset(bit_depth);
    let max_pixel = (1i32 << bit_depth) - 1;

    if w == 4 {
        let bias_vec = _mm_set1_epi32(bias);
        let max_vec = _mm_set1_epi32(max_pixel);
        let zero = _mm_setzero_si128();
        let fwd_vec = _mm_set1_epi32(fwd);
        let bck_vec = _mm_set1_epi32(bck);
        for y in 0..h {
            let s = load_u16x4_epi32(stored.add(y * stored_stride));
            let r = load_u16x4_epi32(pre.add(y * pre_stride));
            let tmp = if JNT {
                let weighted =
                    _mm_add_epi32(_mm_mullo_epi32(s, fwd_vec), _mm_mullo_epi32(r, bck_vec));
                _mm_srai_epi32::<{ DIST_PRECISION_BITS }>(weighted)
            } else {
                _mm_srai_epi32::<1>(_mm_add_epi32(s, r))
            };
            let v = _mm_srai_epi32::<{ ROUND_BITS }>(_mm_add_epi32(tmp, bias_vec));
            let clamped = _mm_min_epi32(_mm_max_epi32(v, zero), max_vec);
            _mm_storel_epi64(
                dst.add(y * dst_stride) as *mut __m128i,
                _mm_packus_epi32(clamped, clamped),
            );
        }
    } else {
        let bias_vec = _mm256_set1_epi32(bias);
        let max_vec = _mm256_set1_epi32(max_pixel);
        let zero = _mm256_setzero_si256();
        let fwd_vec = _mm256_set1_epi32(fwd);
        let bck_vec = _mm256_set1_epi32(bck);
        for y in 0..h {
            let mut x = 0;
            while x < w {
                let s = load_u16x8_epi32(stored.add(y * stored_stride + x));
                let r = load_u16x8_epi32(pre.add(y * pre_stride + x));
                let tmp = if JNT {
                    let weighted = _mm256_add_epi32(
                        _mm256_mullo_epi32(s, fwd_vec),
                        _mm256_mullo_epi32(r, bck_vec),
                    );
                    _mm256_srai_epi32::<{ DIST_PRECISION_BITS }>(weighted)
                } else {
                    _mm256_srai_epi32::<1>(_mm256_add_epi32(s, r))
                };
                let v = _mm256_srai_epi32::<{ ROUND_BITS }>(_mm256_add_epi32(tmp, bias_vec));
                let clamped = _mm256_min_epi32(_mm256_max_epi32(v, zero), max_vec);
                let packed = _mm256_packus_epi32(clamped, clamped);
                let ordered =
                    _mm256_permute4x64_epi64::<{ crate::simd::_MM_SHUFFLE(3, 1, 2, 0) }>(packed);
                _mm_storeu_si128(
                    dst.add(y * dst_stride + x) as *mut __m128i,
                    _mm256_castsi256_si128(ordered),
                );
                x += 8;
            }
        }
    }
}

macro_rules! blend_kernel {
    ($name:ident, $jnt:literal) => {
        #[target_feature(enable = "avx2")]
        pub fn $name(
            pre: &[u16],
            pre_stride: usize,
            dst: &mut [u16],
            dst_stride: usize,
            width: usize,
            height: usize,
            conv_params: &ConvolveParams<'_>,
            bit_depth: u8,
        ) {
            // Check the array bounds once at the start.
            assert!(width == 4 || width % 8 == 0);
            assert!(pre.len() > (height - 1) * pre_stride + width - 1);
            assert!(dst.len() > (height - 1) * dst_stride + width - 1);
            assert!(conv_params.dst.len() > (height - 1) * conv_params.dst_stride + width - 1);

            unsafe {
                blend_avx2::<$jnt>(
                    conv_params.dst.as_ptr(),
                    conv_params.dst_stride,
                    pre.as_ptr(),
                    pre_stride,
                    dst.as_mut_ptr(),
                    dst_stride,
                    width,
                    height,
                    conv_params.fwd_offset,
                    conv_params.bck_offset,
                    bit_depth,
                );
            }
        }
    };
}

blend_kernel!(comp_avg, false);
blend_kernel!(jnt_comp_avg, true);
