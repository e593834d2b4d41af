#![allow(clippy::undocumented_unsafe_blocks)]

use std::arch::x86_64::*;

use crate::{
    filter::{COMPOUND_ROUND1_BITS, ROUND0_BITS, SUBPEL_TAPS},
    simd::_MM_SHUFFLE,
};

// Every kernel widens u16 samples to i32 lanes, accumulates the
// offset-seeded dot product, shifts, then narrows back through an
// unsigned saturating pack. That matches the scalar path bit for bit,
// including the clamp to [0, 65535] on 12-bit overflow.

#[inline]
unsafe fn load_u16x8_epi32(ptr: *const u16) -> __m256i {
    _mm256_cvtepu16_epi32(_mm_loadu_si128(ptr as *const __m128i))
}

#[inline]
unsafe fn load_u16x4_epi32(ptr: *const u16) -> __m128i {
    _mm_cvtepu16_epi32(_mm_loadl_epi64(ptr as *const __m128i))
}

#[inline]
unsafe fn store_epi32_u16x8(ptr: *mut u16, v: __m256i) {
    let packed = _mm256_packus_epi32(v, v);
    let ordered = _mm256_permute4x64_epi64::<{ _MM_SHUFFLE(3, 1, 2, 0) }>(packed);
    _mm_storeu_si128(ptr as *mut __m128i, _mm256_castsi256_si128(ordered));
}

#[inline]
unsafe fn store_epi32_u16x4(ptr: *mut u16, v: __m128i) {
    let packed = _mm_packus_epi32(v, v);
    _mm_storel_epi64(ptr as *mut __m128i, packed);
}

#[target_feature(enable = "avx2")]
unsafe fn convolve_h_avx2<const FIRST: usize, const TAPS: usize>(
    src: *const u16,
    src_stride: usize,
    dst: *mut u16,
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    if w == 4 {
        let offset_vec = _mm_set1_epi32(offset);
        for y in 0..h {
            let row = src.add(y * src_stride);
            let mut sum = offset_vec;
            for i in 0..TAPS {
                let coeff = _mm_set1_epi32(i32::from(filter[FIRST + i]));
                sum = _mm_add_epi32(sum, _mm_mullo_epi32(load_u16x4_epi32(row.add(i)), coeff));
            }
            store_epi32_u16x4(dst.add(y * dst_stride), _mm_srai_epi32::<{ ROUND0_BITS }>(sum));
        }
    } else {
        let offset_vec = _mm256_set1_epi32(offset);
        for y in 0..h {
            let row = src.add(y * src_stride);
            let out = dst.add(y * dst_stride);
            let mut x = 0;
            while x < w {
                let mut sum = offset_vec;
                for i in 0..TAPS {
                    let coeff = _mm256_set1_epi32(i32::from(filter[FIRST + i]));
                    sum = _mm256_add_epi32(
                        sum,
                        _mm256_mullo_epi32(load_u16x8_epi32(row.add(x + i)), coeff),
                    );
                }
                store_epi32_u16x8(out.add(x), _mm256_srai_epi32::<{ ROUND0_BITS }>(sum));
                x += 8;
            }
        }
    }
}

#[target_feature(enable = "avx2")]
unsafe fn convolve_v_avx2<
    const FIRST: usize,
    const TAPS: usize,
    const BITS: i32,
    const ROUND: bool,
>(
    src: *const u16,
    src_stride: usize,
    dst: *mut u16,
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    if w == 4 {
        let offset_vec = _mm_set1_epi32(offset);
        let round_vec = _mm_set1_epi32(1 << (BITS - 1));
        let mut rows = [_mm_setzero_si128(); TAPS];
        for i in 0..TAPS - 1 {
            rows[i] = load_u16x4_epi32(src.add(i * src_stride));
        }
        for y in 0..h {
            rows[TAPS - 1] = load_u16x4_epi32(src.add((y + TAPS - 1) * src_stride));
            let mut sum = offset_vec;
            for i in 0..TAPS {
                let coeff = _mm_set1_epi32(i32::from(filter[FIRST + i]));
                sum = _mm_add_epi32(sum, _mm_mullo_epi32(rows[i], coeff));
            }
            let shifted = if ROUND {
                _mm_srai_epi32::<{ BITS }>(_mm_add_epi32(sum, round_vec))
            } else {
                _mm_srai_epi32::<{ BITS }>(sum)
            };
            store_epi32_u16x4(dst.add(y * dst_stride), shifted);
            for i in 0..TAPS - 1 {
                rows[i] = rows[i + 1];
            }
        }
    } else {
        let offset_vec = _mm256_set1_epi32(offset);
        let round_vec = _mm256_set1_epi32(1 << (BITS - 1));
        let mut x = 0;
        while x < w {
            let col = src.add(x);
            let mut rows = [_mm256_setzero_si256(); TAPS];
            for i in 0..TAPS - 1 {
                rows[i] = load_u16x8_epi32(col.add(i * src_stride));
            }
            for y in 0..h {
                rows[TAPS - 1] = load_u16x8_epi32(col.add((y + TAPS - 1) * src_stride));
                let mut sum = offset_vec;
                for i in 0..TAPS {
                    let coeff = _mm256_set1_epi32(i32::from(filter[FIRST + i]));
                    sum = _mm256_add_epi32(sum, _mm256_mullo_epi32(rows[i], coeff));
                }
                let shifted = if ROUND {
                    _mm256_srai_epi32::<{ BITS }>(_mm256_add_epi32(sum, round_vec))
                } else {
                    _mm256_srai_epi32::<{ BITS }>(sum)
                };
                store_epi32_u16x8(dst.add(y * dst_stride + x), shifted);
                for i in 0..TAPS - 1 {
                    rows[i] = rows[i + 1];
                }
            }
            x += 8;
        }
    }
}

macro_rules! horizontal_kernel {
    ($name:ident, $first:literal, $taps:literal) => {
        #[target_feature(enable = "avx2")]
        pub fn $name(
            src: &[u16],
            src_stride: usize,
            dst: &mut [u16],
            dst_stride: usize,
            w: usize,
            h: usize,
            filter: &[i16; SUBPEL_TAPS],
            offset: i32,
        ) {
            // Check the array bounds once at the start.
            assert!(w == 4 || w % 8 == 0);
            assert!(src.len() > (h - 1) * src_stride + w - 2 + $taps);
            assert!(dst.len() > (h - 1) * dst_stride + w - 1);

            unsafe {
                convolve_h_avx2::<$first, $taps>(
                    src.as_ptr(),
                    src_stride,
                    dst.as_mut_ptr(),
                    dst_stride,
                    w,
                    h,
                    filter,
                    offset,
                );
            }
        }
    };
}

macro_rules! vertical_kernel {
    ($name:ident, $first:literal, $taps:literal, $bits:expr, $round:literal) => {
        #[target_feature(enable = "avx2")]
        pub fn $name(
            src: &[u16],
            src_stride: usize,
            dst: &mut [u16],
            dst_stride: usize,
            w: usize,
            h: usize,
            filter: &[i16; SUBPEL_TAPS],
            offset: i32,
        ) {
            // Check the array bounds once at the start.
            assert!(w == 4 || w % 8 == 0);
            assert!(src.len() > (h + $taps - 2) * src_stride + w - 1);
            assert!(dst.len() > (h - 1) * dst_stride + w - 1);

            unsafe {
                convolve_v_avx2::<$first, $taps, { $bits }, $round>(
                    src.as_ptr(),
                    src_stride,
                    dst.as_mut_ptr(),
                    dst_stride,
                    w,
                    h,
                    filter,
                    offset,
                );
            }
        }
    };
}

horizontal_kernel!(convolve_x_8tap, 0, 8);
horizontal_kernel!(convolve_x_6tap, 1, 6);
horizontal_kernel!(convolve_x_4tap, 2, 4);

vertical_kernel!(convolve_y_8tap, 0, 8, ROUND0_BITS, false);
vertical_kernel!(convolve_y_6tap, 1, 6, ROUND0_BITS, false);
vertical_kernel!(convolve_y_4tap, 2, 4, ROUND0_BITS, false);
vertical_kernel!(convolve_2d_v_8tap, 0, 8, COMPOUND_ROUND1_BITS, true);
vertical_kernel!(convolve_2d_v_6tap, 1, 6, COMPOUND_ROUND1_BITS, true);

#[target_feature(enable = "avx2")]
pub fn copy_2d(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    round_bits: i32,
    round_offset: u16,
) {
    // Check the array bounds once at the start.
    assert!(w == 4 || w % 8 == 0);
    assert!(src.len() > (h - 1) * src_stride + w - 1);
    assert!(dst.len() > (h - 1) * dst_stride + w - 1);

    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();
    // 16-bit shifts and adds wrap, which the 12-bit offset relies on.
    let shift = unsafe { _mm_cvtsi32_si128(round_bits) };

    if w == 4 {
        let offset_vec = unsafe { _mm_set1_epi16(round_offset as i16) };
        for y in 0..h {
            unsafe {
                let s = _mm_loadl_epi64(src_ptr.add(y * src_stride) as *const __m128i);
                let v = _mm_add_epi16(_mm_sll_epi16(s, shift), offset_vec);
                _mm_storel_epi64(dst_ptr.add(y * dst_stride) as *mut __m128i, v);
            }
        }
    } else {
        let offset_wide = unsafe { _mm256_set1_epi16(round_offset as i16) };
        let offset_narrow = unsafe { _mm_set1_epi16(round_offset as i16) };
        for y in 0..h {
            let mut x = 0;
            while x + 16 <= w {
                unsafe {
                    let s =
                        _mm256_loadu_si256(src_ptr.add(y * src_stride + x) as *const __m256i);
                    let v = _mm256_add_epi16(_mm256_sll_epi16(s, shift), offset_wide);
                    _mm256_storeu_si256(dst_ptr.add(y * dst_stride + x) as *mut __m256i, v);
                }
                x += 16;
            }
            while x < w {
                unsafe {
                    let s = _mm_loadu_si128(src_ptr.add(y * src_stride + x) as *const __m128i);
                    let v = _mm_add_epi16(_mm_sll_epi16(s, shift), offset_narrow);
                    _mm_storeu_si128(dst_ptr.add(y * dst_stride + x) as *mut __m128i, v);
                }
                x += 8;
            }
        }
    }
}
