#![allow(
    clippy::large_stack_arrays,
    reason = "the intermediate blocks are fixed-capacity scratch sized for the largest superblock"
)]

#[cfg(target_arch = "x86_64")]
mod avx2;
mod rust;

use anyhow::{Result, bail};
use bitflags::bitflags;
use cfg_if::cfg_if;

use crate::{
    compound::{DIST_PRECISION_BITS, comp_avg, jnt_comp_avg},
    filter::{
        COMPOUND_ROUND1_BITS, FILTER_BITS, InterpFilterParams, MAX_FILTER_TAP, MAX_SB_SIZE,
        ROUND0_BITS, SUBPEL_TAPS,
    },
};

/// Row stride of the intermediate block shared by the two-pass paths.
const IM_STRIDE: usize = MAX_SB_SIZE;
const IM_BLOCK_LEN: usize = (MAX_SB_SIZE + MAX_FILTER_TAP) * MAX_SB_SIZE;

bitflags! {
    /// Behavior switches for one convolve call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConvolveFlags: u8 {
        /// Blend with the accumulator contents and write final pixels
        /// instead of overwriting the accumulator.
        const DO_AVERAGE = 1;
        /// Use the distance weighted blend rather than a plain average.
        const USE_JNT_COMP_AVG = 1 << 1;
    }
}

/// State threaded through a compound prediction: the `u16` accumulator
/// holding the first reference's prediction, plus the blend weights.
#[derive(Debug)]
pub struct ConvolveParams<'a> {
    pub dst: &'a mut [u16],
    pub dst_stride: usize,
    pub flags: ConvolveFlags,
    pub fwd_offset: i32,
    pub bck_offset: i32,
}

impl<'a> ConvolveParams<'a> {
    pub fn new(
        dst: &'a mut [u16],
        dst_stride: usize,
        flags: ConvolveFlags,
        fwd_offset: i32,
        bck_offset: i32,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Convolve block must be at least 1x1");
        }
        if dst_stride < width {
            bail!("Accumulator stride must cover the block width");
        }
        if dst.len() < (height - 1) * dst_stride + width {
            bail!("Accumulator buffer too small for block");
        }
        if flags.contains(ConvolveFlags::USE_JNT_COMP_AVG) {
            if fwd_offset < 0 || bck_offset < 0 {
                bail!("Blend weights must be non-negative");
            }
            if fwd_offset + bck_offset != 1 << DIST_PRECISION_BITS {
                bail!(
                    "Blend weights must sum to {}, got {} and {}",
                    1 << DIST_PRECISION_BITS,
                    fwd_offset,
                    bck_offset
                );
            }
        }

        Ok(Self {
            dst,
            dst_stride,
            flags,
            fwd_offset,
            bck_offset,
        })
    }

    #[must_use]
    pub fn do_average(&self) -> bool {
        self.flags.contains(ConvolveFlags::DO_AVERAGE)
    }

    #[must_use]
    pub fn use_jnt_comp_avg(&self) -> bool {
        self.flags.contains(ConvolveFlags::USE_JNT_COMP_AVG)
    }
}

// Picks the vector kernel when AVX2 is available, otherwise the scalar
// fallback with identical rounding behavior.
macro_rules! kernel {
    ($name:ident($($arg:expr),* $(,)?)) => {
        cfg_if! {
            if #[cfg(all(target_arch = "x86_64", not(feature = "no_simd")))] {
                if crate::util::has_avx2() {
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

fn finish_average(
    pre: &[u16],
    pre_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    conv_params: &ConvolveParams<'_>,
    bit_depth: u8,
) {
    if conv_params.use_jnt_comp_avg() {
        jnt_comp_avg(pre, pre_stride, dst, dst_stride, w, h, conv_params, bit_depth);
    } else {
        comp_avg(pre, pre_stride, dst, dst_stride, w, h, conv_params, bit_depth);
    }
}

fn dispatch_x(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    taps: usize,
    offset: i32,
) {
    // `src` starts three samples left of the first output column.
    if w == 4 && taps <= 4 {
        kernel!(convolve_x_4tap(&src[2..], src_stride, dst, dst_stride, w, h, filter, offset));
    } else if taps <= 6 {
        kernel!(convolve_x_6tap(&src[1..], src_stride, dst, dst_stride, w, h, filter, offset));
    } else {
        kernel!(convolve_x_8tap(src, src_stride, dst, dst_stride, w, h, filter, offset));
    }
}

fn dispatch_y(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    taps: usize,
    offset: i32,
) {
    // `src` starts three rows above the first output row.
    if taps <= 4 {
        kernel!(convolve_y_4tap(
            &src[2 * src_stride..],
            src_stride,
            dst,
            dst_stride,
            w,
            h,
            filter,
            offset
        ));
    } else if taps == 6 {
        kernel!(convolve_y_6tap(
            &src[src_stride..],
            src_stride,
            dst,
            dst_stride,
            w,
            h,
            filter,
            offset
        ));
    } else {
        kernel!(convolve_y_8tap(src, src_stride, dst, dst_stride, w, h, filter, offset));
    }
}

/// Horizontal-only compound convolution.
///
/// Filters `w`x`h` samples around `src_origin` with the bank's
/// `subpel_x_qn` phase and writes offset accumulator values, or final
/// blended pixels to `dst` when the params request averaging. The
/// source must extend 3 samples left and 4 samples right of the block.
pub fn jnt_convolve_x(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter_params_x: &InterpFilterParams,
    subpel_x_qn: usize,
    conv_params: &mut ConvolveParams<'_>,
    bit_depth: u8,
) {
    let horiz_offset = filter_params_x.taps() / 2 - 1;
    assert!(src_origin >= horiz_offset);
    assert!(src.len() > src_origin + (h - 1) * src_stride + w + 3);
    debug_assert!(w == 2 || w == 4 || w % 8 == 0);

    let x_filter = filter_params_x.subpel_kernel(subpel_x_qn);
    let x_taps = filter_params_x.filter_tap(subpel_x_qn);
    let bd = i32::from(bit_depth);
    let offset = (1 << (bd + FILTER_BITS))
        + (1 << (bd + FILTER_BITS - 1))
        + (1 << (ROUND0_BITS - 1));

    if w == 2 || h == 2 {
        if conv_params.do_average() {
            let mut im_block = [0u16; IM_BLOCK_LEN];
            rust::convolve_x_any(
                src, src_origin, src_stride, &mut im_block, IM_STRIDE, w, h, x_filter, offset,
            );
            finish_average(&im_block, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
        } else {
            let accum_stride = conv_params.dst_stride;
            rust::convolve_x_any(
                src, src_origin, src_stride, conv_params.dst, accum_stride, w, h, x_filter, offset,
            );
        }
        return;
    }

    let window = &src[src_origin - horiz_offset..];
    if conv_params.do_average() {
        let mut im_block = [0u16; IM_BLOCK_LEN];
        dispatch_x(window, src_stride, &mut im_block, IM_STRIDE, w, h, x_filter, x_taps, offset);
        finish_average(&im_block, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
    } else {
        let accum_stride = conv_params.dst_stride;
        dispatch_x(
            window,
            src_stride,
            conv_params.dst,
            accum_stride,
            w,
            h,
            x_filter,
            x_taps,
            offset,
        );
    }
}

/// Vertical-only compound convolution. The source must extend 3 rows
/// above and 4 rows below the block.
pub fn jnt_convolve_y(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter_params_y: &InterpFilterParams,
    subpel_y_qn: usize,
    conv_params: &mut ConvolveParams<'_>,
    bit_depth: u8,
) {
    let vert_offset = filter_params_y.taps() / 2 - 1;
    assert!(src_origin >= vert_offset * src_stride);
    assert!(src.len() > src_origin + (h + 3) * src_stride + w - 1);
    debug_assert!(w == 2 || w == 4 || w % 8 == 0);

    let y_filter = filter_params_y.subpel_kernel(subpel_y_qn);
    let y_taps = filter_params_y.filter_tap(subpel_y_qn);
    let bd = i32::from(bit_depth);
    let offset = (1 << (bd + FILTER_BITS))
        + (1 << (bd + FILTER_BITS - 1))
        + (1 << (ROUND0_BITS - 1));

    if w == 2 || h == 2 {
        if conv_params.do_average() {
            let mut im_block = [0u16; IM_BLOCK_LEN];
            rust::convolve_y_any(
                src, src_origin, src_stride, &mut im_block, IM_STRIDE, w, h, y_filter, offset,
            );
            finish_average(&im_block, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
        } else {
            let accum_stride = conv_params.dst_stride;
            rust::convolve_y_any(
                src, src_origin, src_stride, conv_params.dst, accum_stride, w, h, y_filter, offset,
            );
        }
        return;
    }

    let window = &src[src_origin - vert_offset * src_stride..];
    if conv_params.do_average() {
        let mut im_block = [0u16; IM_BLOCK_LEN];
        dispatch_y(window, src_stride, &mut im_block, IM_STRIDE, w, h, y_filter, y_taps, offset);
        finish_average(&im_block, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
    } else {
        let accum_stride = conv_params.dst_stride;
        dispatch_y(
            window,
            src_stride,
            conv_params.dst,
            accum_stride,
            w,
            h,
            y_filter,
            y_taps,
            offset,
        );
    }
}

/// Separable two-pass compound convolution: a horizontal pass into an
/// intermediate block at full precision, then a vertical pass with the
/// compound rounding shift. The source must extend 3 samples/rows
/// before and 4 after the block in both directions.
pub fn jnt_convolve_2d(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter_params_x: &InterpFilterParams,
    filter_params_y: &InterpFilterParams,
    subpel_x_qn: usize,
    subpel_y_qn: usize,
    conv_params: &mut ConvolveParams<'_>,
    bit_depth: u8,
) {
    debug_assert!(w == 2 || w == 4 || w % 8 == 0);

    let x_filter = filter_params_x.subpel_kernel(subpel_x_qn);
    let y_filter = filter_params_y.subpel_kernel(subpel_y_qn);
    let bd = i32::from(bit_depth);
    // The horizontal pass keeps FILTER_BITS - ROUND0_BITS extra
    // precision; the vertical offset accounts for both passes.
    let round_offset_x = (1 << (bd + FILTER_BITS - 1)) + (1 << (ROUND0_BITS - 1));
    let y_offset_bits = bd + 2 * FILTER_BITS - ROUND0_BITS;
    let round_offset_y = 1 << y_offset_bits;

    if w == 2 || h == 2 {
        let im_h = h + SUBPEL_TAPS - 1;
        assert!(src_origin >= 3 * src_stride + 3);
        assert!(src.len() > src_origin + (h + 3) * src_stride + w + 3);
        let mut im_block = [0u16; IM_BLOCK_LEN];
        rust::convolve_x_any(
            src,
            src_origin - 3 * src_stride,
            src_stride,
            &mut im_block,
            IM_STRIDE,
            w,
            im_h,
            x_filter,
            round_offset_x,
        );
        if conv_params.do_average() {
            let mut im_block2 = [0u16; IM_BLOCK_LEN];
            rust::convolve_2d_v_any(
                &im_block,
                3 * IM_STRIDE,
                IM_STRIDE,
                &mut im_block2,
                IM_STRIDE,
                w,
                h,
                y_filter,
                round_offset_y,
            );
            finish_average(&im_block2, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
        } else {
            let accum_stride = conv_params.dst_stride;
            rust::convolve_2d_v_any(
                &im_block,
                3 * IM_STRIDE,
                IM_STRIDE,
                conv_params.dst,
                accum_stride,
                w,
                h,
                y_filter,
                round_offset_y,
            );
        }
        return;
    }

    // Short banks keep a 6-tap window so the vector kernels never read
    // outside the padded source.
    let x_eff = filter_params_x.filter_tap(subpel_x_qn);
    let x_taps = x_eff.max(6);
    let y_taps = filter_params_y.filter_tap(subpel_y_qn).max(6);
    let horiz_offset = x_taps / 2 - 1;
    let vert_offset = y_taps / 2 - 1;
    let im_h = h + y_taps - 1;

    assert!(src_origin >= vert_offset * src_stride + horiz_offset);
    assert!(src.len() > src_origin + (h + 3) * src_stride + w + 3);

    let window = &src[src_origin - vert_offset * src_stride - horiz_offset..];
    let mut im_block = [0u16; IM_BLOCK_LEN];

    if w == 4 && x_eff <= 4 {
        kernel!(convolve_x_4tap(
            &window[1..],
            src_stride,
            &mut im_block,
            IM_STRIDE,
            w,
            im_h,
            x_filter,
            round_offset_x
        ));
    } else if x_taps == 6 {
        kernel!(convolve_x_6tap(
            window,
            src_stride,
            &mut im_block,
            IM_STRIDE,
            w,
            im_h,
            x_filter,
            round_offset_x
        ));
    } else {
        kernel!(convolve_x_8tap(
            window,
            src_stride,
            &mut im_block,
            IM_STRIDE,
            w,
            im_h,
            x_filter,
            round_offset_x
        ));
    }

    if conv_params.do_average() {
        let mut im_block2 = [0u16; IM_BLOCK_LEN];
        if y_taps == 6 {
            kernel!(convolve_2d_v_6tap(
                &im_block,
                IM_STRIDE,
                &mut im_block2,
                IM_STRIDE,
                w,
                h,
                y_filter,
                round_offset_y
            ));
        } else {
            kernel!(convolve_2d_v_8tap(
                &im_block,
                IM_STRIDE,
                &mut im_block2,
                IM_STRIDE,
                w,
                h,
                y_filter,
                round_offset_y
            ));
        }
        finish_average(&im_block2, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
    } else {
        let accum_stride = conv_params.dst_stride;
        if y_taps == 6 {
            kernel!(convolve_2d_v_6tap(
                &im_block,
                IM_STRIDE,
                conv_params.dst,
                accum_stride,
                w,
                h,
                y_filter,
                round_offset_y
            ));
        } else {
            kernel!(convolve_2d_v_8tap(
                &im_block,
                IM_STRIDE,
                conv_params.dst,
                accum_stride,
                w,
                h,
                y_filter,
                round_offset_y
            ));
        }
    }
}

/// Degenerate compound convolution for full-pixel motion: samples are
/// left shifted into accumulator scale and offset, with no filtering.
pub fn jnt_convolve_2d_copy(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    conv_params: &mut ConvolveParams<'_>,
    bit_depth: u8,
) {
    assert!(src.len() > src_origin + (h - 1) * src_stride + w - 1);
    debug_assert!(w == 2 || w == 4 || w % 8 == 0);

    let offset_bits = i32::from(bit_depth) + 2 * FILTER_BITS - ROUND0_BITS;
    let round_bits = 2 * FILTER_BITS - ROUND0_BITS - COMPOUND_ROUND1_BITS;
    // Wraps for 12-bit sources, exactly like the accumulator itself.
    let round_offset = ((1 << (offset_bits - COMPOUND_ROUND1_BITS))
        + (1 << (offset_bits - COMPOUND_ROUND1_BITS - 1))) as u16;

    let window = &src[src_origin..];
    if conv_params.do_average() {
        let mut im_block = [0u16; IM_BLOCK_LEN];
        if w == 2 || h == 2 {
            rust::copy_2d(window, src_stride, &mut im_block, IM_STRIDE, w, h, round_bits, round_offset);
        } else {
            kernel!(copy_2d(window, src_stride, &mut im_block, IM_STRIDE, w, h, round_bits, round_offset));
        }
        finish_average(&im_block, IM_STRIDE, dst, dst_stride, w, h, conv_params, bit_depth);
    } else {
        let accum_stride = conv_params.dst_stride;
        if w == 2 || h == 2 {
            rust::copy_2d(window, src_stride, conv_params.dst, accum_stride, w, h, round_bits, round_offset);
        } else {
            kernel!(copy_2d(window, src_stride, conv_params.dst, accum_stride, w, h, round_bits, round_offset));
        }
    }
}
