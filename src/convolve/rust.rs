use crate::{
    filter::{COMPOUND_ROUND1_BITS, ROUND0_BITS, SUBPEL_TAPS},
    util::{round_power_of_two, saturate_u16},
};

/// Window of a kernel row: `FIRST` is the lowest coefficient lane and
/// `TAPS` the number of samples read per output.
fn convolve_h<const FIRST: usize, const TAPS: usize>(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    assert!(src.len() > (h - 1) * src_stride + w - 2 + TAPS);
    assert!(dst.len() > (h - 1) * dst_stride + w - 1);

    for y in 0..h {
        for x in 0..w {
            let window = &src[y * src_stride + x..];
            let mut sum = offset;
            for i in 0..TAPS {
                sum += i32::from(filter[FIRST + i]) * i32::from(window[i]);
            }
            dst[y * dst_stride + x] = saturate_u16(sum >> ROUND0_BITS);
        }
    }
}

fn convolve_v<const FIRST: usize, const TAPS: usize, const BITS: i32, const ROUND: bool>(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    assert!(src.len() > (h + TAPS - 2) * src_stride + w - 1);
    assert!(dst.len() > (h - 1) * dst_stride + w - 1);

    for y in 0..h {
        for x in 0..w {
            let mut sum = offset;
            for i in 0..TAPS {
                sum += i32::from(filter[FIRST + i]) * i32::from(src[(y + i) * src_stride + x]);
            }
            let shifted = if ROUND {
                round_power_of_two(sum, BITS)
            } else {
                sum >> BITS
            };
            dst[y * dst_stride + x] = saturate_u16(shifted);
        }
    }
}

pub fn convolve_x_8tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_h::<0, 8>(src, src_stride, dst, dst_stride, w, h, filter, offset);
}

pub fn convolve_x_6tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_h::<1, 6>(src, src_stride, dst, dst_stride, w, h, filter, offset);
}

pub fn convolve_x_4tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_h::<2, 4>(src, src_stride, dst, dst_stride, w, h, filter, offset);
}

pub fn convolve_y_8tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_v::<0, 8, { ROUND0_BITS }, false>(src, src_stride, dst, dst_stride, w, h, filter, offset);
}

pub fn convolve_y_6tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_v::<1, 6, { ROUND0_BITS }, false>(src, src_stride, dst, dst_stride, w, h, filter, offset);
}

pub fn convolve_y_4tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_v::<2, 4, { ROUND0_BITS }, false>(src, src_stride, dst, dst_stride, w, h, filter, offset);
}

pub fn convolve_2d_v_8tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_v::<0, 8, { COMPOUND_ROUND1_BITS }, true>(
        src, src_stride, dst, dst_stride, w, h, filter, offset,
    );
}

pub fn convolve_2d_v_6tap(
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    convolve_v::<1, 6, { COMPOUND_ROUND1_BITS }, true>(
        src, src_stride, dst, dst_stride, w, h, filter, offset,
    );
}

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
    assert!(src.len() > (h - 1) * src_stride + w - 1);
    assert!(dst.len() > (h - 1) * dst_stride + w - 1);

    for y in 0..h {
        for x in 0..w {
            // Wrapping arithmetic in 16 bits, matching the vector path.
            let shifted = (u32::from(src[y * src_stride + x]) << round_bits) as u16;
            dst[y * dst_stride + x] = shifted.wrapping_add(round_offset);
        }
    }
}

/// Center-relative horizontal filter for block shapes the unrolled
/// kernels skip. Zero coefficients are not read, so the window never
/// reaches past the padding a shorter phase actually needs.
pub fn convolve_x_any(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    for y in 0..h {
        for x in 0..w {
            let center = (src_origin + y * src_stride + x) as isize;
            let mut sum = offset;
            for i in 0..SUBPEL_TAPS {
                let coeff = i32::from(filter[i]);
                if coeff != 0 {
                    let pos = center + i as isize - 3;
                    sum += coeff * i32::from(src[pos as usize]);
                }
            }
            dst[y * dst_stride + x] = saturate_u16(sum >> ROUND0_BITS);
        }
    }
}

/// Center-relative vertical filter companion to [`convolve_x_any`].
pub fn convolve_y_any(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    let stride = src_stride as isize;
    for y in 0..h {
        for x in 0..w {
            let center = (src_origin + y * src_stride + x) as isize;
            let mut sum = offset;
            for i in 0..SUBPEL_TAPS {
                let coeff = i32::from(filter[i]);
                if coeff != 0 {
                    let pos = center + (i as isize - 3) * stride;
                    sum += coeff * i32::from(src[pos as usize]);
                }
            }
            dst[y * dst_stride + x] = saturate_u16(sum >> ROUND0_BITS);
        }
    }
}

/// Vertical second pass with the compound rounding shift, again
/// center-relative and skipping zero coefficients.
pub fn convolve_2d_v_any(
    src: &[u16],
    src_origin: usize,
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    w: usize,
    h: usize,
    filter: &[i16; SUBPEL_TAPS],
    offset: i32,
) {
    let stride = src_stride as isize;
    for y in 0..h {
        for x in 0..w {
            let center = (src_origin + y * src_stride + x) as isize;
            let mut sum = offset;
            for i in 0..SUBPEL_TAPS {
                let coeff = i32::from(filter[i]);
                if coeff != 0 {
                    let pos = center + (i as isize - 3) * stride;
                    sum += coeff * i32::from(src[pos as usize]);
                }
            }
            dst[y * dst_stride + x] = saturate_u16(round_power_of_two(sum, COMPOUND_ROUND1_BITS));
        }
    }
}
