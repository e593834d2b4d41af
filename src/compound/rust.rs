use super::{DIST_PRECISION_BITS, ROUND_BITS, round_offset};
use crate::{
    convolve::ConvolveParams,
    util::{clip_pixel, round_power_of_two},
};

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
    let round_offset = round_offset(bit_depth);
    for y in 0..height {
        for x in 0..width {
            let stored = i32::from(conv_params.dst[y * conv_params.dst_stride + x]);
            let res = i32::from(pre[y * pre_stride + x]);
            let tmp = ((stored + res) >> 1) - round_offset;
            dst[y * dst_stride + x] = clip_pixel(round_power_of_two(tmp, ROUND_BITS), bit_depth);
        }
    }
}

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
    let round_offset = round_offset(bit_depth);
    let fwd = conv_params.fwd_offset;
    let bck = conv_params.bck_offset;
    for y in 0..height {
        for x in 0..width {
            let stored = i32::from(conv_params.dst[y * conv_params.dst_stride + x]);
            let res = i32::from(pre[y * pre_stride + x]);
            let tmp = ((stored * fwd + res * bck) >> DIST_PRECISION_BITS) - round_offset;
            dst[y * dst_stride + x] = clip_pixel(round_power_of_two(tmp, ROUND_BITS), bit_depth);
        }
    }
}
