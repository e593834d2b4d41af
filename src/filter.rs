#[cfg(test)]
mod tests;

/// Log2 of the fixed-point filter coefficient scale. Every kernel row
/// sums to `1 << FILTER_BITS`.
pub const FILTER_BITS: i32 = 7;
/// Right shift applied after the first convolution pass.
pub const ROUND0_BITS: i32 = 3;
/// Right shift applied after the second pass of a compound convolution.
/// The intermediate offset bookkeeping assumes this equals
/// [`FILTER_BITS`]; the two stay separate names because they mean
/// different things.
pub const COMPOUND_ROUND1_BITS: i32 = 7;

/// Log2 of the number of sub-pixel phases.
pub const SUBPEL_BITS: i32 = 4;
/// Number of sub-pixel phases per filter bank.
pub const SUBPEL_SHIFTS: usize = 1 << SUBPEL_BITS;
/// Mask reducing a sub-pixel position to a phase index.
pub const SUBPEL_MASK: usize = SUBPEL_SHIFTS - 1;
/// Width of a kernel row. Banks with fewer effective taps pad with
/// zero coefficients so every row stays this wide.
pub const SUBPEL_TAPS: usize = 8;

/// Largest supported block dimension.
pub const MAX_SB_SIZE: usize = 128;
pub const MAX_SB_SQUARE: usize = MAX_SB_SIZE * MAX_SB_SIZE;
/// Longest filter any bank uses.
pub const MAX_FILTER_TAP: usize = 8;

const _: () = assert!(FILTER_BITS == COMPOUND_ROUND1_BITS);

/// One sub-pixel phase of a filter bank.
pub type SubpelKernel = [i16; SUBPEL_TAPS];

#[rustfmt::skip]
static SUB_PEL_FILTERS_8: [SubpelKernel; SUBPEL_SHIFTS] = [
    [ 0, 0,   0, 128,   0,   0, 0, 0 ],
    [ 0, 2,  -6, 126,   8,  -2, 0, 0 ],
    [ 0, 2, -10, 122,  18,  -4, 0, 0 ],
    [ 0, 2, -12, 116,  28,  -8, 2, 0 ],
    [ 0, 2, -14, 110,  38, -10, 2, 0 ],
    [ 0, 2, -14, 102,  48, -12, 2, 0 ],
    [ 0, 2, -16,  94,  58, -12, 2, 0 ],
    [ 0, 2, -14,  84,  66, -12, 2, 0 ],
    [ 0, 2, -14,  76,  76, -14, 2, 0 ],
    [ 0, 2, -12,  66,  84, -14, 2, 0 ],
    [ 0, 2, -12,  58,  94, -16, 2, 0 ],
    [ 0, 2, -12,  48, 102, -14, 2, 0 ],
    [ 0, 2, -10,  38, 110, -14, 2, 0 ],
    [ 0, 2,  -8,  28, 116, -12, 2, 0 ],
    [ 0, 0,  -4,  18, 122, -10, 2, 0 ],
    [ 0, 0,  -2,   8, 126,  -6, 2, 0 ],
];

#[rustfmt::skip]
static SUB_PEL_FILTERS_8SMOOTH: [SubpelKernel; SUBPEL_SHIFTS] = [
    [ 0,  0,  0, 128,  0,  0,  0, 0 ],
    [ 0,  2, 28,  62, 34,  2,  0, 0 ],
    [ 0,  0, 26,  62, 36,  4,  0, 0 ],
    [ 0,  0, 22,  62, 40,  4,  0, 0 ],
    [ 0,  0, 20,  60, 42,  6,  0, 0 ],
    [ 0,  0, 18,  58, 44,  8,  0, 0 ],
    [ 0,  0, 16,  56, 46, 10,  0, 0 ],
    [ 0, -2, 16,  54, 48, 12,  0, 0 ],
    [ 0, -2, 14,  52, 52, 14, -2, 0 ],
    [ 0,  0, 12,  48, 54, 16, -2, 0 ],
    [ 0,  0, 10,  46, 56, 16,  0, 0 ],
    [ 0,  0,  8,  44, 58, 18,  0, 0 ],
    [ 0,  0,  6,  42, 60, 20,  0, 0 ],
    [ 0,  0,  4,  40, 62, 22,  0, 0 ],
    [ 0,  0,  4,  36, 62, 26,  0, 0 ],
    [ 0,  0,  2,  34, 62, 28,  2, 0 ],
];

#[rustfmt::skip]
static SUB_PEL_FILTERS_8SHARP: [SubpelKernel; SUBPEL_SHIFTS] = [
    [  0,  0,   0, 128,   0,   0,  0,  0 ],
    [ -2,  2,  -6, 126,   8,  -2,  2,  0 ],
    [ -2,  6, -12, 124,  16,  -6,  4, -2 ],
    [ -2,  8, -18, 120,  26, -10,  6, -2 ],
    [ -4, 10, -22, 116,  38, -14,  6, -2 ],
    [ -4, 10, -22, 108,  48, -18,  8, -2 ],
    [ -4, 10, -24, 100,  60, -20,  8, -2 ],
    [ -4, 10, -24,  90,  70, -22, 10, -2 ],
    [ -4, 12, -24,  80,  80, -24, 12, -4 ],
    [ -2, 10, -22,  70,  90, -24, 10, -4 ],
    [ -2,  8, -20,  60, 100, -24, 10, -4 ],
    [ -2,  8, -18,  48, 108, -22, 10, -4 ],
    [ -2,  6, -14,  38, 116, -22, 10, -4 ],
    [ -2,  6, -10,  26, 120, -18,  8, -2 ],
    [ -2,  4,  -6,  16, 124, -12,  6, -2 ],
    [  0,  2,  -2,   8, 126,  -6,  2, -2 ],
];

#[rustfmt::skip]
static BILINEAR_FILTERS: [SubpelKernel; SUBPEL_SHIFTS] = [
    [ 0, 0, 0, 128,   0, 0, 0, 0 ],
    [ 0, 0, 0, 120,   8, 0, 0, 0 ],
    [ 0, 0, 0, 112,  16, 0, 0, 0 ],
    [ 0, 0, 0, 104,  24, 0, 0, 0 ],
    [ 0, 0, 0,  96,  32, 0, 0, 0 ],
    [ 0, 0, 0,  88,  40, 0, 0, 0 ],
    [ 0, 0, 0,  80,  48, 0, 0, 0 ],
    [ 0, 0, 0,  72,  56, 0, 0, 0 ],
    [ 0, 0, 0,  64,  64, 0, 0, 0 ],
    [ 0, 0, 0,  56,  72, 0, 0, 0 ],
    [ 0, 0, 0,  48,  80, 0, 0, 0 ],
    [ 0, 0, 0,  40,  88, 0, 0, 0 ],
    [ 0, 0, 0,  32,  96, 0, 0, 0 ],
    [ 0, 0, 0,  24, 104, 0, 0, 0 ],
    [ 0, 0, 0,  16, 112, 0, 0, 0 ],
    [ 0, 0, 0,   8, 120, 0, 0, 0 ],
];

#[rustfmt::skip]
static SUB_PEL_FILTERS_4: [SubpelKernel; SUBPEL_SHIFTS] = [
    [ 0, 0,   0, 128,   0,   0, 0, 0 ],
    [ 0, 0,  -4, 126,   8,  -2, 0, 0 ],
    [ 0, 0,  -8, 122,  18,  -4, 0, 0 ],
    [ 0, 0, -10, 116,  28,  -6, 0, 0 ],
    [ 0, 0, -12, 110,  38,  -8, 0, 0 ],
    [ 0, 0, -12, 102,  48, -10, 0, 0 ],
    [ 0, 0, -14,  94,  58, -10, 0, 0 ],
    [ 0, 0, -12,  84,  66, -10, 0, 0 ],
    [ 0, 0, -12,  76,  76, -12, 0, 0 ],
    [ 0, 0, -10,  66,  84, -12, 0, 0 ],
    [ 0, 0, -10,  58,  94, -14, 0, 0 ],
    [ 0, 0, -10,  48, 102, -12, 0, 0 ],
    [ 0, 0,  -8,  38, 110, -12, 0, 0 ],
    [ 0, 0,  -6,  28, 116, -10, 0, 0 ],
    [ 0, 0,  -4,  18, 122,  -8, 0, 0 ],
    [ 0, 0,  -2,   8, 126,  -4, 0, 0 ],
];

#[rustfmt::skip]
static SUB_PEL_FILTERS_4SMOOTH: [SubpelKernel; SUBPEL_SHIFTS] = [
    [ 0, 0,  0, 128,  0,  0, 0, 0 ],
    [ 0, 0, 30,  62, 34,  2, 0, 0 ],
    [ 0, 0, 26,  62, 36,  4, 0, 0 ],
    [ 0, 0, 22,  62, 40,  4, 0, 0 ],
    [ 0, 0, 20,  60, 42,  6, 0, 0 ],
    [ 0, 0, 18,  58, 44,  8, 0, 0 ],
    [ 0, 0, 16,  56, 46, 10, 0, 0 ],
    [ 0, 0, 14,  54, 48, 12, 0, 0 ],
    [ 0, 0, 12,  52, 52, 12, 0, 0 ],
    [ 0, 0, 12,  48, 54, 14, 0, 0 ],
    [ 0, 0, 10,  46, 56, 16, 0, 0 ],
    [ 0, 0,  8,  44, 58, 18, 0, 0 ],
    [ 0, 0,  6,  42, 60, 20, 0, 0 ],
    [ 0, 0,  4,  40, 62, 22, 0, 0 ],
    [ 0, 0,  4,  36, 62, 26, 0, 0 ],
    [ 0, 0,  2,  34, 62, 30, 0, 0 ],
];

/// Interpolation filter families selectable per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Regular,
    Smooth,
    Sharp,
    Bilinear,
}

/// A filter bank bound to one direction of one block.
///
/// Blocks 4 wide or narrower use shortened regular/smooth banks whose
/// outer coefficients are zero; the rows stay [`SUBPEL_TAPS`] wide so
/// every consumer can index the same window around the center sample.
#[derive(Debug, Clone, Copy)]
pub struct InterpFilterParams {
    filter_table: &'static [SubpelKernel; SUBPEL_SHIFTS],
    kind: FilterKind,
}

impl InterpFilterParams {
    #[must_use]
    pub fn new(kind: FilterKind, block_width: usize) -> Self {
        let filter_table = match kind {
            FilterKind::Regular if block_width <= 4 => &SUB_PEL_FILTERS_4,
            FilterKind::Smooth if block_width <= 4 => &SUB_PEL_FILTERS_4SMOOTH,
            FilterKind::Regular => &SUB_PEL_FILTERS_8,
            FilterKind::Smooth => &SUB_PEL_FILTERS_8SMOOTH,
            FilterKind::Sharp => &SUB_PEL_FILTERS_8SHARP,
            FilterKind::Bilinear => &BILINEAR_FILTERS,
        };
        Self { filter_table, kind }
    }

    /// The kernel row for a sub-pixel position, reduced modulo
    /// [`SUBPEL_SHIFTS`].
    #[must_use]
    pub fn subpel_kernel(&self, subpel_qn: usize) -> &'static SubpelKernel {
        &self.filter_table[subpel_qn & SUBPEL_MASK]
    }

    /// Nominal width of every kernel row in this bank.
    #[must_use]
    pub const fn taps(&self) -> usize {
        SUBPEL_TAPS
    }

    /// Effective tap count of one phase, found by probing coefficient
    /// pairs from the outside in. Phase 0 reports 2.
    #[must_use]
    pub fn filter_tap(&self, subpel_qn: usize) -> usize {
        let kernel = self.subpel_kernel(subpel_qn);
        if kernel[0] != 0 || kernel[7] != 0 {
            8
        } else if kernel[1] != 0 || kernel[6] != 0 {
            6
        } else if kernel[2] != 0 || kernel[5] != 0 {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        self.kind
    }
}
