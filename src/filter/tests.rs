#![allow(clippy::unwrap_used, reason = "allow in test files")]

use super::*;

fn all_banks() -> Vec<InterpFilterParams> {
    vec![
        InterpFilterParams::new(FilterKind::Regular, 4),
        InterpFilterParams::new(FilterKind::Regular, 8),
        InterpFilterParams::new(FilterKind::Smooth, 4),
        InterpFilterParams::new(FilterKind::Smooth, 8),
        InterpFilterParams::new(FilterKind::Sharp, 8),
        InterpFilterParams::new(FilterKind::Bilinear, 8),
    ]
}

#[test]
fn every_kernel_row_sums_to_filter_scale() {
    for bank in all_banks() {
        for phase in 0..SUBPEL_SHIFTS {
            let sum: i32 = bank
                .subpel_kernel(phase)
                .iter()
                .map(|&c| i32::from(c))
                .sum();
            assert_eq!(sum, 1 << FILTER_BITS, "{:?} phase {}", bank.kind(), phase);
        }
    }
}

#[test]
fn phase_zero_is_the_identity_kernel() {
    for bank in all_banks() {
        assert_eq!(bank.subpel_kernel(0), &[0, 0, 0, 128, 0, 0, 0, 0]);
        assert_eq!(bank.filter_tap(0), 2);
    }
}

#[test]
fn subpel_position_wraps_modulo_phase_count() {
    let bank = InterpFilterParams::new(FilterKind::Regular, 8);
    assert_eq!(bank.subpel_kernel(5), bank.subpel_kernel(5 + SUBPEL_SHIFTS));
    assert_eq!(bank.subpel_kernel(16), bank.subpel_kernel(0));
}

#[test]
fn filter_tap_matches_bank_shape() {
    // The wide regular bank is effectively 6-tap at every nonzero phase.
    let regular8 = InterpFilterParams::new(FilterKind::Regular, 8);
    for phase in 1..SUBPEL_SHIFTS {
        assert_eq!(regular8.filter_tap(phase), 6, "phase {}", phase);
    }

    let sharp = InterpFilterParams::new(FilterKind::Sharp, 8);
    assert_eq!(sharp.filter_tap(1), 8);
    assert_eq!(sharp.filter_tap(8), 8);
    assert_eq!(sharp.filter_tap(15), 8);

    let regular4 = InterpFilterParams::new(FilterKind::Regular, 4);
    for phase in 1..SUBPEL_SHIFTS {
        assert_eq!(regular4.filter_tap(phase), 4, "phase {}", phase);
    }

    let bilinear = InterpFilterParams::new(FilterKind::Bilinear, 8);
    for phase in 1..SUBPEL_SHIFTS {
        assert_eq!(bilinear.filter_tap(phase), 2, "phase {}", phase);
    }
}

#[test]
fn banks_are_mirror_symmetric() {
    for bank in all_banks() {
        for phase in 1..SUBPEL_SHIFTS {
            let mut reversed = *bank.subpel_kernel(phase);
            reversed.reverse();
            let mirrored = bank.subpel_kernel(SUBPEL_SHIFTS - phase);
            assert_eq!(&reversed, mirrored, "{:?} phase {}", bank.kind(), phase);
        }
    }
}

#[test]
fn narrow_blocks_select_short_banks() {
    let narrow = InterpFilterParams::new(FilterKind::Regular, 4);
    let wide = InterpFilterParams::new(FilterKind::Regular, 8);
    assert_ne!(narrow.subpel_kernel(1), wide.subpel_kernel(1));
    // Sharp and bilinear have no shortened variant.
    let sharp_narrow = InterpFilterParams::new(FilterKind::Sharp, 4);
    let sharp_wide = InterpFilterParams::new(FilterKind::Sharp, 8);
    assert_eq!(sharp_narrow.subpel_kernel(1), sharp_wide.subpel_kernel(1));
}
