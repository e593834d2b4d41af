
use smallvec::SmallVec;

use crate::{filter::MAX_SB_SQUARE, util::divide_and_round};

/// Largest palette a block may carry, and therefore the largest `k`.
pub const PALETTE_MAX_SIZE: usize = 8;

/// Deterministic 16-bit generator used to reseed empty clusters.
/// Matches the classic `rand()` LCG so reseeding picks the same data
/// points as existing bitstreams expect.
fn lcg_rand16(state: &mut u32) -> u16 {
    *state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    ((*state / 65_536) % 32_768) as u16
}

fn calc_dist<const D: usize>(p1: &[i32], p2: &[i32]) -> i32 {
    let mut dist = 0;
    for i in 0..D {
        let diff = p1[i] - p2[i];
        dist += diff * diff;
    }
    dist
}

/// Labels every point with the index of its nearest centroid.
/// Ties go to the lowest index.
pub fn calc_indices<const D: usize>(
    data: &[i32],
    centroids: &[i32],
    indices: &mut [u8],
    n: usize,
    k: usize,
) {
    const { assert!(D == 1 || D == 2) };
    debug_assert!(k >= 1 && k <= PALETTE_MAX_SIZE);
    assert!(data.len() >= n * D);
    assert!(centroids.len() >= k * D);
    assert!(indices.len() >= n);

    for i in 0..n {
        let point = &data[i * D..][..D];
        let mut min_dist = calc_dist::<D>(point, &centroids[..D]);
        indices[i] = 0;
        for j in 1..k {
            let this_dist = calc_dist::<D>(point, &centroids[j * D..][..D]);
            if this_dist < min_dist {
                min_dist = this_dist;
                indices[i] = j as u8;
            }
        }
    }
}

/// Recomputes each centroid as the rounded mean of its members. A
/// cluster that lost all members is reseeded from a pseudo-randomly
/// chosen data point, keeping `k` centroids alive.
fn calc_centroids<const D: usize>(
    data: &[i32],
    centroids: &mut [i32],
    indices: &[u8],
    n: usize,
    k: usize,
) {
    debug_assert!(n <= MAX_SB_SQUARE);
    let mut count = [0i32; PALETTE_MAX_SIZE];
    let mut rand_state = data[0] as u32;

    centroids[..k * D].fill(0);
    for i in 0..n {
        let index = usize::from(indices[i]);
        debug_assert!(index < k);
        count[index] += 1;
        for j in 0..D {
            centroids[index * D + j] += data[i * D + j];
        }
    }

    for i in 0..k {
        if count[i] == 0 {
            let pick = usize::from(lcg_rand16(&mut rand_state)) % n;
            centroids[i * D..][..D].copy_from_slice(&data[pick * D..][..D]);
        } else {
            for j in 0..D {
                centroids[i * D + j] = divide_and_round(centroids[i * D + j], count[i]);
            }
        }
    }
}

/// Total squared distance of every point to its assigned centroid,
/// accumulated in 64 bits so large blocks cannot overflow.
fn calc_total_dist<const D: usize>(
    data: &[i32],
    centroids: &[i32],
    indices: &[u8],
    n: usize,
) -> i64 {
    let mut dist = 0i64;
    for i in 0..n {
        let centroid = usize::from(indices[i]);
        dist += i64::from(calc_dist::<D>(
            &data[i * D..][..D],
            &centroids[centroid * D..][..D],
        ));
    }
    dist
}

/// Lloyd's algorithm over `D`-dimensional integer points.
///
/// `centroids` holds the initial guess on entry and the final
/// centroids on return; `indices` receives the final assignment.
/// Iteration stops early when the centroids stop moving, and an
/// update that increases total distortion is rolled back before
/// returning, so the result is never worse than the initial guess
/// plus one labeling pass.
pub fn k_means<const D: usize>(
    data: &[i32],
    centroids: &mut [i32],
    indices: &mut [u8],
    n: usize,
    k: usize,
    max_itr: usize,
) {
    const { assert!(D == 1 || D == 2) };
    assert!(n >= 1 && n <= MAX_SB_SQUARE);
    assert!(k >= 1 && k <= PALETTE_MAX_SIZE);
    assert!(max_itr >= 1);
    assert!(data.len() >= n * D);
    assert!(centroids.len() >= k * D);
    assert!(indices.len() >= n);

    let mut pre_centroids: SmallVec<[i32; PALETTE_MAX_SIZE * 2]> = SmallVec::new();
    #[allow(
        clippy::large_stack_arrays,
        reason = "fixed-capacity snapshot sized for the largest superblock"
    )]
    let mut pre_indices = [0u8; MAX_SB_SQUARE];

    calc_indices::<D>(data, centroids, indices, n, k);
    let mut this_dist = calc_total_dist::<D>(data, centroids, indices, n);

    for _ in 0..max_itr {
        let pre_dist = this_dist;
        pre_centroids.clear();
        pre_centroids.extend_from_slice(&centroids[..k * D]);
        pre_indices[..n].copy_from_slice(&indices[..n]);

        calc_centroids::<D>(data, centroids, indices, n, k);
        calc_indices::<D>(data, centroids, indices, n, k);
        this_dist = calc_total_dist::<D>(data, centroids, indices, n);

        if this_dist > pre_dist {
            centroids[..k * D].copy_from_slice(&pre_centroids);
            indices[..n].copy_from_slice(&pre_indices[..n]);
            break;
        }
        if centroids[..k * D] == pre_centroids[..] {
            break;
        }
    }
}
