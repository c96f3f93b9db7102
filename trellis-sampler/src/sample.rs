//! Without-replacement selection primitives shared by the samplers.

use std::collections::HashSet;

use crate::heap::ArrayHeap;
use crate::rng::RandomEngine;

/// Draw distinct integers from `[0, set_size)` by rejection into a set.
///
/// Cheap while `num` is well below `set_size`; callers switch to the
/// complement strategy otherwise.
fn random_sample(set_size: usize, num: usize, rng: &mut RandomEngine) -> Vec<usize> {
    let mut sampled: HashSet<usize> = HashSet::with_capacity(num);
    while sampled.len() < num {
        sampled.insert(rng.rand_int(set_size));
    }
    sampled.into_iter().collect()
}

/// Indices of `[0, size)` absent from the sorted list `nz`.
fn negate_array(nz: &[usize], size: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(size - nz.len());
    let mut it = nz.iter().peekable();
    for i in 0..size {
        if it.peek() == Some(&&i) {
            it.next();
        } else {
            out.push(i);
        }
    }
    out
}

/// Uniformly pick `k` distinct indices from `[0, n)`, returned sorted.
///
/// Strategy is bimodal to bound the expected rejection work: below half
/// density the picks are drawn directly; above it the complement of size
/// `n - k` is drawn instead and negated. `k >= n` returns everything.
#[must_use]
pub fn sample_without_replacement(n: usize, k: usize, rng: &mut RandomEngine) -> Vec<usize> {
    if n <= k {
        return (0..n).collect();
    }
    if n > 2 * k {
        let mut picks = random_sample(n, k, rng);
        picks.sort_unstable();
        picks
    } else {
        let mut complement = random_sample(n, n - k, rng);
        complement.sort_unstable();
        negate_array(&complement, n)
    }
}

/// Uniformly sample up to `max_neighbors` of a neighbor slice.
///
/// `vids` and `eids` are the parallel column-id / edge-id slices of one CSR
/// row; picks land in `out_ver` / `out_edge` in stored order. A row no
/// longer than the cap is copied through untouched.
pub(crate) fn pick_uniform(
    eids: &[i64],
    vids: &[i64],
    max_neighbors: usize,
    out_ver: &mut Vec<i64>,
    out_edge: &mut Vec<i64>,
    rng: &mut RandomEngine,
) {
    if vids.len() <= max_neighbors {
        out_ver.extend_from_slice(vids);
        out_edge.extend_from_slice(eids);
        return;
    }
    let picks = sample_without_replacement(vids.len(), max_neighbors, rng);
    debug_assert_eq!(picks.len(), max_neighbors);
    for idx in picks {
        out_ver.push(vids[idx]);
        out_edge.push(eids[idx]);
    }
}

/// Sample up to `max_neighbors` of a neighbor slice, biased by a per-edge
/// probability vector indexed by edge id.
pub(crate) fn pick_weighted<F: Copy + Into<f64>>(
    probability: &[F],
    eids: &[i64],
    vids: &[i64],
    max_neighbors: usize,
    out_ver: &mut Vec<i64>,
    out_edge: &mut Vec<i64>,
    rng: &mut RandomEngine,
) {
    if vids.len() <= max_neighbors {
        out_ver.extend_from_slice(vids);
        out_edge.extend_from_slice(eids);
        return;
    }
    let weights: Vec<f64> = eids
        .iter()
        .map(|&e| probability[e as usize].into())
        .collect();
    let mut heap = ArrayHeap::new(&weights);
    for idx in heap.sample_without_replacement(max_neighbors, rng) {
        out_ver.push(vids[idx]);
        out_edge.push(eids[idx]);
    }
}
