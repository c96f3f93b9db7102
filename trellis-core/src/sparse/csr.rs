//! Compressed-sparse-row adjacency.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::coo::CooMatrix;
use crate::array::IdArray;

/// Sparse adjacency in compressed-sparse-row form.
///
/// `indices[indptr[r]..indptr[r + 1]]` are the column ids of row `r`, in
/// stored (not necessarily sorted) order; `edge_ids` holds, slot for slot,
/// the canonical edge id of each stored entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    pub num_rows: i64,
    pub num_cols: i64,
    pub indptr: IdArray,
    pub indices: IdArray,
    pub edge_ids: IdArray,
}

impl CsrMatrix {
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.indices.len()
    }

    /// Slot range of row `r`.
    #[must_use]
    pub fn row_range(&self, r: usize) -> Range<usize> {
        self.indptr.get(r) as usize..self.indptr.get(r + 1) as usize
    }
}

/// Expand to COO in stored row-major order.
///
/// Position `k` of the result corresponds to slot `k` of the CSR; the
/// returned array gives the edge id of each position, relating the two
/// orderings.
#[must_use]
pub fn csr_to_coo(csr: &CsrMatrix) -> (CooMatrix, IdArray) {
    let n = csr.num_rows as usize;
    let mut row = Vec::with_capacity(csr.num_edges());
    for r in 0..n {
        row.extend(std::iter::repeat(r as i64).take(csr.row_range(r).len()));
    }
    let coo = CooMatrix {
        num_rows: csr.num_rows,
        num_cols: csr.num_cols,
        row: csr.indices.like(row),
        col: csr.indices.clone(),
    };
    (coo, csr.edge_ids.clone())
}

/// Expand to COO ordered by edge id, so that position `e` holds edge `e`.
///
/// Requires the CSR's edge ids to be a dense permutation of `0..num_edges`,
/// which holds for every canonically constructed view.
#[must_use]
pub fn csr_to_coo_eid_order(csr: &CsrMatrix) -> CooMatrix {
    let n = csr.num_rows as usize;
    let m = csr.num_edges();
    let mut row = vec![0i64; m];
    let mut col = vec![0i64; m];
    for r in 0..n {
        for k in csr.row_range(r) {
            let e = csr.edge_ids.get(k) as usize;
            row[e] = r as i64;
            col[e] = csr.indices.get(k);
        }
    }
    CooMatrix {
        num_rows: csr.num_rows,
        num_cols: csr.num_cols,
        row: csr.indices.like(row),
        col: csr.indices.like(col),
    }
}

/// Swap rows and columns; edge ids follow their edges.
///
/// A stable counting sort on the column ids, so entries of a transposed row
/// appear in the source's stored order.
#[must_use]
pub fn csr_transpose(csr: &CsrMatrix) -> CsrMatrix {
    let n = csr.num_rows as usize;
    let nc = csr.num_cols as usize;
    let m = csr.num_edges();
    let mut indptr = vec![0i64; nc + 1];
    for c in csr.indices.iter() {
        indptr[c as usize + 1] += 1;
    }
    for i in 0..nc {
        indptr[i + 1] += indptr[i];
    }
    let mut indices = vec![0i64; m];
    let mut edge_ids = vec![0i64; m];
    let mut fill = indptr.clone();
    for r in 0..n {
        for k in csr.row_range(r) {
            let c = csr.indices.get(k) as usize;
            let slot = fill[c] as usize;
            indices[slot] = r as i64;
            edge_ids[slot] = csr.edge_ids.get(k);
            fill[c] += 1;
        }
    }
    CsrMatrix {
        num_rows: csr.num_cols,
        num_cols: csr.num_rows,
        indptr: csr.indices.like(indptr),
        indices: csr.indices.like(indices),
        edge_ids: csr.indices.like(edge_ids),
    }
}

/// Keep the listed rows, re-indexed to `0..rids.len()`; columns unchanged.
#[must_use]
pub fn csr_slice_rows(csr: &CsrMatrix, rids: &IdArray) -> CsrMatrix {
    let mut indptr = Vec::with_capacity(rids.len() + 1);
    indptr.push(0i64);
    let mut indices = Vec::new();
    let mut edge_ids = Vec::new();
    for r in rids.iter() {
        for k in csr.row_range(r as usize) {
            indices.push(csr.indices.get(k));
            edge_ids.push(csr.edge_ids.get(k));
        }
        indptr.push(indices.len() as i64);
    }
    CsrMatrix {
        num_rows: rids.len() as i64,
        num_cols: csr.num_cols,
        indptr: csr.indices.like(indptr),
        indices: csr.indices.like(indices),
        edge_ids: csr.indices.like(edge_ids),
    }
}

/// Keep the submatrix induced by `rids` × `cids`, both axes re-indexed.
///
/// The result's `edge_ids` are the surviving entries' original edge ids in
/// submatrix stored order; callers that need dense ids renumber afterwards.
#[must_use]
pub fn csr_slice_matrix(csr: &CsrMatrix, rids: &IdArray, cids: &IdArray) -> CsrMatrix {
    let col_map: HashMap<i64, i64> = cids
        .iter()
        .enumerate()
        .map(|(new, orig)| (orig, new as i64))
        .collect();
    let mut indptr = Vec::with_capacity(rids.len() + 1);
    indptr.push(0i64);
    let mut indices = Vec::new();
    let mut edge_ids = Vec::new();
    for r in rids.iter() {
        for k in csr.row_range(r as usize) {
            if let Some(&new_c) = col_map.get(&csr.indices.get(k)) {
                indices.push(new_c);
                edge_ids.push(csr.edge_ids.get(k));
            }
        }
        indptr.push(indices.len() as i64);
    }
    CsrMatrix {
        num_rows: rids.len() as i64,
        num_cols: cids.len() as i64,
        indptr: csr.indices.like(indptr),
        indices: csr.indices.like(indices),
        edge_ids: csr.indices.like(edge_ids),
    }
}

/// Number of stored entries in row `r`.
#[must_use]
pub fn csr_get_row_nnz(csr: &CsrMatrix, r: i64) -> usize {
    csr.row_range(r as usize).len()
}

/// Per-row entry counts for a list of rows.
#[must_use]
pub fn csr_get_rows_nnz(csr: &CsrMatrix, rids: &IdArray) -> IdArray {
    rids.like(
        rids.iter()
            .map(|r| csr_get_row_nnz(csr, r) as i64)
            .collect(),
    )
}

/// Column ids of row `r` in stored order.
#[must_use]
pub fn csr_get_row_column_indices(csr: &CsrMatrix, r: i64) -> IdArray {
    let range = csr.row_range(r as usize);
    csr.indices.like(csr.indices.as_slice()[range].to_vec())
}

/// Edge ids of row `r` in stored order.
#[must_use]
pub fn csr_get_row_data(csr: &CsrMatrix, r: i64) -> IdArray {
    let range = csr.row_range(r as usize);
    csr.edge_ids.like(csr.edge_ids.as_slice()[range].to_vec())
}

/// Edge ids of every entry at `(r, c)`; more than one for a multigraph.
#[must_use]
pub fn csr_get_data(csr: &CsrMatrix, r: i64, c: i64) -> IdArray {
    let mut out = Vec::new();
    for k in csr.row_range(r as usize) {
        if csr.indices.get(k) == c {
            out.push(csr.edge_ids.get(k));
        }
    }
    csr.edge_ids.like(out)
}

/// Whether entry `(r, c)` is present.
#[must_use]
pub fn csr_is_nonzero(csr: &CsrMatrix, r: i64, c: i64) -> bool {
    csr.row_range(r as usize)
        .any(|k| csr.indices.get(k) == c)
}

/// Iterate two id lists pairwise, broadcasting a length-1 list against the
/// other. Lengths are validated by the caller; an empty list yields nothing.
fn pair_iter<'a>(a: &'a [i64], b: &'a [i64]) -> impl Iterator<Item = (i64, i64)> + 'a {
    debug_assert!(a.len() == b.len() || a.len() == 1 || b.len() == 1);
    let n = if a.is_empty() || b.is_empty() {
        0
    } else {
        a.len().max(b.len())
    };
    (0..n).map(move |i| (a[i.min(a.len() - 1)], b[i.min(b.len() - 1)]))
}

/// Element-wise [`csr_is_nonzero`] over paired (broadcastable) id lists.
#[must_use]
pub fn csr_is_nonzero_pairs(csr: &CsrMatrix, rids: &IdArray, cids: &IdArray) -> Vec<bool> {
    pair_iter(rids.as_slice(), cids.as_slice())
        .map(|(r, c)| csr_is_nonzero(csr, r, c))
        .collect()
}

/// All edges matching the paired (broadcastable) `(row, col)` lists, as
/// `(row, col, eid)` triples expanded per match.
#[must_use]
pub fn csr_get_data_and_indices(
    csr: &CsrMatrix,
    rids: &IdArray,
    cids: &IdArray,
) -> (IdArray, IdArray, IdArray) {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut eids = Vec::new();
    for (r, c) in pair_iter(rids.as_slice(), cids.as_slice()) {
        for k in csr.row_range(r as usize) {
            if csr.indices.get(k) == c {
                rows.push(r);
                cols.push(c);
                eids.push(csr.edge_ids.get(k));
            }
        }
    }
    (
        csr.indices.like(rows),
        csr.indices.like(cols),
        csr.edge_ids.like(eids),
    )
}

/// Whether any `(row, col)` pair is stored more than once.
#[must_use]
pub fn csr_has_duplicate(csr: &CsrMatrix) -> bool {
    let mut seen: HashSet<i64> = HashSet::new();
    for r in 0..csr.num_rows as usize {
        seen.clear();
        for k in csr.row_range(r) {
            if !seen.insert(csr.indices.get(k)) {
                return true;
            }
        }
    }
    false
}
