//! Coordinate-list adjacency.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::csr::CsrMatrix;
use crate::array::IdArray;

/// Sparse adjacency in coordinate form.
///
/// The edge with id `e` is `(row[e], col[e])`; there is no uniqueness
/// requirement on the pairs, so parallel edges are representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooMatrix {
    pub num_rows: i64,
    pub num_cols: i64,
    pub row: IdArray,
    pub col: IdArray,
}

impl CooMatrix {
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.row.len()
    }

    /// The same edges with rows and columns swapped.
    #[must_use]
    pub fn transposed(&self) -> CooMatrix {
        CooMatrix {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            row: self.col.clone(),
            col: self.row.clone(),
        }
    }
}

/// Convert to CSR with a stable counting sort on the row ids.
///
/// Ties on the same row keep their original COO order. With
/// `keep_order = true` the entry stored at slot `k` carries its original COO
/// position as its edge id; with `keep_order = false` edge ids are
/// renumbered densely in the sorted order.
#[must_use]
pub fn coo_to_csr(coo: &CooMatrix, keep_order: bool) -> CsrMatrix {
    let n = coo.num_rows as usize;
    let m = coo.num_edges();
    let mut indptr = vec![0i64; n + 1];
    for r in coo.row.iter() {
        indptr[r as usize + 1] += 1;
    }
    for i in 0..n {
        indptr[i + 1] += indptr[i];
    }
    let mut indices = vec![0i64; m];
    let mut edge_ids = vec![0i64; m];
    let mut fill = indptr.clone();
    for e in 0..m {
        let r = coo.row.get(e) as usize;
        let slot = fill[r] as usize;
        indices[slot] = coo.col.get(e);
        edge_ids[slot] = e as i64;
        fill[r] += 1;
    }
    if !keep_order {
        for (k, id) in edge_ids.iter_mut().enumerate() {
            *id = k as i64;
        }
    }
    CsrMatrix {
        num_rows: coo.num_rows,
        num_cols: coo.num_cols,
        indptr: coo.row.like(indptr),
        indices: coo.row.like(indices),
        edge_ids: coo.row.like(edge_ids),
    }
}

/// Whether any `(row, col)` pair appears more than once.
#[must_use]
pub fn coo_has_duplicate(coo: &CooMatrix) -> bool {
    let mut seen: HashSet<(i64, i64)> = HashSet::with_capacity(coo.num_edges());
    for (r, c) in coo.row.iter().zip(coo.col.iter()) {
        if !seen.insert((r, c)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_coo() -> CooMatrix {
        CooMatrix {
            num_rows: 3,
            num_cols: 3,
            row: IdArray::from_vec(vec![0, 0, 1, 2]),
            col: IdArray::from_vec(vec![1, 2, 2, 0]),
        }
    }

    #[test]
    fn test_coo_to_csr_keeps_original_ids() {
        let csr = coo_to_csr(&sample_coo(), true);
        assert_eq!(csr.indptr.to_vec(), vec![0, 2, 3, 4]);
        assert_eq!(csr.indices.to_vec(), vec![1, 2, 2, 0]);
        assert_eq!(csr.edge_ids.to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_coo_to_csr_stable_on_unsorted_rows() {
        let coo = CooMatrix {
            num_rows: 2,
            num_cols: 2,
            row: IdArray::from_vec(vec![1, 0, 1, 0]),
            col: IdArray::from_vec(vec![0, 0, 1, 1]),
        };
        let csr = coo_to_csr(&coo, true);
        assert_eq!(csr.indptr.to_vec(), vec![0, 2, 4]);
        // Row 0 entries keep COO order (1), (3); row 1 keeps (0), (2).
        assert_eq!(csr.indices.to_vec(), vec![0, 1, 0, 1]);
        assert_eq!(csr.edge_ids.to_vec(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_coo_to_csr_renumbered() {
        let csr = coo_to_csr(&sample_coo(), false);
        assert_eq!(csr.edge_ids.to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_duplicate_detection() {
        assert!(!coo_has_duplicate(&sample_coo()));
        let multi = CooMatrix {
            num_rows: 2,
            num_cols: 2,
            row: IdArray::from_vec(vec![0, 0]),
            col: IdArray::from_vec(vec![1, 1]),
        };
        assert!(coo_has_duplicate(&multi));
    }
}
