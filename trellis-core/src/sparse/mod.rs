//! Sparse adjacency primitives.
//!
//! Two value types over [`IdArray`](crate::IdArray) — [`CooMatrix`] and
//! [`CsrMatrix`] — plus the pure transformations between them. Every
//! transformation preserves the canonical edge-id assignment: the edge id a
//! graph hands out at construction follows the edge through conversions,
//! transposes, and slices.

mod coo;
mod csr;

pub use coo::{coo_has_duplicate, coo_to_csr, CooMatrix};
pub use csr::{
    csr_get_data, csr_get_data_and_indices, csr_get_row_column_indices, csr_get_row_data,
    csr_get_row_nnz, csr_get_rows_nnz, csr_has_duplicate, csr_is_nonzero, csr_is_nonzero_pairs,
    csr_slice_matrix, csr_slice_rows, csr_to_coo, csr_to_coo_eid_order, csr_transpose, CsrMatrix,
};
