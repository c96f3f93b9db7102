//! Homogeneous immutable graph: the sampler input and NodeFlow payload.
//!
//! A square adjacency with lazily derived forward and reverse CSR views,
//! sharing the derivation rules of the bipartite cache. Drivers call
//! [`Graph::build_csr`] before fanning out so workers only read
//! already-materialized data.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::array::{BitWidth, IdArray};
use crate::error::{Error, Result};
use crate::sparse::{coo_to_csr, csr_transpose, CooMatrix, CsrMatrix};

/// Which neighborhood a sampler expands: predecessors (`In`) via the
/// reverse CSR, or successors (`Out`) via the forward CSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborType {
    In,
    Out,
}

impl FromStr for NeighborType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(Error::InvalidArgument(format!(
                "unsupported neighbor type: {other:?}"
            ))),
        }
    }
}

/// An immutable graph over a single vertex type.
#[derive(Debug)]
pub struct Graph {
    num_vertices: i64,
    num_edges: usize,
    width: BitWidth,
    in_csr: OnceLock<Arc<CsrMatrix>>,
    out_csr: OnceLock<Arc<CsrMatrix>>,
}

impl Graph {
    /// Build with the forward CSR as the principal view.
    #[must_use]
    pub fn from_out_csr(csr: CsrMatrix) -> Self {
        debug_assert_eq!(csr.num_rows, csr.num_cols);
        let g = Self::empty_views(csr.num_rows, csr.num_edges(), csr.indices.width());
        let _ = g.out_csr.set(Arc::new(csr));
        g
    }

    /// Build with the reverse CSR as the principal view.
    #[must_use]
    pub fn from_in_csr(csr: CsrMatrix) -> Self {
        debug_assert_eq!(csr.num_rows, csr.num_cols);
        let g = Self::empty_views(csr.num_rows, csr.num_edges(), csr.indices.width());
        let _ = g.in_csr.set(Arc::new(csr));
        g
    }

    /// Build from edge lists; edge `e` is `(row[e], col[e])`.
    pub fn from_coo(num_vertices: i64, row: IdArray, col: IdArray) -> Result<Self> {
        if row.len() != col.len() {
            return Err(Error::LengthMismatch(format!(
                "coo row/col: {} vs {}",
                row.len(),
                col.len()
            )));
        }
        let coo = CooMatrix {
            num_rows: num_vertices,
            num_cols: num_vertices,
            row,
            col,
        };
        Ok(Self::from_out_csr(coo_to_csr(&coo, true)))
    }

    fn empty_views(num_vertices: i64, num_edges: usize, width: BitWidth) -> Self {
        Self {
            num_vertices,
            num_edges,
            width,
            in_csr: OnceLock::new(),
            out_csr: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn num_vertices(&self) -> i64 {
        self.num_vertices
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[must_use]
    pub fn width(&self) -> BitWidth {
        self.width
    }

    /// The forward CSR, derived by transposing the reverse one if missing.
    pub fn out_csr(&self) -> &Arc<CsrMatrix> {
        self.out_csr.get_or_init(|| {
            let in_csr = self.in_csr.get().expect("at least one view must exist");
            trace!("materializing forward csr by transposing reverse csr");
            Arc::new(csr_transpose(in_csr))
        })
    }

    /// The reverse CSR, derived by transposing the forward one if missing.
    pub fn in_csr(&self) -> &Arc<CsrMatrix> {
        self.in_csr.get_or_init(|| {
            let out_csr = self.out_csr.get().expect("at least one view must exist");
            trace!("materializing reverse csr by transposing forward csr");
            Arc::new(csr_transpose(out_csr))
        })
    }

    /// The CSR serving the requested neighborhood direction.
    pub fn csr(&self, neigh_type: NeighborType) -> &Arc<CsrMatrix> {
        match neigh_type {
            NeighborType::In => self.in_csr(),
            NeighborType::Out => self.out_csr(),
        }
    }

    /// Force materialization of the requested view; called by sampling
    /// drivers before entering their parallel region.
    pub fn build_csr(&self, neigh_type: NeighborType) {
        let _ = self.csr(neigh_type);
    }
}
