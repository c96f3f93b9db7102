//! Bipartite relation graph: one two-typed relation under three
//! interchangeable sparse views.
//!
//! A [`Bipartite`] holds up to three views of the same edge multiset — a
//! forward CSR (`out_csr`, rows are sources), a reverse CSR (`in_csr`, rows
//! are destinations) and a COO — and materializes missing views on first
//! use. Whichever view is supplied at construction defines the canonical
//! edge ids `0..num_edges`; derived views carry those ids through, so every
//! query answers in the same id space no matter which view serves it.
//!
//! Each query dispatches to the cheapest sufficient view:
//!
//! - source-side neighborhood → `out_csr`
//! - destination-side neighborhood → `in_csr`
//! - edge-id-indexed lookups and `edges(Eid)` → `coo`
//! - `edges(SrcDst)` → `out_csr`
//!
//! When only an `in_csr` exists, source-side point queries are answered by
//! swapping the arguments against it rather than materializing `out_csr`.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::array::{BitWidth, EdgeArray, IdArray};
use crate::error::{Error, Result};
use crate::sparse::{
    coo_has_duplicate, coo_to_csr, csr_get_data, csr_get_data_and_indices,
    csr_get_row_column_indices, csr_get_row_data, csr_get_row_nnz, csr_get_rows_nnz,
    csr_has_duplicate, csr_is_nonzero, csr_is_nonzero_pairs, csr_slice_matrix, csr_slice_rows,
    csr_to_coo, csr_to_coo_eid_order, csr_transpose, CooMatrix, CsrMatrix,
};

/// Vertex type id of the source side of every bipartite relation.
pub const SRC_VTYPE: usize = 0;
/// Vertex type id of the destination side of every bipartite relation.
pub const DST_VTYPE: usize = 1;

/// Ordering of the edge triple returned by [`Bipartite::edges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOrder {
    /// Whatever order the cheapest available view stores.
    Arbitrary,
    /// Ascending edge id.
    Eid,
    /// Grouped by source. Only the sources are guaranteed sorted; columns
    /// within a row keep stored order.
    SrcDst,
}

impl FromStr for EdgeOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(Self::Arbitrary),
            "eid" => Ok(Self::Eid),
            "srcdst" => Ok(Self::SrcDst),
            other => Err(Error::InvalidArgument(format!(
                "unsupported edge order: {other:?}"
            ))),
        }
    }
}

/// Format selector for [`Bipartite::get_adj`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjFormat {
    Csr,
    Coo,
}

impl FromStr for AdjFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csr" => Ok(Self::Csr),
            "coo" => Ok(Self::Coo),
            other => Err(Error::InvalidArgument(format!(
                "unsupported adjacency format: {other:?}"
            ))),
        }
    }
}

/// Adjacency-matrix handle returned by [`Bipartite::get_adj`].
#[derive(Debug, Clone)]
pub enum Adj {
    Csr(Arc<CsrMatrix>),
    /// Row and column ids stacked back to back: `[row ‖ col]`.
    Coo(IdArray),
}

/// An immutable directed sparse graph with two vertex types and one edge
/// type, stored as up to three lazily derived views.
#[derive(Debug)]
pub struct Bipartite {
    num_src: i64,
    num_dst: i64,
    num_edges: usize,
    width: BitWidth,
    in_csr: OnceLock<Arc<CsrMatrix>>,
    out_csr: OnceLock<Arc<CsrMatrix>>,
    coo: OnceLock<Arc<CooMatrix>>,
    multigraph: OnceLock<bool>,
}

impl Bipartite {
    /// Build from a COO view. Edge `e` is `(row[e], col[e])`.
    ///
    /// Id ranges are not validated here; out-of-range ids surface when a CSR
    /// view is first derived.
    pub fn from_coo(num_src: i64, num_dst: i64, row: IdArray, col: IdArray) -> Result<Self> {
        if row.len() != col.len() {
            return Err(Error::LengthMismatch(format!(
                "coo row/col: {} vs {}",
                row.len(),
                col.len()
            )));
        }
        let coo = CooMatrix {
            num_rows: num_src,
            num_cols: num_dst,
            row,
            col,
        };
        Ok(Self::from_views(None, None, Some(Arc::new(coo))))
    }

    /// Like [`Bipartite::from_coo`], seeding the multigraph flag so the
    /// first `is_multigraph` query skips the scan.
    pub fn from_coo_with_flag(
        num_src: i64,
        num_dst: i64,
        row: IdArray,
        col: IdArray,
        is_multigraph: bool,
    ) -> Result<Self> {
        let g = Self::from_coo(num_src, num_dst, row, col)?;
        let _ = g.multigraph.set(is_multigraph);
        Ok(g)
    }

    /// Build from a forward CSR view; `edge_ids` assigns the canonical ids.
    pub fn from_csr(
        num_src: i64,
        num_dst: i64,
        indptr: IdArray,
        indices: IdArray,
        edge_ids: IdArray,
    ) -> Result<Self> {
        if indptr.len() != num_src as usize + 1 {
            return Err(Error::LengthMismatch(format!(
                "csr indptr: expected {} entries, got {}",
                num_src + 1,
                indptr.len()
            )));
        }
        if indptr.get(0) != 0 {
            return Err(Error::InvalidArgument("csr indptr must start at 0".into()));
        }
        let nnz = indptr.get(num_src as usize);
        if indices.len() as i64 != nnz || edge_ids.len() as i64 != nnz {
            return Err(Error::LengthMismatch(format!(
                "csr indices/edge_ids: expected {nnz} entries, got {} and {}",
                indices.len(),
                edge_ids.len()
            )));
        }
        let csr = CsrMatrix {
            num_rows: num_src,
            num_cols: num_dst,
            indptr,
            indices,
            edge_ids,
        };
        Ok(Self::from_views(None, Some(Arc::new(csr)), None))
    }

    fn from_views(
        in_csr: Option<Arc<CsrMatrix>>,
        out_csr: Option<Arc<CsrMatrix>>,
        coo: Option<Arc<CooMatrix>>,
    ) -> Self {
        let (num_src, num_dst, num_edges, width) = if let Some(csr) = &out_csr {
            (csr.num_rows, csr.num_cols, csr.num_edges(), csr.indices.width())
        } else if let Some(csr) = &in_csr {
            (csr.num_cols, csr.num_rows, csr.num_edges(), csr.indices.width())
        } else {
            let coo = coo.as_ref().expect("at least one view must exist");
            (coo.num_rows, coo.num_cols, coo.num_edges(), coo.row.width())
        };
        let g = Self {
            num_src,
            num_dst,
            num_edges,
            width,
            in_csr: OnceLock::new(),
            out_csr: OnceLock::new(),
            coo: OnceLock::new(),
            multigraph: OnceLock::new(),
        };
        if let Some(v) = in_csr {
            let _ = g.in_csr.set(v);
        }
        if let Some(v) = out_csr {
            let _ = g.out_csr.set(v);
        }
        if let Some(v) = coo {
            let _ = g.coo.set(v);
        }
        g
    }

    #[must_use]
    pub fn num_src(&self) -> i64 {
        self.num_src
    }

    #[must_use]
    pub fn num_dst(&self) -> i64 {
        self.num_dst
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[must_use]
    pub fn width(&self) -> BitWidth {
        self.width
    }

    pub fn num_vertices(&self, vtype: usize) -> Result<i64> {
        match vtype {
            SRC_VTYPE => Ok(self.num_src),
            DST_VTYPE => Ok(self.num_dst),
            other => Err(Error::InvalidVertexType(other)),
        }
    }

    pub fn has_vertex(&self, vtype: usize, vid: i64) -> Result<bool> {
        Ok(vid >= 0 && vid < self.num_vertices(vtype)?)
    }

    pub fn has_vertices(&self, vtype: usize, vids: &IdArray) -> Result<Vec<bool>> {
        Ok(vids.lt(self.num_vertices(vtype)?))
    }

    /// Whether any `(src, dst)` pair carries more than one edge. Computed on
    /// first call by scanning whichever view already exists, then cached.
    #[must_use]
    pub fn is_multigraph(&self) -> bool {
        *self.multigraph.get_or_init(|| {
            if let Some(csr) = self.in_csr.get() {
                csr_has_duplicate(csr)
            } else if let Some(csr) = self.out_csr.get() {
                csr_has_duplicate(csr)
            } else {
                coo_has_duplicate(self.coo.get().expect("at least one view must exist"))
            }
        })
    }

    /// The forward CSR, materialized on first use.
    ///
    /// Derivation prefers transposing an existing `in_csr` over converting
    /// the COO.
    pub fn out_csr(&self) -> &Arc<CsrMatrix> {
        self.out_csr.get_or_init(|| {
            if let Some(in_csr) = self.in_csr.get() {
                trace!("materializing out-csr by transposing in-csr");
                Arc::new(csr_transpose(in_csr))
            } else {
                let coo = self.coo.get().expect("at least one view must exist");
                trace!("materializing out-csr from coo");
                Arc::new(coo_to_csr(coo, true))
            }
        })
    }

    /// The reverse CSR, materialized on first use.
    pub fn in_csr(&self) -> &Arc<CsrMatrix> {
        self.in_csr.get_or_init(|| {
            if let Some(out_csr) = self.out_csr.get() {
                trace!("materializing in-csr by transposing out-csr");
                Arc::new(csr_transpose(out_csr))
            } else {
                let coo = self.coo.get().expect("at least one view must exist");
                trace!("materializing in-csr from swapped coo");
                Arc::new(coo_to_csr(&coo.transposed(), true))
            }
        })
    }

    /// The COO view, materialized on first use. Position `e` holds edge `e`.
    pub fn coo(&self) -> &Arc<CooMatrix> {
        self.coo.get_or_init(|| {
            if let Some(in_csr) = self.in_csr.get() {
                trace!("materializing coo from in-csr");
                Arc::new(csr_to_coo_eid_order(in_csr).transposed())
            } else {
                let out_csr = self.out_csr.get().expect("at least one view must exist");
                trace!("materializing coo from out-csr");
                Arc::new(csr_to_coo_eid_order(out_csr))
            }
        })
    }

    fn check_src(&self, vid: i64) -> Result<()> {
        if vid >= 0 && vid < self.num_src {
            Ok(())
        } else {
            Err(Error::InvalidVertexId {
                vtype: SRC_VTYPE,
                vid,
            })
        }
    }

    fn check_dst(&self, vid: i64) -> Result<()> {
        if vid >= 0 && vid < self.num_dst {
            Ok(())
        } else {
            Err(Error::InvalidVertexId {
                vtype: DST_VTYPE,
                vid,
            })
        }
    }

    fn check_src_ids(&self, vids: &IdArray) -> Result<()> {
        vids.iter().try_for_each(|v| self.check_src(v))
    }

    fn check_dst_ids(&self, vids: &IdArray) -> Result<()> {
        vids.iter().try_for_each(|v| self.check_dst(v))
    }

    fn check_eid(&self, eid: i64) -> Result<()> {
        if eid >= 0 && (eid as usize) < self.num_edges {
            Ok(())
        } else {
            Err(Error::InvalidEdgeId(eid))
        }
    }

    fn check_eids(&self, eids: &IdArray) -> Result<()> {
        eids.iter().try_for_each(|e| self.check_eid(e))
    }

    fn check_pairs(a: &IdArray, b: &IdArray) -> Result<()> {
        if a.len() == b.len() || a.len() == 1 || b.len() == 1 {
            Ok(())
        } else {
            Err(Error::LengthMismatch(format!(
                "paired id lists: {} vs {}",
                a.len(),
                b.len()
            )))
        }
    }

    pub fn has_edge_between(&self, src: i64, dst: i64) -> Result<bool> {
        self.check_src(src)?;
        self.check_dst(dst)?;
        if let Some(in_csr) = self.in_csr.get() {
            Ok(csr_is_nonzero(in_csr, dst, src))
        } else {
            Ok(csr_is_nonzero(self.out_csr(), src, dst))
        }
    }

    pub fn has_edges_between(&self, src: &IdArray, dst: &IdArray) -> Result<Vec<bool>> {
        Self::check_pairs(src, dst)?;
        self.check_src_ids(src)?;
        self.check_dst_ids(dst)?;
        if let Some(in_csr) = self.in_csr.get() {
            Ok(csr_is_nonzero_pairs(in_csr, dst, src))
        } else {
            Ok(csr_is_nonzero_pairs(self.out_csr(), src, dst))
        }
    }

    /// Source ids with an edge into `dst`, in stored order.
    pub fn predecessors(&self, dst: i64) -> Result<IdArray> {
        self.check_dst(dst)?;
        Ok(csr_get_row_column_indices(self.in_csr(), dst))
    }

    /// Destination ids reachable from `src`, in stored order.
    pub fn successors(&self, src: i64) -> Result<IdArray> {
        self.check_src(src)?;
        Ok(csr_get_row_column_indices(self.out_csr(), src))
    }

    /// All edge ids between `src` and `dst` (several for a multigraph).
    pub fn edge_id(&self, src: i64, dst: i64) -> Result<IdArray> {
        self.check_src(src)?;
        self.check_dst(dst)?;
        if let Some(in_csr) = self.in_csr.get() {
            Ok(csr_get_data(in_csr, dst, src))
        } else {
            Ok(csr_get_data(self.out_csr(), src, dst))
        }
    }

    /// All edges matching the paired (broadcastable) id lists.
    pub fn edge_ids(&self, src: &IdArray, dst: &IdArray) -> Result<EdgeArray> {
        Self::check_pairs(src, dst)?;
        self.check_src_ids(src)?;
        self.check_dst_ids(dst)?;
        if let Some(in_csr) = self.in_csr.get() {
            let (d, s, e) = csr_get_data_and_indices(in_csr, dst, src);
            Ok(EdgeArray {
                src: s,
                dst: d,
                eid: e,
            })
        } else {
            let (s, d, e) = csr_get_data_and_indices(self.out_csr(), src, dst);
            Ok(EdgeArray {
                src: s,
                dst: d,
                eid: e,
            })
        }
    }

    /// The `(src, dst)` endpoints of edge `eid`.
    pub fn find_edge(&self, eid: i64) -> Result<(i64, i64)> {
        self.check_eid(eid)?;
        let coo = self.coo();
        Ok((coo.row.get(eid as usize), coo.col.get(eid as usize)))
    }

    /// Endpoints of a list of edges, in the order given.
    pub fn find_edges(&self, eids: &IdArray) -> Result<EdgeArray> {
        self.check_eids(eids)?;
        let coo = self.coo();
        Ok(EdgeArray {
            src: coo.row.index_select(eids),
            dst: coo.col.index_select(eids),
            eid: eids.clone(),
        })
    }

    /// Edges into `vid` as `(predecessor, vid, eid)` triples.
    pub fn in_edges(&self, vid: i64) -> Result<EdgeArray> {
        self.check_dst(vid)?;
        let csr = self.in_csr();
        let src = csr_get_row_column_indices(csr, vid);
        let eid = csr_get_row_data(csr, vid);
        let dst = IdArray::full(vid, src.len());
        Ok(EdgeArray { src, dst, eid })
    }

    /// Edges into each of `vids`, concatenated.
    pub fn in_edges_many(&self, vids: &IdArray) -> Result<EdgeArray> {
        self.check_dst_ids(vids)?;
        let sub = csr_slice_rows(self.in_csr(), vids);
        let (coo, eids) = csr_to_coo(&sub);
        // Slice rows are relabeled to 0..len, so recover the original ids.
        let dst = vids.index_select(&coo.row);
        Ok(EdgeArray {
            src: coo.col,
            dst,
            eid: eids,
        })
    }

    /// Edges out of `vid` as `(vid, successor, eid)` triples.
    pub fn out_edges(&self, vid: i64) -> Result<EdgeArray> {
        self.check_src(vid)?;
        let csr = self.out_csr();
        let dst = csr_get_row_column_indices(csr, vid);
        let eid = csr_get_row_data(csr, vid);
        let src = IdArray::full(vid, dst.len());
        Ok(EdgeArray { src, dst, eid })
    }

    /// Edges out of each of `vids`, concatenated.
    pub fn out_edges_many(&self, vids: &IdArray) -> Result<EdgeArray> {
        self.check_src_ids(vids)?;
        let sub = csr_slice_rows(self.out_csr(), vids);
        let (coo, eids) = csr_to_coo(&sub);
        let src = vids.index_select(&coo.row);
        Ok(EdgeArray {
            src,
            dst: coo.col,
            eid: eids,
        })
    }

    /// The full edge set in the requested order.
    pub fn edges(&self, order: EdgeOrder) -> Result<EdgeArray> {
        match order {
            EdgeOrder::Arbitrary => {
                if let Some(in_csr) = self.in_csr.get() {
                    let (coo, eids) = csr_to_coo(in_csr);
                    Ok(EdgeArray {
                        src: coo.col,
                        dst: coo.row,
                        eid: eids,
                    })
                } else if let Some(out_csr) = self.out_csr.get() {
                    let (coo, eids) = csr_to_coo(out_csr);
                    Ok(EdgeArray {
                        src: coo.row,
                        dst: coo.col,
                        eid: eids,
                    })
                } else {
                    let coo = self.coo.get().expect("at least one view must exist");
                    Ok(EdgeArray {
                        src: coo.row.clone(),
                        dst: coo.col.clone(),
                        eid: IdArray::range(0, self.num_edges as i64),
                    })
                }
            }
            EdgeOrder::SrcDst => {
                let (coo, eids) = csr_to_coo(self.out_csr());
                Ok(EdgeArray {
                    src: coo.row,
                    dst: coo.col,
                    eid: eids,
                })
            }
            EdgeOrder::Eid => {
                let coo = self.coo();
                Ok(EdgeArray {
                    src: coo.row.clone(),
                    dst: coo.col.clone(),
                    eid: IdArray::range(0, self.num_edges as i64),
                })
            }
        }
    }

    pub fn in_degree(&self, vid: i64) -> Result<usize> {
        self.check_dst(vid)?;
        Ok(csr_get_row_nnz(self.in_csr(), vid))
    }

    pub fn in_degrees(&self, vids: &IdArray) -> Result<IdArray> {
        self.check_dst_ids(vids)?;
        Ok(csr_get_rows_nnz(self.in_csr(), vids))
    }

    pub fn out_degree(&self, vid: i64) -> Result<usize> {
        self.check_src(vid)?;
        Ok(csr_get_row_nnz(self.out_csr(), vid))
    }

    pub fn out_degrees(&self, vids: &IdArray) -> Result<IdArray> {
        self.check_src_ids(vids)?;
        Ok(csr_get_rows_nnz(self.out_csr(), vids))
    }

    /// The adjacency matrix in the requested format.
    ///
    /// The CSR convention is row = destination, column = source, so
    /// `transpose = false` returns the *reverse* CSR and `transpose = true`
    /// the forward one; the COO form follows the same flip. This is kept for
    /// compatibility with downstream sparse-matmul consumers that expect
    /// destination-major rows.
    #[must_use]
    pub fn get_adj(&self, transpose: bool, fmt: AdjFormat) -> Adj {
        match fmt {
            AdjFormat::Csr => {
                if transpose {
                    Adj::Csr(Arc::clone(self.out_csr()))
                } else {
                    Adj::Csr(Arc::clone(self.in_csr()))
                }
            }
            AdjFormat::Coo => {
                let coo = self.coo();
                if transpose {
                    Adj::Coo(IdArray::hstack(&coo.row, &coo.col))
                } else {
                    Adj::Coo(IdArray::hstack(&coo.col, &coo.row))
                }
            }
        }
    }

    /// The subgraph induced by the given source and destination vertices.
    ///
    /// Both axes are re-indexed to the order of the id lists; the new graph
    /// gets dense edge ids and `induced_edges` maps them back.
    pub fn vertex_subgraph(&self, src_ids: &IdArray, dst_ids: &IdArray) -> Result<BipartiteSubgraph> {
        self.check_src_ids(src_ids)?;
        self.check_dst_ids(dst_ids)?;
        let submat = csr_slice_matrix(self.out_csr(), src_ids, dst_ids);
        let induced_edges = submat.edge_ids.clone();
        let sub_eids = IdArray::range(0, submat.num_edges() as i64);
        let graph = Bipartite::from_csr(
            submat.num_rows,
            submat.num_cols,
            submat.indptr,
            submat.indices,
            sub_eids,
        )?;
        Ok(BipartiteSubgraph {
            graph,
            induced_vertices: [src_ids.clone(), dst_ids.clone()],
            induced_edges,
        })
    }

    /// The subgraph induced by the given edges.
    ///
    /// With `preserve_nodes` the vertex spaces are unchanged; otherwise the
    /// surviving sources and destinations are separately relabeled onto
    /// dense ranges in first-occurrence order.
    pub fn edge_subgraph(&self, eids: &IdArray, preserve_nodes: bool) -> Result<BipartiteSubgraph> {
        self.check_eids(eids)?;
        let coo = self.coo();
        let mut new_src = coo.row.index_select(eids);
        let mut new_dst = coo.col.index_select(eids);
        if preserve_nodes {
            let graph = Bipartite::from_coo(self.num_src, self.num_dst, new_src, new_dst)?;
            Ok(BipartiteSubgraph {
                graph,
                induced_vertices: [
                    IdArray::range(0, self.num_src),
                    IdArray::range(0, self.num_dst),
                ],
                induced_edges: eids.clone(),
            })
        } else {
            let src_map = IdArray::relabel(std::slice::from_mut(&mut new_src));
            let dst_map = IdArray::relabel(std::slice::from_mut(&mut new_dst));
            let graph = Bipartite::from_coo(
                src_map.len() as i64,
                dst_map.len() as i64,
                new_src,
                new_dst,
            )?;
            Ok(BipartiteSubgraph {
                graph,
                induced_vertices: [src_map, dst_map],
                induced_edges: eids.clone(),
            })
        }
    }
}

/// A bipartite subgraph plus the tables mapping it back to its parent.
///
/// `induced_vertices[v][i]` is the parent id of node `i` of vertex type `v`;
/// `induced_edges[e]` likewise for edges.
#[derive(Debug)]
pub struct BipartiteSubgraph {
    pub graph: Bipartite,
    pub induced_vertices: [IdArray; 2],
    pub induced_edges: IdArray,
}
