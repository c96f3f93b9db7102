//! Immutable heterogeneous sparse-graph storage for graph learning
//! workloads.
//!
//! This crate provides the storage half of the trellis engine:
//!
//! - [`IdArray`] - a shared, read-only 1-D id tensor
//! - [`CooMatrix`] / [`CsrMatrix`] - interchangeable sparse adjacency views
//!   with pure conversions that preserve edge-id identity
//! - [`Bipartite`] - one two-typed relation under lazily materialized
//!   forward-CSR, reverse-CSR and COO views
//! - [`MetaGraph`] / [`HeteroGraph`] - composition of bipartite relations
//!   under a type-level schema, with vertex-induced and edge-induced
//!   subgraph extraction
//! - [`Graph`] - the homogeneous graph consumed by the samplers in
//!   `trellis-sampler`
//!
//! # Views and edge ids
//!
//! Every graph assigns its edges dense canonical ids `0..num_edges` at
//! construction. Views derived afterwards (transposes, format conversions)
//! carry those ids through, so a query answers in the same id space no
//! matter which view happens to serve it. Derivation is lazy and cached in
//! write-once slots: a view is built at most once and never mutated, which
//! keeps concurrent readers safe without locks.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{Bipartite, EdgeOrder, IdArray};
//!
//! // Three users, four items, four interactions.
//! let g = Bipartite::from_coo(
//!     3,
//!     4,
//!     IdArray::from_vec(vec![0, 0, 1, 2]),
//!     IdArray::from_vec(vec![0, 1, 2, 3]),
//! )
//! .unwrap();
//!
//! assert_eq!(g.successors(0).unwrap().to_vec(), vec![0, 1]);
//! assert_eq!(g.predecessors(2).unwrap().to_vec(), vec![1]);
//! let edges = g.edges(EdgeOrder::Eid).unwrap();
//! assert_eq!(edges.eid.to_vec(), vec![0, 1, 2, 3]);
//! ```

mod array;
mod bipartite;
mod error;
mod graph;
mod hetero;
mod meta;
pub mod sparse;

pub use array::{BitWidth, EdgeArray, IdArray};
pub use bipartite::{
    Adj, AdjFormat, Bipartite, BipartiteSubgraph, EdgeOrder, DST_VTYPE, SRC_VTYPE,
};
pub use error::{Error, Result};
pub use graph::{Graph, NeighborType};
pub use hetero::{HeteroGraph, HeteroSubgraph};
pub use meta::MetaGraph;
pub use sparse::{CooMatrix, CsrMatrix};
