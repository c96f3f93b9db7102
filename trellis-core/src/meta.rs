//! Meta-graph: the small directed graph of vertex types and edge types.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::error::{Error, Result};

/// The type-level schema of a heterograph.
///
/// Vertices are vertex types, edges are edge types; the id of an edge type
/// is its insertion index, which is also the index of the corresponding
/// relation graph in the owning heterograph.
#[derive(Debug, Clone)]
pub struct MetaGraph {
    graph: DiGraph<(), ()>,
}

impl MetaGraph {
    /// Build from the vertex-type count and `(src_vtype, dst_vtype)` pairs
    /// listed in edge-type order.
    pub fn new(num_vertex_types: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(num_vertex_types, edges.len());
        for _ in 0..num_vertex_types {
            graph.add_node(());
        }
        for &(s, d) in edges {
            if s >= num_vertex_types {
                return Err(Error::InvalidVertexType(s));
            }
            if d >= num_vertex_types {
                return Err(Error::InvalidVertexType(d));
            }
            graph.add_edge(NodeIndex::new(s), NodeIndex::new(d), ());
        }
        Ok(Self { graph })
    }

    #[must_use]
    pub fn num_vertex_types(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn num_edge_types(&self) -> usize {
        self.graph.edge_count()
    }

    /// The `(src_vtype, dst_vtype)` endpoints of an edge type.
    pub fn find_edge(&self, etype: usize) -> Result<(usize, usize)> {
        self.graph
            .edge_endpoints(EdgeIndex::new(etype))
            .map(|(s, d)| (s.index(), d.index()))
            .ok_or(Error::InvalidEdgeType(etype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_graph_endpoints() {
        // A -> B -> C plus a self-relation on A.
        let meta = MetaGraph::new(3, &[(0, 1), (1, 2), (0, 0)]).unwrap();
        assert_eq!(meta.num_vertex_types(), 3);
        assert_eq!(meta.num_edge_types(), 3);
        assert_eq!(meta.find_edge(0).unwrap(), (0, 1));
        assert_eq!(meta.find_edge(1).unwrap(), (1, 2));
        assert_eq!(meta.find_edge(2).unwrap(), (0, 0));
        assert!(meta.find_edge(3).is_err());
    }

    #[test]
    fn test_meta_graph_rejects_bad_vtype() {
        assert!(MetaGraph::new(2, &[(0, 2)]).is_err());
    }
}
