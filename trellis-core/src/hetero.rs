//! Heterograph: a meta-graph plus one bipartite relation per edge type.
//!
//! All vertex types share a single id space per type across relations: the
//! constructor verifies that every relation incident on a vertex type agrees
//! on its cardinality, and `edge_subgraph` without node preservation keeps
//! that invariant by union-relabeling per vertex type before rebuilding the
//! relations.

use std::sync::{Arc, OnceLock};

use crate::array::{EdgeArray, IdArray};
use crate::bipartite::{Adj, AdjFormat, Bipartite, EdgeOrder};
use crate::error::{Error, Result};
use crate::meta::MetaGraph;

/// An immutable multi-relational graph.
#[derive(Debug)]
pub struct HeteroGraph {
    meta: Arc<MetaGraph>,
    relations: Vec<Arc<Bipartite>>,
    num_verts_per_type: Vec<i64>,
    multigraph: OnceLock<bool>,
}

impl HeteroGraph {
    /// Compose relations under a meta-graph, one relation per meta-edge in
    /// edge-type order.
    ///
    /// Fails when the relation list is empty, its length disagrees with the
    /// meta-graph, or two relations incident on the same vertex type (as
    /// either endpoint) disagree on that type's vertex count.
    pub fn new(meta: Arc<MetaGraph>, relations: Vec<Arc<Bipartite>>) -> Result<Self> {
        if relations.is_empty() {
            return Err(Error::InvalidArgument("empty relation list".into()));
        }
        if relations.len() != meta.num_edge_types() {
            return Err(Error::LengthMismatch(format!(
                "relations: expected {} (one per meta-edge), got {}",
                meta.num_edge_types(),
                relations.len()
            )));
        }
        let mut num_verts = vec![-1i64; meta.num_vertex_types()];
        for (etype, rel) in relations.iter().enumerate() {
            let (src_vtype, dst_vtype) = meta.find_edge(etype)?;
            for (vtype, nv) in [(src_vtype, rel.num_src()), (dst_vtype, rel.num_dst())] {
                if num_verts[vtype] < 0 {
                    num_verts[vtype] = nv;
                } else if num_verts[vtype] != nv {
                    return Err(Error::VertexCountMismatch {
                        vtype,
                        expected: num_verts[vtype],
                        got: nv,
                    });
                }
            }
        }
        // A vertex type with no incident relation has no vertices.
        for n in &mut num_verts {
            if *n < 0 {
                *n = 0;
            }
        }
        Ok(Self {
            meta,
            relations,
            num_verts_per_type: num_verts,
            multigraph: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn meta_graph(&self) -> &Arc<MetaGraph> {
        &self.meta
    }

    /// The bipartite relation backing an edge type.
    pub fn relation(&self, etype: usize) -> Result<&Arc<Bipartite>> {
        self.relations
            .get(etype)
            .ok_or(Error::InvalidEdgeType(etype))
    }

    #[must_use]
    pub fn num_vertex_types(&self) -> usize {
        self.meta.num_vertex_types()
    }

    #[must_use]
    pub fn num_edge_types(&self) -> usize {
        self.meta.num_edge_types()
    }

    pub fn num_vertices(&self, vtype: usize) -> Result<i64> {
        self.num_verts_per_type
            .get(vtype)
            .copied()
            .ok_or(Error::InvalidVertexType(vtype))
    }

    pub fn num_edges(&self, etype: usize) -> Result<usize> {
        Ok(self.relation(etype)?.num_edges())
    }

    pub fn has_vertex(&self, vtype: usize, vid: i64) -> Result<bool> {
        Ok(vid >= 0 && vid < self.num_vertices(vtype)?)
    }

    pub fn has_vertices(&self, vtype: usize, vids: &IdArray) -> Result<Vec<bool>> {
        Ok(vids.lt(self.num_vertices(vtype)?))
    }

    /// Disjunction of the relations' multigraph flags, lazily cached.
    #[must_use]
    pub fn is_multigraph(&self) -> bool {
        *self
            .multigraph
            .get_or_init(|| self.relations.iter().any(|r| r.is_multigraph()))
    }

    pub fn has_edge_between(&self, etype: usize, src: i64, dst: i64) -> Result<bool> {
        self.relation(etype)?.has_edge_between(src, dst)
    }

    pub fn has_edges_between(
        &self,
        etype: usize,
        src: &IdArray,
        dst: &IdArray,
    ) -> Result<Vec<bool>> {
        self.relation(etype)?.has_edges_between(src, dst)
    }

    pub fn predecessors(&self, etype: usize, dst: i64) -> Result<IdArray> {
        self.relation(etype)?.predecessors(dst)
    }

    pub fn successors(&self, etype: usize, src: i64) -> Result<IdArray> {
        self.relation(etype)?.successors(src)
    }

    pub fn edge_id(&self, etype: usize, src: i64, dst: i64) -> Result<IdArray> {
        self.relation(etype)?.edge_id(src, dst)
    }

    pub fn edge_ids(&self, etype: usize, src: &IdArray, dst: &IdArray) -> Result<EdgeArray> {
        self.relation(etype)?.edge_ids(src, dst)
    }

    pub fn find_edge(&self, etype: usize, eid: i64) -> Result<(i64, i64)> {
        self.relation(etype)?.find_edge(eid)
    }

    pub fn find_edges(&self, etype: usize, eids: &IdArray) -> Result<EdgeArray> {
        self.relation(etype)?.find_edges(eids)
    }

    pub fn in_edges(&self, etype: usize, vid: i64) -> Result<EdgeArray> {
        self.relation(etype)?.in_edges(vid)
    }

    pub fn in_edges_many(&self, etype: usize, vids: &IdArray) -> Result<EdgeArray> {
        self.relation(etype)?.in_edges_many(vids)
    }

    pub fn out_edges(&self, etype: usize, vid: i64) -> Result<EdgeArray> {
        self.relation(etype)?.out_edges(vid)
    }

    pub fn out_edges_many(&self, etype: usize, vids: &IdArray) -> Result<EdgeArray> {
        self.relation(etype)?.out_edges_many(vids)
    }

    pub fn edges(&self, etype: usize, order: EdgeOrder) -> Result<EdgeArray> {
        self.relation(etype)?.edges(order)
    }

    pub fn in_degree(&self, etype: usize, vid: i64) -> Result<usize> {
        self.relation(etype)?.in_degree(vid)
    }

    pub fn in_degrees(&self, etype: usize, vids: &IdArray) -> Result<IdArray> {
        self.relation(etype)?.in_degrees(vids)
    }

    pub fn out_degree(&self, etype: usize, vid: i64) -> Result<usize> {
        self.relation(etype)?.out_degree(vid)
    }

    pub fn out_degrees(&self, etype: usize, vids: &IdArray) -> Result<IdArray> {
        self.relation(etype)?.out_degrees(vids)
    }

    /// See [`Bipartite::get_adj`] for the transpose convention.
    pub fn get_adj(&self, etype: usize, transpose: bool, fmt: AdjFormat) -> Result<Adj> {
        Ok(self.relation(etype)?.get_adj(transpose, fmt))
    }

    /// The subgraph induced by one vertex-id list per vertex type.
    pub fn vertex_subgraph(&self, vids: &[IdArray]) -> Result<HeteroSubgraph> {
        if vids.len() != self.num_vertex_types() {
            return Err(Error::LengthMismatch(format!(
                "vertex id lists: expected {} (one per vertex type), got {}",
                self.num_vertex_types(),
                vids.len()
            )));
        }
        let mut subrels = Vec::with_capacity(self.num_edge_types());
        let mut induced_edges = Vec::with_capacity(self.num_edge_types());
        for etype in 0..self.num_edge_types() {
            let (src_vtype, dst_vtype) = self.meta.find_edge(etype)?;
            let sub = self.relations[etype].vertex_subgraph(&vids[src_vtype], &vids[dst_vtype])?;
            subrels.push(Arc::new(sub.graph));
            induced_edges.push(sub.induced_edges);
        }
        Ok(HeteroSubgraph {
            graph: HeteroGraph::new(Arc::clone(&self.meta), subrels)?,
            induced_vertices: vids.to_vec(),
            induced_edges,
        })
    }

    /// The subgraph induced by one edge-id list per edge type.
    pub fn edge_subgraph(&self, eids: &[IdArray], preserve_nodes: bool) -> Result<HeteroSubgraph> {
        if eids.len() != self.num_edge_types() {
            return Err(Error::LengthMismatch(format!(
                "edge id lists: expected {} (one per edge type), got {}",
                self.num_edge_types(),
                eids.len()
            )));
        }
        if preserve_nodes {
            self.edge_subgraph_preserve(eids)
        } else {
            self.edge_subgraph_relabel(eids)
        }
    }

    fn edge_subgraph_preserve(&self, eids: &[IdArray]) -> Result<HeteroSubgraph> {
        let mut induced_vertices = vec![IdArray::empty(); self.num_vertex_types()];
        let mut subrels = Vec::with_capacity(self.num_edge_types());
        for etype in 0..self.num_edge_types() {
            let (src_vtype, dst_vtype) = self.meta.find_edge(etype)?;
            let sub = self.relations[etype].edge_subgraph(&eids[etype], true)?;
            // Node spaces are preserved, so every relation incident on a
            // vertex type reports the same full range here.
            let [src_range, dst_range] = sub.induced_vertices;
            induced_vertices[src_vtype] = src_range;
            induced_vertices[dst_vtype] = dst_range;
            subrels.push(Arc::new(sub.graph));
        }
        Ok(HeteroSubgraph {
            graph: HeteroGraph::new(Arc::clone(&self.meta), subrels)?,
            induced_vertices,
            induced_edges: eids.to_vec(),
        })
    }

    /// Edge-induced subgraph with shrunken vertex spaces.
    ///
    /// Relations sharing a vertex type must end up in the same dense id
    /// space for that type, so the incident endpoint sets are unioned per
    /// vertex type and relabeled together before the relations are rebuilt.
    fn edge_subgraph_relabel(&self, eids: &[IdArray]) -> Result<HeteroSubgraph> {
        let ne = self.num_edge_types();
        // Slice the selected edges out of every relation.
        let mut sub_src = Vec::with_capacity(ne);
        let mut sub_dst = Vec::with_capacity(ne);
        for etype in 0..ne {
            let edges = self.relations[etype].find_edges(&eids[etype])?;
            sub_src.push(edges.src);
            sub_dst.push(edges.dst);
        }
        // Union-relabel the incident endpoints of each vertex type and write
        // the rewritten endpoint lists back to their relations.
        let mut induced_vertices = Vec::with_capacity(self.num_vertex_types());
        for vtype in 0..self.num_vertex_types() {
            let mut incident = Vec::new();
            let mut slots = Vec::new();
            for etype in 0..ne {
                let (src_vtype, dst_vtype) = self.meta.find_edge(etype)?;
                if src_vtype == vtype {
                    incident.push(sub_src[etype].clone());
                    slots.push((etype, false));
                }
                if dst_vtype == vtype {
                    incident.push(sub_dst[etype].clone());
                    slots.push((etype, true));
                }
            }
            let mapping = IdArray::relabel(&mut incident);
            for ((etype, is_dst), arr) in slots.into_iter().zip(incident) {
                if is_dst {
                    sub_dst[etype] = arr;
                } else {
                    sub_src[etype] = arr;
                }
            }
            induced_vertices.push(mapping);
        }
        // Rebuild each relation in the new dense id spaces.
        let mut subrels = Vec::with_capacity(ne);
        for etype in 0..ne {
            let (src_vtype, dst_vtype) = self.meta.find_edge(etype)?;
            subrels.push(Arc::new(Bipartite::from_coo(
                induced_vertices[src_vtype].len() as i64,
                induced_vertices[dst_vtype].len() as i64,
                sub_src[etype].clone(),
                sub_dst[etype].clone(),
            )?));
        }
        Ok(HeteroSubgraph {
            graph: HeteroGraph::new(Arc::clone(&self.meta), subrels)?,
            induced_vertices,
            induced_edges: eids.to_vec(),
        })
    }
}

/// A heterograph subgraph plus the per-type tables mapping it back to its
/// parent: `induced_vertices[v][i]` is the parent id of node `i` of vertex
/// type `v`, and likewise `induced_edges[t]` for edge type `t`.
#[derive(Debug)]
pub struct HeteroSubgraph {
    pub graph: HeteroGraph,
    pub induced_vertices: Vec<IdArray>,
    pub induced_edges: Vec<IdArray>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Meta A -> B -> C with the relations used throughout the suite:
    /// A->B edges (0,0),(0,1),(1,1); B->C edges (0,0),(1,0),(1,1).
    fn chain_heterograph() -> HeteroGraph {
        let meta = Arc::new(MetaGraph::new(3, &[(0, 1), (1, 2)]).unwrap());
        let ab = Bipartite::from_coo(
            2,
            2,
            IdArray::from_vec(vec![0, 0, 1]),
            IdArray::from_vec(vec![0, 1, 1]),
        )
        .unwrap();
        let bc = Bipartite::from_coo(
            2,
            2,
            IdArray::from_vec(vec![0, 1, 1]),
            IdArray::from_vec(vec![0, 0, 1]),
        )
        .unwrap();
        HeteroGraph::new(meta, vec![Arc::new(ab), Arc::new(bc)]).unwrap()
    }

    #[test]
    fn test_construction_and_counts() {
        let hg = chain_heterograph();
        assert_eq!(hg.num_vertex_types(), 3);
        assert_eq!(hg.num_edge_types(), 2);
        assert_eq!(hg.num_vertices(0).unwrap(), 2);
        assert_eq!(hg.num_vertices(1).unwrap(), 2);
        assert_eq!(hg.num_vertices(2).unwrap(), 2);
        assert_eq!(hg.num_edges(0).unwrap(), 3);
        assert!(!hg.is_multigraph());
    }

    #[test]
    fn test_vertex_count_mismatch_rejected() {
        let meta = Arc::new(MetaGraph::new(3, &[(0, 1), (1, 2)]).unwrap());
        let ab = Bipartite::from_coo(
            2,
            2,
            IdArray::from_vec(vec![0]),
            IdArray::from_vec(vec![1]),
        )
        .unwrap();
        // Disagrees on the cardinality of B (3 vs 2).
        let bc = Bipartite::from_coo(
            3,
            2,
            IdArray::from_vec(vec![0]),
            IdArray::from_vec(vec![0]),
        )
        .unwrap();
        let err = HeteroGraph::new(meta, vec![Arc::new(ab), Arc::new(bc)]).unwrap_err();
        assert!(matches!(err, Error::VertexCountMismatch { vtype: 1, .. }));
    }

    #[test]
    fn test_empty_relation_list_rejected() {
        let meta = Arc::new(MetaGraph::new(1, &[]).unwrap());
        assert!(HeteroGraph::new(meta, Vec::new()).is_err());
    }

    #[test]
    fn test_query_dispatch() {
        let hg = chain_heterograph();
        assert_eq!(hg.successors(0, 0).unwrap().to_vec(), vec![0, 1]);
        assert_eq!(hg.predecessors(1, 0).unwrap().to_vec(), vec![0, 1]);
        assert!(hg.has_edge_between(0, 1, 1).unwrap());
        assert!(!hg.has_edge_between(0, 1, 0).unwrap());
        assert_eq!(
            hg.has_vertices(1, &IdArray::from_vec(vec![0, 1, 2])).unwrap(),
            vec![true, true, false]
        );
        assert!(hg.successors(2, 0).is_err());
    }

    #[test]
    fn test_vertex_subgraph() {
        let hg = chain_heterograph();
        let vids = [
            IdArray::from_vec(vec![0]),
            IdArray::from_vec(vec![1]),
            IdArray::from_vec(vec![0, 1]),
        ];
        let sub = hg.vertex_subgraph(&vids).unwrap();
        assert_eq!(sub.graph.num_vertices(0).unwrap(), 1);
        assert_eq!(sub.graph.num_vertices(1).unwrap(), 1);
        assert_eq!(sub.graph.num_vertices(2).unwrap(), 2);
        // A->B keeps (0,1) as the only surviving edge.
        assert_eq!(sub.induced_edges[0].to_vec(), vec![1]);
        // B->C keeps (1,0) and (1,1).
        assert_eq!(sub.induced_edges[1].to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_edge_subgraph_preserve_nodes() {
        let hg = chain_heterograph();
        let sub = hg
            .edge_subgraph(
                &[IdArray::from_vec(vec![0]), IdArray::from_vec(vec![2])],
                true,
            )
            .unwrap();
        assert_eq!(sub.graph.num_vertices(0).unwrap(), 2);
        assert_eq!(sub.graph.num_vertices(1).unwrap(), 2);
        assert_eq!(sub.graph.num_vertices(2).unwrap(), 2);
        assert_eq!(sub.induced_vertices[1].to_vec(), vec![0, 1]);
        let edges = sub.graph.edges(0, EdgeOrder::Eid).unwrap();
        assert_eq!(edges.src.to_vec(), vec![0]);
        assert_eq!(edges.dst.to_vec(), vec![0]);
    }

    #[test]
    fn test_edge_subgraph_unifies_shared_vertex_type() {
        let hg = chain_heterograph();
        // Keep A->B edge (0,0) and B->C edge (1,1).
        let sub = hg
            .edge_subgraph(
                &[IdArray::from_vec(vec![0]), IdArray::from_vec(vec![2])],
                false,
            )
            .unwrap();
        assert_eq!(sub.induced_vertices[0].to_vec(), vec![0]);
        // B's survivors in first-occurrence order: dst of A->B, then src of B->C.
        assert_eq!(sub.induced_vertices[1].to_vec(), vec![0, 1]);
        assert_eq!(sub.induced_vertices[2].to_vec(), vec![1]);
        let ab = sub.graph.edges(0, EdgeOrder::Eid).unwrap();
        assert_eq!(ab.src.to_vec(), vec![0]);
        assert_eq!(ab.dst.to_vec(), vec![0]);
        let bc = sub.graph.edges(1, EdgeOrder::Eid).unwrap();
        assert_eq!(bc.src.to_vec(), vec![1]);
        assert_eq!(bc.dst.to_vec(), vec![0]);
    }
}
