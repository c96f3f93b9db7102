//! NodeFlow: the layered, re-indexed subgraph a sampler produces.

use std::collections::HashMap;

use trellis_core::{CsrMatrix, Graph, IdArray, NeighborType};

/// A multi-layer subgraph packed for mini-batch message passing.
///
/// Nodes are renumbered densely; `layer_offsets[l]..layer_offsets[l + 1]`
/// is the node-id slice of layer `l`, with layer 0 holding the outer
/// frontier and the last layer the seeds. `flow_offsets[l]` accumulates the
/// edges of the flows before flow `l`. `node_mapping` / `edge_mapping`
/// translate dense ids back to the parent graph, with `-1` in
/// `edge_mapping` marking a self-loop the sampler added that has no parent
/// edge.
#[derive(Debug)]
pub struct NodeFlow {
    pub graph: Graph,
    pub node_mapping: IdArray,
    pub edge_mapping: IdArray,
    pub layer_offsets: IdArray,
    pub flow_offsets: IdArray,
}

impl NodeFlow {
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.layer_offsets.len() - 1
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_mapping.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edge_mapping.len()
    }

    /// Dense node ids of layer `l`.
    #[must_use]
    pub fn layer_range(&self, l: usize) -> std::ops::Range<usize> {
        self.layer_offsets.get(l) as usize..self.layer_offsets.get(l + 1) as usize
    }

    /// Parent vertex ids of layer `l`.
    #[must_use]
    pub fn layer_vertices(&self, l: usize) -> &[i64] {
        &self.node_mapping.as_slice()[self.layer_range(l)]
    }
}

/// A node's slice of the flat neighbor buffers: where its sampled
/// neighborhood starts and how many entries it spans.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NeighborInfo {
    pub id: i64,
    pub pos: usize,
    pub num_edges: usize,
}

/// Pack a BFS trace into a NodeFlow.
///
/// `sub_vers` holds `(vertex, layer)` pairs in discovery order with the
/// seeds in layer 0; `layer_offsets` delimits the layers inside it;
/// `neigh_pos` records, per expanded node, the slice of `neighbor_list` /
/// `edge_list` holding its sampled neighborhood. The output reverses the
/// layer order so the outer frontier comes first and the seeds last, and
/// renumbers vertices densely in that order.
pub(crate) fn construct_node_flow(
    neighbor_list: &[i64],
    edge_list: &[i64],
    layer_offsets: &[usize],
    sub_vers: &mut [(i64, usize)],
    neigh_pos: &mut [NeighborInfo],
    edge_type: NeighborType,
    num_edges: usize,
    num_hops: usize,
) -> NodeFlow {
    let num_vertices = sub_vers.len();
    let mut node_mapping = Vec::with_capacity(num_vertices);
    let mut edge_mapping = vec![0i64; num_edges];
    let mut layer_off = vec![0i64; num_hops + 1];
    let mut flow_off = vec![0i64; num_hops];
    let mut indptr = vec![0i64; num_vertices + 1];
    let mut col_list = vec![0i64; num_edges];

    // Number the vertices layer by layer, outermost first. Non-seed layers
    // are sorted by parent vertex id so the remapped adjacency comes out in
    // a deterministic order; the seed layer keeps the caller's order.
    let mut layer_ver_maps: Vec<HashMap<i64, i64>> = vec![HashMap::new(); num_hops];
    let mut ver_id: i64 = 0;
    for layer_id in (0..num_hops).rev() {
        if layer_id > 0 {
            sub_vers[layer_offsets[layer_id]..layer_offsets[layer_id + 1]]
                .sort_unstable_by_key(|&(vid, _)| vid);
        }
        for i in layer_offsets[layer_id]..layer_offsets[layer_id + 1] {
            let (vid, lid) = sub_vers[i];
            debug_assert_eq!(lid, layer_id);
            node_mapping.push(vid);
            layer_ver_maps[layer_id].insert(vid, ver_id);
            ver_id += 1;
        }
    }
    assert_eq!(node_mapping.len(), num_vertices);

    // Fill the CSR rows in the same reversed order. The outer frontier
    // contributes empty rows; every expanded node's neighbors are remapped
    // through the *next* layer's numbering.
    let mut collected_nedges = 0usize;
    let mut row_idx = layer_offsets[num_hops] - layer_offsets[num_hops - 1];
    layer_off[1] = row_idx as i64;
    let mut out_layer_idx = 1;
    for layer_id in (0..num_hops - 1).rev() {
        // Keep neigh_pos aligned with the re-sorted sub_vers slice.
        if layer_id > 0 {
            neigh_pos[layer_offsets[layer_id]..layer_offsets[layer_id + 1]]
                .sort_unstable_by_key(|info| info.id);
        }
        for i in layer_offsets[layer_id]..layer_offsets[layer_id + 1] {
            let dst_id = sub_vers[i].0;
            assert_eq!(dst_id, neigh_pos[i].id);
            let pos = neigh_pos[i].pos;
            let nedges = neigh_pos[i].num_edges;
            debug_assert!(pos + nedges <= neighbor_list.len());
            for j in 0..nedges {
                let neigh = neighbor_list[pos + j];
                let mapped = layer_ver_maps[layer_id + 1]
                    .get(&neigh)
                    .expect("sampled neighbor must appear in the next layer");
                col_list[collected_nedges + j] = *mapped;
            }
            edge_mapping[collected_nedges..collected_nedges + nedges]
                .copy_from_slice(&edge_list[pos..pos + nedges]);
            collected_nedges += nedges;
            indptr[row_idx + 1] = indptr[row_idx] + nedges as i64;
            row_idx += 1;
        }
        layer_off[out_layer_idx + 1] = layer_off[out_layer_idx]
            + (layer_offsets[layer_id + 1] - layer_offsets[layer_id]) as i64;
        out_layer_idx += 1;
    }
    assert_eq!(row_idx, num_vertices);
    assert_eq!(indptr[num_vertices] as usize, num_edges);
    assert_eq!(out_layer_idx, num_hops);
    assert_eq!(layer_off[num_hops] as usize, num_vertices);

    for i in 0..num_hops - 1 {
        let flow_edges =
            indptr[layer_off[i + 2] as usize] - indptr[layer_off[i + 1] as usize];
        flow_off[i + 1] = flow_off[i] + flow_edges;
    }
    assert_eq!(flow_off[num_hops - 1] as usize, num_edges);

    let csr = CsrMatrix {
        num_rows: num_vertices as i64,
        num_cols: num_vertices as i64,
        indptr: IdArray::from_vec(indptr),
        indices: IdArray::from_vec(col_list),
        edge_ids: IdArray::range(0, num_edges as i64),
    };
    let graph = match edge_type {
        NeighborType::In => Graph::from_in_csr(csr),
        NeighborType::Out => Graph::from_out_csr(csr),
    };
    NodeFlow {
        graph,
        node_mapping: IdArray::from_vec(node_mapping),
        edge_mapping: IdArray::from_vec(edge_mapping),
        layer_offsets: IdArray::from_vec(layer_off),
        flow_offsets: IdArray::from_vec(flow_off),
    }
}
