//! Layer-wise uniform sampling: bulk expansion with per-layer target sizes.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::debug;

use trellis_core::{BitWidth, CsrMatrix, Graph, IdArray, NeighborType};

use crate::error::{Result, SampleError};
use crate::nodeflow::NodeFlow;
use crate::rng::RandomEngine;

/// Grow the layer stack outward from the seeds.
///
/// Each step unions the neighbors of the newest layer into a candidate set
/// (deduplicated in first-encounter order so fixed-seed runs reproduce),
/// draws `layer_sizes[i]` picks with replacement, and keeps the distinct
/// picks as the next layer together with their importance weights
/// `multiplicity * |candidates| / layer_size`. Returns layer offsets, the
/// node mapping (outermost layer first), per-layer actual sizes, and the
/// weights in node-mapping order.
fn construct_layers(
    indptr: &[i64],
    indices: &[i64],
    seeds: &[i64],
    layer_sizes: &[i64],
    rng: &mut RandomEngine,
) -> (Vec<i64>, Vec<i64>, Vec<i64>, Vec<f32>) {
    let mut node_mapping: Vec<i64> = seeds.to_vec();
    let mut actual_sizes = vec![node_mapping.len() as i64];
    let mut probabilities = vec![1.0f32; node_mapping.len()];

    let mut curr = 0usize;
    let mut next = node_mapping.len();
    for i in (0..layer_sizes.len()).rev() {
        let layer_size = layer_sizes[i];
        let mut candidates: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        for &src in &node_mapping[curr..next] {
            for k in indptr[src as usize] as usize..indptr[src as usize + 1] as usize {
                if seen.insert(indices[k]) {
                    candidates.push(indices[k]);
                }
            }
        }
        if candidates.is_empty() {
            // Dead end: the frontier has no neighbors in this direction.
            actual_sizes.push(0);
            curr = next;
            continue;
        }
        let n_candidates = candidates.len();
        let mut occur_order: Vec<i64> = Vec::new();
        let mut occurrences: HashMap<i64, usize> = HashMap::new();
        for _ in 0..layer_size {
            let dst = candidates[rng.rand_int(n_candidates)];
            *occurrences.entry(dst).or_insert_with(|| {
                occur_order.push(dst);
                0
            }) += 1;
        }
        for &dst in &occur_order {
            node_mapping.push(dst);
            probabilities.push((occurrences[&dst] * n_candidates) as f32 / layer_size as f32);
        }
        actual_sizes.push(occur_order.len() as i64);
        curr = next;
        next = node_mapping.len();
    }
    node_mapping.reverse();
    actual_sizes.reverse();
    probabilities.reverse();

    let mut layer_offsets = vec![0i64];
    for &size in &actual_sizes {
        layer_offsets.push(layer_offsets.last().unwrap() + size);
    }
    (layer_offsets, node_mapping, actual_sizes, probabilities)
}

/// Build the dense subgraph between each pair of adjacent layers.
///
/// For every destination node the neighbors that landed in the previous
/// (source) layer are collected, sorted by their compact position, and
/// appended to the flow's CSR slice; `flow_offsets` accumulates the edge
/// counts, `edge_mapping` keeps the parent edge ids.
fn construct_flows(
    indptr: &[i64],
    indices: &[i64],
    eids: &[i64],
    node_mapping: &[i64],
    actual_sizes: &[i64],
) -> (Vec<i64>, Vec<i64>, Vec<i64>, Vec<i64>) {
    let n_flows = actual_sizes.len() - 1;
    let mut sub_indptr = vec![0i64; actual_sizes[0] as usize + 1];
    let mut sub_indices: Vec<i64> = Vec::new();
    let mut edge_mapping: Vec<i64> = Vec::new();
    let mut flow_offsets = vec![0i64];

    let mut first = 0usize;
    for i in 0..n_flows {
        let src_size = actual_sizes[i] as usize;
        let source_map: HashMap<i64, i64> = (0..src_size)
            .map(|j| (node_mapping[first + j], (first + j) as i64))
            .collect();
        let dst_size = actual_sizes[i + 1] as usize;
        for j in 0..dst_size {
            let dst = node_mapping[first + src_size + j] as usize;
            let mut neighbor_slots: Vec<(i64, i64)> = Vec::new();
            for k in indptr[dst] as usize..indptr[dst + 1] as usize {
                if let Some(&pos) = source_map.get(&indices[k]) {
                    neighbor_slots.push((pos, eids[k]));
                }
            }
            neighbor_slots.sort_unstable_by_key(|&(pos, _)| pos);
            for (pos, eid) in neighbor_slots {
                sub_indices.push(pos);
                edge_mapping.push(eid);
            }
            sub_indptr.push(sub_indices.len() as i64);
        }
        flow_offsets.push(sub_indices.len() as i64);
        first += src_size;
    }
    (sub_indptr, sub_indices, flow_offsets, edge_mapping)
}

/// Sample one NodeFlow by layer-wise uniform expansion.
///
/// `layer_sizes[i]` is the with-replacement draw count for layer `i`
/// (outermost first); actual layer sizes after deduplication may be
/// smaller. As with the neighbor sampler, `neigh_type` selects the CSR the
/// expansion reads and the principal view of the resulting graph.
pub fn layer_uniform_sample(
    graph: &Graph,
    seeds: &[i64],
    neigh_type: NeighborType,
    layer_sizes: &[i64],
    rng: &mut RandomEngine,
) -> Result<NodeFlow> {
    if graph.width() != BitWidth::W64 {
        return Err(SampleError::UnsupportedWidth);
    }
    if let Some(&bad) = seeds
        .iter()
        .find(|&&s| s < 0 || s >= graph.num_vertices())
    {
        return Err(SampleError::InvalidArgument(format!(
            "seed {bad} outside vertex range 0..{}",
            graph.num_vertices()
        )));
    }
    if layer_sizes.iter().any(|&s| s <= 0) {
        return Err(SampleError::InvalidArgument(
            "layer sizes must be positive".into(),
        ));
    }
    let csr = graph.csr(neigh_type);
    let indptr = csr.indptr.as_slice();
    let indices = csr.indices.as_slice();
    let eids = csr.edge_ids.as_slice();

    let (layer_offsets, node_mapping, actual_sizes, _probabilities) =
        construct_layers(indptr, indices, seeds, layer_sizes, rng);
    let (sub_indptr, sub_indices, flow_offsets, edge_mapping) =
        construct_flows(indptr, indices, eids, &node_mapping, &actual_sizes);

    assert!(!sub_indptr.is_empty());
    assert_eq!(sub_indptr[0], 0);
    assert_eq!(*sub_indptr.last().unwrap() as usize, sub_indices.len());
    assert_eq!(sub_indptr.len(), node_mapping.len() + 1);

    let num_nodes = node_mapping.len() as i64;
    let num_edges = sub_indices.len() as i64;
    let csr = CsrMatrix {
        num_rows: num_nodes,
        num_cols: num_nodes,
        indptr: IdArray::from_vec(sub_indptr),
        indices: IdArray::from_vec(sub_indices),
        edge_ids: IdArray::range(0, num_edges),
    };
    let subgraph = match neigh_type {
        NeighborType::In => Graph::from_in_csr(csr),
        NeighborType::Out => Graph::from_out_csr(csr),
    };
    Ok(NodeFlow {
        graph: subgraph,
        node_mapping: IdArray::from_vec(node_mapping),
        edge_mapping: IdArray::from_vec(edge_mapping),
        layer_offsets: IdArray::from_vec(layer_offsets),
        flow_offsets: IdArray::from_vec(flow_offsets),
    })
}

/// Layer-wise sampling over parallel seed mini-batches; the layer-sampling
/// counterpart of [`crate::neighbor_sampling`].
pub fn layer_sampling(
    graph: &Graph,
    seeds: &IdArray,
    batch_start_id: i64,
    batch_size: i64,
    max_workers: i64,
    layer_sizes: &IdArray,
    neigh_type: NeighborType,
) -> Result<Vec<NodeFlow>> {
    crate::neighbor::check_batch_shape(batch_start_id, batch_size, max_workers)?;
    let num_workers = crate::neighbor::worker_count(
        seeds.len() as i64,
        batch_start_id,
        batch_size,
        max_workers,
    );
    if num_workers <= 0 {
        return Ok(Vec::new());
    }
    graph.build_csr(neigh_type);
    debug!(num_workers, num_seeds = seeds.len(), "layer sampling");
    (0..num_workers)
        .into_par_iter()
        .map(|i| {
            let batch = crate::neighbor::worker_seeds(seeds, batch_start_id, batch_size, i);
            RandomEngine::with_thread_local(|rng| {
                layer_uniform_sample(graph, batch, neigh_type, layer_sizes.as_slice(), rng)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> Graph {
        // 0 -> 1 -> 2 -> 3 -> 4
        Graph::from_coo(
            5,
            IdArray::from_vec(vec![0, 1, 2, 3]),
            IdArray::from_vec(vec![1, 2, 3, 4]),
        )
        .unwrap()
    }

    #[test]
    fn test_line_graph_backward_layers() {
        let g = line_graph();
        let mut rng = RandomEngine::new(42);
        let nf = layer_uniform_sample(&g, &[4], NeighborType::In, &[2, 2], &mut rng).unwrap();
        // Every candidate set has exactly one element, so dedup collapses
        // each layer to a single node.
        assert_eq!(nf.node_mapping.to_vec(), vec![2, 3, 4]);
        assert_eq!(nf.layer_offsets.to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(nf.flow_offsets.to_vec(), vec![0, 1, 2]);
        assert_eq!(nf.edge_mapping.to_vec(), vec![2, 3]);
        let csr = nf.graph.in_csr();
        assert_eq!(csr.indptr.to_vec(), vec![0, 0, 1, 2]);
        assert_eq!(csr.indices.to_vec(), vec![0, 1]);
        assert_eq!(csr.edge_ids.to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_flow_edges_point_into_previous_layer() {
        // Diamond: 0 -> {1, 2} -> 3.
        let g = Graph::from_coo(
            4,
            IdArray::from_vec(vec![0, 0, 1, 2]),
            IdArray::from_vec(vec![1, 2, 3, 3]),
        )
        .unwrap();
        let mut rng = RandomEngine::new(7);
        let nf = layer_uniform_sample(&g, &[3], NeighborType::In, &[4, 4], &mut rng).unwrap();
        let num_layers = nf.num_layers();
        assert_eq!(num_layers, 3);
        // Seeds come last.
        assert_eq!(nf.layer_vertices(num_layers - 1), &[3]);
        let csr = nf.graph.in_csr();
        for l in 1..num_layers {
            let prev = nf.layer_range(l - 1);
            for v in nf.layer_range(l) {
                for k in csr.row_range(v) {
                    let col = csr.indices.get(k) as usize;
                    assert!(prev.contains(&col), "edge target outside previous layer");
                }
            }
        }
        // Shape invariants.
        assert_eq!(
            nf.layer_offsets.get(num_layers) as usize,
            nf.num_nodes()
        );
        assert_eq!(
            nf.flow_offsets.get(num_layers - 1) as usize,
            nf.num_edges()
        );
    }

    #[test]
    fn test_importance_weights_sum_per_layer() {
        // Star into 0: every spoke points at the hub.
        let g = Graph::from_coo(
            5,
            IdArray::from_vec(vec![1, 2, 3, 4]),
            IdArray::from_vec(vec![0, 0, 0, 0]),
        )
        .unwrap();
        let mut rng = RandomEngine::new(3);
        let csr = g.csr(NeighborType::In);
        let (_, mapping, sizes, probs) = construct_layers(
            csr.indptr.as_slice(),
            csr.indices.as_slice(),
            &[0],
            &[8],
            &mut rng,
        );
        // One layer of draws over 4 candidates: multiplicities sum to the
        // draw count, so the weights sum to |candidates|.
        assert_eq!(*sizes.last().unwrap(), 1);
        let layer_nodes = sizes[0] as usize;
        let layer_weight: f32 = probs[..layer_nodes].iter().sum();
        assert!((layer_weight - 4.0).abs() < 1e-6);
        assert_eq!(mapping.len(), probs.len());
    }

    #[test]
    fn test_dead_end_frontier_yields_empty_layer() {
        let g = line_graph();
        let mut rng = RandomEngine::new(9);
        // Seed 0 has no in-neighbors at all.
        let nf = layer_uniform_sample(&g, &[0], NeighborType::In, &[2], &mut rng).unwrap();
        assert_eq!(nf.node_mapping.to_vec(), vec![0]);
        assert_eq!(nf.layer_offsets.to_vec(), vec![0, 0, 1]);
        assert_eq!(nf.num_edges(), 0);
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let g = Graph::from_coo(
            6,
            IdArray::from_vec(vec![0, 0, 1, 2, 3, 4]),
            IdArray::from_vec(vec![1, 2, 3, 3, 4, 5]),
        )
        .unwrap();
        let sample = || {
            let mut rng = RandomEngine::new(555);
            layer_uniform_sample(&g, &[5], NeighborType::In, &[3, 3], &mut rng).unwrap()
        };
        let a = sample();
        let b = sample();
        assert_eq!(a.node_mapping, b.node_mapping);
        assert_eq!(a.edge_mapping, b.edge_mapping);
        assert_eq!(a.layer_offsets, b.layer_offsets);
        assert_eq!(a.flow_offsets, b.flow_offsets);
    }

    #[test]
    fn test_driver_batches() {
        let g = line_graph();
        let flows = layer_sampling(
            &g,
            &IdArray::from_vec(vec![3, 4]),
            0,
            1,
            4,
            &IdArray::from_vec(vec![2, 2]),
            NeighborType::In,
        )
        .unwrap();
        assert_eq!(flows.len(), 2);
        for nf in &flows {
            assert_eq!(nf.num_layers(), 3);
        }
    }

    #[test]
    fn test_rejects_nonpositive_layer_size() {
        let g = line_graph();
        let mut rng = RandomEngine::new(1);
        assert!(
            layer_uniform_sample(&g, &[4], NeighborType::In, &[0], &mut rng).is_err()
        );
    }
}
