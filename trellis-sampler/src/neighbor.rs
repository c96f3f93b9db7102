//! Neighbor sampling: per-seed fan-out over multiple hops.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use trellis_core::{BitWidth, Graph, IdArray, NeighborType};

use crate::error::{Result, SampleError};
use crate::nodeflow::{construct_node_flow, NeighborInfo, NodeFlow};
use crate::rng::RandomEngine;
use crate::sample::{pick_uniform, pick_weighted};

/// Expand a BFS frontier from `seeds`, sampling at most `num_neighbor`
/// neighbors per node and hop, and pack the trace into a NodeFlow.
///
/// `num_hops` here counts *layers* (seeds included); the public entry point
/// adds one to the caller's hop count. Per-layer deduplication is scoped to
/// the layer: a vertex may reappear across layers but is expanded once per
/// layer.
fn sample_subgraph<F: Copy + Into<f64>>(
    graph: &Graph,
    seeds: &[i64],
    probability: Option<&[F]>,
    edge_type: NeighborType,
    num_hops: usize,
    num_neighbor: usize,
    add_self_loop: bool,
    rng: &mut RandomEngine,
) -> NodeFlow {
    let csr = graph.csr(edge_type);
    let indptr = csr.indptr.as_slice();
    let col_list = csr.indices.as_slice();
    let val_list = csr.edge_ids.as_slice();

    // The per-layer dedup set; sub_vers doubles as the BFS queue and the
    // final (vertex, layer) collection.
    let mut sub_ver_map: HashSet<i64> = HashSet::new();
    let mut sub_vers: Vec<(i64, usize)> = Vec::with_capacity(seeds.len() * 10);
    for &seed in seeds {
        if sub_ver_map.insert(seed) {
            sub_vers.push((seed, 0));
        }
    }

    let mut tmp_src: Vec<i64> = Vec::new();
    let mut tmp_eid: Vec<i64> = Vec::new();
    let mut neigh_pos: Vec<NeighborInfo> = Vec::with_capacity(seeds.len());
    let mut neighbor_list: Vec<i64> = Vec::new();
    let mut edge_list: Vec<i64> = Vec::new();
    let mut layer_offsets = vec![0usize; num_hops + 1];
    let mut num_edges = 0usize;

    layer_offsets[1] = sub_vers.len();
    for layer_id in 1..num_hops {
        sub_ver_map.clear();
        for idx in layer_offsets[layer_id - 1]..layer_offsets[layer_id] {
            let (dst_id, cur_level) = sub_vers[idx];
            let begin = indptr[dst_id as usize] as usize;
            let end = indptr[dst_id as usize + 1] as usize;
            tmp_src.clear();
            tmp_eid.clear();
            match probability {
                None => pick_uniform(
                    &val_list[begin..end],
                    &col_list[begin..end],
                    num_neighbor,
                    &mut tmp_src,
                    &mut tmp_eid,
                    rng,
                ),
                Some(prob) => pick_weighted(
                    prob,
                    &val_list[begin..end],
                    &col_list[begin..end],
                    num_neighbor,
                    &mut tmp_src,
                    &mut tmp_eid,
                    rng,
                ),
            }
            if add_self_loop && !tmp_src.contains(&dst_id) {
                tmp_src.push(dst_id);
                // Reuse the graph's own self-loop edge when one exists;
                // otherwise mark the added edge with the -1 sentinel.
                let slot = col_list[begin..end].iter().position(|&v| v == dst_id);
                tmp_eid.push(match slot {
                    Some(k) => val_list[begin + k],
                    None => -1,
                });
            }
            debug_assert_eq!(tmp_src.len(), tmp_eid.len());
            neigh_pos.push(NeighborInfo {
                id: dst_id,
                pos: neighbor_list.len(),
                num_edges: tmp_src.len(),
            });
            neighbor_list.extend_from_slice(&tmp_src);
            edge_list.extend_from_slice(&tmp_eid);
            num_edges += tmp_src.len();
            for &neigh in &tmp_src {
                // First sighting within this layer goes on the queue.
                if sub_ver_map.insert(neigh) {
                    sub_vers.push((neigh, cur_level + 1));
                }
            }
        }
        layer_offsets[layer_id + 1] = layer_offsets[layer_id] + sub_ver_map.len();
        debug_assert_eq!(layer_offsets[layer_id + 1], sub_vers.len());
    }

    construct_node_flow(
        &neighbor_list,
        &edge_list,
        &layer_offsets,
        &mut sub_vers,
        &mut neigh_pos,
        edge_type,
        num_edges,
        num_hops,
    )
}

fn check_sampler_input<F>(graph: &Graph, seeds: &[i64], probability: Option<&[F]>) -> Result<()> {
    if graph.width() != BitWidth::W64 {
        return Err(SampleError::UnsupportedWidth);
    }
    if let Some(prob) = probability {
        if prob.len() != graph.num_edges() {
            return Err(SampleError::ProbabilityLength {
                got: prob.len(),
                expected: graph.num_edges(),
            });
        }
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
    Ok(())
}

/// Sample one NodeFlow from `seeds` with `num_hops` hops of fan-out
/// `expand_factor`.
///
/// `probability` of `None` samples uniformly; otherwise it must hold one
/// weight per edge of the input graph, indexed by edge id. With
/// `edge_type = In` the expansion follows predecessors and the NodeFlow's
/// principal view is the reverse CSR; with `Out`, successors and the
/// forward CSR.
pub fn neighbor_sample<F: Copy + Into<f64>>(
    graph: &Graph,
    seeds: &[i64],
    edge_type: NeighborType,
    num_hops: usize,
    expand_factor: usize,
    add_self_loop: bool,
    probability: Option<&[F]>,
    rng: &mut RandomEngine,
) -> Result<NodeFlow> {
    check_sampler_input(graph, seeds, probability)?;
    Ok(sample_subgraph(
        graph,
        seeds,
        probability,
        edge_type,
        num_hops + 1,
        expand_factor,
        add_self_loop,
        rng,
    ))
}

/// Number of workers for a driver invocation; zero or negative means there
/// is nothing left to sample.
pub(crate) fn worker_count(
    num_seeds: i64,
    batch_start_id: i64,
    batch_size: i64,
    max_workers: i64,
) -> i64 {
    let num_batches = (num_seeds + batch_size - 1) / batch_size;
    max_workers.min(num_batches - batch_start_id)
}

pub(crate) fn check_batch_shape(
    batch_start_id: i64,
    batch_size: i64,
    max_workers: i64,
) -> Result<()> {
    if batch_start_id < 0 || batch_size <= 0 || max_workers <= 0 {
        return Err(SampleError::InvalidArgument(format!(
            "batch shape: start {batch_start_id}, size {batch_size}, workers {max_workers}"
        )));
    }
    Ok(())
}

/// Per-worker slice of the seed array for worker `i`.
pub(crate) fn worker_seeds(
    seeds: &IdArray,
    batch_start_id: i64,
    batch_size: i64,
    i: i64,
) -> &[i64] {
    let start = ((batch_start_id + i) * batch_size) as usize;
    let end = (((batch_start_id + i + 1) * batch_size) as usize).min(seeds.len());
    &seeds.as_slice()[start..end]
}

/// Neighbor sampling over parallel seed mini-batches.
///
/// Worker `i` samples the seed slice
/// `[(batch_start_id + i) * batch_size, …)` with its own thread-local
/// random stream; one NodeFlow is produced per worker. An empty
/// `probability` means uniform sampling. The required CSR view is
/// materialized before the parallel region starts, so workers only read.
pub fn neighbor_sampling<F: Copy + Into<f64> + Sync>(
    graph: &Graph,
    seeds: &IdArray,
    batch_start_id: i64,
    batch_size: i64,
    max_workers: i64,
    expand_factor: usize,
    num_hops: usize,
    neigh_type: NeighborType,
    add_self_loop: bool,
    probability: &[F],
) -> Result<Vec<NodeFlow>> {
    check_batch_shape(batch_start_id, batch_size, max_workers)?;
    let prob = (!probability.is_empty()).then_some(probability);
    check_sampler_input(graph, seeds.as_slice(), prob)?;
    let num_workers = worker_count(seeds.len() as i64, batch_start_id, batch_size, max_workers);
    if num_workers <= 0 {
        return Ok(Vec::new());
    }
    graph.build_csr(neigh_type);
    debug!(num_workers, num_seeds = seeds.len(), "neighbor sampling");
    (0..num_workers)
        .into_par_iter()
        .map(|i| {
            let batch = worker_seeds(seeds, batch_start_id, batch_size, i);
            RandomEngine::with_thread_local(|rng| {
                Ok(sample_subgraph(
                    graph,
                    batch,
                    prob,
                    neigh_type,
                    num_hops + 1,
                    expand_factor,
                    add_self_loop,
                    rng,
                ))
            })
        })
        .collect()
}

/// [`neighbor_sampling`] without a probability vector.
pub fn uniform_sampling(
    graph: &Graph,
    seeds: &IdArray,
    batch_start_id: i64,
    batch_size: i64,
    max_workers: i64,
    expand_factor: usize,
    num_hops: usize,
    neigh_type: NeighborType,
    add_self_loop: bool,
) -> Result<Vec<NodeFlow>> {
    neighbor_sampling::<f32>(
        graph,
        seeds,
        batch_start_id,
        batch_size,
        max_workers,
        expand_factor,
        num_hops,
        neigh_type,
        add_self_loop,
        &[],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::IdArray;

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
    fn test_line_graph_two_hops() {
        let g = line_graph();
        let mut rng = RandomEngine::new(42);
        let nf = neighbor_sample::<f32>(
            &g,
            &[0],
            NeighborType::Out,
            2,
            2,
            false,
            None,
            &mut rng,
        )
        .unwrap();
        assert_eq!(nf.num_layers(), 3);
        assert_eq!(nf.layer_offsets.to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(nf.node_mapping.to_vec(), vec![2, 1, 0]);
        assert_eq!(nf.num_edges(), 2);
        assert_eq!(nf.edge_mapping.to_vec(), vec![1, 0]);
        assert_eq!(nf.flow_offsets.to_vec(), vec![0, 1, 2]);
        let csr = nf.graph.out_csr();
        assert_eq!(csr.indptr.to_vec(), vec![0, 0, 1, 2]);
        assert_eq!(csr.indices.to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_in_direction_walks_backwards() {
        let g = line_graph();
        let mut rng = RandomEngine::new(42);
        let nf = neighbor_sample::<f32>(
            &g,
            &[4],
            NeighborType::In,
            2,
            2,
            false,
            None,
            &mut rng,
        )
        .unwrap();
        assert_eq!(nf.node_mapping.to_vec(), vec![2, 3, 4]);
        assert_eq!(nf.edge_mapping.to_vec(), vec![2, 3]);
        // The principal view is the reverse CSR.
        let csr = nf.graph.in_csr();
        assert_eq!(csr.indptr.to_vec(), vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(10, 0, 3, 8), 4);
        assert_eq!(worker_count(10, 2, 3, 8), 2);
        assert_eq!(worker_count(10, 0, 3, 2), 2);
        assert_eq!(worker_count(10, 4, 3, 8), 0);
    }

    #[test]
    fn test_driver_splits_batches() {
        let g = line_graph();
        let flows = uniform_sampling(
            &g,
            &IdArray::from_vec(vec![0, 1, 2, 3, 4]),
            0,
            2,
            8,
            1,
            1,
            NeighborType::Out,
            false,
        )
        .unwrap();
        assert_eq!(flows.len(), 3);
        // The seed layer is the last one; worker 0 saw [0, 1], worker 2 [4].
        assert_eq!(flows[0].layer_vertices(1), &[0, 1]);
        assert_eq!(flows[2].layer_vertices(1), &[4]);
    }

    #[test]
    fn test_rejects_bad_probability_length() {
        let g = line_graph();
        let err = neighbor_sampling(
            &g,
            &IdArray::from_vec(vec![0]),
            0,
            1,
            1,
            1,
            1,
            NeighborType::Out,
            false,
            &[0.5f32; 3],
        )
        .unwrap_err();
        assert!(matches!(err, SampleError::ProbabilityLength { got: 3, expected: 4 }));
    }

    #[test]
    fn test_rejects_narrow_graph() {
        let g = Graph::from_coo(2, IdArray::from_i32(vec![0]), IdArray::from_i32(vec![1]))
            .unwrap();
        let mut rng = RandomEngine::new(1);
        let err =
            neighbor_sample::<f32>(&g, &[0], NeighborType::Out, 1, 1, false, None, &mut rng)
                .unwrap_err();
        assert!(matches!(err, SampleError::UnsupportedWidth));
    }

    #[test]
    fn test_rejects_out_of_range_seed() {
        let g = line_graph();
        let mut rng = RandomEngine::new(1);
        let err =
            neighbor_sample::<f32>(&g, &[9], NeighborType::Out, 1, 1, false, None, &mut rng)
                .unwrap_err();
        assert!(matches!(err, SampleError::InvalidArgument(_)));
    }

    #[test]
    fn test_self_loop_sentinel() {
        let g = line_graph();
        let mut rng = RandomEngine::new(42);
        let nf = neighbor_sample::<f32>(
            &g,
            &[0],
            NeighborType::Out,
            1,
            2,
            true,
            None,
            &mut rng,
        )
        .unwrap();
        // Seed 0 samples its successor 1 plus an added self-loop; the line
        // graph has no (0, 0) edge, so the loop maps to -1.
        assert_eq!(nf.num_edges(), 2);
        assert_eq!(nf.edge_mapping.iter().filter(|&e| e == -1).count(), 1);
        // The loop edge connects the seed row to the previous layer's copy
        // of the same parent vertex.
        let seed_dense = nf.layer_offsets.get(nf.num_layers() - 1) as usize;
        let csr = nf.graph.out_csr();
        let row = csr.row_range(seed_dense);
        let cols = &csr.indices.as_slice()[row.clone()];
        let eids = &nf.edge_mapping.as_slice()[row];
        let loop_slots: Vec<_> = cols
            .iter()
            .zip(eids.iter())
            .filter(|(&c, _)| nf.node_mapping.get(c as usize) == 0)
            .collect();
        assert_eq!(loop_slots.len(), 1);
        assert_eq!(*loop_slots[0].1, -1);
    }

    #[test]
    fn test_existing_self_loop_keeps_its_edge_id() {
        // 0 -> 0 (e0), 0 -> 1 (e1)
        let g = Graph::from_coo(
            2,
            IdArray::from_vec(vec![0, 0]),
            IdArray::from_vec(vec![0, 1]),
        )
        .unwrap();
        let mut rng = RandomEngine::new(42);
        let nf = neighbor_sample::<f32>(
            &g,
            &[0],
            NeighborType::Out,
            1,
            5,
            true,
            None,
            &mut rng,
        )
        .unwrap();
        // Fan-out covers both edges, the loop is already sampled, nothing
        // is added and no sentinel appears.
        assert_eq!(nf.num_edges(), 2);
        assert!(nf.edge_mapping.iter().all(|e| e >= 0));
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let g = line_graph();
        let sample = |seed: u64| {
            let mut rng = RandomEngine::new(seed);
            neighbor_sample::<f32>(
                &g,
                &[0, 2],
                NeighborType::Out,
                2,
                1,
                false,
                None,
                &mut rng,
            )
            .unwrap()
        };
        let a = sample(1234);
        let b = sample(1234);
        assert_eq!(a.node_mapping, b.node_mapping);
        assert_eq!(a.edge_mapping, b.edge_mapping);
        assert_eq!(a.layer_offsets, b.layer_offsets);
        assert_eq!(a.flow_offsets, b.flow_offsets);
        assert_eq!(a.graph.out_csr().as_ref(), b.graph.out_csr().as_ref());
    }

    #[test]
    fn test_weighted_bias_on_star_graph() {
        // 0 -> {1..=5}; edge to 5 carries half of the total mass.
        let g = Graph::from_coo(
            6,
            IdArray::from_vec(vec![0, 0, 0, 0, 0]),
            IdArray::from_vec(vec![1, 2, 3, 4, 5]),
        )
        .unwrap();
        let probability = [0.125f32, 0.125, 0.125, 0.125, 0.5];
        let mut rng = RandomEngine::new(4242);
        let trials = 20_000;
        let mut hits = 0usize;
        for _ in 0..trials {
            let nf = neighbor_sample(
                &g,
                &[0],
                NeighborType::Out,
                1,
                1,
                false,
                Some(&probability[..]),
                &mut rng,
            )
            .unwrap();
            // The single sampled neighbor is the only node of layer 0.
            if nf.layer_vertices(0) == &[5] {
                hits += 1;
            }
        }
        let freq = hits as f64 / trials as f64;
        assert!(
            (freq - 0.5).abs() < 0.02,
            "neighbor 5 frequency {freq} too far from 0.5"
        );
    }
}
