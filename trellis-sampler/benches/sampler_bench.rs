use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_core::{Graph, IdArray, NeighborType};
use trellis_sampler::{layer_uniform_sample, neighbor_sample, RandomEngine};

/// A graph where vertex i points at the next `deg` vertices on a ring.
fn banded_ring(n: i64, deg: i64) -> Graph {
    let mut row = Vec::with_capacity((n * deg) as usize);
    let mut col = Vec::with_capacity((n * deg) as usize);
    for i in 0..n {
        for d in 1..=deg {
            row.push(i);
            col.push((i + d) % n);
        }
    }
    Graph::from_coo(n, IdArray::from_vec(row), IdArray::from_vec(col)).unwrap()
}

fn bench_neighbor_sampler(c: &mut Criterion) {
    let g = banded_ring(10_000, 16);
    g.build_csr(NeighborType::Out);
    let seeds: Vec<i64> = (0..512).collect();
    c.bench_function("neighbor_sample_2hop_fanout4", |b| {
        let mut rng = RandomEngine::new(42);
        b.iter(|| {
            neighbor_sample::<f32>(
                black_box(&g),
                black_box(&seeds),
                NeighborType::Out,
                2,
                4,
                false,
                None,
                &mut rng,
            )
            .unwrap()
        })
    });
}

fn bench_layer_sampler(c: &mut Criterion) {
    let g = banded_ring(10_000, 16);
    g.build_csr(NeighborType::In);
    let seeds: Vec<i64> = (0..512).collect();
    c.bench_function("layer_sample_sizes_256_256", |b| {
        let mut rng = RandomEngine::new(42);
        b.iter(|| {
            layer_uniform_sample(
                black_box(&g),
                black_box(&seeds),
                NeighborType::In,
                &[256, 256],
                &mut rng,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_neighbor_sampler, bench_layer_sampler);
criterion_main!(benches);
