use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_core::sparse::{coo_to_csr, csr_transpose, CooMatrix};
use trellis_core::{Bipartite, IdArray};

fn ring_coo(n: i64) -> CooMatrix {
    CooMatrix {
        num_rows: n,
        num_cols: n,
        row: IdArray::from_vec((0..n).collect()),
        col: IdArray::from_vec((0..n).map(|i| (i + 1) % n).collect()),
    }
}

fn bench_view_conversions(c: &mut Criterion) {
    let coo = ring_coo(100_000);
    c.bench_function("coo_to_csr_100k", |b| {
        b.iter(|| coo_to_csr(black_box(&coo), true))
    });

    let csr = coo_to_csr(&coo, true);
    c.bench_function("csr_transpose_100k", |b| {
        b.iter(|| csr_transpose(black_box(&csr)))
    });
}

fn bench_lazy_materialization(c: &mut Criterion) {
    let coo = ring_coo(100_000);
    c.bench_function("bipartite_in_csr_from_coo_100k", |b| {
        b.iter(|| {
            let g = Bipartite::from_coo(
                coo.num_rows,
                coo.num_cols,
                coo.row.clone(),
                coo.col.clone(),
            )
            .unwrap();
            let _ = black_box(g.in_csr());
        })
    });
}

criterion_group!(benches, bench_view_conversions, bench_lazy_materialization);
criterion_main!(benches);
