use criterion::{Criterion, criterion_group, criterion_main};
use mso_core::candidate::PowerSetIter;
use mso_core::ids::VertexId;

fn power_set_walk(n: usize) -> usize {
    let vertices: Vec<VertexId> = (0..n).map(|_| VertexId::new()).collect();
    PowerSetIter::new(vertices).count()
}

fn bench_power_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("power-set");
    for n in [4usize, 8, 12, 16] {
        group.bench_function(format!("walk-{n}"), |b| b.iter(|| power_set_walk(n)));
    }
    group.finish();
}

criterion_group!(benches, bench_power_set);
criterion_main!(benches);
