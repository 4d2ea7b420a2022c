use criterion::{criterion_group, criterion_main};

mod period_grid;
mod search;

criterion_group!(
    benches,
    detrend::bench_polynomial_fit,
    period_grid::bench_period_grid,
    search::bench_search,
);
criterion_main!(benches);
