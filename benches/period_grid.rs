use criterion::Criterion;
use light_curve_pbls::{
    Jenkins2010PeriodGrid, Ofir2014PeriodGrid, PeriodGrid, PeriodGridTrait, UniformFreqPeriodGrid,
};
use std::hint::black_box;

pub fn bench_period_grid(c: &mut Criterion) {
    let grids: [PeriodGrid<f64>; 3] = [
        UniformFreqPeriodGrid::new(1400.0, 0.02).into(),
        Ofir2014PeriodGrid::new(1400.0).into(),
        Jenkins2010PeriodGrid::new(3.0, 1400.0, 2.0, 50.0).into(),
    ];
    for grid in grids {
        c.bench_function(format!("Period grid: {grid:?}").as_str(), |b| {
            b.iter(|| black_box(&grid).periods())
        });
    }
}
