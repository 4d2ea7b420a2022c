use criterion::Criterion;
use light_curve_pbls::{Pbls, SearchBackend, SearchConfig, TimeSeries};
use light_curve_pbls_test_util::{BoxTransit, Rotation, SyntheticLightCurve};
use std::hint::black_box;

pub fn bench_search(c: &mut Criterion) {
    let lc = SyntheticLightCurve::uniform(4000, 0.01)
        .with_rotation(Rotation {
            period: 3.8,
            amplitude: 0.01,
            second_amplitude: 0.003,
            second_phase: 0.0,
        })
        .with_transit(BoxTransit {
            period: 2.0,
            duration_hr: 2.16,
            epoch: 0.4,
            depth: 0.02,
        })
        .with_noise(1e-4, 0);
    let (t, flux) = lc.arrays();
    let ts = TimeSeries::try_new(&t, &flux).unwrap();
    let periods: Vec<_> = (0..20).map(|i| 1.9 + 0.01 * i as f64).collect();

    for (name, backend) in [
        ("sequential", SearchBackend::sequential()),
        ("parallel", SearchBackend::parallel(None)),
    ] {
        for poly_order in [2, 3] {
            let pbls = Pbls::new(
                SearchConfig::default()
                    .with_durations_hr(vec![1.0, 2.0, 3.0])
                    .with_poly_order(poly_order)
                    .with_backend(backend.clone()),
            )
            .unwrap();
            c.bench_function(
                format!("PBLS search: 4000 points, 20 periods, order {poly_order}, {name}")
                    .as_str(),
                |b| b.iter(|| pbls.search(black_box(&ts), black_box(&periods))),
            );
        }
    }
}
