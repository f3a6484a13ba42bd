//! Benchmarks for the round-trip projection and cPLV stage.
//!
//! Run:
//! - cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fidelity_weighting::core::cplv::compute_cplv;
use fidelity_weighting::core::generator::generate;
use fidelity_weighting::core::identity::SourceIdentities;
use fidelity_weighting::core::phase::to_unit_phase_inplace;
use fidelity_weighting::core::projector::expand_and_project;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;

const N_SENSORS: usize = 64;
const N_SAMPLES: usize = 2_000;
const SOURCE_COUNTS: [usize; 3] = [128, 512, 2048];
const SOURCES_PER_PARCEL: usize = 16;

fn build_case(n_sources: usize) -> (SourceIdentities, Array2<f64>, Array2<f64>) {
    let ids: Vec<i32> = (0..n_sources)
        .map(|i| {
            if i % 31 == 30 {
                -1
            } else {
                (i / SOURCES_PER_PARCEL) as i32
            }
        })
        .collect();
    let ids = SourceIdentities::new(ids).unwrap();
    let fwd = Array2::from_shape_fn((N_SENSORS, n_sources), |(s, j)| {
        ((s * 13 + j * 7) % 17) as f64 / 17.0 - 0.5
    });
    let inv = Array2::from_shape_fn((n_sources, N_SENSORS), |(j, s)| {
        ((s * 5 + j * 11) % 19) as f64 / 19.0 - 0.5
    });
    (ids, fwd, inv)
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip_cplv");
    group.sample_size(10);

    for &n_sources in &SOURCE_COUNTS {
        let (ids, fwd, inv) = build_case(n_sources);
        let mut rng = StdRng::seed_from_u64(0);
        let parcels = generate(&mut rng, ids.n_parcels(), N_SAMPLES, 20, 5.0);
        let mut parcel_phase = parcels.clone();
        to_unit_phase_inplace(&mut parcel_phase);

        let id = BenchmarkId::new("sources", n_sources);
        group.bench_with_input(id, &parcels, |b, parcels| {
            b.iter(|| {
                let mut rt =
                    expand_and_project(parcels.view(), &ids, fwd.view(), inv.view()).unwrap();
                to_unit_phase_inplace(&mut rt);
                black_box(compute_cplv(parcel_phase.view(), rt.view(), &ids).unwrap());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_round_trip);
criterion_main!(benches);
