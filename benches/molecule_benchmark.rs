/*
 * Molecule Benchmark
 *
 * Measures the per-tick hot paths: pair linking (pairwise scan against the
 * spatial grid) and the motion update, over a range of molecule counts.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use molecules::linker::{link_brute_force, ProximityLinker};
use molecules::physics::update_molecules;
use molecules::{ParticleStore, PointerState, Viewport};

const VIEWPORT: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

fn populated(count: usize) -> ParticleStore {
    let mut rng = StdRng::seed_from_u64(1);
    let mut store = ParticleStore::new();
    store.rebuild(&mut rng, count, VIEWPORT, 1.2);
    store
}

// Pairwise scan vs. spatial grid
fn bench_linking(c: &mut Criterion) {
    let mut group = c.benchmark_group("linking");

    for count in [50, 150, 300, 500].iter() {
        let store = populated(*count);

        group.bench_with_input(BenchmarkId::new("pairwise", count), count, |b, _| {
            let mut out = Vec::new();
            b.iter(|| {
                link_brute_force(black_box(store.molecules()), 120.0, 0.5, &mut out);
                black_box(out.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("grid", count), count, |b, _| {
            let mut linker = ProximityLinker::new(0);
            let mut out = Vec::new();
            b.iter(|| {
                linker.link(black_box(store.molecules()), 120.0, 0.5, VIEWPORT, &mut out);
                black_box(out.len());
            });
        });
    }

    group.finish();
}

// One motion update with the pointer in the middle of the screen
fn bench_motion(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion");

    for count in [50, 150, 300, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &n| {
            let mut store = populated(n);
            let mut rng = StdRng::seed_from_u64(2);
            let mut pointer = PointerState::new(80.0);
            pointer.move_to(960.0, 540.0);

            b.iter(|| {
                update_molecules(&mut store, &pointer, 150.0, VIEWPORT, &mut rng);
                black_box(store.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_linking, bench_motion);
criterion_main!(benches);
