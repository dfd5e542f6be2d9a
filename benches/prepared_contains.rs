mod utils;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use geom_index::construction::{point, polygon};
use geom_index::{Engine, HasBounds};
use utils::{get_random_points, star_ring};

pub fn prepared_contains_benchmark(c: &mut Criterion) {
    let engine = Engine::default_engine().unwrap();
    let mut group = c.benchmark_group("prepared_contains");

    for size in [100, 1000, 10_000].iter() {
        let ring = star_ring(*size, 342);
        let shell = polygon(&engine, &ring).unwrap().into_shared();
        let prepared = engine.prepare(&shell).unwrap();
        let points: Vec<_> = get_random_points(shell.bounds(), 1000, 343)
            .into_iter()
            .map(|p| point(&engine, p.x, p.y).unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::new("prepared", size), size, |b, _| {
            b.iter(|| {
                for pt in &points {
                    black_box(prepared.contains(&engine, pt));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("direct", size), size, |b, _| {
            b.iter(|| {
                for pt in &points {
                    black_box(engine.contains(&shell, pt));
                }
            })
        });

        let rstar = utils::other_impls::build_rstar_ring(&ring);
        let raw_points = get_random_points(shell.bounds(), 1000, 343);
        group.bench_with_input(BenchmarkId::new("rstar_winding", size), size, |b, _| {
            b.iter(|| {
                for &pt in &raw_points {
                    black_box(utils::other_impls::point_in_polygon_rstar(pt, &rstar));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, prepared_contains_benchmark);
criterion_main!(benches);
