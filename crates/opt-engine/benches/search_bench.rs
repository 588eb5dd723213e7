//! Benchmarks for the permutation search loop.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use curve_core::{Point, PointSet};
use opt_engine::{OptimalIndexSearch, SearchConfig};
use rand::Rng;

/// Clustered points: `clusters` tight groups in `dims` dimensions.
fn clustered_points(clusters: usize, per_cluster: usize, dims: usize) -> Arc<PointSet> {
    let mut rng = rand::thread_rng();
    let mut points = Vec::with_capacity(clusters * per_cluster);
    for _ in 0..clusters {
        let center: Vec<i64> = (0..dims).map(|_| rng.gen_range(50..=973)).collect();
        for _ in 0..per_cluster {
            let coords = center
                .iter()
                .map(|&c| (c + rng.gen_range(-5..=5)).clamp(0, 1023) as u32)
                .collect();
            points.push(Point::new(coords));
        }
    }
    Arc::new(PointSet::new(points, 10).unwrap())
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for (clusters, per_cluster, dims) in [(8, 100, 16), (16, 100, 50)] {
        let points = clustered_points(clusters, per_cluster, dims);
        let config = SearchConfig {
            max_iterations: 2,
            outlier_size: 5,
            seed: 7,
            ..Default::default()
        };
        group.bench_function(format!("{clusters}x{per_cluster}x{dims}d"), |b| {
            b.iter(|| {
                let search = OptimalIndexSearch::new(config.clone());
                let best = search.search(Arc::clone(&points)).unwrap();
                black_box(best.estimated_cluster_count())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
