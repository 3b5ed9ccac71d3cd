//! Clustering and cover search benchmarks.
//!
//! Each family is analysed once during setup; the timed loops cover only
//! the stage under test.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use std::num::NonZeroUsize;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use hasse_benches::{
    error::BenchSetupError,
    params::{CoverBenchParams, PosetBenchParams},
    synthetic::SyntheticConfig,
};
use hasse_core::{
    AverageLinkage, DEFAULT_EPS, DensityClusterer, ExhaustiveSearch, GraphView, HasseBuilder,
    MatrixFamily,
};

/// Seed used for all synthetic data generation in this benchmark.
const SEED: u64 = 7;

/// Order of every generated matrix.
const ORDER: usize = 3;

/// Largest generated cell value.
const MAX_CELL: u32 = 2;

/// Family sizes to benchmark.
const MATRIX_COUNTS: &[usize] = &[32, 128];

/// Coverage fractions for the cover searches.
const FRACTIONS: &[f64] = &[0.5, 0.85];

/// Largest combination the exhaustive search enumerates.
const EXHAUSTIVE_MAX_SIZE: usize = 2;

fn synthetic_family(matrix_count: usize) -> Result<MatrixFamily, BenchSetupError> {
    Ok(SyntheticConfig {
        matrix_count,
        order: ORDER,
        max_cell: MAX_CELL,
        seed: SEED,
    }
    .generate()?)
}

fn graph_distance_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("graph_distance_cluster");
    group.sample_size(10);

    let hasse = HasseBuilder::new().build()?;
    for &matrix_count in MATRIX_COUNTS {
        let family = synthetic_family(matrix_count)?;
        let analysis = hasse.analyze(&family)?;
        let paths = analysis.shortest_paths(GraphView::Directed);
        let params = PosetBenchParams {
            matrix_count,
            order: ORDER,
        };

        group.bench_with_input(
            BenchmarkId::new("shortest_paths", params),
            &analysis,
            |b, analysis| {
                b.iter(|| analysis.shortest_paths(GraphView::Directed));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("merge", params),
            &(&analysis, &paths),
            |b, &(analysis, paths)| {
                b.iter(|| hasse.cluster(analysis, Some(paths)));
            },
        );
    }

    group.finish();
    Ok(())
}

fn cover_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("cover_search");
    group.sample_size(10);

    let hasse = HasseBuilder::new().build()?;
    let search = ExhaustiveSearch::new(EXHAUSTIVE_MAX_SIZE);
    for &matrix_count in MATRIX_COUNTS {
        let family = synthetic_family(matrix_count)?;
        let analysis = hasse.analyze(&family)?;
        for &fraction in FRACTIONS {
            let params = CoverBenchParams {
                matrix_count,
                fraction,
            };
            group.bench_with_input(BenchmarkId::new("greedy", params), &analysis, |b, analysis| {
                b.iter(|| hasse.greedy_cover(analysis, fraction, &[]));
            });
            group.bench_with_input(
                BenchmarkId::new("exhaustive", params),
                &analysis,
                |b, analysis| {
                    b.iter(|| hasse.exhaustive_cover(analysis, fraction, &[], &search));
                },
            );
        }
    }

    group.finish();
    Ok(())
}

fn baseline_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("flat_baselines");
    group.sample_size(10);

    let min_samples = NonZeroUsize::new(2).ok_or(BenchSetupError::ZeroValue {
        context: "min_samples",
    })?;
    let density = DensityClusterer::new(DEFAULT_EPS, min_samples)?;
    let average = AverageLinkage::new();
    for &matrix_count in MATRIX_COUNTS {
        let family = synthetic_family(matrix_count)?;
        let params = PosetBenchParams {
            matrix_count,
            order: ORDER,
        };
        group.bench_with_input(BenchmarkId::new("density", params), &family, |b, family| {
            b.iter(|| density.cluster(family));
        });
        group.bench_with_input(BenchmarkId::new("average", params), &family, |b, family| {
            b.iter(|| average.linkage(family));
        });
    }

    group.finish();
    Ok(())
}

fn graph_distance(c: &mut Criterion) {
    if let Err(err) = graph_distance_impl(c) {
        panic!("graph_distance_cluster benchmark setup failed: {err}");
    }
}

fn cover(c: &mut Criterion) {
    if let Err(err) = cover_impl(c) {
        panic!("cover_search benchmark setup failed: {err}");
    }
}

fn baseline(c: &mut Criterion) {
    if let Err(err) = baseline_impl(c) {
        panic!("flat_baselines benchmark setup failed: {err}");
    }
}

criterion_group!(benches, graph_distance, cover, baseline);
criterion_main!(benches);
