//! Poset construction benchmarks.
//!
//! Measures the dominance pass, the transitive reduction of its result and
//! the full analysis (both plus the reachability index) over seeded
//! synthetic families, once per execution strategy.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use hasse_benches::{error::BenchSetupError, params::PosetBenchParams, synthetic::SyntheticConfig};
use hasse_core::{ExecutionStrategy, HasseBuilder, PosetGraphBuilder, TransitiveReducer};

/// Seed used for all synthetic data generation in this benchmark.
const SEED: u64 = 42;

/// Largest generated cell value.
const MAX_CELL: u32 = 3;

/// Family shapes to benchmark.
const SHAPES: &[PosetBenchParams] = &[
    PosetBenchParams { matrix_count: 64, order: 3 },
    PosetBenchParams { matrix_count: 256, order: 3 },
    PosetBenchParams { matrix_count: 256, order: 5 },
];

/// Strategies compared in every group.
const STRATEGIES: &[(&str, ExecutionStrategy)] = &[
    ("sequential", ExecutionStrategy::Sequential),
    ("auto", ExecutionStrategy::Auto),
];

fn config(params: PosetBenchParams) -> SyntheticConfig {
    SyntheticConfig {
        matrix_count: params.matrix_count,
        order: params.order,
        max_cell: MAX_CELL,
        seed: SEED,
    }
}

fn poset_build_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("build_poset");
    group.sample_size(20);

    for &params in SHAPES {
        let family = config(params).generate()?;
        for &(label, strategy) in STRATEGIES {
            let builder = PosetGraphBuilder::new().with_execution_strategy(strategy);
            group.bench_with_input(BenchmarkId::new(label, params), &family, |b, family| {
                b.iter(|| builder.build(family));
            });
        }
    }

    group.finish();
    Ok(())
}

fn poset_reduce_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("transitive_reduction");
    group.sample_size(20);

    for &params in SHAPES {
        let family = config(params).generate()?;
        let dominance = PosetGraphBuilder::new().build(&family)?;
        for &(label, strategy) in STRATEGIES {
            let reducer = TransitiveReducer::new().with_execution_strategy(strategy);
            group.bench_with_input(BenchmarkId::new(label, params), &dominance, |b, graph| {
                b.iter(|| reducer.reduce(graph));
            });
        }
    }

    group.finish();
    Ok(())
}

fn poset_analyze_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("analyze");
    group.sample_size(10);

    for &params in SHAPES {
        let family = config(params).generate()?;
        for &(label, strategy) in STRATEGIES {
            let hasse = HasseBuilder::new().with_execution_strategy(strategy).build()?;
            group.bench_with_input(BenchmarkId::new(label, params), &family, |b, family| {
                b.iter(|| hasse.analyze(family));
            });
        }
    }

    group.finish();
    Ok(())
}

fn poset_build(c: &mut Criterion) {
    if let Err(err) = poset_build_impl(c) {
        panic!("build_poset benchmark setup failed: {err}");
    }
}

fn poset_reduce(c: &mut Criterion) {
    if let Err(err) = poset_reduce_impl(c) {
        panic!("transitive_reduction benchmark setup failed: {err}");
    }
}

fn poset_analyze(c: &mut Criterion) {
    if let Err(err) = poset_analyze_impl(c) {
        panic!("analyze benchmark setup failed: {err}");
    }
}

criterion_group!(benches, poset_build, poset_reduce, poset_analyze);
criterion_main!(benches);
