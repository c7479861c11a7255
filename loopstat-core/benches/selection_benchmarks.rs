//! Criterion benchmarks for period selection and ranking.
//!
//! Measures per-period top-N ranking and the aggregate tiered ranking on
//! synthetic tables shaped like Eurostat extracts: a few dozen reporting
//! entities over several decades.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package loopstat-core
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::num::NonZeroUsize;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use loopstat_core::{
    Aggregation, EntityMatcher, Observation, ObservationTable, RankingOptions, rank_window,
    select_recent_periods, top_n_per_period,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic table generation.
const BENCHMARK_SEED: u64 = 42;

/// Entity counts to benchmark.
const ENTITY_COUNTS: &[usize] = &[30, 60, 120];

/// Reporting years per entity.
const YEARS: i32 = 40;

/// Build a table where every entity reports every year, with a few gaps.
fn generate_table(entities: usize, seed: u64) -> ObservationTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for entity in 0..entities {
        for year in 1985..1985 + YEARS {
            // Roughly one in twenty cells is missing, as in real extracts.
            if rng.gen_ratio(1, 20) {
                continue;
            }
            let value: f64 = rng.gen_range(0.0..1_000.0);
            rows.push(Observation::new(format!("Entity {entity:03}"), year, value));
        }
    }
    ObservationTable::from_rows(rows)
}

fn options() -> RankingOptions {
    RankingOptions {
        top_n: NonZeroUsize::new(10).expect("non-zero top-n"),
        top_tier_size: 3,
        spotlight: EntityMatcher::exact("Entity 007").ok(),
        aggregation: Aggregation::Sum,
        backfill_top_tier: false,
    }
}

fn bench_rankings(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    let window_size = NonZeroUsize::new(20).expect("non-zero window");
    let top_n = NonZeroUsize::new(10).expect("non-zero top-n");
    let ranking_options = options();

    for &entities in ENTITY_COUNTS {
        let table = generate_table(entities, BENCHMARK_SEED);
        let window = select_recent_periods(&table, window_size);

        #[expect(
            clippy::as_conversions,
            reason = "Row counts in benchmarks fit comfortably in u64"
        )]
        let throughput_size = table.len() as u64;
        group.throughput(Throughput::Elements(throughput_size));
        group.bench_with_input(
            BenchmarkId::new("top_n_per_period", entities),
            &table,
            |b, rows| b.iter(|| top_n_per_period(rows, &window, top_n)),
        );
        group.bench_with_input(
            BenchmarkId::new("rank_window", entities),
            &table,
            |b, rows| b.iter(|| rank_window(rows, &window, &ranking_options)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_rankings);
criterion_main!(benches);
