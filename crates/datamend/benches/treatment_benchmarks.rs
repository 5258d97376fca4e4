//! Treatment performance benchmarks.
//!
//! Measures each treatment method over value gaps, and tick materialization
//! over datetime gaps.

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use datamend::{Dataset, IntervalDetector, Parser, Selection, TreatmentEngine, TreatmentMethod};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a series where about 1 in 8 readings is missing and about 1 in
/// 40 steps drops ticks.
fn generate_series(rows: usize) -> String {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ts = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let mut data = String::from("time,temp\n");

    for _ in 0..rows {
        let skip = if rng.gen_ratio(1, 40) { rng.gen_range(2..4) } else { 1 };
        ts += Duration::minutes(skip);
        if rng.gen_ratio(1, 8) {
            data.push_str(&format!("{},\n", ts.format("%Y-%m-%d %H:%M:%S")));
        } else {
            data.push_str(&format!(
                "{},{:.3}\n",
                ts.format("%Y-%m-%d %H:%M:%S"),
                rng.gen_range(0.0..100.0)
            ));
        }
    }

    data
}

fn load(rows: usize) -> Dataset {
    let data = generate_series(rows);
    let (table, _) = Parser::new()
        .parse_bytes("bench.csv", data.as_bytes())
        .expect("parse failed");
    Dataset::from_table(table, None).expect("dataset failed")
}

/// Benchmark every method over all value gaps of one column.
fn bench_value_gap_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_gap_treatment");
    let engine = TreatmentEngine::new();
    let dataset = load(20_000);
    let run = IntervalDetector::new()
        .detect_value_gaps(&dataset, "temp", 0)
        .expect("detection failed");

    for method in [
        TreatmentMethod::ForwardFill,
        TreatmentMethod::BackwardFill,
        TreatmentMethod::Mean,
        TreatmentMethod::Median,
        TreatmentMethod::DeleteRows,
    ] {
        let selection = Selection::new(["temp"], run.intervals.clone(), method);
        group.bench_with_input(
            BenchmarkId::new("method", method),
            &selection,
            |b, selection| {
                b.iter_with_setup(
                    || dataset.clone(),
                    |mut ds| engine.apply(black_box(&mut ds), selection),
                );
            },
        );
    }

    group.finish();
}

/// Benchmark materializing missing ticks for datetime gaps.
fn bench_datetime_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("datetime_gap_treatment");
    let engine = TreatmentEngine::new();

    for rows in [1_000, 10_000, 50_000].iter() {
        let dataset = load(*rows);
        let run = IntervalDetector::new()
            .detect_datetime_gaps(&dataset, 0)
            .expect("detection failed");
        let selection = Selection::new(["temp"], run.intervals, TreatmentMethod::ForwardFill);

        group.bench_with_input(BenchmarkId::new("rows", rows), &selection, |b, selection| {
            b.iter_with_setup(
                || dataset.clone(),
                |mut ds| engine.apply(black_box(&mut ds), selection),
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_value_gap_methods, bench_datetime_fill);
criterion_main!(benches);
