use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use share_calculator::bucketizer::aggregate;
use share_calculator::calculator::calculate_shares;
use share_calculator::fuel_aggregator::{aggregate_by_fuel, total_generation};
use share_calculator::{build_from_records, GenerationRecord, ZeroTotalPolicy};

const PRODUCTION_TYPES: [(&str, f64); 5] = [
    ("Fossil Gas", 120.0),
    ("Fossil Hard coal", 80.0),
    ("Fossil Brown coal/Lignite", 60.0),
    ("Nuclear", 400.0),
    ("Wind Onshore", 150.0),
];

/// One quarter-hourly month for three countries.
fn generate_records() -> Vec<GenerationRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let mut records = vec![];

    for country in ["France", "Germany", "Poland"] {
        for interval in 0..(31 * 24 * 4) {
            let timestamp = start + Duration::minutes(15 * interval);
            for (i, (production_type, base)) in PRODUCTION_TYPES.iter().enumerate() {
                let swing = ((interval + i as i64) % 96) as f64;
                records.push(GenerationRecord {
                    timestamp,
                    utc_offset: None,
                    country: country.to_string(),
                    resolution: "PT15M".to_string(),
                    production_type: production_type.to_string(),
                    generation: base + swing,
                });
            }
        }
    }

    records
}

fn benchmark_fuel_aggregation(c: &mut Criterion) {
    let records = generate_records();

    c.bench_function("aggregate_by_fuel", |b| {
        b.iter(|| black_box(aggregate_by_fuel(&records)));
    });
}

fn benchmark_share_and_bucketize(c: &mut Criterion) {
    let records = generate_records();
    let fuel_rows = aggregate_by_fuel(&records);
    let totals = total_generation(&records);

    c.bench_function("calculate_shares_and_aggregate", |b| {
        b.iter(|| {
            let shares = calculate_shares(&totals, &fuel_rows);
            black_box(aggregate(&shares, ZeroTotalPolicy::Exclude))
        });
    });
}

fn benchmark_full_build(c: &mut Criterion) {
    let records = generate_records();

    c.bench_function("build_from_records", |b| {
        b.iter(|| black_box(build_from_records(&records, ZeroTotalPolicy::Exclude)));
    });
}

criterion_group!(
    benches,
    benchmark_fuel_aggregation,
    benchmark_share_and_bucketize,
    benchmark_full_build
);
criterion_main!(benches);
