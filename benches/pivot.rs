//! Criterion benchmark for the category pivot engine.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ine_harmonizer::app::models::record::LongRecord;
use ine_harmonizer::app::services::pivot::{pivot, PivotSpec};
use ine_harmonizer::Value;

fn section_records(sections: usize) -> Vec<LongRecord> {
    let mut records = Vec::with_capacity(sections * 3);
    for i in 0..sections {
        let municipality = format!("{:05}", 1000 + i / 10);
        let section = format!("{:03}", i % 1000);
        for (sex, value) in [("Total", 210.0), ("Males", 100.0), ("Females", 110.0)] {
            records.push(
                LongRecord::new()
                    .with_key("Municipality code", Value::text(municipality.clone()))
                    .with_key("Section code", Value::text(section.clone()))
                    .with_key("Year", Value::Int(2021))
                    .with_category("Value name", "Population")
                    .with_category("Sex", sex)
                    .with_value(Some(value + i as f64)),
            );
        }
    }
    records
}

fn bench_pivot(c: &mut Criterion) {
    let spec = PivotSpec::new(
        &["Municipality code", "Section code", "Year"],
        "Value",
        &["Nationality", "Age", "Sex"],
    );

    let mut group = c.benchmark_group("pivot");
    for sections in [100usize, 1_000] {
        let records = section_records(sections);
        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            &records,
            |b, records| {
                b.iter(|| pivot(records.clone(), &spec));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pivot);
criterion_main!(benches);
