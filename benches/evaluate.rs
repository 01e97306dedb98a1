use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ruletree::{evaluate, parse, to_text, Record};

/// Build rule text with `n` comparisons (each on a unique field) joined by AND,
/// plus a record that satisfies every one of them.
fn build_rule(n: usize) -> (String, Record) {
    let mut record = Record::new();
    let mut clauses = Vec::with_capacity(n);

    for i in 0..n {
        clauses.push(format!("(f{i} >= 1)"));
        record = record.set(&format!("f{i}"), 10_i64);
    }

    (clauses.join(" AND "), record)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_eval");

    for &n in &[5, 20, 50] {
        let (text, record) = build_rule(n);
        let tree = parse(&text).unwrap();
        group.bench_function(&format!("{n}_comparisons"), |b| {
            b.iter(|| evaluate(black_box(&tree), black_box(&record)));
        });
    }

    group.finish();
}

fn bench_record_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_construction");

    for &n in &[5, 20, 50] {
        let body = serde_json::Value::Object(
            (0..n)
                .map(|i| (format!("f{i}"), serde_json::Value::from(10_i64)))
                .collect(),
        );

        group.bench_function(&format!("{n}_fields_builder"), |b| {
            b.iter(|| {
                let mut record = Record::new();
                for i in 0..n {
                    record = record.set(&format!("f{i}"), black_box(10_i64));
                }
                record
            });
        });

        group.bench_function(&format!("{n}_fields_json"), |b| {
            b.iter(|| Record::from_json(black_box(&body)));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for &n in &[5, 20, 50] {
        let (text, _) = build_rule(n);
        group.bench_function(&format!("{n}_comparisons"), |b| {
            b.iter(|| black_box(parse(black_box(&text)).unwrap()));
        });

        let tree = parse(&text).unwrap();
        group.bench_function(&format!("{n}_comparisons_to_text"), |b| {
            b.iter(|| black_box(to_text(black_box(&tree))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_evaluate,
    bench_record_construction,
    bench_parse
);
criterion_main!(benches);
