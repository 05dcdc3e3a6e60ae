//! Benchmarks for parsing OpenABL models.
//!
//! Run with: cargo bench
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glob::glob;
use std::fs;

/// Load every `.abl` fixture under `tests/fixtures/`.
fn load_fixtures() -> Vec<(String, String)> {
    let mut fixtures = Vec::new();

    let patterns = ["tests/fixtures/*.abl", "../tests/fixtures/*.abl"];

    for pattern in patterns {
        for path in glob(pattern).expect("failed to read glob pattern").flatten() {
            if let Ok(content) = fs::read_to_string(&path) {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("unknown")
                    .to_string();
                if !fixtures.iter().any(|(n, _)| n == &name) {
                    fixtures.push((name, content));
                }
            }
        }
    }

    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    fixtures
}

/// Benchmark parsing all fixtures together.
fn bench_parse_all(c: &mut Criterion) {
    let fixtures = load_fixtures();

    if fixtures.is_empty() {
        eprintln!("Warning: no fixture files found under tests/fixtures/");
        return;
    }

    let total_bytes: usize = fixtures.iter().map(|(_, content)| content.len()).sum();

    let mut group = c.benchmark_group("parse_all_fixtures");
    group.throughput(Throughput::Bytes(total_bytes as u64));

    group.bench_function("parse", |b| {
        b.iter(|| {
            for (_, content) in &fixtures {
                let _ = black_box(openabl::parser::parse(content));
            }
        });
    });

    group.bench_function("parse_and_analyze", |b| {
        b.iter(|| {
            for (_, content) in &fixtures {
                let _ = black_box(openabl::analyze_source(content, Default::default()));
            }
        });
    });

    group.finish();
}

/// Benchmark individual fixtures, for spotting per-file regressions.
fn bench_individual_fixtures(c: &mut Criterion) {
    let fixtures = load_fixtures();

    if fixtures.is_empty() {
        return;
    }

    let mut parse_group = c.benchmark_group("parse_individual");
    for (name, content) in &fixtures {
        parse_group.throughput(Throughput::Bytes(content.len() as u64));
        parse_group.bench_with_input(BenchmarkId::new("parse", name), content, |b, content| {
            b.iter(|| black_box(openabl::parser::parse(content)));
        });
    }
    parse_group.finish();

    let mut analyze_group = c.benchmark_group("analyze_individual");
    for (name, content) in &fixtures {
        analyze_group.throughput(Throughput::Bytes(content.len() as u64));
        analyze_group.bench_with_input(
            BenchmarkId::new("analyze", name),
            content,
            |b, content| {
                b.iter(|| black_box(openabl::analyze_source(content, Default::default())));
            },
        );
    }
    analyze_group.finish();
}

/// Benchmark the full parse -> analyze -> JSON dump path used by
/// `openabl-dump-ast`.
fn bench_dump_ast(c: &mut Criterion) {
    let fixtures = load_fixtures();

    if fixtures.is_empty() {
        return;
    }

    let mut group = c.benchmark_group("dump_ast");
    for (name, content) in &fixtures {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_serialize", name), content, |b, content| {
            b.iter(|| {
                if let Ok(script) = openabl::parser::parse(content) {
                    black_box(openabl::serializer::to_json_compact(&script))
                } else {
                    Ok(String::new())
                }
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_all,
    bench_individual_fixtures,
    bench_dump_ast
);
criterion_main!(benches);
