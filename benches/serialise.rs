//! Benchmarks for per-record work done before a request hits the network.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use http_output::{
    Record, StatusCodeSet,
    http_output::{serialise_form, serialise_json},
};

fn sample_record() -> Record {
    Record::map()
        .with("field1", 50)
        .with("field2", 20)
        .with("message", "disk usage above threshold on /var")
        .with("binary", "あいう".as_bytes())
}

fn bench_serialisers(c: &mut Criterion) {
    let record = sample_record();
    c.bench_function("serialise_form", |b| {
        b.iter(|| serialise_form(black_box(&record)))
    });
    c.bench_function("serialise_json", |b| {
        b.iter(|| serialise_json(black_box(&record)))
    });
}

fn bench_status_codes(c: &mut Criterion) {
    c.bench_function("parse_ignore_list", |b| {
        b.iter(|| StatusCodeSet::parse(black_box("300..399,404,409,500..599")))
    });
    let set = StatusCodeSet::parse("400..499").unwrap_or_default();
    c.bench_function("ignore_list_lookup", |b| {
        b.iter(|| set.contains(black_box(409)))
    });
}

criterion_group!(benches, bench_serialisers, bench_status_codes);
criterion_main!(benches);
