use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nntpsink::protocol::Command;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.bench_function("check", |b| {
        b.iter(|| black_box(Command::parse(black_box("CHECK <12345.67890@news.example.com>"))));
    });
    group.bench_function("takethis", |b| {
        b.iter(|| black_box(Command::parse(black_box("TAKETHIS <12345.67890@news.example.com>"))));
    });
    group.bench_function("unknown", |b| {
        b.iter(|| black_box(Command::parse(black_box("XOVER 1-1000"))));
    });
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
