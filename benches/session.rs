use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use nntpsink::config::Caps;
use nntpsink::queue::ByteQueue;
use nntpsink::session::Session;

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    // a typical small article offered over streaming
    let mut article: Vec<Vec<u8>> = vec![b"TAKETHIS <bench@example.com>".to_vec()];
    for i in 0..50 {
        article.push(format!("body line {i} of a perfectly ordinary article").into_bytes());
    }
    article.push(b".".to_vec());

    group.bench_function("takethis_article", |b| {
        b.iter_batched(
            || (Session::new(Caps::default()), ByteQueue::new()),
            |(mut session, mut out)| {
                for line in &article {
                    session.handle_line(line, &mut out);
                }
                black_box(out.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("check_burst_1k", |b| {
        let lines: Vec<Vec<u8>> = (0..1000)
            .map(|i| format!("CHECK <{i}@news.example.com>").into_bytes())
            .collect();
        b.iter_batched(
            || (Session::new(Caps::default()), ByteQueue::new()),
            |(mut session, mut out)| {
                for line in &lines {
                    session.handle_line(line, &mut out);
                }
                black_box(out.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_session);
criterion_main!(benches);
