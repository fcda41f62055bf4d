//! Benchmarks for tagging and ranking.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use inbox_priority::learning::MemoryValueStore;
use inbox_priority::message::Message;
use inbox_priority::ranking::rank;
use inbox_priority::tagging::{FeatureSet, TagScorer};

fn sample_messages(n: usize) -> Vec<Message> {
    let templates = [
        ("URGENT: production outage", "server down, fix asap", "ops@corp.com"),
        ("Weekly newsletter", "news from the blog", "news@site.com"),
        ("Invoice #4411", "payment due by 17:00 today", "billing@vendor.com"),
        ("Team meeting", "zoom call tomorrow", "calendar@corp.com"),
        ("hello", "see you soon", "pal@home.org"),
    ];
    (0..n)
        .map(|i| {
            let (subject, body, sender) = templates[i % templates.len()];
            Message::new(format!("m{i}"), subject, body, sender)
        })
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let messages = sample_messages(3);
    c.bench_function("extract_features", |bench| {
        bench.iter(|| black_box(FeatureSet::extract(black_box(&messages[2]))))
    });
}

fn bench_score(c: &mut Criterion) {
    let scorer = TagScorer::default();
    let features = FeatureSet::extract(&sample_messages(1)[0]);
    c.bench_function("score_tags", |bench| {
        bench.iter(|| black_box(scorer.score(black_box(&features), None)))
    });
}

fn bench_rank(c: &mut Criterion) {
    let scorer = TagScorer::default();
    let mut messages = sample_messages(500);
    for msg in &mut messages {
        let result = scorer.score(&FeatureSet::extract(msg), None);
        msg.apply_tag(&result);
    }
    let store = MemoryValueStore::new(0.1);

    c.bench_function("rank_500", |bench| {
        bench.iter(|| black_box(rank(black_box(&messages), &store)))
    });
}

criterion_group!(benches, bench_extract, bench_score, bench_rank);
criterion_main!(benches);
