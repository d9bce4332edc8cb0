use criterion::{Criterion, black_box, criterion_group, criterion_main};

use csv_feed::feeds::header::resolve_header_lines;
use csv_feed::feeds::server::parse_body;
use csv_feed::feeds::sniff::{HeaderSniffer, StructuralSniffer};
use csv_feed::payload::{FeedRequest, build_payload};
use csv_feed::RequestParams;

fn feed_body(rows: usize) -> String {
    let mut body = String::from("# generated indicator feed\n#ip,first_seen,reason\n");
    for i in 0..rows {
        body.push_str(&format!("10.0.{}.{},2024-01-{:02},scanner\n", i / 256, i % 256, i % 28 + 1));
    }
    body
}

fn bench_header_detection(c: &mut Criterion) {
    let body = feed_body(5_000);
    let expected = vec!["ip".to_string(), "first_seen".to_string(), "reason".to_string()];

    c.bench_function("resolve_header_lines/5k", |b| {
        b.iter(|| resolve_header_lines(black_box(&body), black_box(&expected), b','))
    });

    let params: RequestParams =
        serde_json::from_str(r#"{"col_name": "ip, reason", "n_rows": 5000}"#).unwrap();
    let request = FeedRequest::from_params(&build_payload(params, None)).unwrap();
    c.bench_function("parse_body/5k", |b| {
        b.iter(|| parse_body(black_box(&body), black_box(&request)).unwrap())
    });

    let sample = &body.as_bytes()[..2048];
    c.bench_function("structural_sniffer/2k", |b| {
        b.iter(|| StructuralSniffer.has_header(black_box(sample), b','))
    });
}

criterion_group!(benches, bench_header_detection);
criterion_main!(benches);
