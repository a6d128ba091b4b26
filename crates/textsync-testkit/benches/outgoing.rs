use criterion::{black_box, criterion_group, criterion_main, Criterion};

use textsync_core::Fingerprint;
use textsync_endpoint::SyncEndpoint;

fn document(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| format!("Paragraph {i}: the quick brown fox jumps over the lazy dog.\n"))
        .collect()
}

fn outgoing(c: &mut Criterion) {
    let base = document(200);
    let endpoint = SyncEndpoint::new(base.clone());
    let h0 = endpoint.fingerprint();
    endpoint.set_local(format!("{base}One more line.\n"));

    c.bench_function("outgoing_delta", |b| {
        b.iter(|| endpoint.handle_outgoing_sync_request(black_box(&h0)).unwrap())
    });

    c.bench_function("outgoing_snapshot", |b| {
        b.iter(|| {
            endpoint
                .handle_outgoing_sync_request(black_box(&Fingerprint::ZERO))
                .unwrap()
        })
    });
}

criterion_group!(benches, outgoing);
criterion_main!(benches);
