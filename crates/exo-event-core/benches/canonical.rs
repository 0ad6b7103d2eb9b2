use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use exo_event_core::{
    canonical_bytes, decode_event, hash_canonical, Event, EventId, EventPayload,
    HybridLogicalClock,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const PAYLOAD_SIZES: [usize; 4] = [0, 64, 1024, 64 * 1024];

fn sample_event(rng: &mut StdRng, payload_len: usize) -> Event {
    let mut payload = vec![0u8; payload_len];
    rng.fill_bytes(&mut payload);

    let parents = (0..4).map(|_| {
        let mut id = [0u8; 32];
        rng.fill_bytes(&mut id);
        EventId::from_bytes(id)
    });

    Event::builder("did:exo:bench")
        .parents(parents)
        .logical_time(HybridLogicalClock::new(1_736_870_400_000, 3))
        .key_version(1)
        .payload(EventPayload::opaque(payload))
        .build()
}

fn bench_canonical(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xE0E0);
    let mut group = c.benchmark_group("canonical");

    for size in PAYLOAD_SIZES {
        let event = sample_event(&mut rng, size);
        let bytes = canonical_bytes(&event).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &event, |b, event| {
            b.iter(|| black_box(canonical_bytes(event).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("event_id", size), &event, |b, event| {
            b.iter(|| black_box(event.compute_id().unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("hash", size), &bytes, |b, bytes| {
            b.iter(|| black_box(hash_canonical(bytes)))
        });

        group.bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, bytes| {
            b.iter(|| black_box(decode_event(bytes).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_canonical);
criterion_main!(benches);
