//! # KeyMesh Exchange Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Tracker issue + resolve | < 50us per request |
//! | Tracker tick over many pending requests | < 1ms per 1000 |
//! | Router decode + dispatch of one response | < 50us |

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use km_01_topic_registry::TopicRegistry;
use km_02_correlation_tracker::{CorrelationTracker, TrackerConfig};
use km_03_exchange_coordinator::{
    BusRouter, CoordinatorConfig, ExchangeCoordinator, StaticPayloads,
};
use shared_bus::{InMemoryBroker, TransportMessage};
use shared_types::{ExchangeEnvelope, ExchangeKind, PeerId, TopicConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn fixture() -> (Arc<InMemoryBroker>, Arc<TopicRegistry>, Arc<CorrelationTracker>) {
    let broker = Arc::new(InMemoryBroker::new());
    let registry = Arc::new(TopicRegistry::new(&TopicConfig::default()).unwrap());
    let tracker = Arc::new(CorrelationTracker::new(
        TrackerConfig::new("bench"),
        Arc::clone(&registry),
        broker.clone(),
    ));
    (broker, registry, tracker)
}

fn bench_issue_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("km-02-correlation-tracker");
    let (_broker, _registry, tracker) = fixture();
    let peer = PeerId::from("peer");

    group.bench_function("issue_then_resolve", |b| {
        b.iter(|| {
            let id = tracker
                .issue(ExchangeKind::PublicKey, &peer, Duration::from_secs(5), vec![0u8; 32])
                .unwrap();
            black_box(tracker.resolve_from(id, &peer, vec![0u8; 32]).unwrap())
        })
    });

    for size in [100usize, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tick_expire_all", size), &size, |b, &size| {
            b.iter_with_setup(
                || {
                    let (broker, _registry, tracker) = fixture();
                    for i in 0..size {
                        let peer = PeerId::new(format!("peer-{i}"));
                        tracker
                            .issue(ExchangeKind::Cek, &peer, Duration::from_millis(1), Vec::new())
                            .unwrap();
                    }
                    (broker, tracker)
                },
                |(_broker, tracker)| {
                    black_box(tracker.tick(Instant::now() + Duration::from_secs(60)))
                },
            )
        });
    }

    group.finish();
}

fn bench_route_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("km-03-exchange-coordinator");
    let (broker, registry, tracker) = fixture();
    let coordinator = Arc::new(ExchangeCoordinator::new(
        CoordinatorConfig::default(),
        Arc::clone(&tracker),
        Arc::new(StaticPayloads::new("bench")),
    ));
    let router = BusRouter::new(Arc::clone(&registry), broker, Arc::clone(&coordinator));
    let peer = PeerId::from("peer");
    let topic = registry.response_topic(ExchangeKind::PublicKey).to_string();

    group.bench_function("route_public_key_response", |b| {
        b.iter_with_setup(
            || {
                coordinator.abandon(&peer);
                tracker.cancel_peer(&peer);
                let id = coordinator.start(&peer).unwrap();
                let request = ExchangeEnvelope::request(
                    id,
                    ExchangeKind::PublicKey,
                    PeerId::from("bench"),
                    peer.clone(),
                    Vec::new(),
                );
                let response = ExchangeEnvelope::response_to(&request, peer.clone(), vec![1; 64]);
                TransportMessage::new(topic.clone(), Bytes::from(response.encode().unwrap()))
            },
            |message| black_box(router.route(&message)),
        )
    });

    group.finish();
}

criterion_group!(benches, bench_issue_resolve, bench_route_response);
criterion_main!(benches);
