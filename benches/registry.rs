//! Benchmarks for listener registry operations.
//!
//! Run with: cargo bench --bench registry

use std::net::SocketAddr;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use relayd::listener::ListenerRegistry;
use tokio::runtime::Runtime;

fn test_peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn bench_snapshot(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("registry/snapshot");

    for listeners in [1usize, 16, 256] {
        let registry = ListenerRegistry::new();
        let receivers: Vec<_> = rt.block_on(async {
            let mut receivers = Vec::with_capacity(listeners);
            for _ in 0..listeners {
                receivers.push(registry.register(test_peer()).await.1);
            }
            receivers
        });

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, _| {
                b.iter(|| {
                    let snapshot = rt.block_on(registry.snapshot());
                    black_box(snapshot.len())
                })
            },
        );

        drop(receivers);
    }

    group.finish();
}

fn bench_register_remove(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = ListenerRegistry::new();

    c.bench_function("registry/register_remove", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (id, rx) = registry.register(test_peer()).await;
                registry.remove(id).await;
                drop(rx);
                black_box(id)
            })
        })
    });
}

criterion_group!(benches, bench_snapshot, bench_register_remove);
criterion_main!(benches);
