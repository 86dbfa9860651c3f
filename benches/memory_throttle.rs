use criterion::{Criterion, criterion_group, criterion_main};

// The async benches drive a tokio runtime; keep the target buildable when the
// crate is compiled for smol only.
#[cfg(feature = "rt-tokio")]
mod enabled {
    use std::{hint::black_box, sync::Arc, time::Duration};

    use criterion::Criterion;

    use damper::{
        BoxError, Damper, DispatcherId, DistributedLockFactory, MemoryLockFactory, MemoryStore,
    };

    pub fn bench_throttle_skip_path(c: &mut Criterion) {
        let mut group = c.benchmark_group("memory_throttle/dispatch");
        group.sample_size(100);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let damper = Damper::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryLockFactory::new()),
        );
        let dispatcher = damper.throttle(
            DispatcherId::try_from("bench").unwrap(),
            Duration::from_secs(60),
        );

        // Seed the window so the steady state is the skip fast-path.
        rt.block_on(async {
            dispatcher
                .dispatch(|| async { Ok::<(), BoxError>(()) })
                .await
                .unwrap();
        });

        group.bench_function("skip_within_interval", |b| {
            b.to_async(&rt).iter(|| async {
                black_box(
                    dispatcher
                        .dispatch(|| async { Ok::<(), BoxError>(()) })
                        .await
                        .unwrap(),
                );
            });
        });

        group.finish();
    }

    pub fn bench_memory_lock_cycle(c: &mut Criterion) {
        let mut group = c.benchmark_group("memory_lock/acquire_release");
        group.sample_size(100);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let locks = MemoryLockFactory::new();

        group.bench_function("uncontended", |b| {
            b.to_async(&rt).iter(|| async {
                let lock = locks
                    .acquire("bench-key", Duration::from_secs(10))
                    .await
                    .unwrap()
                    .unwrap();
                lock.release().await.unwrap();
            });
        });

        group.bench_function("contended", |b| {
            let held = rt.block_on(async {
                locks
                    .acquire("held-key", Duration::from_secs(600))
                    .await
                    .unwrap()
                    .unwrap()
            });

            b.to_async(&rt).iter(|| async {
                black_box(
                    locks
                        .acquire("held-key", Duration::from_secs(10))
                        .await
                        .unwrap()
                        .is_none(),
                );
            });

            drop(held);
        });

        group.finish();
    }
}

#[cfg(feature = "rt-tokio")]
fn bench_throttle_skip_path(c: &mut Criterion) {
    enabled::bench_throttle_skip_path(c)
}

#[cfg(not(feature = "rt-tokio"))]
fn bench_throttle_skip_path(_: &mut Criterion) {}

#[cfg(feature = "rt-tokio")]
fn bench_memory_lock_cycle(c: &mut Criterion) {
    enabled::bench_memory_lock_cycle(c)
}

#[cfg(not(feature = "rt-tokio"))]
fn bench_memory_lock_cycle(_: &mut Criterion) {}

criterion_group!(benches, bench_throttle_skip_path, bench_memory_lock_cycle);
criterion_main!(benches);
