use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hostresolver::dns::{Request, Resolver, ResolverConfig};
use hostresolver::eventloop::ManualEventLoop;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn echo(request: &mut Request) {
    request.set_success(vec!["192.0.2.1".to_string()]);
}

/// Benchmark the completion tick: idle (no results) and a full round trip.
fn benchmark_dispatch(c: &mut Criterion) {
    let event_loop = Arc::new(ManualEventLoop::new());
    let resolver = Resolver::with_lookup(event_loop.clone(), ResolverConfig::default(), echo);
    resolver.start().unwrap();

    // Idle tick should be a single atomic load
    c.bench_function("dispatch_idle_tick", |b| b.iter(|| black_box(resolver.dispatch_completions())));

    let delivered = Arc::new(AtomicUsize::new(0));
    c.bench_function("round_trip_64", |b| {
        b.iter(|| {
            let target = delivered.load(Ordering::Relaxed) + 64;
            for _ in 0..64 {
                let delivered = Arc::clone(&delivered);
                resolver
                    .enqueue(Request::new("bench", move |_| {
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }))
                    .unwrap();
            }
            event_loop.run_until(Duration::from_secs(5), || {
                delivered.load(Ordering::Relaxed) >= target
            })
        })
    });

    resolver.shutdown();
}

criterion_group!(benches, benchmark_dispatch);
criterion_main!(benches);
