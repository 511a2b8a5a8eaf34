use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hostresolver::dns::{Queue, Request};

fn filled(n: usize) -> Queue<Request> {
    let mut queue = Queue::new();
    for i in 0..n {
        queue.push_back(Request::new(format!("host-{i}"), |_| {}));
    }
    queue
}

/// Queue moves are pointer updates; the splice cost must not depend on length.
fn benchmark_queue_operations(c: &mut Criterion) {
    c.bench_function("queue_push_pop_1000", |b| {
        b.iter_batched(
            || (0..1000).map(|i| Request::new(format!("host-{i}"), |_| {})).collect::<Vec<_>>(),
            |requests| {
                let mut queue = Queue::new();
                for request in requests {
                    queue.push_back(request);
                }
                while let Some(request) = queue.pop_front() {
                    black_box(request);
                }
            },
            BatchSize::SmallInput,
        )
    });

    for len in [10, 10_000] {
        c.bench_function(&format!("queue_append_{len}"), |b| {
            b.iter_batched(
                || (Queue::new(), filled(len)),
                |(mut batch, mut pending)| {
                    batch.append(&mut pending);
                    black_box((batch, pending))
                },
                BatchSize::LargeInput,
            )
        });
    }
}

criterion_group!(benches, benchmark_queue_operations);
criterion_main!(benches);
