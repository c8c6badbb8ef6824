//! Dispatch micro-benchmarks: publish over a depth-3 hierarchy with handlers
//! at every level, the empty-registry walk, and predicate evaluation.

use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{Criterion, criterion_group, criterion_main};

use cascade::{Broker, Event, Handler};

#[derive(Debug)]
struct Root;
impl Event for Root {
    type Parent = Root;
}

#[derive(Debug)]
struct Middle;
impl Event for Middle {
    type Parent = Root;
}

#[derive(Debug)]
struct Leaf {
    value: u64,
}
impl Event for Leaf {
    type Parent = Middle;
}

static SINK: AtomicU64 = AtomicU64::new(0);

fn counting_handler() -> Handler {
    Handler::closure(|_, _| {
        SINK.fetch_add(1, Ordering::Relaxed);
        Ok(())
    })
}

fn publish_depth3(c: &mut Criterion) {
    let broker = Broker::new();
    broker.subscribe::<Root>(counting_handler());
    broker.subscribe::<Middle>(counting_handler());
    broker.subscribe::<Leaf>(counting_handler());

    c.bench_function("publish_depth3", |b| {
        b.iter(|| {
            broker
                .publish(&(), Some(black_box(&Leaf { value: 1 })))
                .unwrap();
        })
    });
}

fn publish_no_subscribers(c: &mut Criterion) {
    let broker = Broker::new();

    c.bench_function("publish_no_subscribers", |b| {
        b.iter(|| {
            broker
                .publish(&(), Some(black_box(&Leaf { value: 1 })))
                .unwrap();
        })
    });
}

fn publish_with_predicates(c: &mut Criterion) {
    let broker = Broker::new();
    for threshold in [10, 100, 1000] {
        broker.subscribe_where::<Leaf>(
            move |payload| {
                payload
                    .downcast_ref::<Leaf>()
                    .is_some_and(|e| e.value > threshold)
            },
            counting_handler(),
        );
    }

    c.bench_function("publish_with_predicates", |b| {
        b.iter(|| {
            broker
                .publish(&(), Some(black_box(&Leaf { value: 500 })))
                .unwrap();
        })
    });
}

criterion_group!(
    benches,
    publish_depth3,
    publish_no_subscribers,
    publish_with_predicates
);
criterion_main!(benches);
