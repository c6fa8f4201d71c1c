use criterion::{criterion_group, criterion_main, Criterion};

use causeway_tracing::prelude::*;
use causeway_tracing::{span_scope, trace_event};

pub fn criterion_benchmark(c: &mut Criterion) {
    let _tracing_guard = TracingSystemGuard::new(
        TracingConfig::default(),
        vec![Box::new(NullRecordSink {})],
    )
    .unwrap();

    c.bench_function("dispatch/span_scope", |b| {
        b.iter(|| {
            span_scope!("bench_span");
        })
    });
    c.bench_function("dispatch/event", |b| {
        b.iter(|| {
            trace_event!("bench_event");
        })
    });
    c.bench_function("dispatch/event_with_attrs", |b| {
        b.iter(|| {
            trace_event!("bench_event_attrs", attr("index", 1), attr("ok", true));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
