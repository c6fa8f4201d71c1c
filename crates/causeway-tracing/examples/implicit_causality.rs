//! Demonstrates implicit causality: an event with no explicit cause picks up
//! the nearest ancestor span's cause.
//!
//! Run with: cargo run --example implicit_causality

use std::sync::Arc;

use causeway_tracing::prelude::*;
use causeway_tracing::{span_scope, start_span, trace_event};

struct PrintSink {}

impl RecordSink for PrintSink {
    fn on_record(&self, record: Arc<AssembledRecord>) {
        let kind = match record.kind {
            RecordKind::Span => "SPAN",
            RecordKind::Event => "EVENT",
            RecordKind::LeakedSpan => "LEAKED",
        };
        println!(
            "[{kind}] '{}' trace={} id={} parent={:?} cause={:?} attrs={:?}",
            record.name,
            record.trace_id,
            record.id,
            record.parent_id,
            record.cause_id,
            record.attributes,
        );
    }
    fn force_flush(&self) {}
    fn shutdown(&self) {}
}

#[span_fn]
fn finalize_batch() {
    trace_event!("batch_finalized");
}

fn implicit_causality_example() {
    // Manually create the initial "cause" span.
    let mut initial_cause_span = start_span!("initial_cause");
    let cause_id = initial_cause_span.id();
    initial_cause_span.end();

    // This parent span is explicitly caused by the first span.
    span_scope!("parent_with_cause", caused_by(cause_id), attr("parent_attr", 100));

    {
        // This nested child span has no explicit cause.
        span_scope!("nested_child_no_cause", attr("child_attr", "hello"));

        // This event also has no explicit cause. The assembly worker walks
        // up from "nested_child_no_cause" to "parent_with_cause" and finds
        // the original cause id.
        trace_event!("important_event", attr("status", "processing"));
    }

    finalize_batch();
} // Spans end via RAII.

fn main() {
    let _tracing_guard =
        TracingSystemGuard::new(TracingConfig::default(), vec![Box::new(PrintSink {})])
            .expect("tracing setup");

    implicit_causality_example();
}
