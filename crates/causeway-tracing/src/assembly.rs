//! The background assembly worker.
//!
//! Drains tracelets from the ring, maintains the index of open spans,
//! resolves implicit causality by walking ancestor spans, and emits
//! assembled records to the sink chain. The index is touched only by this
//! worker, so it needs no locking; the interner is shared with the hot path
//! under its own mutex.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::attrs::{AttrValue, Attribute};
use crate::config::ClockFn;
use crate::counters::TracingCounters;
use crate::records::{AssembledRecord, RecordKind, RecordValue};
use crate::ring::RingConsumer;
use crate::sink::BoxedRecordSink;
use crate::strings::StringInterner;
use crate::tracelet::{RecordType, Tracelet};
use crate::Id;

struct OpenSpan {
    trace_id: Id,
    name_hash: u64,
    parent: Id,
    cause: Id,
    start_ns: u64,
    attributes: Vec<Attribute>,
}

pub(crate) struct AssemblyEngine {
    consumer: RingConsumer<Tracelet>,
    interner: Arc<StringInterner>,
    counters: Arc<TracingCounters>,
    shutdown: Arc<AtomicBool>,
    sink: BoxedRecordSink,
    idle_sleep: Duration,
    clock: ClockFn,
    open_spans: HashMap<u64, OpenSpan>,
}

impl AssemblyEngine {
    pub(crate) fn new(
        consumer: RingConsumer<Tracelet>,
        interner: Arc<StringInterner>,
        counters: Arc<TracingCounters>,
        shutdown: Arc<AtomicBool>,
        sink: BoxedRecordSink,
        idle_sleep: Duration,
        clock: ClockFn,
    ) -> Self {
        Self {
            consumer,
            interner,
            counters,
            shutdown,
            sink,
            idle_sleep,
            clock,
            open_spans: HashMap::new(),
        }
    }

    pub(crate) fn run(mut self) {
        loop {
            if !self.step() {
                // The shutdown flag is honored only once the ring is empty,
                // so everything enqueued before the flag flipped is still
                // assembled.
                if self.shutdown.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(self.idle_sleep);
            }
        }
        self.finish();
    }

    /// Drains and processes one tracelet. Returns false when none is
    /// available yet.
    pub(crate) fn step(&mut self) -> bool {
        match self.consumer.try_pop() {
            Some(tracelet) => {
                self.process(tracelet);
                true
            }
            None => false,
        }
    }

    /// Emits remaining open spans as leaked, then flushes and shuts the sink
    /// chain down.
    pub(crate) fn finish(&mut self) {
        self.drain_leaked();
        let sink = &self.sink;
        if panic::catch_unwind(AssertUnwindSafe(|| sink.force_flush())).is_err() {
            self.counters.note_sink_panic();
        }
        if panic::catch_unwind(AssertUnwindSafe(|| sink.shutdown())).is_err() {
            self.counters.note_sink_panic();
        }
    }

    fn process(&mut self, tracelet: Tracelet) {
        match tracelet.record_type {
            RecordType::SpanStart => {
                self.open_spans.insert(
                    tracelet.span_id.0,
                    OpenSpan {
                        trace_id: tracelet.trace_id,
                        name_hash: tracelet.name_hash,
                        parent: tracelet.parent_span_id,
                        cause: tracelet.cause_id,
                        start_ns: tracelet.timestamp,
                        attributes: tracelet.attributes().to_vec(),
                    },
                );
            }
            RecordType::SpanEnd => match self.open_spans.remove(&tracelet.span_id.0) {
                Some(open) => {
                    let record = AssembledRecord {
                        name: self.resolve(open.name_hash),
                        kind: RecordKind::Span,
                        trace_id: tracelet.trace_id,
                        id: tracelet.span_id,
                        parent_id: open.parent.valid(),
                        cause_id: open.cause.valid(),
                        begin_ns: open.start_ns,
                        end_ns: tracelet.timestamp,
                        attributes: self.materialize(&open.attributes),
                    };
                    self.emit(record);
                }
                None => self.counters.note_orphaned_span_end(),
            },
            RecordType::Event => {
                let cause = self.effective_cause(tracelet.cause_id, tracelet.parent_span_id);
                let record = AssembledRecord {
                    name: self.resolve(tracelet.name_hash),
                    kind: RecordKind::Event,
                    trace_id: tracelet.trace_id,
                    id: tracelet.span_id,
                    parent_id: tracelet.parent_span_id.valid(),
                    cause_id: cause.valid(),
                    begin_ns: tracelet.timestamp,
                    end_ns: tracelet.timestamp,
                    attributes: self.materialize(tracelet.attributes()),
                };
                self.emit(record);
            }
        }
    }

    /// An explicit cause is used verbatim. Otherwise the first ancestor in
    /// the open-span index carrying a cause contributes it. The walk is
    /// bounded by the open-span depth and stops at an invalid parent or a
    /// span that is no longer open; closed spans keep no history here.
    fn effective_cause(&self, explicit: Id, parent: Id) -> Id {
        if explicit.is_valid() {
            return explicit;
        }
        let mut current = parent;
        while current.is_valid() {
            match self.open_spans.get(&current.0) {
                Some(ancestor) => {
                    if ancestor.cause.is_valid() {
                        return ancestor.cause;
                    }
                    current = ancestor.parent;
                }
                None => break,
            }
        }
        Id::INVALID
    }

    fn drain_leaked(&mut self) {
        if self.open_spans.is_empty() {
            return;
        }
        let mut leaked: Vec<(u64, OpenSpan)> = self.open_spans.drain().collect();
        leaked.sort_by_key(|(span_id, _)| *span_id);
        self.counters.note_leaked_open_spans(leaked.len() as u64);
        let now = (self.clock)();
        for (span_id, open) in leaked {
            let record = AssembledRecord {
                name: self.resolve(open.name_hash),
                kind: RecordKind::LeakedSpan,
                trace_id: open.trace_id,
                id: Id(span_id),
                parent_id: open.parent.valid(),
                cause_id: open.cause.valid(),
                begin_ns: open.start_ns,
                end_ns: now,
                attributes: self.materialize(&open.attributes),
            };
            self.emit(record);
        }
    }

    fn emit(&self, record: AssembledRecord) {
        let record = Arc::new(record);
        let sink = &self.sink;
        let delivered =
            panic::catch_unwind(AssertUnwindSafe(|| sink.on_record(Arc::clone(&record))));
        if delivered.is_err() {
            self.counters.note_sink_panic();
        }
    }

    fn resolve(&self, hash: u64) -> String {
        self.interner
            .resolve(hash)
            .unwrap_or_else(|| String::from("???"))
    }

    fn materialize(&self, attributes: &[Attribute]) -> HashMap<String, RecordValue> {
        attributes
            .iter()
            .map(|attribute| {
                let key = self.resolve(attribute.key);
                let value = match attribute.value {
                    AttrValue::Bool(value) => RecordValue::Bool(value),
                    AttrValue::I64(value) => RecordValue::I64(value),
                    AttrValue::F64(value) => RecordValue::F64(value),
                    AttrValue::Str(hash) => RecordValue::Str(self.resolve(hash)),
                };
                (key, value)
            })
            .collect()
    }
}
