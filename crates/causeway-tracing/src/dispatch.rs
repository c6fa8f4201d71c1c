//! Process-global tracing dispatch.
//!
//! Owns the identifier counter, the tracelet ring, the interner, the
//! diagnostic counters and the shutdown flag. The free functions here are
//! the hot path used by the recording macros: they never block, never
//! allocate on success, and degrade to no-ops when the dispatch is absent or
//! shut down. The worst failure the hot path can see is a full ring, which
//! is counted and otherwise silent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};

use crate::assembly::AssemblyEngine;
use crate::attrs::{parse_call_args, Attribute, CallArg, MAX_ATTRIBUTES_PER_TRACELET};
use crate::config::{ClockFn, TracingConfig};
use crate::counters::{TracingCounters, TracingStats};
use crate::errors::{Error, Result};
use crate::ring::{self, RingProducer};
use crate::sink::BoxedRecordSink;
use crate::spans::SpanGuard;
use crate::strings::{fnv1a, StaticStringSource, StringInterner};
use crate::tracelet::{RecordType, Tracelet};
use crate::{Id, SpanContext};

static G_DISPATCH: RwLock<Option<Arc<Dispatch>>> = RwLock::new(None);

pub(crate) struct Dispatch {
    next_id: AtomicU64,
    producer: RingProducer<Tracelet>,
    pub(crate) interner: Arc<StringInterner>,
    pub(crate) counters: Arc<TracingCounters>,
    shutdown: Arc<AtomicBool>,
    clock: ClockFn,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatch {
    pub(crate) fn new(
        config: TracingConfig,
        sinks: Vec<BoxedRecordSink>,
    ) -> Result<(Arc<Self>, AssemblyEngine)> {
        let (producer, consumer) = ring::bounded(config.ring_capacity)?;
        let interner = Arc::new(StringInterner::new());
        let counters = Arc::new(TracingCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let dispatch = Arc::new(Self {
            next_id: AtomicU64::new(1),
            producer,
            interner: Arc::clone(&interner),
            counters: Arc::clone(&counters),
            shutdown: Arc::clone(&shutdown),
            clock: config.clock,
            worker: Mutex::new(None),
        });
        let engine = AssemblyEngine::new(
            consumer,
            interner,
            counters,
            shutdown,
            BoxedRecordSink::from(sinks),
            config.worker_idle_sleep,
            config.clock,
        );
        Ok((dispatch, engine))
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn dispense_id(&self) -> Id {
        Id(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn enqueue(&self, tracelet: Tracelet) {
        if self.producer.try_push(tracelet).is_err() {
            self.counters.note_dropped_tracelet();
        }
    }

    /// Dispenses a span id, resolves the trace id, and publishes the
    /// span-start record. A root span (invalid parent) starts a new trace
    /// under its own id; any other span inherits its parent's trace id.
    pub(crate) fn emit_span_start(
        &self,
        name_hash: u64,
        parent: SpanContext,
        cause: Id,
        attrs: &[Attribute; MAX_ATTRIBUTES_PER_TRACELET],
        num_attributes: u8,
    ) -> SpanContext {
        let span_id = self.dispense_id();
        let trace_id = if parent.is_valid() {
            parent.trace_id
        } else {
            span_id
        };
        self.enqueue(Tracelet::with_attributes(
            (self.clock)(),
            trace_id,
            span_id,
            parent.span_id,
            cause,
            name_hash,
            RecordType::SpanStart,
            attrs,
            num_attributes,
        ));
        SpanContext { trace_id, span_id }
    }

    pub(crate) fn emit_span_end(&self, ctx: SpanContext) {
        self.enqueue(Tracelet::without_attributes(
            (self.clock)(),
            ctx.trace_id,
            ctx.span_id,
            Id::INVALID,
            Id::INVALID,
            0,
            RecordType::SpanEnd,
        ));
    }

    /// Events carry their own identifier so later records can cite them as
    /// a cause. An event outside any span starts a trace of its own.
    pub(crate) fn emit_event(
        &self,
        name_hash: u64,
        parent: SpanContext,
        cause: Id,
        attrs: &[Attribute; MAX_ATTRIBUTES_PER_TRACELET],
        num_attributes: u8,
    ) -> Id {
        let event_id = self.dispense_id();
        let trace_id = if parent.is_valid() {
            parent.trace_id
        } else {
            event_id
        };
        self.enqueue(Tracelet::with_attributes(
            (self.clock)(),
            trace_id,
            event_id,
            parent.span_id,
            cause,
            name_hash,
            RecordType::Event,
            attrs,
            num_attributes,
        ));
        event_id
    }

    fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

fn current_dispatch() -> Option<Arc<Dispatch>> {
    G_DISPATCH.read().clone()
}

fn live_dispatch() -> Option<Arc<Dispatch>> {
    current_dispatch().filter(|dispatch| !dispatch.is_shut_down())
}

/// Builds the dispatch and spawns the assembly worker. Fails if a live
/// dispatch already exists; a fresh setup after a completed shutdown
/// replaces the old one.
pub(crate) fn init_dispatch(config: TracingConfig, sinks: Vec<BoxedRecordSink>) -> Result<()> {
    let mut slot = G_DISPATCH.write();
    if let Some(existing) = slot.as_ref() {
        if !existing.is_shut_down() {
            return Err(Error::AlreadyInitialized);
        }
    }
    let (dispatch, engine) = Dispatch::new(config, sinks)?;
    let handle = thread::Builder::new()
        .name("causeway-assembly".into())
        .spawn(move || engine.run())?;
    *dispatch.worker.lock() = Some(handle);
    *slot = Some(dispatch);
    Ok(())
}

/// Signals the assembly worker and joins it. The worker drains the ring,
/// emits leaked-open records, and flushes and shuts down the sink chain
/// before exiting. Hot-path calls made afterwards are no-ops.
pub(crate) fn shutdown_dispatch() {
    let dispatch = current_dispatch();
    if let Some(dispatch) = dispatch {
        dispatch.shutdown();
    }
}

/// Starts a span named by a call-site literal. Returns an inert guard (which
/// still maintains the ambient context) when tracing is not running.
pub fn start_span(
    name: &'static StaticStringSource,
    parent: SpanContext,
    args: &[CallArg],
) -> SpanGuard {
    match live_dispatch() {
        Some(dispatch) => {
            dispatch.interner.register_static(name.hash, name.text);
            let (cause, attrs, count) = parse_call_args(args, &dispatch.counters);
            let ctx = dispatch.emit_span_start(name.hash, parent, cause, &attrs, count);
            SpanGuard::enter(ctx)
        }
        None => SpanGuard::enter(SpanContext::INVALID),
    }
}

/// Starts a span with a runtime-computed name.
pub fn start_span_dynamic(name: &str, parent: SpanContext, args: &[CallArg]) -> SpanGuard {
    match live_dispatch() {
        Some(dispatch) => {
            let name_hash = dispatch.interner.intern(name);
            let (cause, attrs, count) = parse_call_args(args, &dispatch.counters);
            let ctx = dispatch.emit_span_start(name_hash, parent, cause, &attrs, count);
            SpanGuard::enter(ctx)
        }
        None => SpanGuard::enter(SpanContext::INVALID),
    }
}

/// Records an event named by a call-site literal, returning its identifier
/// for use as a cause. Invalid when tracing is not running.
pub fn record_event(
    name: &'static StaticStringSource,
    parent: SpanContext,
    args: &[CallArg],
) -> Id {
    match live_dispatch() {
        Some(dispatch) => {
            dispatch.interner.register_static(name.hash, name.text);
            let (cause, attrs, count) = parse_call_args(args, &dispatch.counters);
            dispatch.emit_event(name.hash, parent, cause, &attrs, count)
        }
        None => Id::INVALID,
    }
}

/// Records an event with a runtime-computed name.
pub fn record_event_dynamic(name: &str, parent: SpanContext, args: &[CallArg]) -> Id {
    match live_dispatch() {
        Some(dispatch) => {
            let name_hash = dispatch.interner.intern(name);
            let (cause, attrs, count) = parse_call_args(args, &dispatch.counters);
            dispatch.emit_event(name_hash, parent, cause, &attrs, count)
        }
        None => Id::INVALID,
    }
}

/// Called by span guards. Tolerates a missing dispatch and a full ring.
pub(crate) fn end_span(ctx: SpanContext) {
    if let Some(dispatch) = live_dispatch() {
        dispatch.emit_span_end(ctx);
    }
}

/// Interns a string through the live dispatch, falling back to a bare hash
/// when tracing is not running.
pub fn intern_string(text: &str) -> u64 {
    match current_dispatch() {
        Some(dispatch) => dispatch.interner.intern(text),
        None => fnv1a(text.as_bytes()),
    }
}

/// Snapshot of the diagnostic counters. Counters survive shutdown; an empty
/// snapshot is returned when setup never ran.
pub fn stats() -> TracingStats {
    current_dispatch().map_or_else(TracingStats::default, |dispatch| dispatch.counters.snapshot())
}
