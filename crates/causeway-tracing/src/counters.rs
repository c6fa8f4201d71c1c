//! Diagnostic counters: observability of the observer.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct TracingCounters {
    dropped_tracelets: AtomicU64,
    orphaned_span_ends: AtomicU64,
    leaked_open_spans: AtomicU64,
    truncated_attributes: AtomicU64,
    sink_panics: AtomicU64,
}

impl TracingCounters {
    pub fn note_dropped_tracelet(&self) {
        self.dropped_tracelets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_orphaned_span_end(&self) {
        self.orphaned_span_ends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_leaked_open_spans(&self, count: u64) {
        self.leaked_open_spans.fetch_add(count, Ordering::Relaxed);
    }

    pub fn note_truncated_attributes(&self, count: u64) {
        self.truncated_attributes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn note_sink_panic(&self) {
        self.sink_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TracingStats {
        TracingStats {
            dropped_tracelets: self.dropped_tracelets.load(Ordering::Relaxed),
            orphaned_span_ends: self.orphaned_span_ends.load(Ordering::Relaxed),
            leaked_open_spans: self.leaked_open_spans.load(Ordering::Relaxed),
            truncated_attributes: self.truncated_attributes.load(Ordering::Relaxed),
            sink_panics: self.sink_panics.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of the diagnostic counters, readable through
/// [`crate::dispatch::stats`] even after shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingStats {
    /// Tracelets rejected because the ring was full.
    pub dropped_tracelets: u64,
    /// Span-end records that arrived with no matching open span.
    pub orphaned_span_ends: u64,
    /// Spans still open when the assembly worker shut down.
    pub leaked_open_spans: u64,
    /// Attributes dropped beyond the inline tracelet capacity.
    pub truncated_attributes: u64,
    /// Sink invocations that panicked and were suppressed.
    pub sink_panics: u64,
}
