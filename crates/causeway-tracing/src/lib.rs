//! Causal tracing crate
//!
//! Provides synchronous, zero-allocation span and event recording for
//! multi-threaded applications, with background assembly of the recorded
//! stream into fully hydrated records.
//!
//! Contrary to tracing crates that hand every event to a subscriber in the
//! calling thread, `causeway_tracing` writes a fixed-size, cache-line-aligned
//! tracelet into a bounded lock-free ring and returns immediately. A single
//! background worker drains the ring, maintains the set of open spans,
//! resolves implicit causal links by walking ancestor spans, and emits
//! immutable [`records::AssembledRecord`]s to a chain of sinks.
//!
//! # Examples
//! ```
//! use causeway_tracing::prelude::*;
//!
//! // Initialize tracing with a null sink; see the `sink` module for the
//! // processor contract real exporters implement.
//! let _tracing_guard = TracingSystemGuard::new(
//!     TracingConfig::default(),
//!     vec![Box::new(NullRecordSink {})],
//! )
//! .unwrap();
//!
//! // Create a span scope, completed when the scope is dropped.
//! // Behind the scenes this uses a thread local storage.
//! span_scope!("main");
//!
//! // Events may carry attributes and explicit causal links.
//! let setup_done = trace_event!("setup_done", attr("ok", true));
//! trace_event!("worker_started", caused_by(setup_done));
//! ```

// crate-specific lint exceptions:
#![allow(unsafe_code, clippy::missing_errors_doc)]

/// A unified identifier for all trace entities, dispensed from one
/// process-wide monotonic counter. Zero is the reserved invalid value and
/// identifiers are never recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Id(pub u64);

impl Id {
    pub const INVALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn valid(self) -> Option<Self> {
        if self.is_valid() {
            Some(self)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The pair of identifiers a span hands to its descendants.
///
/// Carrying the trace identifier next to the span identifier is what lets a
/// child inherit its parent's trace instead of aliasing the parent's span id
/// into the trace id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanContext {
    pub trace_id: Id,
    pub span_id: Id,
}

impl SpanContext {
    pub const INVALID: Self = Self {
        trace_id: Id::INVALID,
        span_id: Id::INVALID,
    };

    /// A context is usable as a parent when it names a span.
    pub fn is_valid(self) -> bool {
        self.span_id.is_valid()
    }
}

pub mod attrs;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod guards;
pub mod records;
pub mod ring;
pub mod sink;
pub mod spans;
pub mod strings;
pub mod time;
pub mod tracelet;

mod assembly;
mod counters;

#[macro_use]
mod macros;

pub use counters::TracingStats;

pub mod prelude {
    pub use crate::attrs::{attr, caused_by, AttrValue, Attribute, CallArg, CausedBy};
    pub use crate::config::TracingConfig;
    pub use crate::guards::{init_tracing, shutdown_tracing, TracingSystemGuard};
    pub use crate::records::{AssembledRecord, RecordKind, RecordValue};
    pub use crate::sink::{BoxedRecordSink, NullRecordSink, RecordSink};
    pub use crate::spans::SpanGuard;
    pub use crate::{span_scope, start_span, trace_event};
    pub use crate::{Id, SpanContext, TracingStats};
    pub use causeway_tracing_proc_macros::*;
}

pub use prelude::*;
