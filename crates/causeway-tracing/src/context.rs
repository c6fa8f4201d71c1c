//! Per-thread ambient span context.
//!
//! Holds the current span and trace identifiers consulted by the recording
//! macros. Span guards are the only writers during normal operation; a
//! cross-process propagator may seed a fresh thread through [`adopt`].

use std::cell::Cell;

use crate::SpanContext;

thread_local! {
    static CURRENT: Cell<SpanContext> = Cell::new(SpanContext::INVALID);
}

/// The calling thread's current span and trace identifiers.
pub fn current() -> SpanContext {
    CURRENT.with(Cell::get)
}

pub(crate) fn set_current(ctx: SpanContext) {
    CURRENT.with(|current| current.set(ctx));
}

/// Installs an externally-derived context on the calling thread, e.g. one
/// extracted from a transport header or handed over from a parent thread.
/// Spans started afterwards parent under it and inherit its trace id.
pub fn adopt(ctx: SpanContext) {
    set_current(ctx);
}
