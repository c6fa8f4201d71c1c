//! Scoped span ownership.

use std::marker::PhantomData;

use crate::context;
use crate::dispatch;
use crate::{Id, SpanContext};

/// Owning handle for an open span.
///
/// Construction installs the span as the thread's ambient context; ending it
/// (explicitly or on drop, including during unwinding) emits the span-end
/// record and restores the previous context. `end` is idempotent, and a
/// moved-from guard never emits because the move leaves nothing behind to
/// drop.
#[derive(Debug)]
pub struct SpanGuard {
    ctx: SpanContext,
    prev: SpanContext,
    ended: bool,
    // Guards manage thread-local state and must stay on their thread.
    _not_send: PhantomData<*mut u8>,
}

impl SpanGuard {
    pub(crate) fn enter(ctx: SpanContext) -> Self {
        let prev = context::current();
        context::set_current(ctx);
        Self {
            ctx,
            prev,
            ended: false,
            _not_send: PhantomData,
        }
    }

    /// The span's own identifier, valid in every state. Invalid when the
    /// tracer was not running at construction.
    pub fn id(&self) -> Id {
        self.ctx.span_id
    }

    pub fn trace_id(&self) -> Id {
        self.ctx.trace_id
    }

    /// The pair to hand to another thread that wants to parent under this
    /// span.
    pub fn span_context(&self) -> SpanContext {
        self.ctx
    }

    /// Ends the span: restores the previous ambient context and emits the
    /// span-end record. Subsequent calls do nothing.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        context::set_current(self.prev);
        if self.ctx.span_id.is_valid() {
            dispatch::end_span(self.ctx);
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_guards_restore_ambient_context_in_lifo_order() {
        // No dispatch is installed here; guards manage the ambient context
        // regardless of whether records are emitted.
        std::thread::spawn(|| {
            assert_eq!(context::current(), SpanContext::INVALID);
            let outer_ctx = SpanContext {
                trace_id: Id(1),
                span_id: Id(1),
            };
            let inner_ctx = SpanContext {
                trace_id: Id(1),
                span_id: Id(2),
            };
            {
                let _outer = SpanGuard::enter(outer_ctx);
                assert_eq!(context::current(), outer_ctx);
                {
                    let _inner = SpanGuard::enter(inner_ctx);
                    assert_eq!(context::current(), inner_ctx);
                }
                assert_eq!(context::current(), outer_ctx);
            }
            assert_eq!(context::current(), SpanContext::INVALID);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn end_is_idempotent() {
        std::thread::spawn(|| {
            let ctx = SpanContext {
                trace_id: Id(5),
                span_id: Id(5),
            };
            let mut guard = SpanGuard::enter(ctx);
            assert_eq!(guard.id(), Id(5));
            guard.end();
            assert_eq!(context::current(), SpanContext::INVALID);
            guard.end();
            assert_eq!(context::current(), SpanContext::INVALID);
            // The identifier survives the span's end.
            assert_eq!(guard.id(), Id(5));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn moving_a_guard_transfers_the_active_state() {
        std::thread::spawn(|| {
            let ctx = SpanContext {
                trace_id: Id(9),
                span_id: Id(9),
            };
            let guard = SpanGuard::enter(ctx);
            let moved = guard;
            assert_eq!(moved.id(), Id(9));
            assert_eq!(context::current(), ctx);
            drop(moved);
            assert_eq!(context::current(), SpanContext::INVALID);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn abandoned_guards_unwind_the_whole_stack() {
        std::thread::spawn(|| {
            let mut guards = Vec::new();
            for i in 1..=100u64 {
                guards.push(SpanGuard::enter(SpanContext {
                    trace_id: Id(1),
                    span_id: Id(i),
                }));
            }
            while let Some(guard) = guards.pop() {
                drop(guard);
            }
            assert_eq!(context::current(), SpanContext::INVALID);
        })
        .join()
        .unwrap();
    }
}
