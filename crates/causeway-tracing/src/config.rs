use std::time::Duration;

use crate::time::monotonic_clock;

/// Function producing monotonic nanosecond timestamps for tracelets.
pub type ClockFn = fn() -> u64;

/// Tunables for the tracing system. The inline attribute capacity is the
/// compile-time constant [`crate::attrs::MAX_ATTRIBUTES_PER_TRACELET`].
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Slot count of the tracelet ring, rounded up to a power of two.
    pub ring_capacity: usize,
    /// How long the assembly worker sleeps when the ring is empty.
    pub worker_idle_sleep: Duration,
    /// Clock source for tracelet timestamps.
    pub clock: ClockFn,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 8192,
            worker_idle_sleep: Duration::from_millis(1),
            clock: monotonic_clock,
        }
    }
}
