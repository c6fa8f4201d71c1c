use crate::config::TracingConfig;
use crate::dispatch::{init_dispatch, shutdown_dispatch};
use crate::errors::Result;
use crate::sink::BoxedRecordSink;

/// RAII owner of the process-wide tracing system: sets it up on
/// construction and shuts it down on drop.
pub struct TracingSystemGuard {}

impl TracingSystemGuard {
    pub fn new(config: TracingConfig, sinks: Vec<BoxedRecordSink>) -> Result<Self> {
        init_tracing(config, sinks)?;
        Ok(Self {})
    }
}

impl std::ops::Drop for TracingSystemGuard {
    fn drop(&mut self) {
        shutdown_tracing();
    }
}

/// Sets up the process-wide tracer: the ring, the interner, the id counter
/// and the assembly worker. Records flow to `sinks` in order.
pub fn init_tracing(config: TracingConfig, sinks: Vec<BoxedRecordSink>) -> Result<()> {
    init_dispatch(config, sinks)
}

/// Cooperative teardown: signals the assembly worker, which finishes
/// draining the ring, surfaces leaked spans, and shuts the sinks down; then
/// joins it. Recording calls made afterwards are no-ops.
pub fn shutdown_tracing() {
    shutdown_dispatch();
}
