//! Downstream consumers of assembled records.
//!
//! Records are delivered synchronously on the assembly worker thread; a sink
//! that performs blocking I/O must hand the work to its own thread.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::records::AssembledRecord;

pub type BoxedRecordSink = Box<dyn RecordSink>;

pub trait RecordSink: Send {
    /// Consumes one immutable assembled record.
    fn on_record(&self, record: Arc<AssembledRecord>);
    /// Surfaces any internally buffered records.
    fn force_flush(&self);
    /// Releases resources. Called once, after the final flush.
    fn shutdown(&self);
}

pub struct NullRecordSink {}

impl RecordSink for NullRecordSink {
    fn on_record(&self, _: Arc<AssembledRecord>) {}
    fn force_flush(&self) {}
    fn shutdown(&self) {}
}

/// Duplicates every record to an ordered list of child sinks.
pub struct CompositeSink {
    sinks: Vec<BoxedRecordSink>,
}

impl CompositeSink {
    pub fn new(sinks: Vec<BoxedRecordSink>) -> Self {
        Self { sinks }
    }
}

impl From<Vec<BoxedRecordSink>> for CompositeSink {
    fn from(sinks: Vec<BoxedRecordSink>) -> Self {
        Self::new(sinks)
    }
}

impl From<Vec<BoxedRecordSink>> for BoxedRecordSink {
    fn from(mut sinks: Vec<BoxedRecordSink>) -> Self {
        if sinks.len() == 1 {
            sinks.pop().unwrap()
        } else {
            Box::new(CompositeSink::from(sinks))
        }
    }
}

impl RecordSink for CompositeSink {
    fn on_record(&self, record: Arc<AssembledRecord>) {
        self.sinks
            .iter()
            .for_each(|sink| sink.on_record(Arc::clone(&record)));
    }

    fn force_flush(&self) {
        self.sinks.iter().for_each(|sink| sink.force_flush());
    }

    fn shutdown(&self) {
        self.sinks.iter().for_each(|sink| sink.shutdown());
    }
}

/// Receives the batches a [`BatchingSink`] accumulates.
pub trait BatchSink: Send {
    fn on_batch(&self, batch: &[Arc<AssembledRecord>]);
    fn shutdown(&self);
}

struct BatchState {
    buffer: Vec<Arc<AssembledRecord>>,
    opened_at_ms: i64,
}

/// Accumulates records up to a count or age budget, then forwards the whole
/// batch. The age check is amortized: it runs when a record arrives or on an
/// explicit flush, never on a timer of its own.
pub struct BatchingSink {
    inner: Box<dyn BatchSink>,
    max_records: usize,
    max_age_ms: i64,
    state: Mutex<BatchState>,
}

impl BatchingSink {
    pub fn new(
        max_records: usize,
        max_age: std::time::Duration,
        inner: Box<dyn BatchSink>,
    ) -> Self {
        Self {
            inner,
            max_records: max_records.max(1),
            max_age_ms: max_age.as_millis() as i64,
            state: Mutex::new(BatchState {
                buffer: Vec::new(),
                opened_at_ms: Utc::now().timestamp_millis(),
            }),
        }
    }

    fn flush_locked(&self, state: &mut BatchState) {
        if state.buffer.is_empty() {
            return;
        }
        self.inner.on_batch(&state.buffer);
        state.buffer.clear();
    }
}

impl RecordSink for BatchingSink {
    fn on_record(&self, record: Arc<AssembledRecord>) {
        let now_ms = Utc::now().timestamp_millis();
        let mut state = self.state.lock();
        if state.buffer.is_empty() {
            state.opened_at_ms = now_ms;
        }
        state.buffer.push(record);
        if state.buffer.len() >= self.max_records
            || now_ms - state.opened_at_ms >= self.max_age_ms
        {
            self.flush_locked(&mut state);
        }
    }

    fn force_flush(&self) {
        self.flush_locked(&mut self.state.lock());
    }

    fn shutdown(&self) {
        self.force_flush();
        self.inner.shutdown();
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::records::{AssembledRecord, RecordKind};
    use crate::Id;

    fn record(id: u64) -> Arc<AssembledRecord> {
        Arc::new(AssembledRecord {
            name: format!("record-{id}"),
            kind: RecordKind::Event,
            trace_id: Id(id),
            id: Id(id),
            parent_id: None,
            cause_id: None,
            begin_ns: 0,
            end_ns: 0,
            attributes: HashMap::new(),
        })
    }

    #[derive(Default)]
    struct Collector {
        seen: Arc<Mutex<Vec<u64>>>,
        flushes: Arc<Mutex<usize>>,
    }

    impl RecordSink for Collector {
        fn on_record(&self, record: Arc<AssembledRecord>) {
            self.seen.lock().push(record.id.0);
        }
        fn force_flush(&self) {
            *self.flushes.lock() += 1;
        }
        fn shutdown(&self) {}
    }

    #[test]
    fn composite_fans_out_in_order() {
        let first = Collector::default();
        let second = Collector::default();
        let first_seen = Arc::clone(&first.seen);
        let second_seen = Arc::clone(&second.seen);
        let first_flushes = Arc::clone(&first.flushes);

        let composite = CompositeSink::new(vec![Box::new(first), Box::new(second)]);
        composite.on_record(record(1));
        composite.on_record(record(2));
        composite.force_flush();

        assert_eq!(*first_seen.lock(), vec![1, 2]);
        assert_eq!(*second_seen.lock(), vec![1, 2]);
        assert_eq!(*first_flushes.lock(), 1);
    }

    #[derive(Default)]
    struct BatchCollector {
        batches: Arc<Mutex<Vec<Vec<u64>>>>,
        shutdowns: Arc<Mutex<usize>>,
    }

    impl BatchSink for BatchCollector {
        fn on_batch(&self, batch: &[Arc<AssembledRecord>]) {
            self.batches
                .lock()
                .push(batch.iter().map(|record| record.id.0).collect());
        }
        fn shutdown(&self) {
            *self.shutdowns.lock() += 1;
        }
    }

    #[test]
    fn batching_flushes_on_count() {
        let collector = BatchCollector::default();
        let batches = Arc::clone(&collector.batches);

        let sink = BatchingSink::new(3, Duration::from_secs(3600), Box::new(collector));
        for i in 1..=7 {
            sink.on_record(record(i));
        }
        assert_eq!(*batches.lock(), vec![vec![1, 2, 3], vec![4, 5, 6]]);

        sink.force_flush();
        assert_eq!(
            *batches.lock(),
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]
        );
    }

    #[test]
    fn batching_flushes_on_age() {
        let collector = BatchCollector::default();
        let batches = Arc::clone(&collector.batches);

        let sink = BatchingSink::new(1000, Duration::from_millis(0), Box::new(collector));
        sink.on_record(record(1));
        // A zero age budget flushes on every delivery.
        assert_eq!(*batches.lock(), vec![vec![1]]);
    }

    #[test]
    fn batching_shutdown_flushes_then_forwards() {
        let collector = BatchCollector::default();
        let batches = Arc::clone(&collector.batches);
        let shutdowns = Arc::clone(&collector.shutdowns);

        let sink = BatchingSink::new(1000, Duration::from_secs(3600), Box::new(collector));
        sink.on_record(record(1));
        sink.on_record(record(2));
        sink.shutdown();

        assert_eq!(*batches.lock(), vec![vec![1, 2]]);
        assert_eq!(*shutdowns.lock(), 1);
    }

    #[test]
    fn empty_force_flush_emits_no_batch() {
        let collector = BatchCollector::default();
        let batches = Arc::clone(&collector.batches);
        let sink = BatchingSink::new(10, Duration::from_secs(3600), Box::new(collector));
        sink.force_flush();
        assert!(batches.lock().is_empty());
    }
}
