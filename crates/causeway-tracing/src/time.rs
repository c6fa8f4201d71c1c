use std::time::Instant;

use once_cell::sync::Lazy;

static PROCESS_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Default clock source: monotonic nanoseconds since the first observation
/// in this process. Timestamps from different threads are individually
/// monotonic but carry no cross-thread ordering guarantee.
pub fn monotonic_clock() -> u64 {
    PROCESS_EPOCH.elapsed().as_nanos() as u64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let a = monotonic_clock();
        let b = monotonic_clock();
        assert!(b >= a);
    }
}
