//! Bounded lock-free multi-producer single-consumer ring.
//!
//! Slot assignment and data visibility are decoupled: producers serialize on
//! a tail CAS to reserve a slot, construct the value in place, then publish
//! it through a per-slot ready flag. The consumer drains strictly in
//! reservation order, so a producer stalled between its CAS and its publish
//! gates consumption of every later slot until its flag flips. That keeps
//! delivery FIFO by reservation and the consumer loop free of reordering
//! logic.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::errors::{Error, Result};

/// Requested capacities are rounded up to a power of two, with a floor of 2.
fn effective_capacity(requested: usize) -> usize {
    requested.next_power_of_two().max(2)
}

struct Slot<T> {
    ready: AtomicBool,
    value: UnsafeCell<MaybeUninit<T>>,
}

struct RingShared<T> {
    /// Advanced only by the consumer.
    head: CachePadded<AtomicUsize>,
    /// Contended by producers through a CAS.
    tail: CachePadded<AtomicUsize>,
    mask: usize,
    capacity: usize,
    slots: Box<[Slot<T>]>,
}

// The slots are plain storage; all cross-thread hand-off goes through the
// ready flags and the head/tail counters.
unsafe impl<T: Send> Send for RingShared<T> {}
unsafe impl<T: Send> Sync for RingShared<T> {}

impl<T> Drop for RingShared<T> {
    fn drop(&mut self) {
        // Published-but-unpopped values are dropped in head-to-tail order.
        // A slot reserved but never published (flag still false) holds no
        // initialized value and is skipped.
        let tail = self.tail.load(Ordering::Relaxed);
        let mut index = self.head.load(Ordering::Relaxed);
        while index != tail {
            let slot = &self.slots[index & self.mask];
            if slot.ready.load(Ordering::Relaxed) {
                unsafe { (*slot.value.get()).assume_init_drop() };
            }
            index = index.wrapping_add(1);
        }
    }
}

/// Producer half. Cloneable and shareable across any number of threads.
pub struct RingProducer<T> {
    shared: Arc<RingShared<T>>,
}

impl<T> Clone for RingProducer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Consumer half. Exclusive: popping takes `&mut self`.
pub struct RingConsumer<T> {
    shared: Arc<RingShared<T>>,
}

/// Creates a ring with `max(2, capacity.next_power_of_two())` slots.
/// A zero capacity is rejected.
pub fn bounded<T>(capacity: usize) -> Result<(RingProducer<T>, RingConsumer<T>)> {
    if capacity == 0 {
        return Err(Error::InvalidRingCapacity);
    }
    let capacity = effective_capacity(capacity);
    let slots = (0..capacity)
        .map(|_| Slot {
            ready: AtomicBool::new(false),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        })
        .collect();
    let shared = Arc::new(RingShared {
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
        mask: capacity - 1,
        capacity,
        slots,
    });
    Ok((
        RingProducer {
            shared: Arc::clone(&shared),
        },
        RingConsumer { shared },
    ))
}

impl<T> RingProducer<T> {
    /// Attempts to claim the next slot and move `value` into it.
    ///
    /// Returns the value back when the ring is full so the caller can count
    /// the drop or retry. Never blocks; the CAS loop is wait-free per retry.
    pub fn try_push(&self, value: T) -> std::result::Result<(), T> {
        let shared = &*self.shared;
        let mut tail = shared.tail.load(Ordering::Relaxed);
        loop {
            // Pairs with the consumer's release store on head: once the
            // space check passes, the previous occupant of the claimed slot
            // has been fully moved out.
            let head = shared.head.load(Ordering::Acquire);
            if tail.wrapping_sub(head) >= shared.capacity {
                return Err(value);
            }
            match shared.tail.compare_exchange_weak(
                tail,
                tail.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => tail = observed,
            }
        }
        let slot = &shared.slots[tail & shared.mask];
        unsafe { (*slot.value.get()).write(value) };
        slot.ready.store(true, Ordering::Release);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl<T> RingConsumer<T> {
    /// Moves out the record at the head, if one has been published.
    ///
    /// Returns `None` both when the ring is empty and when the head slot is
    /// reserved but its producer has not published yet.
    pub fn try_pop(&mut self) -> Option<T> {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let slot = &shared.slots[head & shared.mask];
        if !slot.ready.load(Ordering::Acquire) {
            return None;
        }
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.ready.store(false, Ordering::Relaxed);
        shared.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}
