//! Lock-free single-producer single-consumer event queue.
//!
//! Backed by a power-of-two array of slots with independent masked read and
//! write cursors. One slot is always left empty so a full queue can be told
//! apart from an empty one: capacity `N` holds at most `N - 1` live items.
//! When the queue is full, `try_push` refuses the new item; the producer
//! never overwrites a slot the consumer has not read yet.
//!
//! The producer and consumer halves are distinct owning types without
//! `Clone`, so the one-writer/one-reader discipline holds by construction.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct RingShared<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Next slot the producer will fill. Advanced only by the producer.
    write: AtomicUsize,
    /// Next slot the consumer will take. Advanced only by the consumer.
    read: AtomicUsize,
}

// Safety: each slot is touched by at most one thread at a time. The producer
// writes a slot strictly before publishing it via `write` (Release), and the
// consumer reads `write` with Acquire before touching the slot; the symmetric
// argument covers slot reuse through `read`.
unsafe impl<T: Send> Send for RingShared<T> {}
unsafe impl<T: Send> Sync for RingShared<T> {}

impl<T> Drop for RingShared<T> {
    fn drop(&mut self) {
        // Unconsumed items still own their payloads.
        let mut r = self.read.load(Ordering::Relaxed);
        let w = self.write.load(Ordering::Relaxed);
        while r != w {
            unsafe { (*self.slots[r].get()).assume_init_drop() };
            r = (r + 1) & self.mask;
        }
    }
}

/// Writer half. Owned by exactly one thread.
pub struct RingProducer<T> {
    shared: Arc<RingShared<T>>,
}

/// Reader half. Owned by exactly one thread.
pub struct RingConsumer<T> {
    shared: Arc<RingShared<T>>,
}

/// Create a queue with `capacity` slots (`capacity - 1` usable).
/// `capacity` must be a power of two greater than one.
pub fn ring<T>(capacity: usize) -> (RingProducer<T>, RingConsumer<T>) {
    assert!(
        capacity.is_power_of_two() && capacity > 1,
        "ring capacity must be a power of two > 1"
    );
    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();
    let shared = Arc::new(RingShared {
        slots,
        mask: capacity - 1,
        write: AtomicUsize::new(0),
        read: AtomicUsize::new(0),
    });
    (
        RingProducer {
            shared: Arc::clone(&shared),
        },
        RingConsumer { shared },
    )
}

impl<T> RingProducer<T> {
    /// Queue one item. Returns `false` (and drops `item`) when the queue is
    /// full. Never blocks, never allocates.
    pub fn try_push(&mut self, item: T) -> bool {
        let shared = &*self.shared;
        let w = shared.write.load(Ordering::Relaxed);
        let next = (w + 1) & shared.mask;
        if next == shared.read.load(Ordering::Acquire) {
            return false;
        }
        unsafe { (*shared.slots[w].get()).write(item) };
        shared.write.store(next, Ordering::Release);
        true
    }
}

impl<T> RingConsumer<T> {
    /// Take the oldest queued item, if any. Never blocks, never allocates.
    pub fn try_pop(&mut self) -> Option<T> {
        let shared = &*self.shared;
        let r = shared.read.load(Ordering::Relaxed);
        if r == shared.write.load(Ordering::Acquire) {
            return None;
        }
        let item = unsafe { (*shared.slots[r].get()).assume_init_read() };
        shared.read.store((r + 1) & shared.mask, Ordering::Release);
        Some(item)
    }

    /// Pop until empty, applying `apply` to each item in FIFO order.
    /// Returns the number of items drained.
    pub fn drain_all(&mut self, mut apply: impl FnMut(T)) -> usize {
        let mut n = 0;
        while let Some(item) = self.try_pop() {
            apply(item);
            n += 1;
        }
        n
    }

    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        let w = shared.write.load(Ordering::Acquire);
        let r = shared.read.load(Ordering::Relaxed);
        w.wrapping_sub(r) & shared.mask
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
