//! Lock-free single-producer/single-consumer ring buffer.
//!
//! `N` must be a power of two; this is asserted at construction so index
//! wraparound can use a mask instead of a modulo. Head and tail are kept on
//! separate cache lines (`CachePadded`) so producer and consumer don't
//! false-share.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct SpscQueue<T, const N: usize> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>, // consumer-owned
    tail: CachePadded<AtomicUsize>, // producer-owned
}

// SAFETY: the ring enforces single-producer/single-consumer discipline via
// its API; `T: Send` is sufficient because only one thread ever touches a
// given slot at a time (producer writes then publishes via `tail`,
// consumer reads after observing the publish via `head`).
unsafe impl<T: Send, const N: usize> Send for SpscQueue<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}

impl<T, const N: usize> SpscQueue<T, N> {
    pub fn new() -> Self {
        assert!(N.is_power_of_two(), "SpscQueue capacity must be a power of two");
        let buf = (0..N)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buf,
            mask: N - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Producer-only. Returns `Err(value)` when the queue is full.
    #[inline]
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= N {
            return Err(value);
        }
        let slot = &self.buf[tail & self.mask];
        // SAFETY: this slot was vacated by the consumer (head has moved
        // past it, or it was never written) and no other producer exists.
        unsafe {
            (*slot.get()).write(value);
        }
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Consumer-only. Returns `None` when the queue is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let slot = &self.buf[head & self.mask];
        // SAFETY: tail > head means the producer has published this slot.
        let value = unsafe { (*slot.get()).assume_init_read() };
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscQueue<T, N> {
    fn drop(&mut self) {
        // Drain any remaining initialized elements so their destructors run.
        while self.try_pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_roundtrip() {
        let q = SpscQueue::<u32, 4>::new();
        assert!(q.try_push(1).is_ok());
        assert!(q.try_push(2).is_ok());
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn full_queue_rejects_push() {
        let q = SpscQueue::<u32, 2>::new();
        assert!(q.try_push(1).is_ok());
        assert!(q.try_push(2).is_ok());
        assert_eq!(q.try_push(3), Err(3));
    }

    #[test]
    #[should_panic]
    fn non_power_of_two_panics() {
        let _q = SpscQueue::<u32, 3>::new();
    }

    #[test]
    fn drops_remaining_elements() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct Counted(Arc<AtomicUsize>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(AtomicUsize::new(0));
        {
            let q = SpscQueue::<Counted, 4>::new();
            q.try_push(Counted(count.clone())).ok();
            q.try_push(Counted(count.clone())).ok();
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_spsc() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(SpscQueue::<u64, 1024>::new());
        let producer_q = q.clone();
        let producer = thread::spawn(move || {
            for i in 0..10_000u64 {
                while producer_q.try_push(i).is_err() {
                    std::hint::spin_loop();
                }
            }
        });

        let mut received = Vec::with_capacity(10_000);
        while received.len() < 10_000 {
            if let Some(v) = q.try_pop() {
                received.push(v);
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..10_000u64).collect::<Vec<_>>());
    }
}
