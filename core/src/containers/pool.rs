//! Lock-free, fixed-capacity object pool.
//!
//! Generalizes the free-list-over-`ArrayQueue` pattern to a compile-time
//! capacity `N` and adds current/peak usage tracking so the stats thread
//! can report occupancy without touching the pool's hot path.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct PoolInner<T> {
    free: ArrayQueue<T>,
    capacity: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

/// A fixed-capacity pool of pre-allocated `T`s.
///
/// `allocate()` returns `None` when exhausted rather than growing; the
/// caller is expected to treat exhaustion as a rejectable error, not a
/// crash.
pub struct Pool<T: Default, const N: usize> {
    inner: Arc<PoolInner<T>>,
}

impl<T: Default, const N: usize> Pool<T, N> {
    pub fn new() -> Self {
        let free = ArrayQueue::new(N);
        for _ in 0..N {
            let _ = free.push(T::default());
        }
        Self {
            inner: Arc::new(PoolInner {
                free,
                capacity: N,
                in_use: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    #[inline(always)]
    pub fn allocate(&self) -> Option<PoolGuard<T, N>> {
        let obj = self.inner.free.pop()?;
        let in_use = self.inner.in_use.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.peak.fetch_max(in_use, Ordering::Relaxed);
        Some(PoolGuard {
            obj: Some(obj),
            pool: self.clone(),
        })
    }

    #[inline(always)]
    fn deallocate(&self, obj: T) {
        if self.inner.free.push(obj).is_ok() {
            self.inner.in_use.fetch_sub(1, Ordering::Relaxed);
        }
        // If the free-list is somehow full (double-release), drop the
        // object silently rather than corrupting the usage counter.
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn available(&self) -> usize {
        self.inner.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Relaxed)
    }

    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Relaxed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner.free.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            available: self.available(),
            peak: self.peak(),
        }
    }
}

impl<T: Default, const N: usize> Default for Pool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default, const N: usize> Clone for Pool<T, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// RAII handle returned by [`Pool::allocate`]. Dropping it returns the
/// object to the pool, so early returns on error paths never leak a slot.
pub struct PoolGuard<T: Default, const N: usize> {
    obj: Option<T>,
    pool: Pool<T, N>,
}

impl<T: Default, const N: usize> PoolGuard<T, N> {
    pub fn get(&self) -> &T {
        self.obj.as_ref().expect("PoolGuard used after take")
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.obj.as_mut().expect("PoolGuard used after take")
    }
}

impl<T: Default, const N: usize> std::ops::Deref for PoolGuard<T, N> {
    type Target = T;
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: Default, const N: usize> std::ops::DerefMut for PoolGuard<T, N> {
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut()
    }
}

impl<T: Default, const N: usize> Drop for PoolGuard<T, N> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.pool.deallocate(obj);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub capacity: usize,
    pub available: usize,
    pub peak: usize,
}

impl PoolStats {
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        1.0 - (self.available as f64 / self.capacity as f64)
    }

    pub fn is_near_exhaustion(&self) -> bool {
        self.utilization() > 0.9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_release() {
        let pool = Pool::<u64, 4>::new();
        assert_eq!(pool.available(), 4);
        let guard = pool.allocate().unwrap();
        assert_eq!(pool.available(), 3);
        drop(guard);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn exhaustion_returns_none_not_panic() {
        let pool = Pool::<u64, 2>::new();
        let _a = pool.allocate().unwrap();
        let _b = pool.allocate().unwrap();
        assert!(pool.is_exhausted());
        assert!(pool.allocate().is_none());
    }

    #[test]
    fn peak_tracks_high_water_mark() {
        let pool = Pool::<u64, 8>::new();
        let guards: Vec<_> = (0..5).map(|_| pool.allocate().unwrap()).collect();
        assert_eq!(pool.peak(), 5);
        drop(guards);
        assert_eq!(pool.peak(), 5);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn guard_mutation_is_visible() {
        let pool = Pool::<u64, 2>::new();
        let mut guard = pool.allocate().unwrap();
        *guard.get_mut() = 42;
        assert_eq!(*guard.get(), 42);
    }
}
