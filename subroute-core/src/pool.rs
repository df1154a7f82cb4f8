//! # Parameter Buffer Pool
//!
//! A free list of [`Params`] buffers shared by every dispatch.
//!
//! Buffers are sized to the largest parameter count seen across all
//! registered routes, so a buffer taken from the pool never grows while a
//! match is captured into it. The pool is the only router structure mutated
//! while serving, hence the lock.
//!
//! Returning a buffer is advisory: a leaked buffer costs one allocation on a
//! later checkout and nothing else, because every checkout resets the
//! logical length.

use crate::params::Params;
use parking_lot::Mutex;
use std::{
    borrow::{Borrow, BorrowMut},
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// A concurrency-safe free list of parameter buffers.
pub struct ParamsPool {
    free: Mutex<Vec<Params>>,
    capacity: AtomicUsize,
    max_idle: usize,
}

impl ParamsPool {
    /// Default bound on idle buffers kept by the pool.
    pub const DEFAULT_MAX_IDLE: usize = 1024;

    /// Create an empty pool.
    pub fn new() -> Self {
        Self::with_max_idle(Self::DEFAULT_MAX_IDLE)
    }

    /// Create an empty pool that keeps at most `max_idle` returned buffers.
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity: AtomicUsize::new(0),
            max_idle,
        }
    }

    /// Capacity given to freshly allocated buffers.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Grow the capacity of fresh buffers to at least `capacity`.
    pub fn raise_capacity(&self, capacity: usize) {
        self.capacity.fetch_max(capacity, Ordering::Relaxed);
    }

    /// Take a buffer with a logical length of zero.
    pub fn checkout(&self) -> Params {
        match self.free.lock().pop() {
            Some(mut params) => {
                params.clear();
                params
            }
            None => Params::with_capacity(self.capacity()),
        }
    }

    /// Hand a buffer back for reuse.
    pub fn give_back(&self, params: Params) {
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(params);
        }
    }

    /// Take a buffer that goes back to this pool when dropped.
    pub fn lease(self: &Arc<Self>) -> PooledParams {
        PooledParams {
            params: self.checkout(),
            pool: Some(Arc::clone(self)),
        }
    }

    /// Number of buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

impl Default for ParamsPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParamsPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsPool")
            .field("idle", &self.idle())
            .field("capacity", &self.capacity())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

/// A [`Params`] buffer leased from a [`ParamsPool`].
///
/// Dereferences to [`Params`] and returns the buffer to its pool on drop.
pub struct PooledParams {
    params: Params,
    pool: Option<Arc<ParamsPool>>,
}

impl PooledParams {
    /// Wrap a buffer that belongs to no pool.
    pub fn unpooled(params: Params) -> Self {
        Self { params, pool: None }
    }

    /// Keep the buffer instead of returning it to the pool.
    pub fn detach(mut self) -> Params {
        self.pool = None;
        std::mem::take(&mut self.params)
    }
}

impl Deref for PooledParams {
    type Target = Params;

    fn deref(&self) -> &Params {
        &self.params
    }
}

impl DerefMut for PooledParams {
    fn deref_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl Borrow<Params> for PooledParams {
    fn borrow(&self) -> &Params {
        &self.params
    }
}

impl BorrowMut<Params> for PooledParams {
    fn borrow_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl Drop for PooledParams {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.give_back(std::mem::take(&mut self.params));
        }
    }
}

impl fmt::Debug for PooledParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.params, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Arc<str> {
        Arc::from(name)
    }

    #[test]
    fn test_fresh_buffers_use_current_capacity() {
        let pool = ParamsPool::new();
        pool.raise_capacity(3);
        pool.raise_capacity(2);
        assert_eq!(pool.capacity(), 3);
        assert!(pool.checkout().capacity() >= 3);
    }

    #[test]
    fn test_reuse_never_exposes_stale_values() {
        let pool = Arc::new(ParamsPool::new());
        pool.raise_capacity(3);

        {
            let mut ps = pool.lease();
            ps.push(&key("p1"), "a");
            ps.push(&key("p2"), "b");
            ps.push(&key(">"), ".c.d");
        }
        assert_eq!(pool.idle(), 1);

        let mut ps = pool.lease();
        assert!(ps.is_empty());
        ps.push(&key("name"), "gopher");
        assert_eq!(ps.len(), 1);
        assert_eq!(ps.by_name("p2"), "");
        assert_eq!(ps.by_name(">"), "");
        assert_eq!(ps.by_name("name"), "gopher");
    }

    #[test]
    fn test_detach_skips_return() {
        let pool = Arc::new(ParamsPool::new());
        let mut ps = pool.lease();
        ps.push(&key("k"), "v");
        let kept = ps.detach();
        assert_eq!(kept.by_name("k"), "v");
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_idle_bound() {
        let pool = ParamsPool::with_max_idle(1);
        pool.give_back(Params::new());
        pool.give_back(Params::new());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_concurrent_checkout() {
        let pool = Arc::new(ParamsPool::new());
        pool.raise_capacity(1);
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let value = i.to_string();
                    for _ in 0..100 {
                        let mut ps = pool.lease();
                        ps.push(&key("i"), &value);
                        assert_eq!(ps.len(), 1);
                        assert_eq!(ps.by_name("i"), value);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert!(pool.idle() <= 8);
    }
}
