//! Thread-safe access to a [`ClockCache`].

use crate::store::BackingStore;
use crate::{CacheStats, ClockCache};
use clockwb_error::Result;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;

/// A [`ClockCache`] behind one cache-wide lock.
///
/// Every operation holds the lock from start to finish, including any
/// `load` or `save` it triggers, so all operations are linearizable and
/// store latency is serialized across threads. There is no per-slot or
/// sharded locking.
pub struct SyncClockCache<K, V, S> {
    inner: Mutex<ClockCache<K, V, S>>,
}

impl<K, V, S> SyncClockCache<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BackingStore<K, V>,
{
    #[must_use]
    pub fn new(cache: ClockCache<K, V, S>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    /// Locked [`ClockCache::get`].
    pub fn get(&self, key: &K) -> Result<V> {
        self.inner.lock().get(key)
    }

    /// Locked [`ClockCache::set`].
    pub fn set(&self, key: K, value: V) -> Result<V> {
        self.inner.lock().set(key, value)
    }

    /// Locked [`ClockCache::flush`].
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }
}

impl<K, V, S> SyncClockCache<K, V, S> {
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.inner.lock().dirty_count()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Run `f` with the lock held. Lets callers make several operations
    /// atomic with respect to other threads.
    pub fn with_locked<R>(&self, f: impl FnOnce(&mut ClockCache<K, V, S>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    #[must_use]
    pub fn into_inner(self) -> ClockCache<K, V, S> {
        self.inner.into_inner()
    }
}

impl<K, V, S> From<ClockCache<K, V, S>> for SyncClockCache<K, V, S> {
    fn from(cache: ClockCache<K, V, S>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }
}

impl<K, V, S> fmt::Debug for SyncClockCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(guard) => f.debug_tuple("SyncClockCache").field(&*guard).finish(),
            None => f.write_str("SyncClockCache { <locked> }"),
        }
    }
}
