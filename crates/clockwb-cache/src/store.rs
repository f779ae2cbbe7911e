//! Backing-store contract and ready-made stores.
//!
//! A [`BackingStore`] is the system of record behind a `ClockCache`. The
//! cache calls [`load`](BackingStore::load) on a read miss and
//! [`save`](BackingStore::save) when a dirty entry is evicted or flushed.
//!
//! Stores take `&self`; stateful stores use interior mutability so the same
//! store can be shared (for example through an `Arc`) with code that
//! inspects it while the cache is live.

use clockwb_error::{CacheError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The load/save contract between a cache and its system of record.
pub trait BackingStore<K, V> {
    /// Fetch the current value for `key`.
    ///
    /// Calling this again for the same key after a `save` must return the
    /// saved value or a logically newer one.
    fn load(&self, key: &K) -> Result<V>;

    /// Durably record `value` for `key`.
    fn save(&self, key: &K, value: &V) -> Result<()>;
}

impl<K, V, S: BackingStore<K, V> + ?Sized> BackingStore<K, V> for &S {
    fn load(&self, key: &K) -> Result<V> {
        (**self).load(key)
    }

    fn save(&self, key: &K, value: &V) -> Result<()> {
        (**self).save(key, value)
    }
}

impl<K, V, S: BackingStore<K, V> + ?Sized> BackingStore<K, V> for Arc<S> {
    fn load(&self, key: &K) -> Result<V> {
        (**self).load(key)
    }

    fn save(&self, key: &K, value: &V) -> Result<()> {
        (**self).save(key, value)
    }
}

impl<K, V, S: BackingStore<K, V> + ?Sized> BackingStore<K, V> for Box<S> {
    fn load(&self, key: &K) -> Result<V> {
        (**self).load(key)
    }

    fn save(&self, key: &K, value: &V) -> Result<()> {
        (**self).save(key, value)
    }
}

/// Adapts a pair of closures to [`BackingStore`].
#[derive(Clone)]
pub struct FnStore<L, S> {
    load: L,
    save: S,
}

impl<L, S> FnStore<L, S> {
    #[must_use]
    pub fn new(load: L, save: S) -> Self {
        Self { load, save }
    }
}

impl<L, S> fmt::Debug for FnStore<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStore").finish_non_exhaustive()
    }
}

impl<K, V, L, S> BackingStore<K, V> for FnStore<L, S>
where
    L: Fn(&K) -> Result<V>,
    S: Fn(&K, &V) -> Result<()>,
{
    fn load(&self, key: &K) -> Result<V> {
        (self.load)(key)
    }

    fn save(&self, key: &K, value: &V) -> Result<()> {
        (self.save)(key, value)
    }
}

/// In-memory store backed by a locked `HashMap`.
///
/// Counts every `load` and `save` it serves, which makes it useful for
/// asserting how often a cache reaches its backing store.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    entries: Mutex<HashMap<K, V>>,
    loads: AtomicU64,
    saves: AtomicU64,
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            loads: AtomicU64::new(0),
            saves: AtomicU64::new(0),
        }
    }
}

impl<K: Eq + Hash, V: Clone> MemoryStore<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without counting it as a `save`.
    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(key, value);
    }

    /// Read the stored value without counting it as a `load`.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    #[must_use]
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }
}

impl<K, V> BackingStore<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn load(&self, key: &K) -> Result<V> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(format!("{key:?}")))
    }

    fn save(&self, key: &K, value: &V) -> Result<()> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(key.clone(), value.clone());
        Ok(())
    }
}
