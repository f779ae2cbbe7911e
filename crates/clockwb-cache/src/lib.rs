#![forbid(unsafe_code)]
//! Fixed-capacity write-back cache with CLOCK (second-chance) eviction.
//!
//! [`ClockCache`] keeps at most `N` key/value pairs resident in a dense slot
//! array. Misses are filled from a [`BackingStore`]; writes stay in the cache
//! as dirty entries and reach the store only when their slot is reclaimed or
//! on an explicit [`flush`](ClockCache::flush).
//!
//! # Eviction
//!
//! Two hands walk the slot array in lock-step, starting `N/2` apart. On every
//! sweep step the second-chance hand clears the survive bit of the slot under
//! it, and the eviction hand claims the slot under it if that slot's survive
//! bit is already clear. An access sets the survive bit, so a slot touched
//! shortly before the eviction hand arrives gets one more lap. Bookkeeping is
//! O(1) amortized per access with no ordered list.
//!
//! # Write-back and data loss
//!
//! Dropping a cache without calling `flush` discards every dirty entry. The
//! drop emits a `tracing` warning with the number of entries lost, but does
//! not write them back.
//!
//! # Thread safety
//!
//! `ClockCache` takes `&mut self` and does no locking. [`SyncClockCache`]
//! wraps it in a single mutex held for the full operation, including any
//! `load`/`save` call.

mod config;
mod store;
mod sync;

pub use clockwb_error::{CacheError, Result};
pub use config::{ClockCacheConfig, FlushMode};
pub use store::{BackingStore, FnStore, MemoryStore};
pub use sync::SyncClockCache;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, trace, warn};

/// Counters describing how a cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// `get`/`set` calls served from a resident slot.
    pub hits: u64,
    /// `get`/`set` calls that had to reclaim a slot.
    pub misses: u64,
    /// Successful `load` calls.
    pub loads: u64,
    /// Successful `save` calls, from eviction and flush.
    pub saves: u64,
    /// Resident entries displaced by the sweep. Flush removals are not
    /// counted.
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of accesses served without reclaiming a slot.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One cache slot.
///
/// Invariant: `dirty` implies `entry.is_some()`.
#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<(K, V)>,
    survive: bool,
    dirty: bool,
}

impl<K, V> Slot<K, V> {
    const fn empty() -> Self {
        Self {
            entry: None,
            survive: false,
            dirty: false,
        }
    }
}

/// Advance a hand by one slot, wrapping at `capacity`.
#[inline]
fn advance(hand: usize, capacity: usize) -> usize {
    let next = hand + 1;
    if next == capacity { 0 } else { next }
}

/// Write-back cache with CLOCK eviction over a [`BackingStore`].
///
/// Invariants:
/// - `index` maps `k -> s` iff slot `s` is resident and holds `k`.
/// - `index.len() <= slots.len()`.
/// - both hands are in `0..slots.len()`.
pub struct ClockCache<K, V, S> {
    slots: Box<[Slot<K, V>]>,
    index: HashMap<K, usize>,
    second_chance_hand: usize,
    eviction_hand: usize,
    flush_mode: FlushMode,
    stats: CacheStats,
    store: S,
}

impl<K, V, S> ClockCache<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BackingStore<K, V>,
{
    /// Create a cache with `capacity` slots in front of `store`.
    pub fn new(capacity: usize, store: S) -> Result<Self> {
        Self::with_config(ClockCacheConfig::with_capacity(capacity), store)
    }

    pub fn with_config(config: ClockCacheConfig, store: S) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity;
        let slots = (0..capacity).map(|_| Slot::empty()).collect();
        debug!(
            target: "clockwb::cache",
            event = "cache_created",
            capacity,
            flush_mode = ?config.flush_mode
        );
        Ok(Self {
            slots,
            index: HashMap::with_capacity(capacity),
            second_chance_hand: 0,
            eviction_hand: capacity / 2,
            flush_mode: config.flush_mode,
            stats: CacheStats::default(),
            store,
        })
    }

    /// Return the value for `key`, loading it from the store on a miss.
    ///
    /// A miss may first write back the dirty entry it displaces. If that
    /// save fails, nothing is displaced and the error is returned. If the
    /// load fails, the displaced entry is already gone and the reclaimed
    /// slot stays empty.
    pub fn get(&mut self, key: &K) -> Result<V> {
        if let Some(value) = self.hit(key) {
            return Ok(value);
        }

        self.stats.misses += 1;
        let slot = self.reclaim()?;
        let value = match self.store.load(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target: "clockwb::cache",
                    event = "load_failed",
                    slot,
                    error = %err
                );
                return Err(err);
            }
        };
        self.stats.loads += 1;
        debug!(target: "clockwb::cache", event = "load", slot);
        self.install(slot, key.clone(), value.clone(), false);
        Ok(value)
    }

    /// Store `value` under `key` as a dirty entry and return it.
    ///
    /// Never calls `load`. A miss reclaims a slot exactly like
    /// [`get`](Self::get), including the possible write-back.
    pub fn set(&mut self, key: K, value: V) -> Result<V> {
        if let Some(&idx) = self.index.get(&key) {
            let slot = &mut self.slots[idx];
            if let Some((_, cached)) = &mut slot.entry {
                *cached = value.clone();
                slot.dirty = true;
                slot.survive = true;
                self.stats.hits += 1;
                trace!(target: "clockwb::cache", event = "set_hit", slot = idx);
                return Ok(value);
            }
        }

        self.stats.misses += 1;
        let slot = self.reclaim()?;
        trace!(target: "clockwb::cache", event = "set_install", slot);
        self.install(slot, key, value.clone(), true);
        Ok(value)
    }

    /// Write every dirty entry back to the store.
    ///
    /// Slots are visited in index order. With [`FlushMode::Evict`] each
    /// written-back entry is also removed from the cache and its slot is
    /// left empty with a clear survive bit, so the next miss can claim it;
    /// with
    /// [`FlushMode::Retain`] it stays resident and clean. Clean entries are
    /// left alone either way. On a failed save, flushing stops: the failing
    /// entry stays resident and dirty, and entries already saved stay
    /// settled.
    pub fn flush(&mut self) -> Result<()> {
        let mut saved = 0_usize;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if !slot.dirty {
                continue;
            }
            let Some((key, value)) = &slot.entry else {
                slot.dirty = false;
                continue;
            };
            if let Err(err) = self.store.save(key, value) {
                warn!(
                    target: "clockwb::cache",
                    event = "flush_save_failed",
                    slot = idx,
                    saved,
                    error = %err
                );
                return Err(err);
            }
            self.stats.saves += 1;
            saved += 1;
            slot.dirty = false;

            if self.flush_mode == FlushMode::Evict {
                if let Some((key, _)) = slot.entry.take() {
                    self.index.remove(&key);
                }
                slot.survive = false;
            }
        }
        debug!(
            target: "clockwb::cache",
            event = "flush",
            saved,
            resident = self.index.len(),
            flush_mode = ?self.flush_mode
        );
        Ok(())
    }

    /// Whether `key` is resident. Does not count as an access.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn hit(&mut self, key: &K) -> Option<V> {
        let idx = *self.index.get(key)?;
        let slot = &mut self.slots[idx];
        let (_, value) = slot.entry.as_ref()?;
        slot.survive = true;
        self.stats.hits += 1;
        trace!(target: "clockwb::cache", event = "get_hit", slot = idx);
        Some(value.clone())
    }

    /// Run the sweep until the eviction hand lands on a slot with a clear
    /// survive bit.
    ///
    /// Terminates within two laps: after one lap of the second-chance hand
    /// every survive bit is clear.
    fn select_victim(&mut self) -> usize {
        let capacity = self.slots.len();
        loop {
            self.slots[self.second_chance_hand].survive = false;
            self.second_chance_hand = advance(self.second_chance_hand, capacity);

            let candidate = self.eviction_hand;
            self.eviction_hand = advance(self.eviction_hand, capacity);
            if !self.slots[candidate].survive {
                return candidate;
            }
        }
    }

    /// Pick a victim slot, write it back if dirty, and empty it.
    fn reclaim(&mut self) -> Result<usize> {
        let victim = self.select_victim();
        let slot = &mut self.slots[victim];

        if slot.dirty {
            if let Some((key, value)) = &slot.entry {
                if let Err(err) = self.store.save(key, value) {
                    warn!(
                        target: "clockwb::cache",
                        event = "writeback_failed",
                        slot = victim,
                        error = %err
                    );
                    return Err(err);
                }
                self.stats.saves += 1;
                debug!(target: "clockwb::cache", event = "writeback", slot = victim);
            }
            slot.dirty = false;
        }

        if let Some((key, _)) = slot.entry.take() {
            self.index.remove(&key);
            self.stats.evictions += 1;
            trace!(target: "clockwb::cache", event = "evict", slot = victim);
        }
        Ok(victim)
    }

    fn install(&mut self, idx: usize, key: K, value: V, dirty: bool) {
        let slot = &mut self.slots[idx];
        slot.entry = Some((key.clone(), value));
        slot.survive = false;
        slot.dirty = dirty;
        self.index.insert(key, idx);
    }
}

impl<K, V, L, F> ClockCache<K, V, FnStore<L, F>>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: Fn(&K) -> Result<V>,
    F: Fn(&K, &V) -> Result<()>,
{
    /// Create a cache whose store is a pair of `load`/`save` closures.
    pub fn from_fns(capacity: usize, load: L, save: F) -> Result<Self> {
        Self::new(capacity, FnStore::new(load, save))
    }
}

impl<K, V, S> ClockCache<K, V, S> {
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of resident entries not yet written back.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.dirty).count()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    #[must_use]
    pub fn flush_mode(&self) -> FlushMode {
        self.flush_mode
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<K, V, S> fmt::Debug for ClockCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockCache")
            .field("capacity", &self.slots.len())
            .field("resident", &self.index.len())
            .field("dirty", &self.dirty_count())
            .field("second_chance_hand", &self.second_chance_hand)
            .field("eviction_hand", &self.eviction_hand)
            .field("flush_mode", &self.flush_mode)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<K, V, S> Drop for ClockCache<K, V, S> {
    fn drop(&mut self) {
        let dirty = self.dirty_count();
        if dirty > 0 {
            warn!(
                target: "clockwb::cache",
                event = "dirty_discarded",
                dirty,
                "cache dropped without flush; dirty entries were not written back"
            );
        }
    }
}
