//! Sparse, index-aligned memo store for indicator values.
//!
//! One cache instance per (series, key). Slot `i` holds the memoized value
//! for series index `i` or is unset. The backing store is a deque so the
//! end-shifts that keep the cache aligned with a trimmed series are cheap.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Growable sequence of optional values, aligned 1:1 with series indices.
///
/// Interior mutability: reads and writes take `&self` so concurrent readers
/// can fill the cache through a shared handle. All slot access is serialized
/// per instance, so two readers growing the store at once cannot lose slots;
/// if both compute the same missing index the second write overwrites the
/// first with an identical value.
#[derive(Debug, Default)]
pub struct IndicatorCache<T> {
    slots: Mutex<VecDeque<Option<T>>>,
}

impl<T: Clone> IndicatorCache<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(VecDeque::new()),
        }
    }

    /// Memoized value at `index`, or `None` if never computed (or evicted).
    pub fn get(&self, index: usize) -> Option<T> {
        self.slots.lock().unwrap().get(index).cloned().flatten()
    }

    /// Store at `index`, growing the store with unset slots as needed.
    pub fn set(&self, index: usize, value: T) {
        let mut slots = self.slots.lock().unwrap();
        if index >= slots.len() {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(value);
    }

    /// Drop the first `n` slots; every remaining value keeps its alignment,
    /// so `get(i)` afterwards returns what `get(i + n)` did before.
    pub fn remove_first(&self, n: usize) {
        let mut slots = self.slots.lock().unwrap();
        let n = n.min(slots.len());
        slots.drain(..n);
    }

    /// Drop the last `n` slots.
    pub fn remove_last(&self, n: usize) {
        let mut slots = self.slots.lock().unwrap();
        let keep = slots.len().saturating_sub(n);
        slots.truncate(keep);
    }

    /// Drop every slot at or above `start`. Equivalent to
    /// `remove_last(len - start)`; used by splice bookkeeping.
    pub fn truncate_from(&self, start: usize) {
        let mut slots = self.slots.lock().unwrap();
        if start < slots.len() {
            slots.truncate(start);
        }
    }

    pub fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }

    /// Current slot count (set and unset).
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().unwrap().is_empty()
    }
}

/// Type-erased realignment handle the series registry drives on every
/// structural mutation.
pub(crate) trait CacheRealign: Send + Sync {
    fn remove_first(&self, n: usize);
    fn remove_last(&self, n: usize);
    fn truncate_from(&self, start: usize);
    fn clear(&self);
}

impl<T: Clone + Send + 'static> CacheRealign for IndicatorCache<T> {
    fn remove_first(&self, n: usize) {
        IndicatorCache::remove_first(self, n);
    }

    fn remove_last(&self, n: usize) {
        IndicatorCache::remove_last(self, n);
    }

    fn truncate_from(&self, start: usize) {
        IndicatorCache::truncate_from(self, start);
    }

    fn clear(&self) {
        IndicatorCache::clear(self);
    }
}
