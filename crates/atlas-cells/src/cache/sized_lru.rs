//! LRU cache bounded by the summed size of its entries.

use std::hash::Hash;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

/// Values that report their own cache size.
///
/// Sizes are in arbitrary units; all that matters is that they are
/// comparable to the cache capacity.
pub trait Cacheable {
    /// Size of this value in cache units.
    fn size_of(&self) -> usize;
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups that found a value.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
}

struct Entry<V> {
    value: Arc<V>,
    size: usize,
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    total_size: usize,
    stats: CacheStats,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    fn trim(&mut self, capacity: usize) {
        while self.total_size > capacity {
            let Some((_, evicted)) = self.entries.pop_lru() else {
                break;
            };
            self.total_size -= evicted.size;
            self.stats.evictions += 1;
            trace!(
                size = evicted.size,
                total = self.total_size,
                capacity,
                "Evicted cache entry"
            );
        }
    }
}

/// LRU cache whose capacity is a budget of summed entry sizes.
///
/// All operations are safe to call from multiple threads. Values are shared
/// as [`Arc`]s so lookups never copy content.
///
/// An entry larger than the whole capacity is evicted by its own insertion.
pub struct SizedLruCache<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K: Hash + Eq, V: Cacheable> SizedLruCache<K, V> {
    /// Creates an empty cache with the given size budget.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                total_size: 0,
                stats: CacheStats::default(),
            }),
            capacity,
        }
    }

    /// Returns the size budget.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the summed size of all entries.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.inner.lock().total_size
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Returns `true` if `key` is cached, without touching recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Looks up `key`, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let value = inner.entries.get(key).map(|entry| Arc::clone(&entry.value));
        if value.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        value
    }

    /// Inserts `value` under `key`, replacing any previous value, then evicts
    /// least-recently-used entries until the cache fits its budget.
    ///
    /// Returns the stored value, which may already have been evicted again
    /// if it alone exceeds the capacity.
    pub fn put(&self, key: K, value: V) -> Arc<V> {
        let size = value.size_of();
        let value = Arc::new(value);
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.entries.put(
            key,
            Entry {
                value: Arc::clone(&value),
                size,
            },
        ) {
            inner.total_size -= previous.size;
        }
        inner.total_size += size;
        inner.trim(self.capacity);
        value
    }

    /// Returns the cached value for `key`, computing and caching it on a miss.
    ///
    /// `compute` runs without the lock held, so concurrent misses on the same
    /// key may both compute; the last insertion wins. A `None` result is not
    /// cached.
    pub fn get_or_insert_with<F>(&self, key: &K, compute: F) -> Option<Arc<V>>
    where
        K: Clone,
        F: FnOnce() -> Option<V>,
    {
        if let Some(value) = self.get(key) {
            return Some(value);
        }
        let value = compute()?;
        Some(self.put(key.clone(), value))
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_size = 0;
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for SizedLruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SizedLruCache")
            .field("capacity", &self.capacity)
            .field("total_size", &inner.total_size)
            .field("len", &inner.entries.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Blob(usize);

    impl Cacheable for Blob {
        fn size_of(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_put_and_get() {
        let cache = SizedLruCache::new(100);
        cache.put("a", Blob(10));
        assert_eq!(*cache.get(&"a").unwrap(), Blob(10));
        assert!(cache.get(&"b").is_none());
        assert_eq!(cache.total_size(), 10);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = SizedLruCache::new(100);
        cache.put("a", Blob(40));
        cache.put("b", Blob(40));
        cache.get(&"a");
        cache.put("c", Blob(40));

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.total_size(), 80);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_replace_adjusts_size() {
        let cache = SizedLruCache::new(100);
        cache.put("a", Blob(60));
        cache.put("a", Blob(20));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_size(), 20);
    }

    #[test]
    fn test_oversized_entry_evicts_itself() {
        let cache = SizedLruCache::new(100);
        cache.put("small", Blob(10));
        let stored = cache.put("huge", Blob(500));

        assert_eq!(*stored, Blob(500));
        assert!(cache.is_empty());
        assert_eq!(cache.total_size(), 0);
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let cache = SizedLruCache::new(100);
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(Blob(5))
        };

        let first = cache.get_or_insert_with(&"k", compute).unwrap();
        let second = cache.get_or_insert_with(&"k", compute).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_or_insert_with_none_not_cached() {
        let cache: SizedLruCache<&str, Blob> = SizedLruCache::new(100);
        assert!(cache.get_or_insert_with(&"k", || None).is_none());
        assert!(!cache.contains(&"k"));
    }

    #[test]
    fn test_oversized_value_still_returned() {
        let cache = SizedLruCache::new(4);
        let value = cache.get_or_insert_with(&"k", || Some(Blob(10))).unwrap();
        assert_eq!(*value, Blob(10));
        assert!(!cache.contains(&"k"));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(SizedLruCache::new(1_000));
        let handles: Vec<_> = (0..8)
            .map(|thread| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = (thread * 1_000) + (i % 50);
                        cache.get_or_insert_with(&key, || Some(Blob(i % 17 + 1)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.total_size() <= cache.capacity());
    }

    #[test]
    fn test_same_key_race_keeps_one_entry() {
        let cache = Arc::new(SizedLruCache::new(1_000));
        let start = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (1..=8)
            .map(|size| {
                let cache = Arc::clone(&cache);
                let start = Arc::clone(&start);
                std::thread::spawn(move || {
                    start.wait();
                    for i in 0..200 {
                        if i % 2 == 0 {
                            cache.put("shared", Blob(size));
                        } else {
                            cache.get_or_insert_with(&"shared", || Some(Blob(size * 10)));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = cache.get(&"shared").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_size(), stored.size_of());
        assert!((1..=8).contains(&stored.0) || (1..=8).any(|size| size * 10 == stored.0));
    }

    proptest! {
        #[test]
        fn total_size_matches_entries_and_fits(
            ops in prop::collection::vec((0u8..20, 0usize..60), 1..200),
        ) {
            let cache = SizedLruCache::new(100);
            let mut sizes: HashMap<u8, usize> = HashMap::new();
            for (key, size) in ops {
                cache.put(key, Blob(size));
                sizes.insert(key, size);
                prop_assert!(cache.total_size() <= cache.capacity());

                let expected: usize = sizes
                    .iter()
                    .filter(|(key, _)| cache.contains(key))
                    .map(|(_, size)| *size)
                    .sum();
                prop_assert_eq!(cache.total_size(), expected);
            }
        }
    }
}
