//! Size-bounded content caches.
//!
//! Every cell factory owns one cache keyed by message identifier. Each entry
//! has a size computed by the factory's sizing function, and the cache evicts
//! least-recently-used entries until the summed size fits the capacity.

mod sized_lru;

pub use sized_lru::{CacheStats, Cacheable, SizedLruCache};
