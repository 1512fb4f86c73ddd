//! Local card data caches.
//!
//! Two independently bounded, time-expiring stores persisted to durable
//! storage:
//!
//! - `CardRecordStore`: card metadata, 1000 entries, 7 days
//! - `CardImageStore`: resolved image URLs, 500 entries, 24 hours
//!
//! Both evict the oldest 10% (at least one entry) when full, expire lazily on
//! read, purge on load, and recover from a full storage quota by clearing
//! themselves and retrying the write once.

pub mod bounded;
pub mod image_store;
pub mod record_store;
pub mod stats;

pub use bounded::{BoundedCache, Lookup, Timestamped};
pub use image_store::{CardImageStore, ImageCacheEntry};
pub use record_store::{CachedRecords, CardRecordStore};
pub use stats::{CacheStats, ImageCacheStats};
