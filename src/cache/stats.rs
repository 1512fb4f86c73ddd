//! Cache statistics.

use serde::Serialize;

use super::bounded::{BoundedCache, Timestamped};

const HOUR_MS: f64 = 60.0 * 60.0 * 1000.0;

/// Snapshot of a cache's size and age range.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub count: usize,
    pub max_size: usize,
    /// Serialized footprint in kilobytes.
    pub size_kb: f64,
    /// Age of the oldest entry, if any.
    pub oldest_age_hours: Option<f64>,
    pub newest_age_hours: Option<f64>,
}

impl CacheStats {
    pub(crate) fn collect<V>(cache: &BoundedCache<V>, now: i64) -> Self
    where
        V: Timestamped + serde::Serialize + serde::de::DeserializeOwned,
    {
        let bytes = cache.to_json().map(|json| json.len()).unwrap_or(0);
        let range = cache.timestamp_range();
        Self {
            count: cache.len(),
            max_size: cache.capacity(),
            size_kb: bytes as f64 / 1024.0,
            oldest_age_hours: range.map(|(oldest, _)| now.saturating_sub(oldest) as f64 / HOUR_MS),
            newest_age_hours: range.map(|(_, newest)| now.saturating_sub(newest) as f64 / HOUR_MS),
        }
    }
}

/// Image cache statistics, with negative entries counted separately.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCacheStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Entries recording a failed resolution.
    pub failed: usize,
    pub in_flight: usize,
}
