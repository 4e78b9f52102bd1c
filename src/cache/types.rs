//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - the string produced by `CacheKeyDescriptor::generate`
pub type CacheKey = String;

/// Statistics for provider-level monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheStats {
    /// Total number of lookups that found a live slot
    pub hits: u64,

    /// Total number of lookups that found nothing (or an expired slot)
    pub misses: u64,

    /// Number of slots currently held
    pub entries: usize,

    /// Number of slots dropped because their TTL hint elapsed
    pub evictions_ttl: u64,

    /// Number of explicit deletions
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, evictions_ttl: {}, invalidations: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.evictions_ttl,
            self.invalidations
        )
    }
}
