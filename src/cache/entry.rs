//! Cached entries and the slot variants a provider can hold

use crate::cache::provider::CacheProvider;
use crate::clock::duration_nanos;
use crate::error::{CacheError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A captured query result paired with the time it was produced
///
/// Entries are never mutated in place; a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    /// When the result was produced, in Unix nanoseconds
    pub query_time_nanos: i64,

    /// The result, encoded as JSON
    pub payload: serde_json::Value,
}

impl CachedEntry {
    /// Capture `value` as produced at `query_time_nanos`
    pub fn capture<T: Serialize + ?Sized>(value: &T, query_time_nanos: i64) -> Result<Self> {
        let payload = serde_json::to_value(value).map_err(|e| {
            CacheError::InternalError(format!("Failed to encode cached value: {}", e))
        })?;

        Ok(Self {
            query_time_nanos,
            payload,
        })
    }

    /// Whether the entry is still inside the freshness window ending at `now_nanos`
    ///
    /// Fresh means `query_time > now - ttl`.
    pub fn is_fresh(&self, now_nanos: i64, ttl: Duration) -> bool {
        self.query_time_nanos > now_nanos.saturating_sub(duration_nanos(ttl))
    }

    /// Age of the entry relative to `now_nanos`
    pub fn age(&self, now_nanos: i64) -> Duration {
        let nanos = now_nanos.saturating_sub(self.query_time_nanos).max(0);
        Duration::from_nanos(nanos as u64)
    }

    /// Decode the payload into a fresh `T`
    ///
    /// Either the whole value decodes or an `InternalError` is returned; the
    /// caller never observes a partially copied value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.payload).map_err(|e| {
            CacheError::InternalError(format!(
                "Cached value cannot be read as {}: {}",
                std::any::type_name::<T>(),
                e
            ))
        })
    }
}

/// A value stored in a cache provider
#[derive(Debug, Clone)]
pub enum CacheSlot {
    /// A cached query result
    Entry(CachedEntry),

    /// A bucket sub-cache stored under the bucket's name
    Bucket(Arc<dyn CacheProvider>),
}

impl CacheSlot {
    pub fn as_entry(&self) -> Option<&CachedEntry> {
        match self {
            CacheSlot::Entry(entry) => Some(entry),
            CacheSlot::Bucket(_) => None,
        }
    }

    pub fn as_bucket(&self) -> Option<&Arc<dyn CacheProvider>> {
        match self {
            CacheSlot::Bucket(provider) => Some(provider),
            CacheSlot::Entry(_) => None,
        }
    }
}

impl From<CachedEntry> for CacheSlot {
    fn from(entry: CachedEntry) -> Self {
        CacheSlot::Entry(entry)
    }
}
