//! Cache provider contract
//!
//! Any key-value store with `get`/`set`/`delete` can back the coordinator.
//! Providers must be safe to call concurrently; the coordinator adds no
//! locking of its own. A provider may hold other providers as
//! [`CacheSlot::Bucket`] values, which is how bucket sub-caches are formed.

use crate::cache::entry::CacheSlot;
use crate::cache::types::CacheKey;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Key-value store used by the cache coordinator
#[async_trait]
pub trait CacheProvider: Send + Sync + Debug {
    /// Look up a slot by key
    async fn get(&self, key: &str) -> Option<CacheSlot>;

    /// Store a slot under `key`
    ///
    /// `ttl` is a reclamation hint. Freshness of cached entries is decided by
    /// the coordinator from the entry timestamp, not by this expiry.
    async fn set(&self, key: CacheKey, value: CacheSlot, ttl: Duration);

    /// Remove the slot stored under `key`, if any
    async fn delete(&self, key: &str);
}

/// Constructor for new, empty providers (used for bucket sub-caches)
pub type ProviderFactory = Arc<dyn Fn() -> Arc<dyn CacheProvider> + Send + Sync>;

/// Build a factory from any provider constructor
pub fn provider_factory<P, F>(constructor: F) -> ProviderFactory
where
    P: CacheProvider + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    Arc::new(move || Arc::new(constructor()) as Arc<dyn CacheProvider>)
}
