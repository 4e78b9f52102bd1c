//! Read-through cache coordinator
//!
//! The coordinator sits between callers and a backing store. Reads go through
//! [`CacheCoordinator::execute`]:
//!
//! 1. reject descriptors that contribute no key fragment,
//! 2. default the descriptor's type identity to the result type and
//!    generate the key,
//! 3. route to the bucket sub-cache named by the descriptor, creating it on
//!    first use,
//! 4. serve a cached entry if it is younger than the requested TTL,
//! 5. otherwise run the miss-handler against the store and cache its result.
//!
//! Writes go through [`CacheCoordinator::save_flush`], which drops the whole
//! bucket of the saved record once the write succeeds.
//!
//! Bucket sub-caches are re-resolved by name on every call. Two first
//! accesses racing on the same unseen bucket may each register a sub-cache;
//! the last registration wins and whatever the other one held is lost.

use crate::cache::{
    config::CacheConfig,
    entry::{CacheSlot, CachedEntry},
    invalidation::{InvalidationEvent, InvalidationReason, InvalidationScope},
    key::CacheKeyDescriptor,
    provider::{CacheProvider, ProviderFactory},
    store::MemoryProvider,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result, StoreResult};
use crate::store::{Cacheable, ReadWriteStore, Record, Store};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extra discriminator for `find_many` keys
pub const FIND_MANY: &str = "FindMany";
/// Extra discriminator for `find_first` keys
pub const FIND_FIRST: &str = "FindFirst";
/// Extra discriminator for `find_last` keys
pub const FIND_LAST: &str = "FindLast";
/// Extra discriminator for `count` keys
pub const COUNT: &str = "Count";

/// Read-through cache in front of a [`Store`]
pub struct CacheCoordinator<S> {
    /// Top-level provider; owns every bucket sub-cache
    cache: Arc<dyn CacheProvider>,
    new_provider: ProviderFactory,
    store: Arc<ReadWriteStore<S>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<S: Store> CacheCoordinator<S> {
    /// Create a coordinator backed by in-memory providers and the system clock
    pub fn new(store: ReadWriteStore<S>, config: CacheConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a coordinator backed by in-memory providers reading `clock`
    pub fn with_clock(store: ReadWriteStore<S>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        if let Err(e) = config.validate() {
            warn!("Cache coordinator created with invalid config: {}", e);
        }

        let new_provider = MemoryProvider::factory(config.clone(), clock.clone());
        let cache = new_provider();

        info!("Initializing cache coordinator with config: {:?}", config);

        Self {
            cache,
            new_provider,
            store: Arc::new(store),
            config,
            clock,
        }
    }

    /// Create a coordinator over caller-supplied providers
    ///
    /// `new_provider` builds the sub-cache for each bucket seen for the first
    /// time.
    pub fn with_provider(
        store: ReadWriteStore<S>,
        config: CacheConfig,
        cache: Arc<dyn CacheProvider>,
        new_provider: ProviderFactory,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!("Cache coordinator created with invalid config: {}", e);
        }

        Self {
            cache,
            new_provider,
            store: Arc::new(store),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for freshness checks
    pub fn using_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The backing store
    pub fn store(&self) -> &Arc<ReadWriteStore<S>> {
        &self.store
    }

    /// The top-level cache provider
    pub fn provider(&self) -> &Arc<dyn CacheProvider> {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Serve `descriptor` from cache if fresh, otherwise run `miss` and cache its result
    ///
    /// The descriptor's type identity defaults to `T`. A cached entry is fresh
    /// while its timestamp is newer than `now - ttl`. Errors from `miss` are
    /// returned unchanged and nothing is cached.
    pub async fn execute<T, F, Fut>(
        &self,
        miss: F,
        ttl: Duration,
        descriptor: CacheKeyDescriptor,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(Arc<ReadWriteStore<S>>) -> Fut + Send,
        Fut: Future<Output = StoreResult<T>> + Send,
    {
        // The defaulted type alone would make every such query share one slot
        if descriptor.generate().is_empty() {
            return Err(CacheError::InvalidArgument(
                "cannot cache with an empty key, add some information to the descriptor"
                    .to_string(),
            ));
        }

        let descriptor = if descriptor.type_name.is_some() {
            descriptor
        } else {
            descriptor.of_type::<T>()
        };
        let key = descriptor.generate();

        let cache = self.resolve_provider(descriptor.resolve_bucket()).await;

        if let Some(slot) = cache.get(&key).await {
            let entry = slot.as_entry().ok_or_else(|| {
                CacheError::InternalError(format!(
                    "slot under key {} holds a bucket sub-cache, not a cached entry",
                    key
                ))
            })?;

            let now = self.clock.now_nanos();
            if entry.is_fresh(now, ttl) {
                let value = entry.decode::<T>()?;
                debug!("Cache hit: {}", key);
                return Ok(value);
            }

            debug!("Cache entry stale ({:?} old): {}", entry.age(now), key);
        } else {
            debug!("Cache miss: {}", key);
        }

        let value = miss(self.store.clone()).await?;

        // Only cache what a later hit can read back as `T`
        let captured = CachedEntry::capture(&value, self.clock.now_nanos())
            .and_then(|entry| entry.decode::<T>().map(|_| entry));

        match captured {
            Ok(entry) => cache.set(key, CacheSlot::Entry(entry), ttl).await,
            Err(e) => warn!("Not caching result for {}: {}", key, e),
        }

        Ok(value)
    }

    /// All records matching `criteria`
    pub async fn find_many<R: Record>(&self, criteria: &R, ttl: Duration) -> Result<Vec<R>> {
        let descriptor = CacheKeyDescriptor::new().search(criteria).extra(FIND_MANY);
        let criteria = criteria.clone();

        self.execute(
            move |store| async move { store.read().find_many(&criteria).await },
            ttl,
            descriptor,
        )
        .await
    }

    /// First record matching `criteria`
    pub async fn find_first<R: Record>(&self, criteria: &R, ttl: Duration) -> Result<R> {
        let descriptor = CacheKeyDescriptor::new().search(criteria).extra(FIND_FIRST);
        let criteria = criteria.clone();

        self.execute(
            move |store| async move { store.read().find_first(&criteria).await },
            ttl,
            descriptor,
        )
        .await
    }

    /// Last record matching `criteria`
    pub async fn find_last<R: Record>(&self, criteria: &R, ttl: Duration) -> Result<R> {
        let descriptor = CacheKeyDescriptor::new().search(criteria).extra(FIND_LAST);
        let criteria = criteria.clone();

        self.execute(
            move |store| async move { store.read().find_last(&criteria).await },
            ttl,
            descriptor,
        )
        .await
    }

    /// Number of records matching `criteria`
    pub async fn count<R: Record>(&self, criteria: &R, ttl: Duration) -> Result<i64> {
        let descriptor = CacheKeyDescriptor::new().search(criteria).extra(COUNT);
        let criteria = criteria.clone();

        self.execute(
            move |store| async move { store.read().count(&criteria).await },
            ttl,
            descriptor,
        )
        .await
    }

    /// Save `model` through the write path, then drop its whole bucket
    ///
    /// On a failed write nothing is invalidated and the store error is
    /// returned unchanged.
    pub async fn save_flush<R: Record>(&self, model: &R) -> Result<()> {
        self.store.write().save(model).await?;

        let descriptor = CacheKeyDescriptor::new().bucket(model.cache_bucket());
        self.invalidate(&descriptor, InvalidationReason::RecordSaved).await;

        Ok(())
    }

    /// Invalidate cached data described by `descriptor`
    ///
    /// With a non-empty key only that key is removed from the bucket's
    /// sub-cache; with only a bucket the whole sub-cache is dropped.
    /// Invalidation is best-effort and always succeeds.
    pub async fn flush(&self, descriptor: &CacheKeyDescriptor) -> Result<InvalidationEvent> {
        Ok(self.invalidate(descriptor, InvalidationReason::Flush).await)
    }

    /// Drop the sub-cache of the bucket `criteria` belongs to
    pub async fn flush_bucket_of<C: Cacheable + ?Sized>(&self, criteria: &C) -> Result<InvalidationEvent> {
        self.flush(&CacheKeyDescriptor::new().bucket(criteria.cache_bucket()))
            .await
    }

    async fn invalidate(
        &self,
        descriptor: &CacheKeyDescriptor,
        reason: InvalidationReason,
    ) -> InvalidationEvent {
        let bucket = descriptor.resolve_bucket();
        let key = descriptor.generate();

        let scope = match (bucket, key.is_empty()) {
            (None, true) => InvalidationScope::Nothing,
            (Some(bucket), true) => {
                self.cache.delete(bucket).await;
                info!("Flushed cache bucket {} ({})", bucket, reason);
                InvalidationScope::Bucket(bucket.to_string())
            }
            (None, false) => {
                self.cache.delete(&key).await;
                InvalidationScope::Key { bucket: None, key }
            }
            (Some(bucket), false) => match self.cache.get(bucket).await {
                Some(CacheSlot::Bucket(sub_cache)) => {
                    sub_cache.delete(&key).await;
                    InvalidationScope::Key {
                        bucket: Some(bucket.to_string()),
                        key,
                    }
                }
                Some(CacheSlot::Entry(_)) => {
                    // Reads fell back to the top-level provider for this bucket
                    self.cache.delete(&key).await;
                    InvalidationScope::Key { bucket: None, key }
                }
                None => {
                    debug!("Bucket {} not cached, nothing to flush for {}", bucket, key);
                    InvalidationScope::Nothing
                }
            },
        };

        debug!("Invalidation ({}): {:?}", reason, scope);
        InvalidationEvent::new(reason, scope)
    }

    /// Provider holding entries for `bucket`, creating the sub-cache on first use
    ///
    /// Without a bucket, or when the slot under the bucket name is not a
    /// sub-cache, the top-level provider is used.
    async fn resolve_provider(&self, bucket: Option<&str>) -> Arc<dyn CacheProvider> {
        let Some(bucket) = bucket else {
            return self.cache.clone();
        };

        match self.cache.get(bucket).await {
            Some(CacheSlot::Bucket(sub_cache)) => sub_cache,
            Some(CacheSlot::Entry(_)) => {
                warn!(
                    "Slot under bucket name {} is not a sub-cache, using top-level provider",
                    bucket
                );
                self.cache.clone()
            }
            None => {
                let sub_cache = (self.new_provider)();
                self.cache
                    .set(
                        bucket.to_string(),
                        CacheSlot::Bucket(sub_cache.clone()),
                        self.config.bucket_retention,
                    )
                    .await;
                debug!("Created cache bucket {}", bucket);
                sub_cache
            }
        }
    }
}

impl<S> fmt::Debug for CacheCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
