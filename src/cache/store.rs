//! In-process cache provider with TTL-hint expiry

use crate::cache::{
    config::CacheConfig,
    entry::CacheSlot,
    invalidation::{InvalidationEvent, InvalidationReason, InvalidationScope},
    provider::{CacheProvider, ProviderFactory},
    types::{CacheKey, CacheStats},
};
use crate::clock::{duration_nanos, Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Reference `CacheProvider`: a synchronized map whose slots are dropped once
/// their TTL hint has elapsed
///
/// This implementation provides:
/// - Thread-safe async access via RwLock
/// - Expiry checked lazily on `get` and by periodic sweeps
/// - Hit/miss/eviction statistics
///
/// There is no size bound and no LRU eviction.
pub struct MemoryProvider {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    store: RwLock<ProviderStore>,
}

/// Internal provider storage
#[derive(Default)]
struct ProviderStore {
    /// Main storage: key -> slot
    slots: HashMap<CacheKey, StoredSlot>,

    stats: CacheStats,
}

struct StoredSlot {
    slot: CacheSlot,
    expires_at_nanos: i64,
}

impl MemoryProvider {
    /// Create a provider reading the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a provider reading time from `clock`
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            store: RwLock::new(ProviderStore::default()),
        }
    }

    /// Factory producing fresh providers with the same configuration and clock
    ///
    /// When auto cleanup is enabled and a tokio runtime is available, each
    /// produced provider gets its own background sweep.
    pub fn factory(config: CacheConfig, clock: Arc<dyn Clock>) -> ProviderFactory {
        Arc::new(move || {
            let provider = Arc::new(MemoryProvider::with_clock(config.clone(), clock.clone()));
            if config.enable_auto_cleanup {
                provider.spawn_auto_cleanup();
            }
            provider as Arc<dyn CacheProvider>
        })
    }

    /// Number of slots currently held (expired or not)
    pub async fn len(&self) -> usize {
        self.store.read().await.slots.len()
    }

    /// Check if the provider holds no slots
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.slots.is_empty()
    }

    /// Snapshot of provider statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let mut stats = store.stats.clone();
        stats.entries = store.slots.len();
        stats
    }

    /// Remove every slot
    pub async fn clear(&self) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let keys: Vec<CacheKey> = store.slots.drain().map(|(key, _)| key).collect();
        if self.config.enable_metrics {
            store.stats.invalidations += keys.len() as u64;
        }

        info!("Cleared {} slots from cache provider", keys.len());
        InvalidationEvent::new(InvalidationReason::Cleared, InvalidationScope::Keys(keys))
    }

    /// Remove all slots whose TTL hint has elapsed
    pub async fn cleanup_expired(&self) -> InvalidationEvent {
        let now = self.clock.now_nanos();
        let mut store = self.store.write().await;

        let expired: Vec<CacheKey> = store
            .slots
            .iter()
            .filter(|(_, stored)| stored.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            store.slots.remove(key);
        }

        if self.config.enable_metrics {
            store.stats.evictions_ttl += expired.len() as u64;
        }

        if !expired.is_empty() {
            debug!("Cleaned up {} expired slots", expired.len());
        }

        let count = expired.len();
        InvalidationEvent::new(InvalidationReason::Expired, InvalidationScope::Keys(expired))
            .with_context(format!("Cleaned up {} expired slots", count))
    }

    /// Start a background sweep on the configured interval
    ///
    /// The task holds only a weak reference and stops once the provider is
    /// dropped. Returns `None` outside a tokio runtime.
    pub fn spawn_auto_cleanup(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let weak = Arc::downgrade(self);
        let interval = self.config.cleanup_interval;

        debug!("Starting automatic cache cleanup task (interval: {:?})", interval);

        Some(runtime.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let Some(provider) = weak.upgrade() else {
                    break;
                };

                let event = provider.cleanup_expired().await;
                if !event.is_noop() {
                    debug!("Auto cleanup: {:?}", event.scope);
                }
            }
        }))
    }

    fn expiry_for(&self, now: i64, ttl: Duration) -> i64 {
        now.saturating_add(duration_nanos(self.config.ttl_with_jitter(ttl)))
    }
}

impl StoredSlot {
    fn is_expired(&self, now_nanos: i64) -> bool {
        now_nanos >= self.expires_at_nanos
    }
}

impl fmt::Debug for MemoryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryProvider")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheProvider for MemoryProvider {
    async fn get(&self, key: &str) -> Option<CacheSlot> {
        let now = self.clock.now_nanos();
        let mut store = self.store.write().await;
        let metrics = self.config.enable_metrics;

        let expired = match store.slots.get(key) {
            None => {
                if metrics {
                    store.stats.misses += 1;
                }
                return None;
            }
            Some(stored) => stored.is_expired(now),
        };

        if expired {
            debug!("Cache slot expired: {}", key);
            store.slots.remove(key);
            if metrics {
                store.stats.misses += 1;
                store.stats.evictions_ttl += 1;
            }
            return None;
        }

        if metrics {
            store.stats.hits += 1;
        }
        store.slots.get(key).map(|stored| stored.slot.clone())
    }

    async fn set(&self, key: CacheKey, value: CacheSlot, ttl: Duration) {
        let expires_at_nanos = self.expiry_for(self.clock.now_nanos(), ttl);
        let mut store = self.store.write().await;

        store.slots.insert(
            key,
            StoredSlot {
                slot: value,
                expires_at_nanos,
            },
        );
    }

    async fn delete(&self, key: &str) {
        let mut store = self.store.write().await;

        if store.slots.remove(key).is_some() {
            if self.config.enable_metrics {
                store.stats.invalidations += 1;
            }
            debug!("Removed cache slot: {}", key);
        }
    }
}
