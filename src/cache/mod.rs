//! # Read-Through Caching Layer
//!
//! This module implements the cache that sits in front of a [`Store`](crate::store::Store).
//!
//! ## Features
//!
//! - **Deterministic keys**: query descriptors turn into stable string keys
//! - **Bucketed caches**: one sub-cache per logical table, dropped as a unit
//! - **Read-time freshness**: entries are served only while younger than the
//!   caller's TTL, whatever the provider's own expiry says
//! - **Pluggable providers**: anything implementing [`CacheProvider`]
//!
//! ## Example
//!
//! ```rust
//! use ouroboros_cache::cache::{CacheConfig, CacheCoordinator, CacheKeyDescriptor};
//! use ouroboros_cache::store::{MemoryStore, ReadWriteStore};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let coordinator = CacheCoordinator::new(
//!     ReadWriteStore::shared(MemoryStore::new()),
//!     CacheConfig::default(),
//! );
//!
//! let descriptor = CacheKeyDescriptor::new().bucket("reports").extra("daily-total");
//! let total: i64 = coordinator
//!     .execute(|_store| async { Ok(42) }, Duration::from_secs(60), descriptor)
//!     .await?;
//! assert_eq!(total, 42);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod entry;
pub mod invalidation;
pub mod key;
pub mod provider;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use coordinator::{CacheCoordinator, COUNT, FIND_FIRST, FIND_LAST, FIND_MANY};
pub use entry::{CacheSlot, CachedEntry};
pub use invalidation::{InvalidationEvent, InvalidationReason, InvalidationScope};
pub use key::{CacheKeyDescriptor, SearchFragment, KEY_SEPARATOR};
pub use provider::{provider_factory, CacheProvider, ProviderFactory};
pub use store::MemoryProvider;
pub use types::{CacheKey, CacheStats};
