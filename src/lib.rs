//! # Ouroboros Cache (ouroboros-cache)
//!
//! A read-through query cache for Rust, sitting in front of a record store.
//!
//! ## Features
//!
//! - Deterministic cache keys built from query descriptors
//! - Per-table bucket sub-caches, invalidated as a unit on writes
//! - Freshness decided at read time against a caller-supplied TTL
//! - Async-first design using tokio
//! - Pluggable cache providers and backing stores
//! - Detailed error handling that keeps store errors intact
//!
//! ## Reading Through the Cache
//!
//! Criteria are partially filled records. Fields left at their zero value do
//! not constrain the query.
//!
//! ```no_run
//! use ouroboros_cache::{CacheConfig, CacheCoordinator, Cacheable, MemoryStore, ReadWriteStore, Record};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Order {
//!     id: u64,
//!     status: String,
//! }
//!
//! impl Cacheable for Order {
//!     fn cache_key(&self) -> String {
//!         format!("id={}&status={}", self.id, self.status)
//!     }
//!
//!     fn cache_bucket(&self) -> String {
//!         "orders".to_string()
//!     }
//! }
//!
//! impl Record for Order {
//!     fn primary_key(&self) -> String {
//!         self.id.to_string()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let coordinator = CacheCoordinator::new(
//!         ReadWriteStore::shared(MemoryStore::new()),
//!         CacheConfig::from_env()?,
//!     );
//!
//!     let criteria = Order { status: "active".to_string(), ..Default::default() };
//!
//!     // First call hits the store, the second is served from cache
//!     let orders = coordinator.find_many(&criteria, Duration::from_secs(60)).await?;
//!     let again = coordinator.find_many(&criteria, Duration::from_secs(60)).await?;
//!     assert_eq!(orders.len(), again.len());
//!
//!     let active = coordinator.count(&criteria, Duration::from_secs(60)).await?;
//!     println!("Active orders: {}", active);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Queries
//!
//! Anything the store can answer can be cached with
//! [`CacheCoordinator::execute`], given a descriptor that names it:
//!
//! ```no_run
//! use ouroboros_cache::{CacheConfig, CacheCoordinator, CacheKeyDescriptor, MemoryStore, ReadWriteStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let coordinator = CacheCoordinator::new(
//!         ReadWriteStore::shared(MemoryStore::new()),
//!         CacheConfig::default(),
//!     );
//!
//!     let descriptor = CacheKeyDescriptor::new()
//!         .bucket("orders")
//!         .where_clause("total > 100")
//!         .order("created_at desc")
//!         .limit(10);
//!
//!     let ids: Vec<u64> = coordinator
//!         .execute(|_store| async { Ok(vec![7, 3, 1]) }, Duration::from_secs(30), descriptor)
//!         .await?;
//!     println!("Large orders: {:?}", ids);
//!     Ok(())
//! }
//! ```
//!
//! ## Writes and Invalidation
//!
//! [`CacheCoordinator::save_flush`] writes through the write path and drops
//! the record's whole bucket. [`CacheCoordinator::flush`] removes a single key
//! or a whole bucket, depending on what the descriptor carries.
//!
//! ```no_run
//! use ouroboros_cache::{CacheConfig, CacheCoordinator, CacheKeyDescriptor, MemoryStore, ReadWriteStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let coordinator = CacheCoordinator::new(
//!         ReadWriteStore::shared(MemoryStore::new()),
//!         CacheConfig::default(),
//!     );
//!
//!     let event = coordinator
//!         .flush(&CacheKeyDescriptor::new().bucket("orders"))
//!         .await?;
//!     println!("Invalidated: {:?}", event.scope);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod error;
pub mod store;

// Re-export main types for convenience
pub use cache::{
    provider_factory, CacheConfig, CacheConfigBuilder, CacheCoordinator, CacheKey,
    CacheKeyDescriptor, CacheProvider, CacheSlot, CacheStats, CachedEntry, InvalidationEvent,
    InvalidationReason, InvalidationScope, MemoryProvider, ProviderFactory,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, Result, StoreError, StoreResult};
pub use store::{Cacheable, MemoryStore, NamingStrategy, ReadWriteStore, Record, Store};
