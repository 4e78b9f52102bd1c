//! Read-Through Cache Demo Application
//!
//! Walks through cached reads, expiry, and bucket invalidation against the
//! in-memory store.
//!
//! Usage:
//!   cargo run --example read_through_demo
//!
//! Environment variables:
//!   RUST_LOG                    - log filter (default: info,ouroboros_cache=debug)
//!   CACHE_BUCKET_RETENTION_SECS - retention of bucket sub-caches (default: 86400)
//!   CACHE_TTL_JITTER            - provider TTL hint jitter, 0.0 - 1.0 (default: 0.0)

use ouroboros_cache::{
    CacheConfig, CacheCoordinator, CacheKeyDescriptor, Cacheable, ManualClock, MemoryStore,
    ReadWriteStore, Record, Store, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Order {
    id: u64,
    customer: String,
    status: String,
    total: i64,
}

impl Cacheable for Order {
    fn cache_key(&self) -> String {
        format!(
            "id={}&customer={}&status={}&total={}",
            self.id, self.customer, self.status, self.total
        )
    }

    fn cache_bucket(&self) -> String {
        "shop_orders".to_string()
    }
}

impl Record for Order {
    fn primary_key(&self) -> String {
        self.id.to_string()
    }
}

fn order(id: u64, customer: &str, status: &str, total: i64) -> Order {
    Order {
        id,
        customer: customer.to_string(),
        status: status.to_string(),
        total,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ouroboros_cache=debug")),
        )
        .init();

    info!("=== Read-Through Cache Demo ===");

    let config = CacheConfig::from_env()?;
    info!("Cache configuration: {:?}", config);

    let store = Arc::new(MemoryStore::new());
    for o in [
        order(1, "ada", "active", 120),
        order(2, "grace", "closed", 80),
        order(3, "ada", "active", 45),
    ] {
        store.save(&o).await?;
    }

    // A manual clock lets the demo skip ahead instead of sleeping
    let clock = Arc::new(ManualClock::starting_now());
    let coordinator =
        CacheCoordinator::with_clock(ReadWriteStore::from_shared(store.clone()), config, clock.clone());

    let active = Order {
        status: "active".to_string(),
        ..Default::default()
    };
    let ttl = Duration::from_secs(60);

    info!("\n--- Cached reads ---");
    let orders = coordinator.find_many(&active, ttl).await?;
    info!("Active orders: {}", orders.len());
    let orders = coordinator.find_many(&active, ttl).await?;
    info!("Active orders again: {} (store operations: {})", orders.len(), store.operations());

    let first = coordinator.find_first(&active, ttl).await?;
    let last = coordinator.find_last(&active, ttl).await?;
    info!("First active: #{}, last active: #{}", first.id, last.id);

    info!("\n--- Expiry ---");
    let count = coordinator.count(&active, ttl).await?;
    info!("Active count: {}", count);
    clock.advance(Duration::from_secs(61));
    let count = coordinator.count(&active, ttl).await?;
    info!("Active count after 61s: {} (store operations: {})", count, store.operations());

    info!("\n--- Custom query ---");
    let descriptor = CacheKeyDescriptor::new()
        .bucket("shop_orders")
        .where_clause("total > 100")
        .order("total desc");
    let big: Vec<u64> = coordinator
        .execute(
            |store| async move {
                let all = store.read().find_many(&Order::default()).await?;
                let ids: Vec<u64> = all.into_iter().filter(|o| o.total > 100).map(|o| o.id).collect();
                Ok::<_, StoreError>(ids)
            },
            ttl,
            descriptor,
        )
        .await?;
    info!("Orders above 100: {:?}", big);

    info!("\n--- Write and invalidate ---");
    coordinator
        .save_flush(&order(4, "grace", "active", 300))
        .await?;
    let count = coordinator.count(&active, ttl).await?;
    info!("Active count after save: {}", count);

    let event = coordinator.flush_bucket_of(&active).await?;
    info!("Flushed: {:?}", event.scope);

    info!("\n=== Demo Complete ===");
    Ok(())
}
