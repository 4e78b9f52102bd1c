//! Integration tests for the read-through cache coordinator
//!
//! These tests exercise the coordinator against the in-memory store:
//! - Repeated reads served from cache
//! - Freshness decided by entry timestamps
//! - Bucket isolation and invalidation
//! - Error propagation from the backing store
//! - Concurrent access

use futures::future::join_all;
use ouroboros_cache::{
    CacheConfig, CacheCoordinator, CacheError, CacheKeyDescriptor, Cacheable, InvalidationScope,
    ManualClock, MemoryStore, ReadWriteStore, Record, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
    status: String,
    total: i64,
}

impl Cacheable for Order {
    fn cache_key(&self) -> String {
        format!("status={}", self.status)
    }

    fn cache_bucket(&self) -> String {
        "orders".to_string()
    }
}

impl Record for Order {
    fn primary_key(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: u64,
    name: String,
}

impl Cacheable for Widget {
    fn cache_key(&self) -> String {
        format!("name={}", self.name)
    }

    fn cache_bucket(&self) -> String {
        "widgets".to_string()
    }
}

impl Record for Widget {
    fn primary_key(&self) -> String {
        self.id.to_string()
    }
}

const MINUTE: Duration = Duration::from_secs(60);

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    coordinator: CacheCoordinator<MemoryStore>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let config = CacheConfig::builder().enable_auto_cleanup(false).build();

    let coordinator = CacheCoordinator::with_clock(
        ReadWriteStore::from_shared(store.clone()),
        config,
        clock.clone(),
    );

    Harness {
        store,
        clock,
        coordinator,
    }
}

fn active() -> Order {
    Order {
        status: "active".to_string(),
        ..Default::default()
    }
}

fn order(id: u64, status: &str, total: i64) -> Order {
    Order {
        id,
        status: status.to_string(),
        total,
    }
}

async fn seed_orders(store: &MemoryStore) {
    use ouroboros_cache::Store;

    store.save(&order(1, "active", 10)).await.unwrap();
    store.save(&order(2, "closed", 20)).await.unwrap();
    store.save(&order(3, "active", 30)).await.unwrap();
}

#[tokio::test]
async fn test_repeated_reads_hit_store_once() {
    let h = harness();
    seed_orders(&h.store).await;
    let before = h.store.operations();

    let first = h.coordinator.find_many(&active(), MINUTE).await.unwrap();
    let second = h.coordinator.find_many(&active(), MINUTE).await.unwrap();

    assert_eq!(first, vec![order(1, "active", 10), order(3, "active", 30)]);
    assert_eq!(first, second);
    assert_eq!(h.store.operations() - before, 1);
}

#[tokio::test]
async fn test_query_shapes_do_not_collide() {
    let h = harness();
    seed_orders(&h.store).await;
    let before = h.store.operations();

    let many = h.coordinator.find_many(&active(), MINUTE).await.unwrap();
    let first = h.coordinator.find_first(&active(), MINUTE).await.unwrap();
    let last = h.coordinator.find_last(&active(), MINUTE).await.unwrap();
    let count = h.coordinator.count(&active(), MINUTE).await.unwrap();

    assert_eq!(many.len(), 2);
    assert_eq!(first.id, 1);
    assert_eq!(last.id, 3);
    assert_eq!(count, 2);
    assert_eq!(h.store.operations() - before, 4);

    // All four are cached independently
    h.coordinator.find_first(&active(), MINUTE).await.unwrap();
    h.coordinator.count(&active(), MINUTE).await.unwrap();
    assert_eq!(h.store.operations() - before, 4);
}

#[tokio::test]
async fn test_count_refreshes_after_ttl() {
    let h = harness();
    let descriptor = || {
        CacheKeyDescriptor::new()
            .bucket("orders")
            .extra("status=active")
    };
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let run = |answer: i64| {
        let calls = calls.clone();
        move |_store| async move {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(answer)
        }
    };

    let count: i64 = h.coordinator.execute(run(42), MINUTE, descriptor()).await.unwrap();
    assert_eq!(count, 42);

    h.clock.advance(Duration::from_secs(30));
    let count: i64 = h.coordinator.execute(run(43), MINUTE, descriptor()).await.unwrap();
    assert_eq!(count, 42, "fresh entry must be served from cache");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    h.clock.advance(Duration::from_secs(31));
    let count: i64 = h.coordinator.execute(run(43), MINUTE, descriptor()).await.unwrap();
    assert_eq!(count, 43, "stale entry must be replaced");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_shorter_ttl_on_read_sees_entry_as_stale() {
    let h = harness();
    seed_orders(&h.store).await;
    let before = h.store.operations();

    h.coordinator.count(&active(), Duration::from_secs(3600)).await.unwrap();
    h.clock.advance(Duration::from_secs(10));

    // Freshness is judged against the TTL of the current read
    h.coordinator.count(&active(), Duration::from_secs(5)).await.unwrap();
    assert_eq!(h.store.operations() - before, 2);
}

#[tokio::test]
async fn test_save_flush_drops_bucket() {
    let h = harness();
    let all = Widget::default();

    assert_eq!(h.coordinator.count(&all, MINUTE).await.unwrap(), 0);

    h.coordinator
        .save_flush(&Widget {
            id: 1,
            name: "sprocket".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.coordinator.count(&all, MINUTE).await.unwrap(), 1);
    assert!(h.coordinator.provider().get("widgets").await.is_some());
}

#[tokio::test]
async fn test_save_flush_leaves_other_buckets_cached() {
    let h = harness();
    seed_orders(&h.store).await;

    h.coordinator.count(&active(), MINUTE).await.unwrap();
    h.coordinator.count(&Widget::default(), MINUTE).await.unwrap();
    let before = h.store.operations();

    h.coordinator
        .save_flush(&Widget {
            id: 9,
            name: "gear".to_string(),
        })
        .await
        .unwrap();

    h.coordinator.count(&active(), MINUTE).await.unwrap();
    h.coordinator.count(&Widget::default(), MINUTE).await.unwrap();

    // One save plus the widget recount; the order count stays cached
    assert_eq!(h.store.operations() - before, 2);
}

#[tokio::test]
async fn test_failed_save_does_not_invalidate() {
    let h = harness();
    let all = Widget::default();

    assert_eq!(h.coordinator.count(&all, MINUTE).await.unwrap(), 0);

    h.store
        .fail_next(StoreError::WriteError("disk full".to_string()))
        .await;

    let err = h
        .coordinator
        .save_flush(&Widget {
            id: 1,
            name: "sprocket".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.as_store_error(),
        Some(&StoreError::WriteError("disk full".to_string()))
    );
    assert!(h.coordinator.provider().get("widgets").await.is_some());
}

#[tokio::test]
async fn test_flush_key_then_bucket() {
    let h = harness();
    seed_orders(&h.store).await;

    h.coordinator.count(&active(), MINUTE).await.unwrap();
    h.coordinator.find_many(&active(), MINUTE).await.unwrap();
    let before = h.store.operations();

    let count_key = CacheKeyDescriptor::new()
        .search(&active())
        .extra(ouroboros_cache::cache::COUNT)
        .of_type::<i64>();

    let event = h.coordinator.flush(&count_key).await.unwrap();
    assert_eq!(
        event.scope,
        InvalidationScope::Key {
            bucket: Some("orders".to_string()),
            key: count_key.generate(),
        }
    );

    h.coordinator.count(&active(), MINUTE).await.unwrap();
    h.coordinator.find_many(&active(), MINUTE).await.unwrap();
    assert_eq!(h.store.operations() - before, 1);

    let event = h.coordinator.flush_bucket_of(&active()).await.unwrap();
    assert_eq!(event.scope, InvalidationScope::Bucket("orders".to_string()));

    h.coordinator.count(&active(), MINUTE).await.unwrap();
    h.coordinator.find_many(&active(), MINUTE).await.unwrap();
    assert_eq!(h.store.operations() - before, 3);
}

#[tokio::test]
async fn test_empty_descriptor_is_invalid_argument() {
    let h = harness();

    let err = h
        .coordinator
        .execute::<Vec<Order>, _, _>(
            |store| async move { ouroboros_cache::Store::find_many(store.read(), &active()).await },
            MINUTE,
            CacheKeyDescriptor::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::InvalidArgument(_)));
    assert_eq!(h.store.operations(), 0);
}

#[tokio::test]
async fn test_store_error_propagates_and_nothing_is_cached() {
    let h = harness();
    seed_orders(&h.store).await;

    h.store
        .fail_next(StoreError::TimeoutError {
            timeout_seconds: 5,
            context: "find_many".to_string(),
        })
        .await;

    let err = h.coordinator.find_many(&active(), MINUTE).await.unwrap_err();
    assert_eq!(
        err.as_store_error(),
        Some(&StoreError::TimeoutError {
            timeout_seconds: 5,
            context: "find_many".to_string(),
        })
    );

    let before = h.store.operations();
    let found = h.coordinator.find_many(&active(), MINUTE).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(h.store.operations() - before, 1);
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let h = harness();
    let pending = Order {
        status: "pending".to_string(),
        ..Default::default()
    };

    let err = h.coordinator.find_first(&pending, MINUTE).await.unwrap_err();
    assert!(matches!(err.as_store_error(), Some(StoreError::NotFound(_))));

    use ouroboros_cache::Store;
    h.store.save(&order(4, "pending", 5)).await.unwrap();

    let found = h.coordinator.find_first(&pending, MINUTE).await.unwrap();
    assert_eq!(found.id, 4);
}

#[tokio::test]
async fn test_wrong_result_shape_is_internal_error() {
    let h = harness();
    let descriptor = CacheKeyDescriptor::new()
        .type_name("report")
        .extra("monthly");

    let rows: Vec<String> = h
        .coordinator
        .execute(
            |_| async { Ok(vec!["a".to_string(), "b".to_string()]) },
            MINUTE,
            descriptor.clone(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let err = h
        .coordinator
        .execute::<i64, _, _>(|_| async { Ok(2) }, MINUTE, descriptor)
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InternalError(_)));
}

#[tokio::test]
async fn test_buckets_are_isolated() {
    let h = harness();
    let orders = CacheKeyDescriptor::new().bucket("orders").extra("summary");
    let widgets = CacheKeyDescriptor::new().bucket("widgets").extra("summary");

    let a: String = h
        .coordinator
        .execute(|_| async { Ok("orders".to_string()) }, MINUTE, orders.clone())
        .await
        .unwrap();
    let b: String = h
        .coordinator
        .execute(|_| async { Ok("widgets".to_string()) }, MINUTE, widgets.clone())
        .await
        .unwrap();
    assert_eq!(a, "orders");
    assert_eq!(b, "widgets");

    h.coordinator
        .flush(&CacheKeyDescriptor::new().bucket("orders"))
        .await
        .unwrap();

    let a: String = h
        .coordinator
        .execute(|_| async { Ok("orders again".to_string()) }, MINUTE, orders)
        .await
        .unwrap();
    let b: String = h
        .coordinator
        .execute(|_| async { Ok("widgets again".to_string()) }, MINUTE, widgets)
        .await
        .unwrap();
    assert_eq!(a, "orders again");
    assert_eq!(b, "widgets");
}

#[tokio::test]
async fn test_concurrent_reads() {
    let h = harness();
    seed_orders(&h.store).await;
    let coordinator = Arc::new(h.coordinator);

    // Warm the cache so every concurrent read is a hit
    coordinator.count(&active(), MINUTE).await.unwrap();
    let before = h.store.operations();

    let reads = (0..20).map(|_| {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.count(&active(), MINUTE).await })
    });

    for result in join_all(reads).await {
        assert_eq!(result.unwrap().unwrap(), 2);
    }
    assert_eq!(h.store.operations(), before);
}

#[tokio::test]
async fn test_concurrent_first_access_across_buckets() {
    let h = harness();
    let coordinator = Arc::new(h.coordinator);

    let reads = (0..10).map(|i| {
        let coordinator = coordinator.clone();
        async move {
            let descriptor = CacheKeyDescriptor::new()
                .bucket(format!("bucket_{}", i))
                .extra("value");
            coordinator
                .execute(move |_| async move { Ok(i as i64) }, MINUTE, descriptor)
                .await
        }
    });

    let values: Vec<i64> = join_all(reads)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(values, (0..10).collect::<Vec<i64>>());

    for i in 0..10 {
        let slot = coordinator
            .provider()
            .get(&format!("bucket_{}", i))
            .await
            .unwrap();
        assert!(slot.as_bucket().is_some());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Summary {
    label: String,
    #[serde(skip_serializing)]
    checksum: u64,
}

#[tokio::test]
async fn test_result_that_does_not_survive_encoding_is_served_fresh() {
    let h = harness();
    let descriptor = || CacheKeyDescriptor::new().bucket("reports").extra("summary");
    let summary = |label: &str| Summary {
        label: label.to_string(),
        checksum: 7,
    };

    let first: Summary = h
        .coordinator
        .execute(move |_| async move { Ok(summary("first")) }, MINUTE, descriptor())
        .await
        .unwrap();
    assert_eq!(first.label, "first");

    // Nothing was cached, so the next read goes back to the miss-handler
    let second: Summary = h
        .coordinator
        .execute(move |_| async move { Ok(summary("second")) }, MINUTE, descriptor())
        .await
        .unwrap();
    assert_eq!(second.label, "second");
}
