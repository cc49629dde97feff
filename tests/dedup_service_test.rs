//! End-to-end tests for the dedup save service.
//!
//! Exercises the full stack (service, repository, identity allocator,
//! content locks) against the deterministic in-memory store with a short
//! processing delay.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clasp::api::ExistsRequest;
use clasp::repository::write_lock_key;
use clasp::service::save_lock_key;
use clasp::{
    ContentLock, CoordinationStore, DeterministicCoordinationStore, ItemIntegrationService,
    ItemRepository, LockConfig, RepositoryConfig, ServiceConfig,
};

fn service_with_delay(
    store: Arc<DeterministicCoordinationStore>,
    processing_delay_ms: u64,
) -> Arc<ItemIntegrationService<DeterministicCoordinationStore>> {
    let repository = Arc::new(ItemRepository::new(
        store.clone(),
        RepositoryConfig {
            processing_delay_ms,
            lock: LockConfig::default(),
        },
    ));
    Arc::new(ItemIntegrationService::new(
        store,
        repository,
        ServiceConfig::default(),
    ))
}

#[tokio::test]
async fn no_items_before_any_save() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store, 10);

    assert!(service.all_items().await.is_empty());
}

#[tokio::test]
async fn sequential_duplicate_is_rejected() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store, 10);

    let first = service.save_item("a").await.unwrap();
    assert!(first.success);
    assert_eq!(first.message, "Item with content a saved with id 1");

    let second = service.save_item("a").await.unwrap();
    assert!(!second.success);
    assert_eq!(second.message, "Duplicate item received with content a.");
}

#[tokio::test]
async fn concurrent_equal_content_saves_at_most_once() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store, 100);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.save_item("a").await.unwrap() })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().success {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(service.all_items().await.len(), 1);
}

#[tokio::test]
async fn fifty_concurrent_saves_yield_one_item_per_content() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store.clone(), 100);

    let contents = ["a", "b", "c"];
    let handles: Vec<_> = (0..50)
        .map(|i| {
            let service = service.clone();
            let content = contents[i % contents.len()];
            tokio::spawn(async move { service.save_item(content).await.unwrap() })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().success {
            successes += 1;
        }
    }

    let items = service.all_items().await;
    assert!(items.len() <= 3);
    assert_eq!(successes, items.len());

    // One item per distinct content, each with a real, unique identity.
    let mut contents_seen: Vec<String> =
        items.iter().map(|i| i.content.to_ascii_lowercase()).collect();
    contents_seen.sort();
    contents_seen.dedup();
    assert_eq!(contents_seen.len(), items.len());

    let mut ids: Vec<u64> = items.iter().map(|i| i.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), items.len());
    assert!(ids.iter().all(|&id| id != 0));

    // Every lock was released on every path.
    for content in contents {
        for key in [save_lock_key(content), write_lock_key(content)] {
            assert!(
                !store.exists(ExistsRequest::new(key)).await.unwrap().exists,
                "lock key leaked for content '{content}'"
            );
        }
    }
}

#[tokio::test]
async fn distinct_content_saves_run_in_parallel() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store, 500);

    let started = Instant::now();
    let (first, second) = tokio::join!(service.save_item("a"), service.save_item("b"));
    let elapsed = started.elapsed();

    assert!(first.unwrap().success);
    assert!(second.unwrap().success);

    // Serialized execution would take at least a second.
    assert!(
        elapsed < Duration::from_millis(850),
        "distinct-content saves serialized: {elapsed:?}"
    );
}

#[tokio::test]
async fn identities_are_sequential_across_saves() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store, 10);

    assert!(service.save_item("a").await.unwrap().success);
    assert!(service.save_item("b").await.unwrap().success);
    assert!(service.save_item("c").await.unwrap().success);

    let mut ids: Vec<u64> = service.all_items().await.iter().map(|i| i.id).collect();
    ids.sort_unstable();

    // Three allocations moved the counter by exactly three.
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn snapshots_never_observe_partial_items() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let service = service_with_delay(store, 50);

    let contents = ["a", "b", "c", "d", "e"];
    let handles: Vec<_> = contents
        .iter()
        .map(|content| {
            let service = service.clone();
            let content = content.to_string();
            tokio::spawn(async move { service.save_item(&content).await.unwrap() })
        })
        .collect();

    // Poll snapshots while the saves are in flight.
    for _ in 0..20 {
        for item in service.all_items().await {
            assert!(!item.content.is_empty());
            assert_ne!(item.id, 0);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for handle in handles {
        assert!(handle.await.unwrap().success);
    }
    assert_eq!(service.all_items().await.len(), contents.len());
}

// The release path deletes on key existence without comparing tokens: a
// release delayed past the TTL removes the successor holder's lock.
#[tokio::test]
async fn stale_release_reopens_successor_critical_section() {
    let store = Arc::new(DeterministicCoordinationStore::new());
    let key = save_lock_key("a");

    let first = ContentLock::new(store.clone(), key.clone(), LockConfig { ttl_ms: 50 });
    let second = ContentLock::new(store.clone(), key.clone(), LockConfig::default());

    assert!(first.try_acquire().await.unwrap());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(second.try_acquire().await.unwrap());

    // The first holder's TTL is long gone, yet its release deletes the
    // second holder's key.
    assert!(first.release().await.unwrap());
    assert!(
        !store.exists(ExistsRequest::new(key)).await.unwrap().exists,
        "successor's lock should have been removed by the stale release"
    );
}
