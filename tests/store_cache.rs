//! Integration Tests for the store-backed facade

use std::time::Duration;

use bytes::Bytes;
use cachet::{Cache, CacheConfig, EvictionPolicy, JsonSerializer, KeyBuilder, MemoryStore, Store, StoreCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: u64,
    name: String,
    tags: Vec<String>,
}

type ProfileCache = StoreCache<Profile, MemoryStore, JsonSerializer<Profile>>;

fn profile(id: u64, name: &str) -> Profile {
    Profile {
        id,
        name: name.to_string(),
        tags: vec!["beta".to_string()],
    }
}

fn shared_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(CacheConfig::default()))
}

fn profiles(store: &Arc<MemoryStore>, prefix: &str) -> ProfileCache {
    StoreCache::with_shared(
        Arc::clone(store),
        Arc::new(JsonSerializer::new()),
        KeyBuilder::new(prefix),
    )
}

#[tokio::test]
async fn test_typed_values_survive_the_store() {
    let store = shared_store();
    let cache = profiles(&store, "profiles");

    cache.set("1", profile(1, "ada"), None).await.unwrap();
    assert_eq!(cache.get("1").await, Some(profile(1, "ada")));
    assert!(cache.contains("1").await);

    let raw = store.get("profiles:1").await.unwrap().unwrap();
    let decoded: Profile = serde_json::from_slice(&raw).unwrap();
    assert_eq!(decoded, profile(1, "ada"));
}

#[tokio::test]
async fn test_corrupt_bytes_read_as_miss() {
    let store = shared_store();
    let cache = profiles(&store, "profiles");

    store
        .set("profiles:9", Bytes::from_static(b"\xff\xfe"), None)
        .await
        .unwrap();

    assert_eq!(cache.get("9").await, None);
}

#[tokio::test]
async fn test_namespaces_share_a_store() {
    let store = shared_store();
    let staff = profiles(&store, "staff");
    let guests = profiles(&store, "guests");

    staff.set("1", profile(1, "ada"), None).await.unwrap();
    staff.set("2", profile(2, "grace"), None).await.unwrap();
    guests.set("1", profile(3, "linus"), None).await.unwrap();

    let mut staff_keys = staff.keys().await;
    staff_keys.sort();
    assert_eq!(staff_keys, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(guests.get("1").await, Some(profile(3, "linus")));

    staff.clear().await.unwrap();
    assert_eq!(staff.size().await, 0);
    assert_eq!(guests.size().await, 1);
    assert_eq!(store.size("").await.unwrap(), 1);
}

#[tokio::test]
async fn test_for_each_stops_early() {
    let store = shared_store();
    let cache = profiles(&store, "p");
    for id in 0..5 {
        cache
            .set(&id.to_string(), profile(id, "n"), None)
            .await
            .unwrap();
    }

    let mut visited = 0;
    cache
        .for_each(&mut |_, _| {
            visited += 1;
            visited < 2
        })
        .await
        .unwrap();
    assert_eq!(visited, 2);
}

#[tokio::test]
async fn test_store_ttl_and_eviction_apply_through_facade() {
    let store = MemoryStore::new(
        CacheConfig::default()
            .with_max_size(2)
            .with_eviction_policy(EvictionPolicy::Lru),
    );
    let cache: ProfileCache = StoreCache::new(store, JsonSerializer::new(), KeyBuilder::default());

    cache
        .set("short", profile(1, "a"), Some(Duration::from_millis(40)))
        .await
        .unwrap();
    cache.set("long", profile(2, "b"), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.get("short").await, None);

    cache.set("x", profile(3, "c"), None).await.unwrap();
    cache.set("y", profile(4, "d"), None).await.unwrap();
    assert_eq!(cache.size().await, 2);
    assert!(!cache.contains("long").await);
    assert_eq!(cache.store().engine().stats().evictions, 1);
}

#[tokio::test]
async fn test_closed_store_rejects_writes() {
    let store = shared_store();
    let cache = profiles(&store, "p");
    cache.set("1", profile(1, "a"), None).await.unwrap();

    cache.close().await.unwrap();
    assert_eq!(cache.get("1").await, None);
    assert!(cache.set("2", profile(2, "b"), None).await.is_err());
}
