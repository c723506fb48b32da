use super::*;
use crate::clock::ManualClock;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn store_with_clock() -> (CacheStore<serde_json::Value>, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    let store = CacheStore::with_clock(Arc::new(clock.clone()));
    (store, clock)
}

#[test]
fn test_get_returns_value_until_ttl_elapses() {
    for ttl in [1u64, 5, 60, 3600] {
        let (store, clock) = store_with_clock();
        store.set("key", json!({"ttl": ttl}), Duration::from_secs(ttl));

        assert_eq!(store.get("key"), Some(json!({"ttl": ttl})));

        clock.advance_secs(ttl as i64 - 1);
        assert!(store.get("key").is_some(), "still live before ttl={}", ttl);

        clock.advance_secs(1);
        assert_eq!(store.get("key"), None, "expired at ttl={}", ttl);
    }
}

#[test]
fn test_expired_entry_is_evicted_on_read() {
    let (store, clock) = store_with_clock();
    store.set("key", json!(1), Duration::from_secs(10));
    assert_eq!(store.len(), 1);

    clock.advance_secs(11);
    assert_eq!(store.get("key"), None);
    assert!(store.is_empty());
}

#[test]
fn test_set_overwrites_and_restarts_ttl() {
    let (store, clock) = store_with_clock();
    store.set("key", json!("first"), Duration::from_secs(10));
    clock.advance_secs(8);
    store.set("key", json!("second"), Duration::from_secs(10));
    clock.advance_secs(8);

    assert_eq!(store.get("key"), Some(json!("second")));
}

#[test]
fn test_zero_ttl_still_creates_live_entry() {
    let (store, _clock) = store_with_clock();
    store.set("key", json!(true), Duration::ZERO);
    assert!(store.exists("key"));
}

#[test]
fn test_delete_and_clear_are_idempotent() {
    let (store, _clock) = store_with_clock();
    store.delete("missing");
    store.clear();

    store.set("a", json!(1), Duration::from_secs(60));
    store.delete("a");
    store.delete("a");
    assert_eq!(store.get("a"), None);

    store.set("b", json!(2), Duration::from_secs(60));
    store.clear();
    store.clear();
    assert!(store.is_empty());
}

#[test]
fn test_delete_by_pattern_removes_exactly_matching_keys() {
    let (store, _clock) = store_with_clock();
    store.set("wp:site1:post:1", json!("x"), Duration::from_secs(60));
    store.set("wp:site1:post:2", json!("y"), Duration::from_secs(60));
    store.set("wp:site2:post:1", json!("z"), Duration::from_secs(60));

    let removed = store.delete_by_pattern("wp:site1:*");

    assert_eq!(removed, 2);
    assert_eq!(store.get("wp:site1:post:1"), None);
    assert_eq!(store.get("wp:site1:post:2"), None);
    assert_eq!(store.get("wp:site2:post:1"), Some(json!("z")));
}

#[test]
fn test_delete_by_pattern_is_anchored_and_case_sensitive() {
    let (store, _clock) = store_with_clock();
    store.set("xwp:site1:post:1", json!(1), Duration::from_secs(60));
    store.set("cache:wp:site1:post:1", json!(2), Duration::from_secs(60));
    store.set("WP:site1:post:1", json!(3), Duration::from_secs(60));
    store.set("wp:site1:post:1", json!(4), Duration::from_secs(60));

    assert_eq!(store.delete_by_pattern("wp:site1:*"), 1);
    assert_eq!(store.len(), 3);

    // A pattern without a wildcard must match the full key
    assert_eq!(store.delete_by_pattern("wp:site1"), 0);
}

#[test]
fn test_pattern_metacharacters_match_literally() {
    let (store, _clock) = store_with_clock();
    store.set("a.b", json!(1), Duration::from_secs(60));
    store.set("axb", json!(2), Duration::from_secs(60));

    assert_eq!(store.delete_by_pattern("a.b"), 1);
    assert_eq!(store.get("axb"), Some(json!(2)));
}

#[test]
fn test_multiple_wildcards() {
    let (store, _clock) = store_with_clock();
    store.set("translation:en:th:abc", json!(1), Duration::from_secs(60));
    store.set("translation:th:en:abc", json!(2), Duration::from_secs(60));
    store.set("content:abc", json!(3), Duration::from_secs(60));

    assert_eq!(
        store.keys_by_pattern("translation:*:*"),
        vec![
            "translation:en:th:abc".to_string(),
            "translation:th:en:abc".to_string()
        ]
    );
    assert_eq!(store.delete_by_pattern("*abc"), 3);
}

#[test]
fn test_sweep_evicts_only_expired_entries() {
    let (store, clock) = store_with_clock();
    store.set("short", json!(1), Duration::from_secs(5));
    store.set("long", json!(2), Duration::from_secs(500));

    clock.advance_secs(10);
    assert_eq!(store.stats().expired_entries, 1);
    assert_eq!(store.sweep(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("long"), Some(json!(2)));
}

#[test]
fn test_stats_track_hits_and_misses() {
    let (store, _clock) = store_with_clock();
    store.set("k", json!(1), Duration::from_secs(60));
    store.get("k");
    store.get("k");
    store.get("missing");

    let stats = store.stats();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_batch_operations() {
    let (store, _clock) = store_with_clock();
    store.set_many(vec![
        ("a".to_string(), json!(1), Duration::from_secs(60)),
        ("b".to_string(), json!(2), Duration::from_secs(60)),
    ]);

    let values = store.get_many(["a", "b", "c"]);
    assert_eq!(values[0], ("a".to_string(), Some(json!(1))));
    assert_eq!(values[2], ("c".to_string(), None));

    store.delete_many(["a", "b"]);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_background_sweeper_reclaims_expired_entries() {
    let clock = ManualClock::new(Utc::now());
    let store: Arc<CacheStore<serde_json::Value>> =
        Arc::new(CacheStore::with_clock(Arc::new(clock.clone())));
    store.set("k", json!(1), Duration::from_secs(1));
    clock.advance_secs(5);

    let handle = store.spawn_sweeper(Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.abort();

    assert!(store.is_empty());
}
