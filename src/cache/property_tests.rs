//! Property-Based Tests for the Caching Subsystem
//!
//! Uses proptest to verify the cache invariants: capacity enforcement,
//! strict-LRU eviction order, update-in-place semantics, promotion on read,
//! and cache-key determinism. Concurrency is exercised separately with
//! plain threaded stress tests.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use crate::cache::LruCache;
use crate::client::HeaderFingerprint;

// == Strategies ==
/// Generates valid cache keys.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}"
}

/// Generates cache values.
fn value_strategy() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Generates a header map with distinct lowercase names.
fn header_set_strategy() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map("[a-z][a-z-]{2,10}", "[a-zA-Z0-9/. ]{1,30}", 1..6)
}

/// Uppercases every other character of a header name, giving a casing
/// variant that still names the same header.
fn scramble_case(name: &str) -> String {
    name.chars()
        .enumerate()
        .map(|(i, c)| {
            if i % 2 == 0 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of puts, the size never exceeds capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let capacity = 50;
        let cache: LruCache<String, u64> = LruCache::new(capacity);

        for (key, value) in entries {
            cache.put(key, value);
            prop_assert!(
                cache.len() <= capacity,
                "cache size {} exceeds capacity {}",
                cache.len(),
                capacity
            );
        }
        cache.assert_consistent();
    }

    // Filling a cache to capacity and adding one more key evicts exactly
    // the least-recently-touched key.
    #[test]
    fn prop_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 3..10),
        new_key in key_strategy()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        prop_assume!(!keys.contains(&new_key));

        let capacity = keys.len();
        let cache: LruCache<String, u64> = LruCache::new(capacity);
        for (i, key) in keys.iter().enumerate() {
            cache.put(key.clone(), i as u64);
        }

        cache.put(new_key.clone(), 999);

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(cache.get(&keys[0]).is_none(), "oldest key should be evicted");
        prop_assert!(cache.get(&new_key).is_some());
        for key in keys.iter().skip(1) {
            prop_assert!(cache.get(key).is_some(), "younger key was evicted");
        }
        cache.assert_consistent();
    }

    // Re-putting an existing key replaces the value without changing size.
    #[test]
    fn prop_update_in_place(
        keys in prop::collection::hash_set(key_strategy(), 2..10),
        new_value in value_strategy()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let cache: LruCache<String, u64> = LruCache::new(keys.len());
        for (i, key) in keys.iter().enumerate() {
            cache.put(key.clone(), i as u64);
        }

        let size_before = cache.len();
        cache.put(keys[0].clone(), new_value);

        prop_assert_eq!(cache.len(), size_before);
        prop_assert_eq!(cache.get(&keys[0]), Some(new_value));
        cache.assert_consistent();
    }

    // A get hit makes the key most-recently-used, protecting it from the
    // eviction that would otherwise target it.
    #[test]
    fn prop_promotion_on_read(
        keys in prop::collection::hash_set(key_strategy(), 3..8),
        new_key in key_strategy()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        prop_assume!(!keys.contains(&new_key));

        let cache: LruCache<String, u64> = LruCache::new(keys.len());
        for (i, key) in keys.iter().enumerate() {
            cache.put(key.clone(), i as u64);
        }

        // Touch the would-be victim; its successor becomes the victim.
        cache.get(&keys[0]);
        cache.put(new_key, 999);

        prop_assert!(cache.get(&keys[0]).is_some(), "touched key was evicted");
        prop_assert!(cache.get(&keys[1]).is_none(), "expected victim survived");
        cache.assert_consistent();
    }

    // The most recent put wins for any key.
    #[test]
    fn prop_get_returns_last_put(
        key in key_strategy(),
        values in prop::collection::vec(value_strategy(), 1..10)
    ) {
        let cache: LruCache<String, u64> = LruCache::new(4);
        for value in &values {
            cache.put(key.clone(), *value);
        }
        prop_assert_eq!(cache.get(&key), Some(*values.last().unwrap()));
        prop_assert_eq!(cache.len(), 1);
    }

    // Header fingerprints are identical for semantically equal header sets,
    // regardless of name casing or insertion order.
    #[test]
    fn prop_fingerprint_determinism(headers in header_set_strategy()) {
        let names: Vec<String> = headers.keys().cloned().collect();
        let fingerprint = HeaderFingerprint::new(names);

        let scrambled: HashMap<String, String> = headers
            .iter()
            .map(|(name, value)| (scramble_case(name), value.clone()))
            .collect();

        prop_assert_eq!(fingerprint.key_for(&headers), fingerprint.key_for(&scrambled));
        prop_assert_eq!(fingerprint.normalize(&headers), fingerprint.normalize(&scrambled));
    }
}

// == Concurrent Stress Tests ==
#[cfg(test)]
mod stress {
    use super::*;

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache: Arc<LruCache<String, u64>> = Arc::new(LruCache::new(64));
        let mut handles = Vec::new();

        for worker in 0..8u64 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..2_000u64 {
                    let key = ((worker * 31 + i) % 128).to_string();
                    if i % 3 == 0 {
                        cache.get(&key);
                    } else {
                        cache.put(key, i);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert!(cache.len() <= 64);
        cache.assert_consistent();
    }

    #[test]
    fn test_concurrent_stress_with_interleaved_clears() {
        let cache: Arc<LruCache<String, u64>> = Arc::new(LruCache::new(32));
        let mut handles = Vec::new();

        for worker in 0..6u64 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..2_000u64 {
                    let key = ((worker * 17 + i) % 64).to_string();
                    match i % 4 {
                        0 => {
                            cache.get(&key);
                        }
                        3 if i % 101 == 0 => cache.clear(),
                        _ => cache.put(key, i),
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert!(cache.len() <= 32);
        cache.assert_consistent();

        // Cache stays fully usable afterwards
        cache.put("after".to_string(), 1);
        assert_eq!(cache.get(&"after".to_string()), Some(1));
    }

    #[test]
    fn test_concurrent_distinct_keys_respect_capacity() {
        let capacity = 16;
        let cache: Arc<LruCache<String, u64>> = Arc::new(LruCache::new(capacity));
        let mut handles = Vec::new();

        // Every thread writes its own key space; no two threads collide.
        for worker in 0..4u64 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..500u64 {
                    cache.put(format!("w{worker}-{i}"), i);
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert_eq!(cache.len(), capacity);
        cache.assert_consistent();

        // Evictions account for every insert beyond capacity
        let stats = cache.stats();
        assert_eq!(stats.evictions, 4 * 500 - capacity as u64);

        // The surviving keys are all distinct
        let mut seen = HashSet::new();
        for worker in 0..4u64 {
            for i in 0..500u64 {
                let key = format!("w{worker}-{i}");
                if cache.get(&key).is_some() {
                    assert!(seen.insert(key));
                }
            }
        }
        assert_eq!(seen.len(), capacity);
    }
}
