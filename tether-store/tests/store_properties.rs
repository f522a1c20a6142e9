//! Property-based tests for the queue store contract.
//!
//! Uses proptest to fuzz-verify:
//!   - put/get round-trips preserve JSON exactly
//!   - prefix scans return sorted, prefix-exact key sets
//!   - delete removes only the named key
//!   - the in-memory store agrees with SQLite on arbitrary workloads

use proptest::prelude::*;
use serde_json::json;

use tether_core::traits::IQueueStore;
use tether_store::{MemoryQueueStore, SqliteQueueStore};

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().expect("tokio runtime")
}

#[derive(Debug, Clone)]
enum Op {
    Put(String, i64),
    Delete(String),
}

/// Tiny keyspace so workloads collide on purpose.
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("[a-c]{1,2}", any::<i64>()).prop_map(|(k, v)| Op::Put(k, v)),
        "[a-c]{1,2}".prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trip_preserves_value(
        suffix in "[a-z0-9-]{1,24}",
        text in "\\PC{0,80}",
        number in any::<i64>(),
    ) {
        let rt = rt();
        let value = json!({ "text": text, "number": number });
        let got = rt.block_on(async {
            let store = SqliteQueueStore::open_in_memory().await.unwrap();
            let key = format!("http-outbox:{suffix}");
            store.put(&key, &value).await.unwrap();
            store.get(&key).await.unwrap()
        });
        prop_assert_eq!(got, Some(value));
    }

    #[test]
    fn prop_scan_is_sorted_and_prefix_exact(
        suffixes in prop::collection::btree_set("[a-z0-9-]{1,16}", 0..12),
        noise in prop::collection::btree_set("[a-z0-9-]{1,16}", 0..6),
    ) {
        let rt = rt();
        let keys = rt.block_on(async {
            let store = SqliteQueueStore::open_in_memory().await.unwrap();
            for s in &suffixes {
                store.put(&format!("http-outbox:{s}"), &json!(1)).await.unwrap();
            }
            for s in &noise {
                store.put(&format!("scratch:{s}"), &json!(2)).await.unwrap();
            }
            store.keys("http-outbox:").await.unwrap()
        });
        // BTreeSet iterates sorted, and the shared prefix keeps key order
        // equal to suffix order.
        let expected: Vec<String> = suffixes
            .iter()
            .map(|s| format!("http-outbox:{s}"))
            .collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn prop_delete_removes_only_the_named_key(
        suffixes in prop::collection::btree_set("[a-z0-9-]{1,16}", 1..10),
    ) {
        let rt = rt();
        let victim = suffixes.iter().next().cloned().unwrap();
        let keys = rt.block_on(async {
            let store = SqliteQueueStore::open_in_memory().await.unwrap();
            for s in &suffixes {
                store.put(&format!("http-outbox:{s}"), &json!(1)).await.unwrap();
            }
            store.delete(&format!("http-outbox:{victim}")).await.unwrap();
            store.keys("http-outbox:").await.unwrap()
        });
        let expected: Vec<String> = suffixes
            .iter()
            .filter(|s| **s != victim)
            .map(|s| format!("http-outbox:{s}"))
            .collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn prop_memory_store_agrees_with_sqlite(
        ops in prop::collection::vec(op_strategy(), 0..32),
    ) {
        let rt = rt();
        let (sqlite_keys, memory_keys, sqlite_values, memory_values) = rt.block_on(async {
            let sqlite = SqliteQueueStore::open_in_memory().await.unwrap();
            let memory = MemoryQueueStore::new();
            for op in &ops {
                match op {
                    Op::Put(k, v) => {
                        let key = format!("http-outbox:{k}");
                        let value = json!(v);
                        sqlite.put(&key, &value).await.unwrap();
                        memory.put(&key, &value).await.unwrap();
                    }
                    Op::Delete(k) => {
                        let key = format!("http-outbox:{k}");
                        sqlite.delete(&key).await.unwrap();
                        memory.delete(&key).await.unwrap();
                    }
                }
            }
            let sqlite_keys = sqlite.keys("http-outbox:").await.unwrap();
            let memory_keys = memory.keys("http-outbox:").await.unwrap();
            let mut sqlite_values = Vec::new();
            let mut memory_values = Vec::new();
            for key in &sqlite_keys {
                sqlite_values.push(sqlite.get(key).await.unwrap());
                memory_values.push(memory.get(key).await.unwrap());
            }
            (sqlite_keys, memory_keys, sqlite_values, memory_values)
        });
        prop_assert_eq!(sqlite_keys, memory_keys);
        prop_assert_eq!(sqlite_values, memory_values);
    }
}
