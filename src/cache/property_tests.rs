//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the table's size and ordering invariants under
//! arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheTable, Deadline, Lifetime};
use crate::codec::JsonCodec;
use crate::error::CacheError;

// == Test Configuration ==
const TEST_MAX_BYTES: u64 = 4_096;
const START: i64 = 1_000_000;

// == Strategies ==
/// Generates keys from a small pool so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

fn lifetime_strategy() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        1 => Just(Lifetime::Never),
        4 => (0u64..5_000).prop_map(|ms| Lifetime::After(Duration::from_millis(ms))),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Store {
        key: String,
        value: String,
        lifetime: Lifetime,
        idle_ms: u64,
        idle: bool,
    },
    Fetch { key: String },
    Delete { key: String },
    Clear,
    Sweep,
    Advance { ms: i64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (
            key_strategy(),
            value_strategy(),
            lifetime_strategy(),
            0u64..3_000,
            any::<bool>()
        )
            .prop_map(|(key, value, lifetime, idle_ms, idle)| CacheOp::Store {
                key,
                value,
                lifetime,
                idle_ms,
                idle,
            }),
        3 => key_strategy().prop_map(|key| CacheOp::Fetch { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Clear),
        2 => Just(CacheOp::Sweep),
        3 => (0i64..2_000).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

fn apply(table: &mut CacheTable, now: &mut i64, op: CacheOp) {
    match op {
        CacheOp::Store {
            key,
            value,
            lifetime,
            idle_ms,
            idle,
        } => {
            let encoded = JsonCodec::encode(&value).unwrap();
            let _ = table.store(
                &key,
                encoded,
                lifetime,
                Duration::from_millis(idle_ms),
                idle,
                *now,
            );
        }
        CacheOp::Fetch { key } => {
            let _ = table.fetch(&key, *now);
        }
        CacheOp::Delete { key } => {
            table.delete(&key);
        }
        CacheOp::Clear => table.clear(),
        CacheOp::Sweep => {
            table.sweep(*now);
        }
        CacheOp::Advance { ms } => *now += ms,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Byte accounting and key sets of map and index agree after every
    // operation, and the index stays sorted by effective deadline.
    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let mut table = CacheTable::new(TEST_MAX_BYTES);
        let mut now = START;

        for op in ops {
            apply(&mut table, &mut now, op);
            prop_assert_eq!(table.check_invariants(), Ok(()));
            prop_assert!(table.used_bytes() <= TEST_MAX_BYTES);
        }

        let keys = table.keys_in_eviction_order();
        prop_assert_eq!(keys.len(), table.len());
        let deadlines: Vec<Deadline> = keys
            .iter()
            .map(|k| table.peek(k).unwrap().effective_deadline())
            .collect();
        prop_assert!(deadlines.windows(2).all(|w| w[0] <= w[1]));
    }

    // A sweep leaves nothing expired behind, so a second sweep at the same
    // instant removes nothing.
    #[test]
    fn prop_sweep_is_idempotent(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut table = CacheTable::new(TEST_MAX_BYTES);
        let mut now = START;

        for op in ops {
            apply(&mut table, &mut now, op);
        }

        table.sweep(now);
        for key in table.keys_in_eviction_order() {
            prop_assert!(!table.peek(&key).unwrap().is_expired(now));
        }
        prop_assert!(table.sweep(now).is_empty());
    }

    // Overwriting a key leaves one entry charged at the latest value's size.
    #[test]
    fn prop_overwrite_reconciles(
        key in key_strategy(),
        values in prop::collection::vec(value_strategy(), 1..10),
        idle in any::<bool>()
    ) {
        let mut table = CacheTable::new(TEST_MAX_BYTES);

        for value in &values {
            let encoded = JsonCodec::encode(value).unwrap();
            table
                .store(&key, encoded, Lifetime::Never, Duration::from_secs(1), idle, START)
                .unwrap();
        }

        let last = JsonCodec::encode(values.last().unwrap()).unwrap();
        prop_assert_eq!(table.used_bytes(), last.size());
        prop_assert_eq!(table.keys_in_eviction_order(), vec![key]);
    }

    // Filling to exactly the ceiling succeeds; one more byte is refused
    // without changing anything.
    #[test]
    fn prop_budget_boundary(len in 0usize..200) {
        let value = "x".repeat(len);
        let encoded = JsonCodec::encode(&value).unwrap();
        let mut table = CacheTable::new(encoded.size());

        table
            .store("fits", encoded, Lifetime::Never, Duration::ZERO, false, START)
            .unwrap();
        prop_assert_eq!(table.used_bytes(), table.max_bytes());

        let one_more = JsonCodec::encode("").unwrap();
        let result = table.store("over", one_more, Lifetime::Never, Duration::ZERO, false, START);
        let rejected = matches!(result, Err(CacheError::CapacityExceeded { .. }));
        prop_assert!(rejected);
        prop_assert_eq!(table.used_bytes(), table.max_bytes());
        prop_assert_eq!(table.len(), 1);
    }

    // Sweeping agrees with a brute-force scan of every entry.
    #[test]
    fn prop_sweep_matches_full_scan(
        ops in prop::collection::vec(cache_op_strategy(), 1..60),
        ahead in 0i64..6_000
    ) {
        let mut table = CacheTable::new(TEST_MAX_BYTES);
        let mut now = START;

        for op in ops {
            apply(&mut table, &mut now, op);
        }

        let at = now + ahead;
        let expected: HashMap<String, bool> = table
            .keys_in_eviction_order()
            .into_iter()
            .map(|k| {
                let expired = table.peek(&k).unwrap().is_expired(at);
                (k, expired)
            })
            .collect();

        let mut evicted = table.sweep(at);
        evicted.sort();
        let mut want: Vec<String> = expected
            .iter()
            .filter(|(_, expired)| **expired)
            .map(|(k, _)| k.clone())
            .collect();
        want.sort();

        prop_assert_eq!(evicted, want);
    }
}
