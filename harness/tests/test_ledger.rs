//! Tests for the ledger store
//!
//! Covers round trip, prefix completeness and snapshot integrity.

use chaincode_mock_core_rs::ledger::{create_composite_key, split_composite_key};
use chaincode_mock_core_rs::{LedgerError, LedgerStore};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn test_get_missing_key_is_not_found() {
    let store = LedgerStore::new();
    assert_eq!(
        store.get("nothing"),
        Err(LedgerError::NotFound {
            key: "nothing".to_string()
        })
    );
}

#[test]
fn test_put_overwrites() {
    let mut store = LedgerStore::new();
    store.put("k", b"v1".to_vec()).unwrap();
    store.put("k", b"v2".to_vec()).unwrap();

    assert_eq!(store.get("k").unwrap(), b"v2");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_delete_then_get() {
    let mut store = LedgerStore::new();
    store.put("k", b"v".to_vec()).unwrap();

    assert_eq!(store.delete("k"), Some(b"v".to_vec()));
    assert!(store.get("k").is_err());
    assert_eq!(store.delete("k"), None);
}

#[test]
fn test_empty_prefix_scan_is_empty_vec() {
    let mut store = LedgerStore::new();
    store.put("other", vec![1]).unwrap();

    let found = store
        .list_by_partial_composite_key::<&str>("CommercialPaper", &[])
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_prefix_scan_independent_of_insertion_order() {
    let keys = [
        create_composite_key("Paper", &["MagnetoCorp", "00003"]).unwrap(),
        create_composite_key("Paper", &["MagnetoCorp", "00001"]).unwrap(),
        create_composite_key("Paper", &["DigiBank", "00002"]).unwrap(),
    ];

    let mut forward = LedgerStore::new();
    for key in &keys {
        forward.put(key.clone(), key.as_bytes().to_vec()).unwrap();
    }

    let mut backward = LedgerStore::new();
    for key in keys.iter().rev() {
        backward.put(key.clone(), key.as_bytes().to_vec()).unwrap();
    }

    let prefix = create_composite_key::<&str>("Paper", &[]).unwrap();
    assert_eq!(forward.list_by_prefix(&prefix), backward.list_by_prefix(&prefix));
}

#[test]
fn test_partial_key_narrows_by_leading_attribute() {
    let mut store = LedgerStore::new();
    for (issuer, number) in [("MagnetoCorp", "1"), ("MagnetoCorp", "2"), ("DigiBank", "1")] {
        let key = create_composite_key("Paper", &[issuer, number]).unwrap();
        store.put(key, vec![0]).unwrap();
    }

    let magneto = store
        .list_by_partial_composite_key("Paper", &["MagnetoCorp"])
        .unwrap();
    assert_eq!(magneto.len(), 2);
    for (key, _) in magneto {
        let (_, attrs) = split_composite_key(&key).unwrap();
        assert_eq!(attrs[0], "MagnetoCorp");
    }
}

#[test]
fn test_snapshot_restore() {
    let mut store = LedgerStore::new();
    store.put("a", b"1".to_vec()).unwrap();
    store.put("b", b"2".to_vec()).unwrap();
    let snapshot = store.snapshot().unwrap();

    store.put("c", b"3".to_vec()).unwrap();
    store.restore(&snapshot).unwrap();

    assert_eq!(store.len(), 2);
    assert!(store.get("c").is_err());
    assert_eq!(store.snapshot().unwrap(), snapshot);
}

#[test]
fn test_snapshot_hash_detects_tampering() {
    let mut store = LedgerStore::new();
    store.put("a", b"1".to_vec()).unwrap();

    let mut snapshot = store.snapshot().unwrap();
    snapshot.entries[0].value = b"forged".to_vec();

    let mut target = LedgerStore::new();
    assert!(matches!(
        target.restore(&snapshot),
        Err(LedgerError::SnapshotHashMismatch { .. })
    ));
    assert!(target.is_empty());
}

#[test]
fn test_snapshot_hash_independent_of_insertion_order() {
    let mut a = LedgerStore::new();
    a.put("x", vec![1]).unwrap();
    a.put("y", vec![2]).unwrap();

    let mut b = LedgerStore::new();
    b.put("y", vec![2]).unwrap();
    b.put("x", vec![1]).unwrap();

    assert_eq!(
        a.snapshot().unwrap().state_hash,
        b.snapshot().unwrap().state_hash
    );
}

proptest! {
    #[test]
    fn prop_round_trip(key in "[a-zA-Z0-9]{1,16}", value in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut store = LedgerStore::new();
        store.put(key.clone(), value.clone()).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), value.as_slice());
    }

    #[test]
    fn prop_prefix_completeness(numbers in proptest::collection::btree_set("[0-9]{1,5}", 0..40)) {
        let mut store = LedgerStore::new();
        for number in &numbers {
            let key = create_composite_key("CommercialPaper", &["MagnetoCorp", number.as_str()]).unwrap();
            store.put(key, number.as_bytes().to_vec()).unwrap();
        }
        // Noise in a neighbouring namespace must not leak into the scan
        let noise = create_composite_key("CommercialPaperId", &["MagnetoCorp", "0"]).unwrap();
        store.put(noise, vec![]).unwrap();

        let found = store
            .list_by_partial_composite_key::<&str>("CommercialPaper", &[])
            .unwrap();
        prop_assert_eq!(found.len(), numbers.len());

        let seen: BTreeSet<String> = found
            .into_iter()
            .map(|(_, value)| String::from_utf8(value).unwrap())
            .collect();
        prop_assert_eq!(seen, numbers);
    }
}
