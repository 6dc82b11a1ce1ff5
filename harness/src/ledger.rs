//! Ledger store
//!
//! Per-instance key/value world state of a mocked chaincode.
//!
//! # Critical Invariants
//!
//! 1. **Sorted Keys**: entries live in a `BTreeMap`, so prefix and range scans
//!    are deterministic and independent of insertion order
//! 2. **Composite Key Isolation**: two composite keys built from the same
//!    namespace but different attributes never collide
//! 3. **Recoverable Misses**: `get` on a missing key is `LedgerError::NotFound`,
//!    never a panic
//!
//! # Composite Key Encoding
//!
//! `\u{0}` + namespace + `\u{0}` + (attribute + `\u{0}`)*
//!
//! Attributes must not contain `\u{0}` themselves.

use crate::config::compute_canonical_hash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Separator and leading marker of composite keys
pub const COMPOSITE_KEY_NAMESPACE: &str = "\u{0}";

/// Errors that can occur during ledger operations
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("state entry not found: {key}")]
    NotFound { key: String },

    #[error("key must not be empty")]
    EmptyKey,

    #[error("composite key part {part:?} contains a forbidden null character")]
    InvalidCompositeKeyPart { part: String },

    #[error("key {key:?} is not a composite key")]
    NotCompositeKey { key: String },

    #[error("cannot {operation} without a transaction - call mock_transaction_start first")]
    NoActiveTransaction { operation: &'static str },

    #[error("snapshot hash mismatch: expected {expected}, computed {actual}")]
    SnapshotHashMismatch { expected: String, actual: String },

    #[error("snapshot serialization failed: {0}")]
    Serialization(String),
}

/// Build a composite key from a namespace and ordered attributes
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::ledger::{create_composite_key, split_composite_key};
///
/// let key = create_composite_key("CommercialPaper", &["MagnetoCorp", "00001"]).unwrap();
/// let (namespace, attrs) = split_composite_key(&key).unwrap();
///
/// assert_eq!(namespace, "CommercialPaper");
/// assert_eq!(attrs, vec!["MagnetoCorp".to_string(), "00001".to_string()]);
/// ```
pub fn create_composite_key<S: AsRef<str>>(namespace: &str, attrs: &[S]) -> Result<String, LedgerError> {
    validate_key_part(namespace)?;

    let mut key = String::from(COMPOSITE_KEY_NAMESPACE);
    key.push_str(namespace);
    key.push_str(COMPOSITE_KEY_NAMESPACE);
    for attr in attrs {
        let attr = attr.as_ref();
        validate_key_part(attr)?;
        key.push_str(attr);
        key.push_str(COMPOSITE_KEY_NAMESPACE);
    }
    Ok(key)
}

/// Split a composite key into its namespace and attributes
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), LedgerError> {
    let body = key
        .strip_prefix(COMPOSITE_KEY_NAMESPACE)
        .and_then(|rest| rest.strip_suffix(COMPOSITE_KEY_NAMESPACE))
        .ok_or_else(|| LedgerError::NotCompositeKey {
            key: key.to_string(),
        })?;

    let mut parts = body.split(COMPOSITE_KEY_NAMESPACE).map(str::to_string);
    let namespace = parts.next().unwrap_or_default();
    Ok((namespace, parts.collect()))
}

fn validate_key_part(part: &str) -> Result<(), LedgerError> {
    if part.contains('\u{0}') {
        return Err(LedgerError::InvalidCompositeKeyPart {
            part: part.to_string(),
        });
    }
    Ok(())
}

/// One key/value pair of the world state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// Complete ledger snapshot with integrity hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Entries in key order
    pub entries: Vec<LedgerEntry>,

    /// SHA256 of the canonical JSON of `entries`
    pub state_hash: String,
}

/// In-memory world state of one mocked chaincode
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::LedgerStore;
///
/// let mut store = LedgerStore::new();
/// store.put("a", b"1".to_vec()).unwrap();
///
/// assert_eq!(store.get("a").unwrap(), b"1");
/// assert!(store.get("missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a value, replacing any previous one
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) -> Result<(), LedgerError> {
        let key = key.into();
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        debug!(key = %key.escape_debug(), len = value.len(), "ledger put");
        self.entries.insert(key, value);
        Ok(())
    }

    /// Read a value
    pub fn get(&self, key: &str) -> Result<&[u8], LedgerError> {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| LedgerError::NotFound {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, returning the previous value if there was one
    ///
    /// Removing a missing key is not an error at this level.
    pub fn delete(&mut self, key: &str) -> Option<Vec<u8>> {
        debug!(key = %key.escape_debug(), "ledger delete");
        self.entries.remove(key)
    }

    /// All entries whose key starts with `prefix`, in key order
    pub fn list_by_prefix(&self, prefix: &str) -> Vec<(String, Vec<u8>)> {
        self.entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Entries in `[start, end)`; an empty `end` means unbounded
    pub fn range(&self, start: &str, end: &str) -> Vec<(String, Vec<u8>)> {
        use std::ops::Bound;

        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        if let Bound::Excluded(end) = upper {
            if end <= start {
                return Vec::new();
            }
        }

        self.entries
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Entries under a composite namespace, optionally narrowed by leading attributes
    pub fn list_by_partial_composite_key<S: AsRef<str>>(
        &self,
        namespace: &str,
        attrs: &[S],
    ) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        let prefix = create_composite_key(namespace, attrs)?;
        Ok(self.list_by_prefix(&prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capture the full state with an integrity hash
    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let entries: Vec<LedgerEntry> = self
            .entries
            .iter()
            .map(|(key, value)| LedgerEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        let state_hash = hash_entries(&entries)?;
        Ok(LedgerSnapshot {
            entries,
            state_hash,
        })
    }

    /// Replace the full state from a snapshot after verifying its hash
    pub fn restore(&mut self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        let actual = hash_entries(&snapshot.entries)?;
        if actual != snapshot.state_hash {
            return Err(LedgerError::SnapshotHashMismatch {
                expected: snapshot.state_hash.clone(),
                actual,
            });
        }

        self.entries = snapshot
            .entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect();
        Ok(())
    }
}

fn hash_entries(entries: &[LedgerEntry]) -> Result<String, LedgerError> {
    compute_canonical_hash(entries).map_err(|e| LedgerError::Serialization(e.to_string()))
}
