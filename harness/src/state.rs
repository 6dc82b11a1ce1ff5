//! Typed state layer
//!
//! Stores serde-serializable records under composite keys derived from the
//! record itself. Each record type names a namespace; its identifying
//! attributes complete the key.
//!
//! | operation | missing key      | existing key       |
//! |-----------|------------------|--------------------|
//! | `get`     | `NotFound`       | decoded record     |
//! | `put`     | written          | overwritten        |
//! | `insert`  | written          | `AlreadyExists`    |
//! | `delete`  | `NotFound`       | removed            |
//! | `list`    | empty vec        | all records, sorted by key |

use crate::convert::ConvertError;
use crate::ledger::LedgerError;
use crate::stub::ChaincodeStub;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Record or id that maps onto a composite key
///
/// An id type and its record type share the same namespace so that either
/// can address the record.
pub trait Keyed {
    const NAMESPACE: &'static str;

    /// Identifying attributes, in key order
    fn key_attrs(&self) -> Vec<String>;

    fn state_key(&self) -> StateKey {
        StateKey {
            namespace: Self::NAMESPACE.to_string(),
            attrs: self.key_attrs(),
        }
    }
}

/// Human-readable composite key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateKey {
    pub namespace: String,
    pub attrs: Vec<String>,
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        for attr in &self.attrs {
            write!(f, " | {}", attr)?;
        }
        Ok(())
    }
}

/// Errors of the typed state layer
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state entry not found: {key}")]
    NotFound { key: StateKey },

    #[error("state entry already exists: {key}")]
    AlreadyExists { key: StateKey },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Typed view over the state of the current call
pub struct State<'s> {
    stub: &'s mut dyn ChaincodeStub,
}

impl<'s> State<'s> {
    pub fn new(stub: &'s mut dyn ChaincodeStub) -> Self {
        Self { stub }
    }

    fn ledger_key(&self, key: &StateKey) -> Result<String, StateError> {
        Ok(self.stub.create_composite_key(&key.namespace, &key.attrs)?)
    }

    pub fn exists<K: Keyed>(&self, key: &K) -> Result<bool, StateError> {
        let ledger_key = self.ledger_key(&key.state_key())?;
        match self.stub.get_state(&ledger_key) {
            Ok(_) => Ok(true),
            Err(LedgerError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Read and decode the record addressed by `key`
    pub fn get<K: Keyed, T: DeserializeOwned>(&self, key: &K) -> Result<T, StateError> {
        let state_key = key.state_key();
        let ledger_key = self.ledger_key(&state_key)?;
        let bytes = match self.stub.get_state(&ledger_key) {
            Ok(bytes) => bytes,
            Err(LedgerError::NotFound { .. }) => return Err(StateError::NotFound { key: state_key }),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes).map_err(ConvertError::from)?)
    }

    /// Write a record, replacing any previous value
    pub fn put<T: Keyed + Serialize>(&mut self, record: &T) -> Result<(), StateError> {
        let ledger_key = self.ledger_key(&record.state_key())?;
        let bytes = serde_json::to_vec(record).map_err(ConvertError::from)?;
        self.stub.put_state(&ledger_key, bytes)?;
        Ok(())
    }

    /// Write a record that must not exist yet
    pub fn insert<T: Keyed + Serialize>(&mut self, record: &T) -> Result<(), StateError> {
        if self.exists(record)? {
            return Err(StateError::AlreadyExists {
                key: record.state_key(),
            });
        }
        self.put(record)
    }

    /// Remove a record that must exist
    pub fn delete<K: Keyed>(&mut self, key: &K) -> Result<(), StateError> {
        if !self.exists(key)? {
            return Err(StateError::NotFound { key: key.state_key() });
        }
        let ledger_key = self.ledger_key(&key.state_key())?;
        self.stub.del_state(&ledger_key)?;
        Ok(())
    }

    /// All records of type `T`, in key order
    pub fn list<T: Keyed + DeserializeOwned>(&self) -> Result<Vec<T>, StateError> {
        self.stub
            .get_state_by_partial_composite_key(T::NAMESPACE, &[])?
            .into_iter()
            .map(|(_, bytes)| {
                serde_json::from_slice(&bytes)
                    .map_err(|err| StateError::Convert(ConvertError::from(err)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Id(&'static str, &'static str);

    impl Keyed for Id {
        const NAMESPACE: &'static str = "Thing";

        fn key_attrs(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn test_state_key_display() {
        assert_eq!(Id("a", "b").state_key().to_string(), "Thing | a | b");
    }
}
