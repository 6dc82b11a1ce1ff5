//! Mock stub configuration
//!
//! Controls the per-instance policies of a `MockStub`:
//! - whether the creator identity is cleared after every completed call
//! - how transaction ids are generated by the sugared `init`/`invoke`
//! - which channel id the stub reports to chaincode
//!
//! Also hosts the canonical JSON hashing used for config fingerprints and
//! ledger snapshots.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed transaction id used by the sugared entry points by default
pub const PLACEHOLDER_TX_ID: &str = "xxx";

/// Transaction id generation for `MockStub::init` / `MockStub::invoke`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxIdStrategy {
    /// Every generated transaction uses [`PLACEHOLDER_TX_ID`]
    #[default]
    Placeholder,

    /// Every generated transaction gets a fresh UUID v4
    Uuid,
}

impl TxIdStrategy {
    /// Produce the next transaction id
    pub fn generate(&self) -> String {
        match self {
            TxIdStrategy::Placeholder => PLACEHOLDER_TX_ID.to_string(),
            TxIdStrategy::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Mock stub configuration
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::{MockStubConfig, TxIdStrategy};
///
/// let config = MockStubConfig::default()
///     .with_clear_creator_after_invoke(true)
///     .with_tx_id(TxIdStrategy::Uuid)
///     .with_channel_id("my-channel");
///
/// assert!(config.clear_creator_after_invoke);
/// assert_eq!(config.channel_id, "my-channel");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockStubConfig {
    /// Reset creator identity once the outermost call completes
    #[serde(default)]
    pub clear_creator_after_invoke: bool,

    /// Transaction id generation for sugared calls
    #[serde(default)]
    pub tx_id: TxIdStrategy,

    /// Channel reported by `ChaincodeStub::channel_id`
    #[serde(default)]
    pub channel_id: String,
}

impl MockStubConfig {
    pub fn with_clear_creator_after_invoke(mut self, clear: bool) -> Self {
        self.clear_creator_after_invoke = clear;
        self
    }

    pub fn with_tx_id(mut self, strategy: TxIdStrategy) -> Self {
        self.tx_id = strategy;
        self
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Deterministic fingerprint of this configuration
    pub fn config_hash(&self) -> Result<String, serde_json::Error> {
        compute_canonical_hash(self)
    }
}

/// Compute deterministic SHA256 hash of any serializable value
///
/// Uses canonical JSON serialization with sorted keys so that map iteration
/// order never changes the digest.
pub fn compute_canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical_value = canonicalize(serde_json::to_value(value)?);
    let json = serde_json::to_string(&canonical_value)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MockStubConfig::default();
        assert!(!config.clear_creator_after_invoke);
        assert_eq!(config.tx_id, TxIdStrategy::Placeholder);
        assert!(config.channel_id.is_empty());
    }

    #[test]
    fn test_placeholder_tx_id_is_fixed() {
        let strategy = TxIdStrategy::Placeholder;
        assert_eq!(strategy.generate(), PLACEHOLDER_TX_ID);
        assert_eq!(strategy.generate(), strategy.generate());
    }

    #[test]
    fn test_uuid_tx_ids_differ() {
        let strategy = TxIdStrategy::Uuid;
        assert_ne!(strategy.generate(), strategy.generate());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: MockStubConfig =
            serde_json::from_str(r#"{"clear_creator_after_invoke": true}"#).unwrap();
        assert!(config.clear_creator_after_invoke);
        assert_eq!(config.tx_id, TxIdStrategy::Placeholder);
    }

    #[test]
    fn test_config_hash_deterministic() {
        let a = MockStubConfig::default().with_channel_id("ch");
        let b = MockStubConfig::default().with_channel_id("ch");
        let c = MockStubConfig::default().with_channel_id("other");

        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_ne!(a.config_hash().unwrap(), c.config_hash().unwrap());
    }
}
