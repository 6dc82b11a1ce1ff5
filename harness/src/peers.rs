//! Peer chaincode routing
//!
//! Maps chaincode names (optionally channel-qualified) to other mocked
//! chaincodes so that chaincode-to-chaincode calls stay in process.
//!
//! # Routing Key
//!
//! `name` when the channel is empty, `name + "/" + channel` otherwise. Lookups
//! are exact string matches; there is no fallback from the qualified form to
//! the bare name.

use crate::errors::HarnessError;
use crate::stub::MockStub;
use std::collections::HashMap;
use std::rc::Rc;

/// Separator between chaincode name and channel in routing keys
pub const CHANNEL_SEPARATOR: &str = "/";

/// Compute the routing key for a chaincode name and channel
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::peers::routing_key;
///
/// assert_eq!(routing_key("cpaper", ""), "cpaper");
/// assert_eq!(routing_key("cpaper", "trade"), "cpaper/trade");
/// ```
pub fn routing_key(name: &str, channel: &str) -> String {
    if channel.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", name, CHANNEL_SEPARATOR, channel)
    }
}

/// Registered peer chaincodes of one instance
///
/// Peers are shared: the same instance may be registered under several
/// names, or on several callers.
#[derive(Default)]
pub struct PeerRegistry {
    peers: HashMap<String, Rc<MockStub>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer under a routing key, replacing any previous one
    pub fn register(&mut self, key: impl Into<String>, peer: Rc<MockStub>) {
        self.peers.insert(key.into(), peer);
    }

    /// Resolve a chaincode name and channel to a registered peer
    pub fn resolve(&self, name: &str, channel: &str) -> Result<Rc<MockStub>, HarnessError> {
        let key = routing_key(name, channel);
        self.peers
            .get(&key)
            .cloned()
            .ok_or(HarnessError::ChaincodeNotExists { key })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.peers.contains_key(key)
    }

    /// Registered routing keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.peers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
