//! Creator identity mocking
//!
//! Holds the simulated transaction creator (MSP id + certificate) of a mocked
//! chaincode and resolves the shapes test code uses to set it.
//!
//! # Creator Shapes
//!
//! The accepted shapes form a closed set ([`Creator`]):
//! - **Pair**: a pre-packed `[msp_id, cert]`
//! - **MspAndCert**: two separate strings
//! - **Custom**: arbitrary values, only valid when a transform is registered
//!
//! A registered transform takes precedence over every shape. Anything it
//! cannot handle is a test-setup mistake ([`MisuseError::UnknownCreatorShape`]).

use crate::convert::ConvertError;
use crate::errors::MisuseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Transform from caller-supplied values to `(msp_id, cert)`
pub type CreatorTransform = Rc<dyn Fn(&[Value]) -> (String, String)>;

/// Serialized creator identity as seen by chaincode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    /// Membership service provider (organization) id
    pub mspid: String,

    /// Certificate bytes (PEM text in practice)
    pub id_bytes: Vec<u8>,
}

impl SerializedIdentity {
    pub fn new(mspid: impl Into<String>, cert: impl AsRef<[u8]>) -> Self {
        Self {
            mspid: mspid.into(),
            id_bytes: cert.as_ref().to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Certificate bytes as text
    pub fn cert(&self) -> String {
        String::from_utf8_lossy(&self.id_bytes).into_owned()
    }
}

/// Shapes accepted when setting a creator
#[derive(Debug, Clone, PartialEq)]
pub enum Creator {
    /// Pre-packed `[msp_id, cert]`
    Pair([String; 2]),

    /// Separate msp id and cert
    MspAndCert(String, String),

    /// Values handed to a registered transform
    Custom(Vec<Value>),
}

impl Creator {
    pub fn custom(values: impl IntoIterator<Item = Value>) -> Self {
        Creator::Custom(values.into_iter().collect())
    }

    /// Flatten into the values a transform receives
    fn into_values(self) -> Vec<Value> {
        match self {
            Creator::Pair(pair) => vec![Value::from(pair.to_vec())],
            Creator::MspAndCert(msp_id, cert) => vec![Value::from(msp_id), Value::from(cert)],
            Creator::Custom(values) => values,
        }
    }
}

impl fmt::Display for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Creator::Pair(_) => write!(f, "pair"),
            Creator::MspAndCert(..) => write!(f, "msp id and cert"),
            Creator::Custom(values) => write!(f, "{} custom value(s)", values.len()),
        }
    }
}

impl From<[String; 2]> for Creator {
    fn from(pair: [String; 2]) -> Self {
        Creator::Pair(pair)
    }
}

impl From<[&str; 2]> for Creator {
    fn from(pair: [&str; 2]) -> Self {
        Creator::Pair([pair[0].to_string(), pair[1].to_string()])
    }
}

impl From<(String, String)> for Creator {
    fn from((msp_id, cert): (String, String)) -> Self {
        Creator::MspAndCert(msp_id, cert)
    }
}

impl From<(&str, &str)> for Creator {
    fn from((msp_id, cert): (&str, &str)) -> Self {
        Creator::MspAndCert(msp_id.to_string(), cert.to_string())
    }
}

/// Current creator plus the optional transform
#[derive(Clone, Default)]
pub struct IdentityMocker {
    creator: Option<SerializedIdentity>,
    transform: Option<CreatorTransform>,
}

impl fmt::Debug for IdentityMocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMocker")
            .field("creator", &self.creator)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl IdentityMocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_identity(&mut self, msp_id: impl Into<String>, cert: impl AsRef<[u8]>) {
        self.creator = Some(SerializedIdentity::new(msp_id, cert));
    }

    /// Last identity set, if any
    pub fn identity(&self) -> Option<&SerializedIdentity> {
        self.creator.as_ref()
    }

    /// Serialized form of the last identity set, if any
    pub fn current_identity(&self) -> Result<Option<Vec<u8>>, ConvertError> {
        self.creator.as_ref().map(SerializedIdentity::to_bytes).transpose()
    }

    pub fn clear(&mut self) {
        self.creator = None;
    }

    pub fn register_transform(&mut self, transform: CreatorTransform) {
        self.transform = Some(transform);
    }

    pub fn transform(&self) -> Option<CreatorTransform> {
        self.transform.clone()
    }

    /// Resolve a creator shape and store it
    pub fn set_identity_from(&mut self, creator: Creator) -> Result<(), MisuseError> {
        let (msp_id, cert) = resolve_creator(self.transform.as_ref(), creator)?;
        self.set_identity(msp_id, cert);
        Ok(())
    }
}

/// Resolve a creator shape into `(msp_id, cert)`
///
/// Kept separate from [`IdentityMocker`] so callers can run the transform
/// without holding a borrow of the mocker.
pub fn resolve_creator(
    transform: Option<&CreatorTransform>,
    creator: Creator,
) -> Result<(String, String), MisuseError> {
    if let Some(transform) = transform {
        return Ok(transform(&creator.into_values()));
    }

    match creator {
        Creator::Pair([msp_id, cert]) => Ok((msp_id, cert)),
        Creator::MspAndCert(msp_id, cert) => Ok((msp_id, cert)),
        other @ Creator::Custom(_) => Err(MisuseError::UnknownCreatorShape {
            shape: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_absent_until_set() {
        let mocker = IdentityMocker::new();
        assert!(mocker.identity().is_none());
        assert_eq!(mocker.current_identity().unwrap(), None);
    }

    #[test]
    fn test_serialized_identity_round_trip() {
        let identity = SerializedIdentity::new("org1", "cert1");
        let bytes = identity.to_bytes().unwrap();
        assert_eq!(SerializedIdentity::from_bytes(&bytes).unwrap(), identity);
        assert_eq!(identity.cert(), "cert1");
    }

    #[test]
    fn test_pair_and_two_strings_resolve_the_same() {
        let from_pair = resolve_creator(None, ["org1", "cert1"].into()).unwrap();
        let from_strings = resolve_creator(None, ("org1", "cert1").into()).unwrap();
        assert_eq!(from_pair, from_strings);
        assert_eq!(from_pair, ("org1".to_string(), "cert1".to_string()));
    }

    #[test]
    fn test_custom_without_transform_is_misuse() {
        let err = resolve_creator(None, Creator::custom(vec![Value::from(1)])).unwrap_err();
        assert!(matches!(err, MisuseError::UnknownCreatorShape { .. }));
    }

    #[test]
    fn test_transform_receives_flattened_values() {
        let transform: CreatorTransform = Rc::new(|values: &[Value]| {
            (format!("{}MSP", values.len()), values[0].to_string())
        });

        let (msp_id, cert) = resolve_creator(Some(&transform), ["a", "b"].into()).unwrap();
        assert_eq!(msp_id, "1MSP");
        assert_eq!(cert, r#"["a","b"]"#);

        let (msp_id, _) = resolve_creator(Some(&transform), ("a", "b").into()).unwrap();
        assert_eq!(msp_id, "2MSP");
    }
}
