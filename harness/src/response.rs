//! Chaincode invocation result
//!
//! Mirrors the peer response a real chaincode returns: a status code, a
//! human-readable message for failures and a payload for successes. Nothing
//! crosses the invocation boundary as a panic or an `Err`.

use crate::convert::{ConvertError, FromBytes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a successful response
pub const OK: i32 = 200;

/// Lowest status treated as an error
pub const ERROR_THRESHOLD: i32 = 400;

/// Status of a failed response
pub const ERROR: i32 = 500;

/// Structured result of `init` / `invoke`
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::Response;
///
/// let ok = Response::success(b"payload".to_vec());
/// assert!(ok.is_ok());
///
/// let failed = Response::error("chaincode not exists");
/// assert!(failed.is_err());
/// assert_eq!(failed.message, "chaincode not exists");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status < ERROR_THRESHOLD
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Decode the payload
    pub fn payload_as<T: FromBytes>(&self) -> Result<T, ConvertError> {
        T::from_bytes(&self.payload)
    }

    /// Decode a JSON payload
    pub fn payload_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ConvertError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            write!(f, "{} ({} byte payload)", self.status, self.payload.len())
        } else {
            write!(f, "{}: {}", self.status, self.message)
        }
    }
}
