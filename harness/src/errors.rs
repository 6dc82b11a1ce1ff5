//! Cross-cutting harness errors
//!
//! Two families live here:
//! - **HarnessError**: routine runtime conditions that are turned into a
//!   failure `Response` (chaincode code branches on them)
//! - **MisuseError**: mistakes in test setup (bad transaction bracketing,
//!   unknown creator shape). The public harness API panics on these.
//!
//! Module-specific errors sit next to their types (`LedgerError` in
//! `ledger`, `ConvertError` in `convert`, `StateError` in `state`,
//! `ChaincodeError` in `dispatch`).

use thiserror::Error;

/// Message carried by the failure response of a routing miss
pub const ERR_CHAINCODE_NOT_EXISTS: &str = "chaincode not exists";

/// Recoverable harness conditions surfaced as failure responses
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No peer registered under the routing key
    #[error("chaincode not exists")]
    ChaincodeNotExists { key: String },

    /// Argument marshaling failed before the transaction started
    #[error("{0}")]
    Marshal(#[from] crate::convert::ConvertError),

    #[error("event name must not be empty")]
    EmptyEventName,
}

/// Programmer errors in the test itself
///
/// These indicate a broken test setup rather than a data-dependent runtime
/// condition, so the public API aborts loudly instead of returning them.
#[derive(Debug, Error, PartialEq)]
pub enum MisuseError {
    #[error("transaction {requested} started while transaction {active} is active")]
    TransactionAlreadyActive { active: String, requested: String },

    #[error("transaction {requested} ended while no transaction is active")]
    TransactionNotActive { requested: String },

    #[error("transaction {requested} ended but active transaction is {active}")]
    TxIdMismatch { active: String, requested: String },

    #[error("unknown args type to MockStub::from_creator: {shape}")]
    UnknownCreatorShape { shape: String },
}
