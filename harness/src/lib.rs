//! Chaincode Mock Core - in-process chaincode test harness
//!
//! Runs chaincode logic deterministically without a ledger network.
//!
//! # Architecture
//!
//! - **ledger**: per-instance world state with composite keys
//! - **identity**: mocked transaction creator
//! - **scope**: transaction bracketing state machine
//! - **peers**: chaincode-to-chaincode routing
//! - **stub**: `MockStub`, the chaincode-facing `ChaincodeStub` interface and
//!   the sugared `init` / `invoke` entry points
//! - **convert**: argument marshaling
//! - **state** / **dispatch**: typed records and function routing used by
//!   chaincode written against the harness
//!
//! # Critical Invariants
//!
//! 1. Arguments are scoped per call, never shared between nested calls
//! 2. Routine conditions (missing state, unknown peer) are values, not panics
//! 3. Test-setup mistakes (bad tx bracketing, unknown creator shape) panic
//! 4. Execution is single-threaded and synchronous

// Module declarations
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod peers;
pub mod response;
pub mod scope;
pub mod state;
pub mod stub;

// Re-exports for convenience
pub use config::{MockStubConfig, TxIdStrategy, PLACEHOLDER_TX_ID};
pub use convert::{ConvertError, FromBytes, IntoArgs, Json, ToBytes};
pub use dispatch::{ChaincodeError, Context, Router};
pub use errors::{HarnessError, MisuseError, ERR_CHAINCODE_NOT_EXISTS};
pub use identity::{Creator, IdentityMocker, SerializedIdentity};
pub use ledger::{LedgerError, LedgerSnapshot, LedgerStore};
pub use response::Response;
pub use scope::{ScopeState, TransactionScope};
pub use state::{Keyed, State, StateError, StateKey};
pub use stub::{Chaincode, ChaincodeEvent, ChaincodeStub, MockStub, MockTxContext};
