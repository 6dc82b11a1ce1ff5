//! Commercial Paper Chaincode
//!
//! Issue, trade and query commercial papers. Written against the chaincode
//! mock harness so the whole lifecycle can be exercised in process.
//!
//! # Functions
//!
//! | function | parameter                   | result                   |
//! |----------|-----------------------------|--------------------------|
//! | `list`   | -                           | all papers               |
//! | `issue`  | `IssueCommercialPaper`      | the issued paper         |
//! | `buy`    | `BuyCommercialPaper`        | the paper after the buy  |
//! | `redeem` | `RedeemCommercialPaper`     | always fails (see below) |
//! | `get`    | `CommercialPaperId`         | the paper                |
//! | `delete` | `CommercialPaperId`         | empty                    |
//!
//! Redeem has no agreed transition rules yet (maturity check, owner must be
//! the issuer, move to REDEEMED) and reports `redeem is not implemented`.
//!
//! # Example
//!
//! ```rust
//! use chaincode_mock_core_rs::{Json, MockStub};
//! use cpaper_chaincode::schema::{CommercialPaper, IssueCommercialPaper, PaperState};
//!
//! let stub = MockStub::new("cpaper", cpaper_chaincode::new_chaincode());
//! let issue = IssueCommercialPaper {
//!     issuer: "MagnetoCorp".to_string(),
//!     paper_number: "00001".to_string(),
//!     issue_date: "2020-05-31".to_string(),
//!     maturity_date: "2020-11-30".to_string(),
//!     face_value: 5_000_000,
//! };
//!
//! let paper: CommercialPaper = stub.invoke("issue", (Json(&issue),)).payload_json().unwrap();
//! assert_eq!(paper.state, PaperState::Issued);
//! ```

pub mod handlers;
pub mod schema;

use chaincode_mock_core_rs::Router;

pub use handlers::CpaperError;

/// Chaincode name used for registration
pub const CHAINCODE_NAME: &str = "cpaper";

/// Build the commercial paper chaincode
pub fn new_chaincode() -> Router {
    Router::new(CHAINCODE_NAME)
        .route("list", handlers::list)
        .route("issue", handlers::issue)
        .route("buy", handlers::buy)
        .route("redeem", handlers::redeem)
        .route("get", handlers::get)
        .route("delete", handlers::delete)
}
