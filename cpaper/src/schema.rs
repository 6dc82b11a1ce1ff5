//! Commercial paper records and transaction payloads
//!
//! A paper is keyed by `("CommercialPaper", issuer, paper_number)`; both
//! [`CommercialPaper`] and [`CommercialPaperId`] address the same entry.

use chaincode_mock_core_rs::Keyed;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of commercial paper state keys
pub const COMMERCIAL_PAPER_NAMESPACE: &str = "CommercialPaper";

/// Lifecycle state of a paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaperState {
    Issued,
    Trading,
    Redeemed,
}

impl fmt::Display for PaperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaperState::Issued => "ISSUED",
            PaperState::Trading => "TRADING",
            PaperState::Redeemed => "REDEEMED",
        };
        write!(f, "{}", name)
    }
}

/// Commercial paper as stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialPaper {
    pub issuer: String,
    pub paper_number: String,
    pub owner: String,
    pub issue_date: String,
    pub maturity_date: String,
    /// Face value in cents
    pub face_value: i64,
    pub state: PaperState,
}

impl Keyed for CommercialPaper {
    const NAMESPACE: &'static str = COMMERCIAL_PAPER_NAMESPACE;

    fn key_attrs(&self) -> Vec<String> {
        vec![self.issuer.clone(), self.paper_number.clone()]
    }
}

/// Identifying fields of a paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialPaperId {
    pub issuer: String,
    pub paper_number: String,
}

impl CommercialPaperId {
    pub fn new(issuer: impl Into<String>, paper_number: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            paper_number: paper_number.into(),
        }
    }
}

impl Keyed for CommercialPaperId {
    const NAMESPACE: &'static str = COMMERCIAL_PAPER_NAMESPACE;

    fn key_attrs(&self) -> Vec<String> {
        vec![self.issuer.clone(), self.paper_number.clone()]
    }
}

/// Payload of `issue`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommercialPaper {
    pub issuer: String,
    pub paper_number: String,
    pub issue_date: String,
    pub maturity_date: String,
    pub face_value: i64,
}

/// Payload of `buy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyCommercialPaper {
    pub issuer: String,
    pub paper_number: String,
    pub current_owner: String,
    pub new_owner: String,
    pub price: i64,
    pub purchase_date: String,
}

/// Payload of `redeem`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemCommercialPaper {
    pub issuer: String,
    pub paper_number: String,
    pub redeeming_owner: String,
    pub redeem_date: String,
}
