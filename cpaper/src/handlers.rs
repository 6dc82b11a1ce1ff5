//! Commercial paper transaction handlers
//!
//! # Lifecycle
//!
//! ```text
//! issue -> ISSUED --buy--> TRADING --buy--> TRADING
//!                                 \--redeem--> REDEEMED (not implemented)
//! ```
//!
//! Every buy checks the current owner first; a failed handler leaves the
//! stored paper untouched.

use crate::schema::{
    BuyCommercialPaper, CommercialPaper, CommercialPaperId, IssueCommercialPaper, PaperState,
    RedeemCommercialPaper,
};
use chaincode_mock_core_rs::{ChaincodeError, Context, StateError};
use thiserror::Error;
use tracing::debug;

/// Business rule violations
#[derive(Debug, Error, PartialEq)]
pub enum CpaperError {
    #[error("not found: paper {issuer} {paper_number}")]
    PaperNotFound { issuer: String, paper_number: String },

    #[error("paper {issuer} {paper_number} is not owned by {owner}")]
    NotOwned {
        issuer: String,
        paper_number: String,
        owner: String,
    },

    #[error("paper {issuer} {paper_number} is not trading. current state = {state}")]
    NotTrading {
        issuer: String,
        paper_number: String,
        state: PaperState,
    },

    #[error("redeem is not implemented")]
    RedeemNotImplemented,
}

impl From<CpaperError> for ChaincodeError {
    fn from(err: CpaperError) -> Self {
        ChaincodeError::other(err)
    }
}

pub fn list(ctx: &mut Context<'_>) -> Result<Vec<CommercialPaper>, ChaincodeError> {
    Ok(ctx.state().list()?)
}

pub fn issue(ctx: &mut Context<'_>) -> Result<CommercialPaper, ChaincodeError> {
    let issue: IssueCommercialPaper = ctx.param_json(0)?;
    let paper = CommercialPaper {
        issuer: issue.issuer.clone(),
        paper_number: issue.paper_number.clone(),
        owner: issue.issuer.clone(),
        issue_date: issue.issue_date.clone(),
        maturity_date: issue.maturity_date.clone(),
        face_value: issue.face_value,
        state: PaperState::Issued,
    };

    ctx.set_event("IssueCommercialPaper", &issue)?;
    ctx.state().insert(&paper)?;
    debug!(issuer = %paper.issuer, paper_number = %paper.paper_number, "paper issued");
    Ok(paper)
}

pub fn buy(ctx: &mut Context<'_>) -> Result<CommercialPaper, ChaincodeError> {
    let buy: BuyCommercialPaper = ctx.param_json(0)?;
    let id = CommercialPaperId::new(buy.issuer.as_str(), buy.paper_number.as_str());

    let mut paper: CommercialPaper = match ctx.state().get(&id) {
        Ok(paper) => paper,
        Err(StateError::NotFound { .. }) => {
            return Err(CpaperError::PaperNotFound {
                issuer: id.issuer,
                paper_number: id.paper_number,
            }
            .into())
        }
        Err(err) => return Err(err.into()),
    };

    if paper.owner != buy.current_owner {
        return Err(CpaperError::NotOwned {
            issuer: paper.issuer,
            paper_number: paper.paper_number,
            owner: buy.current_owner,
        }
        .into());
    }

    // First buy moves the paper into trading
    if paper.state == PaperState::Issued {
        paper.state = PaperState::Trading;
    }

    if paper.state != PaperState::Trading {
        return Err(CpaperError::NotTrading {
            issuer: paper.issuer,
            paper_number: paper.paper_number,
            state: paper.state,
        }
        .into());
    }
    paper.owner = buy.new_owner.clone();

    ctx.set_event("BuyCommercialPaper", &buy)?;
    ctx.state().put(&paper)?;
    debug!(issuer = %paper.issuer, paper_number = %paper.paper_number, owner = %paper.owner, "paper bought");
    Ok(paper)
}

/// Redeem is a declared transition without agreed rules yet
pub fn redeem(ctx: &mut Context<'_>) -> Result<CommercialPaper, ChaincodeError> {
    let _redeem: RedeemCommercialPaper = ctx.param_json(0)?;
    Err(CpaperError::RedeemNotImplemented.into())
}

pub fn get(ctx: &mut Context<'_>) -> Result<CommercialPaper, ChaincodeError> {
    let id: CommercialPaperId = ctx.param_json(0)?;
    Ok(ctx.state().get(&id)?)
}

pub fn delete(ctx: &mut Context<'_>) -> Result<(), ChaincodeError> {
    let id: CommercialPaperId = ctx.param_json(0)?;
    ctx.state().delete(&id)?;
    Ok(())
}
