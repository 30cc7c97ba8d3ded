//! The value-transfer seam.
//!
//! The governance core decides who is paid and how much; moving the value is an
//! external primitive that either completes atomically or fails.

use crate::address::Address;
use crate::amount::Amount;
use crate::hash::ProposalId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a payout leaves the treasury.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutReason {
    /// Incentive for a validator of the proposal.
    VoterFee(ProposalId),
    /// Approved funding released to the proposer.
    Funding(ProposalId),
}

/// One outgoing transfer from the treasury.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: Address,
    pub amount: Amount,
    pub reason: PayoutReason,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("transfer to {to} rejected: {reason}")]
    Rejected { to: Address, reason: String },

    #[error("transfer backend unavailable: {0}")]
    Unavailable(String),
}

/// Moves value out of the treasury. Implementations must be atomic-or-failing.
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, payout: &Payout) -> Result<(), TransferError>;
}
