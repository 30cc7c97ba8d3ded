//! Withdrawal state machine for fund proposals.
//!
//! The status code is a stable external contract: client tooling matches on
//! the `W..` strings, so codes are never renumbered.

use crate::proposal::{Proposal, ProposalKind, ProposalResult};
use commons_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a withdrawal check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawCode {
    /// W00: withdrawal permitted.
    Permitted,
    /// W01: no proposal with this id.
    UnknownProposal,
    /// W02: not a fund proposal.
    NotFundProposal,
    /// W04: vote counting has not finished.
    CountingNotFinished,
    /// W05: caller is not the proposer.
    NotProposer,
    /// W06: the proposal was not approved.
    NotApproved,
    /// W07: the withdrawal delay has not elapsed.
    DelayNotElapsed,
    /// W08: an administrator refused the funding.
    FundingRefused,
    /// W09: the funds were already withdrawn.
    AlreadyWithdrawn,
    /// W10: the treasury cannot cover the amount.
    InsufficientTreasury,
}

impl WithdrawCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permitted => "W00",
            Self::UnknownProposal => "W01",
            Self::NotFundProposal => "W02",
            Self::CountingNotFinished => "W04",
            Self::NotProposer => "W05",
            Self::NotApproved => "W06",
            Self::DelayNotElapsed => "W07",
            Self::FundingRefused => "W08",
            Self::AlreadyWithdrawn => "W09",
            Self::InsufficientTreasury => "W10",
        }
    }

    pub fn is_permitted(&self) -> bool {
        *self == Self::Permitted
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Permitted => "the funds can be withdrawn",
            Self::UnknownProposal => "there is no proposal for the proposal id",
            Self::NotFundProposal => "the proposal is not a fund proposal",
            Self::CountingNotFinished => "the vote counting is not yet complete",
            Self::NotProposer => "the requester of the funding is not the proposer",
            Self::NotApproved => "the proposal has come to invalid or been rejected",
            Self::DelayNotElapsed => "the withdrawal delay has not passed since the vote finished",
            Self::FundingRefused => "the withdrawal of the funds was refused",
            Self::AlreadyWithdrawn => "the funds have already been withdrawn",
            Self::InsufficientTreasury => "there is not enough balance in the treasury",
        }
    }
}

impl fmt::Display for WithdrawCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Withdrawal code together with the time vote counting finished, if it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawStatus {
    pub code: WithdrawCode,
    pub counting_finish_time: Option<Timestamp>,
}

/// Evaluate the withdrawal chain for `caller` at `now`.
///
/// Precedence: W01, W02, W04, W05, W06, W08, W07, W10, W09, then W00.
pub fn evaluate(
    proposal: Option<&Proposal>,
    caller: &Address,
    now: Timestamp,
    treasury: Amount,
    delay_period: u64,
) -> WithdrawCode {
    let Some(proposal) = proposal else {
        return WithdrawCode::UnknownProposal;
    };
    if proposal.kind != ProposalKind::Fund {
        return WithdrawCode::NotFundProposal;
    }
    let Some(finished_at) = proposal.counting_finish_time.filter(|_| proposal.is_concluded())
    else {
        return WithdrawCode::CountingNotFinished;
    };
    if &proposal.proposer != caller {
        return WithdrawCode::NotProposer;
    }
    if proposal.result != ProposalResult::Approved {
        return WithdrawCode::NotApproved;
    }
    if proposal.funding_refused {
        return WithdrawCode::FundingRefused;
    }
    if !finished_at.has_expired(delay_period, now) {
        return WithdrawCode::DelayNotElapsed;
    }
    if treasury < proposal.fund_amount {
        return WithdrawCode::InsufficientTreasury;
    }
    if proposal.withdrawn {
        return WithdrawCode::AlreadyWithdrawn;
    }
    WithdrawCode::Permitted
}
