//! Proposal records owned by the budget ledger.

use crate::decision::VoteTally;
use crate::error::GovernanceError;
use commons_types::{Address, Amount, DocHash, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};

/// Number of assessment criteria.
pub const CRITERIA: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalKind {
    /// Administrative decision, no funds move.
    System,
    /// Request for a payout from the treasury.
    Fund,
}

/// Lifecycle state. `Rejected` and `Accepted` share a rank: a proposal reaches
/// exactly one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    Invalid,
    Created,
    Rejected,
    Accepted,
    Finished,
}

impl ProposalState {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Invalid => 0,
            Self::Created => 1,
            Self::Rejected | Self::Accepted => 2,
            Self::Finished => 3,
        }
    }

    /// Whether `next` is a legal forward move from `self`.
    pub fn can_advance_to(&self, next: ProposalState) -> bool {
        match (self, next) {
            // an assessment rejection is terminal
            (Self::Rejected, _) => false,
            _ => next.rank() > self.rank(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProposalResult {
    #[default]
    None,
    Approved,
    Rejected,
    InvalidQuorum,
    AssessmentFailed,
}

/// Vote window and, for fund proposals, the preceding assessment window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTimes {
    pub start: Timestamp,
    pub end: Timestamp,
    pub start_assess: Timestamp,
    pub end_assess: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub kind: ProposalKind,
    pub state: ProposalState,
    pub result: ProposalResult,
    pub title: String,
    pub doc_hash: DocHash,
    pub start: Timestamp,
    pub end: Timestamp,
    pub start_assess: Timestamp,
    pub end_assess: Timestamp,
    pub fund_amount: Amount,
    pub proposer: Address,
    pub fees_paid: Amount,

    // ── Tallies copied from the coordinator ──────────────────────────────
    pub assess_participant_count: u64,
    pub assess_score_totals: [u64; CRITERIA],
    /// Blank, positive, negative.
    pub vote_result: [u64; 3],
    pub validator_count_at_finish: u64,
    pub counting_finish_time: Option<Timestamp>,

    // ── Withdrawal ───────────────────────────────────────────────────────
    pub withdrawn: bool,
    pub funding_refused: bool,
    pub refusal_time: Option<Timestamp>,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProposalId,
        kind: ProposalKind,
        title: String,
        doc_hash: DocHash,
        times: ProposalTimes,
        fund_amount: Amount,
        proposer: Address,
        fees_paid: Amount,
    ) -> Self {
        Self {
            id,
            kind,
            state: ProposalState::Created,
            result: ProposalResult::None,
            title,
            doc_hash,
            start: times.start,
            end: times.end,
            start_assess: times.start_assess,
            end_assess: times.end_assess,
            fund_amount,
            proposer,
            fees_paid,
            assess_participant_count: 0,
            assess_score_totals: [0; CRITERIA],
            vote_result: [0; 3],
            validator_count_at_finish: 0,
            counting_finish_time: None,
            withdrawn: false,
            funding_refused: false,
            refusal_time: None,
        }
    }

    pub fn times(&self) -> ProposalTimes {
        ProposalTimes {
            start: self.start,
            end: self.end,
            start_assess: self.start_assess,
            end_assess: self.end_assess,
        }
    }

    /// Counting is over: the vote finished, or assessment ended the proposal early.
    pub fn is_concluded(&self) -> bool {
        matches!(self.state, ProposalState::Finished | ProposalState::Rejected)
    }

    /// Move forward to `next`, refusing any backward or sideways move.
    pub fn advance(&mut self, next: ProposalState) -> Result<(), GovernanceError> {
        if !self.state.can_advance_to(next) {
            return Err(GovernanceError::InvalidPhase(format!(
                "proposal {} cannot move from {:?} to {:?}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Set the result. It is written exactly once.
    pub fn conclude(
        &mut self,
        next: ProposalState,
        result: ProposalResult,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if self.result != ProposalResult::None {
            return Err(GovernanceError::InvalidPhase(format!(
                "proposal {} already has result {:?}",
                self.id, self.result
            )));
        }
        self.advance(next)?;
        self.result = result;
        self.counting_finish_time = Some(now);
        Ok(())
    }

    pub fn record_vote(&mut self, tally: &VoteTally, validator_count: u64) {
        self.vote_result = [tally.blank, tally.positive, tally.negative];
        self.validator_count_at_finish = validator_count;
    }
}
